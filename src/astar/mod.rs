//! A* is a best-first search which finds the cheapest route between two
//! points by always expanding the candidate with the lowest estimated total
//! cost, `f = g + h`, where `g` is the cost accumulated so far and `h` is a
//! heuristic estimate of the cost remaining.
//!
//! [Amit's A* Pages](https://theory.stanford.edu/~amitp/GameProgramming/AStarComparison.html)
//!
//! [Sebastian Lague - A* Pathfinding](https://www.youtube.com/playlist?list=PLFt_AvWsXl0cq5Umv3pMC9SPnKjfp9eGW)
//!
//! The world is divided into a [grid::Grid] of square nodes. Each node is
//! walkable or not, and walkable nodes carry a movement penalty derived from
//! the terrain beneath them and their proximity to obstacles.
//!
//! Definitions:
//!
//! * Node - a square cell of the grid identified by its `(row, column)`
//! * Movement penalty - extra cost of stepping into a node, `0` being the easiest terrain
//! * g cost - cost of the best known route from the start to a node
//! * h cost - octile distance from a node to the target, diagonal steps cost
//! `14` and straight steps `10`
//! * Open set - nodes discovered but not yet expanded, held in a [heap::PriorityHeap]
//! * Closed set - nodes already expanded, never revisited
//!
//! ```text
//!  ______________________________
//! |  S |    |    |    |    |    |
//! |____|____|____|____|____|____|
//! |    | \  |    |    |    |    |
//! |____|____|____|____|____|____|
//! |    |    | \  | xx |    |    |
//! |____|____|____|____|____|____|
//! |    |    |  | | xx |    |    |
//! |____|____|____|____|____|____|
//! |    |    |    \ xx |    |  T |
//! |____|____|____|____|__/_|____|
//! |    |    |    |    \____/    |
//! |____|____|____|____|____|____|
//! ```
//!

pub mod error;
pub mod grid;
pub mod heap;
pub mod search;

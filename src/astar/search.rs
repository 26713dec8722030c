//! The A* search over a [Grid].
//!
//! Starting from the node under the start point the search repeatedly
//! expands the open node with the lowest `f` cost (`g + h`), preferring the
//! node closer to the target when `f` costs tie. Moving into a node costs
//! the octile distance between the two nodes plus the movement penalty of
//! the node being entered.
//!
//! All bookkeeping (`g`, `h`, parent links, the open and closed sets) lives
//! in a side table owned by the [PathSearch], the [Grid] is only read. This
//! allows several searches to share one grid across threads.
//!
//! Once the target is reached the chain of parents is walked back to the
//! start and collapsed so that only the nodes where the direction of travel
//! changes are kept as waypoints.
//!

use std::cmp::Ordering;

use crate::prelude::*;
use bevy::prelude::*;

/// Cost of a step along a row or column
pub const CARDINAL_COST: i32 = 10;
/// Cost of a diagonal step, `sqrt(2)` scaled by [CARDINAL_COST]
pub const DIAGONAL_COST: i32 = 14;

/// Octile distance between two cells, diagonal steps cost [DIAGONAL_COST]
/// and straight steps [CARDINAL_COST]
pub fn octile_distance(a: GridCell, b: GridCell) -> i32 {
	let (delta_row, delta_column) = a.delta_to(&b);
	let delta_row = delta_row.unsigned_abs() as i32;
	let delta_column = delta_column.unsigned_abs() as i32;
	let diagonal = delta_row.min(delta_column);
	let straight = delta_row.max(delta_column) - diagonal;
	DIAGONAL_COST * diagonal + CARDINAL_COST * straight
}

/// Where a [PathSearch] is in its lifecycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum SearchPhase {
	/// No search has run yet or endpoints are being resolved
	#[default]
	Init,
	/// The open set is being expanded
	Searching,
	/// The target was reached and a path built
	Found,
	/// No path could be produced
	Failed,
}

/// Per-run bookkeeping of one node
#[derive(Clone, Copy, Debug)]
struct NodeRecord {
	/// Cost of the best known route from the start
	g_cost: i32,
	/// Heuristic cost to the target
	h_cost: i32,
	/// Index of the node this one was reached from
	parent: Option<usize>,
	/// Whether the node has been expanded
	closed: bool,
}

impl Default for NodeRecord {
	fn default() -> Self {
		NodeRecord {
			g_cost: i32::MAX,
			h_cost: 0,
			parent: None,
			closed: false,
		}
	}
}

/// A node in the open set, carrying the priority it was queued with
#[derive(Clone, Copy, Debug)]
struct OpenNode {
	/// Storage index of the node in the [Grid]
	index: usize,
	/// `g` cost at the time of queuing
	g_cost: i32,
	/// `h` cost at the time of queuing
	h_cost: i32,
}

impl OpenNode {
	/// Snapshot the priority of a node from its record
	fn from_record(index: usize, record: &NodeRecord) -> Self {
		OpenNode {
			index,
			g_cost: record.g_cost,
			h_cost: record.h_cost,
		}
	}
	/// Total estimated cost
	fn f_cost(&self) -> i32 {
		self.g_cost.saturating_add(self.h_cost)
	}
}

impl HeapItem for OpenNode {
	fn heap_key(&self) -> usize {
		self.index
	}
	/// Lower `f` wins, ties go to the lower `h` (closer to the target)
	fn priority_cmp(&self, other: &Self) -> Ordering {
		self.f_cost()
			.cmp(&other.f_cost())
			.then(self.h_cost.cmp(&other.h_cost))
	}
}

/// The result of a successful search
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
	/// Every cell stepped through from the start to the target inclusive
	cells: Vec<GridCell>,
	/// World positions of the cells where the direction of travel changes,
	/// always ending with the target
	waypoints: Vec<Vec3>,
	/// Accumulated `g` cost of the target
	cost: i32,
}

impl Path {
	/// Every cell from the start to the target
	pub fn get_cells(&self) -> &[GridCell] {
		&self.cells
	}
	/// World positions of the simplified route
	pub fn get_waypoints(&self) -> &[Vec3] {
		&self.waypoints
	}
	/// Consume the path leaving only its waypoints
	pub fn into_waypoints(self) -> Vec<Vec3> {
		self.waypoints
	}
	/// Accumulated cost of the route
	pub fn get_cost(&self) -> i32 {
		self.cost
	}
}

/// Collapse a sequence of cells so that only the cells where the direction
/// of travel changes remain, plus the final cell. The first cell is the
/// starting position and is never kept
pub fn simplify_path(cells: &[GridCell]) -> Vec<GridCell> {
	if cells.len() == 1 {
		return cells.to_vec();
	}
	let mut kept = Vec::new();
	for i in 1..cells.len() {
		let direction_in = cells[i - 1].delta_to(&cells[i]);
		let direction_out = cells.get(i + 1).map(|next| cells[i].delta_to(next));
		if direction_out != Some(direction_in) {
			kept.push(cells[i]);
		}
	}
	kept
}

/// Runs A* over a borrowed [Grid]
pub struct PathSearch<'a> {
	/// The grid being searched
	grid: &'a Grid,
	/// Bookkeeping for every node, rebuilt for each run
	records: Vec<NodeRecord>,
	/// Lifecycle of the latest run
	phase: SearchPhase,
	/// Overrides the default iteration bound
	iteration_limit: Option<usize>,
}

impl<'a> PathSearch<'a> {
	/// Create a new instance of [PathSearch]
	pub fn new(grid: &'a Grid) -> Self {
		PathSearch {
			grid,
			records: Vec::new(),
			phase: SearchPhase::Init,
			iteration_limit: None,
		}
	}
	/// Replace the iteration bound, by default twice the number of nodes
	pub fn with_iteration_limit(mut self, limit: usize) -> Self {
		self.iteration_limit = Some(limit);
		self
	}
	/// The phase the latest run finished in
	pub fn get_phase(&self) -> SearchPhase {
		self.phase
	}
	/// Upper bound on loop iterations before the search is judged to have
	/// diverged
	pub fn get_iteration_limit(&self) -> usize {
		self.iteration_limit
			.unwrap_or(2 * self.grid.get_max_size())
	}
	/// Find a path between two world points
	pub fn run(&mut self, start_point: Vec3, end_point: Vec3) -> Result<Path, SearchError> {
		let result = self.search(start_point, end_point);
		self.phase = match result {
			Ok(_) => SearchPhase::Found,
			Err(_) => SearchPhase::Failed,
		};
		result
	}
	/// The search proper, split from [PathSearch::run] so every early return
	/// still records the final phase
	fn search(&mut self, start_point: Vec3, end_point: Vec3) -> Result<Path, SearchError> {
		self.phase = SearchPhase::Init;
		self.records.clear();
		self.records
			.resize(self.grid.get_max_size(), NodeRecord::default());

		let start_node = self.grid.get_node_from_world_point(start_point);
		let end_node = self.grid.get_node_from_world_point(end_point);
		if !start_node.is_walkable() || !end_node.is_walkable() {
			trace!(
				"Endpoint blocked, start {:?} walkable {}, end {:?} walkable {}",
				start_node.get_cell(),
				start_node.is_walkable(),
				end_node.get_cell(),
				end_node.is_walkable()
			);
			return Err(SearchError::BlockedEndpoint);
		}
		let start = self.grid.get_index(start_node.get_cell());
		let end = self.grid.get_index(end_node.get_cell());
		let end_cell = end_node.get_cell();

		self.phase = SearchPhase::Searching;
		let mut open_set = PriorityHeap::with_capacity(self.grid.get_max_size());
		self.records[start].g_cost = 0;
		self.records[start].h_cost = octile_distance(start_node.get_cell(), end_cell);
		open_set.insert(OpenNode::from_record(start, &self.records[start]));

		let limit = self.get_iteration_limit();
		let mut iterations = 0;
		while let Some(current) = open_set.extract_min() {
			iterations += 1;
			if iterations > limit {
				error!(
					"Search from {:?} to {:?} exceeded {} iterations, the open set is corrupt",
					start_node.get_cell(),
					end_cell,
					limit
				);
				return Err(SearchError::SearchDivergence(limit));
			}
			let current_index = current.index;
			self.records[current_index].closed = true;
			if current_index == end {
				let path = self.retrace(start, end);
				trace!(
					"Path found in {} iterations with cost {}",
					iterations,
					path.get_cost()
				);
				return Ok(path);
			}
			let current_cell = self.grid.get_node_by_index(current_index).get_cell();
			let current_g = self.records[current_index].g_cost;
			for neighbour in self.grid.get_neighbours(current_cell) {
				let index = self.grid.get_index(neighbour.get_cell());
				if !neighbour.is_walkable() || self.records[index].closed {
					continue;
				}
				let tentative = current_g
					.saturating_add(octile_distance(current_cell, neighbour.get_cell()))
					.saturating_add(neighbour.get_movement_penalty());
				let queued = OpenNode::from_record(index, &self.records[index]);
				let is_open = open_set.contains(&queued);
				if tentative < self.records[index].g_cost || !is_open {
					let record = &mut self.records[index];
					record.g_cost = tentative;
					record.h_cost = octile_distance(neighbour.get_cell(), end_cell);
					record.parent = Some(current_index);
					let item = OpenNode::from_record(index, record);
					if is_open {
						// the cost only ever drops here so sifting up is enough
						open_set.update_item(item);
					} else {
						open_set.insert(item);
					}
				}
			}
		}
		trace!(
			"Open set exhausted, no path from {:?} to {:?}",
			start_node.get_cell(),
			end_cell
		);
		Err(SearchError::UnreachableTarget)
	}
	/// Follow parent links from the end back to the start and build the
	/// [Path]
	fn retrace(&self, start: usize, end: usize) -> Path {
		let mut cells = Vec::new();
		let mut current = end;
		cells.push(self.grid.get_node_by_index(current).get_cell());
		while current != start {
			match self.records[current].parent {
				Some(parent) => current = parent,
				None => panic!(
					"Broken parent chain while retracing, node {} has no parent",
					current
				),
			}
			cells.push(self.grid.get_node_by_index(current).get_cell());
		}
		cells.reverse();
		let waypoints = simplify_path(&cells)
			.into_iter()
			.map(|cell| self.grid.get_node(cell).get_world_position())
			.collect();
		Path {
			cells,
			waypoints,
			cost: self.records[end].g_cost,
		}
	}
}

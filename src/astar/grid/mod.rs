//! A [Grid] divides a rectangle of the world into a lattice of square nodes.
//! Each node records whether it can be walked on and how costly it is to
//! move through.
//!
//! The grid lies on the `x`-`z` plane centred on its origin. Rows advance
//! along `+x` and columns along `+z`, node `(0, 0)` sits in the corner
//! nearest `(-x, -z)`:
//!
//! ```text
//!          +z (column)
//!           ^
//!  ____________________
//! |(0,3)|(1,3)|(2,3)|(3,3)|
//! |_____|_____|_____|_____|
//! |(0,2)|(1,2)|(2,2)|(3,2)|
//! |_____|_____|_____|_____|
//! |(0,1)|(1,1)|(2,1)|(3,1)|
//! |_____|_____|_____|_____|
//! |(0,0)|(1,0)|(2,0)|(3,0)|
//! |_____|_____|_____|_____|  > +x (row)
//! ```
//!
//! A grid is built once and then only read, the state of a search lives
//! with the search itself so any number of searches can share a grid.
//!

pub mod blur;
pub mod settings;
pub mod terrain;

use crate::prelude::*;
use bevy::prelude::*;

/// Position of a node within a [Grid]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash, Reflect)]
pub struct GridCell((usize, usize));

impl GridCell {
	/// Create a new instance of [GridCell]
	pub fn new(row: usize, column: usize) -> Self {
		GridCell((row, column))
	}
	/// Get the `(row, column)` tuple
	pub fn get_row_column(&self) -> (usize, usize) {
		self.0
	}
	/// Get the row
	pub fn get_row(&self) -> usize {
		self.0 .0
	}
	/// Get the column
	pub fn get_column(&self) -> usize {
		self.0 .1
	}
	/// The signed `(row, column)` step from `self` to `other`
	pub fn delta_to(&self, other: &GridCell) -> (isize, isize) {
		(
			other.get_row() as isize - self.get_row() as isize,
			other.get_column() as isize - self.get_column() as isize,
		)
	}
}

/// A single node of a [Grid]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct GridNode {
	/// Whether an actor can stand on the node
	walkable: bool,
	/// Centre of the node in world space
	world_position: Vec3,
	/// Position within the grid
	cell: GridCell,
	/// Extra cost of moving into this node after blurring terrain and obstacle penalties
	movement_penalty: i32,
}

impl GridNode {
	/// Create a new instance of [GridNode]
	pub fn new(walkable: bool, world_position: Vec3, cell: GridCell, movement_penalty: i32) -> Self {
		GridNode {
			walkable,
			world_position,
			cell,
			movement_penalty,
		}
	}
	/// Whether actors can stand on the node
	pub fn is_walkable(&self) -> bool {
		self.walkable
	}
	/// Centre of the node in world space
	pub fn get_world_position(&self) -> Vec3 {
		self.world_position
	}
	/// Position of the node within the grid
	pub fn get_cell(&self) -> GridCell {
		self.cell
	}
	/// Blurred cost of entering the node
	pub fn get_movement_penalty(&self) -> i32 {
		self.movement_penalty
	}
}

/// The lattice of [GridNode]s covering a region of the world
#[derive(Clone, Debug)]
pub struct Grid {
	/// How the grid was built
	settings: GridSettings,
	/// Number of nodes along `x`
	rows: usize,
	/// Number of nodes along `z`
	columns: usize,
	/// Nodes stored row-major
	nodes: Vec<GridNode>,
	/// Smallest and largest movement penalty after blurring
	penalty_range: (i32, i32),
}

impl Grid {
	/// Build a grid from its `settings`. Each node centre is tested by the
	/// `classifier`, walkable nodes take the penalty of the terrain layer
	/// reported by the `sampler` while unwalkable nodes take the obstacle
	/// proximity penalty. Penalties are then smoothed with a box blur
	pub fn new<C, S>(settings: GridSettings, classifier: &C, sampler: &S) -> Result<Self, GridError>
	where
		C: ObstacleClassifier + ?Sized,
		S: TerrainSampler + ?Sized,
	{
		let (rows, columns) = settings.validate()?;
		let node_radius = settings.get_node_radius();
		let node_diameter = settings.get_node_diameter();
		let size = settings.get_size();
		let world_bottom_left =
			settings.get_origin() - Vec3::X * (size.x / 2.0) - Vec3::Z * (size.y / 2.0);

		let mut nodes = Vec::with_capacity(rows * columns);
		let mut penalties = Vec::with_capacity(rows * columns);
		let mut blocked = 0;
		for row in 0..rows {
			for column in 0..columns {
				let world_position = world_bottom_left
					+ Vec3::X * (row as f32 * node_diameter + node_radius)
					+ Vec3::Z * (column as f32 * node_diameter + node_radius);
				let walkable = classifier.is_walkable(world_position, node_radius);
				let mut penalty = 0;
				if walkable {
					if let Some(layer) = sampler.sample_layer(world_position) {
						penalty = settings.terrain_penalty(layer);
					}
				} else {
					penalty += settings.get_obstacle_proximity_penalty();
					blocked += 1;
				}
				nodes.push(GridNode::new(
					walkable,
					world_position,
					GridCell::new(row, column),
					penalty,
				));
				penalties.push(penalty);
			}
		}
		let (blurred, penalty_range) =
			blur::box_blur(&penalties, rows, columns, settings.get_blur_size());
		for (node, penalty) in nodes.iter_mut().zip(blurred) {
			node.movement_penalty = penalty;
		}
		debug!(
			"Built {}x{} grid with {} unwalkable nodes, penalties range {:?}",
			rows, columns, blocked, penalty_range
		);
		Ok(Grid {
			settings,
			rows,
			columns,
			nodes,
			penalty_range,
		})
	}
	/// Settings the grid was built from
	pub fn get_settings(&self) -> &GridSettings {
		&self.settings
	}
	/// Number of nodes along `x`
	pub fn get_rows(&self) -> usize {
		self.rows
	}
	/// Number of nodes along `z`
	pub fn get_columns(&self) -> usize {
		self.columns
	}
	/// Total number of nodes, the most that can ever be in a search's open set
	pub fn get_max_size(&self) -> usize {
		self.rows * self.columns
	}
	/// Half the width of a node
	pub fn get_node_radius(&self) -> f32 {
		self.settings.get_node_radius()
	}
	/// Smallest and largest movement penalty across the grid
	pub fn get_penalty_range(&self) -> (i32, i32) {
		self.penalty_range
	}
	/// Iterate over every node, row by row
	pub fn iter(&self) -> impl Iterator<Item = &GridNode> {
		self.nodes.iter()
	}
	/// Whether a cell lies inside the grid
	pub fn contains_cell(&self, cell: GridCell) -> bool {
		cell.get_row() < self.rows && cell.get_column() < self.columns
	}
	/// Position of a cell within the node storage
	pub fn get_index(&self, cell: GridCell) -> usize {
		if !self.contains_cell(cell) {
			panic!("Cannot index Grid, out of bounds. Asked for row {}, column {}, grid has {} rows and {} columns", cell.get_row(), cell.get_column(), self.rows, self.columns);
		}
		cell.get_row() * self.columns + cell.get_column()
	}
	/// Retrieve the node at a cell
	pub fn get_node(&self, cell: GridCell) -> &GridNode {
		&self.nodes[self.get_index(cell)]
	}
	/// Retrieve a node by its storage index
	pub fn get_node_by_index(&self, index: usize) -> &GridNode {
		&self.nodes[index]
	}
	/// Find the up to 8 nodes surrounding a cell. The order is fixed, row
	/// offsets `-1..=1` outermost then column offsets `-1..=1`
	pub fn get_neighbours(&self, cell: GridCell) -> Vec<&GridNode> {
		let mut neighbours = Vec::with_capacity(8);
		let row = cell.get_row() as isize;
		let column = cell.get_column() as isize;
		for row_offset in -1..=1 {
			for column_offset in -1..=1 {
				if row_offset == 0 && column_offset == 0 {
					continue;
				}
				let check_row = row + row_offset;
				let check_column = column + column_offset;
				if check_row >= 0
					&& check_row < self.rows as isize
					&& check_column >= 0
					&& check_column < self.columns as isize
				{
					neighbours.push(
						self.get_node(GridCell::new(check_row as usize, check_column as usize)),
					);
				}
			}
		}
		neighbours
	}
	/// Find the node a world point lies in. Points outside of the grid
	/// resolve to the nearest edge node
	pub fn get_node_from_world_point(&self, point: Vec3) -> &GridNode {
		let origin = self.settings.get_origin();
		let size = self.settings.get_size();
		// how far along each axis the point is, 0 at the near edge and 1 at the far edge
		let percent_row = ((point.x - origin.x + size.x / 2.0) / size.x).clamp(0.0, 1.0);
		let percent_column = ((point.z - origin.z + size.y / 2.0) / size.y).clamp(0.0, 1.0);
		let row = ((self.rows - 1) as f32 * percent_row).round() as usize;
		let column = ((self.columns - 1) as f32 * percent_column).round() as usize;
		self.get_node(GridCell::new(row, column))
	}
}

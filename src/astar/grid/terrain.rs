//! Classifiers consulted while a [Grid] is built. Detecting obstacles and
//! identifying terrain is the job of whatever owns the world (a physics
//! engine, a tile map, a navmesh bake) so the grid only sees these two
//! traits.
//!
//! Closures implement both traits so a quick test or prototype can do:
//!
//! ```
//! use bevy::prelude::*;
//! use bevy_astar_grid_plugin::prelude::*;
//!
//! let settings = GridSettings::new(Vec3::ZERO, Vec2::new(10.0, 10.0), 0.5);
//! let grid = Grid::new(
//! 	settings,
//! 	&|point: Vec3, _radius: f32| point.x.abs() > 1.0,
//! 	&|_point: Vec3| -> Option<u32> { None },
//! )
//! .unwrap();
//! assert_eq!(100, grid.get_max_size());
//! ```
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Decides whether a point in the world is free of obstacles
pub trait ObstacleClassifier: Send + Sync {
	/// `true` when a probe of `radius` centred at `point` touches nothing
	/// an actor would collide with
	fn is_walkable(&self, point: Vec3, radius: f32) -> bool;
}

impl<F> ObstacleClassifier for F
where
	F: Fn(Vec3, f32) -> bool + Send + Sync,
{
	fn is_walkable(&self, point: Vec3, radius: f32) -> bool {
		self(point, radius)
	}
}

/// Identifies the terrain layer beneath a point
pub trait TerrainSampler: Send + Sync {
	/// Layer id of the surface at `point`, [None] when there isn't one
	fn sample_layer(&self, point: Vec3) -> Option<u32>;
}

impl<F> TerrainSampler for F
where
	F: Fn(Vec3) -> Option<u32> + Send + Sync,
{
	fn sample_layer(&self, point: Vec3) -> Option<u32> {
		self(point)
	}
}

/// Value of a [LayerMap] cell that blocks movement
pub const OBSTACLE_LAYER: u8 = 255;

/// A raster of terrain layer ids laid over a rectangle of the world. Cells
/// holding [OBSTACLE_LAYER] are obstacles, any other value is the layer id
/// of the terrain there. Raster rows run along `x` and raster columns along
/// `z`, the same orientation as a [Grid]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct LayerMap {
	/// Centre of the covered rectangle
	origin: Vec3,
	/// Length along `x` and depth along `z` of the covered rectangle
	size: Vec2,
	/// Layer ids indexed `[row][column]`
	cells: Vec<Vec<u8>>,
}

impl LayerMap {
	/// Create a new instance of [LayerMap]. Every row must have the same
	/// number of columns
	pub fn new(origin: Vec3, size: Vec2, cells: Vec<Vec<u8>>) -> Result<Self, GridError> {
		let Some(first) = cells.first() else {
			return Err(GridError::MalformedLayerMap("no rows".to_string()));
		};
		let columns = first.len();
		if columns == 0 {
			return Err(GridError::MalformedLayerMap("no columns".to_string()));
		}
		if let Some((i, row)) = cells.iter().enumerate().find(|(_, r)| r.len() != columns) {
			return Err(GridError::MalformedLayerMap(format!(
				"row {} has {} columns, expected {}",
				i,
				row.len(),
				columns
			)));
		}
		if !size.is_finite() || size.x <= 0.0 || size.y <= 0.0 {
			return Err(GridError::InvalidSize(size.x, size.y));
		}
		Ok(LayerMap {
			origin,
			size,
			cells,
		})
	}
	/// Number of raster rows
	pub fn get_rows(&self) -> usize {
		self.cells.len()
	}
	/// Number of raster columns
	pub fn get_columns(&self) -> usize {
		self.cells[0].len()
	}
	/// Retrieve the raw value of a raster cell
	pub fn get_cell_value(&self, row: usize, column: usize) -> u8 {
		if row >= self.get_rows() || column >= self.get_columns() {
			panic!("Cannot get a LayerMap value, index out of bounds. Asked for row {}, column {}, map has {} rows and {} columns", row, column, self.get_rows(), self.get_columns());
		}
		self.cells[row][column]
	}
	/// Find the raster value under a world point, [None] outside of the
	/// covered rectangle
	fn value_at(&self, point: Vec3) -> Option<u8> {
		let percent_row = (point.x - self.origin.x + self.size.x / 2.0) / self.size.x;
		let percent_column = (point.z - self.origin.z + self.size.y / 2.0) / self.size.y;
		if !(0.0..=1.0).contains(&percent_row) || !(0.0..=1.0).contains(&percent_column) {
			return None;
		}
		// a point on the far edge belongs to the last cell
		let row = ((percent_row * self.get_rows() as f32) as usize).min(self.get_rows() - 1);
		let column =
			((percent_column * self.get_columns() as f32) as usize).min(self.get_columns() - 1);
		Some(self.cells[row][column])
	}
	/// From a `csv` file of `u8` values generate a [LayerMap] covering `size`
	/// world units centred on `origin`. Each line of the file is a raster row
	#[cfg(feature = "csv")]
	pub fn from_csv(path: &str, origin: Vec3, size: Vec2) -> Result<Self, GridError> {
		let data = std::fs::File::open(path)?;
		let mut rdr = csv::ReaderBuilder::new()
			.has_headers(false)
			.from_reader(data);
		let mut cells = Vec::new();
		for record in rdr.records() {
			let mut row = Vec::new();
			for value in record?.iter() {
				let layer: u8 = value.trim().parse().map_err(|_| {
					GridError::MalformedLayerMap(format!("`{}` is not a u8 layer id", value))
				})?;
				row.push(layer);
			}
			cells.push(row);
		}
		LayerMap::new(origin, size, cells)
	}
	/// From a `ron` file generate the [LayerMap]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: &str) -> Result<Self, GridError> {
		let file = std::fs::File::open(path)?;
		let map: LayerMap = ron::de::from_reader(file)?;
		LayerMap::new(map.origin, map.size, map.cells)
	}
}

impl ObstacleClassifier for LayerMap {
	fn is_walkable(&self, point: Vec3, _radius: f32) -> bool {
		// anything outside of the raster is treated as open ground
		self.value_at(point) != Some(OBSTACLE_LAYER)
	}
}

impl TerrainSampler for LayerMap {
	fn sample_layer(&self, point: Vec3) -> Option<u32> {
		match self.value_at(point) {
			Some(OBSTACLE_LAYER) | None => None,
			Some(layer) => Some(layer as u32),
		}
	}
}

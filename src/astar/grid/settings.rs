//! Describes the world region a [Grid] covers and how terrain is costed
//!

use crate::prelude::*;
use bevy::prelude::*;

/// Associates a set of terrain layers with an extra cost of walking on them
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub struct TerrainLayer {
	/// Bitmask of the layer ids this entry applies to, layer `n` is bit `1 << n`
	mask: u32,
	/// Penalty added to the movement cost of nodes on a matching layer
	penalty: i32,
}

impl TerrainLayer {
	/// Create a new instance of [TerrainLayer]
	pub fn new(mask: u32, penalty: i32) -> Self {
		TerrainLayer { mask, penalty }
	}
	/// Create a [TerrainLayer] matching a single layer id
	pub fn from_layer(layer: u32, penalty: i32) -> Self {
		TerrainLayer {
			mask: layer_bit(layer),
			penalty,
		}
	}
	/// Bitmask of matching layer ids
	pub fn get_mask(&self) -> u32 {
		self.mask
	}
	/// Extra cost of a matching node
	pub fn get_penalty(&self) -> i32 {
		self.penalty
	}
	/// Whether `layer` is part of this entries mask
	pub fn matches(&self, layer: u32) -> bool {
		self.mask & layer_bit(layer) != 0
	}
}

/// Mask bit of a layer id, ids past 31 have no bit
fn layer_bit(layer: u32) -> u32 {
	1u32.checked_shl(layer).unwrap_or(0)
}

/// Configuration used to build a [Grid]
#[cfg_attr(
	feature = "serde",
	derive(serde::Deserialize, serde::Serialize),
	serde(default)
)]
#[derive(Component, Clone, Debug, PartialEq, Reflect)]
pub struct GridSettings {
	/// Centre of the grid in world space. The grid spans the `x`-`z` plane
	/// and every node inherits the `y` of the origin
	origin: Vec3,
	/// Length along `x` and depth along `z` of the covered region
	size: Vec2,
	/// Half the width of a node
	node_radius: f32,
	/// Penalty assigned to unwalkable nodes, the blur pass bleeds it into
	/// the walkable nodes around obstacles so paths keep some distance
	obstacle_proximity_penalty: i32,
	/// Terrain costs, the first entry matching a sampled layer wins
	terrain_layers: Vec<TerrainLayer>,
	/// Extent of the box blur kernel, a kernel is `2 * blur_size + 1` wide
	blur_size: usize,
}

impl Default for GridSettings {
	fn default() -> Self {
		GridSettings {
			origin: Vec3::ZERO,
			size: Vec2::new(30.0, 30.0),
			node_radius: 0.5,
			obstacle_proximity_penalty: 10,
			terrain_layers: Vec::new(),
			blur_size: 3,
		}
	}
}

impl GridSettings {
	/// Create a new instance of [GridSettings] centred on `origin` covering
	/// `size` world units
	pub fn new(origin: Vec3, size: Vec2, node_radius: f32) -> Self {
		GridSettings {
			origin,
			size,
			node_radius,
			..default()
		}
	}
	/// Set the penalty of unwalkable nodes
	pub fn with_obstacle_proximity_penalty(mut self, penalty: i32) -> Self {
		self.obstacle_proximity_penalty = penalty;
		self
	}
	/// Set the terrain cost table
	pub fn with_terrain_layers(mut self, terrain_layers: Vec<TerrainLayer>) -> Self {
		self.terrain_layers = terrain_layers;
		self
	}
	/// Set the box blur extent, `0` disables smoothing
	pub fn with_blur_size(mut self, blur_size: usize) -> Self {
		self.blur_size = blur_size;
		self
	}
	/// Centre of the grid
	pub fn get_origin(&self) -> Vec3 {
		self.origin
	}
	/// World extent along `x` and `z`
	pub fn get_size(&self) -> Vec2 {
		self.size
	}
	/// Half the width of a node
	pub fn get_node_radius(&self) -> f32 {
		self.node_radius
	}
	/// Width of a node
	pub fn get_node_diameter(&self) -> f32 {
		self.node_radius * 2.0
	}
	/// Penalty carried by unwalkable nodes
	pub fn get_obstacle_proximity_penalty(&self) -> i32 {
		self.obstacle_proximity_penalty
	}
	/// Terrain cost table
	pub fn get_terrain_layers(&self) -> &[TerrainLayer] {
		&self.terrain_layers
	}
	/// Box blur extent
	pub fn get_blur_size(&self) -> usize {
		self.blur_size
	}
	/// Look up the penalty of a terrain layer, `0` when no entry matches
	pub fn terrain_penalty(&self, layer: u32) -> i32 {
		self.terrain_layers
			.iter()
			.find(|t| t.matches(layer))
			.map_or(0, |t| t.get_penalty())
	}
	/// Largest penalty a grid of `nodes` nodes accepts. A path visits each
	/// node at most once so the summed step costs and penalties of any path
	/// stay below [i32::MAX]
	pub fn get_max_penalty(nodes: usize) -> i32 {
		let per_node = (i32::MAX as usize / nodes.max(1)) as i32;
		(per_node - DIAGONAL_COST).max(0)
	}
	/// Ensure the settings describe a grid with at least one node and
	/// return the `(rows, columns)` it would have
	pub fn validate(&self) -> Result<(usize, usize), GridError> {
		if !self.node_radius.is_finite() || self.node_radius <= 0.0 {
			return Err(GridError::InvalidNodeRadius(self.node_radius));
		}
		if !self.size.is_finite() || self.size.x <= 0.0 || self.size.y <= 0.0 {
			return Err(GridError::InvalidSize(self.size.x, self.size.y));
		}
		let diameter = self.get_node_diameter();
		let rows = (self.size.x / diameter).round() as usize;
		let columns = (self.size.y / diameter).round() as usize;
		if rows == 0 || columns == 0 {
			return Err(GridError::EmptyGrid {
				width: self.size.x,
				depth: self.size.y,
				node_radius: self.node_radius,
				rows,
				columns,
			});
		}
		let nodes = rows * columns;
		let max = GridSettings::get_max_penalty(nodes);
		let penalties = std::iter::once(self.obstacle_proximity_penalty)
			.chain(self.terrain_layers.iter().map(|t| t.get_penalty()));
		for penalty in penalties {
			if !(0..=max).contains(&penalty) {
				return Err(GridError::InvalidPenalty {
					penalty,
					max,
					nodes,
				});
			}
		}
		Ok((rows, columns))
	}
	/// From a `ron` file generate the [GridSettings]
	#[cfg(feature = "ron")]
	pub fn from_ron(path: &str) -> Result<Self, GridError> {
		let file = std::fs::File::open(path)?;
		let settings: GridSettings = ron::de::from_reader(file)?;
		Ok(settings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	#[test]
	fn terrain_penalty_first_match() {
		let settings = GridSettings::default().with_terrain_layers(vec![
			TerrainLayer::from_layer(3, 5),
			TerrainLayer::new(0b1010, 20),
		]);
		assert_eq!(5, settings.terrain_penalty(3));
		assert_eq!(20, settings.terrain_penalty(1));
		assert_eq!(0, settings.terrain_penalty(2));
	}
	#[test]
	fn terrain_penalty_large_layer_id() {
		let settings = GridSettings::default().with_terrain_layers(vec![TerrainLayer::new(u32::MAX, 5)]);
		let result = settings.terrain_penalty(40);
		let actual = 0;
		assert_eq!(actual, result);
	}
	#[test]
	fn validate_rows_columns() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(30.0, 20.0), 0.5);
		let result = settings.validate().unwrap();
		let actual = (30, 20);
		assert_eq!(actual, result);
	}
	#[test]
	fn validate_rounds_to_nearest() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(10.4, 9.6), 1.0);
		let result = settings.validate().unwrap();
		let actual = (5, 5);
		assert_eq!(actual, result);
	}
	#[test]
	fn validate_zero_radius() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(10.0, 10.0), 0.0);
		assert!(matches!(
			settings.validate(),
			Err(GridError::InvalidNodeRadius(_))
		));
	}
	#[test]
	fn validate_negative_size() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(-10.0, 10.0), 0.5);
		assert!(matches!(settings.validate(), Err(GridError::InvalidSize(_, _))));
	}
	#[test]
	fn validate_too_small() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(0.5, 10.0), 1.0);
		assert!(matches!(settings.validate(), Err(GridError::EmptyGrid { .. })));
	}
	#[test]
	fn validate_negative_proximity_penalty() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(10.0, 10.0), 0.5)
			.with_obstacle_proximity_penalty(-50);
		let result = settings.validate();
		assert!(matches!(result, Err(GridError::InvalidPenalty { penalty: -50, .. })));
	}
	#[test]
	fn validate_negative_terrain_penalty() {
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(10.0, 10.0), 0.5)
			.with_terrain_layers(vec![TerrainLayer::from_layer(1, 5), TerrainLayer::from_layer(2, -1000)]);
		let result = settings.validate();
		assert!(matches!(result, Err(GridError::InvalidPenalty { penalty: -1000, .. })));
	}
	#[test]
	fn validate_penalty_too_large() {
		// 5x1 nodes
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(5.0, 1.0), 0.5)
			.with_terrain_layers(vec![TerrainLayer::from_layer(1, 1_500_000_000)]);
		let result = settings.validate();
		let actual = i32::MAX / 5 - DIAGONAL_COST;
		assert!(matches!(result, Err(GridError::InvalidPenalty { max, nodes: 5, .. }) if max == actual));
	}
	#[test]
	fn validate_penalty_at_limit() {
		let max = GridSettings::get_max_penalty(5);
		let settings = GridSettings::new(Vec3::ZERO, Vec2::new(5.0, 1.0), 0.5)
			.with_obstacle_proximity_penalty(max)
			.with_terrain_layers(vec![TerrainLayer::from_layer(1, max)]);
		let result = settings.validate().unwrap();
		let actual = (5, 1);
		assert_eq!(actual, result);
	}
	#[test]
	fn max_penalty_never_negative() {
		let result = GridSettings::get_max_penalty(usize::MAX);
		assert_eq!(0, result);
	}
	#[test]
	#[cfg(feature = "ron")]
	fn grid_settings_file_ron() {
		let path = env!("CARGO_MANIFEST_DIR").to_string() + "/assets/grid_settings.ron";
		let result = GridSettings::from_ron(&path).unwrap();
		assert_eq!(0.5, result.get_node_radius());
		assert_eq!(2, result.get_terrain_layers().len());
	}
}

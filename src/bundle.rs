//! Everything an entity needs to serve paths over a region of the world
//!

use std::sync::Arc;

use crate::prelude::*;
use bevy::prelude::*;

#[derive(Bundle)]
pub struct AStarGridBundle {
	/// Settings the grid was built from
	settings: GridSettings,
	/// Queues and runs searches over the grid
	broker: PathRequestBroker,
}

impl AStarGridBundle {
	/// Create a new instance of [AStarGridBundle], building the [Grid]
	/// described by `settings` with the world probed through `classifier`
	/// and `sampler`
	pub fn new<C, S>(
		settings: GridSettings,
		classifier: &C,
		sampler: &S,
		mode: BrokerMode,
	) -> Result<Self, GridError>
	where
		C: ObstacleClassifier + ?Sized,
		S: TerrainSampler + ?Sized,
	{
		let grid = Grid::new(settings.clone(), classifier, sampler)?;
		Ok(AStarGridBundle {
			settings,
			broker: PathRequestBroker::new(Arc::new(grid), mode),
		})
	}
	/// Create a new instance of [AStarGridBundle] where the [GridSettings]
	/// are read from disk
	#[cfg(feature = "ron")]
	pub fn from_ron<C, S>(
		path: &str,
		classifier: &C,
		sampler: &S,
		mode: BrokerMode,
	) -> Result<Self, GridError>
	where
		C: ObstacleClassifier + ?Sized,
		S: TerrainSampler + ?Sized,
	{
		let settings = GridSettings::from_ron(path)?;
		AStarGridBundle::new(settings, classifier, sampler, mode)
	}
	/// Settings the grid was built from
	pub fn get_settings(&self) -> &GridSettings {
		&self.settings
	}
	/// Broker serving paths over the grid
	pub fn get_broker(&self) -> &PathRequestBroker {
		&self.broker
	}
}

//! Defines the Bevy [Plugin] for AStarGrid
//!

use crate::prelude::*;
use bevy::prelude::*;

pub mod request_layer;

/// Orders the plugin systems within a frame
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum OrderingSet {
	/// New requests are moved into broker queues
	Queue,
	/// Finished searches are published
	Deliver,
}

/// Registers the grid types, path events and request systems
pub struct AStarGridPlugin;

impl Plugin for AStarGridPlugin {
	#[cfg(not(tarpaulin_include))]
	fn build(&self, app: &mut App) {
		app.register_type::<GridCell>()
			.register_type::<GridNode>()
			.register_type::<GridSettings>()
			.register_type::<TerrainLayer>()
			.register_type::<BrokerMode>()
			.add_event::<request_layer::EventPathRequest>()
			.add_event::<request_layer::EventPathResult>()
			.configure_sets(Update, (OrderingSet::Queue, OrderingSet::Deliver).chain())
			.add_systems(
				Update,
				(
					request_layer::event_insert_path_queue.in_set(OrderingSet::Queue),
					request_layer::poll_path_brokers.in_set(OrderingSet::Deliver),
				),
			);
	}
}

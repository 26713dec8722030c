//! `use bevy_astar_grid_plugin::prelude::*;` to import common structures and methods
//!

#[doc(hidden)]
pub use crate::astar::{
	error::*,
	grid::{blur::*, settings::*, terrain::*, *},
	heap::*,
	search::*,
};

#[doc(hidden)]
pub use crate::{
	bundle::*,
	plugin::{request_layer::*, *},
};

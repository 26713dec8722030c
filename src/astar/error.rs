//! Failure modes of building a [crate::prelude::Grid] and of running a
//! [crate::prelude::PathSearch]
//!

use thiserror::Error;

/// Misconfiguration detected while building a grid
#[derive(Error, Debug)]
pub enum GridError {
	/// Nodes need a positive radius to tile the world
	#[error("Node radius must be positive and finite, found {0}")]
	InvalidNodeRadius(f32),
	/// The world region covered by the grid has no area
	#[error("Grid world size must be positive and finite, found ({0}, {1})")]
	InvalidSize(f32, f32),
	/// Rounding the world size by the node diameter produced no nodes along an axis
	#[error("Grid of size ({width}, {depth}) with node radius {node_radius} has {rows} rows and {columns} columns")]
	EmptyGrid {
		/// Length along `x`
		width: f32,
		/// Depth along `z`
		depth: f32,
		/// Radius of each node
		node_radius: f32,
		/// Computed row count
		rows: usize,
		/// Computed column count
		columns: usize,
	},
	/// A penalty is negative or so large that summing it along a path could
	/// overflow the path cost
	#[error("Penalty {penalty} is outside of the allowed range 0..={max} for a grid of {nodes} nodes")]
	InvalidPenalty {
		/// The offending penalty
		penalty: i32,
		/// Largest penalty the grid allows
		max: i32,
		/// Number of nodes in the grid
		nodes: usize,
	},
	/// A layer map has no cells or ragged rows
	#[error("Layer map is malformed: {0}")]
	MalformedLayerMap(String),
	/// Reading a configuration file failed
	#[error("Failed opening file: {0}")]
	Io(#[from] std::io::Error),
	/// A `ron` file could not be deserialised
	#[cfg(feature = "ron")]
	#[error("Failed deserializing ron: {0}")]
	Ron(#[from] ron::error::SpannedError),
	/// A `csv` file could not be parsed
	#[cfg(feature = "csv")]
	#[error("Failed reading csv: {0}")]
	Csv(#[from] csv::Error),
}

/// Why a search did not produce a path
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchError {
	/// The open set was exhausted without reaching the target
	#[error("No path connects the start and target nodes")]
	UnreachableTarget,
	/// The start or target node cannot be walked on
	#[error("Start or target node is not walkable")]
	BlockedEndpoint,
	/// The iteration bound was exceeded, this points to a broken invariant
	/// in the search rather than a missing path
	#[error("Search exceeded {0} iterations without resolving")]
	SearchDivergence(usize),
}

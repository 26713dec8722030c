//! This is a plugin for Bevy game engine to build a grid over the world and
//! calculate A* paths across it, with terrain costs and a queue which
//! serialises path requests
//!

pub mod astar;
pub mod bundle;
pub mod plugin;

pub mod prelude;

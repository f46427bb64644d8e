//! Board rules for Sinkship.
//!
//! This crate holds the spatial model of the ship: tiles and their doors,
//! placement validation, route-finding between rooms and chain explosions.
//! It has no database, network or engine dependency. Storage and broadcast
//! are reached through the `TileStore` and `Notifier` traits, so the same
//! code runs under a server, the simtest harness and unit tests.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`board`] | Tile graph, dual id/cell index, placement rules, bounds |
//! | [`config`] | House-rule knobs loaded from JSON |
//! | [`constants`] | Fire range, damage threshold, row string tags |
//! | [`error`] | Hydration, storage and session errors |
//! | [`explosion`] | Breadth-first keg and fire propagation |
//! | [`notify`] | Structured notices for the broadcast layer |
//! | [`pathfinding`] | A* over the door connectivity graph |
//! | [`persistence`] | Tile rows, row conversion, storage backends |
//! | [`session`] | Board plus store plus notifier, as the turn layer sees it |
//! | [`tile`] | Directions, door masks, orientations, tile state |

pub mod board;
pub mod config;
pub mod constants;
pub mod error;
pub mod explosion;
pub mod notify;
pub mod pathfinding;
pub mod persistence;
pub mod session;
pub mod tile;

pub use board::Board;
pub use config::RulesConfig;
pub use session::ShipSession;

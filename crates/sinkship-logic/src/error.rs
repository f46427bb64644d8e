//! Error types for board hydration, storage and configuration.
//!
//! Rejected placements and unreachable routes are ordinary outcomes and never
//! show up here. These errors mean the data the board was handed cannot be
//! trusted.

use thiserror::Error;

use crate::tile::TileId;

/// Corrupted tile data found while rebuilding a board.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("tile id {0} appears more than once")]
    DuplicateTileId(TileId),

    #[error("tiles {existing} and {incoming} both claim position ({x}, {y})")]
    DuplicatePosition {
        x: i32,
        y: i32,
        existing: TileId,
        incoming: TileId,
    },

    #[error("tile {id} has only one of x/y set")]
    PartialPosition { id: TileId },

    #[error("tile {id} has invalid orientation {degrees}")]
    InvalidOrientation { id: TileId, degrees: i32 },

    #[error("tile {id} has door mask {bits:#06b} wider than four bits")]
    InvalidDoorMask { id: TileId, bits: u8 },

    #[error("tile {id} stores doors {stored:04b} but its orientation implies {expected:04b}")]
    DoorsMismatch { id: TileId, stored: u8, expected: u8 },

    #[error("tile {id} has fire level {level} outside 0..=6")]
    FireLevelOutOfRange { id: TileId, level: i32 },

    #[error("tile {id} has an exploded powder keg but no keg")]
    KegExplodedWithoutKeg { id: TileId },

    #[error("tile {id} has unknown color {tag:?}")]
    UnknownColor { id: TileId, tag: String },

    #[error("tile {id} has unknown tile type {tag:?}")]
    UnknownTileType { id: TileId, tag: String },
}

/// Failure inside a persistence backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Invalid rules configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not parse rules: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("critical explosion threshold must be at least 1")]
    ZeroThreshold,
}

/// Errors surfaced by a `ShipSession`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

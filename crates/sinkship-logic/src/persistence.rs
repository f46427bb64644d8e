//! Persistence rows and storage backends.
//!
//! `TileRow` is the flat record a storage backend keeps per tile. Conversion
//! is hand-written in both directions: `Tile::to_row` always succeeds, while
//! `Tile::try_from(TileRow)` checks every invariant and refuses rows that
//! could not have been written by this crate.
//!
//! Backends implement `TileStore` (read all rows, upsert one row). Two are
//! provided: an in-memory map for tests and a JSON array file.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::fire;
use crate::error::{BoardError, StoreError};
use crate::tile::{
    DoorMask, Orientation, Position, Tile, TileColor, TileDef, TileId, TileKind,
};

/// One persisted tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRow {
    pub id: TileId,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub fire_level: i32,
    pub doors: u8,
    pub original_doors: u8,
    pub orientation: i32,
    pub color: String,
    pub pips: u8,
    pub has_powder_keg: bool,
    pub powder_keg_exploded: bool,
    pub has_trapdoor: bool,
    pub is_starting_tile: bool,
    pub tile_type: String,
    pub is_exploded: bool,
    pub deckhand_count: u32,
    /// Owned by the tile-draw code; carried through untouched.
    pub draw_order: Option<i32>,
}

impl Tile {
    pub fn to_row(&self) -> TileRow {
        TileRow {
            id: self.id,
            x: self.position.map(|p| p.x),
            y: self.position.map(|p| p.y),
            fire_level: i32::from(self.fire_level),
            doors: self.doors.bits(),
            original_doors: self.def.doors.bits(),
            orientation: self.orientation.degrees(),
            color: self.def.color.tag().to_string(),
            pips: self.def.pips,
            has_powder_keg: self.def.has_powder_keg,
            powder_keg_exploded: self.powder_keg_exploded,
            has_trapdoor: self.def.has_trapdoor,
            is_starting_tile: self.def.is_starting_tile,
            tile_type: self.def.kind.tag().to_string(),
            is_exploded: self.is_exploded,
            deckhand_count: self.deckhands,
            draw_order: self.draw_order,
        }
    }
}

impl TryFrom<TileRow> for Tile {
    type Error = BoardError;

    fn try_from(row: TileRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let position = match (row.x, row.y) {
            (Some(x), Some(y)) => Some(Position::new(x, y)),
            (None, None) => None,
            _ => return Err(BoardError::PartialPosition { id }),
        };
        let orientation = Orientation::try_from_degrees(row.orientation).ok_or(
            BoardError::InvalidOrientation {
                id,
                degrees: row.orientation,
            },
        )?;
        let original_doors = DoorMask::from_bits(row.original_doors).ok_or(
            BoardError::InvalidDoorMask {
                id,
                bits: row.original_doors,
            },
        )?;
        let doors = DoorMask::from_bits(row.doors)
            .ok_or(BoardError::InvalidDoorMask { id, bits: row.doors })?;
        let expected = original_doors.rotated(orientation);
        if doors != expected {
            return Err(BoardError::DoorsMismatch {
                id,
                stored: doors.bits(),
                expected: expected.bits(),
            });
        }
        let fire_level = u8::try_from(row.fire_level)
            .ok()
            .filter(|&level| level <= fire::MAX_LEVEL)
            .ok_or(BoardError::FireLevelOutOfRange {
                id,
                level: row.fire_level,
            })?;
        if row.powder_keg_exploded && !row.has_powder_keg {
            return Err(BoardError::KegExplodedWithoutKeg { id });
        }
        let color = TileColor::from_tag(&row.color).ok_or_else(|| BoardError::UnknownColor {
            id,
            tag: row.color.clone(),
        })?;
        let kind = TileKind::from_tag(&row.tile_type).ok_or_else(|| {
            BoardError::UnknownTileType {
                id,
                tag: row.tile_type.clone(),
            }
        })?;

        Ok(Tile {
            id,
            def: TileDef {
                color,
                pips: row.pips,
                doors: original_doors,
                has_powder_keg: row.has_powder_keg,
                has_trapdoor: row.has_trapdoor,
                is_starting_tile: row.is_starting_tile,
                kind,
            },
            orientation,
            doors,
            position,
            fire_level,
            powder_keg_exploded: row.powder_keg_exploded,
            is_exploded: row.is_exploded,
            deckhands: row.deckhand_count,
            draw_order: row.draw_order,
        })
    }
}

/// Storage collaborator for tile rows.
pub trait TileStore {
    /// Every stored row, in any order.
    fn load_all_tiles(&self) -> Result<Vec<TileRow>, StoreError>;

    /// Insert or replace the row with `row.id`.
    fn save_tile(&mut self, row: &TileRow) -> Result<(), StoreError>;
}

/// In-memory store keyed by tile id.
#[derive(Debug, Clone, Default)]
pub struct MemoryTileStore {
    rows: BTreeMap<TileId, TileRow>,
    writes: usize,
}

impl MemoryTileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with rows from another backend.
    pub fn with_rows(rows: impl IntoIterator<Item = TileRow>) -> Self {
        Self {
            rows: rows.into_iter().map(|r| (r.id, r)).collect(),
            writes: 0,
        }
    }

    pub fn row(&self, id: TileId) -> Option<&TileRow> {
        self.rows.get(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of `save_tile` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl TileStore for MemoryTileStore {
    fn load_all_tiles(&self) -> Result<Vec<TileRow>, StoreError> {
        Ok(self.rows.values().cloned().collect())
    }

    fn save_tile(&mut self, row: &TileRow) -> Result<(), StoreError> {
        self.rows.insert(row.id, row.clone());
        self.writes += 1;
        Ok(())
    }
}

/// All rows as one pretty-printed JSON array, rewritten on every save.
/// A missing file reads as an empty ship.
#[derive(Debug, Clone)]
pub struct JsonTileStore {
    path: PathBuf,
}

impl JsonTileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_rows(&self, rows: &[TileRow]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(rows)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl TileStore for JsonTileStore {
    fn load_all_tiles(&self) -> Result<Vec<TileRow>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_tile(&mut self, row: &TileRow) -> Result<(), StoreError> {
        let mut rows = self.load_all_tiles()?;
        match rows.iter_mut().find(|r| r.id == row.id) {
            Some(existing) => *existing = row.clone(),
            None => rows.push(row.clone()),
        }
        rows.sort_by_key(|r| r.id);
        self.write_rows(&rows)
    }
}

//! The ship board: placed tiles indexed by id and by grid cell.
//!
//! `Board` owns every `Tile`. Two indexes are kept: `tiles` (by id, every
//! tile including drawn-but-unplaced ones) and `positions` (by cell, placed
//! tiles only). `set_position` is the only code that writes a tile's
//! position, and it updates both indexes together.
//!
//! Placement rule for non-starting tiles: every occupied neighbour must agree
//! on the shared edge (both doors or both walls), and at least one shared
//! edge must be a door pair.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::RulesConfig;
use crate::error::BoardError;
use crate::explosion::{self, ChainExplosion};
use crate::persistence::TileRow;
use crate::tile::{Direction, DoorMask, Orientation, Position, Tile, TileDef, TileId};

/// Verdict of a placement check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementCheck {
    /// The cell already holds a tile.
    Occupied,
    /// A door faces a neighbour's wall, or a wall faces its door.
    DoorMismatch { direction: Direction },
    /// No neighbour shares a door pair with the tile.
    NoConnection,
    /// Placement allowed. Starting tiles report zero connections.
    Valid { connections: u32 },
}

impl PlacementCheck {
    pub fn is_valid(self) -> bool {
        matches!(self, PlacementCheck::Valid { .. })
    }
}

/// A legal cell and orientation for a candidate tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementOption {
    pub x: i32,
    pub y: i32,
    /// Degrees: 0, 90, 180 or 270.
    pub orientation: i32,
}

/// Bounding box over every placed tile (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShipBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

/// All tiles of one ship.
#[derive(Debug, Clone)]
pub struct Board {
    tiles: BTreeMap<TileId, Tile>,
    positions: HashMap<Position, TileId>,
    /// `None` once every id has been handed out.
    next_id: Option<TileId>,
    rules: RulesConfig,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self::with_rules(RulesConfig::default())
    }

    pub fn with_rules(rules: RulesConfig) -> Self {
        Self {
            tiles: BTreeMap::new(),
            positions: HashMap::new(),
            next_id: Some(1),
            rules,
        }
    }

    /// Rebuild a board from persisted rows.
    ///
    /// Any corrupted row (bad orientation, doors that disagree with the
    /// orientation, two tiles on one cell, ...) aborts the whole load. The
    /// board never picks a winner between conflicting rows.
    pub fn hydrate(rows: Vec<TileRow>, rules: RulesConfig) -> Result<Self, BoardError> {
        let mut board = Self::with_rules(rules);
        for row in rows {
            let tile = Tile::try_from(row)?;
            board.index(tile)?;
        }
        log::info!(
            "Board hydrated: {} tiles, {} placed",
            board.len(),
            board.placed_count()
        );
        Ok(board)
    }

    pub fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    // ── Index maintenance ───────────────────────────────────────────────

    fn index(&mut self, mut tile: Tile) -> Result<TileId, BoardError> {
        let id = tile.id;
        if self.tiles.contains_key(&id) {
            return Err(BoardError::DuplicateTileId(id));
        }
        let position = tile.position.take();
        if let Some(position) = position {
            if let Some(&existing) = self.positions.get(&position) {
                return Err(BoardError::DuplicatePosition {
                    x: position.x,
                    y: position.y,
                    existing,
                    incoming: id,
                });
            }
        }
        self.tiles.insert(id, tile);
        if let Some(position) = position {
            self.set_position(id, position);
        }
        self.next_id = match (self.next_id, id.checked_add(1)) {
            (Some(next), Some(after)) => Some(next.max(after)),
            _ => None,
        };
        Ok(id)
    }

    /// Caller guarantees `position` is free.
    fn set_position(&mut self, id: TileId, position: Position) {
        if let Some(tile) = self.tiles.get_mut(&id) {
            tile.position = Some(position);
            self.positions.insert(position, id);
        }
    }

    // ── Placement ───────────────────────────────────────────────────────

    /// Add a drawn tile to the board without placing it. `None` when the
    /// id space is used up; ids are never reused.
    pub fn register_tile(&mut self, def: TileDef) -> Option<TileId> {
        let Some(id) = self.next_id else {
            log::warn!("Can't register tile - no tile ids left");
            return None;
        };
        self.next_id = id.checked_add(1);
        // Unplaced: id index only.
        self.tiles.insert(id, Tile::new(id, def));
        Some(id)
    }

    /// Place a registered, not yet placed tile at `(x, y)`.
    ///
    /// Fails on an occupied cell. Otherwise the orientation is applied to the
    /// tile (even if the door check then fails), non-starting tiles are
    /// checked against their neighbours, and on success the tile is indexed
    /// at its new cell.
    pub fn place_tile(&mut self, id: TileId, x: i32, y: i32, orientation: i32) -> bool {
        let position = Position::new(x, y);
        if self.positions.contains_key(&position) {
            log::warn!("Can't place tile {} - ({}, {}) is occupied", id, x, y);
            return false;
        }
        let Some(tile) = self.tiles.get_mut(&id) else {
            log::warn!("Can't place tile {} - unknown id", id);
            return false;
        };
        if tile.position.is_some() {
            log::warn!("Can't place tile {} - already on the board", id);
            return false;
        }

        let orientation = Orientation::from_degrees(orientation);
        tile.apply_orientation(orientation);
        let doors = tile.doors();
        let starting = tile.is_starting_tile();
        if !starting {
            let check = self.check_doors(position, doors);
            if !check.is_valid() {
                log::warn!("Can't place tile {} at ({}, {}): {:?}", id, x, y, check);
                return false;
            }
        }

        self.set_position(id, position);
        log::info!(
            "Tile {} placed at ({}, {}) facing {}°",
            id,
            x,
            y,
            orientation.degrees()
        );
        true
    }

    /// Check first, then register and place. Nothing is added to the board
    /// when the placement is rejected.
    pub fn place_new(&mut self, def: TileDef, x: i32, y: i32, orientation: i32) -> Option<TileId> {
        let check = self.check_placement(&def, x, y, orientation);
        if !check.is_valid() {
            log::warn!("Can't place new tile at ({}, {}): {:?}", x, y, check);
            return None;
        }
        let id = self.register_tile(def)?;
        self.place_tile(id, x, y, orientation).then_some(id)
    }

    /// Put the setup room at the origin.
    pub fn setup_starting_tile(&mut self, def: TileDef) -> Option<TileId> {
        self.place_new(def, 0, 0, 0)
    }

    /// Read-only placement verdict for a hypothetical tile.
    pub fn check_placement(
        &self,
        def: &TileDef,
        x: i32,
        y: i32,
        orientation: i32,
    ) -> PlacementCheck {
        let position = Position::new(x, y);
        if self.positions.contains_key(&position) {
            return PlacementCheck::Occupied;
        }
        if def.is_starting_tile {
            return PlacementCheck::Valid { connections: 0 };
        }
        self.check_doors(position, def.doors_at(Orientation::from_degrees(orientation)))
    }

    /// Connection rule for `doors` at a free cell.
    fn check_doors(&self, position: Position, doors: DoorMask) -> PlacementCheck {
        let mut connections = 0;
        for direction in Direction::ALL {
            let Some(neighbor) = self.tile_beside(position, direction) else {
                continue;
            };
            match (doors.has(direction), neighbor.has_door(direction.opposite())) {
                (true, true) => connections += 1,
                (false, false) => {}
                _ if self.rules.enforce_door_matching => {
                    return PlacementCheck::DoorMismatch { direction };
                }
                _ => {}
            }
        }
        if connections == 0 {
            PlacementCheck::NoConnection
        } else {
            PlacementCheck::Valid { connections }
        }
    }

    /// Every empty cell next to the ship where `def` fits, with the first
    /// orientation (0°, 90°, 180°, 270°) that passes. One entry per cell.
    pub fn valid_placement_positions(&self, def: &TileDef) -> Vec<PlacementOption> {
        let mut checked = HashSet::new();
        let mut options = Vec::new();
        for tile in self.placed_tiles() {
            let Some(origin) = tile.position else {
                continue;
            };
            for direction in Direction::ALL {
                let Some(cell) = origin.step(direction) else {
                    continue;
                };
                if self.positions.contains_key(&cell) || !checked.insert(cell) {
                    continue;
                }
                let fits = Orientation::ALL
                    .into_iter()
                    .find(|&o| self.check_doors(cell, def.doors_at(o)).is_valid());
                if let Some(orientation) = fits {
                    options.push(PlacementOption {
                        x: cell.x,
                        y: cell.y,
                        orientation: orientation.degrees(),
                    });
                }
            }
        }
        options
    }

    // ── Lookups ─────────────────────────────────────────────────────────

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(&id)
    }

    /// Mutable access for state changes (fire, deckhands, keg). Positions
    /// can only change through placement.
    pub fn tile_mut(&mut self, id: TileId) -> Option<&mut Tile> {
        self.tiles.get_mut(&id)
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tile_at_position(Position::new(x, y))
    }

    pub fn tile_at_position(&self, position: Position) -> Option<&Tile> {
        self.positions.get(&position).and_then(|id| self.tiles.get(id))
    }

    /// The tile on the adjacent cell. Nothing lies past the grid edge.
    fn tile_beside(&self, position: Position, direction: Direction) -> Option<&Tile> {
        self.tile_at_position(position.step(direction)?)
    }

    /// All tiles in id order, placed or not.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values()
    }

    /// Placed tiles in id order.
    pub fn placed_tiles(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles.values().filter(|t| t.position.is_some())
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn placed_count(&self) -> usize {
        self.positions.len()
    }

    // ── Adjacency ───────────────────────────────────────────────────────

    /// Neighbours reachable through a door pair, in N/E/S/W order.
    pub fn connected_tiles(&self, id: TileId) -> Vec<&Tile> {
        self.connected_ids(id)
            .into_iter()
            .filter_map(|n| self.tiles.get(&n))
            .collect()
    }

    pub fn connected_ids(&self, id: TileId) -> Vec<TileId> {
        let Some(tile) = self.tiles.get(&id) else {
            return Vec::new();
        };
        let Some(position) = tile.position else {
            return Vec::new();
        };
        Direction::ALL
            .into_iter()
            .filter(|&d| tile.has_door(d))
            .filter_map(|d| {
                let neighbor = self.tile_beside(position, d)?;
                neighbor.has_door(d.opposite()).then_some(neighbor.id)
            })
            .collect()
    }

    /// Tiles on the four adjacent cells, walls or not, in N/E/S/W order.
    pub fn neighbors(&self, id: TileId) -> Vec<TileId> {
        self.tiles
            .get(&id)
            .and_then(|t| t.position)
            .map(|position| {
                Direction::ALL
                    .into_iter()
                    .filter_map(|d| self.tile_beside(position, d).map(|t| t.id))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ── Fire & damage ───────────────────────────────────────────────────

    /// Set a tile's fire level (clamped). Returns the new level.
    pub fn set_fire_level(&mut self, id: TileId, level: i32) -> Option<u8> {
        let tile = self.tiles.get_mut(&id)?;
        tile.set_fire_level(level);
        Some(tile.fire_level())
    }

    /// Run the chain explosion starting at `start`.
    pub fn handle_chain_explosions(&mut self, start: TileId) -> ChainExplosion {
        explosion::handle_chain_explosions(self, start)
    }

    /// Tiles at max fire or with a detonated keg.
    pub fn critical_damage_count(&self) -> u32 {
        self.tiles.values().filter(|t| t.is_critical()).count() as u32
    }

    /// Critical damage against the configured threshold.
    pub fn is_critically_damaged(&self) -> bool {
        self.is_critically_damaged_at(self.rules.critical_explosion_threshold)
    }

    pub fn is_critically_damaged_at(&self, max_explosions: u32) -> bool {
        self.critical_damage_count() >= max_explosions
    }

    /// Bounding box of placed tiles; all zero on an empty board.
    pub fn ship_bounds(&self) -> ShipBounds {
        let mut cells = self.positions.keys();
        let Some(first) = cells.next() else {
            return ShipBounds::default();
        };
        cells.fold(
            ShipBounds {
                min_x: first.x,
                max_x: first.x,
                min_y: first.y,
                max_y: first.y,
            },
            |b, p| ShipBounds {
                min_x: b.min_x.min(p.x),
                max_x: b.max_x.max(p.x),
                min_y: b.min_y.min(p.y),
                max_y: b.max_y.max(p.y),
            },
        )
    }

    /// Every tile as a persistence row, in id order.
    pub fn to_rows(&self) -> Vec<TileRow> {
        self.tiles.values().map(Tile::to_row).collect()
    }
}

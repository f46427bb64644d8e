//! Chain explosions: breadth-first fire and keg propagation.
//!
//! Algorithm:
//! 1. Queue the trigger tile; keep a processed set keyed by tile id
//! 2. Pop a tile, skip it if already processed, then mark it processed
//! 3. Re-check `will_explode` (an earlier step may have changed it); skip if not
//! 4. Classify: live keg → `PowderKeg` (keg flag flips), otherwise `Fire`
//! 5. Force fire to max and record the event
//! 6. Every tile on an adjacent cell gets +1 fire, walls or not, and is queued
//!    unless already processed
//!
//! Each tile explodes at most once per call, so the loop ends after at most
//! one pass per tile.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::board::Board;
use crate::constants::{explosion_tags, fire};
use crate::tile::TileId;

/// What set the room off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExplosionKind {
    PowderKeg,
    Fire,
}

impl ExplosionKind {
    pub const fn tag(self) -> &'static str {
        match self {
            ExplosionKind::PowderKeg => explosion_tags::POWDER_KEG,
            ExplosionKind::Fire => explosion_tags::FIRE,
        }
    }
}

/// One room that exploded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionEvent {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: ExplosionKind,
    pub tile_id: TileId,
}

/// Result of one propagation call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainExplosion {
    /// Exploded rooms in the order they went off.
    pub exploded: Vec<ExplosionEvent>,
    /// Every tile whose state was written, in write order, without
    /// duplicates. The caller persists these.
    pub touched: Vec<TileId>,
}

impl ChainExplosion {
    pub fn is_empty(&self) -> bool {
        self.exploded.is_empty()
    }
}

/// Run the chain starting at `start`. A trigger that is unknown, unplaced,
/// or not ready to explode produces an empty result and changes nothing.
pub fn handle_chain_explosions(board: &mut Board, start: TileId) -> ChainExplosion {
    let mut result = ChainExplosion::default();
    let mut touched = HashSet::new();
    let mut processed = HashSet::new();
    let mut queue = VecDeque::from([start]);

    while let Some(id) = queue.pop_front() {
        if !processed.insert(id) {
            continue;
        }
        let Some(tile) = board.tile_mut(id) else {
            continue;
        };
        let Some(position) = tile.position() else {
            log::debug!("Tile {} is not on the board, nothing to explode", id);
            continue;
        };
        if !tile.will_explode() {
            continue;
        }

        let kind = if tile.has_live_powder_keg() {
            tile.explode_powder_keg();
            ExplosionKind::PowderKeg
        } else {
            ExplosionKind::Fire
        };
        tile.set_fire_level(i32::from(fire::MAX_LEVEL));
        tile.mark_exploded();
        result.exploded.push(ExplosionEvent {
            x: position.x,
            y: position.y,
            kind,
            tile_id: id,
        });
        log::debug!(
            "Tile {} exploded ({}) at ({}, {})",
            id,
            kind.tag(),
            position.x,
            position.y
        );

        for neighbor in board.neighbors(id) {
            if let Some(tile) = board.tile_mut(neighbor) {
                tile.increase_fire_level(1);
            }
            if touched.insert(neighbor) {
                result.touched.push(neighbor);
            }
            if !processed.contains(&neighbor) {
                queue.push_back(neighbor);
            }
        }
        if touched.insert(id) {
            result.touched.push(id);
        }
    }

    if !result.exploded.is_empty() {
        log::info!(
            "Chain explosion from tile {}: {} rooms exploded, {} tiles changed",
            start,
            result.exploded.len(),
            result.touched.len()
        );
    }
    result
}

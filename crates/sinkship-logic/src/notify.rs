//! Structured board notices for the broadcast layer.
//!
//! The board never formats player-facing text. It hands a `BoardNotice` to
//! a `Notifier` after each placement, fire change and explosion; what the
//! notifier does with it (chat line, network push, log) is its business.

use serde::{Deserialize, Serialize};

use crate::explosion::ExplosionKind;
use crate::tile::{Tile, TileId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Placed,
    FireChanged,
    Explosion(ExplosionKind),
}

/// Payload for one board change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardNotice {
    pub tile_id: TileId,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub kind: NoticeKind,
    /// Fire level after the change.
    pub fire_level: u8,
}

impl BoardNotice {
    pub fn for_tile(tile: &Tile, kind: NoticeKind) -> Self {
        let position = tile.position();
        Self {
            tile_id: tile.id(),
            x: position.map(|p| p.x),
            y: position.map(|p| p.y),
            kind,
            fire_level: tile.fire_level(),
        }
    }
}

/// Broadcast collaborator.
pub trait Notifier {
    fn notify(&mut self, notice: BoardNotice);
}

/// Drops every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn notify(&mut self, _notice: BoardNotice) {}
}

/// Keeps every notice in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    pub notices: Vec<BoardNotice>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the notices received so far.
    pub fn drain(&mut self) -> Vec<BoardNotice> {
        std::mem::take(&mut self.notices)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&mut self, notice: BoardNotice) {
        self.notices.push(notice);
    }
}

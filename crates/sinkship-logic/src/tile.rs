//! Room tiles: door geometry, orientation, fire and keg state.
//!
//! A tile pairs an authored `TileDef` (color, pips, doors as printed, keg and
//! trapdoor markers) with runtime state. The effective door mask is always
//! derived from the authored mask and the current orientation, never set
//! directly.
//!
//! Grid convention: `x` grows east, `y` grows south, so north of `(0, 0)` is
//! `(0, -1)`.

use serde::{Deserialize, Serialize};

use crate::constants::{color_tags, fire, tile_tags};

/// Stable tile identifier, assigned once and never reused.
pub type TileId = u32;

/// A cell on the ship grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The adjacent cell one step in `direction`, or `None` past the edge
    /// of the `i32` grid.
    pub fn step(self, direction: Direction) -> Option<Self> {
        let (dx, dy) = direction.offset();
        Some(Self {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// Grid steps between two cells, ignoring walls.
    pub fn manhattan(self, other: Position) -> u32 {
        self.x.abs_diff(other.x).saturating_add(self.y.abs_diff(other.y))
    }
}

/// Cardinal edge of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// All four directions in clockwise order starting north.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Bit used for this edge in a `DoorMask`.
    pub const fn bit(self) -> u8 {
        match self {
            Direction::North => 0b0001,
            Direction::East => 0b0010,
            Direction::South => 0b0100,
            Direction::West => 0b1000,
        }
    }

    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    pub const fn clockwise(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub const fn counter_clockwise(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::East => Direction::North,
            Direction::South => Direction::East,
            Direction::West => Direction::South,
        }
    }

    /// Grid delta `(dx, dy)` of one step in this direction.
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }
}

/// Four-bit doorway mask, one bit per cardinal edge (N=1, E=2, S=4, W=8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorMask(u8);

impl DoorMask {
    pub const NONE: DoorMask = DoorMask(0);
    pub const ALL: DoorMask = DoorMask(0b1111);

    /// Build a mask from raw bits. Returns `None` if any bit above the low
    /// four is set.
    pub const fn from_bits(bits: u8) -> Option<Self> {
        if bits & !0b1111 == 0 {
            Some(Self(bits))
        } else {
            None
        }
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn from_directions(directions: &[Direction]) -> Self {
        directions
            .iter()
            .fold(Self::NONE, |mask, &direction| mask.with(direction))
    }

    pub const fn has(self, direction: Direction) -> bool {
        self.0 & direction.bit() != 0
    }

    pub const fn with(self, direction: Direction) -> Self {
        Self(self.0 | direction.bit())
    }

    /// Number of doorways.
    pub const fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Every door moves one edge clockwise: N→E→S→W→N.
    pub const fn rotate_clockwise(self) -> Self {
        Self(((self.0 << 1) | (self.0 >> 3)) & 0b1111)
    }

    /// Every door moves one edge counter-clockwise: N→W→S→E→N.
    pub const fn rotate_counter_clockwise(self) -> Self {
        Self(((self.0 >> 1) | (self.0 << 3)) & 0b1111)
    }

    /// The mask after turning the tile to `orientation` from its authored
    /// position.
    pub const fn rotated(self, orientation: Orientation) -> Self {
        match orientation {
            Orientation::Deg0 => self,
            Orientation::Deg90 => self.rotate_clockwise(),
            Orientation::Deg180 => self.rotate_clockwise().rotate_clockwise(),
            Orientation::Deg270 => self.rotate_counter_clockwise(),
        }
    }
}

/// Tile rotation in quarter turns, measured clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Orientation {
    pub const ALL: [Orientation; 4] = [
        Orientation::Deg0,
        Orientation::Deg90,
        Orientation::Deg180,
        Orientation::Deg270,
    ];

    /// Normalize any angle into a quarter turn. Wraps modulo 360 (negative
    /// angles wrap positive); angles between quarter turns round down.
    pub const fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) / 90 {
            0 => Orientation::Deg0,
            1 => Orientation::Deg90,
            2 => Orientation::Deg180,
            _ => Orientation::Deg270,
        }
    }

    /// Exact conversion; only 0, 90, 180 and 270 are accepted.
    pub const fn try_from_degrees(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(Orientation::Deg0),
            90 => Some(Orientation::Deg90),
            180 => Some(Orientation::Deg180),
            270 => Some(Orientation::Deg270),
            _ => None,
        }
    }

    pub const fn degrees(self) -> i32 {
        self.quarter_turns() as i32 * 90
    }

    pub const fn quarter_turns(self) -> u8 {
        match self {
            Orientation::Deg0 => 0,
            Orientation::Deg90 => 1,
            Orientation::Deg180 => 2,
            Orientation::Deg270 => 3,
        }
    }

    pub const fn clockwise(self) -> Self {
        Self::from_degrees(self.degrees() + 90)
    }

    pub const fn counter_clockwise(self) -> Self {
        Self::from_degrees(self.degrees() - 90)
    }
}

/// Color category printed on a room tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileColor {
    Red,
    Yellow,
    Blue,
    Green,
    Black,
}

impl TileColor {
    pub const fn tag(self) -> &'static str {
        match self {
            TileColor::Red => color_tags::RED,
            TileColor::Yellow => color_tags::YELLOW,
            TileColor::Blue => color_tags::BLUE,
            TileColor::Green => color_tags::GREEN,
            TileColor::Black => color_tags::BLACK,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            color_tags::RED => Some(TileColor::Red),
            color_tags::YELLOW => Some(TileColor::Yellow),
            color_tags::BLUE => Some(TileColor::Blue),
            color_tags::GREEN => Some(TileColor::Green),
            color_tags::BLACK => Some(TileColor::Black),
            _ => None,
        }
    }
}

/// Tile-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Room,
    StartingRoom,
}

impl TileKind {
    pub const fn tag(self) -> &'static str {
        match self {
            TileKind::Room => tile_tags::ROOM,
            TileKind::StartingRoom => tile_tags::STARTING_ROOM,
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            tile_tags::ROOM => Some(TileKind::Room),
            tile_tags::STARTING_ROOM => Some(TileKind::StartingRoom),
            _ => None,
        }
    }
}

/// Static, rules-defined attributes of a tile as printed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDef {
    pub color: TileColor,
    pub pips: u8,
    /// Doors in the authored (0°) orientation.
    pub doors: DoorMask,
    pub has_powder_keg: bool,
    pub has_trapdoor: bool,
    pub is_starting_tile: bool,
    pub kind: TileKind,
}

impl TileDef {
    /// An ordinary room.
    pub fn room(color: TileColor, pips: u8, doors: DoorMask) -> Self {
        Self {
            color,
            pips,
            doors,
            has_powder_keg: false,
            has_trapdoor: false,
            is_starting_tile: false,
            kind: TileKind::Room,
        }
    }

    /// A setup room that bypasses connection checks.
    pub fn starting(doors: DoorMask) -> Self {
        Self {
            color: TileColor::Black,
            pips: 0,
            doors,
            has_powder_keg: false,
            has_trapdoor: false,
            is_starting_tile: true,
            kind: TileKind::StartingRoom,
        }
    }

    pub fn with_powder_keg(mut self) -> Self {
        self.has_powder_keg = true;
        self
    }

    pub fn with_trapdoor(mut self) -> Self {
        self.has_trapdoor = true;
        self
    }

    /// Effective doors for a hypothetical orientation. Pure; used by
    /// placement search instead of cloning tiles.
    pub fn doors_at(&self, orientation: Orientation) -> DoorMask {
        self.doors.rotated(orientation)
    }
}

/// One room tile: identity, authored definition and mutable game state.
///
/// Invariants: `doors == def.doors.rotated(orientation)`,
/// `fire_level <= fire::MAX_LEVEL`, and `powder_keg_exploded` implies
/// `def.has_powder_keg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    pub(crate) id: TileId,
    pub(crate) def: TileDef,
    pub(crate) orientation: Orientation,
    pub(crate) doors: DoorMask,
    pub(crate) position: Option<Position>,
    pub(crate) fire_level: u8,
    pub(crate) powder_keg_exploded: bool,
    pub(crate) is_exploded: bool,
    pub(crate) deckhands: u32,
    pub(crate) draw_order: Option<i32>,
}

impl Tile {
    /// A fresh, unplaced tile at 0° with no fire.
    pub fn new(id: TileId, def: TileDef) -> Self {
        let doors = def.doors;
        Self {
            id,
            def,
            orientation: Orientation::Deg0,
            doors,
            position: None,
            fire_level: fire::MIN_LEVEL,
            powder_keg_exploded: false,
            is_exploded: false,
            deckhands: 0,
            draw_order: None,
        }
    }

    pub fn id(&self) -> TileId {
        self.id
    }
    pub fn def(&self) -> &TileDef {
        &self.def
    }
    pub fn color(&self) -> TileColor {
        self.def.color
    }
    pub fn pips(&self) -> u8 {
        self.def.pips
    }
    pub fn kind(&self) -> TileKind {
        self.def.kind
    }
    pub fn has_powder_keg(&self) -> bool {
        self.def.has_powder_keg
    }
    pub fn has_trapdoor(&self) -> bool {
        self.def.has_trapdoor
    }
    pub fn is_starting_tile(&self) -> bool {
        self.def.is_starting_tile
    }
    pub fn original_doors(&self) -> DoorMask {
        self.def.doors
    }
    pub fn doors(&self) -> DoorMask {
        self.doors
    }
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }
    /// Grid cell, or `None` until the tile is placed.
    pub fn position(&self) -> Option<Position> {
        self.position
    }
    pub fn fire_level(&self) -> u8 {
        self.fire_level
    }
    pub fn powder_keg_exploded(&self) -> bool {
        self.powder_keg_exploded
    }
    pub fn is_exploded(&self) -> bool {
        self.is_exploded
    }
    pub fn deckhands(&self) -> u32 {
        self.deckhands
    }
    pub fn draw_order(&self) -> Option<i32> {
        self.draw_order
    }

    pub fn set_draw_order(&mut self, draw_order: Option<i32>) {
        self.draw_order = draw_order;
    }

    // ── Orientation ─────────────────────────────────────────────────────

    /// Turn the tile to `degrees` (normalized to a quarter turn) and
    /// recompute the effective doors from the authored ones.
    pub fn set_orientation(&mut self, degrees: i32) {
        self.apply_orientation(Orientation::from_degrees(degrees));
    }

    pub fn apply_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.doors = self.def.doors.rotated(orientation);
    }

    pub fn rotate_clockwise(&mut self) {
        self.apply_orientation(self.orientation.clockwise());
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.apply_orientation(self.orientation.counter_clockwise());
    }

    pub fn has_door(&self, direction: Direction) -> bool {
        self.doors.has(direction)
    }

    /// Detached trial copy turned to `degrees`. The copy carries no position
    /// so it can never be mistaken for the placed tile.
    pub fn with_orientation(&self, degrees: i32) -> Tile {
        let mut copy = self.clone();
        copy.position = None;
        copy.set_orientation(degrees);
        copy
    }

    // ── Fire ────────────────────────────────────────────────────────────

    pub fn set_fire_level(&mut self, level: i32) {
        self.fire_level = level.clamp(i32::from(fire::MIN_LEVEL), i32::from(fire::MAX_LEVEL)) as u8;
    }

    pub fn increase_fire_level(&mut self, amount: u8) {
        self.fire_level = self.fire_level.saturating_add(amount).min(fire::MAX_LEVEL);
    }

    pub fn decrease_fire_level(&mut self, amount: u8) {
        self.fire_level = self.fire_level.saturating_sub(amount);
    }

    /// Whether the room is ready to blow: fully ablaze, or an unexploded keg
    /// with any fire at all. Pure; the caller triggers the explosion.
    pub fn will_explode(&self) -> bool {
        self.fire_level >= fire::MAX_LEVEL || (self.has_live_powder_keg() && self.fire_level > 0)
    }

    /// Keg present and not yet detonated.
    pub fn has_live_powder_keg(&self) -> bool {
        self.def.has_powder_keg && !self.powder_keg_exploded
    }

    /// Detonate the keg. One-way and idempotent; a no-op on rooms without a
    /// keg.
    pub fn explode_powder_keg(&mut self) {
        if self.def.has_powder_keg {
            self.powder_keg_exploded = true;
        }
    }

    pub fn mark_exploded(&mut self) {
        self.is_exploded = true;
    }

    /// Counts toward critical ship damage.
    pub fn is_critical(&self) -> bool {
        self.fire_level >= fire::MAX_LEVEL || self.powder_keg_exploded
    }

    // ── Deckhands ───────────────────────────────────────────────────────

    pub fn set_deckhands(&mut self, count: u32) {
        self.deckhands = count;
    }

    pub fn add_deckhands(&mut self, count: u32) {
        self.deckhands = self.deckhands.saturating_add(count);
    }

    pub fn remove_deckhands(&mut self, count: u32) {
        self.deckhands = self.deckhands.saturating_sub(count);
    }
}

//! Rule constants: fire scale, damage threshold, row tags.
//!
//! Plain constants with no storage dependency. The row tags are the stable
//! strings written into `TileRow` and must never change once persisted.

pub mod fire {
    /// No fire in the room.
    pub const MIN_LEVEL: u8 = 0;
    /// Fully ablaze. A room at this level explodes.
    pub const MAX_LEVEL: u8 = 6;
}

pub mod damage {
    /// Exploded rooms needed before the ship counts as critically damaged.
    pub const DEFAULT_CRITICAL_EXPLOSIONS: u32 = 4;
}

pub mod tile_tags {
    pub const ROOM: &str = "room";
    pub const STARTING_ROOM: &str = "starting_room";
}

pub mod color_tags {
    pub const RED: &str = "red";
    pub const YELLOW: &str = "yellow";
    pub const BLUE: &str = "blue";
    pub const GREEN: &str = "green";
    pub const BLACK: &str = "black";
}

pub mod explosion_tags {
    pub const POWDER_KEG: &str = "powder_keg";
    pub const FIRE: &str = "fire";
}

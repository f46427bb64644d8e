//! Integration tests for the board rules.
//!
//! Exercises: setup → placement → connectivity → routes → chain explosions,
//! on hand-built layouts and on randomly grown ships (seeded, so every run
//! sees the same boards).

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use sinkship_logic::board::{Board, PlacementCheck};
use sinkship_logic::constants::fire;
use sinkship_logic::explosion::ExplosionKind;
use sinkship_logic::pathfinding::{find_path, path_length};
use sinkship_logic::tile::{
    Direction, DoorMask, Orientation, Position, Tile, TileColor, TileDef, TileId,
};

// ── Helpers ────────────────────────────────────────────────────────────

const COLORS: [TileColor; 4] = [
    TileColor::Red,
    TileColor::Yellow,
    TileColor::Blue,
    TileColor::Green,
];

fn random_def(rng: &mut StdRng) -> TileDef {
    let doors = DoorMask::from_bits(rng.gen_range(1..16u8)).unwrap();
    let color = *COLORS.choose(rng).unwrap();
    let def = TileDef::room(color, rng.gen_range(1..=3), doors);
    if rng.gen_bool(0.2) {
        def.with_powder_keg()
    } else {
        def
    }
}

/// Grow a ship from a four-door start by placing random rooms on legal
/// cells. Draws that fit nowhere are left unplaced on the board.
fn grow_ship(seed: u64, draws: usize) -> Board {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut board = Board::new();
    board
        .setup_starting_tile(TileDef::starting(DoorMask::ALL))
        .unwrap();
    for _ in 0..draws {
        let def = random_def(&mut rng);
        let options = board.valid_placement_positions(&def);
        let id = board.register_tile(def).unwrap();
        if let Some(option) = options.choose(&mut rng) {
            assert!(
                board.place_tile(id, option.x, option.y, option.orientation),
                "offered placement {:?} was rejected",
                option
            );
        }
    }
    board
}

fn placed_ids(board: &Board) -> Vec<TileId> {
    board.placed_tiles().map(Tile::id).collect()
}

fn corridor() -> TileDef {
    TileDef::room(
        TileColor::Yellow,
        1,
        DoorMask::from_directions(&[Direction::West, Direction::East]),
    )
}

// ── Rotation ───────────────────────────────────────────────────────────

#[test]
fn four_rotations_restore_every_mask() {
    for bits in 0..16u8 {
        let mask = DoorMask::from_bits(bits).unwrap();
        let mut cw = mask;
        let mut ccw = mask;
        for _ in 0..4 {
            cw = cw.rotate_clockwise();
            ccw = ccw.rotate_counter_clockwise();
        }
        assert_eq!(cw, mask);
        assert_eq!(ccw, mask);
        assert_eq!(mask.rotated(Orientation::Deg90).count(), mask.count());
    }
}

#[test]
fn four_tile_rotations_restore_doors() {
    let mut tile = Tile::new(
        1,
        TileDef::room(
            TileColor::Green,
            2,
            DoorMask::from_directions(&[Direction::North, Direction::East]),
        ),
    );
    let original = tile.doors();
    for _ in 0..4 {
        tile.rotate_clockwise();
    }
    assert_eq!(tile.doors(), original);
    for _ in 0..4 {
        tile.rotate_counter_clockwise();
    }
    assert_eq!(tile.doors(), original);
    assert_eq!(tile.orientation(), Orientation::Deg0);
}

// ── Concrete scenarios ─────────────────────────────────────────────────

#[test]
fn north_room_turned_to_face_start() {
    let mut board = Board::new();
    let start = board
        .setup_starting_tile(TileDef::starting(DoorMask::ALL))
        .unwrap();
    // Authored with a single north door, turned 180° so it faces south.
    let def = TileDef::room(
        TileColor::Blue,
        1,
        DoorMask::from_directions(&[Direction::North]),
    );
    let id = board.place_new(def, 0, -1, 180).unwrap();

    let tile = board.tile_at(0, -1).unwrap();
    assert_eq!(tile.id(), id);
    assert!(tile.has_door(Direction::South));
    assert!(!tile.has_door(Direction::North));
    assert_eq!(board.connected_ids(start), vec![id]);
}

#[test]
fn straight_line_path_has_four_tiles() {
    let mut board = Board::new();
    let mut ids = vec![board
        .setup_starting_tile(TileDef::starting(DoorMask::ALL))
        .unwrap()];
    for x in 1..4 {
        ids.push(board.place_new(corridor(), x, 0, 0).unwrap());
    }
    let path = find_path(&board, ids[0], ids[3]);
    assert_eq!(path.len(), 4);
    assert_eq!(path, ids);
}

#[test]
fn keg_at_max_fire_explodes_once_and_warms_neighbours() {
    let mut board = Board::new();
    let start = board
        .setup_starting_tile(TileDef::starting(DoorMask::ALL))
        .unwrap();
    let keg = board
        .place_new(corridor().with_powder_keg(), 1, 0, 0)
        .unwrap();
    let east = board.place_new(corridor(), 2, 0, 0).unwrap();
    // Wall to wall with the keg room: fire still reaches it.
    let below = board
        .place_new(
            TileDef::room(
                TileColor::Red,
                1,
                DoorMask::from_directions(&[Direction::North, Direction::East]),
            ),
            0,
            1,
            0,
        )
        .unwrap();
    let walled = board
        .place_new(
            TileDef::room(
                TileColor::Red,
                1,
                DoorMask::from_directions(&[Direction::West]),
            ),
            1,
            1,
            0,
        )
        .unwrap();
    board.set_fire_level(keg, 6);

    let result = board.handle_chain_explosions(keg);

    assert!(board.tile(keg).unwrap().powder_keg_exploded());
    assert_eq!(result.exploded.len(), 1);
    assert_eq!(result.exploded[0].tile_id, keg);
    assert_eq!(result.exploded[0].kind, ExplosionKind::PowderKeg);
    for id in [start, east, walled] {
        assert_eq!(board.tile(id).unwrap().fire_level(), 1);
    }
    assert_eq!(board.tile(below).unwrap().fire_level(), 0);
}

#[test]
fn keg_explosion_is_idempotent() {
    let mut once = Tile::new(1, corridor().with_powder_keg());
    once.set_fire_level(2);
    let mut twice = once.clone();
    once.explode_powder_keg();
    twice.explode_powder_keg();
    twice.explode_powder_keg();
    assert_eq!(once.to_row(), twice.to_row());
    assert!(!twice.has_live_powder_keg());
}

#[test]
fn rejected_placements_leave_board_unchanged() {
    let mut board = Board::new();
    board
        .setup_starting_tile(TileDef::starting(DoorMask::from_directions(&[
            Direction::East,
        ])))
        .unwrap();
    let before = board.to_rows();

    // Occupied, walled off, and floating.
    assert_eq!(
        board.check_placement(&corridor(), 0, 0, 0),
        PlacementCheck::Occupied
    );
    assert!(board.place_new(corridor(), 0, 1, 0).is_none());
    assert!(board.place_new(corridor(), 4, 4, 0).is_none());
    assert_eq!(board.to_rows(), before);
}

// ── Randomized properties ──────────────────────────────────────────────

#[test]
fn grown_ships_never_share_a_cell() {
    for seed in 0..20 {
        let board = grow_ship(seed, 40);
        let mut seen = HashSet::new();
        for tile in board.placed_tiles() {
            let position = tile.position().unwrap();
            assert!(seen.insert(position), "seed {seed}: {position:?} used twice");
            assert_eq!(board.tile_at_position(position).unwrap().id(), tile.id());
        }
        assert_eq!(seen.len(), board.placed_count());
    }
}

#[test]
fn connectivity_is_symmetric() {
    for seed in 0..20 {
        let board = grow_ship(seed, 40);
        for id in placed_ids(&board) {
            for other in board.connected_ids(id) {
                assert!(
                    board.connected_ids(other).contains(&id),
                    "seed {seed}: {id} -> {other} is one-way"
                );
            }
        }
    }
}

#[test]
fn grown_ships_are_fully_reachable_by_valid_paths() {
    let mut rng = StdRng::seed_from_u64(7);
    for seed in 0..10 {
        let board = grow_ship(seed, 30);
        let ids = placed_ids(&board);
        for _ in 0..20 {
            let a = *ids.choose(&mut rng).unwrap();
            let b = *ids.choose(&mut rng).unwrap();
            let path = find_path(&board, a, b);
            // Every room was placed with a door into the ship.
            assert!(!path.is_empty(), "seed {seed}: no route {a} -> {b}");
            assert_eq!(path.first(), Some(&a));
            assert_eq!(path.last(), Some(&b));
            for pair in path.windows(2) {
                assert!(board.connected_ids(pair[0]).contains(&pair[1]));
                assert!(board.connected_ids(pair[1]).contains(&pair[0]));
            }
            let from = board.tile(a).unwrap().position().unwrap();
            let to = board.tile(b).unwrap().position().unwrap();
            assert!(path_length(&board, a, b).unwrap() >= from.manhattan(to) as usize);
        }
    }
}

#[test]
fn explosions_terminate_and_never_cool_tiles() {
    let mut rng = StdRng::seed_from_u64(99);
    for seed in 0..15 {
        let mut board = grow_ship(seed, 40);
        let ids = placed_ids(&board);
        for &id in &ids {
            board.set_fire_level(id, rng.gen_range(0..=6));
        }
        let before: Vec<(TileId, u8)> = board
            .tiles()
            .map(|t| (t.id(), t.fire_level()))
            .collect();

        let trigger = *ids.choose(&mut rng).unwrap();
        let result = board.handle_chain_explosions(trigger);

        assert!(result.exploded.len() <= board.placed_count());
        let mut exploded = HashSet::new();
        for event in &result.exploded {
            assert!(exploded.insert(event.tile_id), "seed {seed}: exploded twice");
            let tile = board.tile(event.tile_id).unwrap();
            assert_eq!(tile.fire_level(), fire::MAX_LEVEL);
            assert_eq!(tile.position(), Some(Position::new(event.x, event.y)));
        }
        for (id, level) in before {
            assert!(board.tile(id).unwrap().fire_level() >= level);
        }
    }
}

#[test]
fn offered_orientations_pass_the_placement_check() {
    let mut rng = StdRng::seed_from_u64(3);
    let board = grow_ship(11, 25);
    for _ in 0..20 {
        let def = random_def(&mut rng);
        for option in board.valid_placement_positions(&def) {
            let check = board.check_placement(&def, option.x, option.y, option.orientation);
            assert!(matches!(check, PlacementCheck::Valid { connections } if connections > 0));
        }
    }
}

#[test]
fn ship_bounds_cover_every_placed_tile() {
    let board = grow_ship(5, 50);
    let bounds = board.ship_bounds();
    for tile in board.placed_tiles() {
        let p = tile.position().unwrap();
        assert!(bounds.min_x <= p.x && p.x <= bounds.max_x);
        assert!(bounds.min_y <= p.y && p.y <= bounds.max_y);
    }
}

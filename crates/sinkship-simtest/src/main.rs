//! Sinkship Headless Board Harness
//!
//! Validates the board rules without a database or server. Builds ships
//! in-process, runs the rulebook scenarios, sweeps randomly grown ships for
//! rule violations and round-trips boards through the row format.
//!
//! Usage:
//!   cargo run -p sinkship-simtest
//!   cargo run -p sinkship-simtest -- --verbose --seed 7
//!   cargo run -p sinkship-simtest -- --rules house_rules.json

use std::collections::HashSet;
use std::fs;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use sinkship_logic::board::Board;
use sinkship_logic::config::RulesConfig;
use sinkship_logic::constants::fire;
use sinkship_logic::explosion::ExplosionKind;
use sinkship_logic::notify::RecordingNotifier;
use sinkship_logic::pathfinding::find_path;
use sinkship_logic::persistence::{JsonTileStore, TileRow};
use sinkship_logic::session::ShipSession;
use sinkship_logic::tile::{Direction, DoorMask, Orientation, Tile, TileColor, TileDef, TileId};

// ── Arguments ───────────────────────────────────────────────────────────

struct Args {
    verbose: bool,
    rules_path: Option<String>,
    seed: u64,
}

const USAGE: &str = "usage: sinkship-simtest [--verbose] [--rules <path.json>] [--seed <n>]";

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        verbose: false,
        rules_path: None,
        seed: 42,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verbose" => args.verbose = true,
            "--rules" => {
                args.rules_path = Some(iter.next().ok_or("--rules needs a path")?);
            }
            "--seed" => {
                let value = iter.next().ok_or("--seed needs a number")?;
                args.seed = value
                    .parse()
                    .map_err(|e| format!("bad seed '{}': {}", value, e))?;
            }
            other => return Err(format!("unknown argument '{}'", other)),
        }
    }
    Ok(args)
}

fn log_level(verbose: bool) -> tracing::Level {
    if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

fn log_filter(verbose: bool) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level(verbose).into())
}

/// The board crate logs through `log`; `init` also bridges those records.
fn init_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose))
        .with_writer(std::io::stderr)
        .init();
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    init_logging(args.verbose);

    println!("=== Sinkship Board Harness ===\n");

    let mut results = Vec::new();

    // 1. Rules configuration
    let rules = match load_rules(args.rules_path.as_deref()) {
        Ok(rules) => rules,
        Err(detail) => {
            results.push(TestResult {
                name: "rules_load".into(),
                passed: false,
                detail,
            });
            RulesConfig::default()
        }
    };

    // 2. Door geometry
    results.extend(validate_rotation(args.verbose));

    // 3. Rulebook scenarios
    results.extend(validate_scenarios(args.verbose));

    // 4. Random growth sweep
    results.extend(validate_growth_sweep(&rules, args.seed, args.verbose));

    // 5. Persistence round trip
    results.extend(validate_persistence(&rules, args.seed, args.verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Rules ────────────────────────────────────────────────────────────

fn load_rules(path: Option<&str>) -> Result<RulesConfig, String> {
    println!("--- Rules ---");
    let Some(path) = path else {
        println!("  default rules");
        return Ok(RulesConfig::default());
    };
    let json = fs::read_to_string(path).map_err(|e| format!("can't read {}: {}", path, e))?;
    let rules = RulesConfig::from_json_str(&json).map_err(|e| format!("{}: {}", path, e))?;
    println!(
        "  {}: threshold {}, door matching {}",
        path, rules.critical_explosion_threshold, rules.enforce_door_matching
    );
    Ok(rules)
}

// ── 2. Door geometry ────────────────────────────────────────────────────

fn validate_rotation(verbose: bool) -> Vec<TestResult> {
    println!("--- Door Geometry ---");
    let mut results = Vec::new();

    let mut broken = Vec::new();
    for bits in 0..16u8 {
        let Some(mask) = DoorMask::from_bits(bits) else {
            broken.push(bits);
            continue;
        };
        let mut cw = mask;
        let mut ccw = mask;
        for _ in 0..4 {
            cw = cw.rotate_clockwise();
            ccw = ccw.rotate_counter_clockwise();
        }
        if cw != mask || ccw != mask {
            broken.push(bits);
        }
    }
    results.push(TestResult {
        name: "rotation_round_trip".into(),
        passed: broken.is_empty(),
        detail: if broken.is_empty() {
            "all 16 masks return after four turns".into()
        } else {
            format!("masks {:?} drift", broken)
        },
    });

    let mut mismatched = Vec::new();
    for direction in Direction::ALL {
        let mask = DoorMask::from_directions(&[direction]);
        for orientation in Orientation::ALL {
            let mut expected = direction;
            for _ in 0..orientation.quarter_turns() {
                expected = expected.clockwise();
            }
            if mask.rotated(orientation) != DoorMask::from_directions(&[expected]) {
                mismatched.push((direction, orientation.degrees()));
            }
        }
    }
    results.push(TestResult {
        name: "rotation_matches_direction_turns".into(),
        passed: mismatched.is_empty(),
        detail: format!("{} single-door mismatches", mismatched.len()),
    });

    results.push(TestResult {
        name: "keg_detonation_idempotent".into(),
        passed: {
            let mut once = Tile::new(1, corridor().with_powder_keg());
            once.set_fire_level(1);
            let mut twice = once.clone();
            once.explode_powder_keg();
            twice.explode_powder_keg();
            twice.explode_powder_keg();
            once == twice
        },
        detail: "second detonation changes nothing".into(),
    });

    if verbose {
        println!("  checked 16 masks x 4 orientations");
    }
    results
}

// ── 3. Rulebook scenarios ───────────────────────────────────────────────

fn corridor() -> TileDef {
    TileDef::room(
        TileColor::Yellow,
        1,
        DoorMask::from_directions(&[Direction::West, Direction::East]),
    )
}

fn validate_scenarios(verbose: bool) -> Vec<TestResult> {
    println!("--- Rulebook Scenarios ---");
    let mut results = Vec::new();

    // A south-facing room north of the start.
    let mut board = Board::new();
    board.setup_starting_tile(TileDef::starting(DoorMask::ALL));
    let north_door = TileDef::room(
        TileColor::Blue,
        1,
        DoorMask::from_directions(&[Direction::North]),
    );
    let placed = board.place_new(north_door, 0, -1, 180);
    let faces_south = board
        .tile_at(0, -1)
        .is_some_and(|t| Some(t.id()) == placed && t.has_door(Direction::South));
    results.push(TestResult {
        name: "scenario_turned_room".into(),
        passed: faces_south,
        detail: format!("placed {:?}, south door at (0,-1): {}", placed, faces_south),
    });

    // A straight line of four.
    let mut board = Board::new();
    let mut line: Vec<TileId> = board
        .setup_starting_tile(TileDef::starting(DoorMask::ALL))
        .into_iter()
        .collect();
    for x in 1..4 {
        line.extend(board.place_new(corridor(), x, 0, 0));
    }
    let path = match (line.first(), line.last()) {
        (Some(&a), Some(&b)) => find_path(&board, a, b),
        _ => Vec::new(),
    };
    results.push(TestResult {
        name: "scenario_line_of_four".into(),
        passed: line.len() == 4 && path == line,
        detail: format!("path {:?}", path),
    });

    // A keg room at max fire.
    let mut board = Board::new();
    board.setup_starting_tile(TileDef::starting(DoorMask::ALL));
    let keg = board.place_new(corridor().with_powder_keg(), 1, 0, 0);
    board.place_new(corridor(), 2, 0, 0);
    let mut detail = "keg room not placed".to_string();
    let mut passed = false;
    if let Some(keg) = keg {
        let neighbours = board.neighbors(keg);
        board.set_fire_level(keg, i32::from(fire::MAX_LEVEL));
        let result = board.handle_chain_explosions(keg);
        let flipped = board.tile(keg).is_some_and(|t| t.powder_keg_exploded());
        let warmed = neighbours
            .iter()
            .all(|&id| board.tile(id).is_some_and(|t| t.fire_level() == 1));
        let single = result.exploded.len() == 1
            && result.exploded[0].tile_id == keg
            && result.exploded[0].kind == ExplosionKind::PowderKeg;
        passed = flipped && warmed && single;
        detail = format!(
            "keg flipped: {}, {} neighbours at fire 1: {}, events: {}",
            flipped,
            neighbours.len(),
            warmed,
            result.exploded.len()
        );
    }
    results.push(TestResult {
        name: "scenario_keg_explosion".into(),
        passed,
        detail,
    });

    if verbose {
        println!("  3 scenarios run");
    }
    results
}

// ── 4. Random growth sweep ──────────────────────────────────────────────

const SWEEP_SHIPS: u64 = 50;
const SWEEP_DRAWS: usize = 40;
const COLORS: [TileColor; 4] = [
    TileColor::Red,
    TileColor::Yellow,
    TileColor::Blue,
    TileColor::Green,
];

fn random_def(rng: &mut StdRng) -> TileDef {
    let doors = DoorMask::from_bits(rng.gen_range(1..16u8)).unwrap_or(DoorMask::ALL);
    let color = COLORS.choose(rng).copied().unwrap_or(TileColor::Red);
    let def = TileDef::room(color, rng.gen_range(1..=3), doors);
    if rng.gen_bool(0.2) {
        def.with_powder_keg()
    } else {
        def
    }
}

fn grow_ship(rules: &RulesConfig, rng: &mut StdRng) -> Board {
    let mut board = Board::with_rules(rules.clone());
    board.setup_starting_tile(TileDef::starting(DoorMask::ALL));
    for _ in 0..SWEEP_DRAWS {
        let def = random_def(rng);
        let options = board.valid_placement_positions(&def);
        let Some(id) = board.register_tile(def) else {
            tracing::warn!("Board ran out of tile ids");
            break;
        };
        if let Some(option) = options.choose(rng) {
            if !board.place_tile(id, option.x, option.y, option.orientation) {
                tracing::warn!("Offered placement {:?} was rejected", option);
            }
        }
    }
    board
}

fn placed_ids(board: &Board) -> Vec<TileId> {
    board.placed_tiles().map(Tile::id).collect()
}

fn validate_growth_sweep(rules: &RulesConfig, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Growth Sweep (seed {}) ---", seed);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut double_occupancy = 0;
    let mut one_way_links = 0;
    let mut bad_paths = 0;
    let mut paths_checked = 0;
    let mut explosion_faults = 0;
    let mut total_placed = 0;
    let mut total_exploded = 0;

    for ship in 0..SWEEP_SHIPS {
        let mut board = grow_ship(rules, &mut rng);
        let ids = placed_ids(&board);
        total_placed += ids.len();

        let mut cells = HashSet::new();
        for tile in board.placed_tiles() {
            let owner = tile.position().and_then(|p| board.tile_at_position(p));
            if !tile.position().is_some_and(|p| cells.insert(p))
                || owner.map(Tile::id) != Some(tile.id())
            {
                double_occupancy += 1;
            }
        }

        for &id in &ids {
            for other in board.connected_ids(id) {
                if !board.connected_ids(other).contains(&id) {
                    one_way_links += 1;
                }
            }
        }

        for _ in 0..10 {
            let (Some(&a), Some(&b)) = (ids.choose(&mut rng), ids.choose(&mut rng)) else {
                break;
            };
            paths_checked += 1;
            // Every room went down with a door pair into the ship, so every
            // pair of rooms has a route.
            let path = find_path(&board, a, b);
            let linked = path
                .windows(2)
                .all(|pair| board.connected_ids(pair[0]).contains(&pair[1]));
            if path.first() != Some(&a) || path.last() != Some(&b) || !linked {
                bad_paths += 1;
            }
        }

        for &id in &ids {
            board.set_fire_level(id, rng.gen_range(0..=6));
        }
        let before: Vec<(TileId, u8)> = board.tiles().map(|t| (t.id(), t.fire_level())).collect();
        if let Some(&trigger) = ids.choose(&mut rng) {
            let result = board.handle_chain_explosions(trigger);
            total_exploded += result.exploded.len();
            let mut seen = HashSet::new();
            let events_ok = result.exploded.len() <= ids.len()
                && result.exploded.iter().all(|e| {
                    seen.insert(e.tile_id)
                        && board
                            .tile(e.tile_id)
                            .is_some_and(|t| t.fire_level() == fire::MAX_LEVEL)
                });
            let monotonic = before.iter().all(|&(id, level)| {
                board.tile(id).is_some_and(|t| t.fire_level() >= level)
            });
            if !events_ok || !monotonic {
                explosion_faults += 1;
                tracing::warn!("Ship {}: explosion from tile {} broke a rule", ship, trigger);
            }
        }
    }

    if verbose {
        println!(
            "  {} ships, {} rooms placed, {} paths checked, {} rooms exploded",
            SWEEP_SHIPS, total_placed, paths_checked, total_exploded
        );
    }

    vec![
        TestResult {
            name: "sweep_no_double_occupancy".into(),
            passed: double_occupancy == 0,
            detail: format!("{} shared cells", double_occupancy),
        },
        TestResult {
            name: "sweep_connectivity_symmetric".into(),
            passed: one_way_links == 0,
            detail: format!("{} one-way links", one_way_links),
        },
        TestResult {
            name: "sweep_path_validity".into(),
            passed: bad_paths == 0,
            detail: format!("{}/{} bad paths", bad_paths, paths_checked),
        },
        TestResult {
            name: "sweep_explosions_terminate_monotonic".into(),
            passed: explosion_faults == 0,
            detail: format!(
                "{} faults over {} explosions",
                explosion_faults, total_exploded
            ),
        },
    ]
}

// ── 5. Persistence ──────────────────────────────────────────────────────

fn validate_persistence(rules: &RulesConfig, seed: u64, verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    // board → rows → JSON → rows → board
    let mut board = grow_ship(rules, &mut rng);
    let ids = placed_ids(&board);
    if let Some(&trigger) = ids.last() {
        board.set_fire_level(trigger, i32::from(fire::MAX_LEVEL));
        board.handle_chain_explosions(trigger);
    }
    let rows = board.to_rows();
    let round_trip = serde_json::to_string(&rows)
        .map_err(|e| e.to_string())
        .and_then(|json| {
            serde_json::from_str::<Vec<TileRow>>(&json).map_err(|e| e.to_string())
        })
        .and_then(|rows| Board::hydrate(rows, rules.clone()).map_err(|e| e.to_string()));
    let (passed, detail) = match round_trip {
        Ok(restored) => (
            restored.to_rows() == rows,
            format!("{} rows restored", restored.len()),
        ),
        Err(e) => (false, e),
    };
    results.push(TestResult {
        name: "rows_json_round_trip".into(),
        passed,
        detail,
    });

    // Session on a JSON file, reopened.
    let path = std::env::temp_dir().join(format!("sinkship-simtest-{}.json", std::process::id()));
    let _ = fs::remove_file(&path);
    let (passed, detail) = match session_round_trip(rules, &path) {
        Ok((written, notices)) => match ShipSession::open(
            JsonTileStore::new(&path),
            RecordingNotifier::new(),
            rules.clone(),
        ) {
            Ok(reopened) => (
                reopened.board().to_rows() == written,
                format!("{} rows, {} notices", written.len(), notices),
            ),
            Err(e) => (false, format!("reopen failed: {}", e)),
        },
        Err(e) => (false, e),
    };
    let _ = fs::remove_file(&path);
    results.push(TestResult {
        name: "session_json_file_round_trip".into(),
        passed,
        detail,
    });

    if verbose {
        println!("  board of {} tiles written and reread", board.len());
    }
    results
}

fn session_round_trip(
    rules: &RulesConfig,
    path: &std::path::Path,
) -> Result<(Vec<TileRow>, usize), String> {
    let mut session = ShipSession::open(
        JsonTileStore::new(path),
        RecordingNotifier::new(),
        rules.clone(),
    )
    .map_err(|e| e.to_string())?;
    let start = session
        .setup(TileDef::starting(DoorMask::ALL))
        .map_err(|e| e.to_string())?
        .ok_or("starting tile rejected")?;
    let keg = session
        .place_new(corridor().with_powder_keg(), 1, 0, 0)
        .map_err(|e| e.to_string())?
        .ok_or("keg room rejected")?;
    let drawn = session
        .draw_tile(corridor(), Some(1))
        .map_err(|e| e.to_string())?
        .ok_or("no tile ids left")?;
    session
        .set_fire_level(keg, 1)
        .map_err(|e| e.to_string())?;
    session
        .trigger_explosions(keg)
        .map_err(|e| e.to_string())?;
    if session.find_path(start, keg) != vec![start, keg] {
        return Err("no route from start to keg room".into());
    }
    tracing::debug!("Tile {} left unplaced in the draw pile", drawn);
    let notices = session.notifier().notices.len();
    Ok((session.board().to_rows(), notices))
}

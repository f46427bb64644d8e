//! Benchmarks for route-finding and chain explosions.
//!
//! Run with: cargo bench --package sinkship-logic

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use sinkship_logic::board::Board;
use sinkship_logic::pathfinding::find_path;
use sinkship_logic::tile::{DoorMask, TileColor, TileDef, TileId};

/// Square ship of open rooms, start at the top-left corner. Returns the
/// board and the id of the far corner.
fn open_grid(side: i32) -> (Board, TileId, TileId) {
    let mut board = Board::new();
    let start = board
        .setup_starting_tile(TileDef::starting(DoorMask::ALL))
        .unwrap();
    let mut far = start;
    for y in 0..side {
        for x in 0..side {
            if (x, y) == (0, 0) {
                continue;
            }
            far = board
                .place_new(TileDef::room(TileColor::Blue, 1, DoorMask::ALL), x, y, 0)
                .unwrap();
        }
    }
    (board, start, far)
}

fn bench_find_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("find_path");

    for side in [4, 8, 16, 24] {
        let (board, start, far) = open_grid(side);
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter(|| black_box(find_path(black_box(&board), start, far)));
        });
    }

    group.finish();
}

fn bench_chain_explosions(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain_explosions");

    for side in [4, 8, 16] {
        let (mut board, start, _) = open_grid(side);
        let ids: Vec<TileId> = board.tiles().map(|t| t.id()).collect();
        // One short of exploding everywhere: the trigger sets off the lot.
        for &id in &ids {
            board.set_fire_level(id, 5);
        }
        board.set_fire_level(start, 6);

        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, _| {
            b.iter_batched(
                || board.clone(),
                |mut board| black_box(board.handle_chain_explosions(start)),
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_find_path, bench_chain_explosions);
criterion_main!(benches);

//! A* route-finding over the door connectivity graph.
//!
//! Every door traversal costs one step and the heuristic is Manhattan
//! distance, which never overestimates on a grid where each step moves one
//! cell. The graph is read straight from the board on every call: tiles are
//! placed throughout the game, so there is nothing worth caching.

use std::collections::{HashMap, HashSet};

use crate::board::Board;
use crate::tile::{Position, Tile, TileId};

/// Shortest door-connected route from `start` to `end`, both included.
///
/// Returns `[start]` when both ids are the same tile, and an empty vec when
/// no route exists (or either tile is unknown or unplaced).
pub fn find_path(board: &Board, start: TileId, end: TileId) -> Vec<TileId> {
    let (Some(start_tile), Some(end_tile)) = (board.tile(start), board.tile(end)) else {
        return Vec::new();
    };
    if start == end {
        return vec![start];
    }
    let (Some(_), Some(goal)) = (start_tile.position(), end_tile.position()) else {
        return Vec::new();
    };

    let heuristic = |id: TileId| -> u32 {
        board
            .tile(id)
            .and_then(Tile::position)
            .map_or(u32::MAX, |p: Position| p.manhattan(goal))
    };

    // Insertion-ordered so ties go to the first node found.
    let mut open: Vec<TileId> = vec![start];
    let mut closed: HashSet<TileId> = HashSet::new();
    let mut came_from: HashMap<TileId, TileId> = HashMap::new();
    let mut g_score: HashMap<TileId, u32> = HashMap::from([(start, 0)]);
    let mut f_score: HashMap<TileId, u32> = HashMap::from([(start, heuristic(start))]);

    while !open.is_empty() {
        let mut best = 0;
        for (i, id) in open.iter().enumerate() {
            if f_score[id] < f_score[&open[best]] {
                best = i;
            }
        }
        let current = open.remove(best);
        if current == end {
            return reconstruct(&came_from, current);
        }
        closed.insert(current);

        let current_g = g_score[&current];
        for neighbor in board.connected_ids(current) {
            if closed.contains(&neighbor) {
                continue;
            }
            let tentative = current_g + 1;
            if g_score.get(&neighbor).is_some_and(|&g| tentative >= g) {
                continue;
            }
            came_from.insert(neighbor, current);
            g_score.insert(neighbor, tentative);
            f_score.insert(neighbor, tentative.saturating_add(heuristic(neighbor)));
            if !open.contains(&neighbor) {
                open.push(neighbor);
            }
        }
    }

    Vec::new()
}

fn reconstruct(came_from: &HashMap<TileId, TileId>, end: TileId) -> Vec<TileId> {
    let mut path = vec![end];
    let mut current = end;
    while let Some(&previous) = came_from.get(&current) {
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

/// `find_path`, resolved to tiles.
pub fn find_path_tiles(board: &Board, start: TileId, end: TileId) -> Vec<&Tile> {
    find_path(board, start, end)
        .into_iter()
        .filter_map(|id| board.tile(id))
        .collect()
}

/// Door traversals on the shortest route, or `None` if unreachable.
pub fn path_length(board: &Board, start: TileId, end: TileId) -> Option<usize> {
    let path = find_path(board, start, end);
    (!path.is_empty()).then(|| path.len() - 1)
}

//! Grid pathfinding: A* over cardinal steps with terrain costs and
//! entity collision.
//!
//! Entering a difficult cell costs 2, anything else 1. Cells with
//! movement-blocking terrain and cells occupied by living players or
//! npcs (other than the mover) are impassable; objects never block.
//! Returned paths exclude the start cell and include the goal.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use crate::state::{GameState, Position};

#[derive(Clone, Copy, Debug, Default)]
pub struct PathOptions {
    /// Prunes expansion beyond this accumulated cost.
    pub max_cost: Option<u32>,
    /// Permits the goal cell itself to be occupied. Used when pathing
    /// toward another entity's cell to reach an adjacent position.
    pub allow_occupied_goal: bool,
}

/// A* from the mover's current cell to `goal`. Returns `None` when the
/// mover is missing or the goal is unreachable under the options.
pub fn find_path(
    state: &GameState,
    mover_id: &str,
    goal: Position,
    options: PathOptions,
) -> Option<Vec<Position>> {
    let mover = state.entity(mover_id)?;
    let start = mover.position;

    if !state.map.in_bounds(goal) || state.map.blocks_movement(goal) {
        return None;
    }
    let occupied: BTreeSet<Position> = state.occupied_cells(Some(mover_id)).into_iter().collect();
    if occupied.contains(&goal) && !options.allow_occupied_goal {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    // Open set ordered by (f, position); the position tiebreak keeps
    // expansion order deterministic.
    let mut open = BinaryHeap::new();
    let mut g_score: BTreeMap<Position, u32> = BTreeMap::new();
    let mut came_from: BTreeMap<Position, Position> = BTreeMap::new();

    g_score.insert(start, 0);
    open.push(Reverse((start.manhattan(goal), start)));

    while let Some(Reverse((_, current))) = open.pop() {
        if current == goal {
            return Some(reconstruct(&came_from, start, goal));
        }
        let current_g = match g_score.get(&current) {
            Some(&g) => g,
            None => continue,
        };

        for neighbor in current.cardinal_neighbors() {
            if !state.map.in_bounds(neighbor) || state.map.blocks_movement(neighbor) {
                continue;
            }
            if occupied.contains(&neighbor)
                && !(neighbor == goal && options.allow_occupied_goal)
            {
                continue;
            }

            let tentative = current_g + state.map.movement_cost(neighbor);
            if let Some(limit) = options.max_cost {
                if tentative > limit {
                    continue;
                }
            }
            if g_score.get(&neighbor).is_none_or(|&g| tentative < g) {
                g_score.insert(neighbor, tentative);
                came_from.insert(neighbor, current);
                open.push(Reverse((tentative + neighbor.manhattan(goal), neighbor)));
            }
        }
    }

    None
}

/// Tries each of the four cells adjacent to `target` and returns the
/// shortest successful path. Ties resolve in fixed neighbor order.
pub fn find_path_to_adjacent(
    state: &GameState,
    mover_id: &str,
    target_id: &str,
    options: PathOptions,
) -> Option<Vec<Position>> {
    let target = state.entity(target_id)?;
    let mut best: Option<Vec<Position>> = None;
    for candidate in target.position.cardinal_neighbors() {
        if let Some(path) = find_path(state, mover_id, candidate, options) {
            if best.as_ref().is_none_or(|b| path.len() < b.len()) {
                best = Some(path);
            }
        }
    }
    best
}

fn reconstruct(
    came_from: &BTreeMap<Position, Position>,
    start: Position,
    goal: Position,
) -> Vec<Position> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&previous) = came_from.get(&current) {
        if previous == start {
            break;
        }
        path.push(previous);
        current = previous;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EntityKind, TerrainKind, TerrainTile};
    use crate::testing;

    fn blocked_tile(x: i32, y: i32) -> TerrainTile {
        TerrainTile {
            x,
            y,
            kind: TerrainKind::Blocked,
            blocks_movement: true,
            blocks_vision: true,
        }
    }

    fn difficult_tile(x: i32, y: i32) -> TerrainTile {
        TerrainTile {
            x,
            y,
            kind: TerrainKind::Difficult,
            blocks_movement: false,
            blocks_vision: false,
        }
    }

    #[test]
    fn straight_line_excludes_start_and_includes_goal() {
        let state = testing::two_sided_state();
        let path =
            find_path(&state, "pc-01", Position::new(3, 0), PathOptions::default()).unwrap();
        assert_eq!(
            path,
            vec![Position::new(1, 0), Position::new(2, 0), Position::new(3, 0)]
        );
    }

    #[test]
    fn routes_around_walls() {
        let mut state = testing::two_sided_state();
        state.map.terrain.push(blocked_tile(1, 0));
        let path =
            find_path(&state, "pc-01", Position::new(2, 0), PathOptions::default()).unwrap();
        assert!(!path.contains(&Position::new(1, 0)));
        assert_eq!(path.last(), Some(&Position::new(2, 0)));
        for pair in path.windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
    }

    #[test]
    fn prefers_cheap_terrain() {
        let mut state = testing::two_sided_state();
        // Make the direct east lane expensive; the detour is cheaper.
        state.map.terrain.push(difficult_tile(1, 0));
        state.map.terrain.push(difficult_tile(2, 0));
        let path =
            find_path(&state, "pc-01", Position::new(3, 0), PathOptions::default()).unwrap();
        let cost: u32 = path.iter().map(|&p| state.map.movement_cost(p)).sum();
        assert!(cost <= 5, "expected detour cost <= 5, got {cost} via {path:?}");
    }

    #[test]
    fn walled_in_goal_is_unreachable() {
        let mut state = testing::two_sided_state();
        for (x, y) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
            state.map.terrain.push(blocked_tile(x, y));
        }
        assert!(find_path(&state, "pc-01", Position::new(5, 5), PathOptions::default()).is_none());
    }

    #[test]
    fn max_cost_prunes_long_paths() {
        let state = testing::two_sided_state();
        let options = PathOptions {
            max_cost: Some(2),
            ..PathOptions::default()
        };
        assert!(find_path(&state, "pc-01", Position::new(3, 0), options).is_none());
        assert!(find_path(&state, "pc-01", Position::new(2, 0), options).is_some());
    }

    #[test]
    fn living_entities_block_unless_goal_allowed() {
        let mut state = testing::two_sided_state();
        state
            .entities
            .npcs
            .push(testing::fighter("npc-02", EntityKind::Npc, Position::new(1, 0)));
        let blocked = find_path(&state, "pc-01", Position::new(1, 0), PathOptions::default());
        assert!(blocked.is_none());
        let allowed = find_path(
            &state,
            "pc-01",
            Position::new(1, 0),
            PathOptions {
                allow_occupied_goal: true,
                ..PathOptions::default()
            },
        );
        assert_eq!(allowed, Some(vec![Position::new(1, 0)]));
    }

    #[test]
    fn adjacent_path_reaches_a_neighbor_of_the_target() {
        let state = testing::two_sided_state();
        let path =
            find_path_to_adjacent(&state, "pc-01", "npc-01", PathOptions::default()).unwrap();
        let target = state.entity("npc-01").unwrap().position;
        let last = *path.last().unwrap();
        assert_eq!(last.manhattan(target), 1);
    }
}

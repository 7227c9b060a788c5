use macroquad::math::Rect;
use pathfinding::prelude::astar;
use std::collections::VecDeque;

use crate::collision::center;
use crate::map::{GridIndex, TileMap};

const STEP_COST: u32 = 1000;
// sqrt(2) * STEP_COST rounded up, which keeps the euclidean heuristic admissible.
const DIAGONAL_COST: u32 = 1415;
const RETARGET_RADIUS: i32 = 2;

const NEIGHBORS: [(i32, i32); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (1, -1),
    (-1, 1),
    (1, 1),
];

/// Samples the segment between the two rect centres every quarter tile.
/// Any sample inside a solid or outside the grid blocks the view.
pub fn has_line_of_sight(from: &Rect, to: &Rect, map: &TileMap) -> bool {
    let start = center(from);
    let end = center(to);
    let step = map.tile_size() * 0.25;
    let dist = start.distance(end);
    let samples = (dist / step.max(0.001)).ceil().max(1.0) as u32;

    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        let cell = map.cell_at(start.lerp(end, t));
        if map.is_solid_at(cell.x, cell.y) {
            return false;
        }
    }
    true
}

/// A* over the eight neighbours of each cell. Diagonal steps are refused when
/// either flanking orthogonal cell is solid.
///
/// The returned cells exclude `start` and end at the goal. A solid goal is
/// swapped for the nearest walkable cell within two rings; an empty vector
/// means there is no route.
pub fn find_path(start: GridIndex, goal: GridIndex, map: &TileMap) -> Vec<GridIndex> {
    let goal = if map.is_walkable(goal) {
        goal
    } else {
        match nearest_walkable(goal, map, RETARGET_RADIUS) {
            Some(cell) => cell,
            None => return Vec::new(),
        }
    };
    if start == goal {
        return Vec::new();
    }

    astar(
        &start,
        |&cell| successors(cell, map),
        |&cell| heuristic(cell, goal),
        |&cell| cell == goal,
    )
    .map(|(path, _)| path.into_iter().skip(1).collect())
    .unwrap_or_default()
}

fn successors(cell: GridIndex, map: &TileMap) -> Vec<(GridIndex, u32)> {
    let mut out = Vec::with_capacity(8);
    for (dx, dy) in NEIGHBORS {
        let next = cell.offset(dx, dy);
        if !map.is_walkable(next) {
            continue;
        }
        if dx != 0 && dy != 0 {
            if !map.is_walkable(cell.offset(dx, 0)) || !map.is_walkable(cell.offset(0, dy)) {
                continue;
            }
            out.push((next, DIAGONAL_COST));
        } else {
            out.push((next, STEP_COST));
        }
    }
    out
}

fn heuristic(cell: GridIndex, goal: GridIndex) -> u32 {
    let dx = (cell.x - goal.x) as f32;
    let dy = (cell.y - goal.y) as f32;
    (dx.hypot(dy) * STEP_COST as f32) as u32
}

/// Closest walkable cell on the ring of radius 1, then 2, and so on.
pub fn nearest_walkable(goal: GridIndex, map: &TileMap, max_radius: i32) -> Option<GridIndex> {
    for radius in 1..=max_radius {
        let mut best: Option<(GridIndex, i32)> = None;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx.abs() != radius && dy.abs() != radius {
                    continue;
                }
                let cell = goal.offset(dx, dy);
                if !map.is_walkable(cell) {
                    continue;
                }
                let dist = dx * dx + dy * dy;
                if best.is_none_or(|(_, d)| dist < d) {
                    best = Some((cell, dist));
                }
            }
        }
        if let Some((cell, _)) = best {
            return Some(cell);
        }
    }
    None
}

/// A path cached by an enemy together with the conditions it was built for.
#[derive(Clone, Debug, Default)]
pub struct PathCache {
    pub cells: VecDeque<GridIndex>,
    pub computed_at: Option<f64>,
    pub target: Option<GridIndex>,
}

impl PathCache {
    pub fn needs_recompute(&self, now: f64, target: GridIndex, interval_ms: f64) -> bool {
        self.cells.is_empty()
            || self.target != Some(target)
            || self.computed_at.is_none_or(|t| now - t >= interval_ms)
    }

    pub fn recompute(&mut self, start: GridIndex, target: GridIndex, map: &TileMap, now: f64) {
        self.cells = find_path(start, target, map).into();
        self.computed_at = Some(now);
        self.target = Some(target);
    }

    pub fn next_waypoint(&self) -> Option<GridIndex> {
        self.cells.front().copied()
    }

    pub fn pop_waypoint(&mut self) {
        self.cells.pop_front();
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.computed_at = None;
        self.target = None;
    }
}

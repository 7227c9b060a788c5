use goblinslayer::map::{GridIndex, TileMap};
use goblinslayer::nav::{PathCache, find_path, has_line_of_sight, nearest_walkable};
use macroquad::math::Rect;

const TILE: f32 = 32.0;

fn grid(width: usize, height: usize, walls: &[(usize, usize)]) -> TileMap {
    let mut solid = vec![false; width * height];
    for &(x, y) in walls {
        solid[y * width + x] = true;
    }
    TileMap::new(width, height, TILE, solid)
}

#[test]
fn open_grid_path_length_is_chebyshev_distance() {
    let map = grid(10, 8, &[]);
    let start = GridIndex::new(1, 1);
    for goal in [GridIndex::new(8, 6), GridIndex::new(1, 7), GridIndex::new(5, 1), GridIndex::new(0, 0)] {
        let path = find_path(start, goal, &map);
        assert_eq!(path.len() as i32, start.chebyshev(goal), "path to {goal:?}");
        assert_ne!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
    }
}

#[test]
fn same_cell_has_empty_path() {
    let map = grid(4, 4, &[]);
    assert!(find_path(GridIndex::new(2, 2), GridIndex::new(2, 2), &map).is_empty());
}

#[test]
fn enclosed_goal_is_unreachable() {
    let ring = [(4, 4), (5, 4), (6, 4), (4, 5), (6, 5), (4, 6), (5, 6), (6, 6)];
    let map = grid(10, 10, &ring);
    assert!(find_path(GridIndex::new(0, 0), GridIndex::new(5, 5), &map).is_empty());
}

#[test]
fn diagonal_moves_never_cut_corners() {
    // One flank blocked: the path must go around
    let map = grid(3, 3, &[(1, 0)]);
    let path = find_path(GridIndex::new(0, 0), GridIndex::new(1, 1), &map);
    assert_eq!(path, vec![GridIndex::new(0, 1), GridIndex::new(1, 1)]);

    // Both flanks blocked: no way through
    let map = grid(3, 3, &[(1, 0), (0, 1)]);
    assert!(find_path(GridIndex::new(0, 0), GridIndex::new(1, 1), &map).is_empty());
}

#[test]
fn every_step_is_to_a_walkable_neighbour() {
    let walls: Vec<(usize, usize)> = (0..7).map(|y| (4, y)).collect();
    let map = grid(9, 9, &walls);
    let start = GridIndex::new(1, 1);
    let path = find_path(start, GridIndex::new(7, 1), &map);
    assert!(!path.is_empty());

    let mut prev = start;
    for &cell in &path {
        assert!(map.is_walkable(cell));
        assert_eq!(prev.chebyshev(cell), 1);
        let (dx, dy) = (cell.x - prev.x, cell.y - prev.y);
        if dx != 0 && dy != 0 {
            assert!(map.is_walkable(prev.offset(dx, 0)));
            assert!(map.is_walkable(prev.offset(0, dy)));
        }
        prev = cell;
    }
}

#[test]
fn solid_goal_is_retargeted_to_a_neighbour() {
    let map = grid(5, 5, &[(4, 4)]);
    let path = find_path(GridIndex::new(0, 0), GridIndex::new(4, 4), &map);
    assert_eq!(path.last(), Some(&GridIndex::new(4, 3)));
    assert_eq!(path.len(), 4);
}

#[test]
fn solid_goal_without_walkable_ring_gives_up() {
    // Goal buried in a 5x5 block of walls
    let mut walls = Vec::new();
    for y in 3..8 {
        for x in 3..8 {
            walls.push((x, y));
        }
    }
    let map = grid(11, 11, &walls);
    assert_eq!(nearest_walkable(GridIndex::new(5, 5), &map, 2), None);
    assert!(find_path(GridIndex::new(0, 0), GridIndex::new(5, 5), &map).is_empty());
}

#[test]
fn line_of_sight_is_blocked_by_walls() {
    let from = Rect::new(8.0, 40.0, 16.0, 16.0);
    let to = Rect::new(136.0, 40.0, 16.0, 16.0);

    let blocked = grid(5, 3, &[(2, 1)]);
    assert!(!has_line_of_sight(&from, &to, &blocked));
    assert!(!has_line_of_sight(&to, &from, &blocked));

    let clear = grid(5, 3, &[(2, 0), (2, 2)]);
    assert!(has_line_of_sight(&from, &to, &clear));
}

#[test]
fn path_cache_recomputes_on_interval_or_new_target() {
    let map = grid(8, 8, &[]);
    let mut cache = PathCache::default();
    let target = GridIndex::new(6, 6);
    assert!(cache.needs_recompute(0.0, target, 500.0));

    cache.recompute(GridIndex::new(0, 0), target, &map, 0.0);
    assert_eq!(cache.cells.len(), 6);
    assert!(!cache.needs_recompute(499.0, target, 500.0));
    assert!(cache.needs_recompute(500.0, target, 500.0));
    assert!(cache.needs_recompute(100.0, GridIndex::new(5, 6), 500.0));

    while cache.next_waypoint().is_some() {
        cache.pop_waypoint();
    }
    assert!(cache.needs_recompute(100.0, target, 500.0));
}

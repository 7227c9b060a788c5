use goblinslayer::collision::{center, hits_any, overlaps, rect_at, resolve_move};
use macroquad::math::{Rect, vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn overlap_is_symmetric_and_edges_do_not_touch() {
    let a = Rect::new(0.0, 0.0, 10.0, 10.0);
    let b = Rect::new(5.0, 5.0, 10.0, 10.0);
    assert!(overlaps(&a, &b));
    assert!(overlaps(&b, &a));

    // Sharing an edge is not an overlap
    let right = Rect::new(10.0, 0.0, 10.0, 10.0);
    let below = Rect::new(0.0, 10.0, 10.0, 10.0);
    assert!(!overlaps(&a, &right));
    assert!(!overlaps(&right, &a));
    assert!(!overlaps(&a, &below));
    assert!(!overlaps(&below, &a));
}

#[test]
fn blocked_diagonal_slides_along_the_wall() {
    let body = Rect::new(0.0, 0.0, 10.0, 10.0);
    let wall = [Rect::new(12.0, 0.0, 10.0, 100.0)];

    // The horizontal part runs into the wall, the vertical part survives
    assert_eq!(resolve_move(body, 5.0, 5.0, &wall), vec2(0.0, 5.0));
    // A free move is applied in full
    assert_eq!(resolve_move(body, -3.0, 4.0, &wall), vec2(-3.0, 4.0));
}

#[test]
fn vertical_step_starts_from_the_horizontal_result() {
    let body = Rect::new(0.0, 0.0, 10.0, 10.0);
    // Only the full diagonal lands in this block
    let block = [Rect::new(12.0, 12.0, 10.0, 10.0)];
    let pos = resolve_move(body, 5.0, 5.0, &block);
    // X applies (5, 0), then Y from there would hit, so it is dropped
    assert_eq!(pos, vec2(5.0, 0.0));
    assert!(!hits_any(&rect_at(pos, vec2(10.0, 10.0)), &block));
}

#[test]
fn resolve_move_never_ends_inside_a_solid() {
    let mut rng = StdRng::seed_from_u64(7);
    let solids = [
        Rect::new(64.0, 0.0, 32.0, 160.0),
        Rect::new(0.0, 96.0, 64.0, 32.0),
        Rect::new(128.0, 64.0, 32.0, 32.0),
    ];
    let size = vec2(16.0, 24.0);

    for _ in 0..2000 {
        let start = vec2(rng.gen_range(0.0..200.0), rng.gen_range(0.0..200.0));
        if hits_any(&rect_at(start, size), &solids) {
            continue;
        }
        let dx = rng.gen_range(-20.0..20.0);
        let dy = rng.gen_range(-20.0..20.0);
        let end = resolve_move(rect_at(start, size), dx, dy, &solids);
        assert!(
            !hits_any(&rect_at(end, size), &solids),
            "moved from {start:?} by ({dx}, {dy}) into a solid at {end:?}"
        );
    }
}

#[test]
fn center_of_rect() {
    assert_eq!(center(&Rect::new(10.0, 20.0, 16.0, 24.0)), vec2(18.0, 32.0));
}

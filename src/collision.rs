use macroquad::math::{Rect, Vec2, vec2};

/// Strict AABB test: rectangles that only share an edge do not overlap.
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    !(a.x + a.w <= b.x || b.x + b.w <= a.x || a.y + a.h <= b.y || b.y + b.h <= a.y)
}

pub fn hits_any(rect: &Rect, solids: &[Rect]) -> bool {
    solids.iter().any(|solid| overlaps(rect, solid))
}

pub fn rect_at(pos: Vec2, size: Vec2) -> Rect {
    Rect::new(pos.x, pos.y, size.x, size.y)
}

pub fn center(rect: &Rect) -> Vec2 {
    vec2(rect.x + rect.w * 0.5, rect.y + rect.h * 0.5)
}

/// Moves `rect` by (dx, dy) and returns the new top-left corner.
///
/// The full displacement is tried first. When it is blocked the horizontal
/// part is applied on its own, then the vertical part from wherever the
/// horizontal step left the rect, so bodies slide along walls instead of
/// stopping dead.
pub fn resolve_move(rect: Rect, dx: f32, dy: f32, solids: &[Rect]) -> Vec2 {
    if dx == 0.0 && dy == 0.0 {
        return rect.point();
    }

    let full = Rect::new(rect.x + dx, rect.y + dy, rect.w, rect.h);
    if !hits_any(&full, solids) {
        return full.point();
    }

    let mut pos = rect.point();
    let only_x = Rect::new(pos.x + dx, pos.y, rect.w, rect.h);
    if !hits_any(&only_x, solids) {
        pos.x = only_x.x;
    }

    let only_y = Rect::new(pos.x, pos.y + dy, rect.w, rect.h);
    if !hits_any(&only_y, solids) {
        pos.y = only_y.y;
    }
    pos
}

/// Overlap depth along each axis, or `None` when the rects do not overlap.
pub fn penetration(a: &Rect, b: &Rect) -> Option<Vec2> {
    if !overlaps(a, b) {
        return None;
    }
    let x = (a.x + a.w).min(b.x + b.w) - a.x.max(b.x);
    let y = (a.y + a.h).min(b.y + b.h) - a.y.max(b.y);
    Some(vec2(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penetration_reports_axis_depths() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(6.0, 8.0, 10.0, 10.0);
        assert_eq!(penetration(&a, &b), Some(vec2(4.0, 2.0)));
        assert_eq!(penetration(&a, &Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn zero_move_keeps_position() {
        let r = Rect::new(3.0, 4.0, 1.0, 1.0);
        assert_eq!(resolve_move(r, 0.0, 0.0, &[]), vec2(3.0, 4.0));
    }
}

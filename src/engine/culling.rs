use eframe::egui::{Pos2, Rect, Vec2, pos2};

use super::viewport::Viewport;

fn finite_extent(value: f32) -> f32 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// World-space rectangle covered by a surface of `surface` size, grown by
/// `buffer_px` screen pixels on every side.
pub fn visible_bounds(viewport: &Viewport, surface: Vec2, buffer_px: f32) -> Rect {
    let width = finite_extent(surface.x);
    let height = finite_extent(surface.y);
    let corners = [
        pos2(0.0, 0.0),
        pos2(width, 0.0),
        pos2(0.0, height),
        pos2(width, height),
    ]
    .map(|corner| viewport.screen_to_world(corner));

    let mut bounds = Rect::NOTHING;
    for corner in corners {
        bounds.extend_with(corner);
    }

    bounds.expand(finite_extent(buffer_px) / viewport.zoom())
}

/// Closed-interval overlap on both axes; touching edges count as overlap.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.min.x <= b.max.x && b.min.x <= a.max.x && a.min.y <= b.max.y && b.min.y <= a.max.y
}

pub fn is_node_visible(node_rect: Rect, bounds: Rect) -> bool {
    rects_overlap(node_rect, bounds)
}

pub fn is_connection_visible(source_rect: Rect, target_rect: Rect, bounds: Rect) -> bool {
    is_node_visible(source_rect, bounds)
        || is_node_visible(target_rect, bounds)
        || segment_intersects_rect(source_rect.center(), target_rect.center(), bounds)
}

/// Clips the segment `start..end` against the four boundaries of `rect`.
pub fn segment_intersects_rect(start: Pos2, end: Pos2, rect: Rect) -> bool {
    let beyond_same_side = (start.x < rect.min.x && end.x < rect.min.x)
        || (start.x > rect.max.x && end.x > rect.max.x)
        || (start.y < rect.min.y && end.y < rect.min.y)
        || (start.y > rect.max.y && end.y > rect.max.y);
    if beyond_same_side {
        return false;
    }

    if rect.contains(start) || rect.contains(end) {
        return true;
    }

    let delta = end - start;

    if delta.x != 0.0 {
        for boundary in [rect.min.x, rect.max.x] {
            let t = (boundary - start.x) / delta.x;
            if (0.0..=1.0).contains(&t) {
                let y = start.y + t * delta.y;
                if y >= rect.min.y && y <= rect.max.y {
                    return true;
                }
            }
        }
    }

    if delta.y != 0.0 {
        for boundary in [rect.min.y, rect.max.y] {
            let t = (boundary - start.y) / delta.y;
            if (0.0..=1.0).contains(&t) {
                let x = start.x + t * delta.x;
                if x >= rect.min.x && x <= rect.max.x {
                    return true;
                }
            }
        }
    }

    false
}

/// True when any of the four bounds components moved by at least `epsilon`.
pub fn bounds_moved(previous: Rect, next: Rect, epsilon: f32) -> bool {
    (previous.min.x - next.min.x).abs() >= epsilon
        || (previous.min.y - next.min.y).abs() >= epsilon
        || (previous.max.x - next.max.x).abs() >= epsilon
        || (previous.max.y - next.max.y).abs() >= epsilon
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;

    fn bounds() -> Rect {
        Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0))
    }

    #[test]
    fn visible_bounds_adds_buffer_in_world_units() {
        let viewport = Viewport::new(vec2(-200.0, -100.0), 2.0);
        let rect = visible_bounds(&viewport, vec2(800.0, 600.0), 50.0);

        assert!((rect.min.x - (100.0 - 25.0)).abs() < 1e-4);
        assert!((rect.min.y - (50.0 - 25.0)).abs() < 1e-4);
        assert!((rect.max.x - (500.0 + 25.0)).abs() < 1e-4);
        assert!((rect.max.y - (350.0 + 25.0)).abs() < 1e-4);
    }

    #[test]
    fn zero_sized_surface_is_finite() {
        let viewport = Viewport::new(vec2(f32::NAN, 0.0), f32::INFINITY);
        let rect = visible_bounds(&viewport, Vec2::ZERO, 50.0);
        assert!(rect.min.x.is_finite() && rect.max.y.is_finite());
        assert_eq!(rect, Rect::from_min_max(pos2(-50.0, -50.0), pos2(50.0, 50.0)));
    }

    #[test]
    fn node_inside_bounds_is_visible() {
        let node = Rect::from_min_size(pos2(20.0, 20.0), vec2(30.0, 30.0));
        assert!(is_node_visible(node, bounds()));
    }

    #[test]
    fn node_outside_bounds_is_culled() {
        let right = Rect::from_min_size(pos2(150.0, 20.0), vec2(30.0, 30.0));
        let below = Rect::from_min_size(pos2(20.0, 101.0), vec2(30.0, 30.0));
        assert!(!is_node_visible(right, bounds()));
        assert!(!is_node_visible(below, bounds()));
    }

    #[test]
    fn node_straddling_edge_is_visible() {
        let node = Rect::from_min_size(pos2(-20.0, 40.0), vec2(30.0, 30.0));
        assert!(is_node_visible(node, bounds()));
    }

    #[test]
    fn segment_crossing_rect_is_visible() {
        assert!(segment_intersects_rect(
            pos2(-50.0, 50.0),
            pos2(150.0, 50.0),
            bounds()
        ));
        assert!(segment_intersects_rect(
            pos2(-20.0, 10.0),
            pos2(40.0, -60.0),
            Rect::from_min_max(pos2(0.0, -40.0), pos2(100.0, 100.0))
        ));
        assert!(segment_intersects_rect(
            pos2(-50.0, -50.0),
            pos2(150.0, 150.0),
            bounds()
        ));
    }

    #[test]
    fn segment_on_one_side_is_culled() {
        assert!(!segment_intersects_rect(
            pos2(-50.0, -10.0),
            pos2(200.0, -5.0),
            bounds()
        ));
        assert!(!segment_intersects_rect(
            pos2(120.0, -50.0),
            pos2(130.0, 150.0),
            bounds()
        ));
    }

    #[test]
    fn segment_missing_corner_is_culled() {
        assert!(!segment_intersects_rect(
            pos2(-60.0, 50.0),
            pos2(50.0, -60.0),
            bounds()
        ));
    }

    #[test]
    fn connection_visible_through_crossing_segment() {
        let left = Rect::from_min_size(pos2(-300.0, 40.0), vec2(20.0, 20.0));
        let right = Rect::from_min_size(pos2(300.0, 40.0), vec2(20.0, 20.0));
        assert!(is_connection_visible(left, right, bounds()));

        let far = Rect::from_min_size(pos2(300.0, 400.0), vec2(20.0, 20.0));
        assert!(!is_connection_visible(right, far, bounds()));
    }

    #[test]
    fn bounds_moved_uses_epsilon() {
        let shifted = bounds().translate(vec2(0.5, -0.5));
        assert!(!bounds_moved(bounds(), shifted, 1.0));
        let shifted = bounds().translate(vec2(1.0, 0.0));
        assert!(bounds_moved(bounds(), shifted, 1.0));
    }
}

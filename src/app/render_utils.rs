use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, pos2};

use crate::engine::{LodStyle, RenderEngine};
use crate::scene::NodeKind;

pub(super) const CANVAS_COLOR: Color32 = Color32::from_rgb(19, 23, 29);
pub(super) const EDGE_COLOR: Color32 = Color32::from_rgb(128, 138, 150);
pub(super) const SELECTED_COLOR: Color32 = Color32::from_rgb(245, 206, 93);
pub(super) const HOVER_COLOR: Color32 = Color32::from_rgb(255, 164, 101);
pub(super) const MATCH_COLOR: Color32 = Color32::from_rgb(103, 196, 255);
pub(super) const OUTLINE_COLOR: Color32 = Color32::from_rgba_premultiplied(15, 15, 15, 190);

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        (color.a() as f32 * (0.45 + (factor * 0.55))) as u8,
    )
}

pub(super) fn node_color(kind: NodeKind) -> Color32 {
    match kind {
        NodeKind::Process => Color32::from_rgb(62, 122, 178),
        NodeKind::Decision => Color32::from_rgb(176, 112, 64),
        NodeKind::Terminal => Color32::from_rgb(78, 150, 104),
    }
}

/// World point to absolute painter coordinates of the canvas at `rect`.
pub(super) fn to_canvas(rect: Rect, engine: &RenderEngine, world: Pos2) -> Pos2 {
    rect.min + engine.world_to_screen(world).to_vec2()
}

pub(super) fn from_canvas(rect: Rect, engine: &RenderEngine, screen: Pos2) -> Pos2 {
    engine.screen_to_world((screen - rect.min).to_pos2())
}

pub(super) fn world_rect_to_canvas(rect: Rect, engine: &RenderEngine, world: Rect) -> Rect {
    Rect::from_min_max(
        to_canvas(rect, engine, world.min),
        to_canvas(rect, engine, world.max),
    )
}

/// Grid lines sit on multiples of the level's world-space cell size, so they
/// stay attached to the scene while panning.
pub(super) fn draw_background(painter: &Painter, rect: Rect, engine: &RenderEngine, style: LodStyle) {
    painter.rect_filled(rect, 0.0, CANVAS_COLOR);

    let step = style.grid_cell * engine.zoom();
    if !step.is_finite() || step < 4.0 {
        return;
    }

    let stroke = Stroke::new(
        1.0,
        Color32::from_rgba_unmultiplied(60, 70, 80, style.grid_alpha),
    );
    let origin = to_canvas(rect, engine, Pos2::ZERO);

    let mut x = rect.left() + (origin.x - rect.left()).rem_euclid(step);
    while x < rect.right() {
        painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        x += step;
    }

    let mut y = rect.top() + (origin.y - rect.top()).rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment([pos2(rect.left(), y), pos2(rect.right(), y)], stroke);
        y += step;
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use crate::config::EngineConfig;

    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend_color(EDGE_COLOR, SELECTED_COLOR, 0.0), EDGE_COLOR);
        assert_eq!(blend_color(EDGE_COLOR, SELECTED_COLOR, 1.0), SELECTED_COLOR);
        assert_eq!(blend_color(EDGE_COLOR, SELECTED_COLOR, 7.0), SELECTED_COLOR);
    }

    #[test]
    fn dimming_darkens() {
        let dimmed = dim_color(MATCH_COLOR, 0.5);
        assert!(dimmed.r() < MATCH_COLOR.r());
        assert!(dimmed.b() < MATCH_COLOR.b());
    }

    #[test]
    fn canvas_mapping_is_offset_by_surface_origin() {
        let mut engine = RenderEngine::new(EngineConfig::default());
        engine.set_surface(vec2(400.0, 300.0));
        engine.pan_by(vec2(30.0, 10.0));
        let rect = Rect::from_min_size(pos2(200.0, 50.0), vec2(400.0, 300.0));

        let canvas = to_canvas(rect, &engine, pos2(5.0, 5.0));
        assert_eq!(canvas, pos2(235.0, 65.0));
        assert_eq!(from_canvas(rect, &engine, canvas), pos2(5.0, 5.0));
    }
}

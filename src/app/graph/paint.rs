use eframe::egui::epaint::{CornerRadius, CubicBezierShape};
use eframe::egui::{
    Align2, Color32, FontId, Painter, Pos2, Rect, Shape, Stroke, StrokeKind, pos2, vec2,
};

use crate::engine::{
    ConnectionGroup, DRAW_ORDER, Direction, DrawPass, FrameGeometry, NodeStyle, is_node_visible,
};
use crate::scene::{EdgeStyle, ElementId, Node, NodeId};
use crate::util::truncate_label;

use super::super::render_utils::{
    EDGE_COLOR, HOVER_COLOR, MATCH_COLOR, OUTLINE_COLOR, SELECTED_COLOR, blend_color,
    dim_color, draw_background, node_color, to_canvas, world_rect_to_canvas,
};
use super::super::{DragState, GraphEditorApp};
use super::interaction::HoverTarget;

#[derive(Clone, Copy, PartialEq, Eq)]
enum NodeEmphasis {
    Normal,
    Touched,
    Selected,
}

/// Per-frame inputs that do not live in the plan.
pub(in crate::app) struct PaintContext<'a> {
    pub(in crate::app) painter: &'a Painter,
    pub(in crate::app) rect: Rect,
    pub(in crate::app) hover: Option<(HoverTarget, Pos2)>,
}

impl GraphEditorApp {
    /// Paints the last planned frame in fixed pass order and returns the
    /// connection shapes it drew, for picking until the next call.
    pub(in crate::app) fn paint_frame(&self, cx: &PaintContext<'_>) -> FrameGeometry {
        let plan = self.engine.plan();
        let mut geometry = FrameGeometry::new(self.engine.zoom());

        for pass in DRAW_ORDER {
            match pass {
                DrawPass::Grid => {
                    draw_background(cx.painter, cx.rect, &self.engine, plan.lod.style());
                    if self.show_quadtree_overlay {
                        self.paint_quadtree_overlay(cx);
                    }
                }
                DrawPass::UnselectedConnections => {
                    for &index in &plan.batches.unselected_connections {
                        self.paint_connection(cx, &plan.groups[index], false, &mut geometry);
                    }
                }
                DrawPass::UnselectedNodes => {
                    for &id in &plan.batches.unselected_nodes {
                        self.paint_node(cx, id, NodeEmphasis::Normal);
                    }
                }
                DrawPass::SelectedConnections => {
                    for &index in &plan.batches.selected_connections {
                        self.paint_connection(cx, &plan.groups[index], true, &mut geometry);
                    }
                }
                DrawPass::SelectedNodes => {
                    for &id in &plan.batches.connection_touched_nodes {
                        self.paint_node(cx, id, NodeEmphasis::Touched);
                    }
                    for &id in &plan.batches.selected_nodes {
                        self.paint_node(cx, id, NodeEmphasis::Selected);
                    }
                }
                DrawPass::TextLabels => self.paint_labels(cx),
                DrawPass::HoverTooltip => self.paint_tooltip(cx),
                DrawPass::ConnectionPreview => self.paint_drag_overlay(cx),
            }
        }

        geometry
    }

    fn search_matches(&self, id: NodeId) -> Option<bool> {
        self.search_cache
            .as_ref()
            .filter(|cache| !cache.query.is_empty())
            .map(|cache| cache.match_set.contains(&id))
    }

    fn is_hovered_node(&self, cx: &PaintContext<'_>, id: NodeId) -> bool {
        matches!(cx.hover, Some((HoverTarget::Node(hovered), _)) if hovered == id)
    }

    fn paint_node(&self, cx: &PaintContext<'_>, id: NodeId, emphasis: NodeEmphasis) {
        let Some(node) = self.scene.node(id) else {
            return;
        };

        let lod = self.engine.plan().lod;
        let zoom = self.engine.zoom();
        let screen = world_rect_to_canvas(cx.rect, &self.engine, node.rect());

        let base = node_color(node.kind);
        let mut fill = match emphasis {
            NodeEmphasis::Selected => blend_color(base, SELECTED_COLOR, 0.35),
            NodeEmphasis::Touched => blend_color(base, SELECTED_COLOR, 0.18),
            NodeEmphasis::Normal => base,
        };
        if self.is_hovered_node(cx, id) {
            fill = blend_color(fill, HOVER_COLOR, 0.3);
        } else {
            match self.search_matches(id) {
                Some(true) => fill = blend_color(fill, MATCH_COLOR, 0.45),
                Some(false) => fill = dim_color(fill, 0.55),
                None => {}
            }
        }

        let border = match emphasis {
            NodeEmphasis::Selected => Stroke::new(2.5, SELECTED_COLOR),
            NodeEmphasis::Touched => Stroke::new(1.6, SELECTED_COLOR),
            NodeEmphasis::Normal => Stroke::new(1.0, OUTLINE_COLOR),
        };

        match lod.style().node_style {
            NodeStyle::Chrome => self.paint_node_chrome(cx, node, screen, fill, border, zoom),
            NodeStyle::Labeled => {
                cx.painter.rect_filled(screen, 2.0, fill);
                cx.painter.text(
                    screen.center(),
                    Align2::CENTER_CENTER,
                    truncate_label(&node.label, 14),
                    FontId::proportional(12.0 * zoom),
                    Color32::from_gray(235),
                );
                cx.painter
                    .rect_stroke(screen, 2.0, border, StrokeKind::Inside);
            }
            NodeStyle::Placeholder => {
                cx.painter.rect_filled(screen, 0.0, fill);
                let bar = Rect::from_center_size(
                    screen.center(),
                    vec2(screen.width() * 0.6, (screen.height() * 0.14).max(2.0)),
                );
                cx.painter.rect_filled(bar, 0.0, dim_color(fill, 0.6));
                if emphasis != NodeEmphasis::Normal {
                    cx.painter
                        .rect_stroke(screen, 0.0, border, StrokeKind::Inside);
                }
            }
            NodeStyle::Block => {
                cx.painter.rect_filled(screen, 0.0, fill);
                if emphasis != NodeEmphasis::Normal {
                    cx.painter
                        .rect_stroke(screen, 0.0, border, StrokeKind::Outside);
                }
            }
        }
    }

    fn paint_node_chrome(
        &self,
        cx: &PaintContext<'_>,
        node: &Node,
        screen: Rect,
        fill: Color32,
        border: Stroke,
        zoom: f32,
    ) {
        let radius = (6.0 * zoom).clamp(0.0, 255.0);
        let header_height = 18.0 * zoom;
        let header = Rect::from_min_max(
            screen.min,
            pos2(screen.max.x, (screen.min.y + header_height).min(screen.max.y)),
        );
        let header_radius = CornerRadius {
            nw: radius as u8,
            ne: radius as u8,
            sw: 0,
            se: 0,
        };

        cx.painter.rect_filled(screen, radius, fill);
        cx.painter
            .rect_filled(header, header_radius, dim_color(fill, 0.7));
        cx.painter.text(
            header.left_center() + vec2(6.0 * zoom, 0.0),
            Align2::LEFT_CENTER,
            node.kind.label(),
            FontId::proportional(10.0 * zoom),
            Color32::from_gray(215),
        );

        let body_center = pos2(screen.center().x, (header.max.y + screen.max.y) * 0.5);
        cx.painter.text(
            body_center,
            Align2::CENTER_CENTER,
            truncate_label(&node.label, 22),
            FontId::proportional(13.0 * zoom),
            Color32::from_gray(242),
        );
        cx.painter
            .rect_stroke(screen, radius, border, StrokeKind::Inside);
    }

    fn paint_connection(
        &self,
        cx: &PaintContext<'_>,
        group: &ConnectionGroup,
        selected: bool,
        geometry: &mut FrameGeometry,
    ) {
        let Some(shape) = self.engine.group_geometry(&self.scene, group) else {
            return;
        };

        let lod = self.engine.plan().lod;
        let hovered = matches!(
            &cx.hover,
            Some((HoverTarget::Connection(hit), _))
                if hit.node_a == group.node_a && hit.node_b == group.node_b
        );
        let mut color = if selected { SELECTED_COLOR } else { EDGE_COLOR };
        if hovered {
            color = blend_color(color, HOVER_COLOR, 0.5);
        }
        let width = lod.style().edge_width + if selected { 1.0 } else { 0.0 };
        let stroke = Stroke::new(width, color);

        let to_screen = |world: Pos2| to_canvas(cx.rect, &self.engine, world);
        let start = to_screen(shape.start);
        let end = to_screen(shape.end);
        match group.style {
            EdgeStyle::Solid => {
                cx.painter.line_segment([start, end], stroke);
            }
            EdgeStyle::Dashed => {
                cx.painter
                    .extend(Shape::dashed_line(&[start, end], stroke, 8.0, 5.0));
            }
        }

        let zoom = self.engine.zoom();
        if let Some(dot) = shape.center_dot {
            let radius = (self.engine.config().arrow_size * 0.3 * zoom).max(1.5);
            cx.painter.circle_filled(to_screen(dot), radius, color);
        }
        for arrow in &shape.arrows {
            cx.painter.add(Shape::convex_polygon(
                arrow.points().map(to_screen).to_vec(),
                color,
                Stroke::NONE,
            ));
        }

        geometry.push(group.clone(), shape);
    }

    fn paint_labels(&self, cx: &PaintContext<'_>) {
        let zoom = self.engine.zoom();
        let font_size = 14.0 * zoom;
        if font_size < 4.0 {
            return;
        }

        let bounds = self.engine.plan().bounds;
        for label in self.scene.labels() {
            let world = label.rect();
            if !is_node_visible(world, bounds) {
                continue;
            }

            let screen = world_rect_to_canvas(cx.rect, &self.engine, world);
            cx.painter.text(
                screen.min,
                Align2::LEFT_TOP,
                &label.text,
                FontId::proportional(font_size),
                Color32::from_gray(225),
            );
            if self.scene.is_selected(ElementId::Label(label.id)) {
                cx.painter.rect_stroke(
                    screen.expand(2.0),
                    2.0,
                    Stroke::new(1.2, SELECTED_COLOR),
                    StrokeKind::Outside,
                );
            }
        }
    }

    fn tooltip_text(&self, target: &HoverTarget) -> Option<String> {
        match target {
            HoverTarget::Node(id) => {
                let node = self.scene.node(*id)?;
                let outgoing = self
                    .scene
                    .edges()
                    .iter()
                    .filter(|edge| edge.source == *id)
                    .count();
                Some(format!(
                    "{}  |  {}  |  out {}",
                    node.label,
                    node.kind.label(),
                    outgoing
                ))
            }
            HoverTarget::Connection(hit) => {
                let a = self.scene.node(hit.node_a)?;
                let b = self.scene.node(hit.node_b)?;
                let (from, to) = match hit.direction {
                    Direction::Forward => (a, b),
                    Direction::Backward => (b, a),
                };
                Some(format!(
                    "{} -> {}  |  {} edge{}",
                    from.label,
                    to.label,
                    hit.edges.len(),
                    if hit.edges.len() == 1 { "" } else { "s" }
                ))
            }
        }
    }

    fn paint_tooltip(&self, cx: &PaintContext<'_>) {
        let Some((target, pointer)) = &cx.hover else {
            return;
        };
        let Some(text) = self.tooltip_text(target) else {
            return;
        };

        let galley =
            cx.painter
                .layout_no_wrap(text, FontId::proportional(13.0), Color32::from_gray(240));
        let origin = *pointer + vec2(14.0, 16.0);
        let frame = Rect::from_min_size(origin, galley.size()).expand(5.0);
        cx.painter
            .rect_filled(frame, 4.0, Color32::from_rgba_unmultiplied(10, 12, 16, 225));
        cx.painter.rect_stroke(
            frame,
            4.0,
            Stroke::new(1.0, Color32::from_gray(70)),
            StrokeKind::Inside,
        );
        cx.painter.galley(origin, galley, Color32::from_gray(240));
    }

    /// Rubber band or in-progress connection, whichever gesture is active.
    fn paint_drag_overlay(&self, cx: &PaintContext<'_>) {
        let to_screen = |world: Pos2| to_canvas(cx.rect, &self.engine, world);
        match self.drag {
            DragState::RubberBand { origin, current } => {
                let band = Rect::from_two_pos(to_screen(origin), to_screen(current));
                cx.painter
                    .rect_filled(band, 0.0, Color32::from_rgba_unmultiplied(103, 196, 255, 28));
                cx.painter.rect_stroke(
                    band,
                    0.0,
                    Stroke::new(1.0, MATCH_COLOR),
                    StrokeKind::Inside,
                );
            }
            DragState::Connecting { source, current } => {
                let Some(node) = self.scene.node(source) else {
                    return;
                };
                let start = to_screen(node.center());
                let end = to_screen(current);
                let stroke = Stroke::new(2.0, SELECTED_COLOR);

                if self.engine.plan().lod.uses_curved_edges() {
                    let bend = ((end.x - start.x).abs() * 0.5).max(30.0);
                    let direction = if end.x >= start.x { 1.0 } else { -1.0 };
                    cx.painter.add(CubicBezierShape::from_points_stroke(
                        [
                            start,
                            start + vec2(bend * direction, 0.0),
                            end - vec2(bend * direction, 0.0),
                            end,
                        ],
                        false,
                        Color32::TRANSPARENT,
                        stroke,
                    ));
                } else {
                    cx.painter
                        .extend(Shape::dashed_line(&[start, end], stroke, 6.0, 4.0));
                }
                cx.painter.circle_filled(end, 4.0, SELECTED_COLOR);
            }
            DragState::Idle | DragState::Panning | DragState::MovingNodes => {}
        }
    }

    fn paint_quadtree_overlay(&self, cx: &PaintContext<'_>) {
        for cell in self.engine.index_cells() {
            let screen = world_rect_to_canvas(cx.rect, &self.engine, cell.rect);
            let alpha = if cell.is_leaf { 110 } else { 55 };
            let line_width = (1.4_f32 - (cell.depth as f32 * 0.18)).clamp(0.45, 1.4);
            cx.painter.rect_stroke(
                screen,
                0.0,
                Stroke::new(
                    line_width,
                    Color32::from_rgba_unmultiplied(106, 198, 255, alpha),
                ),
                StrokeKind::Inside,
            );
        }
    }
}

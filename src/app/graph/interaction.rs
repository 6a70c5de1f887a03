use eframe::egui::{self, Key, Pos2, Rect, Ui};

use crate::engine::{ConnectionHit, is_connection_visible, is_node_visible};
use crate::scene::{EdgeStyle, ElementId, NodeId};

use super::super::render_utils::from_canvas;
use super::super::{DragState, GraphEditorApp};

/// What the pointer rests on, for the tooltip and hover tint.
#[derive(Clone, Debug, PartialEq)]
pub(in crate::app) enum HoverTarget {
    Node(NodeId),
    Connection(ConnectionHit),
}

impl GraphEditorApp {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.engine
            .zoom_at((pointer - rect.min).to_pos2(), zoom_factor);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.drag = DragState::Panning;
            self.engine.pan_by(response.drag_delta());
        }
    }

    /// Primary-button gestures, clicks and the delete key.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let (press_origin, shift, hover_pos) = ui.input(|input| {
            (
                input.pointer.press_origin(),
                input.modifiers.shift,
                input.pointer.hover_pos(),
            )
        });

        if response.drag_started_by(egui::PointerButton::Primary)
            && let Some(origin) = press_origin.or(response.interact_pointer_pos())
        {
            self.begin_drag(from_canvas(rect, &self.engine, origin), shift);
        }

        if !self.cancel_drag_outside(hover_pos, rect) {
            if response.dragged_by(egui::PointerButton::Primary)
                && let Some(pointer) = response.interact_pointer_pos()
            {
                let world_delta = response.drag_delta() / self.engine.zoom();
                self.update_drag(from_canvas(rect, &self.engine, pointer), world_delta);
            }

            if response.drag_stopped() {
                self.finish_drag();
            }
        }

        if response.clicked_by(egui::PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
        {
            let toggle = ui.input(|input| input.modifiers.command);
            self.click_at(from_canvas(rect, &self.engine, pointer), toggle);
        }

        let delete_pressed = !ui.ctx().wants_keyboard_input()
            && ui.input(|input| input.key_pressed(Key::Delete) || input.key_pressed(Key::Backspace));
        if delete_pressed {
            self.delete_selection();
        }
    }

    /// Drops the gesture in progress, uncommitted, once the pointer is off
    /// the canvas (`pointer` is in screen space, `None` outside the window).
    pub(in crate::app) fn cancel_drag_outside(&mut self, pointer: Option<Pos2>, rect: Rect) -> bool {
        if self.drag == DragState::Idle || pointer.is_some_and(|pointer| rect.contains(pointer)) {
            return false;
        }

        tracing::debug!(drag = ?self.drag, "pointer left the canvas, drag dropped");
        self.drag = DragState::Idle;
        self.engine.schedule_render();
        true
    }

    pub(in crate::app) fn begin_drag(&mut self, world: Pos2, connect: bool) {
        self.drag = match self.scene.node_at(world) {
            Some(source) if connect => DragState::Connecting {
                source,
                current: world,
            },
            Some(node) => {
                if !self.scene.is_selected(ElementId::Node(node)) {
                    self.scene.select(ElementId::Node(node));
                }
                DragState::MovingNodes
            }
            None => DragState::RubberBand {
                origin: world,
                current: world,
            },
        };
        self.engine.schedule_render();
    }

    pub(in crate::app) fn update_drag(&mut self, world: Pos2, world_delta: egui::Vec2) {
        match &mut self.drag {
            DragState::MovingNodes => {
                let selected: Vec<NodeId> = self
                    .scene
                    .selection()
                    .iter()
                    .filter_map(|element| match element {
                        ElementId::Node(id) => Some(*id),
                        _ => None,
                    })
                    .collect();
                for id in selected {
                    self.scene.move_node(id, world_delta);
                }
                self.engine.force_update();
            }
            DragState::RubberBand { current, .. } | DragState::Connecting { current, .. } => {
                *current = world;
                self.engine.schedule_render();
            }
            DragState::Idle | DragState::Panning => {}
        }
    }

    /// Commits the gesture in progress. The drag state is dropped in the same
    /// assignment that reads it.
    pub(in crate::app) fn finish_drag(&mut self) {
        match std::mem::replace(&mut self.drag, DragState::Idle) {
            DragState::RubberBand { origin, current } => {
                self.select_in_rect(Rect::from_two_pos(origin, current));
            }
            DragState::Connecting { source, current } => {
                if let Some(target) = self.scene.node_at(current)
                    && target != source
                    && self.scene.connect(source, target, EdgeStyle::Solid).is_some()
                {
                    self.scene_changed();
                }
            }
            DragState::MovingNodes | DragState::Panning | DragState::Idle => {}
        }
        self.engine.schedule_render();
    }

    pub(in crate::app) fn select_in_rect(&mut self, world: Rect) {
        let mut selection: Vec<ElementId> = self
            .engine
            .nodes_in_rect(&self.scene, world)
            .into_iter()
            .map(ElementId::Node)
            .collect();

        selection.extend(self.scene.edges().iter().filter_map(|edge| {
            let source = self.scene.node_rect(edge.source)?;
            let target = self.scene.node_rect(edge.target)?;
            is_connection_visible(source, target, world).then_some(ElementId::Edge(edge.id))
        }));

        selection.extend(
            self.scene
                .labels()
                .iter()
                .filter(|label| is_node_visible(label.rect(), world))
                .map(|label| ElementId::Label(label.id)),
        );

        tracing::debug!(count = selection.len(), "rubber band selection");
        self.scene.select_many(selection);
    }

    /// Node first, then free label, then connection; a miss clears the
    /// selection unless toggling.
    pub(in crate::app) fn click_at(&mut self, world: Pos2, toggle: bool) {
        let target: Option<Vec<ElementId>> = if let Some(node) = self.scene.node_at(world) {
            Some(vec![ElementId::Node(node)])
        } else if let Some(label) = self.scene.label_at(world) {
            Some(vec![ElementId::Label(label)])
        } else {
            self.engine
                .connection_at(&self.frame_geometry, world)
                .map(|hit| hit.edges.into_iter().map(ElementId::Edge).collect())
        };

        match (target, toggle) {
            (Some(elements), false) => self.scene.select_many(elements),
            (Some(elements), true) => {
                for element in elements {
                    self.scene.toggle_selected(element);
                }
            }
            (None, false) => self.scene.clear_selection(),
            (None, true) => {}
        }
        self.engine.schedule_render();
    }

    pub(in crate::app) fn delete_selection(&mut self) {
        if self.scene.remove_selected() > 0 {
            self.scene_changed();
        }
    }

    pub(in crate::app) fn hover_at(&self, world: Pos2) -> Option<HoverTarget> {
        if self.drag != DragState::Idle {
            return None;
        }

        if let Some(node) = self.scene.node_at(world) {
            return Some(HoverTarget::Node(node));
        }
        self.engine
            .connection_at(&self.frame_geometry, world)
            .map(HoverTarget::Connection)
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use crate::config::EngineConfig;
    use crate::engine::{Direction, FrameGeometry};
    use crate::scene::{NodeKind, Scene};

    use super::*;

    fn app_with_pair() -> (GraphEditorApp, NodeId, NodeId) {
        let mut scene = Scene::new();
        let a = scene.add_node(NodeKind::Process, "a", pos2(0.0, 0.0));
        let b = scene.add_node(NodeKind::Process, "b", pos2(400.0, 0.0));
        let mut app = GraphEditorApp::with_scene(scene, EngineConfig::default());
        app.engine.set_surface(vec2(800.0, 600.0));
        (app, a, b)
    }

    fn geometry_for(app: &GraphEditorApp) -> FrameGeometry {
        let mut frame = FrameGeometry::new(app.engine.zoom());
        let groups =
            crate::engine::connections::group_connections(app.scene.edges(), |_| true);
        for group in groups {
            if let Some(geometry) = app.engine.group_geometry(&app.scene, &group) {
                frame.push(group, geometry);
            }
        }
        frame
    }

    #[test]
    fn shift_drag_between_nodes_connects_them() {
        let (mut app, a, b) = app_with_pair();

        app.begin_drag(pos2(10.0, 10.0), true);
        assert!(matches!(app.drag, DragState::Connecting { source, .. } if source == a));
        app.update_drag(pos2(420.0, 20.0), vec2(410.0, 10.0));
        app.finish_drag();

        assert_eq!(app.drag, DragState::Idle);
        assert_eq!(app.scene.edge_count(), 1);
        assert_eq!(app.scene.edges()[0].source, a);
        assert_eq!(app.scene.edges()[0].target, b);
    }

    #[test]
    fn connecting_onto_empty_canvas_creates_nothing() {
        let (mut app, _, _) = app_with_pair();
        app.begin_drag(pos2(10.0, 10.0), true);
        app.update_drag(pos2(250.0, 300.0), vec2(240.0, 290.0));
        app.finish_drag();
        assert_eq!(app.scene.edge_count(), 0);
    }

    #[test]
    fn dragging_a_node_moves_the_selection() {
        let (mut app, a, b) = app_with_pair();
        app.begin_drag(pos2(10.0, 10.0), false);
        assert_eq!(app.drag, DragState::MovingNodes);
        assert!(app.scene.is_selected(ElementId::Node(a)));

        app.update_drag(pos2(30.0, 15.0), vec2(20.0, 5.0));
        app.finish_drag();
        assert_eq!(app.scene.node(a).map(|node| node.position), Some(pos2(20.0, 5.0)));
        assert_eq!(app.scene.node(b).map(|node| node.position), Some(pos2(400.0, 0.0)));
    }

    #[test]
    fn rubber_band_selects_enclosed_elements() {
        let (mut app, a, b) = app_with_pair();
        let edge = app.scene.connect(a, b, EdgeStyle::Solid);
        let label = app.scene.add_label("far away", pos2(2000.0, 2000.0));

        app.begin_drag(pos2(-50.0, -50.0), false);
        app.update_drag(pos2(200.0, 100.0), vec2(250.0, 150.0));
        app.finish_drag();

        assert!(app.scene.is_selected(ElementId::Node(a)));
        assert!(!app.scene.is_selected(ElementId::Node(b)));
        assert!(app.scene.is_selected(ElementId::Edge(edge.unwrap())));
        assert!(!app.scene.is_selected(ElementId::Label(label)));
    }

    #[test]
    fn pointer_leave_drops_drag_without_committing() {
        let canvas = Rect::from_min_size(pos2(300.0, 40.0), vec2(800.0, 600.0));

        let (mut app, _, _) = app_with_pair();
        app.begin_drag(pos2(10.0, 10.0), true);
        app.update_drag(pos2(480.0, 30.0), vec2(470.0, 20.0));
        assert!(!app.cancel_drag_outside(Some(pos2(500.0, 300.0)), canvas));
        assert!(matches!(app.drag, DragState::Connecting { .. }));

        assert!(app.cancel_drag_outside(Some(pos2(120.0, 300.0)), canvas));
        assert_eq!(app.drag, DragState::Idle);
        app.finish_drag();
        assert_eq!(app.scene.edge_count(), 0);

        app.begin_drag(pos2(-200.0, -200.0), false);
        app.update_drag(pos2(600.0, 100.0), vec2(800.0, 300.0));
        assert!(app.cancel_drag_outside(None, canvas));
        app.finish_drag();
        assert!(app.scene.selection().is_empty());
        assert!(!app.cancel_drag_outside(None, canvas));
    }

    #[test]
    fn click_prefers_nodes_then_connections_then_clears() {
        let (mut app, a, b) = app_with_pair();
        let forward = app.scene.connect(a, b, EdgeStyle::Solid).unwrap();
        let backward = app.scene.connect(b, a, EdgeStyle::Solid).unwrap();
        app.frame_geometry = geometry_for(&app);

        app.click_at(pos2(10.0, 10.0), false);
        assert!(app.scene.is_selected(ElementId::Node(a)));

        // Centres are (70, 32) and (470, 32); a body click nearer `b` picks
        // the edges leaving `b`.
        app.click_at(pos2(380.0, 33.0), false);
        assert_eq!(app.scene.selection().len(), 1);
        assert!(app.scene.is_selected(ElementId::Edge(backward)));

        app.click_at(pos2(200.0, 32.0), false);
        assert!(app.scene.is_selected(ElementId::Edge(forward)));

        app.click_at(pos2(270.0, 300.0), false);
        assert!(app.scene.selection().is_empty());
    }

    #[test]
    fn toggle_click_extends_selection() {
        let (mut app, a, b) = app_with_pair();
        app.click_at(pos2(10.0, 10.0), false);
        app.click_at(pos2(410.0, 10.0), true);
        assert!(app.scene.is_selected(ElementId::Node(a)));
        assert!(app.scene.is_selected(ElementId::Node(b)));

        app.click_at(pos2(270.0, 300.0), true);
        assert_eq!(app.scene.selection().len(), 2);
    }

    #[test]
    fn delete_removes_selection_and_edges() {
        let (mut app, a, b) = app_with_pair();
        app.scene.connect(a, b, EdgeStyle::Solid);
        app.click_at(pos2(10.0, 10.0), false);
        app.delete_selection();

        assert!(app.scene.node(a).is_none());
        assert_eq!(app.scene.edge_count(), 0);
    }

    #[test]
    fn hover_reports_connection_direction() {
        let (mut app, a, b) = app_with_pair();
        app.scene.connect(b, a, EdgeStyle::Solid);
        app.frame_geometry = geometry_for(&app);

        match app.hover_at(pos2(150.0, 33.0)) {
            Some(HoverTarget::Connection(hit)) => assert_eq!(hit.direction, Direction::Backward),
            other => panic!("expected a connection, got {other:?}"),
        }
        assert_eq!(app.hover_at(pos2(20.0, 20.0)), Some(HoverTarget::Node(a)));

        app.drag = DragState::Panning;
        assert!(app.hover_at(pos2(20.0, 20.0)).is_none());
    }
}

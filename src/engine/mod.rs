//! Canvas rendering engine: view transform, culling, level of detail, the
//! node index, connection grouping and frame scheduling.

use std::collections::HashSet;

use eframe::egui::{Pos2, Rect, Vec2};

use crate::config::EngineConfig;
use crate::scene::{NodeId, Scene};

pub mod connections;
pub mod culling;
pub mod lod;
pub mod quadtree;
pub mod scheduler;
pub mod spatial_index;
pub mod viewport;

pub use connections::{ConnectionGroup, Direction, GroupGeometry};
pub use culling::{is_connection_visible, is_node_visible};
pub use hit_test::{ConnectionHit, FrameGeometry};
pub use lod::{LodLevel, LodStyle, NodeStyle};
pub use quadtree::QuadtreeCell;
pub use scheduler::{DRAW_ORDER, DrawPass, FramePlan, RenderBatches, TickOutcome};
pub use viewport::Viewport;

use connections::{group_connections, group_geometry};
use culling::{bounds_moved, visible_bounds};
use quadtree::is_queryable;
use scheduler::{FrameScheduler, partition_batches};
use spatial_index::SpatialIndex;

/// All per-canvas render state in one owned value. The host feeds it input
/// and surface changes, asks it for frame plans and paints what it returns.
#[derive(Debug)]
pub struct RenderEngine {
    config: EngineConfig,
    viewport: Viewport,
    surface: Vec2,
    scheduler: FrameScheduler,
    index: SpatialIndex,
    plan: FramePlan,
    planned_bounds: Option<Rect>,
    force_update: bool,
}

impl RenderEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scheduler: FrameScheduler::new(config.frame_interval_secs()),
            index: SpatialIndex::new(&config),
            config,
            viewport: Viewport::default(),
            surface: Vec2::ZERO,
            plan: FramePlan::default(),
            planned_bounds: None,
            force_update: true,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn surface(&self) -> Vec2 {
        self.surface
    }

    pub fn zoom(&self) -> f32 {
        self.viewport.zoom()
    }

    pub fn lod(&self) -> LodLevel {
        LodLevel::from_zoom(self.viewport.zoom())
    }

    /// Requests a frame. Returns `true` when the host needs to wake up for it.
    pub fn schedule_render(&mut self) -> bool {
        self.scheduler.schedule()
    }

    /// Discards the cached visible set on the next planned frame and
    /// schedules one. Call after scene content changes.
    pub fn force_update(&mut self) -> bool {
        self.force_update = true;
        self.schedule_render()
    }

    pub fn set_surface(&mut self, size: Vec2) {
        if size != self.surface {
            self.surface = size;
            self.schedule_render();
        }
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        self.viewport.world_to_screen(world)
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        self.viewport.screen_to_world(screen)
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta != Vec2::ZERO {
            self.viewport.pan_by(delta);
            self.schedule_render();
        }
    }

    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let before = self.viewport;
        self.viewport.zoom_at(anchor, factor);
        if self.viewport != before {
            self.schedule_render();
        }
    }

    pub fn center_on(&mut self, world: Pos2) {
        self.viewport.center_on(world, self.surface);
        self.schedule_render();
    }

    /// Back to zoom 1 with `world` in the middle of the surface.
    pub fn reset_view(&mut self, world: Pos2) {
        self.viewport.set_zoom(1.0);
        self.center_on(world);
    }

    /// Largest zoom (within the clamp range) that shows all of `world`, with
    /// a small border, centred on the surface.
    pub fn fit_view(&mut self, world: Rect) {
        if !world.is_finite() || self.surface.x <= 0.0 || self.surface.y <= 0.0 {
            return;
        }

        let size = world.size().max(Vec2::splat(1.0));
        let zoom = (self.surface.x / size.x).min(self.surface.y / size.y) * 0.9;
        self.viewport.set_zoom(zoom);
        self.center_on(world.center());
    }

    pub fn visible_bounds(&self) -> Rect {
        visible_bounds(&self.viewport, self.surface, self.config.cull_buffer_px)
    }

    pub fn tick(&mut self, now: f64) -> TickOutcome {
        self.scheduler.tick(now)
    }

    pub fn finish_frame(&mut self, now: f64) {
        self.scheduler.finish(now);
    }

    /// Computes the plan for the frame being drawn. The visible set is kept
    /// from the previous plan while the bounds moved less than
    /// `bounds_epsilon` and no update was forced.
    pub fn plan_frame(&mut self, scene: &Scene) -> &FramePlan {
        let bounds = self.visible_bounds();
        let reuse = !self.force_update
            && self
                .planned_bounds
                .is_some_and(|previous| !bounds_moved(previous, bounds, self.config.bounds_epsilon));

        self.index.refresh(scene.nodes());

        if !reuse {
            self.plan.visible_nodes = self.visible_nodes(scene, bounds);
            self.plan.groups = group_connections(scene.edges(), |id| scene.node(id).is_some())
                .into_iter()
                .filter(|group| {
                    match (scene.node_rect(group.node_a), scene.node_rect(group.node_b)) {
                        (Some(a), Some(b)) => is_connection_visible(a, b, bounds),
                        _ => false,
                    }
                })
                .collect();
            self.plan.bounds = bounds;
            self.planned_bounds = Some(bounds);
            self.force_update = false;
        }

        self.plan.lod = self.lod();
        self.plan.index_active = self.index.is_active();
        self.plan.reused_visible_set = reuse;
        self.plan.batches = partition_batches(scene, &self.plan.visible_nodes, &self.plan.groups);

        tracing::trace!(
            nodes = self.plan.visible_nodes.len(),
            groups = self.plan.groups.len(),
            lod = self.plan.lod.label(),
            index = self.plan.index_active,
            reused = reuse,
            "planned frame"
        );

        &self.plan
    }

    pub fn plan(&self) -> &FramePlan {
        &self.plan
    }

    /// Visible nodes in scene order, through the index when it is active.
    fn visible_nodes(&self, scene: &Scene, bounds: Rect) -> Vec<NodeId> {
        if !is_queryable(bounds) {
            return Vec::new();
        }

        match self.index.query(bounds) {
            Some(hits) => {
                let hits: HashSet<NodeId> = hits.into_iter().collect();
                scene
                    .nodes()
                    .iter()
                    .filter(|node| hits.contains(&node.id))
                    .map(|node| node.id)
                    .collect()
            }
            None => scene
                .nodes()
                .iter()
                .filter(|node| is_node_visible(node.rect(), bounds))
                .map(|node| node.id)
                .collect(),
        }
    }

    /// Nodes whose rectangles overlap a world-space rectangle, in scene order.
    /// The index is rebuilt first since nodes may have moved since the last
    /// planned frame.
    pub fn nodes_in_rect(&mut self, scene: &Scene, rect: Rect) -> Vec<NodeId> {
        self.index.refresh(scene.nodes());
        self.visible_nodes(scene, rect)
    }

    /// Line and arrow shapes for a group at the planned level of detail.
    /// `None` when either endpoint has left the scene.
    pub fn group_geometry(&self, scene: &Scene, group: &ConnectionGroup) -> Option<GroupGeometry> {
        let start = scene.node(group.node_a)?.center();
        let end = scene.node(group.node_b)?.center();
        Some(group_geometry(
            group,
            start,
            end,
            self.config.arrow_size,
            self.plan.lod.draws_arrows(),
        ))
    }

    pub fn connection_at(&self, frame: &FrameGeometry, world: Pos2) -> Option<ConnectionHit> {
        hit_test::connection_at(frame, world, self.config.hit_tolerance_px)
    }

    pub fn index_active(&self) -> bool {
        self.index.is_active()
    }

    pub fn index_cells(&self) -> Vec<QuadtreeCell> {
        self.index.cells()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use crate::scene::{EdgeStyle, ElementId, NodeKind};

    use super::*;

    fn engine() -> RenderEngine {
        let mut engine = RenderEngine::new(EngineConfig::default());
        engine.set_surface(vec2(800.0, 600.0));
        engine
    }

    fn draw(engine: &mut RenderEngine, scene: &Scene, now: f64) -> bool {
        if engine.tick(now) != TickOutcome::Draw {
            return false;
        }
        engine.plan_frame(scene);
        engine.finish_frame(now);
        true
    }

    fn line_scene() -> (Scene, [NodeId; 3]) {
        let mut scene = Scene::new();
        let near = scene.add_node(NodeKind::Process, "near", pos2(100.0, 100.0));
        let far = scene.add_node(NodeKind::Process, "far", pos2(5000.0, 100.0));
        let other = scene.add_node(NodeKind::Process, "other", pos2(5000.0, 3000.0));
        scene.connect(near, far, EdgeStyle::Solid);
        scene.connect(far, other, EdgeStyle::Solid);
        (scene, [near, far, other])
    }

    #[test]
    fn plan_culls_nodes_and_connections() {
        let (scene, [near, ..]) = line_scene();
        let mut engine = engine();

        assert!(draw(&mut engine, &scene, 0.0));
        let plan = engine.plan();
        assert_eq!(plan.visible_nodes, vec![near]);
        assert_eq!(plan.groups.len(), 1);
        assert_eq!(plan.batches.unselected_nodes, vec![near]);
        assert_eq!(plan.lod, LodLevel::Full);
        assert!(!plan.index_active);
    }

    #[test]
    fn small_pan_reuses_visible_set() {
        let (scene, _) = line_scene();
        let mut engine = engine();
        draw(&mut engine, &scene, 0.0);

        engine.pan_by(vec2(0.4, 0.0));
        assert!(draw(&mut engine, &scene, 1.0));
        assert!(engine.plan().reused_visible_set);

        engine.pan_by(vec2(-4900.0, 0.0));
        assert!(draw(&mut engine, &scene, 2.0));
        assert!(!engine.plan().reused_visible_set);
        assert_eq!(engine.plan().visible_nodes.len(), 1);
    }

    #[test]
    fn forced_update_recomputes_without_movement() {
        let (mut scene, _) = line_scene();
        let mut engine = engine();
        draw(&mut engine, &scene, 0.0);

        let added = scene.add_node(NodeKind::Terminal, "new", pos2(300.0, 300.0));
        engine.schedule_render();
        draw(&mut engine, &scene, 1.0);
        assert!(!engine.plan().visible_nodes.contains(&added));

        engine.force_update();
        draw(&mut engine, &scene, 2.0);
        assert!(engine.plan().visible_nodes.contains(&added));
    }

    #[test]
    fn selection_changes_apply_to_reused_plans() {
        let (mut scene, [near, ..]) = line_scene();
        let mut engine = engine();
        draw(&mut engine, &scene, 0.0);

        scene.select(ElementId::Node(near));
        engine.schedule_render();
        draw(&mut engine, &scene, 1.0);
        assert!(engine.plan().reused_visible_set);
        assert_eq!(engine.plan().batches.selected_nodes, vec![near]);
    }

    #[test]
    fn index_takes_over_for_large_scenes() {
        let mut scene = Scene::new();
        for index in 0..600 {
            let position = pos2((index % 30) as f32 * 200.0, (index / 30) as f32 * 100.0);
            scene.add_node(NodeKind::Process, format!("n{index}"), position);
        }
        let mut engine = engine();
        engine.schedule_render();
        draw(&mut engine, &scene, 0.0);
        assert!(engine.index_active());
        assert!(engine.plan().index_active);

        let expected: Vec<NodeId> = scene
            .nodes()
            .iter()
            .filter(|node| is_node_visible(node.rect(), engine.plan().bounds))
            .map(|node| node.id)
            .collect();
        assert_eq!(engine.plan().visible_nodes, expected);
        assert!(engine.index_cells().len() > 1);
    }

    #[test]
    fn rect_queries_see_nodes_moved_after_planning() {
        let mut scene = Scene::new();
        let mut ids = Vec::new();
        for index in 0..600 {
            let position = pos2((index % 30) as f32 * 200.0, (index / 30) as f32 * 100.0);
            ids.push(scene.add_node(NodeKind::Process, format!("n{index}"), position));
        }
        let mut engine = engine();
        engine.schedule_render();
        draw(&mut engine, &scene, 0.0);
        assert!(engine.index_active());

        assert!(scene.move_node(ids[1], vec2(3000.0, 3000.0)));
        let moved = scene.node_rect(ids[1]).unwrap();
        assert_eq!(engine.nodes_in_rect(&scene, moved.shrink(2.0)), vec![ids[1]]);
        let old_spot = Rect::from_center_size(pos2(200.0, 0.0), vec2(4.0, 4.0));
        assert!(!engine.nodes_in_rect(&scene, old_spot).contains(&ids[1]));
    }

    #[test]
    fn zero_area_rects_match_nothing_on_both_paths() {
        let band = Rect::from_min_max(pos2(-100.0, 120.0), pos2(10_000.0, 120.0));

        let (small, _) = line_scene();
        let mut linear = engine();
        assert!(!linear.index_active());
        assert!(linear.nodes_in_rect(&small, band).is_empty());

        let mut large = Scene::new();
        for index in 0..600 {
            let position = pos2((index % 30) as f32 * 200.0, (index / 30) as f32 * 100.0);
            large.add_node(NodeKind::Process, format!("n{index}"), position);
        }
        let mut indexed = engine();
        assert!(indexed.nodes_in_rect(&large, band).is_empty());
        assert!(indexed.index_active());
    }

    #[test]
    fn zoom_changes_lod_and_arrows() {
        let (scene, _) = line_scene();
        let mut engine = engine();
        engine.zoom_at(pos2(0.0, 0.0), 0.5);
        assert_eq!(engine.lod(), LodLevel::Placeholder);

        draw(&mut engine, &scene, 0.0);
        let group = engine.plan().groups[0].clone();
        let geometry = engine.group_geometry(&scene, &group).unwrap();
        assert!(geometry.arrows.is_empty());
    }

    #[test]
    fn hit_test_uses_configured_tolerance() {
        let (scene, [near, far, _]) = line_scene();
        let mut engine = engine();
        draw(&mut engine, &scene, 0.0);

        let mut frame = FrameGeometry::new(engine.zoom());
        for group in engine.plan().groups.clone() {
            let geometry = engine.group_geometry(&scene, &group).unwrap();
            frame.push(group, geometry);
        }

        let on_line = pos2(1000.0, 132.0 + 4.0);
        let hit = engine.connection_at(&frame, on_line).unwrap();
        assert_eq!((hit.node_a, hit.node_b), (near, far));
        assert!(engine.connection_at(&frame, pos2(1000.0, 132.0 + 6.0)).is_none());
    }

    #[test]
    fn fit_view_shows_whole_rect() {
        let mut engine = engine();
        let world = Rect::from_min_max(pos2(1000.0, 1000.0), pos2(5000.0, 2000.0));
        engine.fit_view(world);

        assert!((engine.zoom() - 0.18).abs() < 1e-4);
        let bounds = culling::visible_bounds(engine.viewport(), engine.surface(), 0.0);
        assert!(bounds.contains_rect(world));
        let center = engine.world_to_screen(world.center());
        assert!((center - pos2(400.0, 300.0)).length() < 1e-2);
    }

    #[test]
    fn redundant_view_changes_do_not_schedule() {
        let mut engine = engine();
        assert_eq!(engine.tick(0.0), TickOutcome::Draw);
        engine.finish_frame(0.0);

        engine.pan_by(Vec2::ZERO);
        engine.set_surface(vec2(800.0, 600.0));
        engine.zoom_at(pos2(10.0, 10.0), f32::NAN);
        assert_eq!(engine.tick(1.0), TickOutcome::Idle);
    }
}

use std::collections::{HashSet, VecDeque};

use eframe::egui::{Context, Pos2};

use crate::config::EngineConfig;
use crate::engine::{FrameGeometry, RenderEngine};
use crate::scene::{NodeId, NodeKind, Scene};

mod graph;
mod layout;
mod render_utils;
mod ui;

use layout::LayoutStepper;

pub struct GraphEditorApp {
    scene: Scene,
    engine: RenderEngine,
    frame_geometry: FrameGeometry,
    drag: DragState,
    layout: LayoutStepper,
    live_layout: bool,
    show_quadtree_overlay: bool,
    view_initialized: bool,
    search: String,
    search_cache: Option<SearchCache>,
    new_node_kind: NodeKind,
    new_label_text: String,
    show_fps_bar: bool,
    fps_current: f32,
    fps_samples: VecDeque<f32>,
}

/// Pointer gesture in progress on the canvas. Positions are world space.
#[derive(Clone, Copy, Debug, PartialEq)]
enum DragState {
    Idle,
    Panning,
    MovingNodes,
    RubberBand { origin: Pos2, current: Pos2 },
    Connecting { source: NodeId, current: Pos2 },
}

struct SearchCache {
    query: String,
    matches: Vec<NodeId>,
    match_set: HashSet<NodeId>,
}

impl GraphEditorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, scene: Scene, config: EngineConfig) -> Self {
        Self::with_scene(scene, config)
    }

    fn with_scene(scene: Scene, config: EngineConfig) -> Self {
        tracing::info!(
            nodes = scene.node_count(),
            edges = scene.edge_count(),
            "opening editor"
        );

        Self {
            scene,
            engine: RenderEngine::new(config),
            frame_geometry: FrameGeometry::default(),
            drag: DragState::Idle,
            layout: LayoutStepper::new(),
            live_layout: false,
            show_quadtree_overlay: false,
            view_initialized: false,
            search: String::new(),
            search_cache: None,
            new_node_kind: NodeKind::Process,
            new_label_text: String::new(),
            show_fps_bar: true,
            fps_current: 0.0,
            fps_samples: VecDeque::new(),
        }
    }

    /// Call after any edit to the scene so the next frame re-culls.
    fn scene_changed(&mut self) {
        self.search_cache = None;
        self.engine.force_update();
    }
}

impl eframe::App for GraphEditorApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.show(ctx);
    }
}

use std::collections::HashSet;
use std::time::Duration;

use eframe::egui::Rect;

use crate::scene::{ElementId, NodeId, Scene};

use super::connections::ConnectionGroup;
use super::lod::LodLevel;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    FrameScheduled,
    Drawing,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TickOutcome {
    /// Nothing was scheduled.
    Idle,
    /// A frame is pending but the frame interval has not elapsed yet.
    Throttled { retry_in: Duration },
    /// The caller should plan and draw a frame, then call `finish`.
    Draw,
}

/// Coalesces repaint requests into at most one pending frame and throttles
/// drawing to one frame per interval.
#[derive(Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    interval_secs: f64,
    last_draw: Option<f64>,
}

impl FrameScheduler {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            state: SchedulerState::Idle,
            interval_secs,
            last_draw: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Returns `true` only when this call moved the scheduler out of idle.
    pub fn schedule(&mut self) -> bool {
        if self.state == SchedulerState::Idle {
            self.state = SchedulerState::FrameScheduled;
            true
        } else {
            false
        }
    }

    pub fn tick(&mut self, now: f64) -> TickOutcome {
        if self.state != SchedulerState::FrameScheduled {
            return TickOutcome::Idle;
        }

        if let Some(last_draw) = self.last_draw {
            let elapsed = (now - last_draw).max(0.0);
            if elapsed < self.interval_secs {
                return TickOutcome::Throttled {
                    retry_in: Duration::from_secs_f64(self.interval_secs - elapsed),
                };
            }
        }

        self.state = SchedulerState::Drawing;
        TickOutcome::Draw
    }

    pub fn finish(&mut self, now: f64) {
        if self.state == SchedulerState::Drawing {
            self.last_draw = Some(now);
            self.state = SchedulerState::Idle;
        }
    }
}

/// Paint passes in back-to-front order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawPass {
    Grid,
    UnselectedConnections,
    UnselectedNodes,
    SelectedConnections,
    SelectedNodes,
    TextLabels,
    HoverTooltip,
    ConnectionPreview,
}

pub const DRAW_ORDER: [DrawPass; 8] = [
    DrawPass::Grid,
    DrawPass::UnselectedConnections,
    DrawPass::UnselectedNodes,
    DrawPass::SelectedConnections,
    DrawPass::SelectedNodes,
    DrawPass::TextLabels,
    DrawPass::HoverTooltip,
    DrawPass::ConnectionPreview,
];

/// Visible elements split by selection state so each pass keeps one set of
/// colours and stroke widths. Connection entries index `FramePlan::groups`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderBatches {
    pub unselected_connections: Vec<usize>,
    pub unselected_nodes: Vec<NodeId>,
    pub selected_connections: Vec<usize>,
    pub selected_nodes: Vec<NodeId>,
    /// Endpoints of selected connections, filled only when no node is
    /// selected. Drawn with the selected nodes.
    pub connection_touched_nodes: Vec<NodeId>,
}

pub fn partition_batches(
    scene: &Scene,
    visible_nodes: &[NodeId],
    groups: &[ConnectionGroup],
) -> RenderBatches {
    let mut batches = RenderBatches::default();

    for (index, group) in groups.iter().enumerate() {
        let selected = group
            .all_edges()
            .any(|edge| scene.is_selected(ElementId::Edge(edge)));
        if selected {
            batches.selected_connections.push(index);
        } else {
            batches.unselected_connections.push(index);
        }
    }

    let mut touched = HashSet::new();
    if !scene.has_selected_nodes() {
        for &index in &batches.selected_connections {
            touched.insert(groups[index].node_a);
            touched.insert(groups[index].node_b);
        }
    }

    for &node in visible_nodes {
        if scene.is_selected(ElementId::Node(node)) {
            batches.selected_nodes.push(node);
        } else if touched.contains(&node) {
            batches.connection_touched_nodes.push(node);
        } else {
            batches.unselected_nodes.push(node);
        }
    }

    batches
}

/// Output of one planning pass, reused for painting until the next one.
#[derive(Clone, Debug)]
pub struct FramePlan {
    pub bounds: Rect,
    pub lod: LodLevel,
    pub visible_nodes: Vec<NodeId>,
    pub groups: Vec<ConnectionGroup>,
    pub batches: RenderBatches,
    pub index_active: bool,
    pub reused_visible_set: bool,
}

impl Default for FramePlan {
    fn default() -> Self {
        Self {
            bounds: Rect::NOTHING,
            lod: LodLevel::Full,
            visible_nodes: Vec::new(),
            groups: Vec::new(),
            batches: RenderBatches::default(),
            index_active: false,
            reused_visible_set: false,
        }
    }
}

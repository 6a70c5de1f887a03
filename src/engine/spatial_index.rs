use eframe::egui::Rect;

use crate::config::EngineConfig;
use crate::scene::{Node, NodeId};

use super::quadtree::{Quadtree, QuadtreeCell, QuadtreeLimits};

/// Quadtree over node rectangles that only exists while the scene is larger
/// than `threshold`. Below that a linear scan is cheaper than building it.
#[derive(Debug)]
pub struct SpatialIndex {
    threshold: usize,
    margin: f32,
    limits: QuadtreeLimits,
    tree: Option<Quadtree<NodeId>>,
}

fn node_bounds(nodes: &[Node]) -> Rect {
    nodes
        .iter()
        .map(Node::rect)
        .filter(|rect| rect.is_finite())
        .reduce(|a, b| a.union(b))
        .unwrap_or(Rect::ZERO)
}

impl SpatialIndex {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            threshold: config.index_threshold,
            margin: config.index_margin,
            limits: QuadtreeLimits {
                max_objects: config.index_max_objects,
                max_levels: config.index_max_levels,
            },
            tree: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.tree.is_some()
    }

    /// Switches the index on or off for the current node count and, when on,
    /// rebuilds it from scratch. Node positions change between frames and the
    /// tree does not support relocating entries.
    pub fn refresh(&mut self, nodes: &[Node]) {
        let should_be_active = nodes.len() > self.threshold;
        if should_be_active != self.is_active() {
            tracing::debug!(
                active = should_be_active,
                nodes = nodes.len(),
                threshold = self.threshold,
                "spatial index toggled"
            );
        }

        if !should_be_active {
            self.tree = None;
            return;
        }

        let bounds = node_bounds(nodes).expand(self.margin);
        let limits = self.limits;
        let tree = self
            .tree
            .get_or_insert_with(|| Quadtree::new(bounds, limits));
        if tree.bounds() != bounds {
            *tree = Quadtree::new(bounds, limits);
        } else {
            tree.clear();
        }

        for node in nodes {
            tree.insert(node.rect(), node.id);
        }
    }

    /// Node ids overlapping `rect`, or `None` while inactive so the caller
    /// falls back to scanning every node.
    pub fn query(&self, rect: Rect) -> Option<Vec<NodeId>> {
        self.tree.as_ref().map(|tree| tree.query(rect))
    }

    pub fn cells(&self) -> Vec<QuadtreeCell> {
        self.tree.as_ref().map(Quadtree::cells).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use crate::scene::{NodeKind, Scene};

    use super::*;

    fn scene_with(count: usize) -> Scene {
        let mut scene = Scene::new();
        for index in 0..count {
            let position = pos2((index % 40) as f32 * 200.0, (index / 40) as f32 * 120.0);
            scene.add_node(NodeKind::Process, format!("n{index}"), position);
        }
        scene
    }

    #[test]
    fn activates_above_threshold_only() {
        let config = EngineConfig::default();
        let mut index = SpatialIndex::new(&config);

        index.refresh(scene_with(500).nodes());
        assert!(!index.is_active());
        assert!(index.query(Rect::EVERYTHING).is_none());

        index.refresh(scene_with(501).nodes());
        assert!(index.is_active());

        index.refresh(scene_with(500).nodes());
        assert!(!index.is_active());
        assert!(index.cells().is_empty());
    }

    #[test]
    fn rebuild_tracks_moved_nodes() {
        let config = EngineConfig {
            index_threshold: 3,
            ..EngineConfig::default()
        };
        let mut index = SpatialIndex::new(&config);
        let mut scene = scene_with(10);
        let moved = scene.nodes()[0].id;

        index.refresh(scene.nodes());
        let probe = Rect::from_min_size(pos2(5000.0, 5000.0), vec2(50.0, 50.0));
        assert_eq!(index.query(probe), Some(Vec::new()));

        scene.move_node(moved, vec2(5010.0, 5010.0));
        index.refresh(scene.nodes());
        assert_eq!(index.query(probe), Some(vec![moved]));
    }

    #[test]
    fn root_bounds_include_margin() {
        let config = EngineConfig {
            index_threshold: 0,
            ..EngineConfig::default()
        };
        let mut index = SpatialIndex::new(&config);
        index.refresh(scene_with(2).nodes());

        let root = index.cells()[0].rect;
        assert_eq!(root.min, pos2(-1000.0, -1000.0));
        assert_eq!(root.max, pos2(200.0 + 140.0 + 1000.0, 64.0 + 1000.0));
    }
}

use std::collections::{HashMap, HashSet};

use eframe::egui::{Pos2, Rect, Vec2, vec2};

mod demo;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub u32);

/// Anything the user can select on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementId {
    Node(NodeId),
    Edge(EdgeId),
    Label(LabelId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Process,
    Decision,
    Terminal,
}

impl NodeKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Process => "process",
            Self::Decision => "decision",
            Self::Terminal => "terminal",
        }
    }

    pub fn default_size(self) -> Vec2 {
        match self {
            Self::Process => vec2(140.0, 64.0),
            Self::Decision => vec2(120.0, 72.0),
            Self::Terminal => vec2(112.0, 48.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeStyle {
    #[default]
    Solid,
    Dashed,
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub position: Pos2,
    pub size: Vec2,
}

impl Node {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(self.position, self.size)
    }

    pub fn center(&self) -> Pos2 {
        self.position + self.size * 0.5
    }
}

#[derive(Clone, Debug)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
}

#[derive(Clone, Debug)]
pub struct TextLabel {
    pub id: LabelId,
    pub text: String,
    pub position: Pos2,
}

/// Approximate glyph box of free labels in world units, used for picking
/// and culling without a font.
pub const LABEL_CHAR_WIDTH: f32 = 8.0;
pub const LABEL_HEIGHT: f32 = 18.0;

impl TextLabel {
    pub fn rect(&self) -> Rect {
        let width = self.text.chars().count().max(1) as f32 * LABEL_CHAR_WIDTH;
        Rect::from_min_size(self.position, vec2(width, LABEL_HEIGHT))
    }
}

/// The document the editor works on. The canvas engine only reads geometry
/// and selection from it.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    labels: Vec<TextLabel>,
    index_by_id: HashMap<NodeId, usize>,
    selection: HashSet<ElementId>,
    next_id: u32,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }

    fn reindex(&mut self) {
        self.index_by_id.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            self.index_by_id.insert(node.id, index);
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Positions may be mutated in place (drag, layout); the slice cannot be
    /// reordered so the id lookup stays valid.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn labels(&self) -> &[TextLabel] {
        &self.labels
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index_by_id
            .get(&id)
            .and_then(|&index| self.nodes.get(index))
    }

    pub fn node_rect(&self, id: NodeId) -> Option<Rect> {
        self.node(id).map(Node::rect)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|edge| edge.id == id)
    }

    /// Topmost node whose rectangle contains `world`.
    pub fn node_at(&self, world: Pos2) -> Option<NodeId> {
        self.nodes
            .iter()
            .rev()
            .find(|node| node.rect().contains(world))
            .map(|node| node.id)
    }

    pub fn label_at(&self, world: Pos2) -> Option<LabelId> {
        self.labels
            .iter()
            .rev()
            .find(|label| label.rect().contains(world))
            .map(|label| label.id)
    }

    /// Union of all node rectangles, `None` for an empty scene.
    pub fn bounds(&self) -> Option<Rect> {
        self.nodes.iter().map(Node::rect).reduce(|a, b| a.union(b))
    }

    pub fn add_node(&mut self, kind: NodeKind, label: impl Into<String>, position: Pos2) -> NodeId {
        let id = NodeId(self.allocate_id());
        self.index_by_id.insert(id, self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            label: label.into(),
            position,
            size: kind.default_size(),
        });
        id
    }

    pub fn connect(&mut self, source: NodeId, target: NodeId, style: EdgeStyle) -> Option<EdgeId> {
        if source == target {
            tracing::warn!(node = source.0, "rejected self-loop connection");
            return None;
        }
        if self.node(source).is_none() || self.node(target).is_none() {
            tracing::warn!(
                source = source.0,
                target = target.0,
                "rejected connection to unknown node"
            );
            return None;
        }

        let id = EdgeId(self.allocate_id());
        self.edges.push(Edge {
            id,
            source,
            target,
            style,
        });
        tracing::debug!(edge = id.0, source = source.0, target = target.0, "connected nodes");
        Some(id)
    }

    pub fn add_label(&mut self, text: impl Into<String>, position: Pos2) -> LabelId {
        let id = LabelId(self.allocate_id());
        self.labels.push(TextLabel {
            id,
            text: text.into(),
            position,
        });
        id
    }

    pub fn move_node(&mut self, id: NodeId, delta: Vec2) -> bool {
        let Some(&index) = self.index_by_id.get(&id) else {
            return false;
        };
        self.nodes[index].position += delta;
        true
    }

    /// Deletes every selected element. Edges left dangling by removed nodes
    /// are dropped with them.
    pub fn remove_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }

        let before = self.nodes.len() + self.edges.len() + self.labels.len();
        let selection = std::mem::take(&mut self.selection);

        self.nodes
            .retain(|node| !selection.contains(&ElementId::Node(node.id)));
        self.labels
            .retain(|label| !selection.contains(&ElementId::Label(label.id)));
        self.reindex();

        let index_by_id = &self.index_by_id;
        self.edges.retain(|edge| {
            !selection.contains(&ElementId::Edge(edge.id))
                && index_by_id.contains_key(&edge.source)
                && index_by_id.contains_key(&edge.target)
        });

        let removed = before - (self.nodes.len() + self.edges.len() + self.labels.len());
        tracing::debug!(removed, "removed selected elements");
        removed
    }

    pub fn selection(&self) -> &HashSet<ElementId> {
        &self.selection
    }

    pub fn is_selected(&self, element: ElementId) -> bool {
        self.selection.contains(&element)
    }

    pub fn has_selected_nodes(&self) -> bool {
        self.selection
            .iter()
            .any(|element| matches!(element, ElementId::Node(_)))
    }

    pub fn select(&mut self, element: ElementId) {
        self.selection.clear();
        self.selection.insert(element);
    }

    pub fn select_many(&mut self, elements: impl IntoIterator<Item = ElementId>) {
        self.selection.clear();
        self.selection.extend(elements);
    }

    pub fn toggle_selected(&mut self, element: ElementId) {
        if !self.selection.remove(&element) {
            self.selection.insert(element);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }
}

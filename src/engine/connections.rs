use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, vec2};

use crate::scene::{Edge, EdgeId, EdgeStyle, NodeId};

use super::hit_test::point_in_triangle;

/// Direction of an edge relative to its group's canonical `node_a -> node_b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Forward,
    Backward,
}

/// Every directed edge between one unordered node pair. Drawn as one line
/// with up to two arrow clusters and hit-tested as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionGroup {
    pub node_a: NodeId,
    pub node_b: NodeId,
    pub forward: Vec<EdgeId>,
    pub backward: Vec<EdgeId>,
    pub style: EdgeStyle,
}

impl ConnectionGroup {
    pub fn is_bidirectional(&self) -> bool {
        !self.forward.is_empty() && !self.backward.is_empty()
    }

    pub fn edges(&self, direction: Direction) -> &[EdgeId] {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn all_edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.forward.iter().chain(self.backward.iter()).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.len() + self.backward.len()
    }
}

/// Buckets edges by their sorted endpoint pair, keeping first-seen group
/// order and scene order within each direction. Edges whose endpoints are
/// unknown to `has_node` are dropped.
pub fn group_connections<'a>(
    edges: impl IntoIterator<Item = &'a Edge>,
    has_node: impl Fn(NodeId) -> bool,
) -> Vec<ConnectionGroup> {
    let mut groups: Vec<ConnectionGroup> = Vec::new();
    let mut group_by_pair: HashMap<(NodeId, NodeId), usize> = HashMap::new();

    for edge in edges {
        if !has_node(edge.source) || !has_node(edge.target) {
            continue;
        }

        let (node_a, node_b, direction) = if edge.source <= edge.target {
            (edge.source, edge.target, Direction::Forward)
        } else {
            (edge.target, edge.source, Direction::Backward)
        };

        let index = *group_by_pair.entry((node_a, node_b)).or_insert_with(|| {
            groups.push(ConnectionGroup {
                node_a,
                node_b,
                forward: Vec::new(),
                backward: Vec::new(),
                style: edge.style,
            });
            groups.len() - 1
        });

        let group = &mut groups[index];
        if edge.style == EdgeStyle::Solid {
            group.style = EdgeStyle::Solid;
        }
        match direction {
            Direction::Forward => group.forward.push(edge.id),
            Direction::Backward => group.backward.push(edge.id),
        }
    }

    groups
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArrowHead {
    pub direction: Direction,
    pub tip: Pos2,
    pub left: Pos2,
    pub right: Pos2,
}

impl ArrowHead {
    /// Arrowhead centred on `center` pointing along the unit vector `heading`.
    pub fn new(center: Pos2, heading: Vec2, size: f32, direction: Direction) -> Self {
        let normal = vec2(-heading.y, heading.x);
        let base = center - heading * (size * 0.5);
        Self {
            direction,
            tip: center + heading * size,
            left: base + normal * (size * 0.5),
            right: base - normal * (size * 0.5),
        }
    }

    pub fn points(&self) -> [Pos2; 3] {
        [self.tip, self.left, self.right]
    }

    pub fn contains(&self, point: Pos2) -> bool {
        point_in_triangle(point, self.tip, self.left, self.right)
    }
}

/// World-space shapes of one drawn group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupGeometry {
    pub start: Pos2,
    pub end: Pos2,
    pub center_dot: Option<Pos2>,
    pub arrows: Vec<ArrowHead>,
}

impl GroupGeometry {
    pub fn midpoint(&self) -> Pos2 {
        self.start + (self.end - self.start) * 0.5
    }
}

fn arrow_cluster(
    center: Pos2,
    heading: Vec2,
    count: usize,
    size: f32,
    direction: Direction,
    out: &mut Vec<ArrowHead>,
) {
    match count {
        0 => {}
        1 => out.push(ArrowHead::new(center, heading, size, direction)),
        _ => {
            let half_gap = heading * (size * 0.75);
            out.push(ArrowHead::new(center - half_gap, heading, size, direction));
            out.push(ArrowHead::new(center + half_gap, heading, size, direction));
        }
    }
}

/// Line between the two node centres plus arrow clusters. Single-direction
/// groups get one cluster on the midpoint; bidirectional groups get a centre
/// dot with a cluster on each side pointing at that side's target.
pub fn group_geometry(
    group: &ConnectionGroup,
    start: Pos2,
    end: Pos2,
    arrow_size: f32,
    with_arrows: bool,
) -> GroupGeometry {
    let mut geometry = GroupGeometry {
        start,
        end,
        center_dot: None,
        arrows: Vec::new(),
    };

    let delta = end - start;
    let length = delta.length();
    if !with_arrows || !length.is_finite() || length <= f32::EPSILON {
        return geometry;
    }

    let heading = delta / length;
    let midpoint = geometry.midpoint();

    if group.is_bidirectional() {
        let offset = heading * (arrow_size * 2.5);
        geometry.center_dot = Some(midpoint);
        arrow_cluster(
            midpoint + offset,
            heading,
            group.forward.len(),
            arrow_size,
            Direction::Forward,
            &mut geometry.arrows,
        );
        arrow_cluster(
            midpoint - offset,
            -heading,
            group.backward.len(),
            arrow_size,
            Direction::Backward,
            &mut geometry.arrows,
        );
    } else if !group.forward.is_empty() {
        arrow_cluster(
            midpoint,
            heading,
            group.forward.len(),
            arrow_size,
            Direction::Forward,
            &mut geometry.arrows,
        );
    } else {
        arrow_cluster(
            midpoint,
            -heading,
            group.backward.len(),
            arrow_size,
            Direction::Backward,
            &mut geometry.arrows,
        );
    }

    geometry
}

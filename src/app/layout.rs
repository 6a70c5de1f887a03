use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2, vec2};

use crate::scene::{Node, NodeId, Scene};

const STEP_HZ: f64 = 30.0;

const REPULSION: f32 = 52_000.0;
const SOFTENING: f32 = 900.0;
const SPRING: f32 = 0.014;
const PREFERRED_LENGTH: f32 = 260.0;
const DAMPING: f32 = 0.82;
const MAX_FORCE: f32 = 140.0;
const MAX_SPEED: f32 = 18.0;

/// Fixed-rate driver for the spring relaxation. Velocities are keyed by node
/// id so deletions do not shift them onto other nodes.
pub(super) struct LayoutStepper {
    interval_secs: f64,
    last_step: Option<f64>,
    velocities: HashMap<NodeId, Vec2>,
}

impl LayoutStepper {
    pub(super) fn new() -> Self {
        Self {
            interval_secs: 1.0 / STEP_HZ,
            last_step: None,
            velocities: HashMap::new(),
        }
    }

    pub(super) fn interval_secs(&self) -> f64 {
        self.interval_secs
    }

    pub(super) fn reset(&mut self) {
        self.last_step = None;
        self.velocities.clear();
    }

    /// Runs one relaxation step when the interval has elapsed. Returns `true`
    /// when any node moved.
    pub(super) fn tick(&mut self, now: f64, scene: &mut Scene) -> bool {
        if let Some(last_step) = self.last_step
            && now - last_step < self.interval_secs
        {
            return false;
        }

        self.last_step = Some(now);
        relax(scene, &mut self.velocities)
    }
}

fn fallback_direction(i: usize, j: usize) -> Vec2 {
    let angle = ((i as f32) * 0.618_034 + (j as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

/// One step of pairwise repulsion plus spring attraction along edges,
/// measured between node centres.
pub(super) fn relax(scene: &mut Scene, velocities: &mut HashMap<NodeId, Vec2>) -> bool {
    let node_count = scene.node_count();
    if node_count < 2 {
        return false;
    }

    let centers: Vec<Pos2> = scene.nodes().iter().map(Node::center).collect();
    let index_by_id: HashMap<NodeId, usize> = scene
        .nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id, index))
        .collect();
    let mut forces = vec![Vec2::ZERO; node_count];

    for i in 0..node_count {
        for j in (i + 1)..node_count {
            let delta = centers[i] - centers[j];
            let distance_sq = delta.length_sq();
            let distance = distance_sq.sqrt();
            let direction = if distance > 0.0001 {
                delta / distance
            } else {
                fallback_direction(i, j)
            };

            let repulsion = REPULSION / (distance_sq + SOFTENING);
            forces[i] += direction * repulsion;
            forces[j] -= direction * repulsion;
        }
    }

    for edge in scene.edges() {
        let (Some(&from), Some(&to)) = (index_by_id.get(&edge.source), index_by_id.get(&edge.target))
        else {
            continue;
        };

        let delta = centers[from] - centers[to];
        let distance = delta.length();
        if distance <= 0.0001 {
            continue;
        }

        let correction = delta / distance * ((distance - PREFERRED_LENGTH) * SPRING);
        forces[from] -= correction;
        forces[to] += correction;
    }

    let mut moving = false;
    for (node, force) in scene.nodes_mut().iter_mut().zip(forces) {
        let force = if force.length() > MAX_FORCE {
            force.normalized() * MAX_FORCE
        } else {
            force
        };

        let velocity = velocities.entry(node.id).or_insert(Vec2::ZERO);
        let mut next = (*velocity + force * 0.06) * DAMPING;
        if next.length() > MAX_SPEED {
            next = next.normalized() * MAX_SPEED;
        }
        if next.length() < 0.02 {
            next = Vec2::ZERO;
        }

        *velocity = next;
        if next != Vec2::ZERO {
            node.position += next;
            moving = true;
        }
    }

    velocities.retain(|id, _| index_by_id.contains_key(id));
    moving
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use crate::scene::{EdgeStyle, NodeKind};

    use super::*;

    fn center_distance(scene: &Scene, a: NodeId, b: NodeId) -> f32 {
        match (scene.node(a), scene.node(b)) {
            (Some(a), Some(b)) => a.center().distance(b.center()),
            _ => f32::NAN,
        }
    }

    #[test]
    fn springs_pull_distant_neighbours_together() {
        let mut scene = Scene::new();
        let a = scene.add_node(NodeKind::Process, "a", pos2(0.0, 0.0));
        let b = scene.add_node(NodeKind::Process, "b", pos2(2000.0, 0.0));
        scene.connect(a, b, EdgeStyle::Solid);

        let before = center_distance(&scene, a, b);
        let mut velocities = HashMap::new();
        for _ in 0..20 {
            relax(&mut scene, &mut velocities);
        }
        assert!(center_distance(&scene, a, b) < before);
    }

    #[test]
    fn repulsion_separates_stacked_nodes() {
        let mut scene = Scene::new();
        let a = scene.add_node(NodeKind::Process, "a", pos2(0.0, 0.0));
        let b = scene.add_node(NodeKind::Process, "b", pos2(0.0, 0.0));

        let mut velocities = HashMap::new();
        assert!(relax(&mut scene, &mut velocities));
        assert!(center_distance(&scene, a, b) > 0.0);
    }

    #[test]
    fn single_node_never_moves() {
        let mut scene = Scene::new();
        scene.add_node(NodeKind::Terminal, "alone", pos2(5.0, 5.0));
        assert!(!relax(&mut scene, &mut HashMap::new()));
    }

    #[test]
    fn stepper_runs_at_fixed_rate() {
        let mut scene = Scene::new();
        scene.add_node(NodeKind::Process, "a", pos2(0.0, 0.0));
        scene.add_node(NodeKind::Process, "b", pos2(10.0, 0.0));

        let mut stepper = LayoutStepper::new();
        assert!(stepper.tick(1.0, &mut scene));
        assert!(!stepper.tick(1.01, &mut scene));
        assert!(stepper.tick(1.0 + stepper.interval_secs(), &mut scene));

        stepper.reset();
        assert!(stepper.tick(1.05, &mut scene));
    }

    #[test]
    fn velocities_of_deleted_nodes_are_dropped() {
        let mut scene = Scene::new();
        let a = scene.add_node(NodeKind::Process, "a", pos2(0.0, 0.0));
        scene.add_node(NodeKind::Process, "b", pos2(10.0, 0.0));
        scene.add_node(NodeKind::Process, "c", pos2(20.0, 0.0));

        let mut velocities = HashMap::new();
        relax(&mut scene, &mut velocities);
        assert!(velocities.contains_key(&a));

        scene.select(crate::scene::ElementId::Node(a));
        scene.remove_selected();
        relax(&mut scene, &mut velocities);
        assert!(!velocities.contains_key(&a));
    }
}

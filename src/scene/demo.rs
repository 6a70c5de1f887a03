use eframe::egui::{pos2, vec2};

use crate::util::stable_pair;

use super::{EdgeStyle, NodeId, NodeKind, Scene};

const GRID_SPACING: f32 = 260.0;
const JITTER: f32 = 48.0;

impl Scene {
    /// Deterministic scene laid out on a jittered grid, with a mix of single,
    /// parallel and bidirectional connections.
    pub fn demo(node_count: usize) -> Self {
        let mut scene = Self::new();
        if node_count == 0 {
            return scene;
        }

        let columns = (node_count as f32).sqrt().ceil().max(1.0) as usize;
        let mut ids = Vec::with_capacity(node_count);
        for index in 0..node_count {
            let name = format!("node-{index}");
            let (jx, jy) = stable_pair(&name);
            let column = index % columns;
            let row = index / columns;
            let position = pos2(column as f32 * GRID_SPACING, row as f32 * GRID_SPACING)
                + vec2(jx * JITTER, jy * JITTER);

            let kind = match index % 7 {
                0 => NodeKind::Decision,
                6 => NodeKind::Terminal,
                _ => NodeKind::Process,
            };
            ids.push(scene.add_node(kind, format!("{} {index}", kind.label()), position));
        }

        let link = |scene: &mut Self, from: NodeId, to: NodeId, index: usize| {
            let style = if index % 4 == 3 {
                EdgeStyle::Dashed
            } else {
                EdgeStyle::Solid
            };
            scene.connect(from, to, style);
        };

        for index in 0..node_count {
            let column = index % columns;
            if column + 1 < columns && index + 1 < node_count {
                link(&mut scene, ids[index], ids[index + 1], index);
                if index % 5 == 0 {
                    link(&mut scene, ids[index + 1], ids[index], index);
                }
                if index % 9 == 0 {
                    link(&mut scene, ids[index], ids[index + 1], index + 1);
                }
            }
            if index + columns < node_count && index % 3 != 1 {
                link(&mut scene, ids[index], ids[index + columns], index);
            }
        }

        scene.add_label("Drag nodes, shift-drag to connect", pos2(0.0, -90.0));
        scene.add_label(
            format!("{node_count} nodes"),
            pos2(0.0, ((node_count / columns) as f32 + 1.0) * GRID_SPACING),
        );

        scene
    }
}

use std::collections::HashSet;

use eframe::egui::{self, Ui, Vec2, pos2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::scene::{ElementId, NodeId, NodeKind};
use crate::util::truncate_label;

use super::super::{GraphEditorApp, SearchCache};

const SEARCH_RESULT_ROWS: usize = 12;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl GraphEditorApp {
    /// Best matches first; ties keep scene order.
    pub(in crate::app) fn refresh_search(&mut self) {
        let query = self.search.trim();
        if self
            .search_cache
            .as_ref()
            .is_some_and(|cache| cache.query == query)
        {
            return;
        }

        let matcher = SkimMatcherV2::default();
        let mut scored: Vec<(i64, NodeId)> = if query.is_empty() {
            Vec::new()
        } else {
            self.scene
                .nodes()
                .iter()
                .filter_map(|node| {
                    fuzzy_match_score(&matcher, &node.label, query).map(|score| (score, node.id))
                })
                .collect()
        };
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let matches: Vec<NodeId> = scored.into_iter().map(|(_, id)| id).collect();
        let match_set: HashSet<NodeId> = matches.iter().copied().collect();
        self.search_cache = Some(SearchCache {
            query: query.to_owned(),
            matches,
            match_set,
        });
        self.engine.schedule_render();
    }

    pub(in crate::app) fn focus_node(&mut self, id: NodeId) {
        let Some(center) = self.scene.node(id).map(|node| node.center()) else {
            return;
        };
        self.scene.select(ElementId::Node(id));
        self.engine.center_on(center);
    }

    fn view_center_world(&self) -> egui::Pos2 {
        let surface = self.engine.surface();
        self.engine
            .screen_to_world(pos2(surface.x * 0.5, surface.y * 0.5))
    }

    pub(in crate::app) fn add_node_at_view_center(&mut self) -> NodeId {
        let kind = self.new_node_kind;
        let position = self.view_center_world() - kind.default_size() * 0.5;
        let label = format!("{} {}", kind.label(), self.scene.node_count() + 1);
        let id = self.scene.add_node(kind, label, position);
        tracing::debug!(node = id.0, kind = kind.label(), "added node");

        self.scene.select(ElementId::Node(id));
        self.scene_changed();
        id
    }

    pub(in crate::app) fn add_label_at_view_center(&mut self) -> bool {
        let text = self.new_label_text.trim();
        if text.is_empty() {
            return false;
        }

        let text = text.to_owned();
        let id = self.scene.add_label(text, self.view_center_world());
        tracing::debug!(label = id.0, "added label");
        self.new_label_text.clear();
        self.scene_changed();
        true
    }

    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Canvas Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search nodes")
            .on_hover_text("Fuzzy-highlight nodes by label.");
        ui.text_edit_singleline(&mut self.search)
            .on_hover_text("Type to highlight matching nodes, then click a result to focus it.");
        self.refresh_search();

        let mut focus = None;
        if let Some(cache) = &self.search_cache
            && !cache.query.is_empty()
        {
            ui.label(format!("{} matches", cache.matches.len()));
            for &id in cache.matches.iter().take(SEARCH_RESULT_ROWS) {
                let Some(node) = self.scene.node(id) else {
                    continue;
                };
                if ui
                    .selectable_label(
                        self.scene.is_selected(ElementId::Node(id)),
                        truncate_label(&node.label, 32),
                    )
                    .clicked()
                {
                    focus = Some(id);
                }
            }
        }
        if let Some(id) = focus {
            self.focus_node(id);
        }

        ui.separator();

        ui.horizontal_wrapped(|ui| {
            for kind in [NodeKind::Process, NodeKind::Decision, NodeKind::Terminal] {
                ui.selectable_value(&mut self.new_node_kind, kind, kind.label());
            }
        });
        if ui
            .button("Add node")
            .on_hover_text("Place a node of the chosen kind in the middle of the view.")
            .clicked()
        {
            self.add_node_at_view_center();
        }

        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.new_label_text);
            if ui.button("Add label").clicked() {
                self.add_label_at_view_center();
            }
        });

        let selected = self.scene.selection().len();
        if ui
            .add_enabled(selected > 0, egui::Button::new(format!("Delete selected ({selected})")))
            .clicked()
        {
            self.delete_selection();
        }

        ui.separator();

        let layout_toggle = ui
            .checkbox(&mut self.live_layout, "Live layout")
            .on_hover_text("Relax node positions with springs and repulsion.");
        if layout_toggle.changed() {
            tracing::debug!(enabled = self.live_layout, "live layout toggled");
            self.layout.reset();
        }

        if ui
            .checkbox(&mut self.show_quadtree_overlay, "Show quadtree overlay")
            .on_hover_text("Draw the spatial index partitions while it is active.")
            .changed()
        {
            self.engine.schedule_render();
        }

        ui.checkbox(&mut self.show_fps_bar, "FPS display")
            .on_hover_text("Show a live FPS readout in the header.");

        ui.separator();

        let lod = self.engine.lod();
        ui.label(format!("Zoom: {:.2}x", self.engine.zoom()));
        ui.label(format!("Detail: {} (level {})", lod.label(), lod.ordinal()));
        let index_status = if self.engine.index_active() {
            format!(
                "Spatial index: active, {} cells",
                self.engine.index_cells().len()
            )
        } else {
            format!(
                "Spatial index: off (over {} nodes)",
                self.engine.config().index_threshold
            )
        };
        ui.label(index_status);

        ui.horizontal(|ui| {
            if ui.button("Fit scene").clicked()
                && let Some(bounds) = self.scene.bounds()
            {
                self.engine.fit_view(bounds);
            }
            if ui.button("Zoom 100%").clicked() {
                let center = self.view_center_world();
                self.engine.reset_view(center);
            }
        });

        if self.engine.surface() == Vec2::ZERO {
            ui.weak("Canvas not laid out yet.");
        }
    }
}

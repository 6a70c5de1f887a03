use std::time::Duration;

use eframe::egui::{self, Align, Context, Layout};

use super::super::GraphEditorApp;

impl GraphEditorApp {
    pub(in crate::app) fn show(&mut self, ctx: &Context) {
        self.update_fps_counter(ctx);
        if self.live_layout {
            let now = ctx.input(|input| input.time);
            self.step_layout(now);
            ctx.request_repaint_after(Duration::from_secs_f64(self.layout.interval_secs()));
        }

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("nodeweave");
                    ui.separator();
                    ui.label(format!("nodes: {}", self.scene.node_count()));
                    ui.label(format!("edges: {}", self.scene.edge_count()));
                    ui.label(format!("labels: {}", self.scene.labels().len()));
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.visible_graph_text());
                        if let Some(fps_text) = self.fps_display_text() {
                            ui.label(fps_text);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| self.draw_graph(ui));
    }

    /// Runs the layout collaborator. Moved nodes invalidate the cached
    /// visible set, so the next frame is both scheduled and forced.
    pub(in crate::app) fn step_layout(&mut self, now: f64) -> bool {
        if !self.layout.tick(now, &mut self.scene) {
            return false;
        }

        self.engine.force_update();
        true
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use crate::config::EngineConfig;
    use crate::engine::TickOutcome;
    use crate::scene::Scene;

    use super::*;

    #[test]
    fn layout_step_schedules_a_forced_frame() {
        let mut app = GraphEditorApp::with_scene(Scene::demo(12), EngineConfig::default());
        app.engine.set_surface(vec2(800.0, 600.0));
        assert_eq!(app.engine.tick(0.0), TickOutcome::Draw);
        app.engine.plan_frame(&app.scene);
        app.engine.finish_frame(0.0);

        assert!(app.step_layout(1.0));
        assert_eq!(app.engine.tick(1.0), TickOutcome::Draw);
        let plan = app.engine.plan_frame(&app.scene);
        assert!(!plan.reused_visible_set);
    }
}

use eframe::egui::{Sense, Ui};

use crate::engine::TickOutcome;

use super::super::GraphEditorApp;
use super::super::render_utils::from_canvas;
use super::paint::PaintContext;

impl GraphEditorApp {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        self.engine.set_surface(rect.size());
        if !self.view_initialized && rect.width() > 0.0 && rect.height() > 0.0 {
            if let Some(bounds) = self.scene.bounds() {
                self.engine.fit_view(bounds);
            }
            self.view_initialized = true;
        }

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_graph_pointer(ui, rect, &response);

        // egui repaints the whole surface every pass, so the last plan is
        // painted even when the scheduler holds the next one back.
        let now = ui.input(|input| input.time);
        let outcome = self.engine.tick(now);
        match outcome {
            TickOutcome::Draw => {
                self.engine.plan_frame(&self.scene);
            }
            TickOutcome::Throttled { retry_in } => ui.ctx().request_repaint_after(retry_in),
            TickOutcome::Idle => {}
        }

        let hover = ui
            .input(|input| input.pointer.hover_pos())
            .filter(|pointer| rect.contains(*pointer))
            .and_then(|pointer| {
                self.hover_at(from_canvas(rect, &self.engine, pointer))
                    .map(|target| (target, pointer))
            });
        if hover.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = eframe::egui::CursorIcon::PointingHand;
            });
        }

        let cx = PaintContext {
            painter: &painter,
            rect,
            hover,
        };
        self.frame_geometry = self.paint_frame(&cx);

        if outcome == TickOutcome::Draw {
            self.engine.finish_frame(now);
        }
    }
}

use eframe::egui::{Pos2, Vec2, pos2};

pub const MIN_ZOOM: f32 = 0.1;
pub const MAX_ZOOM: f32 = 5.0;

/// Pan offset and zoom factor mapping world space onto the drawing surface.
/// Screen coordinates are relative to the surface's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pan: Vec2,
    zoom: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

fn sanitize_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        1.0
    }
}

fn sanitize_pan(pan: Vec2) -> Vec2 {
    if pan.x.is_finite() && pan.y.is_finite() {
        pan
    } else {
        Vec2::ZERO
    }
}

impl Viewport {
    pub fn new(pan: Vec2, zoom: f32) -> Self {
        Self {
            pan: sanitize_pan(pan),
            zoom: sanitize_zoom(zoom),
        }
    }

    pub fn pan(&self) -> Vec2 {
        sanitize_pan(self.pan)
    }

    pub fn zoom(&self) -> f32 {
        sanitize_zoom(self.zoom)
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = sanitize_zoom(zoom);
    }

    pub fn set_pan(&mut self, pan: Vec2) {
        self.pan = sanitize_pan(pan);
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.set_pan(self.pan() + delta);
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        let pan = self.pan();
        let zoom = self.zoom();
        pos2(world.x * zoom + pan.x, world.y * zoom + pan.y)
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        let pan = self.pan();
        let zoom = self.zoom();
        pos2((screen.x - pan.x) / zoom, (screen.y - pan.y) / zoom)
    }

    /// Multiplies the zoom by `factor` while keeping the world point under
    /// `anchor` fixed on screen.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }

        let world_before = self.screen_to_world(anchor);
        self.set_zoom(self.zoom() * factor);
        let zoom = self.zoom();
        self.set_pan(anchor.to_vec2() - world_before.to_vec2() * zoom);
    }

    /// Pans so that `world` lands in the middle of a surface of `surface` size.
    pub fn center_on(&mut self, world: Pos2, surface: Vec2) {
        let zoom = self.zoom();
        self.set_pan(surface * 0.5 - world.to_vec2() * zoom);
    }
}

//! Coordinate transformation for the canvas.
//!
//! Handles conversions between canvas coordinates and screen coordinates,
//! accounting for pan, zoom, and the layout origin of the drawable area:
//!
//! `screen = (canvas + offset) * scale + origin`

use egui::{Pos2, Rect, Vec2};

pub const MIN_ZOOM: f32 = 0.5;
pub const MAX_ZOOM: f32 = 2.0;

/// Zoom factor and pan offset of the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    scale: f32,
    offset: Vec2,
    /// Top-left corner of the drawable area in screen space.
    origin: Pos2,
    mounted: bool,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            origin: Pos2::ZERO,
            mounted: false,
        }
    }
}

impl Viewport {
    pub fn new(scale: f32, offset: Vec2) -> Self {
        let mut viewport = Self::default();
        viewport.set_scale(scale);
        if offset.x.is_finite() && offset.y.is_finite() {
            viewport.offset = offset;
        }
        viewport
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Attaches the viewport to its drawable area. The first call centers the
    /// canvas origin in `area`; later calls only follow the area's position.
    pub fn mount(&mut self, area: Rect) {
        self.origin = area.min;
        if !self.mounted {
            self.offset = area.size() * 0.5 / self.scale;
            self.mounted = true;
        }
    }

    /// Convert canvas coordinates to screen coordinates.
    pub fn to_screen(&self, canvas: Pos2) -> Pos2 {
        self.origin + (canvas.to_vec2() + self.offset) * self.scale
    }

    /// Convert screen coordinates to canvas coordinates.
    pub fn to_canvas(&self, screen: Pos2) -> Pos2 {
        ((screen - self.origin) / self.scale - self.offset).to_pos2()
    }

    /// Length conversion, screen pixels to canvas units.
    pub fn screen_to_canvas_len(&self, len: f32) -> f32 {
        len / self.scale
    }

    /// Multiplies the scale by `factor`, clamped to `[MIN_ZOOM, MAX_ZOOM]`,
    /// keeping the canvas point under `pivot` (screen space) fixed.
    ///
    /// Non-finite factors are ignored; non-positive factors clamp to `MIN_ZOOM`.
    pub fn zoom_by(&mut self, factor: f32, pivot: Pos2) {
        if factor.is_nan() || !pivot.x.is_finite() || !pivot.y.is_finite() {
            log::debug!("Ignoring zoom request: factor {factor}, pivot {pivot:?}");
            return;
        }
        let anchored = self.to_canvas(pivot);
        let target = if factor <= 0.0 {
            MIN_ZOOM
        } else {
            self.scale * factor
        };
        self.set_scale(target);
        // Solve (anchored + offset) * scale + origin == pivot for offset.
        self.offset = (pivot - self.origin) / self.scale - anchored.to_vec2();
    }

    /// Pans by a screen-space delta.
    pub fn pan_by(&mut self, delta_screen: Vec2) {
        if !delta_screen.x.is_finite() || !delta_screen.y.is_finite() {
            return;
        }
        self.offset += delta_screen / self.scale;
    }

    fn set_scale(&mut self, scale: f32) {
        if scale.is_nan() {
            return;
        }
        self.scale = scale.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Back to 1:1 with the canvas origin centered in the current area size.
    pub fn reset(&mut self, area: Rect) {
        self.scale = 1.0;
        self.mounted = false;
        self.mount(area);
    }
}

//! Drawing surfaces.
//!
//! The waveform drawer issues fill and stroke commands in logical pixels
//! through [`DrawingSurface`]. [`Canvas`] is the owned RGBA implementation:
//! its backing store is the logical size multiplied by the device pixel
//! ratio, and every command is scaled by that ratio before rasterizing. The
//! terminal backend converts the canvas to half-block cells at present time.

pub mod drawer;

pub use drawer::CanvasDrawer;

use std::ops::Range;

use tracing::warn;

use crate::color::RgbColor;
use crate::geometry::SurfaceGeometry;

/// 2D fill/stroke primitives addressed in logical pixels.
pub trait DrawingSurface {
    /// Current geometry, `None` until the surface has been sized.
    fn geometry(&self) -> Option<SurfaceGeometry>;

    /// Reallocate the backing store and re-establish the pixel-ratio scale.
    fn resize(&mut self, geometry: SurfaceGeometry);

    /// Erase a rectangle back to transparent.
    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    /// Fill a rectangle. A negative width or height extends left or up.
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: RgbColor);

    /// Stroke a straight line with butt caps.
    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: RgbColor);
}

/// Owned RGBA pixel buffer.
///
/// Internal format is 4 bytes per pixel in **RGBA** order, pre-multiplied.
pub struct Canvas {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    geometry: Option<SurfaceGeometry>,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl Canvas {
    /// An unsized canvas. Draw calls are ignored until [`DrawingSurface::resize`].
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            width: 0,
            height: 0,
            geometry: None,
        }
    }

    pub fn with_geometry(geometry: SurfaceGeometry) -> Self {
        let mut canvas = Self::new();
        canvas.resize(geometry);
        canvas
    }

    /// Clear the canvas to fully transparent black.
    #[inline]
    pub fn clear(&mut self) {
        let len = self.width * self.height * 4;
        self.data[..len].fill(0);
    }

    /// Write a pixel at (x, y) with the given color and opacity.
    /// Stored as RGBA internally.
    #[inline]
    pub fn put_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8, opacity: f32) {
        let idx = (y * self.width + x) * 4;
        if idx + 3 < self.data.len() {
            let a = (opacity * 255.0) as u8;
            self.data[idx] = (r as f32 * opacity) as u8;
            self.data[idx + 1] = (g as f32 * opacity) as u8;
            self.data[idx + 2] = (b as f32 * opacity) as u8;
            self.data[idx + 3] = a;
        }
    }

    /// Read the RGBA values at (x, y). Returns (r, g, b, a), pre-multiplied.
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> (u8, u8, u8, u8) {
        let idx = (y * self.width + x) * 4;
        if x < self.width && idx + 3 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2], self.data[idx + 3])
        } else {
            (0, 0, 0, 0)
        }
    }

    fn scale(&self) -> f64 {
        self.geometry.map_or(1.0, |g| g.device_pixel_ratio)
    }

    /// Physical pixel range covered by a logical span, clipped to `limit`.
    fn span(&self, start: f64, len: f64, limit: usize) -> Range<usize> {
        let (lo, hi) = if len < 0.0 { (start + len, start) } else { (start, start + len) };
        let scale = self.scale();
        let lo = (lo * scale).round().clamp(0.0, limit as f64) as usize;
        let hi = (hi * scale).round().clamp(0.0, limit as f64) as usize;
        lo..hi.max(lo)
    }
}

impl DrawingSurface for Canvas {
    fn geometry(&self) -> Option<SurfaceGeometry> {
        self.geometry
    }

    /// Resize the canvas, reallocating only when the buffer is too small.
    /// Like a browser canvas, resizing also clears it.
    /// A geometry past the backing-store limit leaves the canvas unsized.
    fn resize(&mut self, geometry: SurfaceGeometry) {
        let Some(needed) = geometry.backing_len() else {
            warn!(
                "Surface {}x{} at ratio {} exceeds the backing-store limit, leaving it unsized",
                geometry.width, geometry.height, geometry.device_pixel_ratio
            );
            self.width = 0;
            self.height = 0;
            self.geometry = None;
            return;
        };
        self.width = geometry.backing_width();
        self.height = geometry.backing_height();
        self.geometry = Some(geometry);
        if self.data.len() < needed {
            self.data.resize(needed, 0);
        }
        self.clear();
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        if self.geometry.is_none() {
            return;
        }
        let xs = self.span(x, width, self.width);
        for py in self.span(y, height, self.height) {
            let row = py * self.width * 4;
            self.data[row + xs.start * 4..row + xs.end * 4].fill(0);
        }
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64, color: RgbColor) {
        if self.geometry.is_none() {
            return;
        }
        let xs = self.span(x, width, self.width);
        for py in self.span(y, height, self.height) {
            for px in xs.clone() {
                self.put_pixel(px, py, color.r, color.g, color.b, 1.0);
            }
        }
    }

    fn stroke_line(&mut self, from: (f64, f64), to: (f64, f64), line_width: f64, color: RgbColor) {
        if self.geometry.is_none() || !(line_width > 0.0) {
            return;
        }
        let scale = self.scale();
        let (x0, y0) = (from.0 * scale, from.1 * scale);
        let (x1, y1) = (to.0 * scale, to.1 * scale);
        let half = line_width * scale / 2.0;

        let (dx, dy) = (x1 - x0, y1 - y0);
        let len_sq = dx * dx + dy * dy;
        if len_sq == 0.0 {
            return;
        }

        let min_x = (x0.min(x1) - half).floor().clamp(0.0, self.width as f64) as usize;
        let max_x = (x0.max(x1) + half).ceil().clamp(0.0, self.width as f64) as usize;
        let min_y = (y0.min(y1) - half).floor().clamp(0.0, self.height as f64) as usize;
        let max_y = (y0.max(y1) + half).ceil().clamp(0.0, self.height as f64) as usize;

        for py in min_y..max_y {
            for px in min_x..max_x {
                // Sample at the pixel center
                let (cx, cy) = (px as f64 + 0.5 - x0, py as f64 + 0.5 - y0);
                let t = (cx * dx + cy * dy) / len_sq;
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let dist = (cx * dy - cy * dx).abs() / len_sq.sqrt();
                if dist <= half {
                    self.put_pixel(px, py, color.r, color.g, color.b, 1.0);
                }
            }
        }
    }
}

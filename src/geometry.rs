//! Drawing-surface geometry and the pixel/time mapping shared by the
//! renderer and click-to-seek.
//!
//! All mapping works in logical pixels. Input events report logical
//! coordinates and the renderer draws through a transform pre-scaled by the
//! device pixel ratio, so using the logical width on both sides keeps the
//! playhead and the seek position in agreement.

/// Largest backing-store side, in physical pixels.
pub const MAX_BACKING_DIMENSION: usize = 8192;

/// Logical size of the drawing surface plus its device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceGeometry {
    pub width: f64,
    pub height: f64,
    pub device_pixel_ratio: f64,
}

impl SurfaceGeometry {
    /// A ratio that is not a positive finite number falls back to 1.0.
    pub fn new(width: f64, height: f64, device_pixel_ratio: f64) -> Self {
        let device_pixel_ratio = if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
            device_pixel_ratio
        } else {
            1.0
        };
        Self {
            width,
            height,
            device_pixel_ratio,
        }
    }

    /// Backing-store width in physical pixels.
    pub fn backing_width(&self) -> usize {
        physical(self.width, self.device_pixel_ratio)
    }

    /// Backing-store height in physical pixels.
    pub fn backing_height(&self) -> usize {
        physical(self.height, self.device_pixel_ratio)
    }

    /// Whether anything can be drawn at this size.
    pub fn is_drawable(&self) -> bool {
        self.backing_width() > 0 && self.backing_height() > 0
    }

    /// Bytes of an RGBA backing store at this size. `None` when either side
    /// exceeds [`MAX_BACKING_DIMENSION`].
    pub fn backing_len(&self) -> Option<usize> {
        let (w, h) = (self.backing_width(), self.backing_height());
        if w > MAX_BACKING_DIMENSION || h > MAX_BACKING_DIMENSION {
            return None;
        }
        w.checked_mul(h)?.checked_mul(4)
    }

    pub fn within_limits(&self) -> bool {
        self.backing_len().is_some()
    }
}

fn physical(logical: f64, ratio: f64) -> usize {
    let px = (logical * ratio).floor();
    if px.is_finite() && px > 0.0 {
        px as usize
    } else {
        0
    }
}

/// Pixel offset of `time` on a surface `width` logical pixels wide.
///
/// A zero or unknown duration maps everything to 0. The result is kept within
/// `[0, width]`.
pub fn time_to_x(time: f64, duration: f64, width: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !time.is_finite() || !(width > 0.0) {
        return 0.0;
    }
    ((time / duration) * width).clamp(0.0, width)
}

/// Playback time under logical pixel `x`.
///
/// Never negative, never past `duration`, so a click on the far edge seeks to
/// exactly the end.
pub fn x_to_time(x: f64, duration: f64, width: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !x.is_finite() || !(width > 0.0) {
        return 0.0;
    }
    (duration * (x / width)).clamp(0.0, duration)
}

/// How many leading blocks sit at or left of the playhead at `x`.
pub fn played_block_count(x: f64, block_width: u32) -> usize {
    if block_width == 0 || !x.is_finite() || x <= 0.0 {
        return 0;
    }
    (x / block_width as f64).ceil() as usize
}

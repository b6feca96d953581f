//! Brush mask - soft circular coverage with an optional tip texture
//!
//! The round shape is fully opaque inside `radius - edge / 2`, empty beyond
//! `radius + edge / 2`, and follows a normalized erf falloff in between.
//! `edge` widens as hardness drops and never goes below one pixel, which keeps
//! hard brushes antialiased.

use std::f32::consts::TAU;
use std::sync::Arc;

use image::GrayImage;

use super::Point;
use crate::surface::RegionRect;

/// Coverage below this is treated as a miss
const MIN_COVERAGE: f32 = 1.0 / 1024.0;

/// Scaled so the falloff spans erf(-2)..erf(2)
const FALLOFF_SPAN: f32 = 4.0;

/// Scalar erf function (Abramowitz and Stegun formula 7.1.26)
/// Accuracy: |error| < 1.5e-7
#[inline]
pub fn erf_scalar(x: f32) -> f32 {
    let sign = if x >= 0.0 { 1.0 } else { -1.0 };
    let x = x.abs();

    const A1: f32 = 0.254_829_6;
    const A2: f32 = -0.284_496_72;
    const A3: f32 = 1.421_413_8;
    const A4: f32 = -1.453_152_1;
    const A5: f32 = 1.061_405_4;
    const P: f32 = 0.327_591_1;

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();

    sign * y
}

/// Deterministic rotation for a stamp, in radians within [0, 2π)
pub fn stamp_angle(seed: u64, index: u64) -> f32 {
    // splitmix64 finalizer
    let mut z = seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(index.wrapping_add(1).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 40) as f32 / (1u64 << 24) as f32 * TAU
}

/// Per-pixel coverage of one stamp, clipped to a rectangle
#[derive(Debug, Clone)]
pub struct Footprint {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Row-major, `width * height` values
    pub coverage: Vec<f32>,
}

impl Footprint {
    pub fn rows(&self) -> impl Iterator<Item = (u32, &[f32])> {
        let top = self.top;
        self.coverage
            .chunks(self.width.max(1) as usize)
            .enumerate()
            .map(move |(row, values)| (top + row as u32, values))
    }
}

#[derive(Debug, Clone)]
pub struct BrushMask {
    radius: f32,
    edge: f32,
    tip: Option<Arc<GrayImage>>,
}

impl BrushMask {
    /// `size` is the brush diameter in pixels, `hardness` in 0.0-1.0
    pub fn new(size: f32, hardness: f32) -> Self {
        let radius = (size * 0.5).max(0.5);
        let edge = ((1.0 - hardness.clamp(0.0, 1.0)) * radius).max(1.0);
        Self {
            radius,
            edge,
            tip: None,
        }
    }

    /// Modulate the round shape with a grayscale tip texture
    pub fn with_tip(mut self, tip: Arc<GrayImage>) -> Self {
        self.tip = Some(tip);
        self
    }

    /// Distance from the center beyond which coverage is zero
    pub fn outer_radius(&self) -> f32 {
        self.radius + self.edge * 0.5
    }

    /// Coverage of the round shape at distance `dist` from the center
    pub fn shape_coverage(&self, dist: f32) -> f32 {
        let inner = self.radius - self.edge * 0.5;
        if dist <= inner {
            return 1.0;
        }
        if dist >= self.outer_radius() {
            return 0.0;
        }
        let x = (dist - self.radius) * FALLOFF_SPAN / self.edge;
        let normalized = erf_scalar(x) / erf_scalar(FALLOFF_SPAN * 0.5);
        (0.5 * (1.0 - normalized)).clamp(0.0, 1.0)
    }

    fn tip_sample(tip: &GrayImage, dx: f32, dy: f32, angle: f32, outer: f32) -> f32 {
        let (w, h) = tip.dimensions();
        if w == 0 || h == 0 {
            return 0.0;
        }
        let (sin, cos) = angle.sin_cos();
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        let u = ((rx / outer) * 0.5 + 0.5) * w as f32;
        let v = ((ry / outer) * 0.5 + 0.5) * h as f32;
        let ix = (u.floor().max(0.0) as u32).min(w - 1);
        let iy = (v.floor().max(0.0) as u32).min(h - 1);
        tip.get_pixel(ix, iy).0[0] as f32 / 255.0
    }

    /// Coverage at an offset from the stamp center
    pub fn coverage(&self, dx: f32, dy: f32, angle: f32) -> f32 {
        let shape = self.shape_coverage((dx * dx + dy * dy).sqrt());
        if shape <= 0.0 {
            return 0.0;
        }
        let value = match &self.tip {
            Some(tip) => shape * Self::tip_sample(tip, dx, dy, angle, self.outer_radius()),
            None => shape,
        };
        if value < MIN_COVERAGE {
            0.0
        } else {
            value
        }
    }

    /// Coverage of a stamp at `center`, restricted to `clip`.
    ///
    /// Returns `None` when the stamp misses the clip rectangle entirely.
    pub fn footprint(&self, center: Point, angle: f32, clip: &RegionRect) -> Option<Footprint> {
        let outer = self.outer_radius();
        let left = ((center.x - outer).floor().max(clip.x as f32)) as u32;
        let top = ((center.y - outer).floor().max(clip.y as f32)) as u32;
        let right = ((center.x + outer).ceil().max(0.0) as u32).min(clip.right());
        let bottom = ((center.y + outer).ceil().max(0.0) as u32).min(clip.bottom());

        if right <= left || bottom <= top {
            return None;
        }

        let (width, height) = (right - left, bottom - top);
        let mut coverage = Vec::with_capacity((width * height) as usize);
        for y in top..bottom {
            let dy = y as f32 + 0.5 - center.y;
            for x in left..right {
                let dx = x as f32 + 0.5 - center.x;
                coverage.push(self.coverage(dx, dy, angle));
            }
        }

        Some(Footprint {
            left,
            top,
            width,
            height,
            coverage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn full_clip() -> RegionRect {
        RegionRect::new(0, 0, 200, 200)
    }

    #[test]
    fn test_erf_scalar() {
        assert!((erf_scalar(0.0)).abs() < 0.001);
        assert!((erf_scalar(1.0) - 0.8427).abs() < 0.01);
        assert!((erf_scalar(-1.0) + 0.8427).abs() < 0.01);
        assert!((erf_scalar(3.0) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_hard_mask_edges() {
        let mask = BrushMask::new(40.0, 1.0);
        assert_eq!(mask.shape_coverage(0.0), 1.0);
        assert_eq!(mask.shape_coverage(19.5), 1.0);
        assert_eq!(mask.shape_coverage(20.5), 0.0);
        let mid = mask.shape_coverage(20.0);
        assert!((mid - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_soft_mask_falls_off_gradually() {
        let mask = BrushMask::new(40.0, 0.0);
        let near = mask.shape_coverage(12.0);
        let far = mask.shape_coverage(24.0);
        assert!(near > far);
        assert!(near < 1.0 && far > 0.0);
        assert_eq!(mask.shape_coverage(31.0), 0.0);
    }

    #[test]
    fn test_footprint_is_clipped() {
        let mask = BrushMask::new(20.0, 1.0);
        let clip = RegionRect::new(100, 0, 100, 200);
        let fp = mask.footprint(Point::new(100.0, 50.0), 0.0, &clip).unwrap();
        assert_eq!(fp.left, 100);
        assert_eq!(fp.coverage.len(), (fp.width * fp.height) as usize);

        assert!(mask.footprint(Point::new(20.0, 50.0), 0.0, &clip).is_none());
    }

    #[test]
    fn test_footprint_center_is_opaque() {
        let mask = BrushMask::new(20.0, 1.0);
        let fp = mask.footprint(Point::new(50.0, 50.0), 0.0, &full_clip()).unwrap();
        let (row_y, row) = fp.rows().find(|(y, _)| *y == 50).unwrap();
        assert_eq!(row_y, 50);
        assert_eq!(row[(50 - fp.left) as usize], 1.0);
    }

    #[test]
    fn test_white_tip_is_neutral() {
        let tip = Arc::new(GrayImage::from_pixel(1, 1, Luma([255])));
        let plain = BrushMask::new(30.0, 0.5);
        let tipped = plain.clone().with_tip(tip);
        for d in [0.0, 5.0, 12.0, 16.0] {
            assert_eq!(plain.coverage(d, 0.0, 1.3), tipped.coverage(d, 0.0, 1.3));
        }
    }

    #[test]
    fn test_tip_texture_follows_rotation() {
        // Left half dark, right half bright
        let tip = Arc::new(GrayImage::from_fn(8, 8, |x, _| {
            if x < 4 {
                Luma([0])
            } else {
                Luma([255])
            }
        }));
        let mask = BrushMask::new(40.0, 1.0).with_tip(tip);
        assert_eq!(mask.coverage(8.0, 0.0, 0.0), 1.0);
        assert_eq!(mask.coverage(-8.0, 0.0, 0.0), 0.0);
        // Half a turn swaps the sides
        assert_eq!(mask.coverage(8.0, 0.0, std::f32::consts::PI), 0.0);
    }

    #[test]
    fn test_stamp_angle_is_deterministic_and_bounded() {
        for index in 0..64 {
            let a = stamp_angle(7, index);
            assert_eq!(a, stamp_angle(7, index));
            assert!((0.0..TAU).contains(&a));
        }
        assert_ne!(stamp_angle(1, 0), stamp_angle(2, 0));
    }
}

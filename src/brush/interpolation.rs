//! Interpolation algorithms for smooth brush strokes
//!
//! Raw pointer samples are smoothed with a Catmull-Rom spline (the first and
//! last samples act as their own phantom neighbours, so the curve starts and
//! ends exactly on the path) and the resulting centerline is walked at a
//! constant arc-length spacing to produce stamp centers.

use super::Point;

/// A stroke needs this many raw points before any curve is produced
pub const MIN_CURVE_POINTS: usize = 4;

/// Samples taken per input segment when flattening the spline
pub const DEFAULT_STEPS_PER_SEGMENT: usize = 16;

/// Lower bound on stamp spacing in pixels
pub const MIN_STAMP_SPACING: f32 = 0.5;

/// Pieces of the centerline shorter than this are skipped
const DEGENERATE_LENGTH: f32 = 1e-6;

/// Calculate a single point on a Catmull-Rom spline
pub fn catmull_rom_point(p0: &Point, p1: &Point, p2: &Point, p3: &Point, t: f32) -> Point {
    let t2 = t * t;
    let t3 = t2 * t;

    // Catmull-Rom basis functions
    let b0 = -0.5 * t3 + t2 - 0.5 * t;
    let b1 = 1.5 * t3 - 2.5 * t2 + 1.0;
    let b2 = -1.5 * t3 + 2.0 * t2 + 0.5 * t;
    let b3 = 0.5 * t3 - 0.5 * t2;

    Point {
        x: b0 * p0.x + b1 * p1.x + b2 * p2.x + b3 * p3.x,
        y: b0 * p0.y + b1 * p1.y + b2 * p2.y + b3 * p3.y,
    }
}

/// Sample every input segment of a Catmull-Rom spline.
///
/// Segment `k` joins `points[k]` and `points[k + 1]`; its samples start at
/// `points[k]` and stop short of `points[k + 1]`. Works for any slice with at
/// least two points, callers enforce [`MIN_CURVE_POINTS`] where it matters.
pub fn catmull_rom_segments(points: &[Point], steps: usize) -> Vec<Vec<Point>> {
    if points.len() < 2 {
        return Vec::new();
    }

    let steps = steps.max(1);
    let last = points.len() - 1;

    (0..last)
        .map(|i| {
            let p0 = if i == 0 { &points[0] } else { &points[i - 1] };
            let p1 = &points[i];
            let p2 = &points[i + 1];
            let p3 = if i + 2 <= last { &points[i + 2] } else { &points[last] };

            (0..steps)
                .map(|step| catmull_rom_point(p0, p1, p2, p3, step as f32 / steps as f32))
                .collect()
        })
        .collect()
}

/// Join sampled segments into one polyline ending at `end`
pub fn flatten_segments(segments: &[Vec<Point>], end: Point) -> Vec<Point> {
    let mut polyline: Vec<Point> = segments.iter().flatten().copied().collect();
    polyline.push(end);
    polyline
}

/// Smoothed centerline for a whole path. Empty below [`MIN_CURVE_POINTS`].
pub fn build_centerline(points: &[Point], steps: usize) -> Vec<Point> {
    if points.len() < MIN_CURVE_POINTS {
        return Vec::new();
    }
    let segments = catmull_rom_segments(points, steps);
    flatten_segments(&segments, points[points.len() - 1])
}

/// One stamp center produced by [`StampWalker`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stamp {
    pub position: Point,
    /// Position of this stamp within its stroke, used as a rotation seed
    pub index: u64,
}

/// Walks polylines at constant arc-length spacing.
///
/// The distance left until the next stamp survives between calls, so a
/// centerline walked in consecutive pieces yields the same stamps as one walk
/// over the whole line.
#[derive(Debug, Clone)]
pub struct StampWalker {
    spacing: f32,
    until_next: f32,
    emitted: u64,
}

impl StampWalker {
    /// The first stamp lands at distance 0
    pub fn new(spacing: f32) -> Self {
        let spacing = if spacing.is_finite() {
            spacing.max(MIN_STAMP_SPACING)
        } else {
            MIN_STAMP_SPACING
        };
        Self {
            spacing,
            until_next: 0.0,
            emitted: 0,
        }
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn walk(&mut self, polyline: &[Point], out: &mut Vec<Stamp>) {
        for pair in polyline.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let len = a.distance_to(b);
            if len <= DEGENERATE_LENGTH {
                continue;
            }

            while self.until_next <= len {
                out.push(Stamp {
                    position: a.lerp(b, self.until_next / len),
                    index: self.emitted,
                });
                self.emitted += 1;
                self.until_next += self.spacing;
            }
            self.until_next -= len;
        }
    }
}

/// Stamp centers along a finished centerline
pub fn stamp_positions(centerline: &[Point], spacing: f32) -> Vec<Point> {
    let mut stamps = Vec::new();
    StampWalker::new(spacing).walk(centerline, &mut stamps);
    stamps.into_iter().map(|s| s.position).collect()
}

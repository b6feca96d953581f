//! Stroke ledger - sealed strokes kept in drawing order for replay

use super::interpolation::MIN_CURVE_POINTS;
use super::{BrushSettings, Color, Point};
use crate::surface::Region;

/// One stroke: its samples, the selected color at each sample, and enough
/// context to render it again exactly the same way
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    pub points: Vec<Point>,
    /// Selected color when the matching point was recorded
    pub colors: Vec<Color>,
    pub region: Region,
    /// Curve segments already rendered (segment `k` joins points `k` and `k + 1`)
    pub drawn_count: usize,
    /// Brush settings captured when the stroke began
    pub settings: BrushSettings,
    /// Rotation seed for this stroke's stamps
    pub seed: u64,
}

impl Stroke {
    pub fn new(start: Point, color: Color, region: Region, settings: BrushSettings, seed: u64) -> Self {
        Self {
            points: vec![start],
            colors: vec![color],
            region,
            drawn_count: 0,
            settings,
            seed,
        }
    }

    pub fn push(&mut self, point: Point, color: Color) {
        self.points.push(point);
        self.colors.push(color);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Strokes below the curve minimum never produce stamps
    pub fn is_renderable(&self) -> bool {
        self.points.len() >= MIN_CURVE_POINTS
    }
}

#[derive(Debug, Default, Clone)]
pub struct StrokeLedger {
    strokes: Vec<Stroke>,
}

impl StrokeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stroke: Stroke) {
        self.strokes.push(stroke);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Stroke> {
        self.strokes.iter()
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// Drop every stroke drawn in `region`, returning how many went
    pub fn remove_region(&mut self, region: Region) -> usize {
        let before = self.strokes.len();
        self.strokes.retain(|s| s.region != region);
        before - self.strokes.len()
    }
}

impl<'a> IntoIterator for &'a StrokeLedger {
    type Item = &'a Stroke;
    type IntoIter = std::slice::Iter<'a, Stroke>;

    fn into_iter(self) -> Self::IntoIter {
        self.strokes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(region: Region, points: usize) -> Stroke {
        let mut s = Stroke::new(
            Point::new(0.0, 0.0),
            Color::BLACK,
            region,
            BrushSettings::default(),
            0,
        );
        for i in 1..points {
            s.push(Point::new(i as f32, 0.0), Color::WHITE);
        }
        s
    }

    #[test]
    fn test_stroke_records_color_per_point() {
        let s = stroke(Region::Canvas, 3);
        assert_eq!(s.len(), 3);
        assert_eq!(s.colors, vec![Color::BLACK, Color::WHITE, Color::WHITE]);
        assert!(!s.is_renderable());
        assert!(stroke(Region::Canvas, 4).is_renderable());
    }

    #[test]
    fn test_ledger_keeps_order_and_removes_region() {
        let mut ledger = StrokeLedger::new();
        ledger.push(stroke(Region::Canvas, 2));
        ledger.push(stroke(Region::Palette, 3));
        ledger.push(stroke(Region::Canvas, 4));

        let lens: Vec<usize> = ledger.iter().map(Stroke::len).collect();
        assert_eq!(lens, vec![2, 3, 4]);

        assert_eq!(ledger.remove_region(Region::Palette), 1);
        assert_eq!(ledger.len(), 2);
        assert!(ledger.iter().all(|s| s.region == Region::Canvas));

        ledger.clear();
        assert!(ledger.is_empty());
    }
}

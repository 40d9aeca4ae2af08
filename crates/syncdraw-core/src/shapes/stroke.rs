//! Freehand strokes.

use super::EntityId;
use kurbo::{Line, Point, Rect};
use serde::{Deserialize, Serialize};

/// A freehand stroke (ordered series of points).
///
/// A stroke with fewer than two points is degenerate: it has no segments,
/// renders as nothing and never intersects anything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub id: EntityId,
    /// Points in drawing order. Serialized flattened as `[x0, y0, x1, y1, ...]`.
    #[serde(with = "flat_points")]
    pub points: Vec<Point>,
    pub color: String,
    pub stroke_width: f64,
}

impl Stroke {
    /// Create an empty stroke.
    pub fn new(id: impl Into<EntityId>, color: impl Into<String>, stroke_width: f64) -> Self {
        Self {
            id: id.into(),
            points: Vec::new(),
            color: color.into(),
            stroke_width,
        }
    }

    /// Create a stroke whose first point is `start`.
    pub fn starting_at(
        id: impl Into<EntityId>,
        start: Point,
        color: impl Into<String>,
        stroke_width: f64,
    ) -> Self {
        let mut stroke = Self::new(id, color, stroke_width);
        stroke.points.push(start);
        stroke
    }

    /// Create from existing points.
    pub fn from_points(
        id: impl Into<EntityId>,
        points: Vec<Point>,
        color: impl Into<String>,
        stroke_width: f64,
    ) -> Self {
        Self {
            id: id.into(),
            points,
            color: color.into(),
            stroke_width,
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True when the stroke has no segments.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

    /// Consecutive point pairs as line segments.
    pub fn segments(&self) -> impl Iterator<Item = Line> + '_ {
        self.points.windows(2).map(|pair| Line::new(pair[0], pair[1]))
    }

    /// The most recently added segment, if any.
    pub fn last_segment(&self) -> Option<Line> {
        match self.points.as_slice() {
            [.., a, b] => Some(Line::new(*a, *b)),
            _ => None,
        }
    }

    /// Axis-aligned bounding box of all points.
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |rect, point| {
                rect.union_pt(*point)
            })
    }

    /// Points flattened to `[x0, y0, x1, y1, ...]`.
    pub fn flat_points(&self) -> Vec<f64> {
        flatten(&self.points)
    }
}

/// Flatten points into alternating x/y numbers.
pub fn flatten(points: &[Point]) -> Vec<f64> {
    points.iter().flat_map(|p| [p.x, p.y]).collect()
}

/// Rebuild points from alternating x/y numbers. A trailing unpaired number is ignored.
pub fn unflatten(numbers: &[f64]) -> Vec<Point> {
    numbers
        .chunks_exact(2)
        .map(|pair| Point::new(pair[0], pair[1]))
        .collect()
}

mod flat_points {
    use kurbo::Point;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(points: &Vec<Point>, serializer: S) -> Result<S::Ok, S::Error> {
        super::flatten(points).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Point>, D::Error> {
        let numbers = Vec::<f64>::deserialize(deserializer)?;
        Ok(super::unflatten(&numbers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_strokes() {
        let mut stroke = Stroke::new("a-1", "#000000", 5.0);
        assert!(stroke.is_degenerate());
        assert_eq!(stroke.segments().count(), 0);
        assert!(stroke.last_segment().is_none());

        stroke.add_point(Point::new(1.0, 1.0));
        assert!(stroke.is_degenerate());

        stroke.add_point(Point::new(2.0, 3.0));
        assert!(!stroke.is_degenerate());
        assert_eq!(stroke.segments().count(), 1);
    }

    #[test]
    fn test_last_segment() {
        let stroke = Stroke::from_points(
            "a-1",
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(1.0, 5.0)],
            "#000000",
            5.0,
        );
        let segment = stroke.last_segment().unwrap();
        assert_eq!(segment.p0, Point::new(1.0, 0.0));
        assert_eq!(segment.p1, Point::new(1.0, 5.0));
    }

    #[test]
    fn test_bounds() {
        let stroke = Stroke::from_points(
            "a-1",
            vec![Point::new(10.0, 40.0), Point::new(-5.0, 20.0), Point::new(30.0, 25.0)],
            "#000000",
            5.0,
        );
        assert_eq!(stroke.bounds(), Rect::new(-5.0, 20.0, 30.0, 40.0));
        assert_eq!(Stroke::new("a-2", "#000000", 1.0).bounds(), Rect::ZERO);
    }

    #[test]
    fn test_flatten_drops_unpaired_tail() {
        let points = unflatten(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(points, vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)]);
        assert_eq!(flatten(&points), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_json_uses_flat_points() {
        let stroke = Stroke::from_points(
            "a-1",
            vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)],
            "#ff0000",
            2.5,
        );
        let json = serde_json::to_value(&stroke).unwrap();
        assert_eq!(json["points"], serde_json::json!([1.0, 2.0, 3.0, 4.0]));
        assert_eq!(json["strokeWidth"], serde_json::json!(2.5));

        let back: Stroke = serde_json::from_value(json).unwrap();
        assert_eq!(back, stroke);
    }
}

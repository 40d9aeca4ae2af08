//! Hit-testing used by the eraser.
//!
//! Stroke against stroke is an exact segment-pair test. Stroke against shape
//! is an endpoint-in-box test: a segment hits a shape only if one of its
//! endpoints lies inside the shape's normalized bounding box. Segments that
//! pass through a box without an endpoint inside do not count.

use crate::shapes::{Entity, ShapeEntity, Stroke};
use kurbo::{Line, Point, Rect};

/// Parametric segment test. Both parameters must fall within `[0, 1]`.
///
/// Parallel and collinear segments (zero denominator) never intersect.
pub fn segments_intersect(a: Line, b: Line) -> bool {
    let (x1, y1, x2, y2) = (a.p0.x, a.p0.y, a.p1.x, a.p1.y);
    let (x3, y3, x4, y4) = (b.p0.x, b.p0.y, b.p1.x, b.p1.y);

    let denominator = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if denominator == 0.0 {
        return false;
    }

    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / denominator;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / denominator;

    (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub)
}

/// Inclusive point-in-rectangle test. `rect` must be normalized.
pub fn rect_contains(rect: Rect, point: Point) -> bool {
    point.x >= rect.x0 && point.x <= rect.x1 && point.y >= rect.y0 && point.y <= rect.y1
}

/// True if either endpoint of `segment` lies inside `rect`.
pub fn segment_touches_rect(segment: Line, rect: Rect) -> bool {
    rect_contains(rect, segment.p0) || rect_contains(rect, segment.p1)
}

/// True if `segment` crosses any segment of `stroke`.
pub fn segment_hits_stroke(segment: Line, stroke: &Stroke) -> bool {
    stroke.segments().any(|s| segments_intersect(segment, s))
}

/// True if `segment` touches the shape's normalized box.
pub fn segment_hits_shape(segment: Line, shape: &ShapeEntity) -> bool {
    segment_touches_rect(segment, shape.bounds())
}

/// Dispatch over both entity kinds.
pub fn segment_hits_entity(segment: Line, entity: &Entity) -> bool {
    match entity {
        Entity::Stroke(stroke) => segment_hits_stroke(segment, stroke),
        Entity::Shape(shape) => segment_hits_shape(segment, shape),
    }
}

/// Full segment-pair test between two strokes. Degenerate strokes never hit.
pub fn strokes_intersect(a: &Stroke, b: &Stroke) -> bool {
    a.segments().any(|s| segment_hits_stroke(s, b))
}

/// True if any segment of `stroke` touches the shape's box.
pub fn stroke_hits_shape(stroke: &Stroke, shape: &ShapeEntity) -> bool {
    let bounds = shape.bounds();
    stroke.segments().any(|s| segment_touches_rect(s, bounds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::ShapeKind;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new((x0, y0), (x1, y1))
    }

    fn square() -> ShapeEntity {
        ShapeEntity::new("r-1", ShapeKind::Rectangle, Point::new(100.0, 100.0), "#000000", 5.0)
            .with_size(50.0, 50.0)
    }

    #[test]
    fn test_crossing_segments() {
        assert!(segments_intersect(line(0.0, 0.0, 10.0, 10.0), line(0.0, 10.0, 10.0, 0.0)));
        assert!(!segments_intersect(line(0.0, 0.0, 1.0, 1.0), line(5.0, 0.0, 6.0, -3.0)));
    }

    #[test]
    fn test_shared_endpoint_counts() {
        assert!(segments_intersect(line(0.0, 0.0, 5.0, 5.0), line(5.0, 5.0, 10.0, 0.0)));
    }

    #[test]
    fn test_parallel_and_collinear_never_intersect() {
        assert!(!segments_intersect(line(0.0, 0.0, 10.0, 0.0), line(0.0, 1.0, 10.0, 1.0)));
        // Overlapping but collinear.
        assert!(!segments_intersect(line(0.0, 0.0, 10.0, 0.0), line(5.0, 0.0, 15.0, 0.0)));
    }

    #[test]
    fn test_segment_through_box_interior_misses() {
        let shape = square();
        assert!(!segment_hits_shape(line(90.0, 125.0, 160.0, 125.0), &shape));
    }

    #[test]
    fn test_endpoint_inside_box_hits() {
        let shape = square();
        assert!(segment_hits_shape(line(90.0, 125.0, 120.0, 125.0), &shape));
        // Edges are inclusive.
        assert!(segment_hits_shape(line(150.0, 150.0, 200.0, 200.0), &shape));
    }

    #[test]
    fn test_inverted_shape_is_normalized() {
        let shape = ShapeEntity::new("r-1", ShapeKind::Circle, Point::new(150.0, 150.0), "#000000", 5.0)
            .with_size(-50.0, -50.0);
        assert!(segment_hits_shape(line(90.0, 90.0, 120.0, 120.0), &shape));
    }

    #[test]
    fn test_degenerate_stroke_never_hits() {
        let dot = Stroke::from_points("s-1", vec![Point::new(5.0, 5.0)], "#000000", 5.0);
        let cross = Stroke::from_points(
            "s-2",
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            "#000000",
            5.0,
        );
        assert!(!strokes_intersect(&dot, &cross));
        assert!(!strokes_intersect(&cross, &dot));
    }

    #[test]
    fn test_stroke_vs_stroke() {
        let a = Stroke::from_points(
            "s-1",
            vec![Point::new(0.0, 5.0), Point::new(4.0, 5.0), Point::new(10.0, 5.0)],
            "#000000",
            5.0,
        );
        let b = Stroke::from_points(
            "s-2",
            vec![Point::new(8.0, 0.0), Point::new(8.0, 10.0)],
            "#000000",
            5.0,
        );
        assert!(strokes_intersect(&a, &b));
        assert!(segment_hits_entity(line(8.0, 0.0, 8.0, 10.0), &Entity::Stroke(a)));
    }

    #[test]
    fn test_stroke_hits_shape() {
        let stroke = Stroke::from_points(
            "s-1",
            vec![Point::new(0.0, 0.0), Point::new(50.0, 50.0), Point::new(110.0, 110.0)],
            "#000000",
            5.0,
        );
        assert!(stroke_hits_shape(&stroke, &square()));
    }
}

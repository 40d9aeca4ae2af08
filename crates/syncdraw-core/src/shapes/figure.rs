//! Geometric shapes: rectangles, circles and triangles.

use super::EntityId;
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// The kind of a geometric shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
    Rectangle,
    Circle,
    Triangle,
}

impl ShapeKind {
    /// Stable name used in the replicated document.
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
            ShapeKind::Triangle => "triangle",
        }
    }

    /// Parse a stable name back into a kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "rectangle" => Some(ShapeKind::Rectangle),
            "circle" => Some(ShapeKind::Circle),
            "triangle" => Some(ShapeKind::Triangle),
            _ => None,
        }
    }
}

/// A shape described by its drag box.
///
/// `width` and `height` are signed: while the user is still dragging, the box
/// may extend left of or above its origin. Every geometric query goes through
/// [`ShapeEntity::bounds`], which normalizes the box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeEntity {
    pub id: EntityId,
    #[serde(rename = "type")]
    pub kind: ShapeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub color: String,
    pub stroke_width: f64,
}

impl ShapeEntity {
    /// Create a zero-sized shape anchored at `origin`.
    pub fn new(
        id: impl Into<EntityId>,
        kind: ShapeKind,
        origin: Point,
        color: impl Into<String>,
        stroke_width: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            x: origin.x,
            y: origin.y,
            width: 0.0,
            height: 0.0,
            color: color.into(),
            stroke_width,
        }
    }

    /// Set the size.
    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// The anchor corner where the drag started.
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// The corner opposite the origin.
    pub fn far_corner(&self) -> Point {
        Point::new(self.x + self.width, self.y + self.height)
    }

    /// Stretch the box so that its far corner sits at `corner`.
    pub fn resize_to(&mut self, corner: Point) {
        self.width = corner.x - self.x;
        self.height = corner.y - self.y;
    }

    /// Normalized axis-aligned bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::from_points(self.origin(), self.far_corner())
    }

    /// Radius used to draw circles and triangles.
    pub fn radius(&self) -> f64 {
        self.width.abs().max(self.height.abs()) / 2.0
    }

    /// Center of the drag box.
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// The same shape with a non-negative width and height.
    pub fn normalized(&self) -> Self {
        let bounds = self.bounds();
        Self {
            x: bounds.x0,
            y: bounds.y0,
            width: bounds.width(),
            height: bounds.height(),
            ..self.clone()
        }
    }
}

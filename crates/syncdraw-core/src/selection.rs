//! Local selection set and transform re-encoding.
//!
//! The selection is never replicated. A transform commit rewrites the selected
//! entity's geometry and goes through the document's replace path, so the
//! entity keeps its id.

use crate::crdt::DrawingDocument;
use crate::shapes::{Entity, EntityId};
use kurbo::{Affine, Point, Vec2};

/// Smallest width or height a resize may produce.
pub const MIN_TRANSFORM_SIZE: f64 = 5.0;

/// Ids of the selected entities, in selection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the id if absent, remove it if present. Returns true if it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if let Some(pos) = self.ids.iter().position(|s| s == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Drop ids whose entities are no longer live, e.g. after a remote delete.
    pub fn retain_live(&mut self, document: &DrawingDocument) {
        self.ids.retain(|id| document.find(id).is_some());
    }
}

/// A move and/or resize applied to one entity.
///
/// Scaling is relative to the entity's anchor: the origin corner for shapes,
/// the top-left of the bounding box for strokes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityTransform {
    pub translation: Vec2,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for EntityTransform {
    fn default() -> Self {
        Self {
            translation: Vec2::ZERO,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl EntityTransform {
    /// A pure move.
    pub fn translate(translation: Vec2) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// A pure resize.
    pub fn scale(scale_x: f64, scale_y: f64) -> Self {
        Self {
            translation: Vec2::ZERO,
            scale_x,
            scale_y,
        }
    }

    pub fn with_translation(mut self, translation: Vec2) -> Self {
        self.translation = translation;
        self
    }

    pub fn is_identity(&self) -> bool {
        self.translation == Vec2::ZERO && self.scale_x == 1.0 && self.scale_y == 1.0
    }

    /// The affine map for this transform about `anchor`.
    pub fn affine_about(&self, anchor: Point) -> Affine {
        Affine::translate(anchor.to_vec2() + self.translation)
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(-anchor.to_vec2())
    }
}

/// Apply a transform to a copy of `entity`. The id is unchanged.
///
/// A resize that would make a shape narrower or shorter than
/// [`MIN_TRANSFORM_SIZE`] keeps the previous size and only moves the shape.
pub fn transform_entity(entity: &Entity, transform: &EntityTransform) -> Entity {
    match entity {
        Entity::Shape(shape) => {
            let mut shape = shape.clone();
            let width = shape.width * transform.scale_x;
            let height = shape.height * transform.scale_y;
            let effective = if width.abs() < MIN_TRANSFORM_SIZE || height.abs() < MIN_TRANSFORM_SIZE
            {
                EntityTransform::translate(transform.translation)
            } else {
                *transform
            };

            let affine = effective.affine_about(shape.origin());
            let origin = affine * shape.origin();
            let far = affine * shape.far_corner();
            shape.x = origin.x;
            shape.y = origin.y;
            shape.width = far.x - origin.x;
            shape.height = far.y - origin.y;
            Entity::Shape(shape)
        }
        Entity::Stroke(stroke) => {
            let mut stroke = stroke.clone();
            let affine = transform.affine_about(stroke.bounds().origin());
            for point in &mut stroke.points {
                *point = affine * *point;
            }
            Entity::Stroke(stroke)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{ShapeEntity, ShapeKind, Stroke};

    fn square() -> Entity {
        ShapeEntity::new("shape-1", ShapeKind::Rectangle, Point::new(100.0, 100.0), "#000000", 5.0)
            .with_size(50.0, 50.0)
            .into()
    }

    #[test]
    fn test_toggle() {
        let mut selection = Selection::new();
        assert!(selection.toggle("a"));
        assert!(selection.toggle("b"));
        assert!(selection.contains("a"));
        assert!(!selection.toggle("a"));
        assert!(!selection.contains("a"));
        assert_eq!(selection.ids(), ["b".to_string()]);

        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn test_retain_live() {
        let mut doc = DrawingDocument::new();
        doc.append(&square()).unwrap();

        let mut selection = Selection::new();
        selection.toggle("shape-1");
        selection.toggle("gone");
        selection.retain_live(&doc);
        assert_eq!(selection.len(), 1);
        assert!(selection.contains("shape-1"));
    }

    #[test]
    fn test_translate_shape_keeps_id() {
        let moved = transform_entity(&square(), &EntityTransform::translate(Vec2::new(10.0, -5.0)));
        let shape = moved.as_shape().unwrap();
        assert_eq!(shape.id, "shape-1");
        assert_eq!((shape.x, shape.y), (110.0, 95.0));
        assert_eq!((shape.width, shape.height), (50.0, 50.0));
    }

    #[test]
    fn test_scale_shape_about_origin() {
        let scaled = transform_entity(&square(), &EntityTransform::scale(2.0, 0.5));
        let shape = scaled.as_shape().unwrap();
        assert_eq!((shape.x, shape.y), (100.0, 100.0));
        assert_eq!((shape.width, shape.height), (100.0, 25.0));
    }

    #[test]
    fn test_resize_below_minimum_only_moves() {
        let transform = EntityTransform::scale(0.05, 1.0).with_translation(Vec2::new(3.0, 4.0));
        let result = transform_entity(&square(), &transform);
        let shape = result.as_shape().unwrap();
        assert_eq!((shape.x, shape.y), (103.0, 104.0));
        assert_eq!((shape.width, shape.height), (50.0, 50.0));
    }

    #[test]
    fn test_scale_stroke_about_bounds() {
        let stroke: Entity = Stroke::from_points(
            "s-1",
            vec![Point::new(10.0, 10.0), Point::new(20.0, 30.0)],
            "#000000",
            5.0,
        )
        .into();
        let transform = EntityTransform::scale(2.0, 2.0).with_translation(Vec2::new(1.0, 0.0));
        let result = transform_entity(&stroke, &transform);
        let points = &result.as_stroke().unwrap().points;
        assert_eq!(points[0], Point::new(11.0, 10.0));
        assert_eq!(points[1], Point::new(31.0, 50.0));
    }

    #[test]
    fn test_identity() {
        assert!(EntityTransform::default().is_identity());
        assert_eq!(transform_entity(&square(), &EntityTransform::default()), square());
    }
}

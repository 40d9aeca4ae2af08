//! CRDT integration using Loro for collaborative drawing.
//!
//! # Schema
//!
//! The Loro document has the following structure:
//! ```text
//! LoroDoc
//! ├── "strokes": LoroList<LoroMap> (freehand strokes, insertion order)
//! └── "shapes": LoroList<LoroMap> (rectangles, circles, triangles)
//! ```
//!
//! Alongside each list a root LoroMap ("deleted_strokes", "deleted_shapes")
//! records every deleted id. Elements with a recorded id are never shown, so
//! a transform racing a delete cannot bring the entity back.
//!
//! Each element is a LoroMap with:
//! - "type": String ("stroke", "rectangle", "circle", "triangle")
//! - "id": String (`<peer-hex>-<counter>`)
//! - "color": String, "stroke_width": f64
//! - strokes: "points" as a LoroList of alternating x/y numbers
//! - shapes: "x", "y", "width", "height"
//!
//! Loro stamps every operation with a (peer, counter) id, orders concurrent
//! inserts by it, and keeps deleted list elements as tombstones. Operations
//! whose dependencies have not arrived yet are held back until they do.

mod convert;
mod schema;

pub use convert::{entity_from_loro, entity_to_loro};
pub use schema::{DrawingDocument, ObserverCallback, ObserverId};

// Re-export Loro types that may be useful for collaboration
pub use loro::{ExportMode, VersionVector};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocumentError;
    use crate::shapes::{Collection, Entity, ShapeEntity, ShapeKind, Stroke};
    use kurbo::Point;
    use std::sync::{Arc, Mutex};

    fn stroke(id: &str) -> Entity {
        Stroke::from_points(
            id,
            vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)],
            "#000000",
            5.0,
        )
        .into()
    }

    fn shape(id: &str, x: f64) -> Entity {
        ShapeEntity::new(id, ShapeKind::Rectangle, Point::new(x, 0.0), "#ff0000", 2.0)
            .with_size(20.0, 10.0)
            .into()
    }

    fn ids(doc: &DrawingDocument, collection: Collection) -> Vec<String> {
        doc.entities(collection)
            .iter()
            .map(|e| e.id().to_string())
            .collect()
    }

    fn sync_both(a: &mut DrawingDocument, b: &mut DrawingDocument) {
        let to_b = a.export_since(&b.encoded_version()).unwrap();
        let to_a = b.export_since(&a.encoded_version()).unwrap();
        b.import(&to_b).unwrap();
        a.import(&to_a).unwrap();
    }

    #[test]
    fn test_document_creation() {
        let doc = DrawingDocument::with_peer_id(7).unwrap();
        assert_eq!(doc.peer_id(), 7);
        assert!(doc.is_empty());
        assert_eq!(doc.id_generator().next_id(), "7-1");
    }

    #[test]
    fn test_roundtrip_entities() {
        let mut doc = DrawingDocument::new();
        let s = stroke("s-1");
        let r = shape("r-1", 5.0);
        doc.append(&s).unwrap();
        doc.append(&r).unwrap();

        assert_eq!(doc.get(Collection::Strokes, "s-1"), Some(s));
        assert_eq!(doc.get(Collection::Shapes, "r-1"), Some(r.clone()));
        assert_eq!(doc.find("r-1"), Some(r));
        assert!(doc.get(Collection::Strokes, "r-1").is_none());
    }

    #[test]
    fn test_concurrent_appends_converge() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&stroke("a-1")).unwrap();
        b.append(&stroke("b-1")).unwrap();

        sync_both(&mut a, &mut b);

        assert_eq!(a.len(Collection::Strokes), 2);
        assert_eq!(ids(&a, Collection::Strokes), ids(&b, Collection::Strokes));
    }

    #[test]
    fn test_import_is_idempotent() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&stroke("a-1")).unwrap();
        let update = a.export_all().unwrap();

        assert!(b.import(&update).unwrap());
        assert!(!b.import(&update).unwrap());
        assert_eq!(b.len(Collection::Strokes), 1);
    }

    #[test]
    fn test_arrival_order_does_not_matter() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        a.append(&stroke("a-1")).unwrap();
        a.append(&shape("a-2", 0.0)).unwrap();
        a.delete_by_id(Collection::Strokes, "a-1").unwrap();
        a.append(&stroke("a-3")).unwrap();
        let updates = a.take_local_updates();
        assert_eq!(updates.len(), 4);

        // Deletes arrive before the inserts they refer to.
        let mut c = DrawingDocument::with_peer_id(3).unwrap();
        for update in updates.iter().rev() {
            c.import(update).unwrap();
        }

        assert_eq!(ids(&c, Collection::Strokes), vec!["a-3"]);
        assert_eq!(ids(&c, Collection::Shapes), vec!["a-2"]);
        assert_eq!(c.version(), a.version());
    }

    #[test]
    fn test_delete_at_uses_live_index() {
        let mut doc = DrawingDocument::new();
        for id in ["s-1", "s-2", "s-3"] {
            doc.append(&stroke(id)).unwrap();
        }
        assert!(doc.delete_at(Collection::Strokes, 1).unwrap());
        assert_eq!(ids(&doc, Collection::Strokes), vec!["s-1", "s-3"]);

        assert!(!doc.delete_at(Collection::Strokes, 5).unwrap());
        assert!(!doc.delete_by_id(Collection::Strokes, "s-2").unwrap());
    }

    #[test]
    fn test_replace_keeps_id_and_position() {
        let mut doc = DrawingDocument::new();
        doc.append(&shape("r-1", 0.0)).unwrap();
        doc.append(&shape("r-2", 10.0)).unwrap();
        doc.append(&shape("r-3", 20.0)).unwrap();

        let moved = shape("other", 99.0);
        assert!(doc.replace_by_id(Collection::Shapes, "r-2", &moved).unwrap());

        assert_eq!(ids(&doc, Collection::Shapes), vec!["r-1", "r-2", "r-3"]);
        let Some(Entity::Shape(r2)) = doc.get(Collection::Shapes, "r-2") else {
            panic!("r-2 missing");
        };
        assert_eq!(r2.x, 99.0);

        assert!(doc.replace_at(Collection::Shapes, 0, &shape("x", 50.0)).unwrap());
        assert_eq!(doc.index_of(Collection::Shapes, "r-1"), Some(0));
        assert!(!doc.replace_at(Collection::Shapes, 3, &shape("x", 50.0)).unwrap());
    }

    #[test]
    fn test_replace_rejects_wrong_collection() {
        let mut doc = DrawingDocument::new();
        doc.append(&stroke("s-1")).unwrap();
        let err = doc
            .replace_by_id(Collection::Strokes, "s-1", &shape("r-1", 0.0))
            .unwrap_err();
        assert!(matches!(err, DocumentError::WrongCollection { .. }));
    }

    #[test]
    fn test_concurrent_transforms_keep_one_entity() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&shape("r-1", 0.0)).unwrap();
        sync_both(&mut a, &mut b);

        a.replace_by_id(Collection::Shapes, "r-1", &shape("r-1", 10.0))
            .unwrap();
        b.replace_by_id(Collection::Shapes, "r-1", &shape("r-1", 20.0))
            .unwrap();
        sync_both(&mut a, &mut b);

        assert_eq!(a.len(Collection::Shapes), 1);
        assert_eq!(a.shapes(), b.shapes());

        // Deleting removes every hidden copy as well.
        assert!(a.delete_by_id(Collection::Shapes, "r-1").unwrap());
        assert!(a.shapes().is_empty());
        assert!(a.get(Collection::Shapes, "r-1").is_none());
    }

    #[test]
    fn test_erase_wins_over_concurrent_transform() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&shape("shape-1", 0.0)).unwrap();
        a.append(&shape("shape-2", 30.0)).unwrap();
        sync_both(&mut a, &mut b);

        assert!(a
            .replace_by_id(Collection::Shapes, "shape-1", &shape("shape-1", 50.0))
            .unwrap());
        assert!(b.delete_by_id(Collection::Shapes, "shape-1").unwrap());
        sync_both(&mut a, &mut b);

        for doc in [&a, &b] {
            assert_eq!(ids(doc, Collection::Shapes), vec!["shape-2"]);
            assert!(doc.get(Collection::Shapes, "shape-1").is_none());
        }
        // A later transform of the erased id finds nothing to move.
        assert!(!a
            .replace_by_id(Collection::Shapes, "shape-1", &shape("shape-1", 70.0))
            .unwrap());
    }

    #[test]
    fn test_clear_hides_concurrently_transformed_entities() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&stroke("a-1")).unwrap();
        sync_both(&mut a, &mut b);

        let moved: Entity = Stroke::from_points(
            "a-1",
            vec![Point::new(5.0, 5.0), Point::new(15.0, 15.0)],
            "#000000",
            5.0,
        )
        .into();
        a.replace_by_id(Collection::Strokes, "a-1", &moved).unwrap();
        b.clear(Collection::Strokes).unwrap();
        // Drawn concurrently with the clear, so it survives it.
        a.append(&stroke("a-2")).unwrap();
        sync_both(&mut a, &mut b);

        assert_eq!(ids(&a, Collection::Strokes), vec!["a-2"]);
        assert_eq!(ids(&b, Collection::Strokes), vec!["a-2"]);
    }

    #[test]
    fn test_root_containers_use_collection_keys() {
        let mut doc = DrawingDocument::new();
        doc.append(&stroke("s-1")).unwrap();
        doc.append(&shape("r-1", 0.0)).unwrap();

        let raw = loro::LoroDoc::new();
        raw.import(&doc.export_all().unwrap()).unwrap();
        assert_eq!(raw.get_list(Collection::Strokes.key()).len(), 1);
        assert_eq!(raw.get_list(Collection::Shapes.key()).len(), 1);
    }

    #[test]
    fn test_clear_then_append_uses_fresh_id() {
        let mut doc = DrawingDocument::new();
        let mut ids_gen = doc.id_generator();
        let first = ids_gen.next_id();
        doc.append(&stroke(&first)).unwrap();
        doc.append(&shape(&ids_gen.next_id(), 0.0)).unwrap();

        let seen = Arc::new(Mutex::new(Vec::new()));
        for collection in Collection::ALL {
            let seen = seen.clone();
            doc.observe(collection, move |live| {
                seen.lock().unwrap().push((collection, live.len()))
            });
        }

        doc.clear_all().unwrap();
        assert!(doc.is_empty());
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(Collection::Strokes, 0), (Collection::Shapes, 0)]
        );

        let next = ids_gen.next_id();
        assert_ne!(next, first);
        doc.append(&stroke(&next)).unwrap();
        assert_eq!(ids(&doc, Collection::Strokes), vec![next]);
    }

    #[test]
    fn test_observer_sees_one_snapshot_per_import() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&stroke("a-1")).unwrap();
        a.append(&stroke("a-2")).unwrap();
        a.append(&stroke("a-3")).unwrap();

        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let observer = b.observe(Collection::Strokes, move |live| {
            sink.lock().unwrap().push(live.len())
        });

        b.import(&a.export_all().unwrap()).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![3]);

        b.append(&stroke("b-1")).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![3, 4]);

        assert!(b.unobserve(observer));
        assert!(!b.unobserve(observer));
        b.append(&stroke("b-2")).unwrap();
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_corrupt_import_leaves_document_untouched() {
        let mut doc = DrawingDocument::new();
        doc.append(&stroke("s-1")).unwrap();
        let version = doc.version();

        let err = doc.import(&[0xde, 0xad, 0xbe, 0xef]).unwrap_err();
        assert!(matches!(err, DocumentError::Decode(_)));
        assert_eq!(doc.version(), version);
        assert_eq!(doc.len(Collection::Strokes), 1);

        assert!(doc.export_since(&[0xff]).is_err());
    }

    #[test]
    fn test_outbox_only_holds_local_changes() {
        let mut a = DrawingDocument::with_peer_id(1).unwrap();
        let mut b = DrawingDocument::with_peer_id(2).unwrap();
        a.append(&stroke("a-1")).unwrap();
        assert!(a.has_local_updates());

        for update in a.take_local_updates() {
            b.import(&update).unwrap();
        }
        assert!(!a.has_local_updates());
        assert!(b.take_local_updates().is_empty());

        // No-op mutations queue nothing.
        b.delete_by_id(Collection::Strokes, "missing").unwrap();
        b.clear(Collection::Shapes).unwrap();
        assert!(!b.has_local_updates());
    }
}

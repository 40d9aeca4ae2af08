//! Tool system and pointer gesture handling.
//!
//! In-progress strokes and shapes live in a local draft until pointer-up.
//! The eraser is the exception: it deletes whatever its newest segment
//! touches on every move, and its own path is never stored.

use crate::crdt::DrawingDocument;
use crate::error::DocumentResult;
use crate::geometry::{segment_hits_shape, segment_hits_stroke};
use crate::selection::{EntityTransform, Selection, transform_entity};
use crate::shapes::{
    Collection, Entity, EntityId, EntityIdGenerator, ShapeEntity, ShapeKind, Stroke,
};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Colour of the eraser path (fully transparent).
pub const ERASER_COLOR: &str = "rgba(0, 0, 0, 0)";
/// Width of the eraser path.
pub const ERASER_WIDTH: f64 = 30.0;
/// Colour of new strokes and shapes.
pub const DEFAULT_COLOR: &str = "#000000";
/// Width of new strokes and shape outlines.
pub const DEFAULT_STROKE_WIDTH: f64 = 5.0;

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    #[default]
    Select,
    Pencil,
    Eraser,
    Rectangle,
    Circle,
    Triangle,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Select,
        ToolKind::Pencil,
        ToolKind::Eraser,
        ToolKind::Rectangle,
        ToolKind::Circle,
        ToolKind::Triangle,
    ];

    /// The shape this tool draws, if it is a shape tool.
    pub fn shape_kind(self) -> Option<ShapeKind> {
        match self {
            ToolKind::Rectangle => Some(ShapeKind::Rectangle),
            ToolKind::Circle => Some(ShapeKind::Circle),
            ToolKind::Triangle => Some(ShapeKind::Triangle),
            ToolKind::Select | ToolKind::Pencil | ToolKind::Eraser => None,
        }
    }
}

/// An entity being drawn, not yet in the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Draft {
    Stroke(Stroke),
    Eraser(Stroke),
    Shape(ShapeEntity),
}

impl Draft {
    /// The draft as it should be previewed. The eraser path is not drawn.
    pub fn preview(&self) -> Option<Entity> {
        match self {
            Draft::Stroke(stroke) => Some(Entity::Stroke(stroke.clone())),
            Draft::Eraser(_) => None,
            Draft::Shape(shape) => Some(Entity::Shape(shape.clone())),
        }
    }
}

/// Turns pointer events into document mutations.
#[derive(Debug, Clone)]
pub struct GestureController {
    tool: ToolKind,
    /// Colour applied to new strokes and shapes.
    pub color: String,
    /// Width applied to new strokes and shape outlines.
    pub stroke_width: f64,
    selection: Selection,
    draft: Option<Draft>,
    ids: EntityIdGenerator,
}

impl GestureController {
    pub fn new(ids: EntityIdGenerator) -> Self {
        Self {
            tool: ToolKind::default(),
            color: DEFAULT_COLOR.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            selection: Selection::new(),
            draft: None,
            ids,
        }
    }

    /// A controller allocating ids from the document's peer id.
    pub fn for_document(document: &DrawingDocument) -> Self {
        Self::new(document.id_generator())
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    /// Switch tools. Drops any draft; leaving select also clears the selection.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != self.tool {
            log::debug!("Tool changed: {:?} -> {:?}", self.tool, tool);
        }
        self.tool = tool;
        self.draft = None;
        if tool != ToolKind::Select {
            self.selection.clear();
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Start a gesture.
    ///
    /// `target` is the id of the entity under the pointer, as reported by the
    /// hit-testing layer. It only matters for the select tool, where clicking
    /// an entity toggles it and clicking empty canvas clears the selection.
    pub fn pointer_down(&mut self, point: Point, target: Option<&str>) {
        self.draft = match self.tool {
            ToolKind::Select => {
                match target {
                    Some(id) => {
                        self.selection.toggle(id);
                    }
                    None => self.selection.clear(),
                }
                None
            }
            ToolKind::Pencil => Some(Draft::Stroke(Stroke::starting_at(
                self.ids.next_id(),
                point,
                self.color.clone(),
                self.stroke_width,
            ))),
            ToolKind::Eraser => Some(Draft::Eraser(Stroke::starting_at(
                self.ids.next_id(),
                point,
                ERASER_COLOR,
                ERASER_WIDTH,
            ))),
            ToolKind::Rectangle | ToolKind::Circle | ToolKind::Triangle => {
                self.tool.shape_kind().map(|kind| {
                    Draft::Shape(ShapeEntity::new(
                        self.ids.next_id(),
                        kind,
                        point,
                        self.color.clone(),
                        self.stroke_width,
                    ))
                })
            }
        };
    }

    /// Extend the current gesture. Returns the number of entities erased.
    pub fn pointer_move(
        &mut self,
        document: &mut DrawingDocument,
        point: Point,
    ) -> DocumentResult<usize> {
        match &mut self.draft {
            None => Ok(0),
            Some(Draft::Stroke(stroke)) => {
                stroke.add_point(point);
                Ok(0)
            }
            Some(Draft::Shape(shape)) => {
                shape.resize_to(point);
                Ok(0)
            }
            Some(Draft::Eraser(path)) => {
                path.add_point(point);
                let Some(segment) = path.last_segment() else {
                    return Ok(0);
                };

                let hits: Vec<(Collection, EntityId)> = document
                    .strokes()
                    .into_iter()
                    .filter(|s| segment_hits_stroke(segment, s))
                    .map(|s| (Collection::Strokes, s.id))
                    .chain(
                        document
                            .shapes()
                            .into_iter()
                            .filter(|s| segment_hits_shape(segment, s))
                            .map(|s| (Collection::Shapes, s.id)),
                    )
                    .collect();

                let mut erased = 0;
                for (collection, id) in hits {
                    if document.delete_by_id(collection, &id)? {
                        erased += 1;
                    }
                }
                if erased > 0 {
                    log::debug!("Eraser removed {} entities", erased);
                }
                Ok(erased)
            }
        }
    }

    /// Finish the current gesture, committing the draft.
    ///
    /// Returns the id of the appended entity. The eraser appends nothing.
    pub fn pointer_up(&mut self, document: &mut DrawingDocument) -> DocumentResult<Option<EntityId>> {
        let Some(draft) = self.draft.take() else {
            return Ok(None);
        };
        let entity = match draft {
            Draft::Eraser(_) => return Ok(None),
            Draft::Stroke(stroke) => Entity::Stroke(stroke),
            Draft::Shape(shape) => Entity::Shape(shape.normalized()),
        };
        let id = entity.id().to_string();
        document.append(&entity)?;
        Ok(Some(id))
    }

    /// Rewrite an entity's geometry after a drag or resize, keeping its id.
    ///
    /// The entity is looked up by id at commit time. If it is gone (another
    /// client deleted it) this is a no-op returning false.
    pub fn commit_transform(
        &mut self,
        document: &mut DrawingDocument,
        id: &str,
        transform: &EntityTransform,
    ) -> DocumentResult<bool> {
        let Some(entity) = document.find(id) else {
            log::debug!("Transform target {} is no longer live", id);
            return Ok(false);
        };
        let transformed = transform_entity(&entity, transform);
        document.replace_by_id(entity.collection(), id, &transformed)
    }

    /// Delete everything in both collections and empty the selection.
    pub fn clear_all(&mut self, document: &mut DrawingDocument) -> DocumentResult<()> {
        document.clear_all()?;
        self.selection.clear();
        Ok(())
    }
}

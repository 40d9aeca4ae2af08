//! Entities stored in a drawing document.

mod figure;
mod stroke;

pub use figure::{ShapeEntity, ShapeKind};
pub use stroke::{Stroke, flatten, unflatten};

use kurbo::Rect;
use serde::{Deserialize, Serialize};

/// Unique identifier for an entity.
pub type EntityId = String;

/// The two ordered collections of a room document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Strokes,
    Shapes,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Strokes, Collection::Shapes];

    /// Root container name in the document.
    pub fn key(self) -> &'static str {
        match self {
            Collection::Strokes => "strokes",
            Collection::Shapes => "shapes",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Anything that can live in a room document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "snake_case")]
pub enum Entity {
    Stroke(Stroke),
    Shape(ShapeEntity),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Stroke(s) => &s.id,
            Entity::Shape(s) => &s.id,
        }
    }

    /// Replace the id, keeping everything else.
    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        let id = id.into();
        match &mut self {
            Entity::Stroke(s) => s.id = id,
            Entity::Shape(s) => s.id = id,
        }
        self
    }

    /// The collection this entity belongs to.
    pub fn collection(&self) -> Collection {
        match self {
            Entity::Stroke(_) => Collection::Strokes,
            Entity::Shape(_) => Collection::Shapes,
        }
    }

    /// Normalized bounding box.
    pub fn bounds(&self) -> Rect {
        match self {
            Entity::Stroke(s) => s.bounds(),
            Entity::Shape(s) => s.bounds(),
        }
    }

    pub fn as_stroke(&self) -> Option<&Stroke> {
        match self {
            Entity::Stroke(s) => Some(s),
            Entity::Shape(_) => None,
        }
    }

    pub fn as_shape(&self) -> Option<&ShapeEntity> {
        match self {
            Entity::Shape(s) => Some(s),
            Entity::Stroke(_) => None,
        }
    }
}

impl From<Stroke> for Entity {
    fn from(stroke: Stroke) -> Self {
        Entity::Stroke(stroke)
    }
}

impl From<ShapeEntity> for Entity {
    fn from(shape: ShapeEntity) -> Self {
        Entity::Shape(shape)
    }
}

/// Hands out ids that are unique across replicas.
///
/// Ids combine the replica's site id with a local counter that only ever
/// grows, so an id is never handed out twice, not even after a clear.
#[derive(Debug, Clone)]
pub struct EntityIdGenerator {
    site: u64,
    counter: u64,
}

impl EntityIdGenerator {
    pub fn new(site: u64) -> Self {
        Self { site, counter: 0 }
    }

    pub fn site(&self) -> u64 {
        self.site
    }

    /// Produce the next id, e.g. `"1f-3"`.
    pub fn next_id(&mut self) -> EntityId {
        self.counter += 1;
        format!("{:x}-{}", self.site, self.counter)
    }
}

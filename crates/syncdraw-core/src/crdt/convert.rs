//! Conversion between entities and Loro values.

use crate::shapes::{Collection, Entity, ShapeEntity, ShapeKind, Stroke, flatten, unflatten};
use loro::{LoroList, LoroMap, LoroMapValue, LoroResult, LoroValue};

// Entity type identifiers
const TYPE_STROKE: &str = "stroke";

// Common keys
const KEY_TYPE: &str = "type";
const KEY_ID: &str = "id";
const KEY_COLOR: &str = "color";
const KEY_STROKE_WIDTH: &str = "stroke_width";

// Stroke keys
const KEY_POINTS: &str = "points";

// Shape keys
const KEY_X: &str = "x";
const KEY_Y: &str = "y";
const KEY_WIDTH: &str = "width";
const KEY_HEIGHT: &str = "height";

fn get_double(map: &LoroMapValue, key: &str) -> Option<f64> {
    match map.get(key)? {
        LoroValue::Double(d) => Some(*d),
        LoroValue::I64(i) => Some(*i as f64),
        _ => None,
    }
}

fn get_string(map: &LoroMapValue, key: &str) -> Option<String> {
    match map.get(key)? {
        LoroValue::String(s) => Some(s.to_string()),
        _ => None,
    }
}

/// Write an entity into an empty Loro map.
pub fn entity_to_loro(entity: &Entity, map: &LoroMap) -> LoroResult<()> {
    match entity {
        Entity::Stroke(stroke) => {
            map.insert(KEY_TYPE, TYPE_STROKE)?;
            map.insert(KEY_ID, stroke.id.as_str())?;
            map.insert(KEY_COLOR, stroke.color.as_str())?;
            map.insert(KEY_STROKE_WIDTH, stroke.stroke_width)?;
            let points = map.insert_container(KEY_POINTS, LoroList::new())?;
            for n in flatten(&stroke.points) {
                points.push(n)?;
            }
        }
        Entity::Shape(shape) => {
            map.insert(KEY_TYPE, shape.kind.as_str())?;
            map.insert(KEY_ID, shape.id.as_str())?;
            map.insert(KEY_X, shape.x)?;
            map.insert(KEY_Y, shape.y)?;
            map.insert(KEY_WIDTH, shape.width)?;
            map.insert(KEY_HEIGHT, shape.height)?;
            map.insert(KEY_COLOR, shape.color.as_str())?;
            map.insert(KEY_STROKE_WIDTH, shape.stroke_width)?;
        }
    }
    Ok(())
}

/// Read an entity back from a materialized Loro map.
///
/// Returns `None` if the map does not describe an entity of `collection`.
pub fn entity_from_loro(collection: Collection, map: &LoroMapValue) -> Option<Entity> {
    let kind = get_string(map, KEY_TYPE)?;
    let id = get_string(map, KEY_ID)?;
    let color = get_string(map, KEY_COLOR)?;
    let stroke_width = get_double(map, KEY_STROKE_WIDTH)?;

    match collection {
        Collection::Strokes => {
            if kind != TYPE_STROKE {
                return None;
            }
            let numbers: Vec<f64> = match map.get(KEY_POINTS)? {
                LoroValue::List(list) => list
                    .iter()
                    .filter_map(|v| match v {
                        LoroValue::Double(d) => Some(*d),
                        LoroValue::I64(i) => Some(*i as f64),
                        _ => None,
                    })
                    .collect(),
                _ => return None,
            };
            Some(Entity::Stroke(Stroke::from_points(
                id,
                unflatten(&numbers),
                color,
                stroke_width,
            )))
        }
        Collection::Shapes => {
            let kind = ShapeKind::from_name(&kind)?;
            Some(Entity::Shape(ShapeEntity {
                id,
                kind,
                x: get_double(map, KEY_X)?,
                y: get_double(map, KEY_Y)?,
                width: get_double(map, KEY_WIDTH)?,
                height: get_double(map, KEY_HEIGHT)?,
                color,
                stroke_width,
            }))
        }
    }
}

/// The id stored in a materialized map, without decoding the rest.
pub fn entity_id_from_loro(map: &LoroMapValue) -> Option<String> {
    get_string(map, KEY_ID)
}

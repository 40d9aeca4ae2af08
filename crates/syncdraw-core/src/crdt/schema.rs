//! Loro document schema and operations.

use super::convert::{entity_from_loro, entity_id_from_loro, entity_to_loro};
use crate::error::{DocumentError, DocumentResult};
use crate::shapes::{Collection, Entity, EntityIdGenerator, ShapeEntity, Stroke};
use loro::{ExportMode, LoroDoc, LoroList, LoroMap, LoroValue, VersionVector};
use std::collections::HashSet;

/// Root map of deleted ids for a collection, keyed by entity id.
fn tombstone_key(collection: Collection) -> &'static str {
    match collection {
        Collection::Strokes => "deleted_strokes",
        Collection::Shapes => "deleted_shapes",
    }
}

/// Callback receiving the live sequence of one collection.
pub type ObserverCallback = Box<dyn FnMut(&[Entity]) + Send + Sync>;

/// Handle returned by [`DrawingDocument::observe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Observer {
    id: ObserverId,
    collection: Collection,
    callback: ObserverCallback,
}

/// A replicated room document holding strokes and shapes.
///
/// Every local mutation is committed as one Loro transaction, applied
/// immediately and queued as a delta for peers (see
/// [`take_local_updates`](Self::take_local_updates)). Indices are positions
/// in the current live sequence and are re-resolved on every call.
pub struct DrawingDocument {
    doc: LoroDoc,
    observers: Vec<Observer>,
    next_observer: u64,
    /// Deltas produced locally and not yet handed to a transport.
    outbox: Vec<Vec<u8>>,
}

impl DrawingDocument {
    /// Create an empty document with a random peer id.
    pub fn new() -> Self {
        Self {
            doc: LoroDoc::new(),
            observers: Vec::new(),
            next_observer: 0,
            outbox: Vec::new(),
        }
    }

    /// Create an empty document with a fixed peer id.
    pub fn with_peer_id(peer: u64) -> DocumentResult<Self> {
        let document = Self::new();
        document.doc.set_peer_id(peer)?;
        Ok(document)
    }

    /// The replica's peer id, the site half of every operation id.
    pub fn peer_id(&self) -> u64 {
        self.doc.peer_id()
    }

    /// An id generator scoped to this replica.
    pub fn id_generator(&self) -> EntityIdGenerator {
        EntityIdGenerator::new(self.peer_id())
    }

    fn list(&self, collection: Collection) -> LoroList {
        self.doc.get_list(collection.key())
    }

    fn tombstones(&self, collection: Collection) -> LoroMap {
        self.doc.get_map(tombstone_key(collection))
    }

    /// Ids deleted from a collection on any replica.
    ///
    /// An element whose id is in here stays invisible even if it was
    /// inserted concurrently with, or after, the delete.
    fn deleted_ids(&self, collection: Collection) -> HashSet<String> {
        match self.tombstones(collection).get_value() {
            LoroValue::Map(map) => map.keys().cloned().collect(),
            _ => HashSet::new(),
        }
    }

    /// Live entities paired with their raw position in the Loro list.
    ///
    /// Elements that fail to decode are skipped. When two live elements share
    /// an id, the first one wins and the rest stay hidden.
    fn materialize(&self, collection: Collection) -> Vec<(usize, Entity)> {
        let LoroValue::List(items) = self.list(collection).get_deep_value() else {
            return Vec::new();
        };

        let mut seen = self.deleted_ids(collection);
        let mut live = Vec::with_capacity(items.len());
        for (raw, item) in items.iter().enumerate() {
            let entity = match item {
                LoroValue::Map(map) => entity_from_loro(collection, map),
                _ => None,
            };
            let Some(entity) = entity else {
                log::warn!("Skipping undecodable element {} in {}", raw, collection);
                continue;
            };
            if !seen.insert(entity.id().to_string()) {
                log::debug!("Hiding deleted or duplicate {} in {}", entity.id(), collection);
                continue;
            }
            live.push((raw, entity));
        }
        live
    }

    /// Raw list positions of every element carrying `id`, ascending.
    /// Empty if the id was deleted.
    fn raw_positions(&self, collection: Collection, id: &str) -> Vec<usize> {
        if self.deleted_ids(collection).contains(id) {
            return Vec::new();
        }
        let LoroValue::List(items) = self.list(collection).get_deep_value() else {
            return Vec::new();
        };
        items
            .iter()
            .enumerate()
            .filter_map(|(raw, item)| match item {
                LoroValue::Map(map) if entity_id_from_loro(map).as_deref() == Some(id) => Some(raw),
                _ => None,
            })
            .collect()
    }

    /// Live sequence of a collection, oldest first.
    pub fn entities(&self, collection: Collection) -> Vec<Entity> {
        self.materialize(collection)
            .into_iter()
            .map(|(_, entity)| entity)
            .collect()
    }

    pub fn strokes(&self) -> Vec<Stroke> {
        self.entities(Collection::Strokes)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Stroke(s) => Some(s),
                Entity::Shape(_) => None,
            })
            .collect()
    }

    pub fn shapes(&self) -> Vec<ShapeEntity> {
        self.entities(Collection::Shapes)
            .into_iter()
            .filter_map(|e| match e {
                Entity::Shape(s) => Some(s),
                Entity::Stroke(_) => None,
            })
            .collect()
    }

    /// Number of live entities in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        self.materialize(collection).len()
    }

    /// True if both collections are empty.
    pub fn is_empty(&self) -> bool {
        Collection::ALL.iter().all(|c| self.len(*c) == 0)
    }

    /// Current live index of an entity.
    pub fn index_of(&self, collection: Collection, id: &str) -> Option<usize> {
        self.materialize(collection)
            .iter()
            .position(|(_, entity)| entity.id() == id)
    }

    /// Look up a live entity by id.
    pub fn get(&self, collection: Collection, id: &str) -> Option<Entity> {
        self.materialize(collection)
            .into_iter()
            .map(|(_, entity)| entity)
            .find(|entity| entity.id() == id)
    }

    /// Look up a live entity by id in either collection.
    pub fn find(&self, id: &str) -> Option<Entity> {
        Collection::ALL.iter().find_map(|c| self.get(*c, id))
    }

    /// Insert an entity at the tail of its collection.
    ///
    /// The caller supplies the id; it must be globally unique. An id that was
    /// deleted before stays hidden.
    pub fn append(&mut self, entity: &Entity) -> DocumentResult<()> {
        let collection = entity.collection();
        self.mutate(collection, |list, _| {
            let map = list.insert_container(list.len(), LoroMap::new())?;
            entity_to_loro(entity, &map)?;
            Ok(())
        })
    }

    /// Delete the entity at a live index. Out of range is a no-op.
    pub fn delete_at(&mut self, collection: Collection, index: usize) -> DocumentResult<bool> {
        let Some((_, entity)) = self.materialize(collection).into_iter().nth(index) else {
            return Ok(false);
        };
        self.delete_by_id(collection, entity.id())
    }

    /// Delete an entity by id. Unknown ids are a no-op.
    ///
    /// The id is tombstoned as well, so copies inserted concurrently by a
    /// transform on another replica stay hidden after merging.
    pub fn delete_by_id(&mut self, collection: Collection, id: &str) -> DocumentResult<bool> {
        let positions = self.raw_positions(collection, id);
        if positions.is_empty() {
            return Ok(false);
        }
        self.mutate(collection, |list, tombstones| {
            tombstones.insert(id, true)?;
            for raw in positions.iter().rev() {
                list.delete(*raw, 1)?;
            }
            Ok(true)
        })
    }

    /// Replace the entity at a live index, keeping its id and position.
    pub fn replace_at(
        &mut self,
        collection: Collection,
        index: usize,
        entity: &Entity,
    ) -> DocumentResult<bool> {
        let Some((_, current)) = self.materialize(collection).into_iter().nth(index) else {
            return Ok(false);
        };
        self.replace_by_id(collection, current.id(), entity)
    }

    /// Replace an entity by id, keeping its id and position.
    ///
    /// Implemented as delete followed by insert at the same position. The
    /// replacement's own id is ignored.
    pub fn replace_by_id(
        &mut self,
        collection: Collection,
        id: &str,
        entity: &Entity,
    ) -> DocumentResult<bool> {
        if entity.collection() != collection {
            return Err(DocumentError::WrongCollection {
                expected: collection,
                found: entity.collection(),
            });
        }
        let positions = self.raw_positions(collection, id);
        let Some(&first) = positions.first() else {
            return Ok(false);
        };
        let replacement = entity.clone().with_id(id);
        self.mutate(collection, |list, _| {
            for raw in positions.iter().rev() {
                list.delete(*raw, 1)?;
            }
            let map = list.insert_container(first, LoroMap::new())?;
            entity_to_loro(&replacement, &map)?;
            Ok(true)
        })
    }

    /// Delete every element of a collection, tail first.
    pub fn clear(&mut self, collection: Collection) -> DocumentResult<()> {
        if self.list(collection).len() == 0 {
            return Ok(());
        }
        let ids: Vec<String> = self
            .materialize(collection)
            .into_iter()
            .map(|(_, entity)| entity.id().to_string())
            .collect();
        self.mutate(collection, |list, tombstones| {
            for id in &ids {
                tombstones.insert(id, true)?;
            }
            for raw in (0..list.len()).rev() {
                list.delete(raw, 1)?;
            }
            Ok(())
        })
    }

    /// Clear both collections.
    pub fn clear_all(&mut self) -> DocumentResult<()> {
        for collection in Collection::ALL {
            self.clear(collection)?;
        }
        Ok(())
    }

    /// Run one local transaction against a collection and its tombstones.
    ///
    /// If it changed anything, the delta is queued for peers and the
    /// collection's observers get a fresh snapshot. A transaction that fails
    /// partway still ships what it did.
    fn mutate<R>(
        &mut self,
        collection: Collection,
        f: impl FnOnce(&LoroList, &LoroMap) -> DocumentResult<R>,
    ) -> DocumentResult<R> {
        let before = self.doc.oplog_vv();
        let list = self.list(collection);
        let tombstones = self.tombstones(collection);
        let result = f(&list, &tombstones);
        self.doc.commit();

        if self.doc.oplog_vv() != before {
            if let Err(e) = &result {
                log::warn!("Partial change to {} committed after error: {}", collection, e);
            }
            let update = self
                .doc
                .export(ExportMode::updates(&before))
                .map_err(|e| DocumentError::Encode(e.to_string()))?;
            log::debug!("Local change to {}: {} byte delta", collection, update.len());
            self.outbox.push(update);
            self.notify(collection);
        }
        result
    }

    // --- Observers ---

    /// Register a callback invoked with the live sequence of `collection`
    /// after every local or remote change to it.
    pub fn observe(
        &mut self,
        collection: Collection,
        callback: impl FnMut(&[Entity]) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push(Observer {
            id,
            collection,
            callback: Box::new(callback),
        });
        id
    }

    /// Remove a callback. Returns false if it was already gone.
    pub fn unobserve(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|o| o.id != id);
        self.observers.len() != before
    }

    /// Remove every callback.
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    fn notify(&mut self, collection: Collection) {
        if !self.observers.iter().any(|o| o.collection == collection) {
            return;
        }
        let snapshot = self.entities(collection);
        for observer in self
            .observers
            .iter_mut()
            .filter(|o| o.collection == collection)
        {
            (observer.callback)(&snapshot);
        }
    }

    // --- Replication ---

    /// Apply a delta from a peer.
    ///
    /// Returns true if it changed the document. Re-applying a delta is a
    /// no-op. A delta that cannot be decoded leaves the document untouched.
    pub fn import(&mut self, bytes: &[u8]) -> DocumentResult<bool> {
        let before = self.doc.oplog_vv();
        self.doc
            .import(bytes)
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        let changed = self.doc.oplog_vv() != before;
        if changed {
            for collection in Collection::ALL {
                self.notify(collection);
            }
        }
        Ok(changed)
    }

    /// Operations not covered by `since`.
    pub fn export_updates(&self, since: &VersionVector) -> DocumentResult<Vec<u8>> {
        self.doc
            .export(ExportMode::updates(since))
            .map_err(|e| DocumentError::Encode(e.to_string()))
    }

    /// Operations missing from the holder of an encoded version vector.
    pub fn export_since(&self, encoded_version: &[u8]) -> DocumentResult<Vec<u8>> {
        let since = VersionVector::decode(encoded_version)
            .map_err(|e| DocumentError::Decode(e.to_string()))?;
        self.export_updates(&since)
    }

    /// Every operation this replica knows of.
    pub fn export_all(&self) -> DocumentResult<Vec<u8>> {
        self.doc
            .export(ExportMode::all_updates())
            .map_err(|e| DocumentError::Encode(e.to_string()))
    }

    /// The current version vector.
    pub fn version(&self) -> VersionVector {
        self.doc.oplog_vv()
    }

    /// The current version vector, encoded for the wire.
    pub fn encoded_version(&self) -> Vec<u8> {
        self.doc.oplog_vv().encode()
    }

    /// Drain the deltas produced by local mutations.
    pub fn take_local_updates(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.outbox)
    }

    /// True if local deltas are waiting to be sent.
    pub fn has_local_updates(&self) -> bool {
        !self.outbox.is_empty()
    }
}

impl Default for DrawingDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DrawingDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingDocument")
            .field("peer_id", &self.peer_id())
            .field("strokes", &self.len(Collection::Strokes))
            .field("shapes", &self.len(Collection::Shapes))
            .field("observers", &self.observers.len())
            .finish()
    }
}

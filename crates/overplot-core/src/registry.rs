//! Registry of live interactive objects.

use crate::backend::{ArtistId, AxesId, FigureId};
use crate::object::{InteractiveShape, ObjectId, ObjectState, TypeTag};
use std::collections::HashMap;

pub(crate) struct Entry {
    pub state: ObjectState,
    /// Checked out (taken) while a callback runs on the shape.
    pub shape: Option<Box<dyn InteractiveShape>>,
    pub tag: TypeTag,
    pub label: &'static str,
}

/// Insertion-ordered collection of registered objects.
///
/// Order matters: event delivery and `delete_others` sweeps visit
/// objects in registration order, so iteration is backed by a `Vec` of
/// ids with a map for lookup.
#[derive(Default)]
pub struct Registry {
    order: Vec<ObjectId>,
    entries: HashMap<ObjectId, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, entry: Entry) {
        let id = entry.state.id;
        debug_assert!(!self.entries.contains_key(&id));
        self.order.push(id);
        self.entries.insert(id, entry);
    }

    pub(crate) fn remove(&mut self, id: ObjectId) -> Option<Entry> {
        let entry = self.entries.remove(&id)?;
        self.order.retain(|&other| other != id);
        Some(entry)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectState> {
        self.entries.get(&id).map(|e| &e.state)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectState> {
        self.entries.get_mut(&id).map(|e| &mut e.state)
    }

    pub(crate) fn entry(&self, id: ObjectId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub(crate) fn entry_mut(&mut self, id: ObjectId) -> Option<&mut Entry> {
        self.entries.get_mut(&id)
    }

    /// Checks the shape out for a callback. Must be paired with
    /// [`put_shape`](Self::put_shape) unless the object was removed in
    /// the meantime.
    pub(crate) fn take_shape(&mut self, id: ObjectId) -> Option<Box<dyn InteractiveShape>> {
        self.entries.get_mut(&id).and_then(|e| e.shape.take())
    }

    pub(crate) fn put_shape(&mut self, id: ObjectId, shape: Box<dyn InteractiveShape>) {
        if let Some(entry) = self.entries.get_mut(&id) {
            debug_assert!(entry.shape.is_none());
            entry.shape = Some(shape);
        }
    }

    /// All ids in registration order.
    pub fn ids(&self) -> Vec<ObjectId> {
        self.order.clone()
    }

    /// Ids of objects whose type tag matches exactly.
    pub fn of_tag(&self, tag: TypeTag) -> Vec<ObjectId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.entries[id].tag == tag)
            .collect()
    }

    pub fn on_figure(&self, figure: FigureId) -> Vec<ObjectId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.entries[id].state.figure == figure)
            .collect()
    }

    pub fn on_axes(&self, axes: AxesId) -> Vec<ObjectId> {
        self.order
            .iter()
            .copied()
            .filter(|id| self.entries[id].state.axes == axes)
            .collect()
    }

    /// The object owning an artist, if any.
    pub fn owner_of(&self, artist: ArtistId) -> Option<ObjectId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.entries[id].state.artists.contains(&artist))
    }
}

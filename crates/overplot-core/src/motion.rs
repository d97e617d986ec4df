//! Motion coordination across objects of the same type.

use crate::backend::SnapshotId;
use crate::object::{ObjectId, TypeTag};
use std::collections::HashMap;

/// Drag phase of one object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragState {
    Idle,
    /// A drag is underway; `leader` drives the shared redraw.
    Dragging { leader: ObjectId },
}

/// Per-type motion bookkeeping.
///
/// `redraw_pending` and `background` live outside [`DragState`] because
/// hover-following objects (a cursor) need both while no drag leader
/// exists.
#[derive(Debug)]
struct TypeMotion {
    state: DragState,
    redraw_pending: bool,
    background: Option<SnapshotId>,
    blit: bool,
}

impl TypeMotion {
    fn new() -> Self {
        Self {
            state: DragState::Idle,
            redraw_pending: false,
            background: None,
            blit: true,
        }
    }
}

/// Coordinates simultaneous motion.
///
/// Objects of the same type share one drag state machine: the first to
/// initiate becomes leader and drives background capture and redraws
/// for every moving object, including followers of other types. The
/// moving set itself is a union across types.
#[derive(Default)]
pub struct MotionCoordinator {
    moving: Vec<ObjectId>,
    types: HashMap<TypeTag, TypeMotion>,
}

impl MotionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, tag: TypeTag) -> &mut TypeMotion {
        self.types.entry(tag).or_insert_with(TypeMotion::new)
    }

    /// Blit flag of a type; the most recent construction of that type
    /// decides it.
    pub fn blit(&self, tag: TypeTag) -> bool {
        self.types.get(&tag).map(|t| t.blit).unwrap_or(true)
    }

    pub fn set_blit(&mut self, tag: TypeTag, blit: bool) {
        self.entry(tag).blit = blit;
    }

    pub fn drag_state(&self, tag: TypeTag) -> DragState {
        self.types
            .get(&tag)
            .map(|t| t.state)
            .unwrap_or(DragState::Idle)
    }

    pub fn leader(&self, tag: TypeTag) -> Option<ObjectId> {
        match self.drag_state(tag) {
            DragState::Dragging { leader } => Some(leader),
            DragState::Idle => None,
        }
    }

    pub fn is_leader(&self, tag: TypeTag, id: ObjectId) -> bool {
        self.leader(tag) == Some(id)
    }

    /// Starts (or joins) a drag of `tag`. Returns true when `id` became
    /// the leader. A new leader invalidates the saved background so the
    /// first update recaptures it after the full redraw.
    pub fn begin_drag(&mut self, tag: TypeTag, id: ObjectId) -> bool {
        let entry = self.entry(tag);
        match entry.state {
            DragState::Idle => {
                entry.state = DragState::Dragging { leader: id };
                entry.redraw_pending = true;
                true
            }
            DragState::Dragging { .. } => false,
        }
    }

    /// Ends the drag if `id` leads it, yielding the background snapshot
    /// for the caller to free.
    pub fn end_drag_if_leader(&mut self, tag: TypeTag, id: ObjectId) -> Option<SnapshotId> {
        let entry = self.entry(tag);
        if entry.state == (DragState::Dragging { leader: id }) {
            entry.state = DragState::Idle;
            entry.redraw_pending = false;
            entry.background.take()
        } else {
            None
        }
    }

    /// Drops all per-type state, yielding the background snapshot for
    /// the caller to free. Used when a new object of the type is built.
    pub fn reset_type(&mut self, tag: TypeTag) -> Option<SnapshotId> {
        self.types.remove(&tag).and_then(|t| t.background)
    }

    pub fn mark_redraw_pending(&mut self, tag: TypeTag) {
        self.entry(tag).redraw_pending = true;
    }

    pub fn take_redraw_pending(&mut self, tag: TypeTag) -> bool {
        let entry = self.entry(tag);
        std::mem::replace(&mut entry.redraw_pending, false)
    }

    pub fn background(&self, tag: TypeTag) -> Option<SnapshotId> {
        self.types.get(&tag).and_then(|t| t.background)
    }

    /// Stores a new background, returning the displaced one for the
    /// caller to free.
    pub fn set_background(&mut self, tag: TypeTag, snapshot: SnapshotId) -> Option<SnapshotId> {
        self.entry(tag).background.replace(snapshot)
    }

    /// Adds `id` to the union moving set.
    pub fn join_moving(&mut self, id: ObjectId) {
        if !self.moving.contains(&id) {
            self.moving.push(id);
        }
    }

    pub fn leave_moving(&mut self, id: ObjectId) {
        self.moving.retain(|&other| other != id);
    }

    pub fn is_moving(&self, id: ObjectId) -> bool {
        self.moving.contains(&id)
    }

    /// Every moving object, across all types, in join order.
    pub fn moving(&self) -> &[ObjectId] {
        &self.moving
    }
}

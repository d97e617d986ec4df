//! The session: dispatcher, lifecycle and motion protocol.

use crate::backend::{AxesId, Backend, FigureId};
use crate::color::Palette;
use crate::coords::CoordCache;
use crate::error::{Error, Result};
use crate::events::{Event, EventCategory, EventKind, MouseButton, ALL_CATEGORIES};
use crate::motion::MotionCoordinator;
use crate::object::{
    Action, ConnectionId, DeleteScope, EventCtx, InteractiveShape, ObjectId, ObjectState,
    PressInfo,
};
use crate::registry::{Entry, Registry};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Construction options common to all interactive objects.
#[derive(Debug, Clone)]
pub struct ObjectOptions {
    /// Target figure; defaults to the session's current figure.
    pub figure: Option<FigureId>,
    /// Target axes; defaults to the session's current axes.
    pub axes: Option<AxesId>,
    /// Color name or hex string; unrecognized values fall back to the
    /// palette default with a warning.
    pub color: Option<String>,
    /// Use background snapshots and partial composites during motion.
    pub blit: bool,
    /// Retire (rather than drop) the shape on delete, so a blocked
    /// caller can reclaim it.
    pub block: bool,
}

impl Default for ObjectOptions {
    fn default() -> Self {
        Self {
            figure: None,
            axes: None,
            color: None,
            blit: true,
            block: false,
        }
    }
}

/// Why a blocking wait returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The awaited object was deleted (its job finished).
    Released,
    /// The backend ran out of events before the object finished.
    Exhausted,
    /// The timeout elapsed.
    TimedOut,
}

/// Central dispatcher owning the backend, the registry of interactive
/// objects, the motion coordinator and the palette.
///
/// All event traffic flows through [`dispatch`](Session::dispatch);
/// shape callbacks request structural changes through deferred
/// [`Action`]s, which the session applies once the callback returns.
pub struct Session {
    backend: Box<dyn Backend>,
    registry: Registry,
    coordinator: MotionCoordinator,
    palette: Palette,
    subscriptions: HashMap<(FigureId, EventCategory), Vec<(ConnectionId, ObjectId)>>,
    next_connection: u64,
    current_figure: Option<FigureId>,
    current_axes: Option<AxesId>,
    retired: HashMap<ObjectId, Box<dyn InteractiveShape>>,
}

impl Session {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let current_figure = backend.figures().first().copied();
        let current_axes = current_figure.and_then(|f| backend.axes_of(f).first().copied());
        Self {
            backend,
            registry: Registry::new(),
            coordinator: MotionCoordinator::new(),
            palette: Palette::default(),
            subscriptions: HashMap::new(),
            next_connection: 0,
            current_figure,
            current_axes,
            retired: HashMap::new(),
        }
    }

    pub fn backend(&mut self) -> &mut dyn Backend {
        &mut *self.backend
    }

    pub fn backend_ref(&self) -> &dyn Backend {
        &*self.backend
    }

    /// Downcasts the backend to a concrete type.
    pub fn backend_as<T: Backend>(&self) -> Option<&T> {
        self.backend.as_any().downcast_ref()
    }

    pub fn backend_as_mut<T: Backend>(&mut self) -> Option<&mut T> {
        self.backend.as_any_mut().downcast_mut()
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn palette_mut(&mut self) -> &mut Palette {
        &mut self.palette
    }

    pub fn coordinator(&self) -> &MotionCoordinator {
        &self.coordinator
    }

    pub fn current_figure(&self) -> Option<FigureId> {
        self.current_figure
    }

    pub fn set_current_figure(&mut self, figure: FigureId) {
        self.current_figure = Some(figure);
    }

    pub fn current_axes(&self) -> Option<AxesId> {
        self.current_axes
    }

    pub fn set_current_axes(&mut self, axes: AxesId) {
        self.current_axes = Some(axes);
    }

    // Queries.

    /// All live objects, in registration order.
    pub fn all_objects(&self) -> Vec<ObjectId> {
        self.registry.ids()
    }

    /// Live objects of exactly type `T` (subtyping does not count).
    pub fn class_objects<T: InteractiveShape>(&self) -> Vec<ObjectId> {
        self.registry.of_tag(std::any::TypeId::of::<T>())
    }

    pub fn objects_on_figure(&self, figure: FigureId) -> Vec<ObjectId> {
        self.registry.on_figure(figure)
    }

    pub fn objects_on_axes(&self, axes: AxesId) -> Vec<ObjectId> {
        self.registry.on_axes(axes)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.registry.contains(id)
    }

    pub fn state(&self, id: ObjectId) -> Option<&ObjectState> {
        self.registry.get(id)
    }

    /// Borrows the shape of `id` as a concrete type.
    pub fn shape<T: InteractiveShape>(&self, id: ObjectId) -> Option<&T> {
        self.registry
            .entry(id)
            .and_then(|e| e.shape.as_deref())
            .and_then(|s| s.as_any().downcast_ref())
    }

    pub fn shape_mut<T: InteractiveShape>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.registry
            .entry_mut(id)
            .and_then(|e| e.shape.as_deref_mut())
            .and_then(|s| s.as_any_mut().downcast_mut())
    }

    // Lifecycle.

    /// Registers a shape and subscribes it to every event category on
    /// its figure. The object's artists are not created yet; call
    /// [`create`](Session::create) (or let the shape do so on its first
    /// event).
    pub fn add(&mut self, shape: Box<dyn InteractiveShape>, options: ObjectOptions) -> Result<ObjectId> {
        let figure = options
            .figure
            .or(self.current_figure)
            .or_else(|| self.backend.figures().first().copied())
            .ok_or(Error::NoFigure)?;
        let axes = options
            .axes
            .or_else(|| self.current_axes.filter(|&ax| self.backend.figure_of(ax) == figure))
            .or_else(|| self.backend.axes_of(figure).first().copied())
            .ok_or(Error::NoAxes)?;
        let color = self.palette.resolve(options.color.as_deref());

        let tag = shape.type_tag();
        let label = shape.label();
        let id = Uuid::new_v4();
        let state = ObjectState {
            id,
            figure,
            axes,
            color,
            moving: false,
            picked: Default::default(),
            press: None,
            in_motion: Default::default(),
            coords: CoordCache::capture(&*self.backend, axes),
            artists: Vec::new(),
            points: Vec::new(),
            connections: Vec::new(),
            blocking: options.block,
        };
        self.registry.insert(Entry {
            state,
            shape: Some(shape),
            tag,
            label,
        });

        // The newest construction of a type decides its blit mode and
        // invalidates any stale shared background.
        if let Some(old) = self.coordinator.reset_type(tag) {
            self.backend.free_snapshot(old);
        }
        self.coordinator.set_blit(tag, options.blit);

        self.connect(id, figure)?;
        self.current_figure = Some(figure);
        self.current_axes = Some(axes);
        log::debug!("registered {label} {id}");
        Ok(id)
    }

    /// Subscribes `id` to every event category on `figure`. Objects are
    /// connected to their own figure by [`add`](Session::add); this is
    /// public for objects that listen on additional figures.
    pub fn connect(&mut self, id: ObjectId, figure: FigureId) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(Error::UnknownObject(id));
        }
        for category in ALL_CATEGORIES {
            let cid = ConnectionId(self.next_connection);
            self.next_connection += 1;
            self.subscriptions
                .entry((figure, category))
                .or_default()
                .push((cid, id));
            if let Some(state) = self.registry.get_mut(id) {
                state.connections.push((figure, cid));
            }
        }
        Ok(())
    }

    /// Removes all of `id`'s subscriptions. Idempotent.
    pub fn disconnect(&mut self, id: ObjectId) {
        let connections = match self.registry.get_mut(id) {
            Some(state) => std::mem::take(&mut state.connections),
            None => return,
        };
        for (figure, cid) in connections {
            for category in ALL_CATEGORIES {
                if let Some(subs) = self.subscriptions.get_mut(&(figure, category)) {
                    subs.retain(|&(other, _)| other != cid);
                }
            }
        }
    }

    /// Runs the shape's `create` and redraws its figure.
    pub fn create(&mut self, id: ObjectId, at: Option<kurbo::Point>) -> Result<()> {
        let tag = self.registry.entry(id).ok_or(Error::UnknownObject(id))?.tag;
        let blit = self.coordinator.blit(tag);
        let mut shape = self.registry.take_shape(id).ok_or(Error::UnknownObject(id))?;
        let figure = match self.registry.entry_mut(id) {
            Some(entry) => {
                shape.create(&mut entry.state, &mut *self.backend, at, blit);
                entry.state.figure
            }
            None => return Err(Error::UnknownObject(id)),
        };
        self.registry.put_shape(id, shape);
        self.backend.draw(figure);
        Ok(())
    }

    /// Removes the object's artists but keeps it registered and
    /// subscribed. No-op on unknown ids.
    pub fn erase(&mut self, id: ObjectId) {
        self.eraser(id, false);
    }

    /// Fully removes the object: artists, subscriptions, registration.
    /// Idempotent. Blocking objects are retired for later reclaiming.
    pub fn delete(&mut self, id: ObjectId) {
        self.eraser(id, true);
    }

    fn eraser(&mut self, id: ObjectId, deep: bool) {
        let tag = match self.registry.entry(id) {
            Some(entry) => entry.tag,
            None => return,
        };
        let figure = match self.registry.get_mut(id) {
            Some(state) => {
                for artist in std::mem::take(&mut state.artists) {
                    self.backend.remove_artist(artist);
                }
                state.points.clear();
                state.in_motion.clear();
                state.moving = false;
                state.figure
            }
            None => return,
        };
        self.backend.draw(figure);

        // A vanished object cannot keep leading a drag.
        self.coordinator.leave_moving(id);
        if let Some(old) = self.coordinator.end_drag_if_leader(tag, id) {
            self.backend.free_snapshot(old);
        }

        if deep {
            self.disconnect(id);
            if let Some(entry) = self.registry.remove(id) {
                log::debug!("deleted {} {id}", entry.label);
                if let Some(mut shape) = entry.shape {
                    shape.on_removed(&mut *self.backend);
                    if entry.state.blocking {
                        self.retired.insert(id, shape);
                    }
                }
            }
        }
    }

    /// Deletes every *other* live object of the same concrete type as
    /// `id`, filtered by scope. Candidates are materialized up front so
    /// deletion does not disturb the sweep.
    pub fn delete_others(&mut self, id: ObjectId, scope: DeleteScope) {
        let (tag, figure, axes) = match self.registry.entry(id) {
            Some(entry) => (entry.tag, entry.state.figure, entry.state.axes),
            None => return,
        };
        let candidates: Vec<ObjectId> = self
            .registry
            .of_tag(tag)
            .into_iter()
            .filter(|&other| other != id)
            .filter(|&other| match scope {
                DeleteScope::All => true,
                DeleteScope::Figure => self.registry.get(other).is_some_and(|s| s.figure == figure),
                DeleteScope::Axes => self.registry.get(other).is_some_and(|s| s.axes == axes),
            })
            .collect();
        for other in candidates {
            self.delete(other);
        }
    }

    /// Deletes every live object.
    pub fn clear(&mut self) {
        for id in self.registry.ids() {
            self.delete(id);
        }
    }

    /// Reclaims a retired blocking shape after its deletion.
    pub fn take_retired(&mut self, id: ObjectId) -> Option<Box<dyn InteractiveShape>> {
        self.retired.remove(&id)
    }

    // Dispatch.

    /// Delivers an event to every subscribed object and applies the
    /// resulting actions. Pick events go to the picked artist's owner
    /// only.
    pub fn dispatch(&mut self, event: &Event) {
        let category = event.kind.category();

        let recipients: Vec<ObjectId> = match event.kind {
            EventKind::Pick { artist, .. } => {
                let subscribed = self
                    .subscriptions
                    .get(&(event.figure, category))
                    .map(|subs| subs.iter().map(|&(_, id)| id).collect::<Vec<_>>())
                    .unwrap_or_default();
                self.registry
                    .owner_of(artist)
                    .filter(|owner| subscribed.contains(owner))
                    .into_iter()
                    .collect()
            }
            _ => self
                .subscriptions
                .get(&(event.figure, category))
                .map(|subs| subs.iter().map(|&(_, id)| id).collect())
                .unwrap_or_default(),
        };

        for id in recipients {
            // Cached transforms go stale on relayout and after pan/zoom
            // gestures end.
            if matches!(category, EventCategory::Resize | EventCategory::MouseRelease) {
                if let Some(state) = self.registry.get_mut(id) {
                    let axes = state.axes;
                    state.coords.refresh(&*self.backend, axes);
                }
            }
            self.deliver(id, event);
        }

        if category == EventCategory::Close {
            for id in self.registry.on_figure(event.figure) {
                self.delete(id);
            }
        }
    }

    fn deliver(&mut self, id: ObjectId, event: &Event) {
        let tag = match self.registry.entry(id) {
            Some(entry) => entry.tag,
            None => return,
        };
        let is_leader = self.coordinator.is_leader(tag, id);
        let blit = self.coordinator.blit(tag);
        let mut shape = match self.registry.take_shape(id) {
            Some(shape) => shape,
            None => return,
        };
        let actions = match self.registry.entry_mut(id) {
            Some(entry) => {
                let mut ctx = EventCtx {
                    obj: &mut entry.state,
                    backend: &mut *self.backend,
                    palette: &self.palette,
                    is_leader,
                    blit,
                    actions: Vec::new(),
                };
                match event.kind {
                    EventKind::MousePress(_) => shape.on_mouse_press(&mut ctx, event),
                    EventKind::MouseRelease(_) => shape.on_mouse_release(&mut ctx, event),
                    EventKind::Motion => shape.on_motion(&mut ctx, event),
                    EventKind::Pick { .. } => shape.on_pick(&mut ctx, event),
                    EventKind::KeyPress(_) => shape.on_key_press(&mut ctx, event),
                    EventKind::KeyRelease(_) => shape.on_key_release(&mut ctx, event),
                    EventKind::FigureEnter => shape.on_figure_enter(&mut ctx, event),
                    EventKind::FigureLeave => shape.on_figure_leave(&mut ctx, event),
                    EventKind::AxesEnter => shape.on_axes_enter(&mut ctx, event),
                    EventKind::AxesLeave => shape.on_axes_leave(&mut ctx, event),
                    EventKind::Resize => shape.on_resize(&mut ctx, event),
                    EventKind::Close => shape.on_close(&mut ctx, event),
                }
                ctx.actions
            }
            None => Vec::new(),
        };
        self.registry.put_shape(id, shape);
        for action in actions {
            self.apply(id, action, event);
        }
    }

    fn apply(&mut self, id: ObjectId, action: Action, event: &Event) {
        if !self.registry.contains(id) {
            return;
        }
        match action {
            Action::Create(at) => {
                if let Err(err) = self.create(id, at) {
                    log::debug!("deferred create failed: {err}");
                }
            }
            Action::InitiateMotion => self.initiate_motion(id, event),
            Action::UpdateGraph => self.update_graph(id, event),
            Action::ResetAfterMotion => self.reset_after_motion(id),
            Action::JoinMoving => self.coordinator.join_moving(id),
            Action::MarkRedrawPending => {
                if let Some(entry) = self.registry.entry(id) {
                    self.coordinator.mark_redraw_pending(entry.tag);
                }
            }
            Action::CaptureBackground => self.capture_background(id),
            Action::Erase => self.erase(id),
            Action::Delete => self.delete(id),
            Action::DeleteOthers(scope) => self.delete_others(id, scope),
            Action::Activate => {
                if let Some(state) = self.registry.get(id) {
                    self.current_figure = Some(state.figure);
                    self.current_axes = Some(state.axes);
                }
            }
        }
    }

    // Motion protocol.

    /// Starts a drag for `id`: leader election, press capture, artist
    /// animation. A new leader triggers an immediate full redraw, but
    /// the background snapshot is deferred to the first `update_graph`
    /// tick (two-phase capture).
    pub fn initiate_motion(&mut self, id: ObjectId, event: &Event) {
        let (tag, figure) = match self.registry.entry(id) {
            Some(entry) => (entry.tag, entry.state.figure),
            None => return,
        };
        if self.coordinator.begin_drag(tag, id) {
            // A new leader needs a clean frame before anything can be
            // snapshotted; the capture itself waits until the first
            // update tick, once the artists are animated.
            self.backend.draw(figure);
        }
        self.coordinator.join_moving(id);
        let blit = self.coordinator.blit(tag);

        if let Some(mut shape) = self.registry.take_shape(id) {
            if let Some(entry) = self.registry.entry_mut(id) {
                shape.set_active_info(&mut entry.state, &*self.backend);
            }
            self.registry.put_shape(id, shape);
        }

        let button = match event.kind {
            EventKind::MousePress(b) | EventKind::MouseRelease(b) => b,
            EventKind::Pick { button, .. } => button,
            _ => MouseButton::Left,
        };

        if let Some(state) = self.registry.get_mut(id) {
            state.moving = true;
            if blit {
                for &artist in &state.artists {
                    self.backend.set_animated(artist, true);
                }
            }
            let axes = state.axes;
            state.coords.refresh(&*self.backend, axes);

            let mut points = HashMap::new();
            let mut in_motion = HashMap::new();
            for &pt in &state.points {
                if let Some(&pos) = self.backend.artist_points(pt).first() {
                    points.insert(pt, state.coords.data_to_px(pos));
                    in_motion.insert(pt, pos);
                }
            }
            state.in_motion = in_motion;
            state.press = Some(PressInfo {
                button,
                click: event.pixel,
                click_data: event.data,
                points,
            });
        }
    }

    /// One redraw tick during motion, driven by the leader of `id`'s
    /// type: recapture the background if pending, restore it, run
    /// `update_position` on every moving object (all types), then
    /// composite once.
    pub fn update_graph(&mut self, id: ObjectId, event: &Event) {
        let (tag, figure, axes) = match self.registry.entry(id) {
            Some(entry) => (entry.tag, entry.state.figure, entry.state.axes),
            None => return,
        };
        let blit = self.coordinator.blit(tag);

        if blit && self.coordinator.take_redraw_pending(tag) {
            // First tick after the artists went animated: redraw without
            // them and save what is underneath.
            self.backend.draw(figure);
            let region = self.backend.axes_region(axes);
            let snapshot = self.backend.copy_region(figure, region);
            if let Some(old) = self.coordinator.set_background(tag, snapshot) {
                self.backend.free_snapshot(old);
            }
        }
        if blit {
            if let Some(background) = self.coordinator.background(tag) {
                self.backend.restore_region(figure, background);
            }
        }

        for moving_id in self.coordinator.moving().to_vec() {
            let Some(mut shape) = self.registry.take_shape(moving_id) else {
                continue;
            };
            if let Some(entry) = self.registry.entry_mut(moving_id) {
                shape.update_position(&mut entry.state, &mut *self.backend, event);
                if blit {
                    for &artist in entry.state.artists.clone().iter() {
                        self.backend.draw_artist(artist);
                    }
                }
            }
            self.registry.put_shape(moving_id, shape);
        }

        if blit {
            let region = self.backend.axes_region(axes);
            self.backend.blit(figure, region);
        } else {
            self.backend.draw(figure);
        }
    }

    /// Ends `id`'s participation in the current motion and releases the
    /// shared background if `id` was the leader.
    pub fn reset_after_motion(&mut self, id: ObjectId) {
        let tag = match self.registry.entry(id) {
            Some(entry) => entry.tag,
            None => return,
        };
        let blit = self.coordinator.blit(tag);

        if let Some(mut shape) = self.registry.take_shape(id) {
            shape.reset_motion();
            self.registry.put_shape(id, shape);
        }

        if let Some(state) = self.registry.get_mut(id) {
            state.picked.clear();
            state.press = None;
            state.in_motion.clear();
            state.moving = false;
            if blit {
                for &artist in &state.artists {
                    self.backend.set_animated(artist, false);
                }
            }
            let axes = state.axes;
            state.coords.refresh(&*self.backend, axes);
        }

        self.coordinator.leave_moving(id);
        if let Some(old) = self.coordinator.end_drag_if_leader(tag, id) {
            self.backend.free_snapshot(old);
        }
    }

    fn capture_background(&mut self, id: ObjectId) {
        let (tag, figure, axes) = match self.registry.entry(id) {
            Some(entry) => (entry.tag, entry.state.figure, entry.state.axes),
            None => return,
        };
        if !self.coordinator.blit(tag) {
            return;
        }
        self.backend.draw(figure);
        let region = self.backend.axes_region(axes);
        let snapshot = self.backend.copy_region(figure, region);
        if let Some(old) = self.coordinator.set_background(tag, snapshot) {
            self.backend.free_snapshot(old);
        }
        self.coordinator.take_redraw_pending(tag);
    }

    // Blocking.

    /// Pumps backend events until `id` is deleted, the queue is
    /// exhausted or `timeout` elapses. Dispatch happens on the calling
    /// thread; no other event source runs concurrently.
    pub fn wait_on(&mut self, id: ObjectId, timeout: Option<Duration>) -> WaitOutcome {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            if !self.registry.contains(id) {
                return WaitOutcome::Released;
            }
            let remaining = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return WaitOutcome::TimedOut;
                    }
                    Some(deadline - now)
                }
                None => None,
            };
            match self.backend.next_event(remaining) {
                Some(event) => self.dispatch(&event),
                None => {
                    if deadline.is_some_and(|d| Instant::now() >= d) {
                        return WaitOutcome::TimedOut;
                    }
                    return WaitOutcome::Exhausted;
                }
            }
        }
    }
}

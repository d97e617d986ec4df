//! Interactive object state and the shape trait.

use crate::backend::{ArtistId, AxesId, Backend, FigureId};
use crate::color::{Color, Palette};
use crate::coords::CoordCache;
use crate::error::Error;
use crate::events::{Event, MouseButton};
use kurbo::Point;
use std::any::{Any, TypeId};
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use uuid::Uuid;

/// Identity of a registered interactive object.
pub type ObjectId = Uuid;

/// Type tag used for strict per-type grouping (motion coordination,
/// `class_objects`). Subtype relationships do not count.
pub type TypeTag = TypeId;

/// Handle to one event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub(crate) u64);

/// Scope of a `delete_others` sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteScope {
    /// Every figure in the session.
    All,
    /// The object's own figure.
    Figure,
    /// The object's own axes.
    Axes,
}

impl FromStr for DeleteScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "all" => Ok(DeleteScope::All),
            "fig" => Ok(DeleteScope::Figure),
            "ax" => Ok(DeleteScope::Axes),
            _ => Err(Error::InvalidScope(s.into())),
        }
    }
}

/// Bookkeeping captured at mouse press, used to compute drag offsets.
#[derive(Debug, Clone)]
pub struct PressInfo {
    pub button: MouseButton,
    /// Click position in figure pixels.
    pub click: Point,
    /// Click position in data coordinates, when inside axes.
    pub click_data: Option<Point>,
    /// Pixel position of each control point at press time.
    pub points: HashMap<ArtistId, Point>,
}

/// Per-object state owned by the session's registry.
///
/// Shapes read and write this through [`EventCtx`]; the session itself
/// maintains the lifecycle fields (`artists`, `connections`, `moving`).
#[derive(Debug)]
pub struct ObjectState {
    pub id: ObjectId,
    pub figure: FigureId,
    pub axes: AxesId,
    pub color: Color,
    /// Whether this object currently participates in motion.
    pub moving: bool,
    /// Artists picked by the press that initiated the current motion.
    pub picked: BTreeSet<ArtistId>,
    pub press: Option<PressInfo>,
    /// Data-coordinate target of each control point during motion.
    pub in_motion: HashMap<ArtistId, Point>,
    pub coords: CoordCache,
    /// Every artist the object has created, in creation order.
    pub artists: Vec<ArtistId>,
    /// The subset of `artists` that are draggable control points.
    pub points: Vec<ArtistId>,
    pub(crate) connections: Vec<(FigureId, ConnectionId)>,
    /// Set when a caller is blocked waiting on this object; delete then
    /// retires the shape instead of dropping it.
    pub(crate) blocking: bool,
}

impl ObjectState {
    pub fn currently_pressed(&self) -> bool {
        self.press.is_some()
    }
}

/// Structural changes a shape requests during a callback.
///
/// Callbacks never mutate the registry or coordinator directly (the
/// session is mid-dispatch); they queue actions, applied in order once
/// the callback returns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Re-run the shape's `create` at the given data position.
    Create(Option<Point>),
    /// Start a drag: leader election, press capture, artist animation.
    InitiateMotion,
    /// Redraw all moving objects of this type (leader only does work).
    UpdateGraph,
    /// End this object's participation in the current motion.
    ResetAfterMotion,
    /// Join the moving set without a press (hover-following objects).
    JoinMoving,
    /// Force background recapture on the next update.
    MarkRedrawPending,
    /// Capture the blit background now rather than lazily.
    CaptureBackground,
    /// Remove artists but keep the object registered.
    Erase,
    /// Full removal: disconnect, deregister, drop (or retire).
    Delete,
    /// Delete all *other* objects of the same type within scope.
    DeleteOthers(DeleteScope),
    /// Make this object's figure and axes current for new constructions.
    Activate,
}

/// What a callback sees: its own state, the backend, coordinator facts,
/// and the action queue.
pub struct EventCtx<'a> {
    pub obj: &'a mut ObjectState,
    pub backend: &'a mut dyn Backend,
    pub palette: &'a Palette,
    /// True when this object leads the current drag of its type.
    pub is_leader: bool,
    /// Blit flag of this object's type.
    pub blit: bool,
    pub(crate) actions: Vec<Action>,
}

impl<'a> EventCtx<'a> {
    pub fn queue(&mut self, action: Action) {
        self.actions.push(action);
    }
}

/// Behavior of an interactive overlay object.
///
/// One value of an implementing type is checked out of the registry for
/// the duration of each callback, so methods take `&mut self` alongside
/// the object's shared [`ObjectState`].
pub trait InteractiveShape: Any {
    /// Strict type tag; implementations return `TypeId::of::<Self>()`.
    fn type_tag(&self) -> TypeTag;

    /// Short name used in log messages.
    fn label(&self) -> &'static str;

    /// Creates (or recreates) the object's artists. `at` positions the
    /// object at a data coordinate when given.
    fn create(
        &mut self,
        obj: &mut ObjectState,
        backend: &mut dyn Backend,
        at: Option<Point>,
        blit: bool,
    );

    /// Moves the object's in-motion control points for `event`,
    /// updating `obj.in_motion` and the backing artists.
    fn update_position(&mut self, obj: &mut ObjectState, backend: &mut dyn Backend, event: &Event);

    /// Classifies the active drag (which points/edges move) from
    /// `obj.picked`. Called once at motion initiation.
    fn set_active_info(&mut self, obj: &mut ObjectState, backend: &dyn Backend) {
        let _ = (obj, backend);
    }

    /// Clears per-motion classification. Called at motion reset.
    fn reset_motion(&mut self) {}

    /// Called after the object is removed from the registry, with its
    /// artists already gone. Restoration hooks (facecolors) go here.
    fn on_removed(&mut self, backend: &mut dyn Backend) {
        let _ = backend;
    }

    fn on_mouse_press(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_mouse_release(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_pick(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_key_press(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_key_release(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_figure_enter(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_figure_leave(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_axes_enter(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_axes_leave(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_resize(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }
    fn on_close(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let _ = (ctx, event);
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_parsing() {
        assert_eq!("all".parse::<DeleteScope>().unwrap(), DeleteScope::All);
        assert_eq!("fig".parse::<DeleteScope>().unwrap(), DeleteScope::Figure);
        assert_eq!("ax".parse::<DeleteScope>().unwrap(), DeleteScope::Axes);
    }

    #[test]
    fn test_scope_parsing_is_strict() {
        for bad in ["", "All", "figure", "axes", "axis", " all"] {
            match bad.parse::<DeleteScope>() {
                Err(Error::InvalidScope(s)) => assert_eq!(s, bad),
                other => panic!("expected InvalidScope for {bad:?}, got {other:?}"),
            }
        }
    }
}

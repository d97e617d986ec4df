//! Overplot Core Library
//!
//! Session, registry and motion coordination for mouse-driven plot
//! overlays. Concrete shapes (cursors, draggable lines and rectangles)
//! live in `overplot-shapes`; this crate provides the machinery they
//! plug into and the host-toolkit boundary.

pub mod backend;
pub mod color;
pub mod coords;
pub mod error;
pub mod events;
pub mod headless;
pub mod motion;
pub mod object;
pub mod registry;
pub mod session;

pub use backend::{
    ArtistId, AxesId, Backend, FigureId, LineDash, LineStyle, MarkerStyle, MarkerSymbol,
    SnapshotId,
};
pub use color::{Color, Palette};
pub use coords::CoordCache;
pub use error::{Error, Result};
pub use events::{Event, EventCategory, EventKind, MouseButton, ALL_CATEGORIES};
pub use headless::{DrawCall, HeadlessBackend};
pub use motion::{DragState, MotionCoordinator};
pub use object::{
    Action, DeleteScope, EventCtx, InteractiveShape, ObjectId, ObjectState, PressInfo, TypeTag,
};
pub use registry::Registry;
pub use session::{ObjectOptions, Session, WaitOutcome};

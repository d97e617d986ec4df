//! Host toolkit abstraction.
//!
//! A [`Backend`] is the session's view of whatever plotting toolkit is
//! hosting the overlays: it owns figures, axes and artists, performs
//! full and partial redraws, and feeds input events. The crate ships a
//! [`HeadlessBackend`](crate::headless::HeadlessBackend) for tests and
//! display-less embedding; GUI embedders implement this trait over
//! their toolkit.

use crate::color::Color;
use crate::events::Event;
use kurbo::{Affine, Point, Rect};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::time::Duration;

macro_rules! id_newtype {
    ($(#[$meta:meta] $name:ident),* $(,)?) => {
        $(
            #[$meta]
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            pub struct $name(pub u64);
        )*
    };
}

id_newtype! {
    /// Identifies a figure (top-level canvas) within a backend.
    FigureId,
    /// Identifies an axes (data region) within a figure.
    AxesId,
    /// Identifies a drawable artist (line or marker) within an axes.
    ArtistId,
    /// Handle to a saved region of rendered pixels.
    SnapshotId,
}

/// Dash pattern for line artists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineDash {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Marker glyph for point artists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerSymbol {
    #[default]
    Plus,
    Dot,
    Cross,
    Circle,
}

/// Style for line artists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineStyle {
    pub color: Color,
    pub width: f64,
    pub dash: LineDash,
    /// Pick tolerance in pixels; `None` makes the artist unpickable.
    pub pick_radius: Option<f64>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::INK,
            width: 1.0,
            dash: LineDash::Solid,
            pick_radius: None,
        }
    }
}

/// Style for marker artists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerStyle {
    pub color: Color,
    pub symbol: MarkerSymbol,
    pub size: f64,
    /// Pick tolerance in pixels; `None` makes the artist unpickable.
    pub pick_radius: Option<f64>,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            color: Color::INK,
            symbol: MarkerSymbol::Plus,
            size: 10.0,
            pick_radius: None,
        }
    }
}

/// The host toolkit boundary.
///
/// All positions exchanged through artist methods are data coordinates;
/// regions and snapshot geometry are figure pixels. Implementations are
/// expected to tolerate ids for already-removed artists (treating such
/// calls as no-ops) so that teardown paths never fail.
pub trait Backend: Any {
    // Introspection.
    fn figures(&self) -> Vec<FigureId>;
    fn axes_of(&self, figure: FigureId) -> Vec<AxesId>;
    /// Data-coordinate limits of an axes.
    fn view_limits(&self, axes: AxesId) -> Rect;
    fn set_view_limits(&mut self, axes: AxesId, limits: Rect);
    /// Data-to-pixel transform of an axes.
    fn axes_transform(&self, axes: AxesId) -> Affine;
    /// Pixel bounding box of an axes within its figure.
    fn axes_region(&self, axes: AxesId) -> Rect;
    fn figure_of(&self, axes: AxesId) -> FigureId;

    // Facecolors (figure navigation highlights).
    fn figure_facecolor(&self, figure: FigureId) -> Color;
    fn set_figure_facecolor(&mut self, figure: FigureId, color: Color);
    fn axes_facecolor(&self, axes: AxesId) -> Color;
    fn set_axes_facecolor(&mut self, axes: AxesId, color: Color);

    // Artists.
    fn add_line(&mut self, axes: AxesId, points: &[Point], style: &LineStyle) -> ArtistId;
    fn add_marker(&mut self, axes: AxesId, position: Point, style: &MarkerStyle) -> ArtistId;
    fn set_artist_points(&mut self, artist: ArtistId, points: &[Point]);
    fn artist_points(&self, artist: ArtistId) -> Vec<Point>;
    /// Animated artists are skipped by full redraws and drawn
    /// explicitly during blitting.
    fn set_animated(&mut self, artist: ArtistId, animated: bool);
    fn remove_artist(&mut self, artist: ArtistId);

    // Rendering.
    fn draw(&mut self, figure: FigureId);
    fn draw_artist(&mut self, artist: ArtistId);
    fn copy_region(&mut self, figure: FigureId, region: Rect) -> SnapshotId;
    fn restore_region(&mut self, figure: FigureId, snapshot: SnapshotId);
    fn free_snapshot(&mut self, snapshot: SnapshotId);
    /// Composites animated artists drawn since the last restore.
    fn blit(&mut self, figure: FigureId, region: Rect);

    /// Blocks for the next input event, up to `timeout` (`None` waits
    /// indefinitely). Returns `None` when the queue is exhausted or the
    /// timeout elapses.
    fn next_event(&mut self, timeout: Option<Duration>) -> Option<Event>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

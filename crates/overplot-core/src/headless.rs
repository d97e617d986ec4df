//! A display-less backend for tests and embedding.
//!
//! `HeadlessBackend` keeps figures, axes and artists as plain data,
//! records rendering calls in an inspectable log, and replays scripted
//! event queues. Press helpers synthesize `Pick` events from artist
//! pick radii the way a real toolkit's hit testing would.

use crate::backend::{
    ArtistId, AxesId, Backend, FigureId, LineStyle, MarkerStyle, SnapshotId,
};
use crate::color::Color;
use crate::events::{Event, EventKind, MouseButton};
use kurbo::{Affine, Point, Rect, Vec2};
use std::any::Any;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::time::Duration;

/// One recorded rendering call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawCall {
    /// Full figure redraw.
    Full(FigureId),
    /// Single animated artist drawn onto the restored background.
    Artist(ArtistId),
    /// Region copied into a snapshot.
    Snapshot(SnapshotId),
    /// Snapshot restored.
    Restore(SnapshotId),
    /// Composite of the animated artists.
    Blit(FigureId),
}

#[derive(Debug, Clone)]
enum ArtistStyle {
    Line(LineStyle),
    Marker(MarkerStyle),
}

impl ArtistStyle {
    fn color(&self) -> Color {
        match self {
            ArtistStyle::Line(s) => s.color,
            ArtistStyle::Marker(s) => s.color,
        }
    }

    fn pick_radius(&self) -> Option<f64> {
        match self {
            ArtistStyle::Line(s) => s.pick_radius,
            ArtistStyle::Marker(s) => s.pick_radius,
        }
    }
}

#[derive(Debug)]
struct FigureData {
    facecolor: Color,
    axes: Vec<AxesId>,
}

#[derive(Debug)]
struct AxesData {
    figure: FigureId,
    limits: Rect,
    region: Rect,
    facecolor: Color,
}

#[derive(Debug)]
struct ArtistData {
    axes: AxesId,
    points: Vec<Point>,
    style: ArtistStyle,
    animated: bool,
}

/// In-memory [`Backend`] implementation.
#[derive(Default)]
pub struct HeadlessBackend {
    figures: BTreeMap<FigureId, FigureData>,
    axes: BTreeMap<AxesId, AxesData>,
    artists: BTreeMap<ArtistId, ArtistData>,
    snapshots: HashSet<SnapshotId>,
    next_id: u64,
    events: VecDeque<Event>,
    /// Recorded rendering calls, oldest first.
    pub log: Vec<DrawCall>,
}

fn point_to_segment_dist(p: Point, a: Point, b: Point) -> f64 {
    let seg = Vec2::new(b.x - a.x, b.y - a.y);
    let to_p = Vec2::new(p.x - a.x, p.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return to_p.hypot();
    }
    let t = (to_p.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((p.x - proj.x).powi(2) + (p.y - proj.y).powi(2)).sqrt()
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Creates a figure with one axes spanning its whole pixel area.
    pub fn figure(&mut self, limits: Rect, width: f64, height: f64) -> (FigureId, AxesId) {
        let fig = FigureId(self.alloc());
        self.figures.insert(
            fig,
            FigureData {
                facecolor: Color::PAPER,
                axes: Vec::new(),
            },
        );
        let ax = self.add_axes(fig, limits, Rect::new(0.0, 0.0, width, height));
        (fig, ax)
    }

    pub fn add_axes(&mut self, figure: FigureId, limits: Rect, region: Rect) -> AxesId {
        let ax = AxesId(self.alloc());
        self.axes.insert(
            ax,
            AxesData {
                figure,
                limits,
                region,
                facecolor: Color::PAPER,
            },
        );
        if let Some(fig) = self.figures.get_mut(&figure) {
            fig.axes.push(ax);
        }
        ax
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    pub fn artist_count(&self) -> usize {
        self.artists.len()
    }

    pub fn artist_color(&self, artist: ArtistId) -> Option<Color> {
        self.artists.get(&artist).map(|a| a.style.color())
    }

    pub fn is_animated(&self, artist: ArtistId) -> bool {
        self.artists.get(&artist).is_some_and(|a| a.animated)
    }

    pub fn live_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    fn event_at(&self, axes: AxesId, data: Point, kind: EventKind) -> Event {
        let figure = self.figure_of(axes);
        Event::new(figure, kind)
            .in_axes(axes)
            .at_pixel(self.axes_transform(axes) * data)
            .at_data(data)
    }

    // Scripted input.

    pub fn queue_event(&mut self, event: Event) {
        self.events.push_back(event);
    }

    pub fn enter_figure(&mut self, figure: FigureId, pixel: Point) {
        self.events
            .push_back(Event::new(figure, EventKind::FigureEnter).at_pixel(pixel));
    }

    pub fn leave_figure(&mut self, figure: FigureId, pixel: Point) {
        self.events
            .push_back(Event::new(figure, EventKind::FigureLeave).at_pixel(pixel));
    }

    pub fn enter_axes(&mut self, axes: AxesId, data: Point) {
        let event = self.event_at(axes, data, EventKind::AxesEnter);
        self.events.push_back(event);
    }

    pub fn leave_axes(&mut self, axes: AxesId, data: Point) {
        let event = self.event_at(axes, data, EventKind::AxesLeave);
        self.events.push_back(event);
    }

    pub fn move_to(&mut self, axes: AxesId, data: Point) {
        let event = self.event_at(axes, data, EventKind::Motion);
        self.events.push_back(event);
    }

    /// Queues a press at a data position, preceded by `Pick` events for
    /// every pickable artist within its pick radius of the press pixel,
    /// in artist creation order.
    pub fn press(&mut self, axes: AxesId, data: Point, button: MouseButton) {
        let pixel = self.axes_transform(axes) * data;
        let figure = self.figure_of(axes);
        let mut picks = Vec::new();
        for (&id, artist) in &self.artists {
            let Some(radius) = artist.style.pick_radius() else {
                continue;
            };
            if self.figure_of(artist.axes) != figure {
                continue;
            }
            let transform = self.axes_transform(artist.axes);
            let px: Vec<Point> = artist.points.iter().map(|&p| transform * p).collect();
            let dist = match px.len() {
                0 => continue,
                1 => Vec2::new(pixel.x - px[0].x, pixel.y - px[0].y).hypot(),
                _ => px
                    .windows(2)
                    .map(|w| point_to_segment_dist(pixel, w[0], w[1]))
                    .fold(f64::INFINITY, f64::min),
            };
            if dist <= radius {
                picks.push(id);
            }
        }
        for artist in picks {
            let event = self.event_at(axes, data, EventKind::Pick { artist, button });
            self.events.push_back(event);
        }
        let event = self.event_at(axes, data, EventKind::MousePress(button));
        self.events.push_back(event);
    }

    pub fn release(&mut self, axes: AxesId, data: Point, button: MouseButton) {
        let event = self.event_at(axes, data, EventKind::MouseRelease(button));
        self.events.push_back(event);
    }

    pub fn key(&mut self, axes: AxesId, data: Option<Point>, key: &str) {
        let event = match data {
            Some(at) => self.event_at(axes, at, EventKind::KeyPress(key.into())),
            None => Event::new(self.figure_of(axes), EventKind::KeyPress(key.into()))
                .in_axes(axes),
        };
        self.events.push_back(event);
    }

    /// Resizes an axes' pixel region and queues the resize event.
    pub fn resize_axes(&mut self, axes: AxesId, region: Rect) {
        if let Some(ax) = self.axes.get_mut(&axes) {
            ax.region = region;
        }
        let figure = self.figure_of(axes);
        self.events
            .push_back(Event::new(figure, EventKind::Resize).in_axes(axes));
    }

    pub fn close_figure(&mut self, figure: FigureId) {
        self.events.push_back(Event::new(figure, EventKind::Close));
    }
}

impl Backend for HeadlessBackend {
    fn figures(&self) -> Vec<FigureId> {
        self.figures.keys().copied().collect()
    }

    fn axes_of(&self, figure: FigureId) -> Vec<AxesId> {
        self.figures
            .get(&figure)
            .map(|f| f.axes.clone())
            .unwrap_or_default()
    }

    fn view_limits(&self, axes: AxesId) -> Rect {
        self.axes.get(&axes).map(|a| a.limits).unwrap_or(Rect::ZERO)
    }

    fn set_view_limits(&mut self, axes: AxesId, limits: Rect) {
        if let Some(ax) = self.axes.get_mut(&axes) {
            ax.limits = limits;
        }
    }

    fn axes_transform(&self, axes: AxesId) -> Affine {
        let Some(ax) = self.axes.get(&axes) else {
            return Affine::IDENTITY;
        };
        let sx = ax.region.width() / ax.limits.width();
        let sy = ax.region.height() / ax.limits.height();
        Affine::new([
            sx,
            0.0,
            0.0,
            sy,
            ax.region.x0 - ax.limits.x0 * sx,
            ax.region.y0 - ax.limits.y0 * sy,
        ])
    }

    fn axes_region(&self, axes: AxesId) -> Rect {
        self.axes.get(&axes).map(|a| a.region).unwrap_or(Rect::ZERO)
    }

    fn figure_of(&self, axes: AxesId) -> FigureId {
        self.axes
            .get(&axes)
            .map(|a| a.figure)
            .unwrap_or(FigureId(0))
    }

    fn figure_facecolor(&self, figure: FigureId) -> Color {
        self.figures
            .get(&figure)
            .map(|f| f.facecolor)
            .unwrap_or(Color::PAPER)
    }

    fn set_figure_facecolor(&mut self, figure: FigureId, color: Color) {
        if let Some(fig) = self.figures.get_mut(&figure) {
            fig.facecolor = color;
        }
    }

    fn axes_facecolor(&self, axes: AxesId) -> Color {
        self.axes
            .get(&axes)
            .map(|a| a.facecolor)
            .unwrap_or(Color::PAPER)
    }

    fn set_axes_facecolor(&mut self, axes: AxesId, color: Color) {
        if let Some(ax) = self.axes.get_mut(&axes) {
            ax.facecolor = color;
        }
    }

    fn add_line(&mut self, axes: AxesId, points: &[Point], style: &LineStyle) -> ArtistId {
        let id = ArtistId(self.alloc());
        self.artists.insert(
            id,
            ArtistData {
                axes,
                points: points.to_vec(),
                style: ArtistStyle::Line(style.clone()),
                animated: false,
            },
        );
        id
    }

    fn add_marker(&mut self, axes: AxesId, position: Point, style: &MarkerStyle) -> ArtistId {
        let id = ArtistId(self.alloc());
        self.artists.insert(
            id,
            ArtistData {
                axes,
                points: vec![position],
                style: ArtistStyle::Marker(style.clone()),
                animated: false,
            },
        );
        id
    }

    fn set_artist_points(&mut self, artist: ArtistId, points: &[Point]) {
        if let Some(a) = self.artists.get_mut(&artist) {
            a.points = points.to_vec();
        }
    }

    fn artist_points(&self, artist: ArtistId) -> Vec<Point> {
        self.artists
            .get(&artist)
            .map(|a| a.points.clone())
            .unwrap_or_default()
    }

    fn set_animated(&mut self, artist: ArtistId, animated: bool) {
        if let Some(a) = self.artists.get_mut(&artist) {
            a.animated = animated;
        }
    }

    fn remove_artist(&mut self, artist: ArtistId) {
        self.artists.remove(&artist);
    }

    fn draw(&mut self, figure: FigureId) {
        self.log.push(DrawCall::Full(figure));
    }

    fn draw_artist(&mut self, artist: ArtistId) {
        self.log.push(DrawCall::Artist(artist));
    }

    fn copy_region(&mut self, _figure: FigureId, _region: Rect) -> SnapshotId {
        let id = SnapshotId(self.alloc());
        self.snapshots.insert(id);
        self.log.push(DrawCall::Snapshot(id));
        id
    }

    fn restore_region(&mut self, _figure: FigureId, snapshot: SnapshotId) {
        self.log.push(DrawCall::Restore(snapshot));
    }

    fn free_snapshot(&mut self, snapshot: SnapshotId) {
        self.snapshots.remove(&snapshot);
    }

    fn blit(&mut self, figure: FigureId, _region: Rect) {
        self.log.push(DrawCall::Blit(figure));
    }

    fn next_event(&mut self, _timeout: Option<Duration>) -> Option<Event> {
        self.events.pop_front()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

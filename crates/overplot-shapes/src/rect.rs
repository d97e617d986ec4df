//! Draggable rectangle: four corners, four edges, one center marker.
//!
//! Dragging an edge moves that edge only (axis-constrained), dragging a
//! corner reshapes the two adjacent edges, dragging the center
//! translates the whole rectangle. Right-clicking any part deletes it.

use kurbo::{Point, Rect};
use overplot_core::{
    Action, ArtistId, AxesId, Backend, Error, Event, EventCtx, EventKind, FigureId,
    InteractiveShape, LineDash, LineStyle, MarkerStyle, MarkerSymbol, MouseButton, ObjectId,
    ObjectOptions, ObjectState, Session, TypeTag,
};
use std::any::{Any, TypeId};

/// Construction options for [`DragRect`].
#[derive(Debug, Clone)]
pub struct RectOptions {
    pub figure: Option<FigureId>,
    pub axes: Option<AxesId>,
    pub color: Option<String>,
    /// Initial rectangle in data coordinates; defaults to a rectangle
    /// of half the view extent, centered.
    pub region: Option<Rect>,
    /// Pick tolerance of corners, edges and center, in pixels.
    pub pick_radius: f64,
    pub corner_symbol: MarkerSymbol,
    pub corner_size: f64,
    pub width: f64,
    pub blit: bool,
}

impl Default for RectOptions {
    fn default() -> Self {
        Self {
            figure: None,
            axes: None,
            color: None,
            region: None,
            pick_radius: 5.0,
            corner_symbol: MarkerSymbol::Dot,
            corner_size: 5.0,
            width: 1.0,
            blit: true,
        }
    }
}

/// Corner order: bottom-left, bottom-right, top-right, top-left.
/// Edge `i` joins corner `(i + 3) % 4` to corner `i`, so odd edges run
/// horizontally.
struct RectParts {
    corners: [ArtistId; 4],
    edges: [ArtistId; 4],
    center: ArtistId,
}

#[derive(Clone, Copy)]
enum RectMotion {
    /// One edge moves; `horizontal` edges only move vertically.
    Edge { horizontal: bool },
    /// Corner `i` moves freely, dragging its two adjacent edges.
    Corner(usize),
    /// The whole rectangle translates with the mouse.
    Center,
}

/// A draggable rectangle.
pub struct DragRect {
    region: Option<Rect>,
    pick_radius: f64,
    corner_symbol: MarkerSymbol,
    corner_size: f64,
    width: f64,
    parts: Option<RectParts>,
    mode: Option<RectMotion>,
    active_pts: Vec<ArtistId>,
    active_edges: Vec<usize>,
}

impl DragRect {
    /// Creates a rectangle on the session.
    pub fn attach(session: &mut Session, options: RectOptions) -> Result<ObjectId, Error> {
        let rect = DragRect {
            region: options.region,
            pick_radius: options.pick_radius,
            corner_symbol: options.corner_symbol,
            corner_size: options.corner_size,
            width: options.width,
            parts: None,
            mode: None,
            active_pts: Vec::new(),
            active_edges: Vec::new(),
        };
        let id = session.add(
            Box::new(rect),
            ObjectOptions {
                figure: options.figure,
                axes: options.axes,
                color: options.color,
                blit: options.blit,
                block: false,
            },
        )?;
        session.create(id, None)?;
        Ok(id)
    }
}

fn corner_positions(region: Rect) -> [Point; 4] {
    [
        Point::new(region.x0, region.y0),
        Point::new(region.x1, region.y0),
        Point::new(region.x1, region.y1),
        Point::new(region.x0, region.y1),
    ]
}

impl InteractiveShape for DragRect {
    fn type_tag(&self) -> TypeTag {
        TypeId::of::<DragRect>()
    }

    fn label(&self) -> &'static str {
        "rect"
    }

    fn create(
        &mut self,
        obj: &mut ObjectState,
        backend: &mut dyn Backend,
        at: Option<Point>,
        _blit: bool,
    ) {
        for artist in std::mem::take(&mut obj.artists) {
            backend.remove_artist(artist);
        }
        obj.points.clear();

        let limits = backend.view_limits(obj.axes);
        let mut region = self.region.unwrap_or_else(|| {
            Rect::from_center_size(limits.center(), limits.size() * 0.5)
        });
        if let Some(at) = at {
            region = Rect::from_center_size(at, region.size());
        }

        let positions = corner_positions(region);
        let marker = MarkerStyle {
            color: obj.color,
            symbol: self.corner_symbol,
            size: self.corner_size,
            pick_radius: Some(self.pick_radius),
        };
        let corners = positions.map(|pos| backend.add_marker(obj.axes, pos, &marker));

        let line_style = LineStyle {
            color: obj.color,
            width: self.width,
            dash: LineDash::Solid,
            pick_radius: Some(self.pick_radius),
        };
        let mut edges = [ArtistId(0); 4];
        for i in 0..4 {
            edges[i] = backend.add_line(
                obj.axes,
                &[positions[(i + 3) % 4], positions[i]],
                &line_style,
            );
        }

        let center = backend.add_marker(
            obj.axes,
            region.center(),
            &MarkerStyle {
                color: obj.color,
                symbol: MarkerSymbol::Plus,
                size: 10.0,
                pick_radius: Some(self.pick_radius),
            },
        );
        backend.set_view_limits(obj.axes, limits);

        obj.points = corners.to_vec();
        obj.points.push(center);
        obj.artists = corners.to_vec();
        obj.artists.extend(edges);
        obj.artists.push(center);
        self.parts = Some(RectParts {
            corners,
            edges,
            center,
        });
    }

    /// A corner pick also picks its two adjacent edges, so three picked
    /// artists mean a corner drag; a single one is the center or an
    /// edge. Anything else leaves the rectangle still.
    fn set_active_info(&mut self, obj: &mut ObjectState, _backend: &dyn Backend) {
        let Some(parts) = &self.parts else {
            return;
        };
        self.mode = None;
        self.active_pts.clear();
        self.active_edges.clear();

        if obj.picked.len() == 1 {
            let Some(&picked) = obj.picked.iter().next() else {
                return;
            };
            if picked == parts.center {
                self.mode = Some(RectMotion::Center);
                self.active_pts = obj.points.clone();
                self.active_edges = vec![0, 1, 2, 3];
            } else if let Some(i) = parts.edges.iter().position(|&e| e == picked) {
                self.mode = Some(RectMotion::Edge {
                    horizontal: i % 2 == 1,
                });
                self.active_pts = vec![
                    parts.corners[(i + 3) % 4],
                    parts.corners[i],
                    parts.center,
                ];
                self.active_edges = vec![i, (i + 1) % 4, (i + 3) % 4];
            }
        } else if obj.picked.len() == 3 {
            if let Some(i) = parts
                .corners
                .iter()
                .position(|c| obj.picked.contains(c))
            {
                self.mode = Some(RectMotion::Corner(i));
                self.active_pts = vec![
                    parts.corners[i],
                    parts.corners[(i + 3) % 4],
                    parts.corners[(i + 1) % 4],
                    parts.center,
                ];
                self.active_edges = vec![0, 1, 2, 3];
            }
        }
    }

    fn update_position(&mut self, obj: &mut ObjectState, backend: &mut dyn Backend, event: &Event) {
        let Some(parts) = &self.parts else {
            return;
        };
        match self.mode {
            Some(mode @ (RectMotion::Edge { .. } | RectMotion::Center)) => {
                let Some(press) = obj.press.clone() else {
                    return;
                };
                let is_center = matches!(mode, RectMotion::Center);
                let mut dx = event.pixel.x - press.click.x;
                let mut dy = event.pixel.y - press.click.y;
                if let RectMotion::Edge { horizontal } = mode {
                    // An edge only moves perpendicular to itself.
                    if horizontal {
                        dx = 0.0;
                    } else {
                        dy = 0.0;
                    }
                }
                for &pt in &self.active_pts {
                    let Some(&px) = press.points.get(&pt) else {
                        continue;
                    };
                    // In edge mode the center follows at half speed.
                    let norm = if pt == parts.center && !is_center {
                        0.5
                    } else {
                        1.0
                    };
                    let moved = Point::new(px.x + dx * norm, px.y + dy * norm);
                    obj.in_motion.insert(pt, obj.coords.px_to_data(moved));
                }
            }
            Some(RectMotion::Corner(i)) => {
                let Some(data) = event.data else {
                    return;
                };
                let picked = parts.corners[i];
                let prev = parts.corners[(i + 3) % 4];
                let next = parts.corners[(i + 1) % 4];
                let opposite = parts.corners[(i + 2) % 4];

                obj.in_motion.insert(picked, data);
                let prev_pos = obj.in_motion.get(&prev).copied().unwrap_or(data);
                let next_pos = obj.in_motion.get(&next).copied().unwrap_or(data);
                if i % 2 == 1 {
                    obj.in_motion.insert(prev, Point::new(prev_pos.x, data.y));
                    obj.in_motion.insert(next, Point::new(data.x, next_pos.y));
                } else {
                    obj.in_motion.insert(prev, Point::new(data.x, prev_pos.y));
                    obj.in_motion.insert(next, Point::new(next_pos.x, data.y));
                }
                let opposite_pos = obj.in_motion.get(&opposite).copied().unwrap_or(data);
                obj.in_motion
                    .insert(parts.center, data.midpoint(opposite_pos));
            }
            None => return,
        }

        for &pt in &self.active_pts {
            if let Some(&pos) = obj.in_motion.get(&pt) {
                backend.set_artist_points(pt, &[pos]);
            }
        }
        for &i in &self.active_edges {
            let a = parts.corners[(i + 3) % 4];
            let b = parts.corners[i];
            // A side edge keeps one endpoint fixed; read it back from
            // the artist when it is not part of the motion.
            let fixed = |backend: &dyn Backend, corner: ArtistId| {
                backend.artist_points(corner).first().copied()
            };
            let pa = obj
                .in_motion
                .get(&a)
                .copied()
                .or_else(|| fixed(&*backend, a));
            let pb = obj
                .in_motion
                .get(&b)
                .copied()
                .or_else(|| fixed(&*backend, b));
            if let (Some(pa), Some(pb)) = (pa, pb) {
                backend.set_artist_points(parts.edges[i], &[pa, pb]);
            }
        }
    }

    fn reset_motion(&mut self) {
        self.mode = None;
        self.active_pts.clear();
        self.active_edges.clear();
    }

    fn on_pick(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let EventKind::Pick { artist, button } = event.kind else {
            return;
        };
        if !ctx.obj.artists.contains(&artist) {
            return;
        }
        if button == MouseButton::Right {
            ctx.queue(Action::Delete);
            return;
        }
        ctx.obj.picked.insert(artist);
    }

    fn on_mouse_press(&mut self, ctx: &mut EventCtx<'_>, _event: &Event) {
        if !ctx.obj.picked.is_empty() {
            ctx.queue(Action::InitiateMotion);
        }
    }

    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, _event: &Event) {
        if ctx.obj.moving && ctx.is_leader {
            ctx.queue(Action::UpdateGraph);
        }
    }

    fn on_mouse_release(&mut self, ctx: &mut EventCtx<'_>, _event: &Event) {
        if ctx.obj.moving {
            ctx.queue(Action::ResetAfterMotion);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use overplot_core::HeadlessBackend;

    fn setup() -> (Session, AxesId, ObjectId) {
        let mut backend = HeadlessBackend::new();
        let (_, ax) = backend.figure(Rect::new(0.0, 0.0, 1.0, 1.0), 100.0, 100.0);
        let mut session = Session::new(Box::new(backend));
        let id = DragRect::attach(
            &mut session,
            RectOptions {
                region: Some(Rect::new(0.25, 0.25, 0.75, 0.75)),
                ..Default::default()
            },
        )
        .unwrap();
        (session, ax, id)
    }

    fn pump(session: &mut Session) {
        loop {
            let Some(event) = session.backend().next_event(None) else {
                break;
            };
            session.dispatch(&event);
        }
    }

    fn headless(session: &mut Session) -> &mut HeadlessBackend {
        session.backend_as_mut::<HeadlessBackend>().unwrap()
    }

    fn corner(session: &Session, id: ObjectId, i: usize) -> Point {
        let state = session.state(id).unwrap();
        session.backend_ref().artist_points(state.points[i])[0]
    }

    fn center(session: &Session, id: ObjectId) -> Point {
        let state = session.state(id).unwrap();
        session.backend_ref().artist_points(state.points[4])[0]
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_attach_creates_nine_artists() {
        let (session, _ax, id) = setup();
        let state = session.state(id).unwrap();
        assert_eq!(state.artists.len(), 9);
        assert_eq!(state.points.len(), 5);
        assert!(close(corner(&session, id, 0), Point::new(0.25, 0.25)));
        assert!(close(corner(&session, id, 2), Point::new(0.75, 0.75)));
        assert!(close(center(&session, id), Point::new(0.5, 0.5)));
    }

    #[test]
    fn test_center_drag_translates() {
        let (mut session, ax, id) = setup();

        headless(&mut session).press(ax, Point::new(0.5, 0.5), MouseButton::Left);
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().picked.len(), 1);
        assert!(session.state(id).unwrap().moving);

        headless(&mut session).move_to(ax, Point::new(0.6, 0.6));
        pump(&mut session);
        assert!(close(corner(&mut session, id, 0), Point::new(0.35, 0.35)));
        assert!(close(corner(&mut session, id, 2), Point::new(0.85, 0.85)));
        assert!(close(center(&mut session, id), Point::new(0.6, 0.6)));

        headless(&mut session).release(ax, Point::new(0.6, 0.6), MouseButton::Left);
        pump(&mut session);
        assert!(!session.state(id).unwrap().moving);
    }

    #[test]
    fn test_edge_drag_is_axis_constrained() {
        let (mut session, ax, id) = setup();

        // Bottom edge midpoint: only the edge picks up.
        headless(&mut session).press(ax, Point::new(0.5, 0.25), MouseButton::Left);
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().picked.len(), 1);

        // Diagonal motion: a horizontal edge may only move vertically.
        headless(&mut session).move_to(ax, Point::new(0.55, 0.35));
        pump(&mut session);
        assert!(close(corner(&mut session, id, 0), Point::new(0.25, 0.35)));
        assert!(close(corner(&mut session, id, 1), Point::new(0.75, 0.35)));
        assert!(close(corner(&mut session, id, 2), Point::new(0.75, 0.75)));
        assert!(close(corner(&mut session, id, 3), Point::new(0.25, 0.75)));
        // The center follows at half speed.
        assert!(close(center(&mut session, id), Point::new(0.5, 0.55)));
    }

    #[test]
    fn test_corner_drag_reshapes_neighbors() {
        let (mut session, ax, id) = setup();

        // Top-right corner picks the corner and its two edges.
        headless(&mut session).press(ax, Point::new(0.75, 0.75), MouseButton::Left);
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().picked.len(), 3);

        headless(&mut session).move_to(ax, Point::new(0.9, 0.85));
        pump(&mut session);
        assert!(close(corner(&mut session, id, 2), Point::new(0.9, 0.85)));
        assert!(close(corner(&mut session, id, 1), Point::new(0.9, 0.25)));
        assert!(close(corner(&mut session, id, 3), Point::new(0.25, 0.85)));
        assert!(close(corner(&mut session, id, 0), Point::new(0.25, 0.25)));
        assert!(close(center(&mut session, id), Point::new(0.575, 0.55)));
    }

    #[test]
    fn test_right_click_deletes() {
        let (mut session, ax, id) = setup();

        headless(&mut session).press(ax, Point::new(0.75, 0.75), MouseButton::Right);
        pump(&mut session);
        assert!(!session.contains(id));
        assert_eq!(
            session
                .backend_as::<HeadlessBackend>()
                .unwrap()
                .artist_count(),
            0
        );
    }

    #[test]
    fn test_edges_follow_corners() {
        let (mut session, ax, id) = setup();

        headless(&mut session).press(ax, Point::new(0.75, 0.75), MouseButton::Left);
        pump(&mut session);
        headless(&mut session).move_to(ax, Point::new(0.9, 0.85));
        pump(&mut session);

        // Right edge joins bottom-right to top-right.
        let state = session.state(id).unwrap();
        let right_edge = state.artists[4 + 2];
        let ends = session.backend_ref().artist_points(right_edge);
        assert!(close(ends[0], Point::new(0.9, 0.25)));
        assert!(close(ends[1], Point::new(0.9, 0.85)));
    }
}

//! Draggable line: two endpoint markers joined by a segment.
//!
//! Dragging an endpoint moves that endpoint only; dragging the segment
//! translates the whole line. Right-clicking the segment deletes it.
//! New lines are placed so their endpoints keep clear of lines already
//! on the same axes.

use kurbo::{Point, Vec2};
use overplot_core::{
    Action, ArtistId, AxesId, Backend, Error, Event, EventCtx, EventKind, FigureId,
    InteractiveShape, LineDash, LineStyle, MarkerStyle, MarkerSymbol, MouseButton, ObjectId,
    ObjectOptions, ObjectState, Session, TypeTag,
};
use std::any::{Any, TypeId};

/// Construction options for [`DragLine`].
#[derive(Debug, Clone)]
pub struct LineOptions {
    pub figure: Option<FigureId>,
    pub axes: Option<AxesId>,
    pub color: Option<String>,
    /// Endpoint positions as fractions of the view limits
    /// (x1, y1, x2, y2).
    pub position: (f64, f64, f64, f64),
    /// Pick tolerance of the segment, in pixels.
    pub pick_radius: f64,
    pub endpoint_symbol: MarkerSymbol,
    pub endpoint_size: f64,
    pub width: f64,
    pub blit: bool,
}

impl Default for LineOptions {
    fn default() -> Self {
        Self {
            figure: None,
            axes: None,
            color: None,
            position: (0.2, 0.2, 0.8, 0.8),
            pick_radius: 5.0,
            endpoint_symbol: MarkerSymbol::Plus,
            endpoint_size: 10.0,
            width: 1.0,
            blit: true,
        }
    }
}

enum LineMotion {
    /// One endpoint moves, the other stays put.
    Endpoint { active: ArtistId, inactive_pos: Point },
    /// The whole line translates with the mouse.
    Whole,
}

/// A draggable line.
pub struct DragLine {
    endpoints: (Point, Point),
    pick_radius: f64,
    endpoint_symbol: MarkerSymbol,
    endpoint_size: f64,
    width: f64,
    mode: Option<LineMotion>,
}

impl DragLine {
    /// Creates a line on the session, avoiding existing lines on the
    /// same axes.
    pub fn attach(session: &mut Session, options: LineOptions) -> Result<ObjectId, Error> {
        let line = DragLine {
            endpoints: (Point::ZERO, Point::ZERO),
            pick_radius: options.pick_radius,
            endpoint_symbol: options.endpoint_symbol,
            endpoint_size: options.endpoint_size,
            width: options.width,
            mode: None,
        };
        let id = session.add(
            Box::new(line),
            ObjectOptions {
                figure: options.figure,
                axes: options.axes,
                color: options.color,
                blit: options.blit,
                block: false,
            },
        )?;
        let axes = session.state(id).map(|s| s.axes).ok_or(Error::UnknownObject(id))?;
        let endpoints = placed_endpoints(session, axes, options.position, options.pick_radius);
        if let Some(line) = session.shape_mut::<DragLine>(id) {
            line.endpoints = endpoints;
        }
        session.create(id, None)?;
        Ok(id)
    }

    fn segment(&self, obj: &ObjectState) -> Option<ArtistId> {
        obj.artists.get(2).copied()
    }
}

/// Picks endpoint positions for a new line, shifting away from the
/// endpoints of lines already on the axes until every pairwise pixel
/// distance clears three pick radii.
fn placed_endpoints(
    session: &Session,
    axes: AxesId,
    position: (f64, f64, f64, f64),
    pick_radius: f64,
) -> (Point, Point) {
    let backend = session.backend_ref();
    let limits = backend.view_limits(axes);
    let transform = backend.axes_transform(axes);
    let min_dist = 3.0 * pick_radius;

    let (a1, b1, a2, b2) = position;
    let p1 = Point::new(
        limits.x0 + a1 * limits.width(),
        limits.y0 + b1 * limits.height(),
    );
    let p2 = Point::new(
        limits.x0 + a2 * limits.width(),
        limits.y0 + b2 * limits.height(),
    );
    let mut px1 = transform * p1;
    let mut px2 = transform * p2;

    let mut taken: Vec<Point> = Vec::new();
    for other in session.class_objects::<DragLine>() {
        let Some(state) = session.state(other) else {
            continue;
        };
        if state.axes != axes {
            continue;
        }
        for &pt in &state.points {
            if let Some(&pos) = backend.artist_points(pt).first() {
                taken.push(transform * pos);
            }
        }
    }

    let mut placed = taken.is_empty();
    for _ in 0..1000 {
        let crowded = taken.iter().any(|&t| {
            let d1 = Vec2::new(px1.x - t.x, px1.y - t.y).hypot();
            let d2 = Vec2::new(px2.x - t.x, px2.y - t.y).hypot();
            d1.min(d2) < min_dist
        });
        if !crowded {
            placed = true;
            break;
        }
        // Shift the whole line diagonally and retry.
        px1 += Vec2::new(-min_dist, min_dist);
        px2 += Vec2::new(-min_dist, min_dist);
    }
    if !placed {
        log::warn!("could not find a clear position for new line");
    }

    let inverse = transform.inverse();
    (inverse * px1, inverse * px2)
}

impl InteractiveShape for DragLine {
    fn type_tag(&self) -> TypeTag {
        TypeId::of::<DragLine>()
    }

    fn label(&self) -> &'static str {
        "line"
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

        let (mut a, mut b) = self.endpoints;
        if let Some(at) = at {
            let shift = at - a.midpoint(b);
            a += shift;
            b += shift;
        }

        let limits = backend.view_limits(obj.axes);
        let marker = MarkerStyle {
            color: obj.color,
            symbol: self.endpoint_symbol,
            size: self.endpoint_size,
            pick_radius: Some(self.endpoint_size),
        };
        let pt_a = backend.add_marker(obj.axes, a, &marker);
        let pt_b = backend.add_marker(obj.axes, b, &marker);
        let segment = backend.add_line(
            obj.axes,
            &[a, b],
            &LineStyle {
                color: obj.color,
                width: self.width,
                dash: LineDash::Solid,
                pick_radius: Some(self.pick_radius),
            },
        );
        backend.set_view_limits(obj.axes, limits);

        obj.points = vec![pt_a, pt_b];
        obj.artists = vec![pt_a, pt_b, segment];
    }

    /// An endpoint pick also picks the segment underneath, so two or
    /// more picked artists mean an endpoint drag; the segment alone
    /// means a whole-line drag.
    fn set_active_info(&mut self, obj: &mut ObjectState, backend: &dyn Backend) {
        let [pt_a, pt_b] = obj.points[..] else {
            return;
        };
        let Some(segment) = self.segment(obj) else {
            return;
        };
        if obj.picked.len() >= 2 {
            let (active, inactive) = if obj.picked.contains(&pt_a) {
                (pt_a, pt_b)
            } else {
                (pt_b, pt_a)
            };
            let inactive_pos = backend
                .artist_points(inactive)
                .first()
                .copied()
                .unwrap_or(Point::ZERO);
            self.mode = Some(LineMotion::Endpoint {
                active,
                inactive_pos,
            });
        } else if obj.picked.contains(&segment) {
            self.mode = Some(LineMotion::Whole);
        }
    }

    fn update_position(&mut self, obj: &mut ObjectState, backend: &mut dyn Backend, event: &Event) {
        let Some(segment) = self.segment(obj) else {
            return;
        };
        match &self.mode {
            Some(LineMotion::Endpoint {
                active,
                inactive_pos,
            }) => {
                let Some(data) = event.data else {
                    return;
                };
                obj.in_motion.insert(*active, data);
                backend.set_artist_points(*active, &[data]);
                backend.set_artist_points(segment, &[data, *inactive_pos]);
            }
            Some(LineMotion::Whole) => {
                let Some(press) = obj.press.clone() else {
                    return;
                };
                let delta = event.pixel - press.click;
                let mut ends = Vec::with_capacity(2);
                for pt in obj.points.clone() {
                    let Some(&px) = press.points.get(&pt) else {
                        continue;
                    };
                    let data = obj.coords.px_to_data(px + delta);
                    obj.in_motion.insert(pt, data);
                    backend.set_artist_points(pt, &[data]);
                    ends.push(data);
                }
                if ends.len() == 2 {
                    backend.set_artist_points(segment, &ends);
                }
            }
            None => {}
        }
    }

    fn reset_motion(&mut self) {
        self.mode = None;
    }

    fn on_pick(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let EventKind::Pick { artist, button } = event.kind else {
            return;
        };
        if button == MouseButton::Right && Some(artist) == self.segment(ctx.obj) {
            ctx.queue(Action::Delete);
            return;
        }
        if ctx.obj.artists.contains(&artist) {
            ctx.obj.picked.insert(artist);
        }
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

    /// Leaving the axes ends the drag like a release would.
    fn on_axes_leave(&mut self, ctx: &mut EventCtx<'_>, _event: &Event) {
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
    use kurbo::Rect;
    use overplot_core::HeadlessBackend;

    fn setup() -> (Session, AxesId) {
        let mut backend = HeadlessBackend::new();
        let (_, ax) = backend.figure(Rect::new(0.0, 0.0, 1.0, 1.0), 100.0, 100.0);
        (Session::new(Box::new(backend)), ax)
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

    fn endpoint_positions(session: &Session, id: ObjectId) -> (Point, Point) {
        let state = session.state(id).unwrap();
        let a = session.backend_ref().artist_points(state.points[0])[0];
        let b = session.backend_ref().artist_points(state.points[1])[0];
        (a, b)
    }

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    #[test]
    fn test_attach_places_at_fractional_position() {
        let (mut session, _ax) = setup();
        let id = DragLine::attach(&mut session, LineOptions::default()).unwrap();
        assert_eq!(session.state(id).unwrap().artists.len(), 3);
        let (a, b) = endpoint_positions(&session, id);
        assert!(close(a, Point::new(0.2, 0.2)));
        assert!(close(b, Point::new(0.8, 0.8)));
    }

    #[test]
    fn test_endpoint_drag() {
        let (mut session, ax) = setup();
        let id = DragLine::attach(&mut session, LineOptions::default()).unwrap();

        // Press on endpoint a: picks the marker and the segment under it.
        headless(&mut session).press(ax, Point::new(0.2, 0.2), MouseButton::Left);
        pump(&mut session);
        assert!(session.state(id).unwrap().moving);
        assert!(session.state(id).unwrap().picked.len() >= 2);

        headless(&mut session).move_to(ax, Point::new(0.4, 0.1));
        pump(&mut session);
        let (a, b) = endpoint_positions(&session, id);
        assert!(close(a, Point::new(0.4, 0.1)));
        assert!(close(b, Point::new(0.8, 0.8)));
        let segment = session.state(id).unwrap().artists[2];
        let ends = session.backend_ref().artist_points(segment);
        assert!(close(ends[0], Point::new(0.4, 0.1)));
        assert!(close(ends[1], Point::new(0.8, 0.8)));

        headless(&mut session).release(ax, Point::new(0.4, 0.1), MouseButton::Left);
        pump(&mut session);
        assert!(!session.state(id).unwrap().moving);
        assert!(session.state(id).unwrap().picked.is_empty());
    }

    #[test]
    fn test_whole_line_drag() {
        let (mut session, ax) = setup();
        let id = DragLine::attach(&mut session, LineOptions::default()).unwrap();

        // Press mid-segment, far from both endpoints.
        headless(&mut session).press(ax, Point::new(0.5, 0.5), MouseButton::Left);
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().picked.len(), 1);

        headless(&mut session).move_to(ax, Point::new(0.6, 0.55));
        pump(&mut session);
        let (a, b) = endpoint_positions(&session, id);
        assert!(close(a, Point::new(0.3, 0.25)));
        assert!(close(b, Point::new(0.9, 0.85)));

        headless(&mut session).release(ax, Point::new(0.6, 0.55), MouseButton::Left);
        pump(&mut session);
        assert!(!session.state(id).unwrap().moving);
    }

    #[test]
    fn test_right_click_on_segment_deletes() {
        let (mut session, ax) = setup();
        let id = DragLine::attach(&mut session, LineOptions::default()).unwrap();

        headless(&mut session).press(ax, Point::new(0.5, 0.5), MouseButton::Right);
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
    fn test_placement_avoids_existing_lines() {
        let (mut session, _ax) = setup();
        let first = DragLine::attach(&mut session, LineOptions::default()).unwrap();
        let second = DragLine::attach(&mut session, LineOptions::default()).unwrap();

        let (a1, _) = endpoint_positions(&session, first);
        let (a2, b2) = endpoint_positions(&session, second);
        assert!(!close(a1, a2));

        // Every endpoint pair across the two lines keeps its distance
        // (15 px at 100 px per data unit).
        let (b1a, b1b) = endpoint_positions(&session, first);
        for p in [a2, b2] {
            for q in [b1a, b1b] {
                let d = Vec2::new((p.x - q.x) * 100.0, (p.y - q.y) * 100.0).hypot();
                assert!(d >= 15.0, "endpoints too close: {d}");
            }
        }
    }
}

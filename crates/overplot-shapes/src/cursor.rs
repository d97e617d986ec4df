//! Crosshair cursor following the mouse, with click recording.
//!
//! The cursor appears when the mouse enters an axes and follows it
//! until it leaves. It can leave marks and/or record click positions,
//! and it powers the blocking [`ginput`]/[`hinput`] helpers.
//!
//! Key controls while the cursor is up:
//! - space bar toggles visibility
//! - shift+up / shift+down change the line width
//! - shift+left / shift+right cycle through the palette colors
//! - `a` adds a point, `z` removes the last one, enter stops recording

use kurbo::Point;
use overplot_core::{
    Action, ArtistId, AxesId, Backend, DeleteScope, Error, Event, EventCtx, EventKind, FigureId,
    InteractiveShape, LineDash, LineStyle, MarkerStyle, MarkerSymbol, MouseButton, ObjectId,
    ObjectOptions, ObjectState, PressInfo, Session, TypeTag, WaitOutcome,
};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Duration;

/// Construction options for [`Cursor`].
#[derive(Debug, Clone)]
pub struct CursorOptions {
    pub figure: Option<FigureId>,
    pub axes: Option<AxesId>,
    pub color: Option<String>,
    pub line_width: f64,
    pub dash: LineDash,
    pub blit: bool,
    /// Leave a mark at each recorded click.
    pub show_clicks: bool,
    /// Keep the (x, y) position of each recorded click.
    pub record_clicks: bool,
    pub mouse_add: MouseButton,
    pub mouse_pop: MouseButton,
    pub mouse_stop: MouseButton,
    /// The cursor deletes itself after this many recorded clicks.
    pub max_clicks: usize,
    /// Retire the cursor on delete so a blocked caller can reclaim it.
    pub block: bool,
    pub mark_symbol: MarkerSymbol,
    pub mark_size: f64,
}

impl Default for CursorOptions {
    fn default() -> Self {
        Self {
            figure: None,
            axes: None,
            color: None,
            line_width: 1.0,
            dash: LineDash::Dotted,
            blit: true,
            show_clicks: false,
            record_clicks: false,
            mouse_add: MouseButton::Left,
            mouse_pop: MouseButton::Right,
            mouse_stop: MouseButton::Middle,
            max_clicks: 1000,
            block: false,
            mark_symbol: MarkerSymbol::Plus,
            mark_size: 10.0,
        }
    }
}

/// Crosshair cursor. At most one per figure; creating a second one
/// deletes the first when the mouse next enters an axes.
pub struct Cursor {
    visible: bool,
    inaxes: bool,
    width: f64,
    dash: LineDash,
    show_clicks: bool,
    record_clicks: bool,
    add_button: MouseButton,
    pop_button: MouseButton,
    stop_button: MouseButton,
    max_clicks: usize,
    mark_symbol: MarkerSymbol,
    mark_size: f64,
    clicks: Vec<Point>,
    marks: Vec<ArtistId>,
}

impl Cursor {
    /// Registers a cursor on the session. The crosshair itself is drawn
    /// when the mouse enters an axes.
    pub fn attach(session: &mut Session, options: CursorOptions) -> Result<ObjectId, Error> {
        let cursor = Cursor {
            visible: true,
            inaxes: false,
            width: options.line_width,
            dash: options.dash,
            show_clicks: options.show_clicks,
            record_clicks: options.record_clicks,
            add_button: options.mouse_add,
            pop_button: options.mouse_pop,
            stop_button: options.mouse_stop,
            max_clicks: options.max_clicks,
            mark_symbol: options.mark_symbol,
            mark_size: options.mark_size,
            clicks: Vec::new(),
            marks: Vec::new(),
        };
        let id = session.add(
            Box::new(cursor),
            ObjectOptions {
                figure: options.figure,
                axes: options.axes,
                color: options.color,
                blit: options.blit,
                block: options.block,
            },
        )?;
        if let Some(figure) = session.state(id).map(|s| s.figure) {
            session.backend().draw(figure);
        }
        Ok(id)
    }

    /// Recorded click positions, in click order.
    pub fn clicks(&self) -> &[Point] {
        &self.clicks
    }

    /// Removes the click marks from the plot without touching the
    /// recorded data. Marks outlive the cursor itself, so this also
    /// works on a retired cursor.
    pub fn erase_marks(&mut self, backend: &mut dyn Backend) {
        for mark in self.marks.drain(..) {
            backend.remove_artist(mark);
        }
    }

    /// Forgets the recorded click data.
    pub fn erase_data(&mut self) {
        self.clicks.clear();
    }

    fn add_point(&mut self, obj: &ObjectState, backend: &mut dyn Backend, pos: Point) {
        if self.record_clicks {
            self.clicks.push(pos);
        }
        if self.show_clicks {
            let style = MarkerStyle {
                color: obj.color,
                symbol: self.mark_symbol,
                size: self.mark_size,
                pick_radius: None,
            };
            self.marks.push(backend.add_marker(obj.axes, pos, &style));
        }
    }

    fn remove_point(&mut self, backend: &mut dyn Backend) {
        if self.record_clicks {
            self.clicks.pop();
        }
        if self.show_clicks {
            if let Some(mark) = self.marks.pop() {
                backend.remove_artist(mark);
            }
        }
    }

    fn limit_reached(&self) -> bool {
        self.record_clicks && self.clicks.len() >= self.max_clicks
    }

    fn respawn(&self, ctx: &mut EventCtx<'_>, at: Option<Point>) {
        ctx.queue(Action::Create(at));
        ctx.queue(Action::JoinMoving);
    }
}

impl InteractiveShape for Cursor {
    fn type_tag(&self) -> TypeTag {
        TypeId::of::<Cursor>()
    }

    fn label(&self) -> &'static str {
        "cursor"
    }

    /// Draws the crosshair: a horizontal and a vertical line spanning
    /// the axes, crossing at `at`.
    fn create(
        &mut self,
        obj: &mut ObjectState,
        backend: &mut dyn Backend,
        at: Option<Point>,
        blit: bool,
    ) {
        for artist in std::mem::take(&mut obj.artists) {
            backend.remove_artist(artist);
        }
        obj.points.clear();

        let limits = backend.view_limits(obj.axes);
        let at = at.unwrap_or_else(|| limits.center());
        let style = LineStyle {
            color: obj.color,
            width: self.width,
            dash: self.dash,
            pick_radius: None,
        };
        let hline = backend.add_line(
            obj.axes,
            &[Point::new(limits.x0, at.y), Point::new(limits.x1, at.y)],
            &style,
        );
        let vline = backend.add_line(
            obj.axes,
            &[Point::new(at.x, limits.y0), Point::new(at.x, limits.y1)],
            &style,
        );
        // Adding the lines must not rescale the axes.
        backend.set_view_limits(obj.axes, limits);
        if blit {
            backend.set_animated(hline, true);
            backend.set_animated(vline, true);
        }
        obj.artists.push(hline);
        obj.artists.push(vline);
    }

    fn update_position(&mut self, obj: &mut ObjectState, backend: &mut dyn Backend, event: &Event) {
        let Some(data) = event.data else {
            return;
        };
        // Re-read the limits so the crosshair tracks live limit changes.
        let limits = backend.view_limits(obj.axes);
        if let [hline, vline] = obj.artists[..] {
            backend.set_artist_points(
                hline,
                &[Point::new(limits.x0, data.y), Point::new(limits.x1, data.y)],
            );
            backend.set_artist_points(
                vline,
                &[Point::new(data.x, limits.y0), Point::new(data.x, limits.y1)],
            );
        }
    }

    fn on_axes_enter(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        self.inaxes = true;
        if let Some(axes) = event.axes {
            ctx.obj.axes = axes;
        }
        if self.visible {
            ctx.queue(Action::DeleteOthers(DeleteScope::Figure));
            self.respawn(ctx, event.data);
            if ctx.blit {
                ctx.queue(Action::CaptureBackground);
            }
        }
    }

    fn on_axes_leave(&mut self, ctx: &mut EventCtx<'_>, _event: &Event) {
        self.inaxes = false;
        if self.visible && !ctx.obj.currently_pressed() {
            ctx.queue(Action::Erase);
        }
    }

    fn on_motion(&mut self, ctx: &mut EventCtx<'_>, _event: &Event) {
        // Stay quiet while pressed to not fight panning gestures.
        if self.visible && self.inaxes && !ctx.obj.currently_pressed() {
            ctx.queue(Action::UpdateGraph);
        }
    }

    fn on_mouse_press(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let button = match event.kind {
            EventKind::MousePress(button) => button,
            _ => return,
        };
        ctx.obj.press = Some(PressInfo {
            button,
            click: event.pixel,
            click_data: event.data,
            points: HashMap::new(),
        });
        if self.visible && self.inaxes {
            ctx.queue(Action::Erase);
        }
    }

    fn on_mouse_release(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let press = ctx.obj.press.take();
        if self.visible && self.inaxes {
            self.respawn(ctx, event.data);
            // Restoring the saved background after a zoom paints a stale
            // image; force a recapture on the next motion tick instead.
            ctx.queue(Action::MarkRedrawPending);
        }

        // A release away from its press means the gesture panned or
        // zoomed; such clicks are not recorded.
        if let (Some(press), Some(data), EventKind::MouseRelease(button)) =
            (press, event.data, &event.kind)
        {
            if press.click_data == Some(data) {
                if *button == self.add_button {
                    self.add_point(ctx.obj, ctx.backend, data);
                } else if *button == self.pop_button {
                    self.remove_point(ctx.backend);
                }
            }
        }

        let stopped = matches!(event.kind, EventKind::MouseRelease(b) if b == self.stop_button);
        if self.limit_reached() || stopped {
            log::info!("cursor disconnected (max clicks reached or stop button)");
            ctx.queue(Action::Delete);
        }
    }

    fn on_key_press(&mut self, ctx: &mut EventCtx<'_>, event: &Event) {
        let key = match &event.kind {
            EventKind::KeyPress(key) => key.as_str(),
            _ => return,
        };

        let mut respawn = false;
        match key {
            " " => {
                if self.inaxes {
                    if self.visible {
                        ctx.queue(Action::Erase);
                    } else {
                        self.respawn(ctx, event.data);
                    }
                }
                self.visible = !self.visible;
            }
            "shift+up" => {
                self.width += 0.5;
                respawn = true;
            }
            "shift+down" => {
                self.width = (self.width - 0.5).max(0.5);
                respawn = true;
            }
            "shift+right" => {
                ctx.obj.color = ctx.palette.shifted(ctx.obj.color, 1);
                respawn = true;
            }
            "shift+left" => {
                ctx.obj.color = ctx.palette.shifted(ctx.obj.color, -1);
                respawn = true;
            }
            "a" => {
                if let Some(data) = event.data {
                    self.add_point(ctx.obj, ctx.backend, data);
                }
            }
            "z" => self.remove_point(ctx.backend),
            _ => {}
        }

        if respawn && self.inaxes && self.visible {
            ctx.queue(Action::Erase);
            self.respawn(ctx, event.data);
        }
        ctx.queue(Action::MarkRedrawPending);
        ctx.queue(Action::UpdateGraph);

        if self.limit_reached() || key == "enter" {
            log::info!("cursor disconnected (max clicks reached or stop key)");
            ctx.queue(Action::Delete);
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

/// Blocks until `n` clicks are recorded (or `timeout` elapses),
/// returning the clicked data positions. No marks are drawn.
pub fn ginput(
    session: &mut Session,
    n: usize,
    timeout: Option<Duration>,
) -> Result<Vec<Point>, Error> {
    collect_clicks(session, n, timeout, false)
}

/// Like [`ginput`], but shows a mark at each click while collecting,
/// and panning/zooming during collection does not add click data. The
/// marks are erased before returning.
pub fn hinput(
    session: &mut Session,
    n: usize,
    timeout: Option<Duration>,
) -> Result<Vec<Point>, Error> {
    collect_clicks(session, n, timeout, true)
}

fn collect_clicks(
    session: &mut Session,
    n: usize,
    timeout: Option<Duration>,
    show_marks: bool,
) -> Result<Vec<Point>, Error> {
    let id = Cursor::attach(
        session,
        CursorOptions {
            record_clicks: true,
            show_clicks: show_marks,
            max_clicks: n,
            block: true,
            ..Default::default()
        },
    )?;
    let figure = session.state(id).map(|s| s.figure);

    let outcome = session.wait_on(id, timeout);
    if outcome != WaitOutcome::Released {
        session.delete(id);
    }

    let mut clicks = Vec::new();
    if let Some(shape) = session.take_retired(id) {
        if let Ok(mut cursor) = shape.into_any().downcast::<Cursor>() {
            clicks = cursor.clicks.clone();
            if show_marks {
                cursor.erase_marks(session.backend());
            }
        }
    }
    if let Some(figure) = figure {
        session.backend().draw(figure);
    }
    Ok(clicks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use overplot_core::{Color, HeadlessBackend};

    fn setup() -> (Session, FigureId, AxesId) {
        let mut backend = HeadlessBackend::new();
        let (fig, ax) = backend.figure(Rect::new(0.0, 0.0, 1.0, 1.0), 100.0, 100.0);
        (Session::new(Box::new(backend)), fig, ax)
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

    #[test]
    fn test_crosshair_lifecycle() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(&mut session, CursorOptions::default()).unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.3, 0.4));
        pump(&mut session);
        let artists = session.state(id).unwrap().artists.clone();
        assert_eq!(artists.len(), 2);
        assert!(session.backend_as::<HeadlessBackend>().unwrap().is_animated(artists[0]));

        // Follows the mouse.
        headless(&mut session).move_to(ax, Point::new(0.6, 0.7));
        pump(&mut session);
        let hline = session.backend_ref().artist_points(artists[0]);
        let vline = session.backend_ref().artist_points(artists[1]);
        assert_eq!(hline, vec![Point::new(0.0, 0.7), Point::new(1.0, 0.7)]);
        assert_eq!(vline, vec![Point::new(0.6, 0.0), Point::new(0.6, 1.0)]);

        // Erased on leave, still registered, recreated on re-enter.
        headless(&mut session).leave_axes(ax, Point::new(1.1, 0.5));
        pump(&mut session);
        assert!(session.contains(id));
        assert!(session.state(id).unwrap().artists.is_empty());

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().artists.len(), 2);
    }

    #[test]
    fn test_press_erases_release_respawns() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(&mut session, CursorOptions::default()).unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        headless(&mut session).press(ax, Point::new(0.5, 0.5), MouseButton::Left);
        pump(&mut session);
        assert!(session.state(id).unwrap().artists.is_empty());

        headless(&mut session).release(ax, Point::new(0.5, 0.5), MouseButton::Left);
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().artists.len(), 2);
    }

    #[test]
    fn test_visibility_toggle() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(&mut session, CursorOptions::default()).unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        headless(&mut session).key(ax, Some(Point::new(0.5, 0.5)), " ");
        pump(&mut session);
        assert!(session.state(id).unwrap().artists.is_empty());
        assert!(!session.shape::<Cursor>(id).unwrap().visible);

        headless(&mut session).key(ax, Some(Point::new(0.5, 0.5)), " ");
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().artists.len(), 2);
    }

    #[test]
    fn test_color_cycling() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(&mut session, CursorOptions::default()).unwrap();
        let start = session.state(id).unwrap().color;
        let next = session.palette().shifted(start, 1);

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        headless(&mut session).key(ax, Some(Point::new(0.5, 0.5)), "shift+right");
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().color, next);

        headless(&mut session).key(ax, Some(Point::new(0.5, 0.5)), "shift+left");
        pump(&mut session);
        assert_eq!(session.state(id).unwrap().color, start);
    }

    #[test]
    fn test_click_recording_and_removal() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(
            &mut session,
            CursorOptions {
                record_clicks: true,
                show_clicks: true,
                ..Default::default()
            },
        )
        .unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        for pos in [Point::new(0.2, 0.2), Point::new(0.8, 0.4)] {
            headless(&mut session).press(ax, pos, MouseButton::Left);
            headless(&mut session).release(ax, pos, MouseButton::Left);
        }
        pump(&mut session);
        assert_eq!(
            session.shape::<Cursor>(id).unwrap().clicks(),
            &[Point::new(0.2, 0.2), Point::new(0.8, 0.4)]
        );

        // Right click removes the last point and its mark.
        headless(&mut session).press(ax, Point::new(0.6, 0.6), MouseButton::Right);
        headless(&mut session).release(ax, Point::new(0.6, 0.6), MouseButton::Right);
        pump(&mut session);
        let cursor = session.shape::<Cursor>(id).unwrap();
        assert_eq!(cursor.clicks(), &[Point::new(0.2, 0.2)]);
        assert_eq!(cursor.marks.len(), 1);
    }

    #[test]
    fn test_pan_zoom_clicks_not_recorded() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(
            &mut session,
            CursorOptions {
                record_clicks: true,
                ..Default::default()
            },
        )
        .unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        // Press and release at different spots: a drag, not a click.
        headless(&mut session).press(ax, Point::new(0.2, 0.2), MouseButton::Left);
        headless(&mut session).release(ax, Point::new(0.7, 0.7), MouseButton::Left);
        pump(&mut session);
        assert!(session.shape::<Cursor>(id).unwrap().clicks().is_empty());
    }

    #[test]
    fn test_remove_on_empty_is_noop() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(
            &mut session,
            CursorOptions {
                record_clicks: true,
                show_clicks: true,
                ..Default::default()
            },
        )
        .unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        headless(&mut session).key(ax, Some(Point::new(0.5, 0.5)), "z");
        pump(&mut session);
        let cursor = session.shape::<Cursor>(id).unwrap();
        assert!(cursor.clicks().is_empty());
        assert!(cursor.marks.is_empty());
    }

    #[test]
    fn test_key_equivalents() {
        let (mut session, _fig, ax) = setup();
        let id = Cursor::attach(
            &mut session,
            CursorOptions {
                record_clicks: true,
                ..Default::default()
            },
        )
        .unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        headless(&mut session).key(ax, Some(Point::new(0.3, 0.3)), "a");
        headless(&mut session).key(ax, Some(Point::new(0.4, 0.4)), "a");
        headless(&mut session).key(ax, Some(Point::new(0.4, 0.4)), "z");
        pump(&mut session);
        assert_eq!(
            session.shape::<Cursor>(id).unwrap().clicks(),
            &[Point::new(0.3, 0.3)]
        );

        headless(&mut session).key(ax, Some(Point::new(0.4, 0.4)), "enter");
        pump(&mut session);
        assert!(!session.contains(id));
    }

    #[test]
    fn test_one_cursor_per_figure() {
        let (mut session, _fig, ax) = setup();
        let first = Cursor::attach(&mut session, CursorOptions::default()).unwrap();
        let second = Cursor::attach(&mut session, CursorOptions::default()).unwrap();

        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        pump(&mut session);
        let survivors = session.class_objects::<Cursor>();
        assert_eq!(survivors.len(), 1);
        let _ = (first, second);
    }

    #[test]
    fn test_blocking_releases_after_n_clicks() {
        let (mut session, _fig, ax) = setup();

        // Script three clicks before blocking; no timeout is set, so the
        // release must come from the click limit alone.
        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        let targets = [
            Point::new(0.1, 0.1),
            Point::new(0.5, 0.2),
            Point::new(0.9, 0.8),
        ];
        for pos in targets {
            headless(&mut session).press(ax, pos, MouseButton::Left);
            headless(&mut session).release(ax, pos, MouseButton::Left);
        }

        let clicks = hinput(&mut session, 3, None).unwrap();
        assert_eq!(clicks, targets.to_vec());
        assert!(session.class_objects::<Cursor>().is_empty());
        // hinput cleans its marks up.
        assert_eq!(
            session
                .backend_as::<HeadlessBackend>()
                .unwrap()
                .artist_count(),
            0
        );
    }

    #[test]
    fn test_blocking_timeout() {
        let (mut session, _fig, ax) = setup();
        headless(&mut session).enter_axes(ax, Point::new(0.5, 0.5));
        let clicks = ginput(&mut session, 3, Some(Duration::from_millis(1))).unwrap();
        assert!(clicks.is_empty());
        assert!(session.class_objects::<Cursor>().is_empty());
    }

    #[test]
    fn test_custom_color() {
        let (mut session, _fig, _ax) = setup();
        let id = Cursor::attach(
            &mut session,
            CursorOptions {
                color: Some("dodgerblue".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            session.state(id).unwrap().color,
            Color::rgb(0x1e, 0x90, 0xff)
        );
    }
}

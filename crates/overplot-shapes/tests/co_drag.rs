//! Cross-object drag scenarios against the headless backend.

use kurbo::{Point, Rect};
use overplot_core::{
    DrawCall, HeadlessBackend, MouseButton, ObjectId, Session,
};
use overplot_shapes::{DragLine, DragRect, LineOptions, RectOptions};

fn session_with_axes() -> (Session, overplot_core::AxesId) {
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

fn endpoints(session: &Session, id: ObjectId) -> (Point, Point) {
    let state = session.state(id).unwrap();
    let a = session.backend_ref().artist_points(state.points[0])[0];
    let b = session.backend_ref().artist_points(state.points[1])[0];
    (a, b)
}

fn near(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

/// Two lines grabbed by one press at their crossing move together, and
/// each motion tick composites exactly once.
#[test]
fn test_crossing_lines_co_drag_single_composite() {
    let (mut session, ax) = session_with_axes();
    let a = DragLine::attach(&mut session, LineOptions::default()).unwrap();
    let b = DragLine::attach(
        &mut session,
        LineOptions {
            position: (0.2, 0.8, 0.8, 0.2),
            ..Default::default()
        },
    )
    .unwrap();

    // The diagonals cross at the center, away from every endpoint.
    headless(&mut session).press(ax, Point::new(0.5, 0.5), MouseButton::Left);
    pump(&mut session);
    assert!(session.state(a).unwrap().moving);
    assert!(session.state(b).unwrap().moving);

    headless(&mut session).clear_log();
    headless(&mut session).move_to(ax, Point::new(0.6, 0.55));
    pump(&mut session);

    let (a0, a1) = endpoints(&session, a);
    assert!(near(a0, Point::new(0.3, 0.25)));
    assert!(near(a1, Point::new(0.9, 0.85)));
    let (b0, b1) = endpoints(&session, b);
    assert!(near(b0, Point::new(0.3, 0.85)));
    assert!(near(b1, Point::new(0.9, 0.25)));

    let log = &session.backend_as::<HeadlessBackend>().unwrap().log;
    let blits = log
        .iter()
        .filter(|call| matches!(call, DrawCall::Blit(_)))
        .count();
    assert_eq!(blits, 1);
    assert!(matches!(log.last(), Some(DrawCall::Blit(_))));

    headless(&mut session).release(ax, Point::new(0.6, 0.55), MouseButton::Left);
    pump(&mut session);
    assert!(!session.state(a).unwrap().moving);
    assert!(!session.state(b).unwrap().moving);
    assert_eq!(
        session.backend_as::<HeadlessBackend>().unwrap().live_snapshots(),
        0
    );
}

/// A line and a rectangle grabbed together both follow the drag even
/// though their motion modes differ.
#[test]
fn test_line_and_rect_co_drag() {
    let (mut session, ax) = session_with_axes();
    let line = DragLine::attach(
        &mut session,
        LineOptions {
            position: (0.1, 0.5, 0.9, 0.5),
            ..Default::default()
        },
    )
    .unwrap();
    let rect = DragRect::attach(
        &mut session,
        RectOptions {
            region: Some(Rect::new(0.25, 0.25, 0.75, 0.75)),
            ..Default::default()
        },
    )
    .unwrap();

    // The press sits on the rectangle's left edge where the line
    // crosses it: the line translates, the edge slides horizontally.
    headless(&mut session).press(ax, Point::new(0.25, 0.5), MouseButton::Left);
    pump(&mut session);
    assert!(session.state(line).unwrap().moving);
    assert!(session.state(rect).unwrap().moving);

    headless(&mut session).move_to(ax, Point::new(0.15, 0.55));
    pump(&mut session);

    let (l0, l1) = endpoints(&session, line);
    assert!(near(l0, Point::new(0.0, 0.55)));
    assert!(near(l1, Point::new(0.8, 0.55)));

    let rect_state = session.state(rect).unwrap();
    let bl = session.backend_ref().artist_points(rect_state.points[0])[0];
    let tl = session.backend_ref().artist_points(rect_state.points[3])[0];
    let center = session.backend_ref().artist_points(rect_state.points[4])[0];
    assert!(near(bl, Point::new(0.15, 0.25)));
    assert!(near(tl, Point::new(0.15, 0.75)));
    assert!(near(center, Point::new(0.45, 0.5)));

    headless(&mut session).release(ax, Point::new(0.15, 0.55), MouseButton::Left);
    pump(&mut session);
    assert!(!session.state(line).unwrap().moving);
    assert!(!session.state(rect).unwrap().moving);
}

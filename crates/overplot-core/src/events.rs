//! Event model shared by backends and interactive objects.

use crate::backend::{ArtistId, AxesId, FigureId};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Mouse buttons reported by backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// The payload of an input event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    MousePress(MouseButton),
    MouseRelease(MouseButton),
    Motion,
    /// The mouse press landed on (or near) a specific artist.
    Pick { artist: ArtistId, button: MouseButton },
    KeyPress(String),
    KeyRelease(String),
    FigureEnter,
    FigureLeave,
    AxesEnter,
    AxesLeave,
    Resize,
    Close,
}

impl EventKind {
    pub fn category(&self) -> EventCategory {
        match self {
            EventKind::MousePress(_) => EventCategory::MousePress,
            EventKind::MouseRelease(_) => EventCategory::MouseRelease,
            EventKind::Motion => EventCategory::Motion,
            EventKind::Pick { .. } => EventCategory::Pick,
            EventKind::KeyPress(_) => EventCategory::KeyPress,
            EventKind::KeyRelease(_) => EventCategory::KeyRelease,
            EventKind::FigureEnter => EventCategory::FigureEnter,
            EventKind::FigureLeave => EventCategory::FigureLeave,
            EventKind::AxesEnter => EventCategory::AxesEnter,
            EventKind::AxesLeave => EventCategory::AxesLeave,
            EventKind::Resize => EventCategory::Resize,
            EventKind::Close => EventCategory::Close,
        }
    }
}

/// Subscription categories, one per event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    MousePress,
    MouseRelease,
    Motion,
    Pick,
    KeyPress,
    KeyRelease,
    FigureEnter,
    FigureLeave,
    AxesEnter,
    AxesLeave,
    Resize,
    Close,
}

/// Every category, in the order objects subscribe to them.
pub const ALL_CATEGORIES: [EventCategory; 12] = [
    EventCategory::MousePress,
    EventCategory::MouseRelease,
    EventCategory::Motion,
    EventCategory::Pick,
    EventCategory::KeyPress,
    EventCategory::KeyRelease,
    EventCategory::FigureEnter,
    EventCategory::FigureLeave,
    EventCategory::AxesEnter,
    EventCategory::AxesLeave,
    EventCategory::Resize,
    EventCategory::Close,
];

/// An input event as delivered to interactive objects.
///
/// `data` is `None` when the pointer is outside any axes; `pixel` is
/// always present (figure pixel coordinates).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub figure: FigureId,
    pub axes: Option<AxesId>,
    pub pixel: Point,
    pub data: Option<Point>,
    pub kind: EventKind,
}

impl Event {
    pub fn new(figure: FigureId, kind: EventKind) -> Self {
        Self {
            figure,
            axes: None,
            pixel: Point::ZERO,
            data: None,
            kind,
        }
    }

    pub fn in_axes(mut self, axes: AxesId) -> Self {
        self.axes = Some(axes);
        self
    }

    pub fn at_pixel(mut self, pixel: Point) -> Self {
        self.pixel = pixel;
        self
    }

    pub fn at_data(mut self, data: Point) -> Self {
        self.data = Some(data);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_mapping() {
        let kind = EventKind::MousePress(MouseButton::Left);
        assert_eq!(kind.category(), EventCategory::MousePress);
        assert_eq!(EventKind::Close.category(), EventCategory::Close);
        for (i, cat) in ALL_CATEGORIES.iter().enumerate() {
            for other in &ALL_CATEGORIES[i + 1..] {
                assert_ne!(cat, other);
            }
        }
    }

    #[test]
    fn test_event_serde_roundtrip() {
        let event = Event::new(FigureId(1), EventKind::KeyPress("shift+up".into()))
            .in_axes(AxesId(2))
            .at_pixel(Point::new(10.0, 20.0))
            .at_data(Point::new(0.5, 0.25));
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}

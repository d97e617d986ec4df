//! Overplot Shapes Library
//!
//! Interactive overlay shapes built on `overplot-core`: crosshair
//! cursors with click capture, draggable lines and rectangles, and
//! click-to-activate figure switching.

pub mod clickfig;
pub mod cursor;
pub mod line;
pub mod rect;

pub use clickfig::{ClickFig, ClickFigOptions};
pub use cursor::{ginput, hinput, Cursor, CursorOptions};
pub use line::{DragLine, LineOptions};
pub use rect::{DragRect, RectOptions};

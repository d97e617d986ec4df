//! Error types for overplot-core.

use crate::object::ObjectId;
use thiserror::Error;

/// Errors surfaced by session and parsing operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A deletion scope string was not one of the accepted values.
    #[error("`{0}` is not a valid scope: expected `all`, `fig` or `ax`")]
    InvalidScope(String),

    /// A color string could not be parsed as a name or hex value.
    #[error("`{0}` is not a recognized color")]
    InvalidColor(String),

    /// The referenced object is not (or no longer) registered.
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),

    /// No figure available to attach to.
    #[error("no current figure")]
    NoFigure,

    /// No axes available to attach to.
    #[error("no current axes")]
    NoAxes,
}

pub type Result<T> = std::result::Result<T, Error>;

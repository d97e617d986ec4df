//! Colors and the session palette.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Near-black default stroke color.
    pub const INK: Color = Color::rgb(0x11, 0x11, 0x11);
    /// Near-white default background color.
    pub const PAPER: Color = Color::rgb(0xee, 0xee, 0xee);
    pub const RED: Color = Color::rgb(0xff, 0x00, 0x00);
    pub const GREEN: Color = Color::rgb(0x00, 0x80, 0x00);
    pub const BLUE: Color = Color::rgb(0x00, 0x00, 0xff);

    /// Hex representation, `#rrggbb` or `#rrggbbaa` when translucent.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

fn named(s: &str) -> Option<Color> {
    let c = match s {
        "k" | "black" => Color::rgb(0x00, 0x00, 0x00),
        "w" | "white" => Color::rgb(0xff, 0xff, 0xff),
        "r" | "red" => Color::RED,
        "g" | "green" => Color::GREEN,
        "b" | "blue" => Color::BLUE,
        "c" | "cyan" => Color::rgb(0x00, 0xbf, 0xbf),
        "m" | "magenta" => Color::rgb(0xbf, 0x00, 0xbf),
        "y" | "yellow" => Color::rgb(0xbf, 0xbf, 0x00),
        "crimson" => Color::rgb(0xdc, 0x14, 0x3c),
        "dimgray" | "dimgrey" => Color::rgb(0x69, 0x69, 0x69),
        "whitesmoke" => Color::rgb(0xf5, 0xf5, 0xf5),
        "dodgerblue" => Color::rgb(0x1e, 0x90, 0xff),
        "lightgreen" => Color::rgb(0x90, 0xee, 0x90),
        _ => return None,
    };
    Some(c)
}

fn hex_byte(s: &str) -> Option<u8> {
    u8::from_str_radix(s, 16).ok()
}

impl FromStr for Color {
    type Err = Error;

    /// Parses a named color or a `#rrggbb` / `#rrggbbaa` hex string.
    fn from_str(s: &str) -> Result<Self, Error> {
        if let Some(c) = named(s) {
            return Ok(c);
        }
        if let Some(hex) = s.strip_prefix('#') {
            let parsed = match hex.len() {
                6 => Some(Color::rgb(
                    hex_byte(&hex[0..2]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                    hex_byte(&hex[2..4]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                    hex_byte(&hex[4..6]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                )),
                8 => Some(Color::rgba(
                    hex_byte(&hex[0..2]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                    hex_byte(&hex[2..4]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                    hex_byte(&hex[4..6]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                    hex_byte(&hex[6..8]).ok_or_else(|| Error::InvalidColor(s.into()))?,
                )),
                _ => None,
            };
            if let Some(c) = parsed {
                return Ok(c);
            }
        }
        Err(Error::InvalidColor(s.into()))
    }
}

/// Append-only, deduplicated list of colors shared by a session.
///
/// Shapes cycle through the palette when the user asks for "the next
/// color"; the first entry doubles as the fallback for unrecognized
/// color strings.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: vec![
                Color::INK,
                Color::RED,
                Color::BLUE,
                Color::GREEN,
                Color::PAPER,
            ],
        }
    }
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        let mut palette = Self { colors: Vec::new() };
        for c in colors {
            palette.add(c);
        }
        palette
    }

    /// Appends a color unless it is already present.
    pub fn add(&mut self, color: Color) {
        if !self.colors.contains(&color) {
            self.colors.push(color);
        }
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn default_color(&self) -> Color {
        self.colors.first().copied().unwrap_or(Color::INK)
    }

    /// Resolves an optional color string. Unrecognized strings warn and
    /// fall back to the default entry; parsed colors are added to the
    /// palette so cycling can reach them.
    pub fn resolve(&mut self, name: Option<&str>) -> Color {
        match name {
            None => self.default_color(),
            Some(s) => match s.parse::<Color>() {
                Ok(c) => {
                    self.add(c);
                    c
                }
                Err(_) => {
                    log::warn!("unrecognized color `{s}`, using default");
                    self.default_color()
                }
            },
        }
    }

    /// The palette entry `steps` positions after `color`, cycling.
    /// Colors not in the palette shift from the start.
    pub fn shifted(&self, color: Color, steps: isize) -> Color {
        if self.colors.is_empty() {
            return color;
        }
        let len = self.colors.len() as isize;
        let pos = self
            .colors
            .iter()
            .position(|&c| c == color)
            .unwrap_or(0) as isize;
        let idx = (pos + steps).rem_euclid(len) as usize;
        self.colors[idx]
    }
}

/*
    MartyPC
    https://github.com/dbalsom/martypc

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    videocard.rs

    Defines the VideoCard trait and the types shared between the video
    controller and its hosts.

*/

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;

/// The monitor type a surface is rendered for.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, EnumIter, Serialize, Deserialize)]
pub enum DisplayKind {
    #[default]
    Rgb,
    Composite,
}

impl DisplayKind {
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            DisplayKind::Rgb => 0,
            DisplayKind::Composite => 1,
        }
    }
}

impl FromStr for DisplayKind {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String>
    where
        Self: Sized,
    {
        match s.to_ascii_lowercase().as_str() {
            "rgb" => Ok(DisplayKind::Rgb),
            "composite" | "cmp" => Ok(DisplayKind::Composite),
            _ => Err(format!("Bad value for display kind: {}", s)),
        }
    }
}

impl fmt::Display for DisplayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayKind::Rgb => write!(f, "RGB"),
            DisplayKind::Composite => write!(f, "Composite"),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderResult {
    /// Nothing changed since the last render; the surface is untouched.
    Unchanged,
    Rendered,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FrameResult {
    pub ticks: u32,
    /// False if the frame was aborted by the tick cap.
    pub completed: bool,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayExtents {
    pub field_w: u32,
    pub field_h: u32,
    /// Number of scanlines produced by the last frame.
    pub visible_h: u32,
    pub double_scan: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum VideoCardStateEntry {
    Value8(u8),
    Value16(u16),
    Value32(u32),
    String(String),
    Color(String, u8, u8, u8),
}

impl fmt::Display for VideoCardStateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoCardStateEntry::Value8(v) => write!(f, "{:02X}", v),
            VideoCardStateEntry::Value16(v) => write!(f, "{:04X}", v),
            VideoCardStateEntry::Value32(v) => write!(f, "{:08X}", v),
            VideoCardStateEntry::String(s) => write!(f, "{}", s),
            VideoCardStateEntry::Color(s, r, g, b) => write!(f, "{} #{:02X}{:02X}{:02X}", s, r, g, b),
        }
    }
}

pub type VideoCardState = BTreeMap<String, Vec<(String, VideoCardStateEntry)>>;

pub trait VideoCard {
    /// Return the dimensions of the output surface.
    fn get_display_extents(&self) -> DisplayExtents;

    /// Render the surface for the given monitor type if anything changed since the last render.
    fn render(&mut self, kind: DisplayKind) -> RenderResult;

    /// Return the most recently rendered surface for the given monitor type, as 0x00RRGGBB.
    fn display_buf(&self, kind: DisplayKind) -> &[u32];

    /// Return a snapshot of internal registers for debug display.
    fn get_videocard_string_state(&self) -> VideoCardState;
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_display_kind_from_str() {
        assert_eq!("rgb".parse::<DisplayKind>(), Ok(DisplayKind::Rgb));
        assert_eq!("Composite".parse::<DisplayKind>(), Ok(DisplayKind::Composite));
        assert!("vga".parse::<DisplayKind>().is_err());
    }

    #[test]
    fn test_display_kind_indices_are_distinct() {
        let indices: Vec<usize> = DisplayKind::iter().map(|k| k.index()).collect();
        assert_eq!(indices, vec![0, 1]);
    }
}

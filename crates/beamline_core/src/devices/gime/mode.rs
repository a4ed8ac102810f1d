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

    devices::gime::mode.rs

    Decode captured mode registers into a line layout and a draw routine.

*/

use super::*;

pub const SIDE_BORDER_WIDTH: usize = 64;

/// Draw routine for one kind of line. Writes a full 640 pixel line.
pub type DecodeFn = fn(&ModeDescriptor, &LineContext, &mut [u32]);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ModeKind {
    TextWide { attrs: bool },
    TextNarrow { attrs: bool },
    Graphics { bpp: u8 },
    DirectDrive,
    Blank,
}

impl ModeKind {
    pub fn decoder(&self) -> DecodeFn {
        match self {
            ModeKind::TextWide { .. } => draw_text_wide,
            ModeKind::TextNarrow { .. } => draw_text_narrow,
            ModeKind::Graphics { bpp: 1 } => draw_gfx_1bpp,
            ModeKind::Graphics { bpp: 2 } => draw_gfx_2bpp,
            ModeKind::Graphics { .. } => draw_gfx_4bpp,
            ModeKind::DirectDrive => draw_gfx_direct,
            ModeKind::Blank => draw_blank,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ModeDescriptor {
    pub kind: ModeKind,
    /// Bytes of line data consumed.
    pub byte_count: usize,
    /// Character cells (text) or bytes (graphics) per line.
    pub chars: usize,
    /// Output pixels per dot (graphics) or per cell (text).
    pub pixel_width: usize,
    pub x_offset: usize,
    pub side_borders: bool,
}

/// Graphics modes by VRES bits 0-4: (bytes, bpp, pixel width)
fn graphics_mode(vres: u8) -> Option<(usize, u8, usize)> {
    let mode = match vres & 0x1F {
        0x00 => (16, 1, 4),
        0x01 => (16, 2, 8),
        0x02 => (16, 4, 16),
        0x04 => (20, 1, 4),
        0x05 => (20, 2, 8),
        0x06 => (20, 4, 16),
        0x08 => (32, 1, 2),
        0x09 => (32, 2, 4),
        0x0A => (32, 4, 8),
        0x0C => (40, 1, 2),
        0x0D => (40, 2, 4),
        0x0E => (40, 4, 8),
        0x10 => (64, 1, 1),
        0x11 => (64, 2, 2),
        0x12 => (64, 4, 4),
        0x14 => (80, 1, 1),
        0x15 => (80, 2, 2),
        0x16 => (80, 4, 4),
        0x19 => (128, 2, 1),
        0x1A => (128, 4, 2),
        0x1D => (160, 2, 1),
        0x1E => (160, 4, 2),
        _ => return None,
    };
    Some(mode)
}

impl ModeDescriptor {
    pub fn from_record(record: &ScanlineRecord) -> Self {
        let vmode = VideoModeRegister::from_bytes([record.vmode]);
        let side_borders = record.vres & 0x04 == 0;
        let x_offset = if side_borders { SIDE_BORDER_WIDTH } else { 0 };

        if vmode.graphics() {
            match graphics_mode(record.vres) {
                Some((bytes, bpp, pixel_width)) => ModeDescriptor {
                    kind: if bpp == 4 && vmode.direct_drive() {
                        ModeKind::DirectDrive
                    }
                    else {
                        ModeKind::Graphics { bpp }
                    },
                    byte_count: bytes,
                    chars: bytes,
                    pixel_width,
                    x_offset,
                    side_borders,
                },
                None => ModeDescriptor {
                    kind: ModeKind::Blank,
                    byte_count: 0,
                    chars: 0,
                    pixel_width: 0,
                    x_offset: 0,
                    side_borders: false,
                },
            }
        }
        else {
            let attrs = record.vres & 0x01 != 0;
            let wide = record.vres & 0x10 == 0;
            let chars = match (wide, side_borders) {
                (true, true) => 32,
                (true, false) => 40,
                (false, true) => 64,
                (false, false) => 80,
            };
            ModeDescriptor {
                kind: if wide {
                    ModeKind::TextWide { attrs }
                }
                else {
                    ModeKind::TextNarrow { attrs }
                },
                byte_count: chars * (1 + attrs as usize),
                chars,
                pixel_width: if wide { 16 } else { 8 },
                x_offset,
                side_borders,
            }
        }
    }

    /// Width in pixels of the active area.
    pub fn active_width(&self) -> usize {
        match self.kind {
            ModeKind::TextWide { .. } | ModeKind::TextNarrow { .. } => self.chars * self.pixel_width,
            ModeKind::Graphics { bpp } => self.chars * (8 / bpp as usize) * self.pixel_width,
            ModeKind::DirectDrive => self.chars * 2 * self.pixel_width,
            ModeKind::Blank => 0,
        }
    }
}

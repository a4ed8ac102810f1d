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

    devices::gime::draw.rs

    Line drawing routines for each text and graphics mode.

*/

use super::*;
use crate::devices::gime::{
    color::{resolve, resolve_direct, resolve_palette},
    tablegen::WIDE_GLYPH_TABLE,
};

pub const ATTR_UNDERLINE: u8 = 0b0100_0000;
pub const ATTR_BLINK: u8 = 0b1000_0000;

/// Everything a draw routine may look at. Colors come from the captured palette only.
pub struct LineContext<'a> {
    pub record: &'a ScanlineRecord,
    pub font: &'a Font,
    pub colors: [u32; 16],
    pub border: u32,
    pub kind: DisplayKind,
    pub monochrome: bool,
    pub blink: bool,
}

impl<'a> LineContext<'a> {
    pub fn new(record: &'a ScanlineRecord, font: &'a Font, kind: DisplayKind, blink: bool) -> Self {
        let monochrome = VideoModeRegister::from_bytes([record.vmode]).monochrome();
        Self {
            record,
            font,
            colors: resolve_palette(&record.palette, kind, monochrome),
            border: resolve(record.border, kind, monochrome),
            kind,
            monochrome,
            blink,
        }
    }
}

/// Glyph row that underlined characters fill, by VMODE lines per row. The 10 line setting
/// underlines row 8 like the 9 line setting does.
pub fn underline_row(vmode: u8) -> Option<u8> {
    match vmode & 0x07 {
        3 => Some(7),
        4 | 5 => Some(8),
        6 => Some(9),
        _ => None,
    }
}

/// Draw a full scanline: border lines are a solid fill, display lines are decoded.
pub fn render_line(ctx: &LineContext, display: bool, line: &mut [u32]) {
    if !display {
        line.fill(ctx.border);
        return;
    }
    let mode = ModeDescriptor::from_record(ctx.record);
    (mode.kind.decoder())(&mode, ctx, line);
    if mode.side_borders {
        draw_side_borders(ctx, line);
    }
}

pub fn draw_side_borders(ctx: &LineContext, line: &mut [u32]) {
    let width = line.len().min(GIME_DISPLAY_WIDTH);
    let right = width.saturating_sub(SIDE_BORDER_WIDTH);
    line[..SIDE_BORDER_WIDTH.min(width)].fill(ctx.border);
    line[right..width].fill(ctx.border);
}

pub fn draw_blank(_mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    line.fill(ctx.border);
}

/// Resolve the glyph row for one text cell, applying underline, blink and cursor.
#[inline]
fn text_cell(mode: &ModeDescriptor, ctx: &LineContext, attrs: bool, cell: usize) -> (u8, u32, u32) {
    let record = ctx.record;
    let (code, attr) = if attrs {
        (record.data[cell * 2], record.data[cell * 2 + 1])
    }
    else {
        (record.data[cell], 0)
    };

    let (bg, fg) = if attrs {
        (ctx.colors[(attr & 0x07) as usize], ctx.colors[8 + ((attr >> 3) & 0x07) as usize])
    }
    else {
        (ctx.colors[0], ctx.colors[1])
    };

    let mut glyph = ctx.font.row(code, record.index);
    if attrs {
        if attr & ATTR_UNDERLINE != 0 && underline_row(record.vmode) == Some(record.index) {
            glyph = 0xFF;
        }
        if attr & ATTR_BLINK != 0 && ctx.blink {
            glyph = 0;
        }
    }
    if record.cursor.map(|c| c as usize) == Some(cell) && cell < mode.chars {
        glyph = 0xFF;
    }
    (glyph, fg, bg)
}

fn text_attrs(mode: &ModeDescriptor) -> bool {
    matches!(
        mode.kind,
        ModeKind::TextWide { attrs: true } | ModeKind::TextNarrow { attrs: true }
    )
}

/// 32 and 40 column text. Each glyph dot is two pixels wide.
pub fn draw_text_wide(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    let attrs = text_attrs(mode);
    for (cell, out) in line[mode.x_offset..].chunks_exact_mut(16).take(mode.chars).enumerate() {
        let (glyph, fg, bg) = text_cell(mode, ctx, attrs, cell);
        let wide = WIDE_GLYPH_TABLE[glyph as usize];
        for (i, px) in out.iter_mut().enumerate() {
            *px = if wide & (0x8000 >> i) != 0 { fg } else { bg };
        }
    }
}

/// 64 and 80 column text.
pub fn draw_text_narrow(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    let attrs = text_attrs(mode);
    for (cell, out) in line[mode.x_offset..].chunks_exact_mut(8).take(mode.chars).enumerate() {
        let (glyph, fg, bg) = text_cell(mode, ctx, attrs, cell);
        for (i, px) in out.iter_mut().enumerate() {
            *px = if glyph & (0x80 >> i) != 0 { fg } else { bg };
        }
    }
}

/// Expand packed pixels, most significant first, through the captured palette.
#[inline]
fn draw_packed<const BPP: usize>(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    let per_byte = 8 / BPP;
    let mask = (1u8 << BPP) - 1;
    let pw = mode.pixel_width;
    let data = &ctx.record.data[..mode.byte_count];
    for (byte, out) in data.iter().zip(line[mode.x_offset..].chunks_exact_mut(pw * per_byte)) {
        for (p, span) in out.chunks_exact_mut(pw).enumerate() {
            let idx = (*byte >> (8 - BPP * (p + 1))) & mask;
            span.fill(ctx.colors[idx as usize]);
        }
    }
}

pub fn draw_gfx_1bpp(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    draw_packed::<1>(mode, ctx, line)
}

pub fn draw_gfx_2bpp(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    draw_packed::<2>(mode, ctx, line)
}

pub fn draw_gfx_4bpp(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    draw_packed::<4>(mode, ctx, line)
}

/// 4bpp direct drive. Each nibble drives the DAC as IRGB without going through the palette.
pub fn draw_gfx_direct(mode: &ModeDescriptor, ctx: &LineContext, line: &mut [u32]) {
    let pw = mode.pixel_width;
    let data = &ctx.record.data[..mode.byte_count];
    for (byte, out) in data.iter().zip(line[mode.x_offset..].chunks_exact_mut(pw * 2)) {
        let (left, right) = out.split_at_mut(pw);
        left.fill(resolve_direct(*byte >> 4, ctx.kind, ctx.monochrome));
        right.fill(resolve_direct(*byte & 0x0F, ctx.kind, ctx.monochrome));
    }
}

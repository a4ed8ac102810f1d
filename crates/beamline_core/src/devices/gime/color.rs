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

    devices::gime::color.rs

    Resolve 6-bit palette values into host colors for the RGB and composite
    monitor types.

*/

use lazy_static::lazy_static;

use crate::{
    devices::gime::tablegen::{DIRECT_DRIVE_TABLE, RGB_TABLE},
    videocard::DisplayKind,
};

pub const DAC_MASK: u8 = 0x3F;

// Composite approximation constants.
const COMPOSITE_W: f64 = 0.4195456981879 * 1.01;
const COMPOSITE_SATURATION: f64 = 92.0;
const COMPOSITE_PHASES: [f64; 3] = [9.2, 14.2, 19.2];

lazy_static! {
    static ref COMPOSITE_TABLE: [u32; 64] = {
        let mut table = [0u32; 64];
        for (c, entry) in table.iter_mut().enumerate() {
            *entry = composite_entry(c);
        }
        table
    };
    static ref COMPOSITE_MONO_TABLE: [u32; 64] = {
        let mut table = [0u32; 64];
        for (entry, color) in table.iter_mut().zip(COMPOSITE_TABLE.iter()) {
            *entry = monochrome(*color);
        }
        table
    };
}

#[inline]
fn pack(r: u32, g: u32, b: u32) -> u32 {
    (r << 16) | (g << 8) | b
}

#[inline]
fn gray(v: u32) -> u32 {
    pack(v, v, v)
}

fn composite_entry(c: usize) -> u32 {
    match c {
        0 => 0,
        16 => gray(47),
        32 => gray(120),
        48 | 63 => gray(255),
        _ => {
            let band = (c / 16) as f64;
            let bri = -50.0 + (band + 1.0) * 70.0;
            let off = (c % 16) as f64 - 1.0 + band * 15.0;
            let [r, g, b] = COMPOSITE_PHASES.map(|phase| {
                let ch = (COMPOSITE_W * (off + phase)).cos() * COMPOSITE_SATURATION + bri;
                (ch as i32).clamp(0, 255) as u32
            });
            pack(r, g, b)
        }
    }
}

/// Replace a color with the unweighted average of its channels.
#[inline]
pub fn monochrome(color: u32) -> u32 {
    let (r, g, b) = components(color);
    gray((r as u32 + g as u32 + b as u32) / 3)
}

#[inline]
pub fn components(color: u32) -> (u8, u8, u8) {
    ((color >> 16) as u8, (color >> 8) as u8, color as u8)
}

/// Resolve a 6-bit DAC value into 0x00RRGGBB for the given monitor type. The monochrome flag
/// only applies to composite output.
#[inline]
pub fn resolve(index: u8, kind: DisplayKind, monochrome: bool) -> u32 {
    let index = (index & DAC_MASK) as usize;
    match kind {
        DisplayKind::Rgb => RGB_TABLE[index],
        DisplayKind::Composite if monochrome => COMPOSITE_MONO_TABLE[index],
        DisplayKind::Composite => COMPOSITE_TABLE[index],
    }
}

/// Resolve a direct drive IRGB nibble, bypassing the palette.
#[inline]
pub fn resolve_direct(nibble: u8, kind: DisplayKind, monochrome: bool) -> u32 {
    resolve(DIRECT_DRIVE_TABLE[(nibble & 0x0F) as usize], kind, monochrome)
}

/// Resolve all 16 entries of a captured palette at once.
pub fn resolve_palette(palette: &[u8; 16], kind: DisplayKind, monochrome: bool) -> [u32; 16] {
    palette.map(|p| resolve(p, kind, monochrome))
}

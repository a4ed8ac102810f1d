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

    devices::gime::tablegen.rs

    Constant tables for the color DAC, direct drive and wide character
    drawing.

*/

/// Constant initializer for the RGB monitor DAC. Each 6-bit index carries two bits per channel,
/// laid out as R1 G1 B1 R0 G0 B0, which are replicated into 8-bit channels.
pub const RGB_TABLE: [u32; 64] = {
    let mut table: [u32; 64] = [0; 64];
    let mut i: usize = 0;
    while i < 64 {
        let r = (((i >> 4) & 2) | ((i >> 2) & 1)) as u32 * 0x55;
        let g = (((i >> 3) & 2) | ((i >> 1) & 1)) as u32 * 0x55;
        let b = (((i >> 2) & 2) | (i & 1)) as u32 * 0x55;
        table[i] = (r << 16) | (g << 8) | b;
        i += 1;
    }
    table
};

/// Map a direct drive IRGB nibble to a DAC index. Intensity sets the low bit of every channel.
pub const DIRECT_DRIVE_TABLE: [u8; 16] = {
    let mut table: [u8; 16] = [0; 16];
    let mut n: usize = 0;
    while n < 16 {
        let i = (n >> 3) & 1;
        let r = (n >> 2) & 1;
        let g = (n >> 1) & 1;
        let b = n & 1;
        table[n] = ((r << 5) | (g << 4) | (b << 3) | (if i != 0 { 0b111 } else { 0 })) as u8;
        n += 1;
    }
    table
};

/// Unpack every 8-bit glyph row into 16 dots, each source dot doubled. Bit 15 is the leftmost dot.
pub const WIDE_GLYPH_TABLE: [u16; 256] = {
    let mut table: [u16; 256] = [0; 256];
    let mut glyph: usize = 0;
    while glyph < 256 {
        let mut wide: u16 = 0;
        let mut bit = 0;
        while bit < 8 {
            if glyph & (0x80 >> bit) != 0 {
                wide |= 0xC000 >> (bit * 2);
            }
            bit += 1;
        }
        table[glyph] = wide;
        glyph += 1;
    }
    table
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_table_extremes() {
        assert_eq!(RGB_TABLE[0], 0x000000);
        assert_eq!(RGB_TABLE[63], 0xFFFFFF);
        // R1 only
        assert_eq!(RGB_TABLE[0b100000], 0xAA0000);
        // R0 only
        assert_eq!(RGB_TABLE[0b000100], 0x550000);
    }

    #[test]
    fn test_direct_drive_table() {
        assert_eq!(DIRECT_DRIVE_TABLE[0x0], 0);
        assert_eq!(DIRECT_DRIVE_TABLE[0xF], 63);
        assert_eq!(DIRECT_DRIVE_TABLE[0x8], 0b000111);
        assert_eq!(DIRECT_DRIVE_TABLE[0x4], 0b100000);
    }

    #[test]
    fn test_wide_glyph_table() {
        assert_eq!(WIDE_GLYPH_TABLE[0x00], 0x0000);
        assert_eq!(WIDE_GLYPH_TABLE[0xFF], 0xFFFF);
        assert_eq!(WIDE_GLYPH_TABLE[0x80], 0xC000);
        assert_eq!(WIDE_GLYPH_TABLE[0x81], 0xC003);
    }
}

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

    devices::gime::font.rs

    Character generator font for text modes.

*/

use std::path::Path;

use thiserror::Error;

pub const FONT_GLYPHS: usize = 128;
pub const FONT_ROWS: usize = 8;
pub const FONT_SIZE: usize = FONT_GLYPHS * FONT_ROWS;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Font image must be 1024 bytes, got {0}")]
    BadSize(usize),
    #[error("Failed to read font image: {0}")]
    Io(#[from] std::io::Error),
}

/// A 128 glyph font, 8 rows per glyph. The most significant bit of a row is the leftmost dot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Font {
    glyphs: Box<[[u8; FONT_ROWS]; FONT_GLYPHS]>,
}

impl Default for Font {
    fn default() -> Self {
        Self::blank()
    }
}

impl Font {
    pub fn blank() -> Self {
        Self {
            glyphs: Box::new([[0; FONT_ROWS]; FONT_GLYPHS]),
        }
    }

    /// Build a font from a raw 1024 byte image, glyph-major.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FontError> {
        if bytes.len() != FONT_SIZE {
            return Err(FontError::BadSize(bytes.len()));
        }
        let mut font = Self::blank();
        for (glyph, rows) in font.glyphs.iter_mut().zip(bytes.chunks_exact(FONT_ROWS)) {
            glyph.copy_from_slice(rows);
        }
        Ok(font)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, FontError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// Return the glyph row for a character code. Codes are 7 bits; rows past the glyph are blank.
    #[inline]
    pub fn row(&self, code: u8, row: u8) -> u8 {
        let row = row as usize;
        if row < FONT_ROWS {
            self.glyphs[(code & 0x7F) as usize][row]
        }
        else {
            0
        }
    }

    pub fn set_glyph(&mut self, code: u8, rows: [u8; FONT_ROWS]) {
        self.glyphs[(code & 0x7F) as usize] = rows;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_from_bytes() {
        let mut image = vec![0u8; FONT_SIZE];
        image[0x41 * FONT_ROWS] = 0x18;
        image[0x41 * FONT_ROWS + 7] = 0x7E;
        let font = Font::from_bytes(&image).unwrap();

        assert_eq!(font.row(0x41, 0), 0x18);
        assert_eq!(font.row(0x41, 7), 0x7E);
        // Bit 7 of the code is ignored
        assert_eq!(font.row(0xC1, 0), 0x18);
        // Rows past the glyph are blank
        assert_eq!(font.row(0x41, 8), 0);
        assert_eq!(font.row(0x41, 11), 0);
    }

    #[test]
    fn test_font_bad_size() {
        let err = Font::from_bytes(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, FontError::BadSize(100)));
    }
}

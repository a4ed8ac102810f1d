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

    devices::gime::capture.rs

    Per-scanline capture of video registers, palette and memory.
    
    Rendering never looks at live register state. Everything needed to draw
    a line is copied here at the end of the line's horizontal sync, so that
    register writes made later in the frame cannot reach back into lines
    already produced.

*/

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::*;
use crate::bus::VideoMemory;

pub const LINE_DATA_SIZE: usize = 160;
pub const VIDEO_PAGE_SIZE: usize = 256;
pub const VIDEO_ADDRESS_MASK: usize = 0x7FFFF;
/// 19 bit address plus the two VBANK bits.
pub const VIDEO_SPACE_MASK: usize = 0x1FFFFF;

/// Lines per character row by VMODE bits 0-2. None never advances the row.
pub const LINES_PER_ROW: [Option<u8>; 8] = [Some(1), Some(1), Some(2), Some(8), Some(9), Some(10), Some(11), None];

const GFX_BYTES_PER_ROW: [usize; 8] = [16, 20, 32, 40, 64, 80, 128, 160];

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanlineRecord {
    pub vmode: u8,
    pub vres: u8,
    pub border: u8,
    /// Row within the character cell.
    pub index: u8,
    pub palette: [u8; 16],
    #[serde_as(as = "[_; LINE_DATA_SIZE]")]
    pub data: [u8; LINE_DATA_SIZE],
    /// Column of the cursor cell on this line, if any.
    pub cursor: Option<u8>,
}

impl Default for ScanlineRecord {
    fn default() -> Self {
        Self {
            vmode: 0,
            vres: 0,
            border: 0,
            index: 0,
            palette: [0; 16],
            data: [0; LINE_DATA_SIZE],
            cursor: None,
        }
    }
}

impl ScanlineRecord {
    /// Return a copy with the register and palette bytes masked to their implemented bits.
    pub fn masked(mut self) -> Self {
        self.vres &= 0x7F;
        self.border &= PALETTE_MASK;
        for entry in self.palette.iter_mut() {
            *entry &= PALETTE_MASK;
        }
        self
    }
}

/// Per-frame values latched at frame start, and the rolling address state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSetup {
    pub legacy: bool,
    pub top_border: u32,
    pub display_lines: u32,
    pub field_sync_line: u32,
    pub base: usize,
    pub position: usize,
    pub line_in_row: u8,
    pub double_phase: bool,
    pub scanline: u32,
}

impl FrameSetup {
    /// Return a copy with addresses confined to video memory and line counts to the record buffer.
    pub fn clamped(self) -> Self {
        let max_lines = MAX_SCANLINES as u32;
        Self {
            top_border: self.top_border.min(max_lines),
            display_lines: self.display_lines.min(max_lines),
            field_sync_line: self.field_sync_line.min(max_lines),
            base: self.base & VIDEO_SPACE_MASK,
            position: self.position & VIDEO_SPACE_MASK,
            scanline: self.scanline.min(max_lines),
            ..self
        }
    }

    #[inline]
    pub fn in_display(&self, scanline: u32) -> bool {
        scanline >= self.top_border && scanline - self.top_border < self.display_lines
    }
}

/// Number of bytes the row address advances by at the end of a character row.
pub fn bytes_per_row(regs: &GimeRegisters) -> usize {
    if regs.hoffset().virtual_screen() {
        return VIDEO_PAGE_SIZE;
    }
    if regs.vmode().graphics() {
        GFX_BYTES_PER_ROW[regs.vres().horiz_res() as usize]
    }
    else {
        let mut bytes = 32;
        if regs.vres & 0x04 != 0 {
            bytes += 8;
        }
        if regs.vres & 0x10 != 0 {
            bytes *= 2;
        }
        if regs.vres & 0x01 != 0 {
            bytes *= 2;
        }
        bytes
    }
}

impl GimeVideo {
    /// Capture the next scanline of the frame.
    pub(crate) fn prepare_scanline<M: VideoMemory + ?Sized>(&mut self, mem: &M) {
        let scanline = self.frame.scanline;
        self.frame.scanline += 1;
        if scanline as usize >= MAX_SCANLINES {
            return;
        }

        let mut record = self.records[scanline as usize].clone();
        record.vmode = self.regs.vmode;
        record.vres = self.regs.vres;
        record.border = self.regs.border;

        if self.frame.in_display(scanline) {
            record.index = self.frame.line_in_row;
            record.palette = self.palette;
            self.copy_line_data(mem, &mut record.data);
            record.cursor = self.cursor_column(&record);
            self.advance_row();
        }
        else {
            record.index = 0;
        }

        if record != self.records[scanline as usize] {
            log::trace!("Scanline {} changed", scanline);
            self.records[scanline as usize] = record;
            self.set_all_dirty();
        }
    }

    /// Copy one line of video memory, wrapping within the 256 byte page at the horizontal offset.
    fn copy_line_data<M: VideoMemory + ?Sized>(&self, mem: &M, data: &mut [u8; LINE_DATA_SIZE]) {
        let position = self.frame.position;
        let bank = self.frame.base & !VIDEO_ADDRESS_MASK;
        let offset = self.regs.hoffset().offset() as usize * 2;
        let seg = (VIDEO_PAGE_SIZE - offset).min(LINE_DATA_SIZE);

        let (first, second) = data.split_at_mut(seg);
        for (i, byte) in first.iter_mut().enumerate() {
            *byte = mem.read_byte(((position + offset + i) & VIDEO_ADDRESS_MASK) | bank);
        }
        for (i, byte) in second.iter_mut().enumerate() {
            *byte = mem.read_byte(((position + i) & VIDEO_ADDRESS_MASK) | bank);
        }
    }

    /// Return the column of the cursor on this line, if the cursor falls within it.
    fn cursor_column(&self, record: &ScanlineRecord) -> Option<u8> {
        let mode = ModeDescriptor::from_record(record);
        let cell_bytes = match mode.kind {
            ModeKind::TextWide { attrs } | ModeKind::TextNarrow { attrs } => 1 + attrs as usize,
            _ => return None,
        };
        if !self.crtc.cursor_visible() {
            return None;
        }
        let (start, end) = self.crtc.cursor_extents();
        if record.index < start || record.index > end {
            return None;
        }
        let row_cell = (self.frame.position.wrapping_sub(self.frame.base) & VIDEO_ADDRESS_MASK) / cell_bytes;
        let cursor_cell = self.crtc.cursor_address() as usize;
        if cursor_cell >= row_cell && cursor_cell < row_cell + mode.chars {
            Some((cursor_cell - row_cell) as u8)
        }
        else {
            None
        }
    }

    /// Step the row-within-character counter and advance the row address at the end of a row.
    fn advance_row(&mut self) {
        let vmode = self.regs.vmode();
        if vmode.double_height() {
            self.frame.double_phase = !self.frame.double_phase;
            if self.frame.double_phase {
                return;
            }
        }
        self.frame.line_in_row = self.frame.line_in_row.wrapping_add(1);
        if let Some(lines) = LINES_PER_ROW[vmode.lines_per_row() as usize] {
            if self.frame.line_in_row >= lines {
                self.frame.line_in_row = 0;
                self.frame.position = (self.frame.position + bytes_per_row(&self.regs)) & VIDEO_SPACE_MASK;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counting_memory() -> Vec<u8> {
        (0..MEMORY_SIZE_DEFAULT).map(|i| i as u8).collect()
    }

    #[test]
    fn test_bytes_per_row() {
        let mut regs = GimeRegisters::default();
        // 32 column text
        assert_eq!(bytes_per_row(&regs), 32);
        regs.vres = 0x15;
        assert_eq!(bytes_per_row(&regs), 160);
        regs.vres = 0x04;
        assert_eq!(bytes_per_row(&regs), 40);

        regs.vmode = 0x80;
        regs.vres = 0x1E;
        assert_eq!(bytes_per_row(&regs), 160);
        regs.vres = 0x09;
        assert_eq!(bytes_per_row(&regs), 32);

        regs.hoffset = 0x80;
        assert_eq!(bytes_per_row(&regs), 256);
    }

    #[test]
    fn test_two_segment_wrap() {
        let mem = counting_memory();
        let mut gime = GimeVideo::default();
        gime.write_register(VMODE_REGISTER, 0x80);
        gime.write_register(VRES_REGISTER, 0x1E);
        gime.write_register(HOFFSET_REGISTER, 0x70);
        gime.run_frame(&mem);
        gime.run_frame(&mem);

        let top = gime.frame.top_border as usize;
        let data = &gime.records[top].data;
        // 0x70 * 2 = 224, leaving 32 bytes before the page wraps
        for (i, byte) in data.iter().enumerate().take(32) {
            assert_eq!(*byte as usize, 224 + i);
        }
        for (i, byte) in data.iter().enumerate().skip(32) {
            assert_eq!(*byte as usize, i - 32);
        }
    }

    #[test]
    fn test_rows_advance_by_mode_stride() {
        let mem = counting_memory();
        let mut gime = GimeVideo::default();
        // 32 byte graphics rows, 2 lines per row
        gime.write_register(VMODE_REGISTER, 0x82);
        gime.write_register(VRES_REGISTER, 0x09);
        gime.run_frame(&mem);
        gime.run_frame(&mem);

        let top = gime.frame.top_border as usize;
        assert_eq!(gime.records[top].data[0], 0);
        assert_eq!(gime.records[top + 1].data[0], 0);
        assert_eq!(gime.records[top + 2].data[0], 32);
        assert_eq!(gime.records[top + 4].data[0], 64);
        assert_eq!(gime.records[top + 1].index, 1);
    }

    #[test]
    fn test_double_height_holds_index() {
        let mem = counting_memory();
        let mut gime = GimeVideo::default();
        // Text, 8 lines per row, double height
        gime.write_register(VMODE_REGISTER, 0x23);
        gime.run_frame(&mem);
        gime.run_frame(&mem);

        let top = gime.frame.top_border as usize;
        let indices: Vec<u8> = (top..top + 6).map(|sl| gime.records[sl].index).collect();
        assert_eq!(indices, vec![0, 0, 1, 1, 2, 2]);
        // A row of 8 double height lines spans 16 scanlines
        assert_eq!(gime.records[top + 15].data[0], 0);
        assert_eq!(gime.records[top + 16].data[0], 32);
    }

    #[test]
    fn test_vertical_offset_latched_at_frame_start() {
        let mem = counting_memory();
        let mut gime = GimeVideo::default();
        gime.write_register(VMODE_REGISTER, 0x80);
        gime.write_register(VRES_REGISTER, 0x1E);
        gime.run_frame(&mem);
        gime.run_frame(&mem);

        // A mid-frame write does not move the frame already in progress.
        gime.write_register(VOFFSET_LO_REGISTER, 0x02);
        let top = gime.frame.top_border;
        while gime.frame.scanline <= top {
            gime.tick(&mem);
        }
        assert_eq!(gime.records[top as usize].data[0], 0);

        gime.run_frame(&mem);
        gime.run_frame(&mem);
        assert_eq!(gime.records[top as usize].data[0], 16);
    }

    #[test]
    fn test_border_lines_reset_index() {
        let mem = counting_memory();
        let mut gime = GimeVideo::default();
        gime.write_register(VMODE_REGISTER, 0x03);
        gime.write_register(VSCROLL_REGISTER, 0x05);
        gime.run_frame(&mem);
        gime.run_frame(&mem);

        let top = gime.frame.top_border as usize;
        assert_eq!(gime.records[top - 1].index, 0);
        assert_eq!(gime.records[top].index, 5);
        assert_eq!(gime.records[top + 1].index, 6);
        assert_eq!(gime.records[top + 3].index, 0);
    }

    #[test]
    fn test_cursor_column_captured() {
        let mem = vec![0u8; MEMORY_SIZE_DEFAULT];
        let mut gime = GimeVideo::default();
        // 40 column text with attributes, 8 lines per row
        gime.write_register(VMODE_REGISTER, 0x03);
        gime.write_register(VRES_REGISTER, 0x05);
        gime.crtc.set_register(CrtcRegister::CursorStartLine, 0x06);
        gime.crtc.set_register(CrtcRegister::CursorEndLine, 0x07);
        // Second row, column 3
        gime.crtc.set_register(CrtcRegister::CursorAddressL, 43);
        gime.run_frame(&mem);
        gime.run_frame(&mem);

        let top = gime.frame.top_border as usize;
        assert_eq!(gime.records[top + 6].cursor, None);
        assert_eq!(gime.records[top + 8 + 5].cursor, None);
        assert_eq!(gime.records[top + 8 + 6].cursor, Some(3));
        assert_eq!(gime.records[top + 8 + 7].cursor, Some(3));
    }
}

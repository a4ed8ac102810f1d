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

    devices::gime::io.rs

    Register window decode for the video controller.

*/

use modular_bitfield::{bitfield, prelude::*};
use serde::{Deserialize, Serialize};

use super::*;
use crate::bus::{IoDevice, NO_IO_BYTE};

pub const GIME_REGISTER_WINDOW: u16 = 0x20;

pub const CRTC_ADDRESS_REGISTER: u16 = 0x00;
pub const CRTC_DATA_REGISTER: u16 = 0x01;
pub const INIT0_REGISTER: u16 = 0x02;
pub const VBANK_REGISTER: u16 = 0x03;
pub const VMODE_REGISTER: u16 = 0x08;
pub const VRES_REGISTER: u16 = 0x09;
pub const BORDER_REGISTER: u16 = 0x0A;
pub const VSCROLL_REGISTER: u16 = 0x0C;
pub const VOFFSET_HI_REGISTER: u16 = 0x0D;
pub const VOFFSET_LO_REGISTER: u16 = 0x0E;
pub const HOFFSET_REGISTER: u16 = 0x0F;
pub const PALETTE_BASE: u16 = 0x10;

pub const PALETTE_MASK: u8 = 0x3F;
pub const INIT0_LEGACY: u8 = 0b1000_0000;
const VBANK_MASK: u8 = 0x03;
const VRES_MASK: u8 = 0x7F;
const VSCROLL_MASK: u8 = 0x0F;

#[bitfield]
#[derive(Copy, Clone)]
pub struct VideoModeRegister {
    pub lines_per_row: B3,
    pub h50: bool,
    pub monochrome: bool,
    pub double_height: bool,
    pub direct_drive: bool,
    pub graphics: bool,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct VideoResolutionRegister {
    pub color_res: B2,
    pub horiz_res: B3,
    pub vert_res: B2,
    #[skip]
    unused: bool,
}

#[bitfield]
#[derive(Copy, Clone)]
pub struct HOffsetRegister {
    pub offset: B7,
    pub virtual_screen: bool,
}

/// Raw register values as last written. Decoded views are built on demand.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GimeRegisters {
    pub init0: u8,
    pub vbank: u8,
    pub vmode: u8,
    pub vres: u8,
    pub border: u8,
    pub vscroll: u8,
    pub voffset_hi: u8,
    pub voffset_lo: u8,
    pub hoffset: u8,
}

impl GimeRegisters {
    #[inline]
    pub fn vmode(&self) -> VideoModeRegister {
        VideoModeRegister::from_bytes([self.vmode])
    }
    #[inline]
    pub fn vres(&self) -> VideoResolutionRegister {
        VideoResolutionRegister::from_bytes([self.vres])
    }
    #[inline]
    pub fn hoffset(&self) -> HOffsetRegister {
        HOffsetRegister::from_bytes([self.hoffset])
    }
    #[inline]
    pub fn legacy(&self) -> bool {
        self.init0 & INIT0_LEGACY != 0
    }

    /// Return a copy with every register masked to its implemented bits.
    pub fn masked(self) -> Self {
        Self {
            vbank: self.vbank & VBANK_MASK,
            vres: self.vres & VRES_MASK,
            border: self.border & PALETTE_MASK,
            vscroll: self.vscroll & VSCROLL_MASK,
            ..self
        }
    }

    /// Video base address as latched at the start of a frame.
    pub fn video_base(&self) -> usize {
        (self.voffset_lo as usize * 8) | (self.voffset_hi as usize * 0x800) | ((self.vbank & 0x03) as usize * 0x80000)
    }
}

impl GimeVideo {
    /// Handle a write to the register window. Unknown offsets are ignored and values are masked.
    pub fn write_register(&mut self, offset: u16, data: u8) {
        match offset {
            CRTC_ADDRESS_REGISTER => self.crtc.select_register(data),
            CRTC_DATA_REGISTER => self.crtc.write_register(data),
            INIT0_REGISTER => self.regs.init0 = data,
            VBANK_REGISTER => self.regs.vbank = data & VBANK_MASK,
            VMODE_REGISTER => self.regs.vmode = data,
            VRES_REGISTER => self.regs.vres = data & VRES_MASK,
            BORDER_REGISTER => self.regs.border = data & PALETTE_MASK,
            VSCROLL_REGISTER => self.regs.vscroll = data & VSCROLL_MASK,
            VOFFSET_HI_REGISTER => self.regs.voffset_hi = data,
            VOFFSET_LO_REGISTER => self.regs.voffset_lo = data,
            HOFFSET_REGISTER => self.regs.hoffset = data,
            PALETTE_BASE..=0x1F => self.write_palette((offset - PALETTE_BASE) as u8, data),
            _ => {
                log::trace!("Write to unhandled register offset {:02X} ignored", offset);
                return;
            }
        }
        log::debug!("Register write [{:02X}] <- {:02X}", offset, data);
    }

    pub fn read_register(&mut self, offset: u16) -> u8 {
        match offset {
            CRTC_DATA_REGISTER => self.crtc.read_register(),
            INIT0_REGISTER => self.regs.init0,
            VBANK_REGISTER => self.regs.vbank,
            VMODE_REGISTER => self.regs.vmode,
            VRES_REGISTER => self.regs.vres,
            BORDER_REGISTER => self.regs.border,
            VSCROLL_REGISTER => self.regs.vscroll,
            VOFFSET_HI_REGISTER => self.regs.voffset_hi,
            VOFFSET_LO_REGISTER => self.regs.voffset_lo,
            HOFFSET_REGISTER => self.regs.hoffset,
            PALETTE_BASE..=0x1F => self.read_palette((offset - PALETTE_BASE) as u8),
            _ => NO_IO_BYTE,
        }
    }

    pub fn write_palette(&mut self, index: u8, value: u8) {
        self.palette[(index & 0x0F) as usize] = value & PALETTE_MASK;
    }

    pub fn read_palette(&self, index: u8) -> u8 {
        self.palette[(index & 0x0F) as usize]
    }
}

impl IoDevice for GimeVideo {
    fn read_u8(&mut self, offset: u16) -> u8 {
        self.read_register(offset)
    }

    fn write_u8(&mut self, offset: u16, data: u8) {
        self.write_register(offset, data)
    }

    fn port_list(&self) -> Vec<(String, u16)> {
        let mut ports = vec![
            (String::from("CRTC Address"), CRTC_ADDRESS_REGISTER),
            (String::from("CRTC Data"), CRTC_DATA_REGISTER),
            (String::from("INIT0"), INIT0_REGISTER),
            (String::from("Video Bank"), VBANK_REGISTER),
            (String::from("Video Mode"), VMODE_REGISTER),
            (String::from("Video Resolution"), VRES_REGISTER),
            (String::from("Border Color"), BORDER_REGISTER),
            (String::from("Vertical Scroll"), VSCROLL_REGISTER),
            (String::from("Vertical Offset High"), VOFFSET_HI_REGISTER),
            (String::from("Vertical Offset Low"), VOFFSET_LO_REGISTER),
            (String::from("Horizontal Offset"), HOFFSET_REGISTER),
        ];
        ports.extend((0..16u16).map(|i| (format!("Palette {}", i), PALETTE_BASE + i)));
        ports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mc6845::CrtcRegister;

    #[test]
    fn test_palette_masking() {
        let mut gime = GimeVideo::default();
        for i in 0..16u8 {
            for v in [0x00, 0x15, 0x3F, 0x40, 0xC7, 0xFF] {
                gime.write_palette(i, v);
                assert_eq!(gime.read_palette(i), v & 0x3F);
                gime.write_register(PALETTE_BASE + i as u16, v ^ 0x2A);
                assert_eq!(gime.read_register(PALETTE_BASE + i as u16), (v ^ 0x2A) & 0x3F);
            }
        }
        // Index is masked to 4 bits
        gime.write_palette(0x13, 0x21);
        assert_eq!(gime.read_palette(0x03), 0x21);
    }

    #[test]
    fn test_unknown_offsets() {
        let mut gime = GimeVideo::default();
        let before = gime.regs;
        for offset in [0x04, 0x05, 0x06, 0x07, 0x0B, 0x20, 0x7F] {
            gime.write_register(offset, 0x5A);
            assert_eq!(gime.read_register(offset), NO_IO_BYTE);
        }
        assert_eq!(gime.regs, before);
    }

    #[test]
    fn test_register_masks() {
        let mut gime = GimeVideo::default();
        gime.write_register(BORDER_REGISTER, 0xFF);
        gime.write_register(VSCROLL_REGISTER, 0xFF);
        gime.write_register(VBANK_REGISTER, 0xFF);
        assert_eq!(gime.read_register(BORDER_REGISTER), 0x3F);
        assert_eq!(gime.read_register(VSCROLL_REGISTER), 0x0F);
        assert_eq!(gime.read_register(VBANK_REGISTER), 0x03);
    }

    #[test]
    fn test_crtc_indirect_access() {
        let mut gime = GimeVideo::default();
        gime.write_register(CRTC_ADDRESS_REGISTER, 14);
        gime.write_register(CRTC_DATA_REGISTER, 0x12);
        gime.write_register(CRTC_ADDRESS_REGISTER, 15);
        gime.write_register(CRTC_DATA_REGISTER, 0x34);
        assert_eq!(gime.crtc.cursor_address(), 0x1234);
        assert_eq!(gime.read_register(CRTC_DATA_REGISTER), 0x34);

        gime.write_register(CRTC_ADDRESS_REGISTER, 4);
        gime.write_register(CRTC_DATA_REGISTER, 0xFF);
        assert_eq!(gime.crtc.register(CrtcRegister::VerticalTotal), 0x7F);
    }

    #[test]
    fn test_decoded_views() {
        let regs = GimeRegisters {
            vmode: 0b1110_0011,
            vres: 0b0101_1110,
            hoffset: 0x85,
            voffset_hi: 0x01,
            voffset_lo: 0x02,
            vbank: 0x02,
            ..Default::default()
        };
        let vmode = regs.vmode();
        assert!(vmode.graphics());
        assert!(vmode.direct_drive());
        assert!(vmode.double_height());
        assert!(!vmode.monochrome());
        assert_eq!(vmode.lines_per_row(), 3);

        let vres = regs.vres();
        assert_eq!(vres.vert_res(), 2);
        assert_eq!(vres.horiz_res(), 7);
        assert_eq!(vres.color_res(), 2);

        assert!(regs.hoffset().virtual_screen());
        assert_eq!(regs.hoffset().offset(), 5);
        assert_eq!(regs.video_base(), 0x10 | 0x800 | 0x100000);
    }
}

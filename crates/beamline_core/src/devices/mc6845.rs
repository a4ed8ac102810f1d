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

    devices::mc6845.rs

    Implementation of the Motorola MC6845 CRT controller, used as the timing
    generator of the video controller. The CRTC is ticked once per character
    clock and reports sync, display enable and row address edges as an
    explicit status value rather than through callbacks.

*/

use serde::{Deserialize, Serialize};

use crate::tracelogger::TraceLogger;

pub const CRTC_REGISTER_COUNT: usize = 18;
pub const DEFAULT_CHAR_WIDTH: u32 = 8;

const REGISTER_UNREADABLE_VALUE: u8 = 0x00;
const CRTC_ADDRESS_MASK: u8 = 0x1F;
const CRTC_MA_MASK: u16 = 0x3FFF;
const CRTC_ROW_MASK: u8 = 0x7F;
const CRTC_RA_MASK: u8 = 0x1F;
const CURSOR_LINE_MASK: u8 = 0b0001_1111;
const CURSOR_ATTR_MASK: u8 = 0b0110_0000;
const INTERLACE_MASK: u8 = 0b0000_0011;
const INTERLACE_SYNC_VIDEO: u8 = 0b0000_0011;

// The flash counter is a decade counter clocked by vsync.
const FLASH_DIVISOR: u8 = 10;
const CURSOR_FAST_FRAMES: u32 = 8;
const CURSOR_SLOW_FRAMES: u32 = 16;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrtcRegister {
    HorizontalTotal,
    HorizontalDisplayed,
    HorizontalSyncPosition,
    SyncWidth,
    VerticalTotal,
    VerticalTotalAdjust,
    VerticalDisplayed,
    VerticalSync,
    InterlaceMode,
    MaximumScanlineAddress,
    CursorStartLine,
    CursorEndLine,
    StartAddressH,
    StartAddressL,
    CursorAddressH,
    CursorAddressL,
    LightPenPositionH,
    LightPenPositionL,
}

use CrtcRegister::*;

impl CrtcRegister {
    pub fn from_index(idx: u8) -> Option<CrtcRegister> {
        let reg = match idx {
            0 => HorizontalTotal,
            1 => HorizontalDisplayed,
            2 => HorizontalSyncPosition,
            3 => SyncWidth,
            4 => VerticalTotal,
            5 => VerticalTotalAdjust,
            6 => VerticalDisplayed,
            7 => VerticalSync,
            8 => InterlaceMode,
            9 => MaximumScanlineAddress,
            10 => CursorStartLine,
            11 => CursorEndLine,
            12 => StartAddressH,
            13 => StartAddressL,
            14 => CursorAddressH,
            15 => CursorAddressL,
            16 => LightPenPositionH,
            17 => LightPenPositionL,
            _ => return None,
        };
        Some(reg)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interlace {
    #[default]
    Off,
    On,
    /// Interlace has been requested and takes effect at the end of the next vsync.
    ArmAtVsync,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorMode {
    #[default]
    Steady,
    Off,
    SlowBlink,
    FastBlink,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CrtcEvent {
    HSyncStart,
    HSyncEnd,
    VSyncStart,
    VSyncEnd,
    DisplayEnableStart,
    DisplayEnableEnd,
    RowAddressChange,
    ScanlineComplete,
    FrameComplete,
    BlinkToggle,
}

/// The set of edges produced by a single CRTC tick.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CrtcStatus {
    pub hsync_start: bool,
    pub hsync_end: bool,
    pub vsync_start: bool,
    pub vsync_end: bool,
    pub den_start: bool,
    pub den_end: bool,
    pub row_address: bool,
    pub scanline_complete: bool,
    pub frame_complete: bool,
    pub blink_toggled: bool,
}

impl CrtcStatus {
    pub fn events(&self) -> impl Iterator<Item = CrtcEvent> {
        [
            (self.hsync_start, CrtcEvent::HSyncStart),
            (self.hsync_end, CrtcEvent::HSyncEnd),
            (self.vsync_start, CrtcEvent::VSyncStart),
            (self.vsync_end, CrtcEvent::VSyncEnd),
            (self.den_start, CrtcEvent::DisplayEnableStart),
            (self.den_end, CrtcEvent::DisplayEnableEnd),
            (self.row_address, CrtcEvent::RowAddressChange),
            (self.scanline_complete, CrtcEvent::ScanlineComplete),
            (self.frame_complete, CrtcEvent::FrameComplete),
            (self.blink_toggled, CrtcEvent::BlinkToggle),
        ]
        .into_iter()
        .filter_map(|(set, event)| set.then_some(event))
    }

    pub fn is_empty(&self) -> bool {
        *self == CrtcStatus::default()
    }
}

macro_rules! trace {
    ($self:ident, $($t:tt)*) => {{
        if $self.trace_logger.is_some() {
            $self.trace_logger.print(&format!(
                "[SL:{:03} HCC:{:03} VCC:{:03} VLC:{:02}] ",
                $self.scanline,
                $self.hcc_c0,
                $self.vcc_c4,
                $self.vlc_c9
            ));
            $self.trace_logger.println(&format!($($t)*));
        }
    }};
}

/// Serializable snapshot of the CRTC. Values derived from registers are recomputed on restore.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CrtcState {
    pub reg: [u8; CRTC_REGISTER_COUNT],
    pub reg_select: u8,
    pub interlace: Interlace,
    pub field: u8,
    pub flash_count: u8,
    pub flash_bit: bool,
    pub frame_count: u32,
    pub counters: [u8; 6],
    pub flags: [bool; 5],
    pub vma: [u16; 3],
    pub scanline: u32,
    pub beam: (i32, i32),
    pub frame_ticks: u64,
}

#[derive(Debug)]
pub struct Crtc6845 {
    reg: [u8; CRTC_REGISTER_COUNT], // Externally-accessible CRTC register file
    reg_select: u8,                 // Selected CRTC register (5 bit address register)

    start_address: u16,  // Calculated value from R12 & R13
    cursor_address: u16, // Calculated value from R14 & R15
    hsync_width: u8,     // R3 low nibble
    vsync_width: u8,     // R3 high nibble, 0 == 16
    cursor_mode: CursorMode,

    interlace: Interlace,
    field: u8,
    flash_count: u8,
    flash_bit: bool,
    frame_count: u32,

    hcc_c0: u8,  // Horizontal character counter (x pos of character)
    vlc_c9: u8,  // Vertical line counter - row address within the character row
    vcc_c4: u8,  // Vertical character counter (y pos of character row)
    hsc_c3l: u8, // Horizontal sync counter
    vsc_c3h: u8, // Vertical sync counter
    vtac_c5: u8, // Vertical total adjust counter
    in_vta: bool,

    hsync: bool,
    vsync: bool,
    hdisp: bool,
    vdisp: bool,

    vma: u16,     // VMA register - Video memory address
    vma_t: u16,   // VMA' register - latched at R1 as the start of the next row
    vma_row: u16, // Start address of the current character row

    scanline: u32,
    beam_x: i32,
    beam_y: i32,
    char_width: u32,
    frame_ticks: u64,

    trace_logger: TraceLogger,
}

impl Default for Crtc6845 {
    fn default() -> Self {
        Self {
            reg: [0; CRTC_REGISTER_COUNT],
            reg_select: 0,

            start_address: 0,
            cursor_address: 0,
            hsync_width: 0,
            vsync_width: 16,
            cursor_mode: CursorMode::Steady,

            interlace: Interlace::Off,
            field: 0,
            flash_count: 0,
            flash_bit: false,
            frame_count: 0,

            hcc_c0: 0,
            vlc_c9: 0,
            vcc_c4: 0,
            hsc_c3l: 0,
            vsc_c3h: 0,
            vtac_c5: 0,
            in_vta: false,

            hsync: false,
            vsync: false,
            hdisp: true,
            vdisp: true,

            vma: 0,
            vma_t: 0,
            vma_row: 0,

            scanline: 0,
            beam_x: 0,
            beam_y: 0,
            char_width: DEFAULT_CHAR_WIDTH,
            frame_ticks: 0,

            trace_logger: TraceLogger::None,
        }
    }
}

impl Crtc6845 {
    pub fn new(trace_logger: TraceLogger) -> Self {
        Self {
            trace_logger,
            ..Self::default()
        }
    }

    /// Set the number of dots produced per character clock. Only affects the reported beam position.
    pub fn set_char_width(&mut self, width: u32) {
        self.char_width = width.max(1);
    }

    /// Reset the CRTC. Registers and counters are cleared; the trace logger and character width
    /// are retained.
    pub fn reset(&mut self) {
        let trace_logger = std::mem::take(&mut self.trace_logger);
        let char_width = self.char_width;
        *self = Self {
            trace_logger,
            char_width,
            ..Self::default()
        };
    }

    pub fn flush_trace(&mut self) {
        self.trace_logger.flush();
    }

    pub fn select_register(&mut self, data: u8) {
        self.reg_select = data & CRTC_ADDRESS_MASK;
    }

    pub fn selected_register(&self) -> Option<CrtcRegister> {
        CrtcRegister::from_index(self.reg_select)
    }

    /// Write to the currently selected register. Values are masked to the register width.
    pub fn write_register(&mut self, data: u8) {
        let Some(reg) = self.selected_register()
        else {
            trace!(self, "Write to invalid CRTC register {:02X} ignored", self.reg_select);
            return;
        };
        self.set_register(reg, data);
    }

    /// Write a specific register directly, bypassing the address register.
    pub fn set_register(&mut self, reg: CrtcRegister, data: u8) {
        let idx = reg as usize;
        match reg {
            HorizontalTotal | HorizontalDisplayed | HorizontalSyncPosition => {
                // (R0-R2) 8 bit write only
                self.reg[idx] = data;
            }
            SyncWidth => {
                // (R3) hsync width in low nibble, vsync width in high nibble. A vsync width of 0
                // programs 16 lines.
                self.reg[idx] = data;
                self.hsync_width = data & 0x0F;
                self.vsync_width = match data >> 4 {
                    0 => 16,
                    w => w,
                };
            }
            VerticalTotal | VerticalDisplayed | VerticalSync => {
                // (R4, R6, R7) 7 bit write only
                self.reg[idx] = data & 0x7F;
            }
            VerticalTotalAdjust => {
                // (R5) 5 bit write only
                self.reg[idx] = data & 0x1F;
            }
            InterlaceMode => {
                // (R8) interlace mode plus display enable and cursor skew
                self.reg[idx] = data & 0xF3;
                self.interlace = if data & INTERLACE_MASK != 0 {
                    Interlace::ArmAtVsync
                }
                else {
                    Interlace::Off
                };
            }
            MaximumScanlineAddress => {
                // (R9) 5 bit write only
                self.reg[idx] = data & 0x1F;
            }
            CursorStartLine => {
                // (R10) 7 bit bitfield. Write only.
                self.reg[idx] = data & 0x7F;
                self.cursor_mode = match (data & CURSOR_ATTR_MASK) >> 5 {
                    0b00 => CursorMode::Steady,
                    0b01 => CursorMode::Off,
                    0b10 => CursorMode::SlowBlink,
                    _ => CursorMode::FastBlink,
                };
            }
            CursorEndLine => {
                // (R11) 5 bit write only
                self.reg[idx] = data & 0x1F;
            }
            StartAddressH => {
                // (R12) 6 bit
                self.reg[idx] = data & 0x3F;
                self.update_start_address();
            }
            StartAddressL => {
                // (R13) 8 bit
                self.reg[idx] = data;
                self.update_start_address();
            }
            CursorAddressH => {
                // (R14) 6 bit read/write
                self.reg[idx] = data & 0x3F;
                self.update_cursor_address();
            }
            CursorAddressL => {
                // (R15) 8 bit read/write
                self.reg[idx] = data;
                self.update_cursor_address();
            }
            LightPenPositionH | LightPenPositionL => {
                // (R16, R17) read only
            }
        }
        trace!(self, "CRTC Register Write {:?}: {:02X}", reg, self.reg[idx]);
    }

    /// Read the currently selected register. Only the start address, cursor address and light
    /// pen registers are readable.
    pub fn read_register(&self) -> u8 {
        match self.selected_register() {
            Some(reg @ (StartAddressH | StartAddressL | CursorAddressH | CursorAddressL))
            | Some(reg @ (LightPenPositionH | LightPenPositionL)) => self.reg[reg as usize],
            _ => REGISTER_UNREADABLE_VALUE,
        }
    }

    /// Return the internal value of a register regardless of readability.
    pub fn register(&self, reg: CrtcRegister) -> u8 {
        self.reg[reg as usize]
    }

    /// Latch the current memory address into the light pen registers.
    pub fn latch_light_pen(&mut self) {
        self.reg[LightPenPositionH as usize] = ((self.vma >> 8) & 0x3F) as u8;
        self.reg[LightPenPositionL as usize] = (self.vma & 0xFF) as u8;
    }

    fn update_start_address(&mut self) {
        self.start_address = (self.reg[12] as u16) << 8 | self.reg[13] as u16
    }

    fn update_cursor_address(&mut self) {
        self.cursor_address = (self.reg[14] as u16) << 8 | self.reg[15] as u16
    }

    #[inline]
    pub fn hsync(&self) -> bool {
        self.hsync
    }

    #[inline]
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    #[inline]
    pub fn den(&self) -> bool {
        self.hdisp && self.vdisp
    }

    /// Row address (scanline within the character row)
    #[inline]
    pub fn ra(&self) -> u8 {
        self.vlc_c9
    }

    /// Memory address of the current character
    #[inline]
    pub fn ma(&self) -> u16 {
        self.vma
    }

    #[inline]
    pub fn column(&self) -> u8 {
        self.hcc_c0
    }

    #[inline]
    pub fn row(&self) -> u8 {
        self.vcc_c4
    }

    #[inline]
    pub fn scanline(&self) -> u32 {
        self.scanline
    }

    pub fn beam_position(&self) -> (i32, i32) {
        (self.beam_x, self.beam_y)
    }

    pub fn interlace(&self) -> Interlace {
        self.interlace
    }

    pub fn field(&self) -> u8 {
        self.field
    }

    pub fn flash_bit(&self) -> bool {
        self.flash_bit
    }

    pub fn frame_ticks(&self) -> u64 {
        self.frame_ticks
    }

    pub fn start_address(&self) -> u16 {
        self.start_address
    }

    pub fn cursor_address(&self) -> u16 {
        self.cursor_address
    }

    /// Return the first and last scanline of the cursor.
    pub fn cursor_extents(&self) -> (u8, u8) {
        (self.reg[10] & CURSOR_LINE_MASK, self.reg[11])
    }

    pub fn cursor_mode(&self) -> CursorMode {
        self.cursor_mode
    }

    /// Return whether the cursor is in the visible phase of its blink cycle for this frame.
    pub fn cursor_visible(&self) -> bool {
        match self.cursor_mode {
            CursorMode::Steady => true,
            CursorMode::Off => false,
            CursorMode::SlowBlink => (self.frame_count / CURSOR_SLOW_FRAMES) & 1 == 0,
            CursorMode::FastBlink => (self.frame_count / CURSOR_FAST_FRAMES) & 1 == 0,
        }
    }

    /// Return whether the cursor is being output for the current character.
    pub fn cursor(&self) -> bool {
        let (start, end) = self.cursor_extents();
        self.den() && self.vma == self.cursor_address && self.vlc_c9 >= start && self.vlc_c9 <= end && self.cursor_visible()
    }

    /// Tick the CRTC to the next character.
    pub fn tick(&mut self) -> CrtcStatus {
        let mut status = CrtcStatus::default();
        let den_before = self.den();
        let ra_before = self.vlc_c9;

        self.frame_ticks = self.frame_ticks.wrapping_add(1);
        self.beam_x = self.beam_x.wrapping_add(self.char_width as i32);

        // Process the horizontal sync pulse. The sync counter is 4 bits wide.
        if self.hsync {
            self.hsc_c3l = (self.hsc_c3l + 1) & 0x0F;
            if self.hsc_c3l == self.hsync_width {
                self.hsync = false;
                self.hsc_c3l = 0;
                status.hsync_end = true;
                self.end_hsync(&mut status);
            }
        }

        if self.hcc_c0 == self.reg[0] {
            // C0 == R0. End of the scanline.
            self.hcc_c0 = 0;
            self.hdisp = true;
            self.end_scanline(&mut status);
        }
        else {
            self.hcc_c0 = self.hcc_c0.wrapping_add(1);
            self.vma = (self.vma + 1) & CRTC_MA_MASK;
        }

        if self.hcc_c0 == self.reg[1] {
            // C0 == R1. Leaving the horizontal display area; save VMA in VMA'
            self.hdisp = false;
            self.vma_t = self.vma;
        }

        if self.hcc_c0 == self.reg[2] && !self.hsync && self.hsync_width != 0 {
            // C0 == R2. Entering horizontal sync. A width of 0 produces no hsync.
            self.hsync = true;
            self.hsc_c3l = 0;
            status.hsync_start = true;
        }

        let den = self.den();
        if den && !den_before {
            status.den_start = true;
        }
        else if !den && den_before {
            status.den_end = true;
        }
        if self.vlc_c9 != ra_before {
            status.row_address = true;
        }
        status
    }

    fn end_scanline(&mut self, status: &mut CrtcStatus) {
        self.vma = self.vma_row;

        // Vertical sync width is counted in scanlines.
        if self.vsync {
            self.vsc_c3h += 1;
            if self.vsc_c3h >= self.vsync_width {
                self.vsync = false;
                self.vsc_c3h = 0;
                status.vsync_end = true;
                self.end_vsync(status);
            }
        }

        let increment = if self.reg[8] & INTERLACE_MASK == INTERLACE_SYNC_VIDEO {
            2
        }
        else {
            1
        };

        if self.in_vta {
            // In vertical total adjust; the row counter stays put.
            self.vlc_c9 = (self.vlc_c9 + increment) & CRTC_RA_MASK;
            self.vtac_c5 = (self.vtac_c5 + 1) & 0x1F;
            if self.vtac_c5 >= self.reg[5] {
                self.in_vta = false;
                self.vtac_c5 = 0;
                self.restart_frame(status);
            }
        }
        else if self.vlc_c9 + increment > self.reg[9] {
            // C9 == R9. We finished this row of characters.
            self.vlc_c9 = 0;
            self.vcc_c4 = (self.vcc_c4 + 1) & CRTC_ROW_MASK;
            self.vma_row = self.vma_t;
            self.vma = self.vma_t;

            if self.vcc_c4 == (self.reg[4] + 1) & CRTC_ROW_MASK {
                // C4 == R4 + 1. Vertical total reached.
                if self.reg[5] != 0 {
                    self.in_vta = true;
                    self.vtac_c5 = 0;
                }
                else {
                    self.restart_frame(status);
                }
            }
            else {
                self.check_vertical(status);
            }
        }
        else {
            self.vlc_c9 += increment;
        }
    }

    fn restart_frame(&mut self, status: &mut CrtcStatus) {
        self.vcc_c4 = 0;
        self.vlc_c9 = 0;
        self.vdisp = true;
        self.vma = self.start_address;
        self.vma_t = self.start_address;
        self.vma_row = self.start_address;
        self.check_vertical(status);
    }

    fn check_vertical(&mut self, status: &mut CrtcStatus) {
        if self.vcc_c4 == self.reg[6] {
            // C4 == R6. Entering the lower border.
            self.vdisp = false;
        }
        if self.vcc_c4 == self.reg[7] && !self.vsync {
            // C4 == R7. Entering vertical sync.
            trace!(self, "Entering vsync");
            self.vsync = true;
            self.vsc_c3h = 0;
            status.vsync_start = true;
        }
    }

    fn end_hsync(&mut self, status: &mut CrtcStatus) {
        self.scanline = self.scanline.wrapping_add(1);
        self.beam_y = self.beam_y.wrapping_add(1);

        // Number of dots between the end of sync and the start of the next line.
        let ht = self.reg[0] as i32;
        let hs = self.reg[2] as i32;
        let hw = self.hsync_width as i32;
        self.beam_x = -((ht - (hs + hw)) * self.char_width as i32);
        status.scanline_complete = true;
    }

    fn end_vsync(&mut self, status: &mut CrtcStatus) {
        trace!(self, "Leaving vsync after {} ticks", self.frame_ticks);
        self.scanline = 0;
        self.beam_y = 0;
        self.frame_ticks = 0;
        self.frame_count = self.frame_count.wrapping_add(1);

        self.flash_count += 1;
        if self.flash_count >= FLASH_DIVISOR {
            self.flash_count = 0;
            self.flash_bit = !self.flash_bit;
            status.blink_toggled = true;
        }

        match self.interlace {
            Interlace::ArmAtVsync => {
                self.interlace = Interlace::On;
                self.field = 0;
            }
            Interlace::On => {
                self.field ^= 1;
            }
            Interlace::Off => {}
        }
        status.frame_complete = true;
    }

    pub fn save_state(&self) -> CrtcState {
        CrtcState {
            reg: self.reg,
            reg_select: self.reg_select,
            interlace: self.interlace,
            field: self.field,
            flash_count: self.flash_count,
            flash_bit: self.flash_bit,
            frame_count: self.frame_count,
            counters: [
                self.hcc_c0,
                self.vlc_c9,
                self.vcc_c4,
                self.hsc_c3l,
                self.vsc_c3h,
                self.vtac_c5,
            ],
            flags: [self.in_vta, self.hsync, self.vsync, self.hdisp, self.vdisp],
            vma: [self.vma, self.vma_t, self.vma_row],
            scanline: self.scanline,
            beam: (self.beam_x, self.beam_y),
            frame_ticks: self.frame_ticks,
        }
    }

    pub fn load_state(&mut self, state: &CrtcState) {
        // Replay the writable registers so that derived values are rebuilt.
        for i in 0..=CursorAddressL as u8 {
            if let Some(reg) = CrtcRegister::from_index(i) {
                self.set_register(reg, state.reg[i as usize]);
            }
        }
        self.reg[LightPenPositionH as usize] = state.reg[LightPenPositionH as usize] & 0x3F;
        self.reg[LightPenPositionL as usize] = state.reg[LightPenPositionL as usize];
        self.reg_select = state.reg_select & CRTC_ADDRESS_MASK;
        self.interlace = state.interlace;
        self.field = state.field & 1;
        self.flash_count = state.flash_count % FLASH_DIVISOR;
        self.flash_bit = state.flash_bit;
        self.frame_count = state.frame_count;
        let [c0, c9, c4, c3l, c3h, c5] = state.counters;
        self.hcc_c0 = c0;
        self.vlc_c9 = c9 & CRTC_RA_MASK;
        self.vcc_c4 = c4 & CRTC_ROW_MASK;
        self.hsc_c3l = c3l & 0x0F;
        self.vsc_c3h = c3h & 0x0F;
        self.vtac_c5 = c5 & 0x1F;
        [self.in_vta, self.hsync, self.vsync, self.hdisp, self.vdisp] = state.flags;
        self.vma = state.vma[0] & CRTC_MA_MASK;
        self.vma_t = state.vma[1] & CRTC_MA_MASK;
        self.vma_row = state.vma[2] & CRTC_MA_MASK;
        self.scanline = state.scanline;
        (self.beam_x, self.beam_y) = state.beam;
        self.frame_ticks = state.frame_ticks;
    }

    /// Return a list of register names and formatted values for debug display.
    pub fn get_reg_state(&self) -> Vec<(String, String)> {
        let mut state: Vec<(String, String)> = (0..CRTC_REGISTER_COUNT as u8)
            .filter_map(|i| CrtcRegister::from_index(i).map(|r| (i, r)))
            .map(|(i, r)| (format!("R{} {:?}", i, r), format!("{:02X}", self.reg[i as usize])))
            .collect();
        state.push(("C0 Column".to_string(), format!("{}", self.hcc_c0)));
        state.push(("C4 Row".to_string(), format!("{}", self.vcc_c4)));
        state.push(("C9 Row Address".to_string(), format!("{}", self.vlc_c9)));
        state.push(("VMA".to_string(), format!("{:04X}", self.vma)));
        state.push(("Interlace".to_string(), format!("{:?} field {}", self.interlace, self.field)));
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 10 characters per line, 2 lines per row, 4 rows per frame.
    fn small_crtc() -> Crtc6845 {
        let mut crtc = Crtc6845::new(TraceLogger::None);
        let regs: [(u8, u8); 10] = [
            (0, 9),
            (1, 8),
            (2, 8),
            (3, 0x21),
            (4, 3),
            (5, 0),
            (6, 2),
            (7, 3),
            (9, 1),
            (8, 0),
        ];
        for (reg, val) in regs {
            crtc.select_register(reg);
            crtc.write_register(val);
        }
        crtc
    }

    #[test]
    fn test_register_masks() {
        let mut crtc = Crtc6845::new(TraceLogger::None);
        crtc.set_register(VerticalTotal, 0xFF);
        crtc.set_register(VerticalTotalAdjust, 0xFF);
        crtc.set_register(InterlaceMode, 0xFF);
        crtc.set_register(MaximumScanlineAddress, 0xFF);
        crtc.set_register(StartAddressH, 0xFF);

        assert_eq!(crtc.register(VerticalTotal), 0x7F);
        assert_eq!(crtc.register(VerticalTotalAdjust), 0x1F);
        assert_eq!(crtc.register(InterlaceMode), 0xF3);
        assert_eq!(crtc.register(MaximumScanlineAddress), 0x1F);
        assert_eq!(crtc.start_address(), 0x3F00);
    }

    #[test]
    fn test_address_register_is_five_bits() {
        let mut crtc = Crtc6845::new(TraceLogger::None);
        // 0x3F masks to 0x1F, which is not a register
        crtc.select_register(0x3F);
        assert_eq!(crtc.selected_register(), None);
        crtc.write_register(0x55);
        assert!(crtc.reg.iter().all(|r| *r == 0));

        // 0x21 masks to R1
        crtc.select_register(0x21);
        assert_eq!(crtc.selected_register(), Some(HorizontalDisplayed));
    }

    #[test]
    fn test_register_readback() {
        let mut crtc = Crtc6845::new(TraceLogger::None);
        crtc.select_register(14);
        crtc.write_register(0x12);
        assert_eq!(crtc.read_register(), 0x12);

        crtc.select_register(0);
        crtc.write_register(0x38);
        assert_eq!(crtc.read_register(), REGISTER_UNREADABLE_VALUE);
        assert_eq!(crtc.register(HorizontalTotal), 0x38);
    }

    #[test]
    fn test_vsync_width_zero_is_sixteen() {
        let mut crtc = Crtc6845::new(TraceLogger::None);
        crtc.set_register(SyncWidth, 0x0A);
        assert_eq!(crtc.hsync_width, 0x0A);
        assert_eq!(crtc.vsync_width, 16);
        crtc.set_register(SyncWidth, 0x3A);
        assert_eq!(crtc.vsync_width, 3);
    }

    #[test]
    fn test_frame_period() {
        let mut crtc = small_crtc();
        let mut frames = Vec::new();
        for t in 0..8000u32 {
            if crtc.tick().frame_complete {
                frames.push(t);
            }
        }
        assert!(frames.len() >= 99);
        // 10 ticks per line, 8 lines per frame
        assert!(frames.windows(2).all(|w| w[1] - w[0] == 80));
    }

    #[test]
    fn test_scanlines_per_frame() {
        let mut crtc = small_crtc();
        while !crtc.tick().frame_complete {}
        assert_eq!(crtc.scanline(), 0);

        let mut lines = 0;
        for _ in 0..80 {
            let status = crtc.tick();
            if status.scanline_complete {
                lines += 1;
            }
            assert_eq!(status.hsync_end, status.scanline_complete);
        }
        assert_eq!(lines, 8);
    }

    #[test]
    fn test_event_list_matches_flags() {
        let mut crtc = small_crtc();
        for _ in 0..200 {
            let status = crtc.tick();
            let events: Vec<CrtcEvent> = status.events().collect();
            assert_eq!(events.contains(&CrtcEvent::FrameComplete), status.frame_complete);
            assert_eq!(events.contains(&CrtcEvent::VSyncEnd), status.vsync_end);
            assert_eq!(events.is_empty(), status.is_empty());
        }
    }

    #[test]
    fn test_display_enable_edges() {
        let mut crtc = small_crtc();
        let mut starts = 0;
        let mut ends = 0;
        // Skip to a frame boundary so that we count whole frames.
        while !crtc.tick().frame_complete {}
        for _ in 0..80 {
            let status = crtc.tick();
            starts += status.den_start as u32;
            ends += status.den_end as u32;
        }
        // Two rows of two lines are displayed per frame.
        assert_eq!(starts, 4);
        assert_eq!(ends, 4);
    }

    #[test]
    fn test_interlace_arm_at_vsync() {
        let mut crtc = small_crtc();
        crtc.set_register(InterlaceMode, 0x01);
        assert_eq!(crtc.interlace(), Interlace::ArmAtVsync);

        while !crtc.tick().frame_complete {}
        assert_eq!(crtc.interlace(), Interlace::On);
        assert_eq!(crtc.field(), 0);

        while !crtc.tick().frame_complete {}
        assert_eq!(crtc.field(), 1);
        while !crtc.tick().frame_complete {}
        assert_eq!(crtc.field(), 0);

        crtc.set_register(InterlaceMode, 0x00);
        assert_eq!(crtc.interlace(), Interlace::Off);
    }

    #[test]
    fn test_flash_bit_every_ten_frames() {
        let mut crtc = small_crtc();
        let mut toggles = 0;
        let mut frames = 0;
        while frames < 25 {
            let status = crtc.tick();
            frames += status.frame_complete as u32;
            toggles += status.blink_toggled as u32;
        }
        assert_eq!(toggles, 2);
        assert!(!crtc.flash_bit());
    }

    #[test]
    fn test_cursor_position() {
        let mut crtc = small_crtc();
        crtc.set_register(CursorAddressL, 2);
        crtc.set_register(CursorStartLine, 0x00);
        crtc.set_register(CursorEndLine, 0x01);

        let mut seen = 0;
        for _ in 0..160 {
            crtc.tick();
            if crtc.cursor() {
                assert_eq!(crtc.ma(), 2);
                seen += 1;
            }
        }
        assert!(seen > 0);

        crtc.set_register(CursorStartLine, 0x20);
        assert_eq!(crtc.cursor_mode(), CursorMode::Off);
        for _ in 0..160 {
            crtc.tick();
            assert!(!crtc.cursor());
        }
    }

    #[test]
    fn test_state_restore_continues_timing() {
        let mut crtc = small_crtc();
        crtc.set_register(InterlaceMode, 0x01);
        for _ in 0..437 {
            crtc.tick();
        }
        let state = crtc.save_state();

        let mut restored = Crtc6845::new(TraceLogger::None);
        restored.load_state(&state);
        assert_eq!(restored.save_state(), state);
        assert_eq!(restored.interlace(), crtc.interlace());
        for _ in 0..500 {
            assert_eq!(crtc.tick(), restored.tick());
        }
    }

    #[test]
    fn test_state_values_are_masked_on_load() {
        let mut crtc = small_crtc();
        let mut state = crtc.save_state();
        state.reg[VerticalTotal as usize] = 0xFF;
        state.reg[MaximumScanlineAddress as usize] = 0xFF;
        state.reg[LightPenPositionH as usize] = 0xFF;
        state.counters = [0xFF; 6];
        state.vma = [0xFFFF; 3];
        state.scanline = u32::MAX;
        state.beam = (i32::MAX, i32::MAX);
        state.frame_ticks = u64::MAX;

        crtc.load_state(&state);
        assert_eq!(crtc.register(VerticalTotal), 0x7F);
        assert_eq!(crtc.register(MaximumScanlineAddress), 0x1F);
        assert_eq!(crtc.register(LightPenPositionH), 0x3F);
        assert!(crtc.ra() <= 0x1F);
        assert!(crtc.row() <= 0x7F);

        let mut frames = 0;
        for _ in 0..200_000 {
            frames += crtc.tick().frame_complete as u32;
        }
        assert!(frames > 0);
    }

    #[test]
    fn test_interlace_sync_video_steps_row_address_by_two() {
        let mut crtc = small_crtc();
        crtc.set_register(InterlaceMode, 0x03);
        while !crtc.tick().frame_complete {}

        let mut frames = Vec::new();
        let mut lines = 0;
        let mut lines_per_frame = Vec::new();
        for t in 0..800u32 {
            let status = crtc.tick();
            // R9 = 1, so stepping by two ends every row after a single scanline.
            assert_eq!(crtc.ra(), 0);
            lines += status.scanline_complete as u32;
            if status.frame_complete {
                frames.push(t);
                lines_per_frame.push(lines);
                lines = 0;
            }
        }
        assert!(frames.len() >= 19);
        // 10 ticks per line, 1 line per row, 4 rows per frame
        assert!(frames.windows(2).all(|w| w[1] - w[0] == 40));
        assert!(lines_per_frame.iter().skip(1).all(|l| *l == 4));
    }

    #[test]
    fn test_light_pen_latch_reads_back() {
        let mut crtc = small_crtc();
        while !crtc.tick().frame_complete {}
        for _ in 0..5 {
            crtc.tick();
        }
        let ma = crtc.ma();
        assert_ne!(ma, 0);
        crtc.latch_light_pen();

        crtc.select_register(LightPenPositionH as u8);
        assert_eq!(crtc.read_register(), (ma >> 8) as u8 & 0x3F);
        crtc.select_register(LightPenPositionL as u8);
        assert_eq!(crtc.read_register(), ma as u8);
        // Writes to the light pen registers are ignored.
        crtc.write_register(0x55);
        assert_eq!(crtc.read_register(), ma as u8);
    }

    #[test]
    fn test_trace_register_writes() {
        let mut crtc = Crtc6845::new(TraceLogger::Memory(Vec::new()));
        crtc.select_register(0);
        crtc.write_register(0x38);
        crtc.select_register(31);
        crtc.write_register(0x01);

        let lines = crtc.trace_logger.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("CRTC Register Write HorizontalTotal: 38"));
        assert!(lines[1].contains("invalid CRTC register 1F"));
    }

    #[test]
    fn test_degenerate_registers_do_not_panic() {
        let mut crtc = Crtc6845::new(TraceLogger::None);
        for _ in 0..10_000 {
            crtc.tick();
        }
        crtc.set_register(VerticalTotal, 0x7F);
        crtc.set_register(VerticalSync, 0x7F);
        crtc.set_register(HorizontalTotal, 0xFF);
        for _ in 0..10_000 {
            crtc.tick();
        }
    }
}

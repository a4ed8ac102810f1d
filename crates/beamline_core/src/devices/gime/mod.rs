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

    devices::gime::mod.rs

    Implementation of a scanline-captured video controller built around an
    MC6845 timing generator.
    
    The CRTC provides horizontal and vertical timing, interlace and the
    cursor. At the end of each horizontal sync the controller snapshots its
    mode registers, palette and the line's video memory into a scanline
    record. Rendering decodes those records into RGB or composite surfaces
    and is skipped entirely when no record changed since the last render.

*/

mod capture;
pub mod color;
mod draw;
mod font;
mod io;
mod mode;
mod state;
mod tablegen;

use serde::{Deserialize, Serialize};

use crate::{
    bus::VideoMemory,
    devices::mc6845::{Crtc6845, CrtcRegister, CrtcStatus},
    tracelogger::TraceLogger,
    videocard::{
        DisplayExtents,
        DisplayKind,
        FrameResult,
        RenderResult,
        VideoCard,
        VideoCardState,
        VideoCardStateEntry,
    },
};

pub use capture::{bytes_per_row, FrameSetup, ScanlineRecord, LINES_PER_ROW, LINE_DATA_SIZE, VIDEO_SPACE_MASK};
pub use draw::{render_line, underline_row, LineContext};
pub use font::{Font, FontError, FONT_SIZE};
pub use io::{
    GimeRegisters,
    HOffsetRegister,
    VideoModeRegister,
    VideoResolutionRegister,
    BORDER_REGISTER,
    CRTC_ADDRESS_REGISTER,
    CRTC_DATA_REGISTER,
    GIME_REGISTER_WINDOW,
    HOFFSET_REGISTER,
    INIT0_REGISTER,
    PALETTE_BASE,
    PALETTE_MASK,
    VBANK_REGISTER,
    VMODE_REGISTER,
    VOFFSET_HI_REGISTER,
    VOFFSET_LO_REGISTER,
    VRES_REGISTER,
    VSCROLL_REGISTER,
};
pub use mode::{ModeDescriptor, ModeKind, SIDE_BORDER_WIDTH};
pub use state::{GimeState, StateError, GIME_STATE_VERSION};

use draw::*;

pub const GIME_DISPLAY_WIDTH: usize = 640;
pub const MAX_SCANLINES: usize = 384;
pub const GIME_SURFACE_SIZE: usize = GIME_DISPLAY_WIDTH * MAX_SCANLINES;
pub const DEFAULT_TICK_CAP: u32 = 65000;
pub const MEMORY_SIZE_DEFAULT: usize = 0x80000;
pub const GIME_CHAR_WIDTH: u32 = 8;

/// CRTC programming for a 262 line NTSC frame. 100 characters per line, 4 lines per row,
/// 65 rows plus 2 adjust lines.
pub const DEFAULT_CRTC_TIMING: [(CrtcRegister, u8); 12] = [
    (CrtcRegister::HorizontalTotal, 99),
    (CrtcRegister::HorizontalDisplayed, 80),
    (CrtcRegister::HorizontalSyncPosition, 84),
    (CrtcRegister::SyncWidth, 0x3A),
    (CrtcRegister::VerticalTotal, 64),
    (CrtcRegister::VerticalTotalAdjust, 2),
    (CrtcRegister::VerticalDisplayed, 60),
    (CrtcRegister::VerticalSync, 61),
    (CrtcRegister::InterlaceMode, 0),
    (CrtcRegister::MaximumScanlineAddress, 3),
    (CrtcRegister::CursorStartLine, 0x20),
    (CrtcRegister::CursorEndLine, 0),
];

/// Vertical layout by VRES bits 5-6: (top border, display lines, field sync line)
const VERTICAL_LAYOUT: [(u32, u32, u32); 4] = [(26, 192, 218), (24, 200, 223), (0, 0, 0), (9, 225, 234)];
const LEGACY_LAYOUT: (u32, u32, u32) = (25, 192, 217);

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GimeStatus {
    pub crtc: CrtcStatus,
    /// The logical scanline reached the field sync line.
    pub field_sync: bool,
}

impl GimeStatus {
    #[inline]
    pub fn frame_complete(&self) -> bool {
        self.crtc.frame_complete
    }
}

/// Layout of the most recently finished frame, used when rendering it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastFrame {
    pub lines: u32,
    pub top_border: u32,
    pub display_lines: u32,
}

impl LastFrame {
    #[inline]
    pub fn in_display(&self, scanline: u32) -> bool {
        scanline >= self.top_border && scanline - self.top_border < self.display_lines
    }
}

pub struct GimeVideo {
    crtc: Crtc6845,
    regs: GimeRegisters,
    palette: [u8; 16],
    font: Font,
    blink: bool,

    frame: FrameSetup,
    last_frame: LastFrame,
    records: Vec<ScanlineRecord>,

    surfaces: [Vec<u32>; 2],
    dirty: [bool; 2],

    tick_cap: u32,
    line_doubling: bool,
    frame_count: u64,
}

impl Default for GimeVideo {
    fn default() -> Self {
        Self::new(TraceLogger::None, DEFAULT_TICK_CAP, false)
    }
}

impl GimeVideo {
    pub fn new(trace_logger: TraceLogger, tick_cap: u32, line_doubling: bool) -> Self {
        let mut gime = Self {
            crtc: Crtc6845::new(trace_logger),
            regs: GimeRegisters::default(),
            palette: [0; 16],
            font: Font::blank(),
            blink: false,

            frame: FrameSetup::default(),
            last_frame: LastFrame::default(),
            records: vec![ScanlineRecord::default(); MAX_SCANLINES],

            surfaces: [vec![0; GIME_SURFACE_SIZE], vec![0; GIME_SURFACE_SIZE]],
            dirty: [true; 2],

            tick_cap: tick_cap.max(1),
            line_doubling,
            frame_count: 0,
        };
        gime.crtc.set_char_width(GIME_CHAR_WIDTH);
        gime.load_default_timing();
        gime.new_frame();
        gime
    }

    /// Reset the controller to its power-on state. The font and options are kept.
    pub fn reset(&mut self) {
        log::debug!("Resetting video controller");
        self.crtc.reset();
        self.load_default_timing();
        self.regs = GimeRegisters::default();
        self.palette = [0; 16];
        self.blink = false;
        self.frame = FrameSetup::default();
        self.last_frame = LastFrame::default();
        self.records.fill(ScanlineRecord::default());
        self.frame_count = 0;
        self.new_frame();
        self.set_all_dirty();
    }

    pub fn load_default_timing(&mut self) {
        for (reg, value) in DEFAULT_CRTC_TIMING {
            self.crtc.set_register(reg, value);
        }
    }

    pub fn set_font(&mut self, font: Font) {
        self.font = font;
        self.set_all_dirty();
    }

    pub fn set_tick_cap(&mut self, tick_cap: u32) {
        self.tick_cap = tick_cap.max(1);
    }

    pub fn tick_cap(&self) -> u32 {
        self.tick_cap
    }

    pub fn set_line_doubling(&mut self, state: bool) {
        self.line_doubling = state;
    }

    pub fn crtc(&self) -> &Crtc6845 {
        &self.crtc
    }

    pub fn crtc_mut(&mut self) -> &mut Crtc6845 {
        &mut self.crtc
    }

    pub fn registers(&self) -> &GimeRegisters {
        &self.regs
    }

    pub fn records(&self) -> &[ScanlineRecord] {
        &self.records
    }

    pub fn frame_setup(&self) -> &FrameSetup {
        &self.frame
    }

    pub fn last_frame(&self) -> LastFrame {
        self.last_frame
    }

    pub fn blink(&self) -> bool {
        self.blink
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn set_all_dirty(&mut self) {
        self.dirty = [true; 2];
    }

    #[inline]
    pub fn is_dirty(&self, kind: DisplayKind) -> bool {
        self.dirty[kind.index()]
    }

    /// Latch per-frame state. Called at the end of vertical sync.
    fn new_frame(&mut self) {
        let legacy = self.regs.legacy();
        if legacy != self.frame.legacy {
            log::debug!("Legacy video mode: {}", legacy);
            self.set_all_dirty();
        }

        let finished = LastFrame {
            lines: self.frame.scanline.min(MAX_SCANLINES as u32),
            top_border: self.frame.top_border,
            display_lines: self.frame.display_lines,
        };
        if finished != self.last_frame {
            self.last_frame = finished;
            self.set_all_dirty();
        }

        let (top_border, display_lines, field_sync_line) = if legacy {
            LEGACY_LAYOUT
        }
        else {
            VERTICAL_LAYOUT[self.regs.vres().vert_res() as usize]
        };
        let base = if legacy { 0 } else { self.regs.video_base() };

        self.frame = FrameSetup {
            legacy,
            top_border,
            display_lines,
            field_sync_line,
            base,
            position: base,
            line_in_row: self.regs.vscroll & 0x0F,
            double_phase: false,
            scanline: 0,
        };
        self.frame_count += 1;
    }

    /// Advance the controller by one character clock.
    pub fn tick<M: VideoMemory + ?Sized>(&mut self, mem: &M) -> GimeStatus {
        let crtc = self.crtc.tick();
        let mut status = GimeStatus {
            crtc,
            field_sync: false,
        };

        if crtc.scanline_complete {
            status.field_sync = self.frame.scanline == self.frame.field_sync_line;
            self.prepare_scanline(mem);
        }
        if crtc.frame_complete {
            self.new_frame();
        }
        if crtc.blink_toggled {
            self.blink = !self.blink;
            self.set_all_dirty();
        }
        status
    }

    /// Run until the end of the current frame, or until the tick cap is reached. An aborted
    /// frame is delivered as captured so far.
    pub fn run_frame<M: VideoMemory + ?Sized>(&mut self, mem: &M) -> FrameResult {
        let mut ticks = 0;
        while ticks < self.tick_cap {
            ticks += 1;
            if self.tick(mem).frame_complete() {
                return FrameResult { ticks, completed: true };
            }
        }

        log::warn!(
            "run_frame(): No vsync after {} ticks, aborting frame at scanline {}",
            ticks,
            self.frame.scanline
        );
        self.new_frame();
        self.set_all_dirty();
        FrameResult {
            ticks,
            completed: false,
        }
    }

    /// Render the surface for the given display kind if any record changed since it was last
    /// rendered.
    pub fn render(&mut self, kind: DisplayKind) -> RenderResult {
        let k = kind.index();
        if !self.dirty[k] {
            return RenderResult::Unchanged;
        }

        let lines = self.last_frame.lines as usize;
        for (sl, line) in self.surfaces[k].chunks_exact_mut(GIME_DISPLAY_WIDTH).enumerate() {
            if sl < lines {
                let ctx = LineContext::new(&self.records[sl], &self.font, kind, self.blink);
                render_line(&ctx, self.last_frame.in_display(sl as u32), line);
            }
            else {
                line.fill(0);
            }
        }
        self.dirty[k] = false;
        RenderResult::Rendered
    }

    pub fn surface(&self, kind: DisplayKind) -> &[u32] {
        &self.surfaces[kind.index()]
    }

    /// Return the output dimensions of frame_rgba().
    pub fn frame_dimensions(&self) -> (u32, u32) {
        let h = if self.line_doubling { MAX_SCANLINES * 2 } else { MAX_SCANLINES };
        (GIME_DISPLAY_WIDTH as u32, h as u32)
    }

    /// Convert a rendered surface to RGBA8, doubling scanlines if line doubling is enabled.
    pub fn frame_rgba(&self, kind: DisplayKind) -> Vec<u8> {
        let repeat = if self.line_doubling { 2 } else { 1 };
        let mut pixels: Vec<[u8; 4]> = Vec::with_capacity(GIME_SURFACE_SIZE * repeat);
        for line in self.surfaces[kind.index()].chunks_exact(GIME_DISPLAY_WIDTH) {
            let start = pixels.len();
            pixels.extend(line.iter().map(|px| {
                let (r, g, b) = color::components(*px);
                [r, g, b, 0xFF]
            }));
            if repeat == 2 {
                pixels.extend_from_within(start..);
            }
        }
        bytemuck::cast_slice::<[u8; 4], u8>(pixels.as_slice()).to_vec()
    }
}

impl VideoCard for GimeVideo {
    fn get_display_extents(&self) -> DisplayExtents {
        DisplayExtents {
            field_w: GIME_DISPLAY_WIDTH as u32,
            field_h: MAX_SCANLINES as u32,
            visible_h: self.last_frame.lines,
            double_scan: self.line_doubling,
        }
    }

    fn render(&mut self, kind: DisplayKind) -> RenderResult {
        GimeVideo::render(self, kind)
    }

    fn display_buf(&self, kind: DisplayKind) -> &[u32] {
        self.surface(kind)
    }

    fn get_videocard_string_state(&self) -> VideoCardState {
        let mut state = VideoCardState::new();

        let crtc_vec = self
            .crtc
            .get_reg_state()
            .into_iter()
            .map(|(name, value)| (name, VideoCardStateEntry::String(value)))
            .collect();
        state.insert("CRTC".to_string(), crtc_vec);

        let regs = &self.regs;
        let gime_vec = vec![
            ("INIT0".to_string(), VideoCardStateEntry::Value8(regs.init0)),
            ("VBANK".to_string(), VideoCardStateEntry::Value8(regs.vbank)),
            ("VMODE".to_string(), VideoCardStateEntry::Value8(regs.vmode)),
            ("VRES".to_string(), VideoCardStateEntry::Value8(regs.vres)),
            ("BORDER".to_string(), VideoCardStateEntry::Value8(regs.border)),
            ("VSCROLL".to_string(), VideoCardStateEntry::Value8(regs.vscroll)),
            ("VOFFSET".to_string(), VideoCardStateEntry::Value16((regs.voffset_hi as u16) << 8 | regs.voffset_lo as u16)),
            ("HOFFSET".to_string(), VideoCardStateEntry::Value8(regs.hoffset)),
            ("Base".to_string(), VideoCardStateEntry::Value32(self.frame.base as u32)),
            ("Blink".to_string(), VideoCardStateEntry::String(format!("{}", self.blink))),
        ];
        state.insert("GIME".to_string(), gime_vec);

        let palette_vec = self
            .palette
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (r, g, b) = color::components(color::resolve(*p, DisplayKind::Rgb, false));
                (format!("{}", i), VideoCardStateEntry::Color(format!("{:02X}", p), r, g, b))
            })
            .collect();
        state.insert("Palette".to_string(), palette_vec);
        state
    }
}

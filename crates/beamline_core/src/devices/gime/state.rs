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

    devices::gime::state.rs

    Save state support for the video controller.

*/

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::*;
use crate::devices::mc6845::CrtcState;

pub const GIME_STATE_VERSION: u32 = 1;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StateError {
    #[error("Save state has {0} scanline records, expected 384")]
    ScanlineCount(usize),
    #[error("Unsupported save state version: {0}")]
    Version(u32),
}

/// Everything needed to resume the controller, excluding the font and video memory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GimeState {
    pub version: u32,
    pub crtc: CrtcState,
    pub regs: GimeRegisters,
    pub palette: [u8; 16],
    pub blink: bool,
    pub frame: FrameSetup,
    pub last_frame: LastFrame,
    pub records: Vec<ScanlineRecord>,
}

impl GimeVideo {
    pub fn save_state(&self) -> GimeState {
        GimeState {
            version: GIME_STATE_VERSION,
            crtc: self.crtc.save_state(),
            regs: self.regs,
            palette: self.palette,
            blink: self.blink,
            frame: self.frame.clone(),
            last_frame: self.last_frame,
            records: self.records.clone(),
        }
    }

    /// Restore a saved state. The controller is left untouched if the state is rejected.
    pub fn load_state(&mut self, state: GimeState) -> Result<(), StateError> {
        if state.version != GIME_STATE_VERSION {
            return Err(StateError::Version(state.version));
        }
        if state.records.len() != MAX_SCANLINES {
            return Err(StateError::ScanlineCount(state.records.len()));
        }

        // Values are masked the same way register writes are.
        self.crtc.load_state(&state.crtc);
        self.regs = state.regs.masked();
        for (i, value) in state.palette.iter().enumerate() {
            self.write_palette(i as u8, *value);
        }
        self.blink = state.blink;
        self.frame = state.frame.clamped();
        self.last_frame = LastFrame {
            lines: state.last_frame.lines.min(MAX_SCANLINES as u32),
            ..state.last_frame
        };
        self.records = state.records.into_iter().map(ScanlineRecord::masked).collect();
        self.set_all_dirty();
        log::debug!("Loaded save state at scanline {}", self.frame.scanline);
        Ok(())
    }
}

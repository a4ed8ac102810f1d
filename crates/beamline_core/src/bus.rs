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

    bus.rs

    Interfaces between the video controller and the system that hosts it.
    The host owns video memory and decodes the register window; the
    controller only reads memory and receives register accesses.

*/

pub const NO_IO_BYTE: u8 = 0xFF; // This is the byte read from an unconnected register

/// Read-only view of video memory. Any paging or banking is resolved by the implementor before
/// a byte is returned. Implementations must not panic for any address; addresses outside the
/// backing store should wrap.
pub trait VideoMemory {
    fn read_byte(&self, address: usize) -> u8;
}

impl VideoMemory for [u8] {
    #[inline]
    fn read_byte(&self, address: usize) -> u8 {
        if self.is_empty() {
            return NO_IO_BYTE;
        }
        self[address % self.len()]
    }
}

impl VideoMemory for Vec<u8> {
    #[inline]
    fn read_byte(&self, address: usize) -> u8 {
        self.as_slice().read_byte(address)
    }
}

impl<const N: usize> VideoMemory for [u8; N] {
    #[inline]
    fn read_byte(&self, address: usize) -> u8 {
        self.as_slice().read_byte(address)
    }
}

/// A device with a block of byte-wide registers. Offsets are relative to the start of the
/// device's register window.
pub trait IoDevice {
    /// Read a byte from the specified register offset. The default implementation returns
    /// NO_IO_BYTE (0xFF).
    fn read_u8(&mut self, _offset: u16) -> u8 {
        NO_IO_BYTE
    }

    /// Write a byte to the specified register offset. The default implementation does nothing.
    fn write_u8(&mut self, _offset: u16, _data: u8) {}

    /// Return a list of named register offsets handled by this device.
    fn port_list(&self) -> Vec<(String, u16)>;
}

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

    tracelogger.rs

    Implements a trace sink for the video controller. Register writes and
    frame events are emitted here at a much higher rate than the log crate
    is suited for, so they go to a file, the console, or an in-memory buffer.

*/

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

#[derive(Debug, Default)]
pub enum TraceLogger {
    FileWriter(BufWriter<File>),
    Console,
    Memory(Vec<String>),
    #[default]
    None,
}

impl TraceLogger {
    /// Create a TraceLogger writing to the given file. Failure to create the file is logged and
    /// results in a disabled logger, as tracing is never required for correct operation.
    pub fn from_filename<S: AsRef<Path>>(filename: S) -> Self {
        match File::create(filename.as_ref()) {
            Ok(file) => TraceLogger::FileWriter(BufWriter::new(file)),
            Err(e) => {
                log::error!(
                    "Couldn't create video trace file {}: {}",
                    filename.as_ref().display(),
                    e
                );
                TraceLogger::None
            }
        }
    }

    /// Create a TraceLogger from an optional path, as read from configuration.
    pub fn from_option<S: AsRef<Path>>(filename: Option<S>) -> Self {
        match filename {
            Some(path) => TraceLogger::from_filename(path),
            None => TraceLogger::None,
        }
    }

    #[inline(always)]
    pub fn print<S: AsRef<str>>(&mut self, msg: S) {
        match self {
            TraceLogger::FileWriter(buf) => {
                _ = buf.write_all(msg.as_ref().as_bytes());
            }
            TraceLogger::Console => print!("{}", msg.as_ref()),
            TraceLogger::Memory(lines) => match lines.last_mut() {
                Some(line) if !line.ends_with('\n') => line.push_str(msg.as_ref()),
                _ => lines.push(msg.as_ref().to_string()),
            },
            TraceLogger::None => (),
        }
    }

    #[inline(always)]
    pub fn println<S: AsRef<str>>(&mut self, msg: S) {
        match self {
            TraceLogger::FileWriter(buf) => {
                _ = buf.write_all(msg.as_ref().as_bytes());
                _ = buf.write_all(b"\n");
            }
            TraceLogger::Console => println!("{}", msg.as_ref()),
            TraceLogger::Memory(_) => {
                self.print(msg);
                self.print("\n");
            }
            TraceLogger::None => (),
        }
    }

    /// Return the lines captured by a Memory logger, without trailing newlines.
    pub fn lines(&self) -> Vec<&str> {
        match self {
            TraceLogger::Memory(lines) => lines.iter().map(|l| l.trim_end_matches('\n')).collect(),
            _ => Vec::new(),
        }
    }

    pub fn flush(&mut self) {
        if let TraceLogger::FileWriter(file) = self {
            if let Err(e) = file.flush() {
                log::error!("Failed to flush trace log: {}", e);
            }
        }
    }

    #[inline(always)]
    pub fn is_some(&self) -> bool {
        !matches!(*self, TraceLogger::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_splits_lines() {
        let mut logger = TraceLogger::Memory(Vec::new());
        logger.print("R0 ");
        logger.print("<- 0x38");
        logger.println("");
        logger.println("vsync");

        assert_eq!(logger.lines(), vec!["R0 <- 0x38", "vsync"]);
        assert!(logger.is_some());
    }

    #[test]
    fn test_disabled_logger() {
        let mut logger = TraceLogger::from_option(None::<&str>);
        logger.println("ignored");
        assert!(!logger.is_some());
        assert!(logger.lines().is_empty());
    }
}

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

    beamline_config::lib.rs

*/


//! The `beamline_config` crate parses Beamline's configuration file and overlays command line
//! arguments on top of it. Command line arguments always take priority over the configuration
//! file.
//!
//! Features:
//! - `use_bpaf`: Enable BPAF support for command line argument parsing.

#[cfg(feature = "use_bpaf")]
mod bpaf_config;

use std::path::{Path, PathBuf};

use beamline_core::{devices::gime::DEFAULT_TICK_CAP, videocard::DisplayKind};

#[cfg(feature = "use_bpaf")]
pub use bpaf_config::CmdLineArgs;
#[cfg(feature = "use_bpaf")]
use bpaf_config::cli_args;

use cfg_if::cfg_if;
use serde_derive::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "beamline.toml";

const fn _default_true() -> bool {
    true
}
const fn _default_false() -> bool {
    false
}
const fn _default_tick_cap() -> u32 {
    DEFAULT_TICK_CAP
}
const fn _default_memory_size() -> usize {
    0x80000
}
const fn _default_frames() -> u32 {
    60
}
fn _default_basedir() -> PathBuf {
    PathBuf::from(".")
}
fn _default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

#[cfg(not(feature = "use_bpaf"))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    pub config_file: Option<PathBuf>,
    pub base_dir: Option<PathBuf>,
    pub frames: Option<u32>,
    pub display: Option<DisplayKind>,
    pub output_dir: Option<PathBuf>,
    pub tick_cap: Option<u32>,
    pub line_doubling: bool,
    pub no_png: bool,
}

#[derive(Debug, Deserialize)]
pub struct Emulator {
    #[serde(default = "_default_basedir")]
    pub basedir: PathBuf,
    /// Optional file to receive cycle-level CRTC trace output
    pub trace_file: Option<PathBuf>,
    #[serde(default = "_default_tick_cap")]
    pub tick_cap: u32,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            basedir: _default_basedir(),
            trace_file: None,
            tick_cap: _default_tick_cap(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub display: DisplayKind,
    #[serde(default = "_default_false")]
    pub line_doubling: bool,
}

#[derive(Copy, Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RegisterWrite {
    pub offset: u16,
    pub value: u8,
}

#[derive(Debug, Deserialize)]
pub struct Machine {
    /// Raw video memory image, loaded at address 0
    pub memory_image: Option<PathBuf>,
    #[serde(default = "_default_memory_size")]
    pub memory_size: usize,
    /// 1024 byte character generator image
    pub font: Option<PathBuf>,
    /// Initial palette values, applied in order from entry 0
    pub palette: Option<Vec<u8>>,
    /// Register writes applied in order before the first frame
    #[serde(default)]
    pub register: Vec<RegisterWrite>,
}

impl Default for Machine {
    fn default() -> Self {
        Self {
            memory_image: None,
            memory_size: _default_memory_size(),
            font: None,
            palette: None,
            register: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Headless {
    #[serde(default = "_default_frames")]
    pub frames: u32,
    #[serde(default = "_default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "_default_true")]
    pub write_png: bool,
    /// Write the final controller state as JSON to this file
    pub save_state: Option<PathBuf>,
}

impl Default for Headless {
    fn default() -> Self {
        Self {
            frames: _default_frames(),
            output_dir: _default_output_dir(),
            write_png: true,
            save_state: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFileParams {
    #[serde(default)]
    pub emulator: Emulator,
    #[serde(default)]
    pub video: Video,
    #[serde(default)]
    pub machine: Machine,
    #[serde(default)]
    pub headless: Headless,
}

impl ConfigFileParams {
    pub fn overlay(&mut self, shell_args: CmdLineArgs) {
        if let Some(basedir) = shell_args.base_dir {
            self.emulator.basedir = basedir;
        }
        if let Some(tick_cap) = shell_args.tick_cap {
            self.emulator.tick_cap = tick_cap;
        }
        if let Some(display) = shell_args.display {
            self.video.display = display;
        }
        self.video.line_doubling |= shell_args.line_doubling;

        if let Some(frames) = shell_args.frames {
            self.headless.frames = frames;
        }
        if let Some(output_dir) = shell_args.output_dir {
            self.headless.output_dir = output_dir;
        }
        self.headless.write_png &= !shell_args.no_png;
    }

    /// Resolve a configured path against the base directory.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        }
        else {
            self.emulator.basedir.join(path)
        }
    }
}

pub fn read_config(toml_string: impl AsRef<str>, shell_args: CmdLineArgs) -> Result<ConfigFileParams, anyhow::Error> {
    let mut toml_args: ConfigFileParams = toml::from_str(toml_string.as_ref())?;

    // Command line arguments override config file arguments
    toml_args.overlay(shell_args);
    log::debug!("Read config: {:?}", toml_args);

    Ok(toml_args)
}

/// Read the TOML configuration from a file path, parse and overlay command line arguments.
pub fn read_config_file<P>(default_path: P) -> Result<ConfigFileParams, anyhow::Error>
where
    P: AsRef<Path>,
{
    let shell_args: CmdLineArgs;

    cfg_if! {
        if #[cfg(feature = "use_bpaf")] {
            log::debug!("Reading command line arguments...");
            shell_args = cli_args().run();
        } else {
            log::debug!("Argument reading disabled...");
            shell_args = CmdLineArgs::default();
        }
    }

    // Allow configuration file path to be overridden by command line argument 'config_file'
    let toml_string = if let Some(configfile_path) = shell_args.config_file.as_ref() {
        std::fs::read_to_string(configfile_path)?
    }
    else {
        std::fs::read_to_string(default_path)?
    };

    read_config(toml_string, shell_args)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[emulator]
basedir = "/tmp/beamline"
tick_cap = 30000

[video]
display = "Composite"

[machine]
memory_image = "screen.bin"
palette = [0, 63, 18, 36]

[[machine.register]]
offset = 8
value = 0x80

[[machine.register]]
offset = 9
value = 0x1E

[headless]
frames = 5
"#;

    #[test]
    fn test_read_sample_config() {
        let config = read_config(SAMPLE, CmdLineArgs::default()).unwrap();
        assert_eq!(config.emulator.tick_cap, 30000);
        assert_eq!(config.video.display, DisplayKind::Composite);
        assert!(!config.video.line_doubling);
        assert_eq!(config.machine.memory_size, 0x80000);
        assert_eq!(config.machine.palette, Some(vec![0, 63, 18, 36]));
        assert_eq!(
            config.machine.register,
            vec![
                RegisterWrite { offset: 8, value: 0x80 },
                RegisterWrite { offset: 9, value: 0x1E }
            ]
        );
        assert_eq!(config.headless.frames, 5);
        assert_eq!(config.headless.output_dir, PathBuf::from("output"));
        assert!(config.headless.write_png);
        assert_eq!(
            config.resolve_path(config.machine.memory_image.as_ref().unwrap()),
            PathBuf::from("/tmp/beamline/screen.bin")
        );
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = read_config("", CmdLineArgs::default()).unwrap();
        assert_eq!(config.emulator.tick_cap, DEFAULT_TICK_CAP);
        assert_eq!(config.video.display, DisplayKind::Rgb);
        assert_eq!(config.headless.frames, 60);
        assert!(config.machine.register.is_empty());
    }

    #[test]
    fn test_command_line_overrides_file() {
        let args = CmdLineArgs {
            frames: Some(2),
            display: Some(DisplayKind::Rgb),
            tick_cap: Some(1000),
            output_dir: Some(PathBuf::from("frames")),
            no_png: true,
            ..Default::default()
        };
        let config = read_config(SAMPLE, args).unwrap();
        assert_eq!(config.headless.frames, 2);
        assert_eq!(config.video.display, DisplayKind::Rgb);
        assert_eq!(config.emulator.tick_cap, 1000);
        assert_eq!(config.headless.output_dir, PathBuf::from("frames"));
        assert!(!config.headless.write_png);
    }

    #[test]
    fn test_bad_config_is_an_error() {
        assert!(read_config("[video]\ndisplay = \"VGA\"\n", CmdLineArgs::default()).is_err());
        assert!(read_config("[headless\n", CmdLineArgs::default()).is_err());
    }
}

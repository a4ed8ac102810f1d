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

    beamline_headless::lib.rs

*/


//! Beamline headless front-end main library component.

#![forbid(unsafe_code)]

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};

use beamline_config::ConfigFileParams;
use beamline_core::{
    devices::gime::{Font, GimeVideo},
    tracelogger::TraceLogger,
    videocard::{DisplayKind, RenderResult, VideoCard},
};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames: u32,
    pub ticks: u64,
    pub aborted: u32,
    pub unchanged: u32,
    pub written: u32,
}

pub fn run() {
    env_logger::init();

    let config = match beamline_config::read_config_file(beamline_config::DEFAULT_CONFIG_FILE) {
        Ok(config) => config,
        Err(e) => match e.downcast_ref::<std::io::Error>() {
            Some(e) if e.kind() == std::io::ErrorKind::NotFound => {
                eprintln!(
                    "Configuration file not found! Please create beamline.toml in the current directory \
                               or provide the path to configuration file with --config_file."
                );
                std::process::exit(1);
            }
            Some(e) => {
                eprintln!("Unknown IO error reading configuration file:\n{}", e);
                std::process::exit(1);
            }
            None => {
                eprintln!(
                    "Failed to parse configuration file. There may be a typo or otherwise invalid toml:\n{}",
                    e
                );
                std::process::exit(1);
            }
        },
    };

    match run_with_config(&config) {
        Ok(summary) => {
            println!(
                "Ran {} frames ({} ticks): {} aborted, {} unchanged, {} written",
                summary.frames, summary.ticks, summary.aborted, summary.unchanged, summary.written
            );
        }
        Err(e) => {
            log::error!("{:?}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Build a controller from configuration: font, register writes and palette.
pub fn build_gime(config: &ConfigFileParams) -> Result<GimeVideo, anyhow::Error> {
    let trace_logger = TraceLogger::from_option(config.emulator.trace_file.as_ref().map(|p| config.resolve_path(p)));
    let mut gime = GimeVideo::new(trace_logger, config.emulator.tick_cap, config.video.line_doubling);

    if let Some(font_path) = &config.machine.font {
        let font_path = config.resolve_path(font_path);
        let font = Font::from_file(&font_path).with_context(|| format!("failed to load font: {}", font_path.display()))?;
        gime.set_font(font);
    }

    for write in &config.machine.register {
        gime.write_register(write.offset, write.value);
    }
    if let Some(palette) = &config.machine.palette {
        if palette.len() > 16 {
            log::warn!("Palette has {} entries, only the first 16 are used", palette.len());
        }
        for (i, value) in palette.iter().take(16).enumerate() {
            gime.write_palette(i as u8, *value);
        }
    }
    Ok(gime)
}

/// Load the configured memory image into a buffer of the configured size.
pub fn load_memory(config: &ConfigFileParams) -> Result<Vec<u8>, anyhow::Error> {
    let mut mem = vec![0u8; config.machine.memory_size];
    if let Some(image_path) = &config.machine.memory_image {
        let image_path = config.resolve_path(image_path);
        let bytes = std::fs::read(&image_path)
            .with_context(|| format!("failed to read memory image: {}", image_path.display()))?;
        if bytes.len() > mem.len() {
            log::warn!(
                "Memory image {} is {} bytes, truncating to {}",
                image_path.display(),
                bytes.len(),
                mem.len()
            );
        }
        let len = bytes.len().min(mem.len());
        mem[..len].copy_from_slice(&bytes[..len]);
    }
    Ok(mem)
}

fn write_png(gime: &GimeVideo, kind: DisplayKind, path: &Path) -> Result<(), anyhow::Error> {
    let (w, h) = gime.frame_dimensions();
    let rgba = gime.frame_rgba(kind);
    let img = image::RgbaImage::from_raw(w, h, rgba).ok_or_else(|| anyhow!("invalid image data"))?;
    img.save(path)
        .with_context(|| format!("failed to write PNG: {}", path.display()))?;
    Ok(())
}

pub fn frame_path(output_dir: &Path, frame: u32) -> PathBuf {
    output_dir.join(format!("frame_{:04}.png", frame))
}

/// Run the configured number of frames, writing a PNG for every frame whose render changed.
pub fn run_with_config(config: &ConfigFileParams) -> Result<RunSummary, anyhow::Error> {
    let mut gime = build_gime(config)?;
    let mem = load_memory(config)?;
    let kind = config.video.display;
    let output_dir = config.resolve_path(&config.headless.output_dir);

    if config.headless.write_png {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("failed to create output directory: {}", output_dir.display()))?;
    }

    log::info!(
        "Running {} frames, display: {}, tick cap: {}",
        config.headless.frames,
        kind,
        gime.tick_cap()
    );

    let mut summary = RunSummary::default();
    for frame in 0..config.headless.frames {
        let result = gime.run_frame(&mem);
        summary.frames += 1;
        summary.ticks += result.ticks as u64;
        if !result.completed {
            summary.aborted += 1;
        }

        match gime.render(kind) {
            RenderResult::Rendered => {
                if config.headless.write_png {
                    write_png(&gime, kind, &frame_path(&output_dir, frame))?;
                    summary.written += 1;
                }
            }
            RenderResult::Unchanged => {
                summary.unchanged += 1;
            }
        }
    }

    if let Some(state_path) = &config.headless.save_state {
        let state_path = config.resolve_path(state_path);
        let json = serde_json::to_string_pretty(&gime.save_state())?;
        std::fs::write(&state_path, json)
            .with_context(|| format!("failed to write save state: {}", state_path.display()))?;
        log::info!("Wrote save state to {}", state_path.display());
    }

    if log::log_enabled!(log::Level::Debug) {
        for (section, entries) in gime.get_videocard_string_state() {
            for (name, value) in entries {
                log::debug!("{}: {} = {}", section, name, value);
            }
        }
    }
    gime.crtc_mut().flush_trace();

    log::info!(
        "Finished: {} frames, {} ticks, {} aborted, {} unchanged renders",
        summary.frames,
        summary.ticks,
        summary.aborted,
        summary.unchanged
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use beamline_config::{read_config, CmdLineArgs};
    use beamline_core::devices::gime::GimeState;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("beamline_headless_{}_{}", name, std::process::id()));
        _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn config_for(dir: &Path, extra: &str) -> ConfigFileParams {
        let toml = format!(
            "[emulator]\nbasedir = {:?}\n\n[headless]\nframes = 3\nsave_state = \"state.json\"\n{}",
            dir.to_string_lossy(),
            extra
        );
        read_config(toml, CmdLineArgs::default()).unwrap()
    }

    #[test]
    fn test_headless_run_writes_changed_frames() {
        let dir = scratch_dir("frames");
        let config = config_for(&dir, "");
        let summary = run_with_config(&config).unwrap();

        assert_eq!(summary.frames, 3);
        assert_eq!(summary.aborted, 0);
        // The third frame is identical to the second.
        assert_eq!(summary.written, 2);
        assert_eq!(summary.unchanged, 1);
        assert!(frame_path(&dir.join("output"), 0).exists());
        assert!(frame_path(&dir.join("output"), 1).exists());
        assert!(!frame_path(&dir.join("output"), 2).exists());

        let json = std::fs::read_to_string(dir.join("state.json")).unwrap();
        let state: GimeState = serde_json::from_str(&json).unwrap();
        let mut gime = GimeVideo::default();
        gime.load_state(state).unwrap();
    }

    #[test]
    fn test_headless_applies_registers_and_palette() {
        let dir = scratch_dir("registers");
        let config = config_for(
            &dir,
            "\n[machine]\npalette = [1, 2, 3]\n\n[[machine.register]]\noffset = 8\nvalue = 0x80\n",
        );
        let gime = build_gime(&config).unwrap();
        assert_eq!(gime.read_palette(2), 3);
        assert_eq!(gime.registers().vmode, 0x80);
    }

    #[test]
    fn test_headless_runaway_frames_abort() {
        let dir = scratch_dir("runaway");
        let mut config = config_for(
            &dir,
            &[(0u8, 0u8), (4, 10), (7, 0x7F)]
                .iter()
                .map(|(reg, value)| {
                    format!(
                        "\n[[machine.register]]\noffset = 0\nvalue = {}\n\n[[machine.register]]\noffset = 1\nvalue = {}\n",
                        reg, value
                    )
                })
                .collect::<String>(),
        );
        config.emulator.tick_cap = 2000;
        config.headless.write_png = false;
        let summary = run_with_config(&config).unwrap();
        assert_eq!(summary.aborted, 3);
        assert_eq!(summary.ticks, 6000);
    }

    #[test]
    fn test_missing_font_is_an_error() {
        let dir = scratch_dir("font");
        let config = config_for(&dir, "\n[machine]\nfont = \"missing.fnt\"\n");
        let err = build_gime(&config).err().unwrap();
        assert!(format!("{:#}", err).contains("missing.fnt"));
    }
}

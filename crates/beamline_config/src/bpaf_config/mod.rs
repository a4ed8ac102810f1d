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

    beamline_config::bpaf_config::mod.rs

    Command line arguments, read with bpaf.

*/

use std::path::PathBuf;

use beamline_core::videocard::DisplayKind;

use bpaf::Bpaf;

#[derive(Bpaf)]
#[bpaf(options, version, generate(cli_args))]
#[derive(Debug, Default)]
pub struct CmdLineArgs {
    #[bpaf(long("config_file"), long("configfile"))]
    pub config_file: Option<PathBuf>,

    #[bpaf(long("base_dir"), long("basedir"))]
    pub base_dir: Option<PathBuf>,

    /// Number of frames to run
    #[bpaf(long)]
    pub frames: Option<u32>,

    /// Display type to render: rgb or composite
    #[bpaf(long)]
    pub display: Option<DisplayKind>,

    #[bpaf(long("output_dir"), long("outputdir"))]
    pub output_dir: Option<PathBuf>,

    /// Maximum character clocks per frame before a frame is aborted
    #[bpaf(long("tick_cap"), long("tickcap"))]
    pub tick_cap: Option<u32>,

    #[bpaf(long("line_doubling"), switch)]
    pub line_doubling: bool,

    #[bpaf(long("no_png"), switch)]
    pub no_png: bool,
}

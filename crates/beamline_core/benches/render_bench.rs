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

    benches::render_bench.rs

    Benchmarks for the video controller.

*/

use beamline_core::{
    devices::gime::{GimeVideo, MEMORY_SIZE_DEFAULT, VMODE_REGISTER, VRES_REGISTER},
    tracelogger::TraceLogger,
    videocard::DisplayKind,
};

use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn test_memory() -> Vec<u8> {
    (0..MEMORY_SIZE_DEFAULT).map(|i| (i * 13 + (i >> 7)) as u8).collect()
}

fn graphics_gime() -> GimeVideo {
    let mut gime = GimeVideo::new(TraceLogger::None, 65000, false);
    gime.write_register(VMODE_REGISTER, 0x80);
    gime.write_register(VRES_REGISTER, 0x1E);
    for i in 0..16 {
        gime.write_palette(i, i * 4);
    }
    gime
}

pub fn gime_tick_bench(c: &mut Criterion) {
    let mem = test_memory();

    c.bench_function("gime_bench_tick", |b| {
        let mut gime = graphics_gime();
        b.iter(|| {
            black_box(gime.tick(&mem));
        });
    });

    c.bench_function("gime_bench_frame", |b| {
        let mut gime = graphics_gime();
        b.iter(|| {
            black_box(gime.run_frame(&mem));
        });
    });
}

pub fn gime_render_bench(c: &mut Criterion) {
    let mem = test_memory();

    c.bench_function("gime_bench_render_rgb", |b| {
        let mut gime = graphics_gime();
        gime.run_frame(&mem);
        gime.run_frame(&mem);
        b.iter(|| {
            gime.set_all_dirty();
            black_box(gime.render(DisplayKind::Rgb));
        });
    });

    c.bench_function("gime_bench_render_composite", |b| {
        let mut gime = graphics_gime();
        gime.write_register(VRES_REGISTER, 0x15);
        gime.run_frame(&mem);
        gime.run_frame(&mem);
        b.iter(|| {
            gime.set_all_dirty();
            black_box(gime.render(DisplayKind::Composite));
        });
    });
}

criterion_group!(benches, gime_tick_bench, gime_render_bench);
criterion_main!(benches);

// Copyright (c) Facebook, Inc. and its affiliates.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::io;
use std::os::fd::AsFd;
use std::process::exit;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::Context;
use anyhow::Result;
use clap::CommandFactory;
use clap::Parser;
use slog::debug;
use slog::error;

use common::logutil::get_logger;
use common::logutil::set_current_log_level;
use sampling::SamplerDetector;
use termui::BarChart;
use termui::NonBlockGuard;
use termui::TerminalModeGuard;
use termui::TerminalSurface;
use termui::TerminalWindow;

mod monitor;

use monitor::Interrupted;
use monitor::Monitor;

/// Rows the dashboard occupies at the bottom of the terminal.
const SURFACE_HEIGHT: u16 = 11;

#[derive(Debug, Parser)]
#[command(name = "ifmeter")]
#[command(about = "Live terminal dashboard for one network interface's throughput")]
#[command(after_help = "Keys: r = received view, t = transmitted view, Ctrl-C = quit")]
struct Opt {
    /// Network interface to monitor, e.g. eth0
    iface: Option<String>,
    /// Log backend detection and other detail to stderr
    #[clap(short, long)]
    debug: bool,
}

fn run(iface: &str, stop: Arc<AtomicBool>) -> Result<()> {
    let logger = get_logger();
    let sampler = SamplerDetector::new().detect_sampler(iface)?;
    debug!(logger, "Monitoring interface";
        "iface" => iface, "backend" => sampler.name());

    let mut window = TerminalWindow::new().context("Failed to query terminal size")?;
    let min_width = BarChart::DEFAULT_LEGEND_WIDTH + 1;
    if window.width() < min_width || window.height() < SURFACE_HEIGHT {
        return Err(termui::Error::TooSmall(min_width, SURFACE_HEIGHT).into());
    }

    // Guard order matters: they unwind in reverse, so the terminal mode
    // is the last thing restored on the way out.
    let stdin = io::stdin();
    let _mode_guard =
        TerminalModeGuard::new(stdin.as_fd()).context("Failed to configure terminal mode")?;
    let _nonblock_guard =
        NonBlockGuard::new(stdin.as_fd()).context("Failed to configure stdin")?;

    let mut surface = TerminalSurface::new(window.width(), SURFACE_HEIGHT);
    let chart = BarChart::new();
    let chart_width = chart.chart_width(&surface) as usize;
    let monitor = Monitor::new(sampler, iface.to_string(), stop, chart_width)?;
    monitor.run(stdin.as_fd(), &mut window, &mut surface, &chart)
}

fn main() {
    let opt = Opt::parse();
    let Some(iface) = opt.iface else {
        // An omitted interface is an expected way to ask what the tool
        // wants, so usage goes to stdout.
        Opt::command().print_help().ok();
        exit(1);
    };
    if opt.debug {
        set_current_log_level(slog::Level::Debug);
    }
    let logger = get_logger();

    let stop = Arc::new(AtomicBool::new(false));
    if let Err(e) = signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop)) {
        error!(logger, "Failed to install interrupt handler: {}", e);
        exit(1);
    }

    exit(match run(&iface, stop) {
        Ok(()) => 0,
        // Ctrl-C is the expected way to stop; every guard has already
        // unwound by the time the error reaches here.
        Err(e) if e.is::<Interrupted>() => 0,
        Err(e) => {
            error!(logger, "{:#}", e);
            1
        }
    });
}

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
use std::os::fd::BorrowedFd;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use chrono::Local;
use nix::errno::Errno;
use nix::unistd;
use sampling::Sample;
use sampling::Sampler;
use sampling::TimeSeries;
use termui::BarChart;
use termui::TerminalSurface;
use termui::TerminalWindow;

/// Nominal cadence of one loop iteration; also the bucket width of both
/// series.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// The input budget is spent in many short sleeps so a command key is
/// picked up within ~10ms of the keypress.
const INPUT_SLICES: u32 = 100;

/// Ring retention, as a multiple of the chart width at startup. Wide
/// enough to survive moderate resizes without losing visible history.
const SERIES_CAPACITY_FACTOR: usize = 4;

/// Special error that indicates the user asked the program to stop. The
/// interrupt signal only raises a flag; the input phase turns the flag
/// into this error so the stack unwinds through every live guard before
/// the process exits cleanly.
#[derive(Clone, Debug)]
pub struct Interrupted;

impl std::error::Error for Interrupted {}

impl std::fmt::Display for Interrupted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Interrupted by user")
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Rx,
    Tx,
}

/// The interactive scheduler: one thread, one iteration per second,
/// input polling strictly before sampling strictly before rendering.
pub struct Monitor {
    sampler: Sampler,
    iface: String,
    mode: DisplayMode,
    rx_series: TimeSeries,
    tx_series: TimeSeries,
    prev: Sample,
    stop: Arc<AtomicBool>,
}

impl Monitor {
    /// Takes the first sample immediately; its timestamp anchors bucket
    /// 0 of both series.
    pub fn new(
        sampler: Sampler,
        iface: String,
        stop: Arc<AtomicBool>,
        chart_width: usize,
    ) -> Result<Monitor> {
        let prev = sampler
            .get_sample(&iface)
            .context("Initial sample failed")?;
        let start = prev.captured_at;
        let capacity = (chart_width * SERIES_CAPACITY_FACTOR).max(256);
        Ok(Monitor {
            sampler,
            iface,
            mode: DisplayMode::Rx,
            rx_series: TimeSeries::new(SAMPLE_INTERVAL, start, capacity),
            tx_series: TimeSeries::new(SAMPLE_INTERVAL, start, capacity),
            prev,
            stop,
        })
    }

    /// Runs until interrupted or until the sampler fails. Never returns
    /// `Ok`; the `Result` only carries the unwinding error path.
    /// `input` is the descriptor keyboard commands arrive on — stdin in
    /// production, already switched to non-blocking by the caller.
    pub fn run(
        mut self,
        input: BorrowedFd<'_>,
        window: &mut TerminalWindow,
        surface: &mut TerminalSurface,
        chart: &BarChart,
    ) -> Result<()> {
        let mut out = io::stdout();
        surface.attach(&mut out)?;
        loop {
            if let Some(mode) = self.poll_input(input, surface, &mut out)? {
                self.mode = mode;
            }
            self.take_sample()?;
            self.render(window, surface, chart, &mut out)?;
        }
    }

    /// Input phase: sleeps in short slices while draining non-blocking
    /// stdin. A command key ends the phase early so the next sample is
    /// taken sooner than the nominal cadence; the remaining budget is
    /// deliberately not topped up.
    fn poll_input(
        &self,
        input: BorrowedFd<'_>,
        surface: &mut TerminalSurface,
        out: &mut impl io::Write,
    ) -> Result<Option<DisplayMode>> {
        let slice = SAMPLE_INTERVAL / INPUT_SLICES;
        for _ in 0..INPUT_SLICES {
            if self.stop.load(Ordering::Relaxed) {
                return Err(Interrupted.into());
            }
            thread::sleep(slice);
            let mut buf = [0u8; 64];
            loop {
                match unistd::read(input, &mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        for &byte in &buf[..n] {
                            match byte {
                                b'r' => return Ok(Some(DisplayMode::Rx)),
                                b't' => return Ok(Some(DisplayMode::Tx)),
                                b'\n' => surface.on_carriage_return(out)?,
                                _ => {}
                            }
                        }
                    }
                    Err(Errno::EAGAIN) => break,
                    Err(e) => return Err(e).context("Failed to read keyboard input"),
                }
            }
        }
        Ok(None)
    }

    /// Sampling phase: one counter read, deltas into both series at the
    /// sample's own timestamp.
    fn take_sample(&mut self) -> Result<()> {
        let sample = self
            .sampler
            .get_sample(&self.iface)
            .context("Sampler failed mid-run")?;
        let (rx_delta, tx_delta) = deltas(&self.prev, &sample);
        self.rx_series.set(sample.captured_at, rx_delta);
        self.tx_series.set(sample.captured_at, tx_delta);
        self.prev = sample;
        Ok(())
    }

    /// Render phase: adopt any resize, then draw the mode's series.
    fn render(
        &self,
        window: &mut TerminalWindow,
        surface: &mut TerminalSurface,
        chart: &BarChart,
        out: &mut impl io::Write,
    ) -> Result<()> {
        if window.refresh()? {
            surface.resize(window.width(), out)?;
        }
        let (series, label) = match self.mode {
            DisplayMode::Rx => (&self.rx_series, "received"),
            DisplayMode::Tx => (&self.tx_series, "transmitted"),
        };
        let values = series.get_slice_from_end(chart.chart_width(surface) as usize);
        chart.draw_bars_from_right(surface, label, &values, Local::now());
        surface.draw(out)?;
        Ok(())
    }
}

/// Difference of two cumulative counter readings. A counter that went
/// backwards (interface reset, wrap) records a zero bucket instead of a
/// garbage spike.
fn deltas(prev: &Sample, next: &Sample) -> (u64, u64) {
    (
        next.rx_bytes.checked_sub(prev.rx_bytes).unwrap_or(0),
        next.tx_bytes.checked_sub(prev.tx_bytes).unwrap_or(0),
    )
}

#[cfg(test)]
mod test {
    use std::os::fd::AsFd;
    use std::path::PathBuf;
    use std::time::Instant;

    use termui::NonBlockGuard;

    use super::*;

    fn sample(rx: u64, tx: u64) -> Sample {
        Sample {
            rx_bytes: rx,
            tx_bytes: tx,
            captured_at: Instant::now(),
        }
    }

    struct TestNet {
        tempdir: tempfile::TempDir,
    }

    impl TestNet {
        fn new(rx: &str, tx: &str) -> TestNet {
            let tempdir = tempfile::TempDir::new().expect("Failed to create tempdir");
            let stats = tempdir.path().join("eth0").join("statistics");
            std::fs::create_dir_all(&stats).expect("Failed to create statistics dir");
            let net = TestNet { tempdir };
            net.write("rx_bytes", rx);
            net.write("tx_bytes", tx);
            net
        }

        fn stats(&self) -> PathBuf {
            self.tempdir.path().join("eth0").join("statistics")
        }

        fn write(&self, name: &str, value: &str) {
            std::fs::write(self.stats().join(name), value).expect("Failed to write counter");
        }

        fn monitor(&self, stop: Arc<AtomicBool>) -> Monitor {
            let sampler = Sampler::Sysfs(sampling::SysfsSampler::new_with_custom_root(
                self.tempdir.path().to_path_buf(),
            ));
            Monitor::new(sampler, "eth0".to_string(), stop, 80)
                .expect("Failed to build monitor")
        }
    }

    /// A pre-filled non-blocking pipe standing in for the keyboard.
    fn keyboard(bytes: &[u8]) -> (std::os::fd::OwnedFd, std::os::fd::OwnedFd) {
        let (rd, wr) = unistd::pipe().expect("Failed to create pipe");
        unistd::write(wr.as_fd(), bytes).expect("Failed to fill pipe");
        (rd, wr)
    }

    #[test]
    fn test_consecutive_deltas() {
        let a = sample(1000, 10);
        let b = sample(1500, 30);
        let c = sample(1700, 30);
        assert_eq!(deltas(&a, &b), (500, 20));
        assert_eq!(deltas(&b, &c), (200, 0));
    }

    #[test]
    fn test_counter_reset_records_zero() {
        let a = sample(5000, 5000);
        let b = sample(100, 100);
        assert_eq!(deltas(&a, &b), (0, 0));
    }

    #[test]
    fn test_take_sample_feeds_both_series() {
        let net = tempfile::TempDir::new().expect("Failed to create tempdir");
        let stats = net.path().join("eth0").join("statistics");
        std::fs::create_dir_all(&stats).expect("Failed to create statistics dir");
        let write = |name: &str, value: &str| {
            std::fs::write(stats.join(name), value).expect("Failed to write counter");
        };
        write("rx_bytes", "1000\n");
        write("tx_bytes", "10\n");

        let sampler = Sampler::Sysfs(sampling::SysfsSampler::new_with_custom_root(
            net.path().to_path_buf(),
        ));
        let stop = Arc::new(AtomicBool::new(false));
        let mut monitor =
            Monitor::new(sampler, "eth0".to_string(), stop, 80).expect("Failed to build monitor");

        write("rx_bytes", "1500\n");
        write("tx_bytes", "30\n");
        monitor.take_sample().expect("Sampling failed");

        // Both samples land in bucket 0 at this speed; the bucket holds
        // the delta against the initial reading.
        assert_eq!(monitor.rx_series.get_slice_from_end(1), vec![500]);
        assert_eq!(monitor.tx_series.get_slice_from_end(1), vec![20]);
        assert_eq!(monitor.prev.rx_bytes, 1500);
    }

    #[test]
    fn test_command_key_ends_input_phase_early() {
        let net = TestNet::new("1000\n", "10\n");
        let stop = Arc::new(AtomicBool::new(false));
        let monitor = net.monitor(stop);
        let (rd, _wr) = keyboard(b"t");
        let _nonblock = NonBlockGuard::new(rd.as_fd()).expect("Failed to set non-blocking");
        let mut surface = TerminalSurface::new(40, 5);
        let mut out = Vec::new();

        let began = Instant::now();
        let mode = monitor
            .poll_input(rd.as_fd(), &mut surface, &mut out)
            .expect("Input phase failed");

        assert_eq!(mode, Some(DisplayMode::Tx));
        // A buffered key must cut the phase short, not wait out the full
        // one second budget.
        assert!(began.elapsed() < Duration::from_millis(500));
    }

    #[test]
    fn test_newline_reanchors_without_ending_phase() {
        let net = TestNet::new("1000\n", "10\n");
        let stop = Arc::new(AtomicBool::new(false));
        let monitor = net.monitor(stop);
        let (rd, _wr) = keyboard(b"\n");
        let _nonblock = NonBlockGuard::new(rd.as_fd()).expect("Failed to set non-blocking");
        let mut surface = TerminalSurface::new(40, 5);
        let mut out = Vec::new();

        let began = Instant::now();
        let mode = monitor
            .poll_input(rd.as_fd(), &mut surface, &mut out)
            .expect("Input phase failed");

        assert_eq!(mode, None);
        // The re-anchor repaint went out while the phase kept sleeping
        // through its remaining slices.
        assert!(!out.is_empty());
        assert!(began.elapsed() >= Duration::from_millis(900));
    }

    #[test]
    fn test_stop_flag_turns_into_interrupted() {
        let net = TestNet::new("1000\n", "10\n");
        let stop = Arc::new(AtomicBool::new(false));
        let monitor = net.monitor(Arc::clone(&stop));
        stop.store(true, Ordering::Relaxed);
        let (rd, _wr) = keyboard(b"");
        let _nonblock = NonBlockGuard::new(rd.as_fd()).expect("Failed to set non-blocking");
        let mut surface = TerminalSurface::new(40, 5);
        let mut out = Vec::new();

        let err = monitor
            .poll_input(rd.as_fd(), &mut surface, &mut out)
            .expect_err("Raised stop flag must end the phase");
        assert!(err.is::<Interrupted>());
    }
}

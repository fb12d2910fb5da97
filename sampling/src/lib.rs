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

#![deny(clippy::all)]

use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

mod cmd;
mod detector;
mod procfs;
mod sysfs;
mod time_series;

pub use cmd::IpCmdSampler;
pub use cmd::NetstatCmdSampler;
pub use detector::SamplerDetector;
pub use procfs::ProcfsSampler;
pub use sysfs::SysfsSampler;
pub use time_series::TimeSeries;

#[cfg(test)]
mod test;

pub const NET_SYSFS: &str = "/sys/class/net";
pub const NET_PROCFS_DEV: &str = "/proc/net/dev";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0} cannot see interface {1}")]
    Unavailable(String, String),
    #[error("Failed to parse {item} in line: {line} from {origin}")]
    ParseError {
        origin: String,
        line: String,
        item: String,
    },
    #[error("{0}: {1}")]
    IoError(PathBuf, #[source] std::io::Error),
    #[error("No working sampler for interface {0}")]
    NoSampler(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// One reading of an interface's cumulative byte counters.
///
/// `rx_bytes`/`tx_bytes` are the totals the OS reports, not deltas; they
/// only ever grow unless the interface itself is reset. `captured_at` is
/// stamped from the monotonic clock adjacent to the counter read so that
/// wall clock jumps never perturb interval math.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub captured_at: Instant,
}

/// A strategy for reading one interface's traffic counters.
///
/// The set of strategies is closed and known at compile time, so this is
/// a sum type rather than a trait object. Variants are ordered here the
/// way the detector probes them.
#[derive(Debug)]
pub enum Sampler {
    /// Per-interface statistics pseudo-files under /sys/class/net.
    Sysfs(SysfsSampler),
    /// The /proc/net/dev table.
    Procfs(ProcfsSampler),
    /// Parsed `ip -s link` output.
    IpCmd(IpCmdSampler),
    /// Parsed BSD `netstat -ibn` output.
    NetstatCmd(NetstatCmdSampler),
}

impl Sampler {
    pub fn get_sample(&self, iface: &str) -> Result<Sample> {
        match self {
            Self::Sysfs(s) => s.get_sample(iface),
            Self::Procfs(s) => s.get_sample(iface),
            Self::IpCmd(s) => s.get_sample(iface),
            Self::NetstatCmd(s) => s.get_sample(iface),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sysfs(_) => "sysfs",
            Self::Procfs(_) => "procfs",
            Self::IpCmd(_) => "ip",
            Self::NetstatCmd(_) => "netstat",
        }
    }
}

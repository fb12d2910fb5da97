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

use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::Error;
use crate::NET_SYSFS;
use crate::Result;
use crate::Sample;

/// Reads cumulative byte counters from the per-interface statistics
/// pseudo-files under /sys/class/net. Cheapest and most portable source
/// on modern kernels, so the detector tries it first.
#[derive(Debug)]
pub struct SysfsSampler {
    root: PathBuf,
}

impl SysfsSampler {
    pub fn new() -> SysfsSampler {
        Self::new_with_custom_root(Path::new(NET_SYSFS).to_path_buf())
    }

    pub fn new_with_custom_root(root: PathBuf) -> SysfsSampler {
        SysfsSampler { root }
    }

    pub fn get_sample(&self, iface: &str) -> Result<Sample> {
        let stats_dir = self.root.join(iface).join("statistics");
        let captured_at = Instant::now();
        let rx_bytes = Self::read_counter(&stats_dir, "rx_bytes", iface)?;
        let tx_bytes = Self::read_counter(&stats_dir, "tx_bytes", iface)?;
        Ok(Sample {
            rx_bytes,
            tx_bytes,
            captured_at,
        })
    }

    fn read_counter(stats_dir: &Path, name: &str, iface: &str) -> Result<u64> {
        let path = stats_dir.join(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::Unavailable("sysfs".to_string(), iface.to_string()));
            }
            Err(e) => return Err(Error::IoError(path, e)),
        };
        let line = content.trim();
        line.parse::<u64>().map_err(|_| Error::ParseError {
            origin: path.display().to_string(),
            line: line.to_string(),
            item: name.to_string(),
        })
    }
}

impl Default for SysfsSampler {
    fn default() -> Self {
        Self::new()
    }
}

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

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use crate::Error;
use crate::NET_PROCFS_DEV;
use crate::Result;
use crate::Sample;

// Column positions within an interface row, counted after the "name:"
// token. Fixed by the /proc/net/dev format:
//   rx: bytes packets errs drop fifo frame compressed multicast
//   tx: bytes packets errs drop fifo colls carrier compressed
const RX_BYTES_COL: usize = 0;
const TX_BYTES_COL: usize = 8;

/// Parses the /proc/net/dev table. Universal fallback when sysfs is not
/// usable.
#[derive(Debug)]
pub struct ProcfsSampler {
    path: PathBuf,
}

impl ProcfsSampler {
    pub fn new() -> ProcfsSampler {
        Self::new_with_custom_path(Path::new(NET_PROCFS_DEV).to_path_buf())
    }

    pub fn new_with_custom_path(path: PathBuf) -> ProcfsSampler {
        ProcfsSampler { path }
    }

    pub fn get_sample(&self, iface: &str) -> Result<Sample> {
        let captured_at = Instant::now();
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(_) => {
                return Err(Error::Unavailable("procfs".to_string(), iface.to_string()));
            }
        };
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| Error::IoError(self.path.clone(), e))?;
            // Header lines carry a '|' separator and never match a name.
            let Some((name, counters)) = line.split_once(':') else {
                continue;
            };
            if name.trim() != iface {
                continue;
            }
            let (rx_bytes, tx_bytes) = Self::parse_row(&self.path, &line, counters)?;
            return Ok(Sample {
                rx_bytes,
                tx_bytes,
                captured_at,
            });
        }
        Err(Error::Unavailable("procfs".to_string(), iface.to_string()))
    }

    fn parse_row(path: &Path, line: &str, counters: &str) -> Result<(u64, u64)> {
        let fields: Vec<&str> = counters.split_whitespace().collect();
        let parse = |col: usize, item: &str| -> Result<u64> {
            fields
                .get(col)
                .and_then(|f| f.parse::<u64>().ok())
                .ok_or_else(|| Error::ParseError {
                    origin: path.display().to_string(),
                    line: line.to_string(),
                    item: item.to_string(),
                })
        };
        Ok((
            parse(RX_BYTES_COL, "rx_bytes")?,
            parse(TX_BYTES_COL, "tx_bytes")?,
        ))
    }
}

impl Default for ProcfsSampler {
    fn default() -> Self {
        Self::new()
    }
}

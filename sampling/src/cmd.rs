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

//! Samplers that parse the output of external tools. These pay a process
//! spawn per sample and track output-format drift, so the detector tries
//! them only after the pseudo-file backends.

use std::process::Command;
use std::time::Instant;

use once_cell::sync::OnceCell;
use regex::Regex;

use crate::Error;
use crate::Result;
use crate::Sample;

fn run_capture(program: &str, args: &[&str], iface: &str) -> Result<String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|_| Error::Unavailable(program.to_string(), iface.to_string()))?;
    if !output.status.success() {
        return Err(Error::Unavailable(program.to_string(), iface.to_string()));
    }
    String::from_utf8(output.stdout).map_err(|_| Error::ParseError {
        origin: program.to_string(),
        line: "<non-utf8 output>".to_string(),
        item: "stdout".to_string(),
    })
}

/// Parses `ip -s link show dev <iface>`. The statistics block looks like:
///
/// ```text
///     RX:  bytes packets errors dropped  missed   mcast
///       74163887  158584      0       0       0       0
///     TX:  bytes packets errors dropped carrier collsns
///        4143021   32377      0       0       0       0
/// ```
#[derive(Debug)]
pub struct IpCmdSampler {
    program: String,
    // Compiled on first use and reused for every later sample.
    rx_locator: OnceCell<Regex>,
    tx_locator: OnceCell<Regex>,
}

impl IpCmdSampler {
    pub fn new() -> IpCmdSampler {
        Self::new_with_custom_program("ip".to_string())
    }

    pub fn new_with_custom_program(program: String) -> IpCmdSampler {
        IpCmdSampler {
            program,
            rx_locator: OnceCell::new(),
            tx_locator: OnceCell::new(),
        }
    }

    pub fn get_sample(&self, iface: &str) -> Result<Sample> {
        let stdout = run_capture(&self.program, &["-s", "link", "show", "dev", iface], iface)?;
        let captured_at = Instant::now();
        let (rx_bytes, tx_bytes) = self.parse_output(&stdout)?;
        Ok(Sample {
            rx_bytes,
            tx_bytes,
            captured_at,
        })
    }

    fn locate(&self, cell: &OnceCell<Regex>, marker: &str, stdout: &str) -> Result<u64> {
        let re = cell.get_or_init(|| {
            // The counter line directly follows the "RX:"/"TX:" header.
            Regex::new(&format!(r"(?m)^\s*{marker}:[^\n]*\n\s*(\d+)"))
                .expect("statistics locator pattern is valid")
        });
        let captures = re.captures(stdout).ok_or_else(|| Error::ParseError {
            origin: self.program.clone(),
            line: stdout.lines().next().unwrap_or_default().to_string(),
            item: format!("{marker} bytes"),
        })?;
        captures[1].parse::<u64>().map_err(|_| Error::ParseError {
            origin: self.program.clone(),
            line: captures[0].to_string(),
            item: format!("{marker} bytes"),
        })
    }

    pub(crate) fn parse_output(&self, stdout: &str) -> Result<(u64, u64)> {
        let rx_bytes = self.locate(&self.rx_locator, "RX", stdout)?;
        let tx_bytes = self.locate(&self.tx_locator, "TX", stdout)?;
        Ok((rx_bytes, tx_bytes))
    }
}

impl Default for IpCmdSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Parses BSD `netstat -ibn -I <iface>`. Column order varies between
/// systems, so the Ibytes/Obytes positions are located from the header
/// row once and cached.
#[derive(Debug)]
pub struct NetstatCmdSampler {
    program: String,
    columns: OnceCell<(usize, usize)>,
}

impl NetstatCmdSampler {
    pub fn new() -> NetstatCmdSampler {
        Self::new_with_custom_program("netstat".to_string())
    }

    pub fn new_with_custom_program(program: String) -> NetstatCmdSampler {
        NetstatCmdSampler {
            program,
            columns: OnceCell::new(),
        }
    }

    pub fn get_sample(&self, iface: &str) -> Result<Sample> {
        let stdout = run_capture(&self.program, &["-ibn", "-I", iface], iface)?;
        let captured_at = Instant::now();
        let (rx_bytes, tx_bytes) = self.parse_output(&stdout, iface)?;
        Ok(Sample {
            rx_bytes,
            tx_bytes,
            captured_at,
        })
    }

    fn parse_error(&self, line: &str, item: &str) -> Error {
        Error::ParseError {
            origin: self.program.clone(),
            line: line.to_string(),
            item: item.to_string(),
        }
    }

    pub(crate) fn parse_output(&self, stdout: &str, iface: &str) -> Result<(u64, u64)> {
        let mut lines = stdout.lines();
        let header = lines
            .next()
            .ok_or_else(|| self.parse_error("<empty output>", "header"))?;
        let (ibytes_col, obytes_col) = *self.columns.get_or_try_init(|| {
            let names: Vec<&str> = header.split_whitespace().collect();
            let find = |wanted: &str| {
                names
                    .iter()
                    .position(|n| *n == wanted)
                    .ok_or_else(|| self.parse_error(header, wanted))
            };
            Ok::<_, Error>((find("Ibytes")?, find("Obytes")?))
        })?;
        for line in lines {
            let fields: Vec<&str> = line.split_whitespace().collect();
            // Interfaces with multiple addresses repeat the row; the name
            // may carry a '*' suffix when the link is down.
            let matches = fields
                .first()
                .is_some_and(|name| name.trim_end_matches('*') == iface);
            if !matches {
                continue;
            }
            let parse = |col: usize, item: &str| -> Result<u64> {
                fields
                    .get(col)
                    .and_then(|f| f.parse::<u64>().ok())
                    .ok_or_else(|| self.parse_error(line, item))
            };
            return Ok((parse(ibytes_col, "Ibytes")?, parse(obytes_col, "Obytes")?));
        }
        Err(Error::Unavailable(
            self.program.clone(),
            iface.to_string(),
        ))
    }
}

impl Default for NetstatCmdSampler {
    fn default() -> Self {
        Self::new()
    }
}

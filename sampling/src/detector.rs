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

use slog::debug;

use common::logutil::get_logger;

use crate::Error;
use crate::IpCmdSampler;
use crate::NetstatCmdSampler;
use crate::ProcfsSampler;
use crate::Result;
use crate::Sampler;
use crate::SysfsSampler;

/// Selects a working sampler backend at startup.
///
/// Candidates are probed strictly in priority order with one trial call
/// each; the first that answers for the requested interface wins and is
/// kept for the life of the process. Later failures of the chosen
/// backend are surfaced to the caller, never papered over by retrying
/// the remaining candidates.
pub struct SamplerDetector {
    candidates: Vec<Sampler>,
}

impl SamplerDetector {
    pub fn new() -> SamplerDetector {
        Self::with_candidates(vec![
            Sampler::Sysfs(SysfsSampler::new()),
            Sampler::Procfs(ProcfsSampler::new()),
            Sampler::IpCmd(IpCmdSampler::new()),
            Sampler::NetstatCmd(NetstatCmdSampler::new()),
        ])
    }

    pub fn with_candidates(candidates: Vec<Sampler>) -> SamplerDetector {
        SamplerDetector { candidates }
    }

    /// Probes the candidates and hands ownership of the first working
    /// one to the caller.
    pub fn detect_sampler(self, iface: &str) -> Result<Sampler> {
        let logger = get_logger();
        for candidate in self.candidates {
            match candidate.get_sample(iface) {
                Ok(_) => {
                    debug!(logger, "Selected sampler backend";
                        "backend" => candidate.name(), "iface" => iface);
                    return Ok(candidate);
                }
                Err(e) => {
                    debug!(logger, "Skipping sampler backend";
                        "backend" => candidate.name(), "error" => %e);
                }
            }
        }
        Err(Error::NoSampler(iface.to_string()))
    }
}

impl Default for SamplerDetector {
    fn default() -> Self {
        Self::new()
    }
}

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

use nix::sys::signal::SigSet;
use nix::sys::signal::SigmaskHow;
use nix::sys::signal::Signal;
use nix::sys::signal::sigprocmask;

use crate::Result;

/// Holds a set of signals blocked for the guard's scope.
///
/// Wrapped around multi-step mutations of shared terminal state so a
/// handled signal cannot observe the state half-applied. Dropping the
/// guard restores the previous mask.
pub struct SignalSuspender {
    prev: SigSet,
}

impl SignalSuspender {
    pub fn new(signals: &[Signal]) -> Result<SignalSuspender> {
        let mut set = SigSet::empty();
        for signal in signals {
            set.add(*signal);
        }
        let mut prev = SigSet::empty();
        sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set), Some(&mut prev))?;
        Ok(SignalSuspender { prev })
    }
}

impl Drop for SignalSuspender {
    fn drop(&mut self) {
        // Restore is best effort; there is no way to report failure from
        // an unwind path.
        let _ = sigprocmask(SigmaskHow::SIG_SETMASK, Some(&self.prev), None);
    }
}

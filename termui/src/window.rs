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

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use nix::errno::Errno;

use crate::Error;
use crate::Result;

/// Tracks the terminal's dimensions across SIGWINCH.
///
/// The signal handler only raises a flag; the size itself is re-queried
/// with TIOCGWINSZ from `refresh`, which the render loop calls between
/// frames. Nothing here runs in signal context beyond the flag store.
pub struct TerminalWindow {
    width: u16,
    height: u16,
    resized: Arc<AtomicBool>,
}

impl TerminalWindow {
    pub fn new() -> Result<TerminalWindow> {
        let resized = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal_hook::consts::SIGWINCH, Arc::clone(&resized))?;
        let (width, height) = Self::query_size()?;
        Ok(TerminalWindow {
            width,
            height,
            resized,
        })
    }

    fn query_size() -> Result<(u16, u16)> {
        let mut ws = libc::winsize {
            ws_row: 0,
            ws_col: 0,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
        if rc != 0 {
            return Err(Error::Errno(Errno::last()));
        }
        Ok((ws.ws_col, ws.ws_row))
    }

    /// Re-queries the size if a resize notification arrived since the
    /// last call. Returns whether the dimensions changed.
    pub fn refresh(&mut self) -> Result<bool> {
        if !self.resized.swap(false, Ordering::Relaxed) {
            return Ok(false);
        }
        let (width, height) = Self::query_size()?;
        let changed = width != self.width || height != self.height;
        self.width = width;
        self.height = height;
        Ok(changed)
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }
}

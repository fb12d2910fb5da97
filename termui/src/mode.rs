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

use std::os::fd::BorrowedFd;

use nix::sys::signal::Signal;
use nix::sys::termios;
use nix::sys::termios::LocalFlags;
use nix::sys::termios::SetArg;
use nix::sys::termios::Termios;

use crate::Result;
use crate::SignalSuspender;

/// Scoped raw-ish terminal mode: echo and canonical line editing off so
/// single-key commands arrive immediately. The saved termios is restored
/// on drop, on every exit path including unwind.
pub struct TerminalModeGuard<'fd> {
    fd: BorrowedFd<'fd>,
    saved: Termios,
}

impl<'fd> TerminalModeGuard<'fd> {
    pub fn new(fd: BorrowedFd<'fd>) -> Result<TerminalModeGuard<'fd>> {
        let saved = termios::tcgetattr(fd)?;
        let mut altered = saved.clone();
        altered.local_flags &= !(LocalFlags::ECHO | LocalFlags::ICANON);
        // A resize or interrupt delivered between tcgetattr and tcsetattr
        // must not run its handler against a half-configured terminal.
        let _suspend = SignalSuspender::new(&[Signal::SIGINT, Signal::SIGWINCH])?;
        termios::tcsetattr(fd, SetArg::TCSANOW, &altered)?;
        Ok(TerminalModeGuard { fd, saved })
    }
}

impl Drop for TerminalModeGuard<'_> {
    fn drop(&mut self) {
        let _ = termios::tcsetattr(self.fd, SetArg::TCSANOW, &self.saved);
    }
}

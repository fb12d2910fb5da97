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

use nix::fcntl::FcntlArg;
use nix::fcntl::OFlag;
use nix::fcntl::fcntl;

use crate::Result;

/// Scoped O_NONBLOCK on a descriptor, so the input phase's reads can
/// never stall the loop. The saved status flags are restored on drop.
pub struct NonBlockGuard<'fd> {
    fd: BorrowedFd<'fd>,
    saved: OFlag,
}

impl<'fd> NonBlockGuard<'fd> {
    pub fn new(fd: BorrowedFd<'fd>) -> Result<NonBlockGuard<'fd>> {
        let bits = fcntl(fd, FcntlArg::F_GETFL)?;
        let saved = OFlag::from_bits_truncate(bits);
        fcntl(fd, FcntlArg::F_SETFL(saved | OFlag::O_NONBLOCK))?;
        Ok(NonBlockGuard { fd, saved })
    }
}

impl Drop for NonBlockGuard<'_> {
    fn drop(&mut self) {
        let _ = fcntl(self.fd, FcntlArg::F_SETFL(self.saved));
    }
}

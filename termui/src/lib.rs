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

use thiserror::Error;

mod chart;
mod fdstatus;
mod format;
mod mode;
mod signals;
mod surface;
mod window;

pub use chart::BarChart;
pub use fdstatus::NonBlockGuard;
pub use format::format_byte_rate;
pub use format::format_xaxis;
pub use mode::TerminalModeGuard;
pub use signals::SignalSuspender;
pub use surface::TerminalSurface;
pub use window::TerminalWindow;


#[derive(Error, Debug)]
pub enum Error {
    #[error("Terminal control failed: {0}")]
    Errno(#[from] nix::errno::Errno),
    #[error("Failed to write to terminal: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Terminal too small: need at least {0} columns and {1} rows")]
    TooSmall(u16, u16),
}

pub type Result<T> = std::result::Result<T, Error>;

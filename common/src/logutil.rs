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

use std::sync::RwLock;

use once_cell::sync::Lazy;
use slog::Drain;
use slog::Level;

/// Messages at or above this level reach stderr.
static LOG_LEVEL: Lazy<RwLock<Level>> = Lazy::new(|| RwLock::new(Level::Info));

static LOGGER: Lazy<slog::Logger> = Lazy::new(|| {
    let decorator = slog_term::PlainSyncDecorator::new(std::io::stderr());
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    // The level is consulted per record, so changing it takes effect on
    // loggers handed out earlier.
    let drain = drain
        .filter(|record| record.level().is_at_least(current_log_level()))
        .fuse();
    slog::Logger::root(drain, slog::o!())
});

/// Changes the level for every logger, past and future.
pub fn set_current_log_level(level: Level) {
    let mut log_level = LOG_LEVEL
        .write()
        .expect("Failed to acquire write lock on LOG_LEVEL");
    *log_level = level;
}

pub fn current_log_level() -> Level {
    *LOG_LEVEL
        .read()
        .expect("Failed to acquire read lock on LOG_LEVEL")
}

/// Process-wide logger. Writes to stderr so log lines survive even when
/// the dashboard owns stdout; steady-state rendering does not log.
pub fn get_logger() -> slog::Logger {
    LOGGER.clone()
}

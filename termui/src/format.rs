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

use chrono::DateTime;
use chrono::Local;
use chrono::Timelike;

/// Binary prefixes by 10-bit shift.
const UNITS: &[(u32, &str)] = &[(0, "b"), (10, "Kb"), (20, "Mb"), (30, "Gb"), (40, "Tb")];

/// Human-scaled byte rate, at most 4 significant characters,
/// right-justified to 4 columns: `1023 b/s`, ` 1.5 Kb/s`, ` 123 Mb/s`.
pub fn format_byte_rate(num: u64, time_unit: &str) -> String {
    let mut int_part: u64 = 0;
    let mut dec_part: u64 = 0;
    let mut unit = "b";

    for &(exponent, name) in UNITS.iter().rev() {
        let val = num >> exponent;
        if val > 0 {
            int_part = val;
            unit = name;
            if exponent >= 10 {
                // Remainder below the chosen unit, in thousandths.
                dec_part = (num >> (exponent - 10)) - (val << 10);
            }
            break;
        }
    }

    let truncated = if dec_part == 0 {
        int_part.to_string()
    } else {
        let reconstructed = int_part as f64 + dec_part as f64 / 1000.0;
        let formatted = format!("{:.3}", reconstructed);
        let keep = if reconstructed >= 1000.0 {
            4 // 1023.45 -> 1023
        } else if reconstructed >= 100.0 {
            3 // 123.456 -> 123
        } else {
            4 // 12.345 -> 12.3
        };
        formatted[..keep].to_string()
    };

    format!("{:>4} {}/{}", truncated, unit, time_unit)
}

fn format_ss(tick: DateTime<Local>) -> String {
    format!("{:02}", tick.second())
}

/// Seconds axis under the chart: a two-digit label every fourth second,
/// consuming the following column so neighboring labels never collide.
pub fn format_xaxis(ticks: &[DateTime<Local>]) -> String {
    let mut axis = String::with_capacity(ticks.len());
    let mut chars_to_skip = 0;

    for (i, tick) in ticks.iter().enumerate() {
        if chars_to_skip > 0 {
            chars_to_skip -= 1;
            continue;
        }
        let remaining = ticks.len() - 1 - i;
        if tick.second() % 4 == 0 && remaining >= 1 {
            axis.push_str(&format_ss(*tick));
            chars_to_skip = 1;
        } else {
            axis.push(' ');
        }
    }

    axis
}

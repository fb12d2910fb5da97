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
use chrono::Duration as ChronoDuration;
use chrono::Local;

use crate::TerminalSurface;
use crate::format::format_byte_rate;
use crate::format::format_xaxis;

const BAR: char = '|';

/// Scrolling bar chart over the right-hand portion of a surface, with a
/// rate legend on the left and a seconds axis along the bottom.
pub struct BarChart {
    legend_width: u16,
}

impl BarChart {
    pub const DEFAULT_LEGEND_WIDTH: u16 = 10;

    pub fn new() -> BarChart {
        BarChart {
            legend_width: Self::DEFAULT_LEGEND_WIDTH,
        }
    }

    /// Columns available for bars on `surface`.
    pub fn chart_width(&self, surface: &TerminalSurface) -> u16 {
        surface.width().saturating_sub(self.legend_width)
    }

    /// Rows a value of `value` fills out of `rows`, against peak `max`.
    /// Any non-zero value shows at least one cell.
    fn bar_height(value: u64, max: u64, rows: u16) -> u16 {
        if value == 0 || max == 0 {
            return 0;
        }
        let rows = rows as u64;
        (value.saturating_mul(rows).div_ceil(max)).min(rows) as u16
    }

    /// Renders `values` (chronological, newest last) right-aligned into
    /// the grid. `values` must be exactly `chart_width` long; the series
    /// store guarantees that by zero-padding at the head.
    pub fn draw_bars_from_right(
        &self,
        surface: &mut TerminalSurface,
        label: &str,
        values: &[u64],
        now: DateTime<Local>,
    ) {
        let height = surface.height();
        if height < 2 {
            return;
        }
        let bar_rows = height - 1;
        let axis_row = height - 1;
        let max = values.iter().copied().max().unwrap_or(0);

        surface.clear();
        for (col, &value) in values.iter().enumerate() {
            let filled = Self::bar_height(value, max, bar_rows);
            for r in 0..filled {
                let row = bar_rows - 1 - r;
                surface.put_char(row, self.legend_width + col as u16, BAR);
            }
        }

        // Legend: peak rate at the scale top, zero at the bottom, the
        // direction label under them next to the axis.
        let legend = self.legend_width.saturating_sub(1) as usize;
        surface.put_str(0, 0, &format!("{:>legend$}", format_byte_rate(max, "s")));
        surface.put_str(
            bar_rows - 1,
            0,
            &format!("{:>legend$}", format_byte_rate(0, "s")),
        );
        let mut tag = label.to_string();
        tag.truncate(legend);
        surface.put_str(axis_row, 0, &tag);

        let ticks: Vec<DateTime<Local>> = (0..values.len())
            .map(|i| now - ChronoDuration::seconds((values.len() - 1 - i) as i64))
            .collect();
        surface.put_str(axis_row, self.legend_width, &format_xaxis(&ticks));
    }
}

impl Default for BarChart {
    fn default() -> Self {
        Self::new()
    }
}

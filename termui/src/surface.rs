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

use std::io::Write;

use crate::Result;

/// A fixed-height character grid anchored at the bottom of the terminal
/// scroll region.
///
/// `attach` reserves the rows and parks the cursor at the grid origin;
/// every repaint starts and ends there, so drawing needs no absolute
/// cursor addressing. All escape sequences the program emits live in
/// this module.
pub struct TerminalSurface {
    width: u16,
    height: u16,
    grid: Vec<Vec<char>>,
    attached: bool,
}

impl TerminalSurface {
    pub fn new(width: u16, height: u16) -> TerminalSurface {
        TerminalSurface {
            width,
            height,
            grid: Self::blank_grid(width, height),
            attached: false,
        }
    }

    fn blank_grid(width: u16, height: u16) -> Vec<Vec<char>> {
        vec![vec![' '; width as usize]; height as usize]
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    /// Scrolls out room for the grid and hides the cursor.
    pub fn attach(&mut self, out: &mut impl Write) -> Result<()> {
        for _ in 0..self.height {
            out.write_all(b"\r\n")?;
        }
        write!(out, "\x1b[{}A\x1b[?25l", self.height)?;
        out.flush()?;
        self.attached = true;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.grid = Self::blank_grid(self.width, self.height);
    }

    /// Writes one character at (row, col); out-of-range writes are
    /// dropped.
    pub fn put_char(&mut self, row: u16, col: u16, ch: char) {
        if row >= self.height || col >= self.width {
            return;
        }
        self.grid[row as usize][col as usize] = ch;
    }

    /// Writes `text` starting at (row, col), clipped to the grid.
    pub fn put_str(&mut self, row: u16, col: u16, text: &str) {
        if row >= self.height {
            return;
        }
        let cells = &mut self.grid[row as usize];
        for (i, ch) in text.chars().enumerate() {
            let x = col as usize + i;
            if x >= cells.len() {
                break;
            }
            cells[x] = ch;
        }
    }

    /// One grid row as text.
    pub fn row_text(&self, row: u16) -> String {
        self.grid
            .get(row as usize)
            .map(|cells| cells.iter().collect())
            .unwrap_or_default()
    }

    /// Repaints the whole grid, leaving the cursor back at the origin.
    pub fn draw(&self, out: &mut impl Write) -> Result<()> {
        for (i, cells) in self.grid.iter().enumerate() {
            let row: String = cells.iter().collect();
            out.write_all(b"\x1b[2K")?;
            out.write_all(row.as_bytes())?;
            if i + 1 < self.grid.len() {
                out.write_all(b"\r\n")?;
            }
        }
        if self.height > 1 {
            write!(out, "\r\x1b[{}A", self.height - 1)?;
        } else {
            out.write_all(b"\r")?;
        }
        out.flush()?;
        Ok(())
    }

    /// Re-anchors the grid after a stray newline disturbed the region.
    pub fn on_carriage_return(&mut self, out: &mut impl Write) -> Result<()> {
        out.write_all(b"\r\x1b[0J")?;
        self.draw(out)
    }

    /// Adopts a new terminal width, dropping stale cell contents.
    pub fn resize(&mut self, width: u16, out: &mut impl Write) -> Result<()> {
        self.width = width;
        self.grid = Self::blank_grid(width, self.height);
        out.write_all(b"\r\x1b[0J")?;
        self.draw(out)
    }

    /// Parks the cursor on a fresh line below the grid and unhides it.
    pub fn detach(&mut self, out: &mut impl Write) -> Result<()> {
        if !self.attached {
            return Ok(());
        }
        if self.height > 1 {
            write!(out, "\x1b[{}B", self.height - 1)?;
        }
        out.write_all(b"\r\n\x1b[?25h")?;
        out.flush()?;
        self.attached = false;
        Ok(())
    }
}

impl Drop for TerminalSurface {
    fn drop(&mut self) {
        // Unwind path: make sure the shell prompt comes back on its own
        // line with a visible cursor.
        if self.attached {
            let _ = self.detach(&mut std::io::stdout());
        }
    }
}

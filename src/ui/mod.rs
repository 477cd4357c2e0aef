//! Character display model and screen rendering.
//!
//! The panel is a 4 × 20 character LCD.  The core always hands the display
//! adapter a complete [`Screen`]: four lines, left-justified and padded
//! with spaces to full width.  Text that would overflow a line is cut.

pub mod screens;

use core::fmt::{self, Write};

use heapless::String;

pub use screens::{render, run_progress};

pub const COLS: usize = 20;
pub const ROWS: usize = 4;

/// One full-width display line.
pub type Line = String<COLS>;

/// A complete 4 × 20 frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    lines: [Line; ROWS],
}

impl Default for Screen {
    fn default() -> Self {
        Self::blank()
    }
}

impl Screen {
    pub fn blank() -> Self {
        let mut s = Self {
            lines: Default::default(),
        };
        for row in 0..ROWS {
            s.pad(row);
        }
        s
    }

    /// Build from four static strings.
    pub fn from_lines(text: [&str; ROWS]) -> Self {
        let mut s = Self::blank();
        for (row, t) in text.iter().enumerate() {
            s.put(row, t);
        }
        s
    }

    /// Replace `row` with `text`.
    pub fn put(&mut self, row: usize, text: &str) {
        self.write(row, format_args!("{text}"));
    }

    /// Replace `row` with formatted text.
    pub fn write(&mut self, row: usize, args: fmt::Arguments<'_>) {
        let Some(line) = self.lines.get_mut(row) else {
            return;
        };
        line.clear();
        // Truncation is not an error for a fixed-width panel.
        let _ = Truncating(line).write_fmt(args);
        self.pad(row);
    }

    /// Overwrite the last two columns of `row` with the selection marker.
    pub fn mark(&mut self, row: usize) {
        let Some(line) = self.lines.get_mut(row) else {
            return;
        };
        let mut marked = Line::new();
        for ch in line.chars().take(COLS - 2) {
            let _ = marked.push(ch);
        }
        let _ = marked.push_str("<-");
        *line = marked;
    }

    pub fn line(&self, row: usize) -> &str {
        self.lines.get(row).map_or("", |l| l.as_str())
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|l| l.as_str())
    }

    fn pad(&mut self, row: usize) {
        let line = &mut self.lines[row];
        while line.len() < COLS {
            if line.push(' ').is_err() {
                break;
            }
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines().enumerate() {
            if i > 0 {
                f.write_char('\n')?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}

/// `fmt::Write` sink that silently drops everything past the line width.
struct Truncating<'a>(&'a mut Line);

impl Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if self.0.push(ch).is_err() {
                break;
            }
        }
        Ok(())
    }
}

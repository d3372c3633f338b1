//! Buffer and window model that motions are simulated against.

use crate::models::{Position, View};

/// Default window text width when none is configured.
const DEFAULT_WIDTH: usize = 80;

/// Character class used by word motions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Blank,
    Punctuation,
    Keyword,
}

/// Snapshot of the user's buffer and window.
#[derive(Debug, Clone)]
pub struct Document {
    lines: Vec<Vec<char>>,
    width: usize,
    height: usize,
    scrolloff: usize,
}

impl Document {
    /// Create a document whose window shows the whole buffer.
    ///
    /// An empty buffer still has one (empty) line, as in an editor.
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut lines: Vec<Vec<char>> = lines
            .iter()
            .map(|l| l.as_ref().chars().collect())
            .collect();
        if lines.is_empty() {
            lines.push(Vec::new());
        }
        let height = lines.len();
        Self {
            lines,
            width: DEFAULT_WIDTH,
            height,
            scrolloff: 0,
        }
    }

    pub fn with_window(mut self, width: usize, height: usize) -> Self {
        self.width = width.max(1);
        self.height = height.max(1);
        self
    }

    pub fn with_scrolloff(mut self, scrolloff: usize) -> Self {
        self.scrolloff = scrolloff;
        self
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map_or(0, Vec::len)
    }

    /// Last column the cursor can occupy in normal mode.
    pub fn last_col(&self, line: usize) -> usize {
        self.line_len(line).saturating_sub(1)
    }

    pub fn last_line(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn char_at(&self, pos: Position) -> Option<char> {
        self.lines.get(pos.line)?.get(pos.col).copied()
    }

    /// Column of the first non-blank character, or the last column when the
    /// line is blank.
    pub fn first_non_blank(&self, line: usize) -> usize {
        self.lines
            .get(line)
            .and_then(|chars| chars.iter().position(|c| !c.is_whitespace()))
            .unwrap_or_else(|| self.last_col(line))
    }

    /// Whether the cursor can rest on `pos`.
    pub fn contains(&self, pos: Position) -> bool {
        pos.line < self.lines.len() && pos.col <= self.last_col(pos.line)
    }

    /// Class of the character under `pos`. Positions past the end of a line
    /// (including any position on an empty line) are blank.
    ///
    /// With `big` set every non-blank character is a keyword, which is how
    /// WORD motions see the buffer.
    pub fn char_class(&self, pos: Position, big: bool) -> CharClass {
        match self.char_at(pos) {
            None => CharClass::Blank,
            Some(c) if c.is_whitespace() => CharClass::Blank,
            Some(_) if big => CharClass::Keyword,
            Some(c) if c.is_alphanumeric() || c == '_' => CharClass::Keyword,
            Some(_) => CharClass::Punctuation,
        }
    }

    /// Position after `pos` in buffer order, moving onto the next line after
    /// the last column.
    pub fn next_position(&self, pos: Position) -> Option<Position> {
        if pos.col < self.last_col(pos.line) {
            Some(Position::new(pos.line, pos.col + 1))
        } else if pos.line < self.last_line() {
            Some(Position::new(pos.line + 1, 0))
        } else {
            None
        }
    }

    /// Position before `pos` in buffer order.
    pub fn prev_position(&self, pos: Position) -> Option<Position> {
        if pos.col > 0 {
            Some(Position::new(pos.line, pos.col - 1))
        } else if pos.line > 0 {
            Some(Position::new(pos.line - 1, self.last_col(pos.line - 1)))
        } else {
            None
        }
    }

    /// Scrolloff in effect for this window.
    pub fn effective_scrolloff(&self) -> usize {
        self.scrolloff.min((self.height - 1) / 2)
    }

    /// Highest line that can be the first visible one.
    fn max_top_line(&self) -> usize {
        self.lines.len().saturating_sub(self.height)
    }

    /// Last visible line for `top_line`.
    pub fn bottom_line(&self, top_line: usize) -> usize {
        top_line
            .saturating_add(self.height - 1)
            .min(self.last_line())
    }

    /// Scroll the window so the cursor keeps `scrolloff` lines of context.
    pub fn scroll_to(&self, mut view: View) -> View {
        let so = self.effective_scrolloff();
        let mut top = view.top_line.min(self.max_top_line());

        if view.line < top + so {
            top = view.line.saturating_sub(so);
        } else if view.line + so > top.saturating_add(self.height - 1) {
            top = view.line + so + 1 - self.height;
        }

        view.top_line = top.min(self.max_top_line());
        view
    }
}

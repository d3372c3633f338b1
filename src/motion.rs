//! Motion model: what the search can do from a view, and how refined steps
//! turn into keystrokes.
//!
//! The search only sees motions through [`Motion`] and the keystroke model
//! through [`Combine`], so both can be swapped out. [`VimMotion`] and
//! [`CountPrefix`] are the normal-mode implementations the server uses.

use crate::document::{CharClass, Document};
use crate::models::{MotionSpec, Position, View, END_OF_LINE};
use crate::pathfinder::{SearchError, SearchResult};

/// A configured cursor motion.
pub trait Motion {
    /// Keys typed to perform the motion.
    fn name(&self) -> &str;

    /// Search cost of one application. Must be positive.
    fn cost(&self) -> u32;

    /// Simulate the motion. `None` when it cannot be applied from `view`.
    fn apply(&self, view: &View, document: &Document) -> Option<View>;
}

/// Keystroke model used to resolve equal-cost alternatives.
pub trait Combine<M> {
    /// Keystrokes needed to perform `motion` `count` times in one step.
    fn keystrokes(&self, motion: &M, count: u32) -> usize;

    /// Whether `first` followed by `second` can be typed as one counted step.
    fn mergeable(&self, first: &M, second: &M) -> bool;
}

/// Every motion in the catalog, in the order they are tried by default.
pub const DEFAULT_MOTIONS: &[&str] = &[
    "h", "l", "j", "k", "0", "^", "$", "w", "b", "e", "W", "B", "E", "gg", "G", "H", "M", "L",
    "gm",
];

/// Default motion list with unit weights.
pub fn default_motion_specs() -> Vec<MotionSpec> {
    DEFAULT_MOTIONS
        .iter()
        .map(|m| MotionSpec::new(*m, 1))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Left,
    Right,
    Down,
    Up,
    LineStart,
    FirstNonBlank,
    LineEnd,
    WordForward { big: bool },
    WordBackward { big: bool },
    WordEnd { big: bool },
    FileStart,
    FileEnd,
    ScreenTop,
    ScreenMiddle,
    ScreenBottom,
    ScreenLineMiddle,
}

impl Kind {
    fn from_keys(keys: &str) -> Option<Self> {
        let kind = match keys {
            "h" => Kind::Left,
            "l" => Kind::Right,
            "j" => Kind::Down,
            "k" => Kind::Up,
            "0" => Kind::LineStart,
            "^" => Kind::FirstNonBlank,
            "$" => Kind::LineEnd,
            "w" => Kind::WordForward { big: false },
            "W" => Kind::WordForward { big: true },
            "b" => Kind::WordBackward { big: false },
            "B" => Kind::WordBackward { big: true },
            "e" => Kind::WordEnd { big: false },
            "E" => Kind::WordEnd { big: true },
            "gg" => Kind::FileStart,
            "G" => Kind::FileEnd,
            "H" => Kind::ScreenTop,
            "M" => Kind::ScreenMiddle,
            "L" => Kind::ScreenBottom,
            "gm" => Kind::ScreenLineMiddle,
            _ => return None,
        };
        Some(kind)
    }

    /// A count prefix repeats these motions; for the others it means
    /// something else (`5G`) or nothing at all.
    fn countable(self) -> bool {
        matches!(
            self,
            Kind::Left
                | Kind::Right
                | Kind::Down
                | Kind::Up
                | Kind::WordForward { .. }
                | Kind::WordBackward { .. }
                | Kind::WordEnd { .. }
        )
    }
}

/// A normal-mode motion from the built-in catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VimMotion {
    keys: String,
    weight: u32,
    kind: Kind,
}

impl VimMotion {
    pub fn from_spec(spec: &MotionSpec) -> SearchResult<Self> {
        let kind = Kind::from_keys(&spec.motion)
            .ok_or_else(|| SearchError::UnknownMotion(spec.motion.clone()))?;
        Ok(Self {
            keys: spec.motion.clone(),
            weight: spec.weight.max(1),
            kind,
        })
    }

    /// Parse a whole motion list, failing on the first unknown entry.
    pub fn from_specs(specs: &[MotionSpec]) -> SearchResult<Vec<Self>> {
        specs.iter().map(Self::from_spec).collect()
    }

    pub fn is_countable(&self) -> bool {
        self.kind.countable()
    }
}

impl Motion for VimMotion {
    fn name(&self) -> &str {
        &self.keys
    }

    fn cost(&self) -> u32 {
        self.weight
    }

    fn apply(&self, view: &View, doc: &Document) -> Option<View> {
        let pos = view.position();
        let moved = match self.kind {
            Kind::Left => {
                if pos.col == 0 {
                    return None;
                }
                view.moved_to(Position::new(pos.line, pos.col - 1))
            }
            Kind::Right => {
                if pos.col >= doc.last_col(pos.line) {
                    return None;
                }
                view.moved_to(Position::new(pos.line, pos.col + 1))
            }
            Kind::Down => {
                if pos.line >= doc.last_line() {
                    return None;
                }
                vertical(view, doc, pos.line + 1)
            }
            Kind::Up => {
                if pos.line == 0 {
                    return None;
                }
                vertical(view, doc, pos.line - 1)
            }
            Kind::LineStart => view.moved_to(Position::new(pos.line, 0)),
            Kind::FirstNonBlank => {
                view.moved_to(Position::new(pos.line, doc.first_non_blank(pos.line)))
            }
            Kind::LineEnd => {
                let mut v = view.moved_to(Position::new(pos.line, doc.last_col(pos.line)));
                v.want_col = Some(END_OF_LINE);
                v
            }
            Kind::WordForward { big } => view.moved_to(word_forward(doc, pos, big)?),
            Kind::WordBackward { big } => view.moved_to(word_backward(doc, pos, big)?),
            Kind::WordEnd { big } => view.moved_to(word_end(doc, pos, big)?),
            Kind::FileStart => view.moved_to(Position::new(0, doc.first_non_blank(0))),
            Kind::FileEnd => {
                let last = doc.last_line();
                view.moved_to(Position::new(last, doc.first_non_blank(last)))
            }
            Kind::ScreenTop => screen_line(view, doc, screen_top(view, doc)),
            Kind::ScreenMiddle => {
                let bottom = doc.bottom_line(view.top_line);
                let top = view.top_line.min(bottom);
                screen_line(view, doc, top + (bottom - top) / 2)
            }
            Kind::ScreenBottom => screen_line(view, doc, screen_bottom(view, doc)),
            Kind::ScreenLineMiddle => {
                let col = (doc.width() / 2).min(doc.last_col(pos.line));
                view.moved_to(Position::new(pos.line, col))
            }
        };
        Some(doc.scroll_to(moved))
    }
}

/// Move to `line`, keeping the sticky column.
fn vertical(view: &View, doc: &Document, line: usize) -> View {
    let want = view.desired_col();
    View {
        line,
        col: want.min(doc.last_col(line)),
        want_col: Some(want),
        top_line: view.top_line,
    }
}

fn screen_line(view: &View, doc: &Document, line: usize) -> View {
    view.moved_to(Position::new(line, doc.first_non_blank(line)))
}

fn screen_top(view: &View, doc: &Document) -> usize {
    let top = view.top_line;
    if top == 0 {
        return 0;
    }
    top.saturating_add(doc.effective_scrolloff())
        .min(doc.bottom_line(top))
}

fn screen_bottom(view: &View, doc: &Document) -> usize {
    let top = view.top_line;
    let bottom = doc.bottom_line(top);
    if bottom == doc.last_line() {
        return bottom;
    }
    bottom.saturating_sub(doc.effective_scrolloff()).max(top.min(bottom))
}

fn is_empty_line(doc: &Document, pos: Position) -> bool {
    doc.line_len(pos.line) == 0
}

/// `w`: start of the next word. Empty lines count as words.
fn word_forward(doc: &Document, start: Position, big: bool) -> Option<Position> {
    let class = doc.char_class(start, big);
    let mut cur = start;

    // Leave the current word (or the blank under the cursor).
    loop {
        let next = match doc.next_position(cur) {
            Some(next) => next,
            // Nothing after this word: stop on the last character.
            None => return (cur != start).then_some(cur),
        };
        let crossed_line = next.line != cur.line;
        cur = next;
        if crossed_line || class == CharClass::Blank || doc.char_class(cur, big) != class {
            break;
        }
    }

    // Skip blanks up to the next word.
    loop {
        if is_empty_line(doc, cur) || doc.char_class(cur, big) != CharClass::Blank {
            return Some(cur);
        }
        match doc.next_position(cur) {
            Some(next) => cur = next,
            None => return Some(cur),
        }
    }
}

/// `b`: start of the current or previous word.
fn word_backward(doc: &Document, start: Position, big: bool) -> Option<Position> {
    let mut cur = doc.prev_position(start)?;

    while doc.char_class(cur, big) == CharClass::Blank {
        if is_empty_line(doc, cur) {
            return Some(cur);
        }
        match doc.prev_position(cur) {
            Some(prev) => cur = prev,
            None => return Some(cur),
        }
    }

    let class = doc.char_class(cur, big);
    while let Some(prev) = doc.prev_position(cur) {
        if prev.line != cur.line || doc.char_class(prev, big) != class {
            break;
        }
        cur = prev;
    }
    Some(cur)
}

/// `e`: end of the current or next word. Empty lines are skipped.
fn word_end(doc: &Document, start: Position, big: bool) -> Option<Position> {
    let mut cur = doc.next_position(start)?;

    while doc.char_class(cur, big) == CharClass::Blank {
        cur = doc.next_position(cur)?;
    }

    let class = doc.char_class(cur, big);
    while let Some(next) = doc.next_position(cur) {
        if next.line != cur.line || doc.char_class(next, big) != class {
            break;
        }
        cur = next;
    }
    Some(cur)
}

/// Vim count prefixes: `jjj` can be typed as `3j`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountPrefix;

impl Combine<VimMotion> for CountPrefix {
    fn keystrokes(&self, motion: &VimMotion, count: u32) -> usize {
        let keys = motion.keys.chars().count();
        if count > 1 {
            keys + count.to_string().len()
        } else {
            keys
        }
    }

    fn mergeable(&self, first: &VimMotion, second: &VimMotion) -> bool {
        first.is_countable() && first.keys == second.keys
    }
}

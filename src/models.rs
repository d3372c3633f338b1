//! Data models shared between the client, the server and the search.
//!
//! Everything that crosses the socket derives serde so the protocol layer
//! can encode it as the payload of a tagged message.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sticky column value meaning "end of line" (set by `$`).
pub const END_OF_LINE: usize = usize::MAX;

/// A cursor position, zero-based.
///
/// Ordered by line first, then column, so positions sort in buffer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl FromStr for Position {
    type Err = String;

    /// Parse `line:col`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (line, col) = s
            .split_once(':')
            .ok_or_else(|| format!("expected LINE:COL, got '{}'", s))?;
        let line = line
            .trim()
            .parse()
            .map_err(|e| format!("invalid line '{}': {}", line, e))?;
        let col = col
            .trim()
            .parse()
            .map_err(|e| format!("invalid column '{}': {}", col, e))?;
        Ok(Self { line, col })
    }
}

/// Simulated cursor state.
///
/// Besides the position it carries the sticky column used by vertical
/// motions and the first visible line of the window. Two views are equal
/// when their positions are equal; the rest is context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct View {
    pub line: usize,
    pub col: usize,
    /// Column `j`/`k` try to return to. `None` follows `col`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub want_col: Option<usize>,
    /// First line shown in the window.
    #[serde(default)]
    pub top_line: usize,
}

impl View {
    pub const fn new(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            want_col: None,
            top_line: 0,
        }
    }

    pub fn with_top_line(mut self, top_line: usize) -> Self {
        self.top_line = top_line;
        self
    }

    pub fn position(&self) -> Position {
        Position::new(self.line, self.col)
    }

    /// Column used by vertical motions.
    pub fn desired_col(&self) -> usize {
        self.want_col.unwrap_or(self.col)
    }

    /// Same view moved to `pos`, dropping the sticky column.
    pub fn moved_to(&self, pos: Position) -> Self {
        Self {
            line: pos.line,
            col: pos.col,
            want_col: None,
            top_line: self.top_line,
        }
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

impl Eq for View {}

impl From<Position> for View {
    fn from(pos: Position) -> Self {
        View::new(pos.line, pos.col)
    }
}

/// One configured motion as sent over the wire.
///
/// Matches the `{motion, weight}` entries of the editor-side motion list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionSpec {
    /// Keys that perform the motion, e.g. `"w"` or `"gg"`.
    pub motion: String,
    /// Search cost of one application.
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl MotionSpec {
    pub fn new(motion: impl Into<String>, weight: u32) -> Self {
        Self {
            motion: motion.into(),
            weight,
        }
    }
}

/// A refined step of a found path: `motion` typed `count` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedMotion {
    pub motion: String,
    pub count: u32,
}

impl ResolvedMotion {
    pub fn new(motion: impl Into<String>, count: u32) -> Self {
        Self {
            motion: motion.into(),
            count,
        }
    }
}

impl fmt::Display for ResolvedMotion {
    /// Render as typed in normal mode: `3j`, `w`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count > 1 {
            write!(f, "{}{}", self.count, self.motion)
        } else {
            f.write_str(&self.motion)
        }
    }
}

/// Everything the server needs for one search.
///
/// The client sends it as the START..BUFFER message sequence followed by
/// RUN; the server reassembles it before searching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub start: View,
    pub target: View,
    pub motions: Vec<MotionSpec>,
    pub scrolloff: usize,
    /// Window text width and height.
    pub size: (usize, usize),
    pub buffer: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_view_equality_is_positional() {
        let a = View::new(3, 4);
        let b = View {
            line: 3,
            col: 4,
            want_col: Some(10),
            top_line: 2,
        };
        assert_eq!(a, b);
        assert_ne!(a, View::new(3, 5));
    }

    #[test]
    fn test_position_parse_and_display() {
        let pos: Position = "12:7".parse().unwrap();
        assert_eq!(pos, Position::new(12, 7));
        assert_eq!(pos.to_string(), "12:7");

        assert!("12".parse::<Position>().is_err());
        assert!("a:1".parse::<Position>().is_err());
    }

    #[test]
    fn test_resolved_motion_display() {
        assert_eq!(ResolvedMotion::new("j", 3).to_string(), "3j");
        assert_eq!(ResolvedMotion::new("gg", 1).to_string(), "gg");
    }

    #[test]
    fn test_motion_spec_weight_defaults_to_one() {
        let spec: MotionSpec = serde_json::from_str(r#"{"motion":"w"}"#).unwrap();
        assert_eq!(spec, MotionSpec::new("w", 1));
    }

    #[test]
    fn test_view_deserialize_minimal() {
        let view: View = serde_json::from_str(r#"{"line":1,"col":2}"#).unwrap();
        assert_eq!(view.position(), Position::new(1, 2));
        assert_eq!(view.want_col, None);
        assert_eq!(view.top_line, 0);
    }
}

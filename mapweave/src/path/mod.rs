//! Accessor path expressions and their resolution.
//!
//! An accessor is written as text and parsed once when a plan is built:
//!
//! - `name.first`, `items[2]`: absolute, from the current container
//! - `../id`: relative, each `../` ascends one nesting level
//! - `$.meta.version`: root-relative, from the top-level input
//! - `legacy_id|id|../id`: candidates tried in order, first present wins
//! - `roles@admin`: reads `true` when the literal `admin` is an item of the
//!   `roles` list, `false` when the list lacks it
//! - the empty string addresses the current container itself

pub mod access;
mod resolve;

use std::fmt;

use thiserror::Error;

pub use resolve::{Anchor, ConcretePath, PathError, ReadScope, WriteScope};

const ASCEND: &str = "../";
const ROOT: &str = "$";
const ITEM: char = '@';
const ALTERNATIVE: char = '|';

/// One step into a container.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Segment {
    /// Map key.
    Key(String),
    /// Array position.
    Index(usize),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

/// One alternative of a multi-accessor.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Candidate {
    /// A nested location that must exist.
    Path(PathExpr),
    /// A literal that must be present as an item of a list.
    ListItem {
        /// Location of the list; never a candidate list itself.
        list: PathExpr,
        /// Literal to find.
        token: String,
    },
}

/// Parsed accessor expression.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathExpr {
    /// Segments from the current container.
    Absolute(Vec<Segment>),
    /// Segments from an ancestor container.
    Relative {
        /// Number of levels to ascend.
        ascend: usize,
        /// Segments applied after ascending.
        segments: Vec<Segment>,
    },
    /// Segments from the top-level input.
    Root(Vec<Segment>),
    /// Ordered candidates; the first present one wins on read.
    Any(Vec<Candidate>),
}

/// Malformed accessor text.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[error("invalid accessor '{path}': {message}")]
pub struct PathSyntaxError {
    /// Accessor as written.
    pub path: String,
    /// What is wrong with it.
    pub message: String,
}

impl PathSyntaxError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_owned(),
            message: message.into(),
        }
    }
}

impl PathExpr {
    /// Parse accessor text.
    ///
    /// # Errors
    ///
    /// Returns a [`PathSyntaxError`] for empty segments, unbalanced or
    /// non-numeric indices, and misplaced markers.
    ///
    /// # Examples
    ///
    /// ```
    /// use mapweave::path::{PathExpr, Segment};
    ///
    /// let expr = PathExpr::parse("../items[1]")?;
    /// assert_eq!(
    ///     expr,
    ///     PathExpr::Relative {
    ///         ascend: 1,
    ///         segments: vec![Segment::Key("items".into()), Segment::Index(1)],
    ///     }
    /// );
    /// # Ok::<_, mapweave::path::PathSyntaxError>(())
    /// ```
    pub fn parse(text: &str) -> Result<Self, PathSyntaxError> {
        let is_single_path = !text.contains(ALTERNATIVE) && !text.contains(ITEM);
        if is_single_path {
            return parse_single(text, text);
        }
        text.split(ALTERNATIVE)
            .map(|part| match part.split_once(ITEM) {
                Some((_, "")) => Err(PathSyntaxError::new(text, "empty list item token")),
                Some((_, token)) if token.contains(ITEM) => {
                    Err(PathSyntaxError::new(text, "more than one list item marker"))
                }
                Some((list, token)) => Ok(Candidate::ListItem {
                    list: parse_single(list, text)?,
                    token: token.to_owned(),
                }),
                None => parse_single(part, text).map(Candidate::Path),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self::Any)
    }

    /// Current container.
    #[must_use]
    pub const fn current() -> Self {
        Self::Absolute(Vec::new())
    }

    /// Rebase an absolute accessor onto the top-level input.
    ///
    /// # Errors
    ///
    /// Relative accessors and candidate lists cannot be rebased.
    pub fn into_root(self) -> Result<Self, Self> {
        match self {
            Self::Absolute(segments) | Self::Root(segments) => Ok(Self::Root(segments)),
            other => Err(other),
        }
    }
}

fn parse_single(part: &str, whole: &str) -> Result<PathExpr, PathSyntaxError> {
    if part == ROOT {
        return Ok(PathExpr::Root(Vec::new()));
    }
    if let Some(rest) = part.strip_prefix("$.") {
        if rest.starts_with(ASCEND) {
            return Err(PathSyntaxError::new(
                whole,
                "root-relative accessor cannot ascend",
            ));
        }
        return parse_segments(rest, whole).map(PathExpr::Root);
    }
    let mut ascend = 0;
    let mut rest = part;
    while let Some(stripped) = rest.strip_prefix(ASCEND) {
        ascend += 1;
        rest = stripped;
    }
    if rest == ".." {
        ascend += 1;
        rest = "";
    }
    let segments = parse_segments(rest, whole)?;
    Ok(if ascend == 0 {
        PathExpr::Absolute(segments)
    } else {
        PathExpr::Relative { ascend, segments }
    })
}

fn parse_segments(text: &str, whole: &str) -> Result<Vec<Segment>, PathSyntaxError> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let mut segments = Vec::new();
    for part in text.split('.') {
        parse_part(part, whole, &mut segments)?;
    }
    Ok(segments)
}

fn parse_part(part: &str, whole: &str, out: &mut Vec<Segment>) -> Result<(), PathSyntaxError> {
    let (key, mut indices) = part.find('[').map_or((part, ""), |pos| part.split_at(pos));
    if key.is_empty() && indices.is_empty() {
        return Err(PathSyntaxError::new(whole, "empty segment"));
    }
    if key.contains(']') || key.contains(ITEM) || key.contains('$') {
        return Err(PathSyntaxError::new(
            whole,
            format!("unexpected character in segment '{part}'"),
        ));
    }
    if !key.is_empty() {
        out.push(Segment::Key(key.to_owned()));
    }
    while !indices.is_empty() {
        let Some(body) = indices.strip_prefix('[') else {
            return Err(PathSyntaxError::new(
                whole,
                format!("expected '[' in segment '{part}'"),
            ));
        };
        let Some((digits, tail)) = body.split_once(']') else {
            return Err(PathSyntaxError::new(
                whole,
                format!("unclosed index in segment '{part}'"),
            ));
        };
        let index = digits.parse::<usize>().map_err(|_| {
            PathSyntaxError::new(whole, format!("index '{digits}' is not a position"))
        })?;
        out.push(Segment::Index(index));
        indices = tail;
    }
    Ok(())
}

fn write_segments(f: &mut fmt::Formatter<'_>, segments: &[Segment]) -> fmt::Result {
    for (position, segment) in segments.iter().enumerate() {
        if position > 0 && matches!(segment, Segment::Key(_)) {
            f.write_str(".")?;
        }
        write!(f, "{segment}")?;
    }
    Ok(())
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(segments) => write_segments(f, segments),
            Self::Relative { ascend, segments } => {
                for _ in 0..*ascend {
                    f.write_str(ASCEND)?;
                }
                write_segments(f, segments)
            }
            Self::Root(segments) if segments.is_empty() => f.write_str(ROOT),
            Self::Root(segments) => {
                f.write_str("$.")?;
                write_segments(f, segments)
            }
            Self::Any(candidates) => {
                for (position, candidate) in candidates.iter().enumerate() {
                    if position > 0 {
                        write!(f, "{ALTERNATIVE}")?;
                    }
                    match candidate {
                        Candidate::Path(expr) => write!(f, "{expr}")?,
                        Candidate::ListItem { list, token } => write!(f, "{list}{ITEM}{token}")?,
                    }
                }
                Ok(())
            }
        }
    }
}

//! Binding accessor expressions to concrete locations.
//!
//! A scope records the chain of containers entered so far. Frame `0` is the
//! top-level container; the last frame is the container currently being
//! mapped. Reads borrow the input tree, writes address one shared output tree
//! by absolute location.

use serde_json::Value;
use thiserror::Error;

use super::{Candidate, PathExpr, Segment, access};

static NULL: Value = Value::Null;
static PRESENT: Value = Value::Bool(true);
static ABSENT: Value = Value::Bool(false);

/// Failure to bind or use an accessor.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PathError {
    /// A relative accessor climbs above the top-level container.
    #[error("accessor '{path}' ascends {ascend} level(s) but only {depth} are available")]
    AscentBeyondRoot {
        /// Accessor as written.
        path: String,
        /// Requested ascent.
        ascend: usize,
        /// Current nesting depth.
        depth: usize,
    },

    /// A write crosses a value that is neither a map nor an array.
    #[error("cannot write through {found} at '{path}'")]
    NotIndexable {
        /// Location of the offending value.
        path: String,
        /// Kind of the offending value.
        found: &'static str,
    },
}

/// Container a concrete path starts from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Anchor {
    /// The top-level container.
    Root,
    /// A frame of the nesting chain, counted from the top.
    Frame(usize),
}

/// An accessor bound to a scope.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConcretePath {
    /// Segments below an anchor container.
    At {
        /// Starting container.
        anchor: Anchor,
        /// Steps from the anchor.
        segments: Vec<Segment>,
    },
    /// A literal item of the list below an anchor container.
    ListItem {
        /// Starting container.
        anchor: Anchor,
        /// Steps from the anchor to the list.
        segments: Vec<Segment>,
        /// Literal to find.
        token: String,
    },
}

impl ConcretePath {
    fn parts(&self) -> (Anchor, &[Segment]) {
        match self {
            Self::At { anchor, segments } | Self::ListItem { anchor, segments, .. } => {
                (*anchor, segments.as_slice())
            }
        }
    }
}

fn bind(expr: &PathExpr, depth: usize) -> Result<Option<ConcretePath>, PathError> {
    Ok(match expr {
        PathExpr::Absolute(segments) => Some(ConcretePath::At {
            anchor: Anchor::Frame(depth),
            segments: segments.clone(),
        }),
        PathExpr::Relative { ascend, segments } => {
            let Some(frame) = depth.checked_sub(*ascend) else {
                return Err(PathError::AscentBeyondRoot {
                    path: expr.to_string(),
                    ascend: *ascend,
                    depth,
                });
            };
            Some(ConcretePath::At {
                anchor: Anchor::Frame(frame),
                segments: segments.clone(),
            })
        }
        PathExpr::Root(segments) => Some(ConcretePath::At {
            anchor: Anchor::Root,
            segments: segments.clone(),
        }),
        PathExpr::Any(_) => None,
    })
}

fn bind_candidate(candidate: &Candidate, depth: usize) -> Result<Option<ConcretePath>, PathError> {
    Ok(match candidate {
        Candidate::Path(inner) => bind(inner, depth)?,
        Candidate::ListItem { list, token } => match bind(list, depth)? {
            Some(ConcretePath::At { anchor, segments }) => Some(ConcretePath::ListItem {
                anchor,
                segments,
                token: token.clone(),
            }),
            other => other,
        },
    })
}

/// Read-side scope over a borrowed input tree.
#[derive(Clone, Debug)]
pub struct ReadScope<'a> {
    frames: Vec<&'a Value>,
}

impl<'a> ReadScope<'a> {
    /// Scope positioned at the top-level input.
    #[must_use]
    pub fn new(root: &'a Value) -> Self {
        Self { frames: vec![root] }
    }

    /// Scope one level deeper, positioned at `child`.
    #[must_use]
    pub fn descend<'b>(&'b self, child: &'b Value) -> ReadScope<'b> {
        let mut frames: Vec<&'b Value> = self.frames.clone();
        frames.push(child);
        ReadScope { frames }
    }

    /// Scope at the same depth with the current container replaced by
    /// `current`.
    #[must_use]
    pub fn rebind<'b>(&'b self, current: &'b Value) -> ReadScope<'b> {
        let mut frames: Vec<&'b Value> = self.frames.clone();
        frames.pop();
        frames.push(current);
        ReadScope { frames }
    }

    /// Number of levels below the top-level container.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Container currently being mapped.
    #[must_use]
    pub fn current(&self) -> &'a Value {
        self.frames.last().copied().unwrap_or(&NULL)
    }

    fn anchor(&self, anchor: Anchor) -> &'a Value {
        match anchor {
            Anchor::Root => self.frames.first().copied(),
            Anchor::Frame(index) => self.frames.get(index).copied(),
        }
        .unwrap_or(&NULL)
    }

    /// Binds `expr`, choosing the first present candidate of a
    /// multi-accessor.
    ///
    /// A list item candidate is present when its list holds the token. When
    /// nothing is present, the first list item candidate whose list exists
    /// is chosen so the field reads `false`. Returns `Ok(None)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::AscentBeyondRoot`] when an accessor climbs above
    /// the top-level container.
    pub fn resolve(&self, expr: &PathExpr) -> Result<Option<ConcretePath>, PathError> {
        let PathExpr::Any(candidates) = expr else {
            return bind(expr, self.depth());
        };
        let mut lacking = None;
        for candidate in candidates {
            let Some(path) = bind_candidate(candidate, self.depth())? else {
                continue;
            };
            match self.get(&path) {
                Some(value) if value == &ABSENT && matches!(path, ConcretePath::ListItem { .. }) => {
                    lacking.get_or_insert(path);
                }
                Some(_) => return Ok(Some(path)),
                None => {}
            }
        }
        Ok(lacking)
    }

    /// Value at a bound location.
    ///
    /// A list item reads as `true` or `false` depending on whether the list
    /// holds its token, and as `None` when there is no list.
    #[must_use]
    pub fn get(&self, path: &ConcretePath) -> Option<&'a Value> {
        let (anchor, segments) = path.parts();
        let found = access::read(self.anchor(anchor), segments)?;
        let ConcretePath::ListItem { token, .. } = path else {
            return Some(found);
        };
        let holds = found
            .as_array()?
            .iter()
            .any(|item| item.as_str() == Some(token.as_str()));
        Some(if holds { &PRESENT } else { &ABSENT })
    }

    /// Reads `expr` from this scope.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::AscentBeyondRoot`] when an accessor climbs above
    /// the top-level container.
    pub fn read(&self, expr: &PathExpr) -> Result<Option<&'a Value>, PathError> {
        Ok(self.resolve(expr)?.and_then(|path| self.get(&path)))
    }
}

/// Write-side scope addressing one shared output tree.
#[derive(Clone, Debug)]
pub struct WriteScope {
    frames: Vec<Vec<Segment>>,
}

impl Default for WriteScope {
    fn default() -> Self {
        Self::new()
    }
}

impl WriteScope {
    /// Scope positioned at the top of the output.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
        }
    }

    /// Scope one level deeper, positioned at the absolute `location`.
    #[must_use]
    pub fn descend(&self, location: Vec<Segment>) -> Self {
        let mut frames = self.frames.clone();
        frames.push(location);
        Self { frames }
    }

    /// Number of levels below the top of the output.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Absolute location of the current container.
    #[must_use]
    pub fn current(&self) -> &[Segment] {
        self.frames.last().map_or(&[][..], Vec::as_slice)
    }

    /// Binds `expr` for writing; a multi-accessor writes its first candidate.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::AscentBeyondRoot`] when an accessor climbs above
    /// the top of the output.
    pub fn resolve(&self, expr: &PathExpr) -> Result<ConcretePath, PathError> {
        let depth = self.depth();
        match expr {
            PathExpr::Any(candidates) => match candidates.first() {
                Some(candidate) => Ok(bind_candidate(candidate, depth)?.unwrap_or(
                    ConcretePath::At {
                        anchor: Anchor::Frame(depth),
                        segments: Vec::new(),
                    },
                )),
                None => Ok(ConcretePath::At {
                    anchor: Anchor::Frame(depth),
                    segments: Vec::new(),
                }),
            },
            single => Ok(bind(single, depth)?.unwrap_or(ConcretePath::At {
                anchor: Anchor::Frame(depth),
                segments: Vec::new(),
            })),
        }
    }

    /// Absolute output location of a bound path; list items address their
    /// list.
    #[must_use]
    pub fn absolute(&self, path: &ConcretePath) -> Vec<Segment> {
        let (anchor, tail) = path.parts();
        let base = match anchor {
            Anchor::Root => &[][..],
            Anchor::Frame(index) => self.frames.get(index).map_or(&[][..], Vec::as_slice),
        };
        base.iter().chain(tail).cloned().collect()
    }

    /// Stores `value` at `expr` inside `output`.
    ///
    /// # Errors
    ///
    /// Returns a [`PathError`] when the accessor cannot be bound or a scalar
    /// blocks the write.
    pub fn write(&self, output: &mut Value, expr: &PathExpr, value: Value) -> Result<(), PathError> {
        let path = self.resolve(expr)?;
        match value {
            Value::Bool(present) if matches!(path, ConcretePath::ListItem { .. }) => {
                self.write_item(output, &path, present)
            }
            _ => access::write(output, &self.absolute(&path), value),
        }
    }

    /// Records a list item: the token is appended when `present`, otherwise
    /// only the list is created. Other paths receive the boolean itself.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NotIndexable`] when the list location holds
    /// something other than a list.
    pub fn write_item(
        &self,
        output: &mut Value,
        path: &ConcretePath,
        present: bool,
    ) -> Result<(), PathError> {
        let location = self.absolute(path);
        let ConcretePath::ListItem { token, .. } = path else {
            return access::write(output, &location, Value::Bool(present));
        };
        let items = access::ensure_array(output, &location)?;
        if present && !items.iter().any(|item| item.as_str() == Some(token.as_str())) {
            items.push(Value::String(token.clone()));
        }
        Ok(())
    }
}

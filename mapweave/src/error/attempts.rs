//! Ordered record of failed factory attempts.

use std::{fmt, slice};

use super::MapError;

/// One entry per factory tried while instantiating a type, in priority
/// order.
///
/// Carried by [`MapError::FactoriesExhausted`] so the final error explains
/// why each candidate was rejected.
#[derive(Debug, Default)]
pub struct FactoryAttempts(Vec<MapError>);

impl FactoryAttempts {
    /// Iterate over the recorded failures.
    #[must_use = "iterators should be consumed to inspect errors"]
    pub fn iter(&self) -> slice::Iter<'_, MapError> {
        self.0.iter()
    }

    /// Number of factories tried.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when no factory was tried.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Records a failed attempt.
    pub fn push(&mut self, error: MapError) {
        self.0.push(error);
    }
}

impl fmt::Display for FactoryAttempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, error) in self.0.iter().enumerate() {
            if position > 0 {
                writeln!(f)?;
            }
            write!(f, "  - {error}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a FactoryAttempts {
    type Item = &'a MapError;
    type IntoIter = slice::Iter<'a, MapError>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

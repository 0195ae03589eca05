//! Identity tuples.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between identifier parts in a stringified identity.
pub const KEY_SEPARATOR: &str = "__";

/// The ordered identifier values of an entity.
///
/// Two entities of the same kind with equal identities are the same logical
/// entity, in any store. Identities are immutable once built.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(Vec<String>);

impl Identity {
    /// Creates an identity from its parts.
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    /// Returns the identifier values in schema order.
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Returns one part by position.
    pub fn part(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    /// Returns the number of parts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no parts.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the stringified identity used as a diff key.
    pub fn key(&self) -> String {
        self.0.join(KEY_SEPARATOR)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self.key())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl From<&str> for Identity {
    fn from(s: &str) -> Self {
        Self(vec![s.to_string()])
    }
}

impl From<String> for Identity {
    fn from(s: String) -> Self {
        Self(vec![s])
    }
}

impl<const N: usize> From<[&str; N]> for Identity {
    fn from(parts: [&str; N]) -> Self {
        Self::new(parts)
    }
}

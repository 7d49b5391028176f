//! Cache key definitions.
//!
//! A [`QueryKey`] addresses one cached read: the scope (entity kind or the
//! dashboard aggregate) plus the normalized filter values in a fixed
//! per-kind order. Keys are the sole cache addressing mechanism; two keys are
//! equal iff scope and every parameter match.

use crate::domain::types::EntityKind;

/// The leading component of a query key, used for coarse invalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyScope {
    /// A filtered list over one content kind.
    Entity(EntityKind),
    /// The cross-collection dashboard counts.
    Dashboard,
}

impl KeyScope {
    pub fn name(self) -> &'static str {
        match self {
            KeyScope::Entity(kind) => kind.name(),
            KeyScope::Dashboard => "dashboard",
        }
    }
}

impl std::fmt::Display for KeyScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub scope: KeyScope,
    /// Normalized filter values, positional per kind. Absent and blank
    /// filters both normalize to `None`, so `search: ""` and no search
    /// address the same entry.
    pub params: Vec<Option<String>>,
}

impl QueryKey {
    pub fn entity(kind: EntityKind, params: Vec<Option<String>>) -> Self {
        Self {
            scope: KeyScope::Entity(kind),
            params,
        }
    }

    pub fn dashboard() -> Self {
        Self {
            scope: KeyScope::Dashboard,
            params: Vec::new(),
        }
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.scope)?;
        if !self.params.is_empty() {
            write!(f, "[")?;
            for (i, param) in self.params.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                match param {
                    Some(value) => write!(f, "{value}")?,
                    None => write!(f, "*")?,
                }
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Normalize one filter value for key construction and query building:
/// trimmed, with blank collapsing to `None`.
pub fn normalize_param(value: Option<&str>) -> Option<String> {
    let trimmed = value?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The unique address of a node type: `category/title`, both segments
/// normalized.
///
/// Paths are what persisted structures store and what the registries key on,
/// so two registrations whose titles differ only in case or punctuation
/// collide by design.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    /// Builds a path from raw (unnormalized) category and title.
    pub fn new(category: &str, title: &str) -> NodePath {
        NodePath(format!("{}/{}", normalize(category), normalize(title)))
    }

    /// Accepts an already-formed path string. Returns `None` unless the
    /// string has exactly two non-empty `/`-separated segments; no
    /// normalization is applied, so a denormalized path simply fails lookup.
    pub fn parse(path: &str) -> Option<NodePath> {
        let (category, title) = path.split('/').collect_tuple()?;
        if category.is_empty() || title.is_empty() {
            return None;
        }
        Some(NodePath(path.to_string()))
    }

    pub fn category(&self) -> &str {
        self.0.split('/').next().unwrap_or("")
    }

    pub fn title(&self) -> &str {
        self.0.split('/').nth(1).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Normalizes a path segment: trim, lowercase, spaces to hyphens, and
/// everything outside `[a-z0-9-]` stripped.
pub fn normalize(segment: &str) -> String {
    segment
        .trim()
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

//! Namespaced cache keys.

use std::fmt;

/// Which kind of query a cache entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Cloud workspace/role eligibility.
    Eligibility,
    /// Directory group eligibility.
    Groups,
}

impl CacheKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            CacheKind::Eligibility => "elig",
            CacheKind::Groups => "groups",
        }
    }
}

/// A key of the form `<kind>:<scope>`, e.g. `elig:azure`.
///
/// The kind prefix keeps cloud and group entries for the same provider apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(kind: CacheKind, scope: &str) -> Self {
        Self(format!("{}:{}", kind.prefix(), scope))
    }

    pub fn eligibility(scope: &str) -> Self {
        Self::new(CacheKind::Eligibility, scope)
    }

    pub fn groups(scope: &str) -> Self {
        Self::new(CacheKind::Groups, scope)
    }

    /// A key as recorded inside an entry file.
    pub(crate) fn from_stored(raw: &str) -> Self {
        Self(raw.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name for this key's entry. Characters outside `[A-Za-z0-9_-]`
    /// become `_`.
    pub(crate) fn file_name(&self) -> String {
        let stem: String = self
            .0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        format!("{stem}.json")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Logical resource names.
//!
//! A [`ResourceName`] is the cache key for every store: a sanitized,
//! case-insensitive logical path. Two spellings of the same asset
//! ("Props/Crate" vs "props\\crate") fold to one key, so a resource is
//! loaded at most once per process regardless of how callers spell it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Sanitized, case-folded logical path of a resource.
///
/// Unique per resource kind, not globally. The folded form is what gets
/// hashed and compared; the original spelling is not retained.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Sanitizes a raw caller-supplied path into a canonical name.
    ///
    /// Backslashes become forward slashes, redundant separators and `./`
    /// segments are dropped, and the result is lowercased.
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let mut out = String::with_capacity(raw.len());
        for segment in raw.split(['/', '\\']) {
            if segment.is_empty() || segment == "." {
                continue;
            }
            if !out.is_empty() {
                out.push('/');
            }
            for ch in segment.chars() {
                out.extend(ch.to_lowercase());
            }
        }
        Self(out)
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Joins the name with a kind extension, yielding a VFS path.
    #[must_use]
    pub fn with_extension(&self, ext: &str) -> String {
        format!("{}{ext}", self.0)
    }

    /// Rebuilds a name from a VFS path by stripping a known extension.
    ///
    /// Used by the freshness resolver to normalize the cache key to the
    /// file that actually won the stat (case-folding safety on
    /// case-insensitive file systems).
    #[must_use]
    pub fn from_path(path: &str, ext: &str) -> Self {
        let stem = path
            .strip_suffix(ext)
            .or_else(|| {
                // Case-insensitive suffix match, same length guarantee.
                let n = path.len().checked_sub(ext.len())?;
                path.get(n..)?
                    .eq_ignore_ascii_case(ext)
                    .then(|| &path[..n])
            })
            .unwrap_or(path);
        Self::new(stem)
    }
}

impl From<&str> for ResourceName {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceName({:?})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_case_and_separators() {
        let a = ResourceName::new("Props\\Crate");
        let b = ResourceName::new("props/crate");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "props/crate");
    }

    #[test]
    fn drops_dot_and_empty_segments() {
        let n = ResourceName::new("./ui//icons/./save");
        assert_eq!(n.as_str(), "ui/icons/save");
    }

    #[test]
    fn extension_round_trip() {
        let n = ResourceName::new("fx/smoke");
        assert_eq!(n.with_extension(".particles"), "fx/smoke.particles");
        assert_eq!(
            ResourceName::from_path("FX/Smoke.Particles", ".particles"),
            n
        );
    }
}

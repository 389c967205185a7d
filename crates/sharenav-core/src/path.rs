//! Canonical remote paths.
//!
//! A [`RemotePath`] is always absolute within its connection: `/` for the
//! share root, `/photos/2024` for nested directories. Segments are stored
//! verbatim; no case folding or Unicode normalization is applied because
//! the remote source is the authority on names.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PathError;

/// Path separator used on the wire and in display form.
pub const SEPARATOR: char = '/';

/// Normalized, absolute path inside a remote share.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    /// The share root (`/`).
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize a raw path string.
    ///
    /// Leading, trailing and repeated separators are collapsed, `.` is
    /// dropped and `..` pops the previous segment. A `..` that would climb
    /// above the root is rejected rather than clamped, since it is almost
    /// always a traversal attempt.
    pub fn normalize(raw: &str) -> Result<Self, PathError> {
        if raw.contains('\0') {
            return Err(PathError::NullByte);
        }

        let mut segments: Vec<String> = Vec::new();
        for part in raw.split(SEPARATOR) {
            match part {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PathError::AboveRoot(raw.to_string()));
                    }
                }
                _ => segments.push(part.to_string()),
            }
        }

        Ok(Self { segments })
    }

    /// Append a single entry name.
    pub fn join(&self, segment: &str) -> Result<Self, PathError> {
        validate_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }

    /// Parent directory, or `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// True if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &RemotePath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment (the entry name), `None` at the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    #[inline]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Every path from the root down to (and including) `self`.
    pub fn ancestors(&self) -> Vec<RemotePath> {
        (0..=self.segments.len())
            .map(|n| Self {
                segments: self.segments[..n].to_vec(),
            })
            .collect()
    }

    /// Share-relative form used in API query strings (`""` for root).
    pub fn to_query(&self) -> String {
        self.segments.join("/")
    }
}

/// Reject names that cannot be a single path segment.
fn validate_segment(segment: &str) -> Result<(), PathError> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(SEPARATOR)
        || segment.contains('\0')
    {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    Ok(())
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "{}", SEPARATOR);
        }
        for segment in &self.segments {
            write!(f, "{}{}", SEPARATOR, segment)?;
        }
        Ok(())
    }
}

impl Serialize for RemotePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for RemotePath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        RemotePath::normalize(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(raw: &str) -> RemotePath {
        RemotePath::normalize(raw).unwrap()
    }

    #[test]
    fn test_normalize_canonical_form() {
        assert_eq!(p("/a/b/").to_string(), "/a/b");
        assert_eq!(p("a//b").to_string(), "/a/b");
        assert_eq!(p("/a/./b/../c").to_string(), "/a/c");
        assert_eq!(p("").to_string(), "/");
        assert_eq!(p("///").to_string(), "/");
    }

    #[test]
    fn test_normalize_rejects_malformed() {
        assert_eq!(
            RemotePath::normalize("/a/\0/b"),
            Err(PathError::NullByte)
        );
        assert!(matches!(
            RemotePath::normalize("/.."),
            Err(PathError::AboveRoot(_))
        ));
        assert!(matches!(
            RemotePath::normalize("/a/../../etc"),
            Err(PathError::AboveRoot(_))
        ));
    }

    #[test]
    fn test_parent_then_join_round_trip() {
        let path = p("/a/b/");
        let parent = path.parent().expect("non-root has a parent");
        assert_eq!(parent.join("c").unwrap().to_string(), "/a/c");
    }

    #[test]
    fn test_parent_at_root() {
        assert!(RemotePath::root().parent().is_none());
        assert_eq!(p("/a").parent(), Some(RemotePath::root()));
    }

    #[test]
    fn test_join_rejects_bad_segments() {
        let root = RemotePath::root();
        assert!(root.join("").is_err());
        assert!(root.join("..").is_err());
        assert!(root.join("a/b").is_err());
        assert!(root.join(".hidden").is_ok());
    }

    #[test]
    fn test_ancestry() {
        assert!(RemotePath::root().is_ancestor_of(&p("/a")));
        assert!(p("/a").is_ancestor_of(&p("/a/b/c")));
        assert!(!p("/a").is_ancestor_of(&p("/a")));
        assert!(!p("/a/b").is_ancestor_of(&p("/a")));
        // Segment-wise, not string prefix
        assert!(!p("/ab").is_ancestor_of(&p("/abc/d")));
    }

    #[test]
    fn test_case_is_preserved() {
        assert_ne!(p("/Photos"), p("/photos"));
        assert_eq!(p("/Photos").name(), Some("Photos"));
    }

    #[test]
    fn test_ancestors_and_query() {
        let path = p("/docs/reports");
        let chain: Vec<String> = path.ancestors().iter().map(|a| a.to_string()).collect();
        assert_eq!(chain, vec!["/", "/docs", "/docs/reports"]);
        assert_eq!(path.to_query(), "docs/reports");
        assert_eq!(RemotePath::root().to_query(), "");
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&p("/a/b")).unwrap();
        assert_eq!(json, "\"/a/b\"");
        let back: RemotePath = serde_json::from_str("\"a/b/\"").unwrap();
        assert_eq!(back, p("/a/b"));
    }
}

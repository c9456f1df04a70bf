//! Path prefix matching.
//!
//! # Design Decisions
//! - Matching is on whole path segments: `/predict` matches `/predict` and
//!   `/predict/x`, never `/predictable`
//! - Path matching is case-sensitive
//! - Trailing slashes are trimmed at construction, so `/api/` and `/api`
//!   are the same prefix
//! - `/` matches every path

/// A normalised, segment-aligned path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Normalise `prefix`, returning `None` if it is empty or not rooted.
    pub fn new(prefix: &str) -> Option<Self> {
        if !prefix.starts_with('/') {
            return None;
        }
        let trimmed = prefix.trim_end_matches('/');
        let prefix = if trimmed.is_empty() { "/" } else { trimmed };
        Some(Self {
            prefix: prefix.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    pub fn is_root(&self) -> bool {
        self.prefix == "/"
    }

    /// Returns true if `path` starts with this prefix on a segment boundary.
    pub fn matches(&self, path: &str) -> bool {
        if self.is_root() {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Remove this prefix from a matching `path`, keeping the result rooted.
    ///
    /// Callers must check [`matches`](Self::matches) first; a non-matching
    /// path is returned unchanged.
    pub fn strip<'a>(&self, path: &'a str) -> &'a str {
        if self.is_root() {
            return path;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some("") => "/",
            Some(rest) if rest.starts_with('/') => rest,
            _ => path,
        }
    }
}

impl std::fmt::Display for PathPrefixMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unrooted_prefixes() {
        assert!(PathPrefixMatcher::new("").is_none());
        assert!(PathPrefixMatcher::new("predict").is_none());
    }

    #[test]
    fn normalises_trailing_slashes() {
        assert_eq!(PathPrefixMatcher::new("/api/").unwrap().as_str(), "/api");
        assert_eq!(PathPrefixMatcher::new("//").unwrap().as_str(), "/");
    }

    #[test]
    fn matches_whole_segments_only() {
        let matcher = PathPrefixMatcher::new("/predict").unwrap();
        assert!(matcher.matches("/predict"));
        assert!(matcher.matches("/predict/"));
        assert!(matcher.matches("/predict/batch/7"));
        assert!(!matcher.matches("/predictable"));
        assert!(!matcher.matches("/pre"));
        assert!(!matcher.matches("/features"));
        assert!(!matcher.matches("/Predict"));
    }

    #[test]
    fn root_matches_everything() {
        let matcher = PathPrefixMatcher::new("/").unwrap();
        assert!(matcher.matches("/"));
        assert!(matcher.matches("/anything/at/all"));
    }

    #[test]
    fn strip_keeps_path_rooted() {
        let matcher = PathPrefixMatcher::new("/api/v1").unwrap();
        assert_eq!(matcher.strip("/api/v1/users"), "/users");
        assert_eq!(matcher.strip("/api/v1"), "/");
        assert_eq!(matcher.strip("/api/v1/"), "/");

        let root = PathPrefixMatcher::new("/").unwrap();
        assert_eq!(root.strip("/x/y"), "/x/y");
    }
}

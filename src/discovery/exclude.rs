//! Exclusion rules for mod discovery

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

use super::DiscoveryError;

/// Paths never treated as mod files.
const DEFAULT_EXCLUDES: &[&str] = &[".git/**", "**/.DS_Store", "**/.*.swp"];

/// Exclusion rules, matched against paths relative to a mods directory.
#[derive(Debug, Clone)]
pub struct ExcludeRules {
    glob_set: GlobSet,
}

impl ExcludeRules {
    /// Rules containing only the defaults.
    pub fn new() -> Result<Self, DiscoveryError> {
        Self::with_patterns(&[] as &[&str])
    }

    /// Defaults plus `patterns`. Empty patterns are ignored.
    pub fn with_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self, DiscoveryError> {
        let mut builder = GlobSetBuilder::new();

        for pattern in DEFAULT_EXCLUDES {
            builder.add(Glob::new(pattern)?);
        }
        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if !pattern.is_empty() {
                builder.add(Glob::new(pattern)?);
            }
        }

        Ok(Self {
            glob_set: builder.build()?,
        })
    }

    /// Check if a relative path should be excluded
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.glob_set.is_match(path_str.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_excludes() {
        let rules = ExcludeRules::new().unwrap();

        assert!(rules.is_excluded(Path::new(".git/hooks/a.plistmods")));
        assert!(rules.is_excluded(Path::new("nested/.DS_Store")));
        assert!(!rules.is_excluded(Path::new("camera.plistmods")));
    }

    #[test]
    fn test_custom_patterns() {
        let rules = ExcludeRules::with_patterns(&["disabled/**", "*.draft.plistmods"]).unwrap();

        assert!(rules.is_excluded(Path::new("disabled/camera.plistmods")));
        assert!(rules.is_excluded(Path::new("flags.draft.plistmods")));
        assert!(!rules.is_excluded(Path::new("enabled/camera.plistmods")));
        // Defaults still apply
        assert!(rules.is_excluded(Path::new(".git/config")));
    }

    #[test]
    fn test_blank_patterns_ignored() {
        let rules = ExcludeRules::with_patterns(&["", "  "]).unwrap();
        assert!(!rules.is_excluded(Path::new("camera.plistmods")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeRules::with_patterns(&["[oops"]).unwrap_err();
        assert!(matches!(err, DiscoveryError::Glob(_)));
    }
}

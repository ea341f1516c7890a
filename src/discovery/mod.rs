//! Mod file discovery
//!
//! Produces the ordered list of mod files for one run: files found under
//! each configured directory (walked in file-name order), followed by
//! explicitly named files. A file reached twice keeps its first position.

mod exclude;

pub use exclude::ExcludeRules;

use globset::{Glob, GlobMatcher};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Errors for discovery
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),
}

/// Finds mod files under directories.
#[derive(Debug, Clone)]
pub struct ModDiscovery {
    matcher: GlobMatcher,
    exclude: ExcludeRules,
    warn_missing_dirs: bool,
}

impl ModDiscovery {
    /// Discovery matching file names against `pattern`.
    pub fn new(pattern: &str) -> Result<Self, DiscoveryError> {
        Ok(Self {
            matcher: Glob::new(pattern)?.compile_matcher(),
            exclude: ExcludeRules::new()?,
            warn_missing_dirs: false,
        })
    }

    /// Add exclusion globs, relative to each searched directory.
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self, DiscoveryError> {
        self.exclude = ExcludeRules::with_patterns(patterns)?;
        Ok(self)
    }

    /// Log missing directories at warn level instead of debug.
    pub fn warn_missing_dirs(mut self, warn: bool) -> Self {
        self.warn_missing_dirs = warn;
        self
    }

    /// Mod files under `dir`, sorted by file name at each level.
    ///
    /// A missing directory yields no files.
    pub fn scan_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, DiscoveryError> {
        if !dir.is_dir() {
            if self.warn_missing_dirs {
                warn!(dir = %dir.display(), "mods directory not found, skipping");
            } else {
                debug!(dir = %dir.display(), "mods directory not found, skipping");
            }
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(dir)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let rel_path = path.strip_prefix(dir).unwrap_or(path);
            if self.exclude.is_excluded(rel_path) {
                debug!(path = %path.display(), "excluded");
                continue;
            }
            if !self.matcher.is_match(entry.file_name()) {
                continue;
            }

            found.push(path.to_path_buf());
        }
        Ok(found)
    }

    /// Ordered, de-duplicated mod files: each of `dirs` in turn, then
    /// `explicit` in the order given.
    pub fn discover(
        &self,
        dirs: &[PathBuf],
        explicit: &[PathBuf],
    ) -> Result<Vec<PathBuf>, DiscoveryError> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for dir in dirs {
            for path in self.scan_dir(dir)? {
                push_unique(&mut files, &mut seen, path);
            }
        }
        for path in explicit {
            push_unique(&mut files, &mut seen, path.clone());
        }

        debug!(count = files.len(), "discovered mod files");
        Ok(files)
    }
}

fn push_unique(files: &mut Vec<PathBuf>, seen: &mut HashSet<PathBuf>, path: PathBuf) {
    // Unresolvable paths are kept as given; loading them reports the error.
    let identity = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
    if seen.insert(identity) {
        files.push(path);
    }
}

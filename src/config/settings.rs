//! Typed settings read from the effective config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::MismatchPolicy;

/// Where to find mod files.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModsSettings {
    /// Directories walked recursively, in order. Missing ones are skipped.
    #[serde(default)]
    pub dirs: Vec<PathBuf>,

    /// File-name glob a mod file must match.
    pub pattern: String,

    /// Globs, relative to each directory, for files to leave out.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Set when `dirs` was configured rather than defaulted; a missing
    /// directory is then logged as a warning.
    #[serde(skip)]
    pub warn_missing_dirs: bool,
}

/// Build-target gating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TargetSettings {
    /// Targets mods are applied for. Compared case-insensitively.
    #[serde(default)]
    pub enabled: Vec<String>,

    /// Target assumed when the caller names none.
    pub default: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MergeSettings {
    #[serde(default)]
    pub on_kind_mismatch: MismatchPolicy,
}

/// Settings for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    /// Plist patched when the caller names none.
    pub plist: PathBuf,
    pub mods: ModsSettings,
    pub targets: TargetSettings,
    pub merge: MergeSettings,
}

impl Settings {
    /// Whether mods apply for `target`.
    pub fn is_target_enabled(&self, target: &str) -> bool {
        self.targets
            .enabled
            .iter()
            .any(|t| t.eq_ignore_ascii_case(target))
    }

    /// Join relative `plist` and `mods.dirs` onto `base`.
    pub fn resolve_relative_to(&mut self, base: &Path) {
        if self.plist.is_relative() {
            self.plist = base.join(&self.plist);
        }
        for dir in &mut self.mods.dirs {
            if dir.is_relative() {
                *dir = base.join(&*dir);
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = super::BuiltinDefaults::default();
        Self {
            plist: PathBuf::from(defaults.plist),
            mods: ModsSettings {
                dirs: defaults.mods_dirs.into_iter().map(PathBuf::from).collect(),
                pattern: defaults.mods_pattern,
                exclude: Vec::new(),
                warn_missing_dirs: false,
            },
            targets: TargetSettings {
                enabled: defaults.targets_enabled,
                default: defaults.target_default,
            },
            merge: MergeSettings {
                on_kind_mismatch: defaults.on_kind_mismatch,
            },
        }
    }
}

//! Non-fatal findings raised while decoding or applying mods.
//!
//! Nothing here aborts a merge: a diagnostic means one entry (or one mod
//! file) was skipped or coerced while the rest of the run carried on.

use serde::{Deserialize, Serialize};

/// Kind of a non-fatal finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// Entry is not an object, has no `type`, or its `value` does not fit.
    MalformedModEntry,
    /// `type` is not a recognized tag. Only reported by linting.
    UnknownModType,
    /// An `array`/`dict` mod hit a key holding a different node kind.
    KindMismatch,
    /// Empty key inside a dict, or a named key inside an array.
    ContextMismatch,
    /// A mod file could not be read or decoded and was skipped whole.
    ModFileRejected,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticKind::MalformedModEntry => "MALFORMED_MOD_ENTRY",
            DiagnosticKind::UnknownModType => "UNKNOWN_MOD_TYPE",
            DiagnosticKind::KindMismatch => "KIND_MISMATCH",
            DiagnosticKind::ContextMismatch => "CONTEXT_MISMATCH",
            DiagnosticKind::ModFileRejected => "MOD_FILE_REJECTED",
        }
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding, located by mod origin and key path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,

    /// Mod file path, or a label for in-memory mods.
    pub origin: String,

    /// Key path inside the plist, e.g. `Permissions.Camera` or `Flags[1]`.
    /// Empty for file-level findings.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub path: String,

    pub message: String,
}

impl Diagnostic {
    pub fn new(
        kind: DiagnosticKind,
        origin: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            origin: origin.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// One-line human form.
    pub fn to_human(&self) -> String {
        if self.path.is_empty() {
            format!("{} [{}]: {}", self.origin, self.kind, self.message)
        } else {
            format!("{} [{}] {}: {}", self.origin, self.kind, self.path, self.message)
        }
    }
}

/// Path of a named child under `parent`.
pub(crate) fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Path of the element at `index` under `parent`.
pub(crate) fn index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

//! Mod files.
//!
//! A mod file is a JSON document whose root object carries the entries to
//! merge into the plist's root dict under `value`:
//!
//! ```json
//! { "value": { "CFBundleVersion": { "type": "string", "value": "1.2.3" } } }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use sha2::{Digest, Sha256};

use super::entry::{decode_items, ModEntry};
use super::key::ModKey;
use crate::diagnostic::{child_path, index_path, Diagnostic, DiagnosticKind};

/// Origin label for mods that did not come from a file.
pub const INLINE_ORIGIN: &str = "<inline>";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Errors loading a mod file.
#[derive(Debug, thiserror::Error)]
pub enum ModError {
    #[error("Failed to read {path}: {error}")]
    Io {
        path: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("Invalid JSON in {origin}: {error}")]
    Json {
        origin: String,
        #[source]
        error: serde_json::Error,
    },

    #[error("Invalid mod root in {origin}: {reason}")]
    InvalidRoot { origin: String, reason: String },
}

/// A decoded mod file.
#[derive(Debug, Clone, PartialEq)]
pub struct ModTree {
    /// File path, or [`INLINE_ORIGIN`].
    pub origin: String,

    /// SHA-256 of the file bytes, when loaded from disk.
    pub digest: Option<String>,

    /// Top-level entries, merged into the plist root dict.
    pub entries: Vec<(ModKey, ModEntry)>,
}

impl ModTree {
    /// Decode an already-parsed JSON root.
    pub fn from_value(value: &Value, origin: impl Into<String>) -> Result<Self, ModError> {
        let origin = origin.into();
        let root = value.as_object().ok_or_else(|| ModError::InvalidRoot {
            origin: origin.clone(),
            reason: "root must be an object".to_string(),
        })?;

        let entries = match root.get("value") {
            Some(Value::Object(items)) => decode_items(items),
            Some(_) => {
                return Err(ModError::InvalidRoot {
                    origin,
                    reason: "'value' must be an object of entries".to_string(),
                })
            }
            None => {
                return Err(ModError::InvalidRoot {
                    origin,
                    reason: "missing 'value'".to_string(),
                })
            }
        };

        Ok(Self {
            origin,
            digest: None,
            entries,
        })
    }

    /// Parse and decode JSON text.
    pub fn from_json_str(s: &str, origin: impl Into<String>) -> Result<Self, ModError> {
        let origin = origin.into();
        let value: Value = serde_json::from_str(s).map_err(|error| ModError::Json {
            origin: origin.clone(),
            error,
        })?;
        Self::from_value(&value, origin)
    }

    /// Load a mod file, recording the digest of its bytes.
    pub fn load(path: &Path) -> Result<Self, ModError> {
        let bytes = fs::read(path).map_err(|error| ModError::Io {
            path: path.to_path_buf(),
            error,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        // Editors on Windows often save with a UTF-8 byte order mark.
        let json = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

        let origin = path.display().to_string();
        let value: Value = serde_json::from_slice(json).map_err(|error| ModError::Json {
            origin: origin.clone(),
            error,
        })?;

        let mut tree = Self::from_value(&value, origin)?;
        tree.digest = Some(digest);
        Ok(tree)
    }

    /// Findings that would be raised if this tree were applied, plus
    /// unknown types, without touching any plist.
    pub fn lint(&self) -> Vec<Diagnostic> {
        let mut findings = Vec::new();
        for (key, entry) in &self.entries {
            self.lint_entry(key, entry, "", false, &mut findings);
        }
        findings
    }

    fn lint_entry(
        &self,
        key: &ModKey,
        entry: &ModEntry,
        parent: &str,
        in_array: bool,
        findings: &mut Vec<Diagnostic>,
    ) {
        if key.is_delete() {
            return;
        }
        let path = match key.name() {
            Some(name) => child_path(parent, name),
            None => parent.to_string(),
        };

        if in_array != (*key == ModKey::Element) {
            findings.push(Diagnostic::new(
                DiagnosticKind::ContextMismatch,
                &self.origin,
                &path,
                if in_array {
                    "named entry inside an array"
                } else {
                    "empty key inside a dict"
                },
            ));
            return;
        }

        match entry {
            ModEntry::Malformed(reason) => findings.push(Diagnostic::new(
                DiagnosticKind::MalformedModEntry,
                &self.origin,
                &path,
                reason.as_str(),
            )),
            ModEntry::Unknown(tag) => findings.push(Diagnostic::new(
                DiagnosticKind::UnknownModType,
                &self.origin,
                &path,
                format!("unknown type '{}' is ignored", tag),
            )),
            ModEntry::Array(items) => {
                for (i, item) in items.iter().enumerate() {
                    let item_path = index_path(&path, i);
                    self.lint_entry(&ModKey::Element, item, &item_path, true, findings);
                }
            }
            ModEntry::Dict(items) => {
                for (k, e) in items {
                    self.lint_entry(k, e, &path, false, findings);
                }
            }
            ModEntry::Scalar(_) | ModEntry::Ignored => {}
        }
    }
}

//! Apply report.
//!
//! Summarizes one merge run: which mod files were applied, what changed,
//! and every non-fatal diagnostic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostic::{Diagnostic, DiagnosticKind};

/// Schema version for the JSON report
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "plistmods/apply_report@1";

/// A mod tree that was applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModSource {
    pub origin: String,

    /// SHA-256 of the mod file bytes (None for in-memory mods)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Change counters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyStats {
    /// Keys added to a dict.
    pub inserted: u64,
    /// Existing values replaced in place.
    pub replaced: u64,
    /// Elements appended to an array.
    pub appended: u64,
    /// Keys removed.
    pub deleted: u64,
    /// Deletions of keys that were not present.
    pub absent_deletions: u64,
    /// Entries with an unrecognized `type`.
    pub unknown_types: u64,
    /// Entries skipped with a diagnostic.
    pub skipped: u64,
}

impl ApplyStats {
    /// Whether anything in the tree changed.
    pub fn changed(&self) -> bool {
        self.inserted + self.replaced + self.appended + self.deleted > 0
    }
}

/// Result of applying one or more mod trees.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub schema_version: u32,
    pub schema_id: String,
    pub created_at: DateTime<Utc>,

    /// Applied mod trees, in application order.
    pub sources: Vec<ModSource>,

    pub stats: ApplyStats,

    pub diagnostics: Vec<Diagnostic>,
}

impl Default for ApplyReport {
    fn default() -> Self {
        Self::new()
    }
}

impl ApplyReport {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            sources: Vec::new(),
            stats: ApplyStats::default(),
            diagnostics: Vec::new(),
        }
    }

    /// True when no diagnostics were raised.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Diagnostics of one kind.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Record a non-fatal finding.
    pub fn push_diagnostic(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(
            origin = %diagnostic.origin,
            path = %diagnostic.path,
            kind = %diagnostic.kind,
            "{}",
            diagnostic.message
        );
        self.diagnostics.push(diagnostic);
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Multi-line human summary.
    pub fn to_human(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Applied {} mod file(s)\n", self.sources.len()));
        for source in &self.sources {
            out.push_str(&format!("  {}\n", source.origin));
        }

        let s = &self.stats;
        out.push_str(&format!(
            "Inserted: {}, replaced: {}, appended: {}, deleted: {}\n",
            s.inserted, s.replaced, s.appended, s.deleted
        ));
        if s.absent_deletions > 0 || s.unknown_types > 0 || s.skipped > 0 {
            out.push_str(&format!(
                "Absent deletions: {}, unknown types: {}, skipped: {}\n",
                s.absent_deletions, s.unknown_types, s.skipped
            ));
        }

        if !self.diagnostics.is_empty() {
            out.push_str(&format!("\nDiagnostics ({}):\n", self.diagnostics.len()));
            for d in &self.diagnostics {
                out.push_str(&format!("  {}\n", d.to_human()));
            }
        }
        out
    }
}

//! Mod merge engine.
//!
//! Applies decoded mod trees to a plist root dict, in order. Per key:
//! - `-Key` removes the key and its value; removing an absent key is a no-op
//! - scalars upsert in place, keeping the key's position
//! - `array` mods append their items to the (possibly new) array; existing
//!   elements are never cleared, so re-applying appends again
//! - `dict` mods merge into the (possibly new) dict, key by key
//! - entries with an empty key append to the enclosing array
//!
//! Unknown types are skipped silently. Malformed entries are skipped with a
//! diagnostic. Nothing aborts the merge.

mod report;

pub use report::{ApplyReport, ApplyStats, ModSource, SCHEMA_ID, SCHEMA_VERSION};

use plistmods_tree::{Dict, NodeKind, PlistNode, Scalar};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::diagnostic::{child_path, index_path, Diagnostic, DiagnosticKind};
use crate::mods::{ModEntry, ModKey, ModTree};

/// What to do when an `array`/`dict` mod targets a key whose value is a
/// different node kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Replace the value in place with an empty container, then merge.
    #[default]
    Replace,
    /// Leave the value alone and skip the entry.
    Skip,
}

impl MismatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MismatchPolicy::Replace => "replace",
            MismatchPolicy::Skip => "skip",
        }
    }
}

/// The container an entry is applied into.
enum Target<'a> {
    Dict(&'a mut Dict),
    Array(&'a mut Vec<PlistNode>),
}

impl Target<'_> {
    /// Path of `key` under `parent` in this container.
    fn entry_path(&self, parent: &str, key: &ModKey) -> String {
        match (self, key.name()) {
            (_, Some(name)) => child_path(parent, name),
            (Target::Array(items), None) => index_path(parent, items.len()),
            (Target::Dict(_), None) => parent.to_string(),
        }
    }
}

/// Per-tree state threaded through the recursion.
struct Pass<'r> {
    origin: &'r str,
    report: &'r mut ApplyReport,
}

impl Pass<'_> {
    fn diagnose(&mut self, kind: DiagnosticKind, path: &str, message: impl Into<String>) {
        self.report.stats.skipped += 1;
        self.report
            .push_diagnostic(Diagnostic::new(kind, self.origin, path, message));
    }
}

/// Applies mod trees to plist dicts.
#[derive(Debug, Clone, Default)]
pub struct MergeEngine {
    on_kind_mismatch: MismatchPolicy,
}

impl MergeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the kind-mismatch policy
    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.on_kind_mismatch = policy;
        self
    }

    pub fn mismatch_policy(&self) -> MismatchPolicy {
        self.on_kind_mismatch
    }

    /// Apply `trees` to `root` in order; later trees see earlier effects.
    pub fn apply(&self, root: &mut Dict, trees: &[ModTree]) -> ApplyReport {
        let mut report = ApplyReport::new();
        for tree in trees {
            self.apply_tree(root, tree, &mut report);
        }
        report
    }

    /// Apply a single tree, accumulating into `report`.
    pub fn apply_tree(&self, root: &mut Dict, tree: &ModTree, report: &mut ApplyReport) {
        info!(origin = %tree.origin, entries = tree.entries.len(), "applying mods");

        report.sources.push(ModSource {
            origin: tree.origin.clone(),
            digest: tree.digest.clone(),
        });

        let mut pass = Pass {
            origin: &tree.origin,
            report,
        };
        for (key, entry) in &tree.entries {
            self.apply_entry(Target::Dict(root), key, entry, "", &mut pass);
        }
    }

    fn apply_entry(
        &self,
        target: Target<'_>,
        key: &ModKey,
        entry: &ModEntry,
        parent: &str,
        pass: &mut Pass<'_>,
    ) {
        let path = target.entry_path(parent, key);

        if let ModKey::Delete(name) = key {
            match target {
                Target::Dict(dict) => {
                    if dict.remove(name).is_some() {
                        debug!(path = %path, "deleted");
                        pass.report.stats.deleted += 1;
                    } else {
                        debug!(path = %path, "deletion target absent");
                        pass.report.stats.absent_deletions += 1;
                    }
                }
                Target::Array(_) => {
                    pass.diagnose(DiagnosticKind::ContextMismatch, &path, "deletion inside an array")
                }
            }
            return;
        }

        match entry {
            ModEntry::Malformed(reason) => {
                pass.diagnose(DiagnosticKind::MalformedModEntry, &path, reason.as_str());
            }
            ModEntry::Unknown(tag) => {
                debug!(path = %path, tag = %tag, "ignoring unknown type");
                pass.report.stats.unknown_types += 1;
            }
            ModEntry::Ignored => {}
            ModEntry::Scalar(scalar) => self.apply_scalar(target, key, scalar, &path, pass),
            ModEntry::Array(items) => self.apply_array(target, key, items, parent, &path, pass),
            ModEntry::Dict(items) => self.apply_dict(target, key, items, &path, pass),
        }
    }

    fn apply_scalar(
        &self,
        target: Target<'_>,
        key: &ModKey,
        scalar: &Scalar,
        path: &str,
        pass: &mut Pass<'_>,
    ) {
        let node = PlistNode::Scalar(scalar.clone());
        match (target, key) {
            (Target::Array(items), ModKey::Element) => {
                debug!(path = %path, kind = %scalar.kind(), "appended");
                items.push(node);
                pass.report.stats.appended += 1;
            }
            (Target::Dict(dict), ModKey::Upsert(name)) => {
                if dict.upsert(name, node).is_some() {
                    debug!(path = %path, kind = %scalar.kind(), "replaced");
                    pass.report.stats.replaced += 1;
                } else {
                    debug!(path = %path, kind = %scalar.kind(), "inserted");
                    pass.report.stats.inserted += 1;
                }
            }
            (target, _) => Self::context_mismatch(&target, path, pass),
        }
    }

    fn apply_array(
        &self,
        target: Target<'_>,
        key: &ModKey,
        items: &[ModEntry],
        parent: &str,
        path: &str,
        pass: &mut Pass<'_>,
    ) {
        match (target, key) {
            // Keyless array inside an array: its items land in the
            // enclosing array itself.
            (Target::Array(array), ModKey::Element) => {
                for item in items {
                    self.apply_entry(Target::Array(&mut *array), &ModKey::Element, item, parent, pass);
                }
            }
            (Target::Dict(dict), ModKey::Upsert(name)) => {
                let Some(PlistNode::Array(array)) =
                    self.ensure_container(dict, name, NodeKind::Array, path, pass)
                else {
                    return;
                };
                for item in items {
                    self.apply_entry(Target::Array(&mut *array), &ModKey::Element, item, path, pass);
                }
            }
            (target, _) => Self::context_mismatch(&target, path, pass),
        }
    }

    fn apply_dict(
        &self,
        target: Target<'_>,
        key: &ModKey,
        items: &[(ModKey, ModEntry)],
        path: &str,
        pass: &mut Pass<'_>,
    ) {
        match (target, key) {
            (Target::Array(array), ModKey::Element) => {
                array.push(PlistNode::dict());
                pass.report.stats.appended += 1;
                let Some(PlistNode::Dict(dict)) = array.last_mut() else {
                    return;
                };
                for (k, e) in items {
                    self.apply_entry(Target::Dict(&mut *dict), k, e, path, pass);
                }
            }
            (Target::Dict(dict), ModKey::Upsert(name)) => {
                let Some(PlistNode::Dict(dict)) =
                    self.ensure_container(dict, name, NodeKind::Dict, path, pass)
                else {
                    return;
                };
                for (k, e) in items {
                    self.apply_entry(Target::Dict(&mut *dict), k, e, path, pass);
                }
            }
            (target, _) => Self::context_mismatch(&target, path, pass),
        }
    }

    /// The `kind` container stored under `name`, created at the end of
    /// `dict` if absent. `None` when a mismatched value is left in place.
    fn ensure_container<'d>(
        &self,
        dict: &'d mut Dict,
        name: &str,
        kind: NodeKind,
        path: &str,
        pass: &mut Pass<'_>,
    ) -> Option<&'d mut PlistNode> {
        let empty = || match kind {
            NodeKind::Array => PlistNode::array(),
            _ => PlistNode::dict(),
        };

        let Some(index) = dict.position(name) else {
            debug!(path = %path, kind = %kind, "created");
            dict.push(name, empty());
            pass.report.stats.inserted += 1;
            return dict.value_at_mut(dict.len() - 1);
        };

        let existing = dict.value_at(index).map(PlistNode::kind)?;
        if existing != kind {
            let message = format!("'{}' holds a {}, mod expects a {}", name, existing, kind);
            match self.on_kind_mismatch {
                MismatchPolicy::Replace => {
                    pass.report.push_diagnostic(Diagnostic::new(
                        DiagnosticKind::KindMismatch,
                        pass.origin,
                        path,
                        format!("{}; replaced with an empty {}", message, kind),
                    ));
                    dict.replace_at(index, empty());
                    pass.report.stats.replaced += 1;
                }
                MismatchPolicy::Skip => {
                    pass.diagnose(DiagnosticKind::KindMismatch, path, format!("{}; skipped", message));
                    return None;
                }
            }
        }
        dict.value_at_mut(index)
    }

    fn context_mismatch(target: &Target<'_>, path: &str, pass: &mut Pass<'_>) {
        let message = match target {
            Target::Dict(_) => "empty key inside a dict",
            Target::Array(_) => "named entry inside an array",
        };
        pass.diagnose(DiagnosticKind::ContextMismatch, path, message);
    }
}

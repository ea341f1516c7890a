//! plistmods - declarative Info.plist patching
//!
//! Applies JSON "mod" files to a property list: keys are upserted in place,
//! arrays are appended to, dicts merge recursively and `-Key` entries
//! delete. The plist tree itself lives in the `plistmods-tree` crate.

pub mod config;
pub mod diagnostic;
pub mod discovery;
pub mod engine;
pub mod mods;
pub mod pipeline;

pub use config::{ConfigError, EffectiveConfig, Settings};
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use discovery::{DiscoveryError, ModDiscovery};
pub use engine::{ApplyReport, ApplyStats, MergeEngine, MismatchPolicy};
pub use mods::{ModEntry, ModError, ModKey, ModTree};
pub use pipeline::{Pipeline, PipelineError, RunOptions, RunOutcome};

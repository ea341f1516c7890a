//! Pipeline orchestration
//!
//! One `apply` run:
//! - Gate on the build target
//! - Load the plist
//! - Discover and decode mod files
//! - Merge them in order
//! - Save (unless dry-run)
//!
//! A mod file that cannot be read or decoded is reported and skipped; the
//! rest still apply.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use plistmods_tree::{PlistDocument, TreeError};

use crate::config::Settings;
use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::discovery::{DiscoveryError, ModDiscovery};
use crate::engine::{ApplyReport, MergeEngine};
use crate::mods::ModTree;

/// Pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to load plist {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("plist root in {0} is not a dict")]
    RootNotDict(PathBuf),

    #[error("failed to write plist {path}: {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: TreeError,
    },

    #[error("discovery error: {0}")]
    Discovery(#[from] DiscoveryError),
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Per-run options, on top of [`Settings`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Plist to patch. Defaults to `settings.plist`.
    pub plist: Option<PathBuf>,

    /// Build target. Defaults to `settings.targets.default`.
    pub target: Option<String>,

    /// Where to write the result. Defaults to the input plist.
    pub output: Option<PathBuf>,

    /// Merge and report without writing.
    pub dry_run: bool,

    /// Mod files applied after the discovered ones, in order.
    pub mods: Vec<PathBuf>,
}

/// What a run did.
#[derive(Debug)]
pub enum RunOutcome {
    /// Mods were merged. `output` is None for a dry run.
    Applied {
        report: ApplyReport,
        output: Option<PathBuf>,
    },

    /// The target is not enabled; nothing was read or written.
    Skipped { target: String },
}

impl RunOutcome {
    pub fn report(&self) -> Option<&ApplyReport> {
        match self {
            RunOutcome::Applied { report, .. } => Some(report),
            RunOutcome::Skipped { .. } => None,
        }
    }
}

/// Pipeline execution context
#[derive(Debug, Clone)]
pub struct Pipeline {
    settings: Settings,
    engine: MergeEngine,
}

impl Pipeline {
    /// Create a new pipeline with the given settings
    pub fn new(settings: Settings) -> Self {
        let engine = MergeEngine::new().with_mismatch_policy(settings.merge.on_kind_mismatch);
        Self { settings, engine }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ordered mod files: configured directories, then `explicit`.
    pub fn discover(&self, explicit: &[PathBuf]) -> PipelineResult<Vec<PathBuf>> {
        let discovery = ModDiscovery::new(&self.settings.mods.pattern)?
            .with_excludes(self.settings.mods.exclude.as_slice())?
            .warn_missing_dirs(self.settings.mods.warn_missing_dirs);
        Ok(discovery.discover(&self.settings.mods.dirs, explicit)?)
    }

    /// Decode `files` in order. Rejected files become diagnostics on `report`.
    pub fn load_mods(&self, files: &[PathBuf], report: &mut ApplyReport) -> Vec<ModTree> {
        let mut trees = Vec::with_capacity(files.len());
        for path in files {
            match ModTree::load(path) {
                Ok(tree) => {
                    debug!(origin = %tree.origin, entries = tree.entries.len(), "decoded mod file");
                    trees.push(tree);
                }
                Err(e) => {
                    report.stats.skipped += 1;
                    report.push_diagnostic(Diagnostic::new(
                        DiagnosticKind::ModFileRejected,
                        path.display().to_string(),
                        "",
                        e.to_string(),
                    ));
                }
            }
        }
        trees
    }

    /// Execute one run.
    pub fn run(&self, options: &RunOptions) -> PipelineResult<RunOutcome> {
        let target = options
            .target
            .clone()
            .unwrap_or_else(|| self.settings.targets.default.clone());
        if !self.settings.is_target_enabled(&target) {
            info!(target = %target, "target not enabled, skipping plist mods");
            return Ok(RunOutcome::Skipped { target });
        }

        let plist_path = options
            .plist
            .clone()
            .unwrap_or_else(|| self.settings.plist.clone());
        let mut document = load_plist(&plist_path)?;

        let files = self.discover(&options.mods)?;
        info!(plist = %plist_path.display(), files = files.len(), "applying plist mods");

        let mut report = ApplyReport::new();
        let trees = self.load_mods(&files, &mut report);

        let root = document
            .root_dict_mut()
            .ok_or_else(|| PipelineError::RootNotDict(plist_path.clone()))?;
        for tree in &trees {
            self.engine.apply_tree(root, tree, &mut report);
        }

        if options.dry_run {
            info!("dry run, plist not written");
            return Ok(RunOutcome::Applied {
                report,
                output: None,
            });
        }

        let output = options.output.clone().unwrap_or(plist_path);
        document
            .write_to_file(&output)
            .map_err(|source| PipelineError::Save {
                path: output.clone(),
                source,
            })?;
        info!(output = %output.display(), "plist written");

        Ok(RunOutcome::Applied {
            report,
            output: Some(output),
        })
    }
}

fn load_plist(path: &Path) -> PipelineResult<PlistDocument> {
    let document = PlistDocument::from_path(path).map_err(|source| PipelineError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    if document.root_dict().is_none() {
        return Err(PipelineError::RootNotDict(path.to_path_buf()));
    }
    Ok(document)
}

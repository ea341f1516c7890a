//! Configuration merge system
//!
//! Implements the 3-layer configuration merge:
//! 1. Built-in defaults
//! 2. Repo config (.plistmods.toml, or --config)
//! 3. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig, DEFAULT_CONFIG_PATH};
pub use merge::{deep_merge, merge_layers};
pub use settings::{MergeSettings, ModsSettings, Settings, TargetSettings};

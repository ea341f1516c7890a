//! Built-in defaults (layer 1)
//!
//! Hardcoded defaults for every configuration value.

use serde::{Deserialize, Serialize};

use crate::engine::MismatchPolicy;

/// Built-in default configuration values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Plist to patch (default: "Info.plist")
    pub plist: String,

    /// Directories searched for mod files (default: ["PlistMods"])
    pub mods_dirs: Vec<String>,

    /// File-name glob for mod files (default: "*.plistmods")
    pub mods_pattern: String,

    /// Build targets mods are applied for (default: ["ios"])
    pub targets_enabled: Vec<String>,

    /// Target assumed when none is given (default: "ios")
    pub target_default: String,

    /// Kind-mismatch policy (default: replace)
    pub on_kind_mismatch: MismatchPolicy,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            plist: "Info.plist".to_string(),
            mods_dirs: vec!["PlistMods".to_string()],
            mods_pattern: "*.plistmods".to_string(),
            targets_enabled: vec!["ios".to_string()],
            target_default: "ios".to_string(),
            on_kind_mismatch: MismatchPolicy::Replace,
        }
    }
}

impl BuiltinDefaults {
    /// Convert to JSON Value for merging
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "plist": self.plist,
            "mods": {
                "dirs": self.mods_dirs,
                "pattern": self.mods_pattern,
                "exclude": []
            },
            "targets": {
                "enabled": self.targets_enabled,
                "default": self.target_default
            },
            "merge": {
                "on_kind_mismatch": self.on_kind_mismatch.as_str()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert_eq!(defaults.plist, "Info.plist");
        assert_eq!(defaults.mods_dirs, vec!["PlistMods"]);
        assert_eq!(defaults.mods_pattern, "*.plistmods");
        assert_eq!(defaults.target_default, "ios");
        assert_eq!(defaults.on_kind_mismatch, MismatchPolicy::Replace);
    }

    #[test]
    fn test_to_value() {
        let value = BuiltinDefaults::default().to_value();

        assert_eq!(value["plist"], "Info.plist");
        assert_eq!(value["mods"]["pattern"], "*.plistmods");
        assert_eq!(value["targets"]["enabled"][0], "ios");
        assert_eq!(value["merge"]["on_kind_mismatch"], "replace");
        assert!(value["mods"]["exclude"].as_array().unwrap().is_empty());
    }
}

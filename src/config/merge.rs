//! Configuration layer merge
//!
//! - Objects: deep-merge by key
//! - Arrays: REPLACE (last wins)
//! - Scalars: override (last wins)
//!
//! Unlike plist `array` mods, config arrays never concatenate: a repo that
//! sets `mods.dirs` gets exactly the directories it lists.

use serde_json::Value;

/// Deep merge `overlay` onto `base`.
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value,
                };
                base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Merge layers in order (first is base, last has highest precedence)
pub fn merge_layers(layers: Vec<Value>) -> Value {
    layers.into_iter().fold(Value::Null, deep_merge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_table_merge() {
        let base = json!({"mods": {"pattern": "*.plistmods", "dirs": ["PlistMods"]}});
        let overlay = json!({"mods": {"pattern": "*.json"}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["mods"]["pattern"], "*.json");
        assert_eq!(result["mods"]["dirs"][0], "PlistMods");
    }

    #[test]
    fn test_arrays_replace() {
        let base = json!({"targets": {"enabled": ["ios", "tvos"]}});
        let overlay = json!({"targets": {"enabled": ["macos"]}});
        let result = deep_merge(base, overlay);

        assert_eq!(result["targets"]["enabled"], json!(["macos"]));
    }

    #[test]
    fn test_scalar_overrides_table() {
        let result = deep_merge(json!({"merge": {"on_kind_mismatch": "replace"}}), json!({"merge": "skip"}));
        assert_eq!(result["merge"], "skip");
    }

    #[test]
    fn test_merge_layers_precedence() {
        let builtin = json!({"plist": "Info.plist", "merge": {"on_kind_mismatch": "replace"}});
        let repo = json!({"plist": "App/Info.plist"});
        let cli = json!({"merge": {"on_kind_mismatch": "skip"}});

        let result = merge_layers(vec![builtin, repo, cli]);

        assert_eq!(result["plist"], "App/Info.plist");
        assert_eq!(result["merge"]["on_kind_mismatch"], "skip");
    }

    #[test]
    fn test_merge_layers_empty() {
        assert!(merge_layers(vec![]).is_null());
    }
}

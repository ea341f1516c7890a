//! Mod entry keys.

/// Leading character that turns a key into a deletion.
pub const DELETION_MARKER: char = '-';

/// A decoded mod key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModKey {
    /// Empty key: the entry targets the enclosing array, not a named child.
    Element,
    /// Insert the key, or replace its value in place.
    Upsert(String),
    /// Remove the key and its value. The entry's payload is ignored.
    Delete(String),
}

impl ModKey {
    /// Decode a raw mod key.
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return ModKey::Element;
        }
        match raw.strip_prefix(DELETION_MARKER) {
            Some(name) => ModKey::Delete(name.to_string()),
            None => ModKey::Upsert(raw.to_string()),
        }
    }

    /// Plist key this mod key addresses, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ModKey::Element => None,
            ModKey::Upsert(name) | ModKey::Delete(name) => Some(name),
        }
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, ModKey::Delete(_))
    }
}

impl std::fmt::Display for ModKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModKey::Element => Ok(()),
            ModKey::Upsert(name) => write!(f, "{}", name),
            ModKey::Delete(name) => write!(f, "{}{}", DELETION_MARKER, name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(ModKey::parse(""), ModKey::Element);
        assert_eq!(ModKey::parse("Foo"), ModKey::Upsert("Foo".to_string()));
        assert_eq!(ModKey::parse("-Foo"), ModKey::Delete("Foo".to_string()));
    }

    #[test]
    fn test_only_leading_marker_counts() {
        assert_eq!(ModKey::parse("Foo-Bar"), ModKey::Upsert("Foo-Bar".to_string()));
        assert_eq!(ModKey::parse("--Foo"), ModKey::Delete("-Foo".to_string()));
        assert_eq!(ModKey::parse("-"), ModKey::Delete(String::new()));
    }

    #[test]
    fn test_display_roundtrips_raw_key() {
        for raw in ["", "Foo", "-Foo"] {
            assert_eq!(ModKey::parse(raw).to_string(), raw);
        }
    }
}

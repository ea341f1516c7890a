//! Plist documents and file I/O.

use std::fs;
use std::path::Path;

use crate::error::TreeError;
use crate::node::{Dict, PlistNode};
use crate::reader::parse_document;
use crate::writer::write_document;

/// A plist document: the `<plist>` version attribute and its root node.
#[derive(Debug, Clone, PartialEq)]
pub struct PlistDocument {
    pub version: String,
    pub root: PlistNode,
}

impl PlistDocument {
    /// New version 1.0 document.
    pub fn new(root: PlistNode) -> Self {
        Self {
            version: "1.0".to_string(),
            root,
        }
    }

    /// Parse XML plist text.
    pub fn parse(src: &str) -> Result<Self, TreeError> {
        parse_document(src)
    }

    /// Load and parse a plist file.
    pub fn from_path(path: &Path) -> Result<Self, TreeError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Root dict, if the root is a dict.
    pub fn root_dict(&self) -> Option<&Dict> {
        self.root.as_dict()
    }

    pub fn root_dict_mut(&mut self) -> Option<&mut Dict> {
        self.root.as_dict_mut()
    }

    /// Serialize to XML text.
    pub fn to_xml_string(&self) -> Result<String, TreeError> {
        write_document(self)
    }

    /// Write to `path` through a temp file and rename.
    pub fn write_to_file(&self, path: &Path) -> Result<(), TreeError> {
        let xml = self.to_xml_string()?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "plist".to_string());
        let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

        fs::write(&temp_path, xml)?;
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Info.plist");

        let mut root = Dict::new();
        root.push("CFBundleIdentifier", PlistNode::string("com.example.app"));
        let doc = PlistDocument::new(PlistNode::Dict(root));

        doc.write_to_file(&path).unwrap();
        assert!(!dir.path().join(".Info.plist.tmp").exists());

        let loaded = PlistDocument::from_path(&path).unwrap();
        assert_eq!(loaded, doc);
        assert_eq!(
            loaded.root_dict().and_then(|d| d.get("CFBundleIdentifier")).and_then(|n| n.as_str()),
            Some("com.example.app")
        );
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = PlistDocument::from_path(&dir.path().join("nope.plist")).unwrap_err();
        assert!(matches!(err, TreeError::Io(_)));
    }

    #[test]
    fn test_root_dict_mut_on_array_root() {
        let mut doc = PlistDocument::new(PlistNode::array());
        assert!(doc.root_dict_mut().is_none());
    }
}

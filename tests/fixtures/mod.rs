//! Test fixtures for pipeline golden-file assertions
//!
//! - `Info.plist`: an app plist exported without a DOCTYPE
//! - `PlistMods/`: mod files, one of them unparseable, one under `disabled/`
//! - `expected-Info.plist`: the result of applying `PlistMods/` with
//!   `disabled/**` excluded

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Root of the fixture directory
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

/// Path to the input plist fixture
pub fn info_plist_path() -> PathBuf {
    fixtures_dir().join("Info.plist")
}

/// Path to the mods directory fixture
pub fn mods_dir() -> PathBuf {
    fixtures_dir().join("PlistMods")
}

/// Expected output after applying the fixture mods
pub fn expected_plist() -> String {
    fs::read_to_string(fixtures_dir().join("expected-Info.plist"))
        .expect("Failed to read expected plist")
}

/// A scratch project: `Info.plist` and `PlistMods/` copied into a temp dir.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::copy(info_plist_path(), dir.path().join("Info.plist")).expect("copy plist");
        copy_dir(&mods_dir(), &dir.path().join("PlistMods"));
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn plist(&self) -> PathBuf {
        self.path().join("Info.plist")
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.path().join("PlistMods")
    }

    pub fn read_plist(&self) -> String {
        fs::read_to_string(self.plist()).expect("Failed to read plist")
    }
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).expect("create dir");
    for entry in fs::read_dir(from).expect("read dir") {
        let entry = entry.expect("dir entry");
        let target = to.join(entry.file_name());
        if entry.file_type().expect("file type").is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).expect("copy file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_files_exist() {
        assert!(info_plist_path().exists());
        assert!(mods_dir().join("10-version.plistmods").exists());
        assert!(mods_dir().join("disabled/50-experimental.plistmods").exists());
        assert!(expected_plist().contains("<!DOCTYPE plist"));
    }
}

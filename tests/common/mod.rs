#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Test helper for creating temporary directories with declaration files
pub struct TestFixture {
    _temp_dir: TempDir,
    pub base_path: PathBuf,
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let base_path = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            base_path,
        }
    }

    /// Writes `.envrun.toml` and returns its path.
    pub fn write_config(&self, content: &str) -> PathBuf {
        self.write_file(".envrun.toml", content)
    }

    /// Writes a file relative to the fixture root and returns its path.
    pub fn write_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.base_path.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Path of a file under the fixture root, as a string for use in TOML.
    pub fn path_str(&self, name: &str) -> String {
        self.base_path.join(name).to_string_lossy().replace('\\', "/")
    }
}

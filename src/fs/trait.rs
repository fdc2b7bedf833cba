//! FileSystem trait definition

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Type of file system entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    File,
    Directory,
    Symlink,
}

/// A directory entry returned by read_dir
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
}

impl DirEntry {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.name
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Directory
    }
}

/// Abstraction over the application tree so detectors can run against fixtures
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    fn is_file(&self, path: &Path) -> bool;

    fn read_to_string(&self, path: &Path) -> Result<String>;

    /// List directory contents, sorted by name
    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>>;

    /// Names of regular files directly under `dir` ending in `.{extension}`, sorted.
    /// A missing or unreadable directory yields an empty list.
    fn files_with_extension(&self, dir: &Path, extension: &str) -> Vec<String> {
        let suffix = format!(".{}", extension);
        self.read_dir(dir)
            .map(|entries| {
                entries
                    .into_iter()
                    .filter(|e| e.is_file() && e.name.ends_with(&suffix))
                    .map(|e| e.name)
                    .collect()
            })
            .unwrap_or_default()
    }
}

use super::{DirEntry, FileSystem, FileType};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub struct RealFileSystem;

impl RealFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RealFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).context(format!("Failed to read file {:?}", path))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let entries = fs::read_dir(path).context(format!("Failed to read directory {:?}", path))?;

        let mut result = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            let file_type = if path.is_file() {
                FileType::File
            } else if path.is_dir() {
                FileType::Directory
            } else {
                FileType::Symlink
            };

            result.push(DirEntry {
                path,
                name,
                file_type,
            });
        }

        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_app_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let base = dir.path();

        fs::create_dir(base.join("WEB-INF")).unwrap();
        fs::write(base.join("index.jsp"), "<html/>").unwrap();
        fs::write(base.join("b.war"), "").unwrap();
        fs::write(base.join("a.war"), "").unwrap();

        dir
    }

    #[test]
    fn test_exists_and_kinds() {
        let temp = create_app_dir();
        let fs = RealFileSystem::new();

        assert!(fs.exists(temp.path()));
        assert!(fs.is_dir(&temp.path().join("WEB-INF")));
        assert!(fs.is_file(&temp.path().join("index.jsp")));
        assert!(!fs.exists(&temp.path().join("BOOT-INF")));
    }

    #[test]
    fn test_read_to_string() {
        let temp = create_app_dir();
        let fs = RealFileSystem::new();

        let content = fs.read_to_string(&temp.path().join("index.jsp")).unwrap();
        assert_eq!(content, "<html/>");
        assert!(fs.read_to_string(&temp.path().join("missing")).is_err());
    }

    #[test]
    fn test_read_dir_is_sorted() {
        let temp = create_app_dir();
        let fs = RealFileSystem::new();

        let entries = fs.read_dir(temp.path()).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.file_name()).collect();
        assert_eq!(names, vec!["WEB-INF", "a.war", "b.war", "index.jsp"]);
    }

    #[test]
    fn test_files_with_extension() {
        let temp = create_app_dir();
        let fs = RealFileSystem::new();

        assert_eq!(fs.files_with_extension(temp.path(), "war"), vec!["a.war", "b.war"]);
        assert!(fs.files_with_extension(temp.path(), "jar").is_empty());
        assert!(fs
            .files_with_extension(&temp.path().join("missing"), "war")
            .is_empty());
    }
}

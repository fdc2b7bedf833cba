use super::OptsError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MAX_PRIORITY: u8 = 99;
pub const USER_PRIORITY: u8 = 99;
pub const USER_OWNER: &str = "user_java_opts";

const EXTENSION: &str = "opts";

/// One priority-tagged piece of runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub priority: u8,
    pub owner: String,
    pub content: String,
}

impl Fragment {
    pub fn new(priority: u8, owner: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            priority,
            owner: owner.into(),
            content: content.into(),
        }
    }

    pub fn file_name(&self) -> String {
        file_name(self.priority, &self.owner)
    }

    fn parse_file_name(name: &str) -> Option<(u8, String)> {
        let stem = name.strip_suffix(".opts")?;
        let digits = stem.get(..2)?;
        let owner = stem.get(2..)?.strip_prefix('_')?;
        if !digits.bytes().all(|b| b.is_ascii_digit()) || !is_valid_owner(owner) {
            return None;
        }
        Some((digits.parse().ok()?, owner.to_string()))
    }
}

pub fn file_name(priority: u8, owner: &str) -> String {
    format!("{:02}_{}.{}", priority, owner, EXTENSION)
}

fn is_valid_owner(owner: &str) -> bool {
    !owner.is_empty()
        && owner
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Directory of fragments for one build
#[derive(Debug, Clone)]
pub struct OptsStore {
    dir: PathBuf,
}

impl OptsStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Drop every fragment from earlier builds
    pub fn reset(&self) -> Result<(), OptsError> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(OptsError::io(&self.dir, e)),
        }
        fs::create_dir_all(&self.dir).map_err(|e| OptsError::io(&self.dir, e))
    }

    /// Write (or overwrite) the fragment keyed by `(priority, owner)`
    pub fn write_fragment(
        &self,
        priority: u8,
        owner: &str,
        content: &str,
    ) -> Result<PathBuf, OptsError> {
        if priority > MAX_PRIORITY {
            return Err(OptsError::InvalidPriority(priority));
        }
        if !is_valid_owner(owner) {
            return Err(OptsError::InvalidOwner(owner.to_string()));
        }
        if (priority == USER_PRIORITY) != (owner == USER_OWNER) {
            return Err(OptsError::ReservedPriority {
                priority,
                owner: owner.to_string(),
            });
        }

        fs::create_dir_all(&self.dir).map_err(|e| OptsError::io(&self.dir, e))?;
        let path = self.dir.join(file_name(priority, owner));
        fs::write(&path, content).map_err(|e| OptsError::io(&path, e))?;

        debug!(file = %path.display(), priority, "Wrote options fragment");
        Ok(path)
    }

    /// All fragments in composition order. A missing directory holds no fragments;
    /// files that do not follow the naming scheme are ignored.
    pub fn read_fragments(&self) -> Result<Vec<Fragment>, OptsError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(OptsError::io(&self.dir, e)),
        };

        let mut fragments = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| OptsError::io(&self.dir, e))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            let Some((priority, owner)) = Fragment::parse_file_name(&name) else {
                debug!(file = %name, "Ignoring file without fragment name");
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|e| OptsError::io(&path, e))?;
            fragments.push(Fragment {
                priority,
                owner,
                content,
            });
        }

        sort_fragments(&mut fragments);
        Ok(fragments)
    }
}

pub(crate) fn sort_fragments(fragments: &mut [Fragment]) {
    fragments.sort_by(|a, b| (a.priority, &a.owner).cmp(&(b.priority, &b.owner)));
}

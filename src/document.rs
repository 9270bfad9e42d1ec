use crate::error::{PatchError, Result};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A JSON config document together with the file it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    path: PathBuf,
    root: Value,
}

impl ConfigDocument {
    /// Read and parse the document at `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| PatchError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = serde_json::from_str(&contents).map_err(|source| PatchError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), bytes = contents.len(), "config loaded");
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    pub fn from_value(path: impl Into<PathBuf>, root: Value) -> Self {
        Self {
            path: path.into(),
            root,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    /// Two-space indented JSON with a trailing newline
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut contents = serde_json::to_string_pretty(&self.root)?;
        contents.push('\n');
        Ok(contents)
    }

    /// Replace the file on disk with this document.
    ///
    /// The new contents go to a temporary file next to the target, are
    /// synced, then renamed over it. The original is left untouched if any
    /// step before the rename fails. Permissions of an existing file are
    /// carried over.
    pub fn save(&self) -> Result<()> {
        let contents = self.to_pretty_string()?;
        let target = resolve_symlink(&self.path);
        let write_error = |source: std::io::Error| PatchError::Write {
            path: target.clone(),
            source,
        };

        let parent = match target.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let file_name = target
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("openclaw.json");

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}.", file_name))
            .suffix(".tmp")
            .tempfile_in(parent)
            .map_err(&write_error)?;
        temp.write_all(contents.as_bytes()).map_err(&write_error)?;
        temp.as_file().sync_all().map_err(&write_error)?;

        if let Ok(metadata) = fs::metadata(&target) {
            fs::set_permissions(temp.path(), metadata.permissions()).map_err(&write_error)?;
        }

        temp.persist(&target).map_err(|e| write_error(e.error))?;

        info!(path = %target.display(), bytes = contents.len(), "config written");
        Ok(())
    }
}

/// Follow a symlinked config so the link target is replaced, not the link
fn resolve_symlink(path: &Path) -> PathBuf {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_symlink() => {
            fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
        }
        _ => path.to_path_buf(),
    }
}

//! Named notification templates stored as files.
//!
//! Each template is a free-text body kept in `<dir>/<id>.txt`. Adding an
//! existing id overwrites it.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{AlertError, Result};

const EXTENSION: &str = "txt";

/// Directory-backed template store.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Creates a store over `dir`. The directory is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the template directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates or overwrites a template.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` for an invalid id and
    /// `AlertError::Io` if the file cannot be written.
    pub fn add(&self, id: &str, body: &str) -> Result<()> {
        let path = self.path_for(id)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, body)?;
        info!(template = id, path = %path.display(), "saved template");
        Ok(())
    }

    /// Returns the template body, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Validation` for an invalid id and
    /// `AlertError::Io` if the file exists but cannot be read.
    pub fn show(&self, id: &str) -> Result<Option<String>> {
        let path = self.path_for(id)?;
        match fs::read_to_string(&path) {
            Ok(body) => Ok(Some(body)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Returns all template ids, sorted.
    ///
    /// # Errors
    ///
    /// Returns `AlertError::Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_id(stem) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn path_for(&self, id: &str) -> Result<PathBuf> {
        if !is_valid_id(id) {
            return Err(AlertError::validation(format!(
                "invalid template id '{id}': use letters, digits, '-' or '_'"
            )));
        }
        Ok(self.dir.join(format!("{id}.{EXTENSION}")))
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

//! HTML entry document
//!
//! Holds the page text together with where it came from, so that resource
//! roots declared relative to the page can be resolved on disk.

use crate::error::{BustError, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// An HTML document loaded from (or destined for) the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlDocument {
    path: PathBuf,
    cwd: PathBuf,
    contents: String,
}

impl HtmlDocument {
    /// Create a document from in-memory contents.
    ///
    /// `path` may be relative; it is interpreted against `cwd`.
    pub fn new(path: impl Into<PathBuf>, cwd: impl Into<PathBuf>, contents: String) -> Self {
        Self {
            path: path.into(),
            cwd: cwd.into(),
            contents,
        }
    }

    /// Read a document from `path`, resolving relative paths against `cwd`
    pub fn load(path: impl Into<PathBuf>, cwd: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let cwd = cwd.into();
        let full_path = cwd.join(&path);
        let contents = fs::read_to_string(&full_path).map_err(|source| BustError::DocumentRead {
            path: full_path,
            source,
        })?;

        Ok(Self {
            path,
            cwd,
            contents,
        })
    }

    /// Path of the document as given
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Working directory relative paths are resolved against
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Absolute (or cwd-joined) path of the document
    pub fn full_path(&self) -> PathBuf {
        self.cwd.join(&self.path)
    }

    /// Directory containing the document; resource roots are relative to it
    pub fn base_dir(&self) -> PathBuf {
        let full_path = self.full_path();
        full_path
            .parent()
            .map_or_else(|| self.cwd.clone(), Path::to_path_buf)
    }

    /// Document text
    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// Replace the document text, keeping path and working directory
    #[must_use]
    pub fn with_contents(self, contents: String) -> Self {
        Self { contents, ..self }
    }

    /// Write the document back to its own path
    pub fn write(&self) -> Result<()> {
        self.write_to(&self.full_path())
    }

    /// Write the document to `path`.
    ///
    /// The contents go to a temporary sibling file first and are then renamed
    /// over `path`, so readers never observe a partially written page.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let write_err = |source: std::io::Error| BustError::DocumentWrite {
            path: path.to_path_buf(),
            source,
        };

        let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".tmp");
        let temp_path = path.with_file_name(temp_name);

        {
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(write_err)?;
            file.write_all(self.contents.as_bytes()).map_err(write_err)?;
            file.flush().map_err(write_err)?;
        }

        fs::rename(&temp_path, path).map_err(write_err)
    }
}

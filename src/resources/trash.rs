//! Recoverable deletion: move entries into the user's trash.
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CiderError;

/// Moves filesystem entries somewhere the user can recover them from.
pub trait TrashMover: Send + Sync + std::fmt::Debug {
    /// Move `path` (file, directory or symlink) into the trash and return
    /// where it ended up.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be moved.
    fn move_to_trash(&self, path: &Path) -> Result<PathBuf, CiderError>;
}

/// Trash backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct SystemTrash {
    dir: PathBuf,
}

impl SystemTrash {
    /// Use `dir` as the trash directory.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The platform trash for `home`: `~/.Trash` on macOS, the XDG trash
    /// `files/` directory elsewhere.
    #[must_use]
    pub fn for_home(home: &Path, xdg_data_home: Option<OsString>) -> Self {
        if cfg!(target_os = "macos") {
            return Self::new(home.join(".Trash"));
        }
        let data = xdg_data_home
            .filter(|d| !d.is_empty())
            .map_or_else(|| home.join(".local").join("share"), PathBuf::from);
        Self::new(data.join("Trash").join("files"))
    }

    /// Directory entries are moved into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// First free name in the trash for an entry called `name`.
    fn free_slot(&self, name: &str) -> PathBuf {
        let first = self.dir.join(name);
        if first.symlink_metadata().is_err() {
            return first;
        }
        let stamp = chrono::Local::now().format("%H-%M-%S");
        (1u32..)
            .map(|n| self.dir.join(format!("{name} {stamp} {n}")))
            .find(|candidate| candidate.symlink_metadata().is_err())
            .unwrap_or(first)
    }
}

impl TrashMover for SystemTrash {
    fn move_to_trash(&self, path: &Path) -> Result<PathBuf, CiderError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CiderError::Storage {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "path has no file name",
                ),
            })?;
        fs::create_dir_all(&self.dir).map_err(|source| CiderError::Storage {
            path: self.dir.clone(),
            source,
        })?;
        let slot = self.free_slot(&name);
        fs::rename(path, &slot).map_err(|source| CiderError::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("moved {} to {}", path.display(), slot.display());
        Ok(slot)
    }
}

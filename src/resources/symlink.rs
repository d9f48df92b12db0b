//! Symlink resource.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::ResourceState;
use super::helpers::fs::{ensure_parent_dir, entry_exists};
use super::trash::TrashMover;
use crate::error::CiderError;

/// A symlink resource that can be checked and applied.
#[derive(Debug, Clone)]
pub struct SymlinkResource {
    /// The source file/directory (what the symlink points to).
    pub source: PathBuf,
    /// The target path (where the symlink will be created).
    pub target: PathBuf,
}

/// Result of [`SymlinkResource::ensure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link did not exist and was created.
    Created,
    /// The link already pointed at the source.
    AlreadySatisfied,
    /// Something else occupied the target and was moved to the trash
    /// before the link was created.
    Replaced {
        /// What occupied the target.
        previous: String,
        /// Where the previous entry was moved to.
        trashed: PathBuf,
    },
    /// Something else occupies the target; it was left untouched.
    Conflict {
        /// What occupies the target and why it was not replaced.
        detail: String,
    },
}

impl SymlinkResource {
    /// Create a new symlink resource.
    #[must_use]
    pub const fn new(source: PathBuf, target: PathBuf) -> Self {
        Self { source, target }
    }

    /// Human-readable description of this link.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{} -> {}", self.target.display(), self.source.display())
    }

    /// Check what currently lives at the target.
    ///
    /// # Errors
    ///
    /// Returns an error if the target's metadata cannot be read for a reason
    /// other than absence.
    pub fn current_state(&self) -> Result<ResourceState, CiderError> {
        if !self.source.exists() {
            return Ok(ResourceState::Invalid {
                reason: format!("source does not exist: {}", self.source.display()),
            });
        }

        let meta = match fs::symlink_metadata(&self.target) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(ResourceState::Missing),
            Err(source) => {
                return Err(CiderError::Storage {
                    path: self.target.clone(),
                    source,
                });
            }
        };

        if meta.is_symlink() {
            let existing = fs::read_link(&self.target).unwrap_or_default();
            return Ok(
                match (
                    dunce::canonicalize(&self.target),
                    dunce::canonicalize(&self.source),
                ) {
                    (Ok(resolved), Ok(source)) if resolved == source => ResourceState::Correct,
                    (Ok(_), _) => ResourceState::Incorrect {
                        current: format!("points to {}", existing.display()),
                    },
                    (Err(_), _) => ResourceState::Incorrect {
                        current: format!("dangling link to {}", existing.display()),
                    },
                },
            );
        }

        Ok(ResourceState::Incorrect {
            current: if meta.is_dir() {
                "target is a directory".to_string()
            } else {
                "target is a regular file".to_string()
            },
        })
    }

    /// Create the link, assuming nothing occupies the target.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::SymlinkConflict`] if the target appeared in the
    /// meantime, or a storage error for any other failure.
    pub fn apply(&self) -> Result<(), CiderError> {
        ensure_parent_dir(&self.target)?;
        create_symlink(&self.source, &self.target).map_err(|source| {
            if source.kind() == io::ErrorKind::AlreadyExists {
                CiderError::SymlinkConflict {
                    target: self.target.clone(),
                    detail: "target appeared while linking".to_string(),
                }
            } else {
                CiderError::Storage {
                    path: self.target.clone(),
                    source,
                }
            }
        })
    }

    /// Bring the target into agreement with the source.
    ///
    /// Without `force`, an occupied target is reported as a conflict and
    /// left alone.  With `force`, the occupant is moved to the trash and
    /// creation is attempted exactly once more; a failed trash move is
    /// reported as a conflict.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::SymlinkSourceMissing`] if the source does not
    /// exist, or a storage error if the filesystem refuses the link for a
    /// reason other than an occupied target.
    pub fn ensure(&self, force: bool, trash: &dyn TrashMover) -> Result<LinkOutcome, CiderError> {
        let previous = match self.current_state()? {
            ResourceState::Invalid { .. } => {
                return Err(CiderError::SymlinkSourceMissing {
                    path: self.source.clone(),
                });
            }
            ResourceState::Correct => return Ok(LinkOutcome::AlreadySatisfied),
            ResourceState::Missing => match self.apply() {
                Ok(()) => return Ok(LinkOutcome::Created),
                Err(CiderError::SymlinkConflict { detail, .. }) => detail,
                Err(e) => return Err(e),
            },
            ResourceState::Incorrect { current } => current,
        };

        if !force {
            return Ok(LinkOutcome::Conflict { detail: previous });
        }

        let trashed = match trash.move_to_trash(&self.target) {
            Ok(slot) => slot,
            Err(e) => {
                return Ok(LinkOutcome::Conflict {
                    detail: format!("{previous}; could not move it to the trash: {e}"),
                });
            }
        };

        match self.apply() {
            Ok(()) => Ok(LinkOutcome::Replaced { previous, trashed }),
            Err(CiderError::SymlinkConflict { detail, .. }) => Ok(LinkOutcome::Conflict { detail }),
            Err(e) => Err(e),
        }
    }
}

/// Delete the symlink at `path` itself (never what it points to).
///
/// # Errors
///
/// Returns an error if `path` is not a symlink or cannot be removed.
pub fn remove_symlink(path: &Path) -> Result<(), CiderError> {
    let storage = |source| CiderError::Storage {
        path: path.to_path_buf(),
        source,
    };
    let meta = fs::symlink_metadata(path).map_err(storage)?;
    if !meta.is_symlink() {
        return Err(storage(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a symlink",
        )));
    }
    fs::remove_file(path).map_err(storage)
}

/// Create a symlink at `link` pointing to `target`.
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    if entry_exists(link) {
        return Err(io::Error::from(io::ErrorKind::AlreadyExists));
    }

    std::os::unix::fs::symlink(target, link)
}

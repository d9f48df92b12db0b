//! File-system resource helpers.
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::CiderError;

/// Upper bound on symlink hops followed by [`resolve_lenient`].
const MAX_LINK_DEPTH: usize = 40;

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), CiderError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

/// Ensure `dir` exists as a directory, creating ancestors as needed.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<(), CiderError> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| CiderError::Storage {
        path: dir.to_path_buf(),
        source,
    })
}

/// Whether any filesystem entry exists at `path`, without following a final
/// symlink (a dangling link counts as present).
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Whether `path` itself is a symlink.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    path.symlink_metadata().is_ok_and(|m| m.is_symlink())
}

/// Resolve `path` to its real location.
///
/// Existing paths are canonicalized.  For paths that do not fully exist,
/// such as a dangling symlink, links are followed as far as they go, the
/// deepest existing ancestor is canonicalized, and the rest is normalized
/// lexically.
#[must_use]
pub fn resolve_lenient(path: &Path) -> PathBuf {
    resolve_with_depth(path, 0)
}

fn resolve_with_depth(path: &Path, depth: usize) -> PathBuf {
    if let Ok(real) = dunce::canonicalize(path) {
        return real;
    }
    let path = normalize_lexically(path);
    if depth < MAX_LINK_DEPTH
        && let Ok(dest) = fs::read_link(&path)
    {
        let base = path.parent().unwrap_or_else(|| Path::new("/"));
        return resolve_with_depth(&base.join(dest), depth + 1);
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            resolve_with_depth(parent, depth).join(name)
        }
        _ => path,
    }
}

/// Drop `.` components and fold `..` into their parent without touching the
/// filesystem.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Whether the real location of `path` lies inside the real location of
/// `root`.
///
/// Comparison is by path components after resolution, so a sibling such as
/// `symlinks-old` is never inside `symlinks`.
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    resolve_lenient(path).starts_with(resolve_lenient(root))
}

/// List every entry below `root`, relative to it, in sorted order.
///
/// Symlinked directories are listed but not descended into.  A missing root
/// yields an empty list.
///
/// # Errors
///
/// Returns an error if a directory under `root` cannot be read.
pub fn list_tree(root: &Path) -> Result<Vec<PathBuf>, CiderError> {
    let mut entries = Vec::new();
    match walk(root, Path::new(""), &mut entries) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound && entries.is_empty() => {}
        Err(source) => {
            return Err(CiderError::Storage {
                path: root.to_path_buf(),
                source,
            });
        }
    }
    entries.sort();
    Ok(entries)
}

fn walk(root: &Path, relative: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(root.join(relative))? {
        let entry = entry?;
        let rel = relative.join(entry.file_name());
        let descend = entry.file_type()?.is_dir();
        out.push(rel.clone());
        if descend {
            walk(root, &rel, out)?;
        }
    }
    Ok(())
}

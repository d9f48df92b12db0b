//! The bootstrap manifest: packages, taps, dependencies, symlink rules,
//! scripts and icons.
//!
//! Reads go through [`Manifest::read`], which returns a fresh typed copy of
//! the document.  Writes never go through the typed view: they are expressed
//! as transforms over the raw document and applied with
//! [`store::modify`](crate::store::modify), so keys the engine does not know
//! about survive untouched.
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::{malformed, ordered_map, root_object, string_list, take_object};
use crate::error::CiderError;
use crate::store;

/// Key under which taps are stored.
pub const TAPS_KEY: &str = "taps";
/// Key under which icons are stored.
pub const ICONS_KEY: &str = "icons";

/// The two categories of installable units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageKind {
    /// Command-line formulas (the primary kind).
    Formula,
    /// GUI application casks (the alternate kind).
    Cask,
}

impl PackageKind {
    /// Manifest key holding packages of this kind.
    #[must_use]
    pub const fn manifest_key(self) -> &'static str {
        match self {
            Self::Formula => "formulas",
            Self::Cask => "casks",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formula => write!(f, "formula"),
            Self::Cask => write!(f, "cask"),
        }
    }
}

/// A parsed dependency reference such as `"cask/iterm2"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyRef {
    /// A dependency on a package of a specific kind.
    Package {
        /// Kind the dependency must be installed as.
        kind: PackageKind,
        /// Package name.
        name: String,
    },
    /// Any other form; carried along but never acted on.
    Unrecognized(String),
}

impl DependencyRef {
    /// Parse a reference; only `cask/<name>` is recognized.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('/') {
            Some(("cask", name)) if !name.is_empty() && !name.contains('/') => Self::Package {
                kind: PackageKind::Cask,
                name: name.to_string(),
            },
            _ => Self::Unrecognized(raw.to_string()),
        }
    }
}

/// Either a single dependency string or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum DependencySpec {
    /// `"a": "cask/b"`
    One(String),
    /// `"a": ["cask/b", "cask/c"]`
    Many(Vec<String>),
}

impl DependencySpec {
    /// All references in declaration order.
    #[must_use]
    pub fn refs(&self) -> Vec<DependencyRef> {
        match self {
            Self::One(raw) => vec![DependencyRef::parse(raw)],
            Self::Many(raws) => raws.iter().map(|r| DependencyRef::parse(r)).collect(),
        }
    }
}

/// Typed, read-only copy of the manifest.
///
/// Missing keys default to empty collections; present keys of the wrong
/// shape are a [`CiderError::MalformedDocument`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Manifest {
    /// Primary-kind packages.
    pub formulas: Vec<String>,
    /// Alternate-kind packages.
    pub casks: Vec<String>,
    /// Formula → dependency references, in document order.
    #[serde(deserialize_with = "ordered_map")]
    pub dependencies: Vec<(String, DependencySpec)>,
    /// Repository taps.
    pub taps: Vec<String>,
    /// Source glob (relative to the symlink root) → destination template.
    #[serde(deserialize_with = "ordered_map")]
    pub symlinks: Vec<(String, String)>,
    /// Scripts run before anything else during restore.
    pub before_scripts: Vec<String>,
    /// Scripts run after everything else during restore.
    pub after_scripts: Vec<String>,
    /// Application name → icon source (local path or URL).
    #[serde(deserialize_with = "ordered_map")]
    pub icons: Vec<(String, String)>,
}

impl Manifest {
    /// Read the manifest at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::ManifestMissing`] if the file has never been
    /// written, or a storage/malformed error if it cannot be read.
    pub fn read(path: &Path) -> Result<Self, CiderError> {
        let doc = store::load(path, None).map_err(|e| {
            if e.is_not_found() {
                CiderError::ManifestMissing {
                    path: path.to_path_buf(),
                }
            } else {
                e
            }
        })?;
        Self::from_document(&doc, path)
    }

    /// Build the typed view from a raw document.
    ///
    /// # Errors
    ///
    /// Returns [`CiderError::MalformedDocument`] if a known key has the
    /// wrong shape or the document is not an object.
    pub fn from_document(doc: &Value, path: &Path) -> Result<Self, CiderError> {
        if !doc.is_object() {
            return Err(malformed(path, "top-level value must be an object"));
        }
        Self::deserialize(doc).map_err(|e| malformed(path, &e.to_string()))
    }

    /// Packages of the given kind.
    #[must_use]
    pub fn packages(&self, kind: PackageKind) -> &[String] {
        match kind {
            PackageKind::Formula => &self.formulas,
            PackageKind::Cask => &self.casks,
        }
    }

    /// Dependency references declared for `formula`.
    #[must_use]
    pub fn dependencies_of(&self, formula: &str) -> Vec<DependencyRef> {
        self.dependencies
            .iter()
            .filter(|(name, _)| name == formula)
            .flat_map(|(_, entry)| entry.refs())
            .collect()
    }
}

/// Add `item` to a sorted set (no-op if already present).
#[must_use]
pub fn with_item(mut items: Vec<String>, item: &str) -> Vec<String> {
    if !items.iter().any(|i| i == item) {
        items.push(item.to_string());
    }
    items
}

/// Remove `item` from a sorted set (no-op if absent).
#[must_use]
pub fn without_item(items: Vec<String>, item: &str) -> Vec<String> {
    items.into_iter().filter(|i| i != item).collect()
}

/// Apply `transform` to the string list stored under `key`.
///
/// Change is judged by membership: when the set of names is the same
/// afterwards the document is left exactly as it was, even if the stored
/// list is unsorted or holds duplicates.  Otherwise the list is written
/// back deduplicated and sorted.  Returns `true` if the file changed.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or written, or if the
/// key holds something other than a list of strings.
pub fn modify_list<F>(path: &Path, key: &str, transform: F) -> Result<bool, CiderError>
where
    F: FnOnce(Vec<String>) -> Vec<String>,
{
    store::modify(path, |mut doc| {
        let object = root_object(&mut doc, path)?;
        let current = string_list(object, key, path)?;
        let before: BTreeSet<String> = current.iter().cloned().collect();
        let after: BTreeSet<String> = transform(current).into_iter().collect();
        if after != before {
            object.insert(key.to_string(), Value::from(Vec::from_iter(after)));
        }
        Ok(doc)
    })
}

/// Record `app → icon` in the manifest.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or written or its
/// `icons` key is not an object.
pub fn set_icon(path: &Path, app: &str, icon: &str) -> Result<bool, CiderError> {
    store::modify(path, |mut doc| {
        let object = root_object(&mut doc, path)?;
        let mut icons = take_object(object, ICONS_KEY, path)?;
        icons.insert(app.to_string(), Value::from(icon));
        object.insert(ICONS_KEY.to_string(), Value::Object(icons));
        Ok(doc)
    })
}

/// Drop the icon entry for `app` from the manifest.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or written or its
/// `icons` key is not an object.
pub fn remove_icon(path: &Path, app: &str) -> Result<bool, CiderError> {
    store::modify(path, |mut doc| {
        let object = root_object(&mut doc, path)?;
        let had_icons = object.contains_key(ICONS_KEY);
        let mut icons = take_object(object, ICONS_KEY, path)?;
        icons.remove(app);
        if had_icons {
            object.insert(ICONS_KEY.to_string(), Value::Object(icons));
        }
        Ok(doc)
    })
}

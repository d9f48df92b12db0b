//! State-file layout and the typed models over the manifest and preferences
//! documents.
pub mod manifest;
pub mod preferences;

use std::ffi::OsString;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::{Map, Value};

use crate::error::CiderError;

/// Environment variable that overrides the tool directory.
pub const DIR_ENV: &str = "CIDER_DIR";

/// Locations of every file the engine owns, rooted at the tool directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// The tool directory (`~/.cider` by default).
    pub root: PathBuf,
}

impl Paths {
    /// Use `root` as the tool directory.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the tool directory from an explicit flag, the `CIDER_DIR`
    /// environment value, or `<home>/.cider`, in that order.
    #[must_use]
    pub fn resolve(explicit: Option<&Path>, env_dir: Option<OsString>, home: &Path) -> Self {
        explicit.map_or_else(
            || {
                env_dir
                    .filter(|d| !d.is_empty())
                    .map_or_else(|| Self::new(home.join(".cider")), Self::new)
            },
            Self::new,
        )
    }

    /// Managed symlink root: every declared symlink source lives under here.
    #[must_use]
    pub fn symlink_dir(&self) -> PathBuf {
        self.root.join("symlinks")
    }

    /// The bootstrap manifest.
    #[must_use]
    pub fn bootstrap_file(&self) -> PathBuf {
        self.root.join("bootstrap.json")
    }

    /// The preferences document.
    #[must_use]
    pub fn defaults_file(&self) -> PathBuf {
        self.root.join("defaults.json")
    }

    /// Private cache directory for transient state.
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(".cache")
    }

    /// Snapshot of the symlink destinations created by the last relink.
    #[must_use]
    pub fn symlink_targets_file(&self) -> PathBuf {
        self.cache_dir().join("symlink_targets.json")
    }
}

/// Expand a leading `~` to `home`.
#[must_use]
pub fn expand_user(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Replace a leading `home` with `~` for display.
#[must_use]
pub fn collapse_user(path: &Path, home: &Path) -> String {
    path.strip_prefix(home).map_or_else(
        |_| path.display().to_string(),
        |rest| {
            if rest.as_os_str().is_empty() {
                "~".to_string()
            } else {
                format!("~/{}", rest.display())
            }
        },
    )
}

/// Deserialize a JSON object into `(key, value)` pairs in document order.
pub(crate) fn ordered_map<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct OrderedMapVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a JSON object")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedMapVisitor(PhantomData))
}

/// Borrow the root of a state document as an object.
pub(crate) fn root_object<'a>(
    doc: &'a mut Value,
    path: &Path,
) -> Result<&'a mut Map<String, Value>, CiderError> {
    doc.as_object_mut()
        .ok_or_else(|| malformed(path, "top-level value must be an object"))
}

/// Read `key` of `object` as a list of strings (empty when absent).
pub(crate) fn string_list(
    object: &Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<Vec<String>, CiderError> {
    match object.get(key) {
        None => Ok(Vec::new()),
        Some(value) => Vec::<String>::deserialize(value)
            .map_err(|e| malformed(path, &format!("\"{key}\" must be a list of strings: {e}"))),
    }
}

/// Remove `key` from `object` as a nested object (empty when absent).
pub(crate) fn take_object(
    object: &mut Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<Map<String, Value>, CiderError> {
    match object.remove(key) {
        None => Ok(Map::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(malformed(path, &format!("\"{key}\" must be an object"))),
    }
}

pub(crate) fn malformed(path: &Path, message: &str) -> CiderError {
    CiderError::MalformedDocument {
        path: path.to_path_buf(),
        message: message.to_string(),
    }
}

//! Atomic read/transform/write cycle for JSON state files.
//!
//! Every state file (manifest, preferences, symlink snapshot) goes through
//! this module.  Writes render the whole document in memory with canonical
//! formatting (sorted keys, four-space indent), stage it in a sibling temp
//! file and rename it over the original, so a concurrent reader never sees a
//! partially written file.  [`modify`] only writes when the transform
//! produced a structurally different document.
use std::fs;
use std::io::{ErrorKind, Write as _};
use std::path::Path;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CiderError;

/// Read and parse the document at `path`.
///
/// When `fallback` is given and the file does not exist, the fallback is
/// returned instead of an error.
///
/// # Errors
///
/// Returns [`CiderError::Storage`] if the file cannot be read (including
/// absence without a fallback) and [`CiderError::MalformedDocument`] if the
/// content is not valid JSON.
pub fn load(path: &Path, fallback: Option<Value>) -> Result<Value, CiderError> {
    match fs::read_to_string(path) {
        Ok(contents) => parse(path, &contents),
        Err(e) if e.kind() == ErrorKind::NotFound => fallback.ok_or_else(|| storage(path, e)),
        Err(e) => Err(storage(path, e)),
    }
}

/// Apply `transform` to the document at `path`, writing it back only if it
/// changed.
///
/// A missing file is treated as an empty object and is always created.
/// Returns `true` when the file content was rewritten.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written, if its content
/// is malformed, or if `transform` itself fails.
pub fn modify<F>(path: &Path, transform: F) -> Result<bool, CiderError>
where
    F: FnOnce(Value) -> Result<Value, CiderError>,
{
    let (old, existed) = match fs::read_to_string(path) {
        Ok(contents) => (parse(path, &contents)?, true),
        Err(e) if e.kind() == ErrorKind::NotFound => (Value::Object(Map::new()), false),
        Err(e) => return Err(storage(path, e)),
    };

    let new = transform(old.clone())?;
    let changed = old != new;
    if changed || !existed {
        write_atomic(path, &render(&new))?;
    }
    Ok(changed)
}

/// Unconditionally write `document` to `path`.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized or written.
pub fn save<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<(), CiderError> {
    let value = serde_json::to_value(document).map_err(|e| CiderError::MalformedDocument {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    write_atomic(path, &render(&value))
}

/// Render a document in canonical form: keys sorted at every level, four
/// space indent, trailing newline.
#[must_use]
pub fn render(document: &Value) -> String {
    let sorted = sort_keys(document.clone());
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    // Serializing a `Value` into a `Vec` cannot fail.
    if sorted.serialize(&mut ser).is_err() {
        return String::new();
    }
    let mut out = String::from_utf8_lossy(&buf).into_owned();
    out.push('\n');
    out
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, sort_keys(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

fn parse(path: &Path, contents: &str) -> Result<Value, CiderError> {
    serde_json::from_str(contents).map_err(|e| CiderError::MalformedDocument {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn storage(path: &Path, source: std::io::Error) -> CiderError {
    CiderError::Storage {
        path: path.to_path_buf(),
        source,
    }
}

/// Stage `contents` in a sibling temp file, carry over the permissions of
/// the file being replaced, then rename it into place.
fn write_atomic(path: &Path, contents: &str) -> Result<(), CiderError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| storage(parent, e))?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| storage(path, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| storage(path, e))?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions()).map_err(|e| storage(path, e))?;
    }

    tmp.persist(path).map_err(|e| storage(path, e.error))?;
    Ok(())
}

//! OS preference writer binding (`defaults write` / `defaults delete`).
use std::sync::Arc;

use anyhow::{Context as _, Result, bail};
use serde_json::Value;

use crate::exec::Executor;

/// Writes and deletes OS preference values.
pub trait PreferenceWriter: Send + Sync + std::fmt::Debug {
    /// Write `domain/key = value`.  With `force`, a rejected write is
    /// retried once after deleting the existing key.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be written.
    fn write(&self, domain: &str, key: &str, value: &Value, force: bool) -> Result<()>;

    /// Delete `domain/key`.  Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer cannot be run.
    fn delete(&self, domain: &str, key: &str) -> Result<()>;
}

/// [`PreferenceWriter`] backed by the `defaults` command.
#[derive(Debug, Clone)]
pub struct Defaults {
    executor: Arc<dyn Executor>,
}

impl Defaults {
    /// Create a binding that runs `defaults` through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

/// Render a JSON value as `defaults write` type flag plus arguments.
///
/// # Errors
///
/// Returns an error for `null`, which has no preference representation.
pub fn write_args(value: &Value) -> Result<Vec<String>> {
    let mut args = Vec::new();
    match value {
        Value::Null => bail!("null cannot be written as a preference value"),
        Value::Bool(b) => {
            args.push("-bool".to_string());
            args.push(b.to_string());
        }
        Value::Number(n) => {
            args.push(if n.is_f64() { "-float" } else { "-int" }.to_string());
            args.push(n.to_string());
        }
        Value::String(s) => {
            args.push("-string".to_string());
            args.push(s.clone());
        }
        Value::Array(items) => {
            args.push("-array".to_string());
            args.extend(items.iter().map(scalar));
        }
        Value::Object(entries) => {
            args.push("-dict".to_string());
            for (k, v) in entries {
                args.push(k.clone());
                args.push(scalar(v));
            }
        }
    }
    Ok(args)
}

/// Nested values are passed as their plain text (strings) or JSON text.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl PreferenceWriter for Defaults {
    fn write(&self, domain: &str, key: &str, value: &Value, force: bool) -> Result<()> {
        let typed = write_args(value).with_context(|| format!("{domain} {key}"))?;
        let mut args = vec!["write", domain, key];
        args.extend(typed.iter().map(String::as_str));

        match self.executor.run("defaults", &args) {
            Ok(_) => Ok(()),
            Err(e) if force => {
                tracing::debug!("defaults write rejected ({e}); deleting {domain} {key} and retrying");
                self.delete(domain, key)?;
                self.executor
                    .run("defaults", &args)
                    .map(|_| ())
                    .with_context(|| format!("writing {domain} {key}"))
            }
            Err(e) => Err(e).with_context(|| format!("writing {domain} {key}")),
        }
    }

    fn delete(&self, domain: &str, key: &str) -> Result<()> {
        let result = self
            .executor
            .run_unchecked("defaults", &["delete", domain, key])
            .with_context(|| format!("deleting {domain} {key}"))?;
        if !result.success {
            tracing::debug!("defaults delete {domain} {key}: {}", result.stderr.trim());
        }
        Ok(())
    }
}

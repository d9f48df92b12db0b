//! Before/after scripts.
use anyhow::Result;

use super::{Context, Task, TaskResult};
use crate::config::manifest::Manifest;
use crate::error::CiderError;

/// Run each script through the shell with the tool directory as working
/// directory, stopping at the first one that exits non-zero.
///
/// # Errors
///
/// Returns [`CiderError::ScriptFailed`] for a non-zero exit, or an error if
/// the shell cannot be spawned.
pub fn run_scripts(ctx: &Context, scripts: &[String]) -> Result<()> {
    for script in scripts {
        ctx.log.info(&format!("running {script}"));
        let code = ctx.executor.run_script(script, &ctx.paths.root)?;
        if code != 0 {
            return Err(CiderError::ScriptFailed {
                script: script.clone(),
                code,
            }
            .into());
        }
    }
    Ok(())
}

/// Runs `before-scripts` ahead of every other restore phase.
#[derive(Debug)]
pub struct RunBeforeScripts;

impl Task for RunBeforeScripts {
    fn name(&self) -> &'static str {
        "Run before-scripts"
    }

    fn should_run(&self, _: &Context, manifest: &Manifest) -> bool {
        !manifest.before_scripts.is_empty()
    }

    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult> {
        run_scripts(ctx, &manifest.before_scripts)?;
        Ok(TaskResult::Ok)
    }
}

/// Runs `after-scripts` once everything else is in place.
#[derive(Debug)]
pub struct RunAfterScripts;

impl Task for RunAfterScripts {
    fn name(&self) -> &'static str {
        "Run after-scripts"
    }

    fn should_run(&self, _: &Context, manifest: &Manifest) -> bool {
        !manifest.after_scripts.is_empty()
    }

    fn run(&self, ctx: &Context, manifest: &Manifest) -> Result<TaskResult> {
        run_scripts(ctx, &manifest.after_scripts)?;
        Ok(TaskResult::Ok)
    }
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use crate::config::Paths;
use crate::config::manifest::PackageKind;
use crate::exec::Executor;
use crate::logging::Log;
use crate::resources::defaults::{Defaults, PreferenceWriter};
use crate::resources::icon::{AppLocator, FileIcon, IconSetter, MacApps};
use crate::resources::package::{Brew, PackageManager};
use crate::resources::trash::{SystemTrash, TrashMover};

/// Shared context for task execution.
///
/// Every binding to the live system is a trait object so tasks can be
/// exercised against fakes.
pub struct Context {
    /// Locations of the state files.
    pub paths: Paths,
    /// User's home directory path.
    pub home: PathBuf,
    /// Package kind selected on the command line (`--cask`).
    pub kind: PackageKind,
    /// Logger for output and task recording.
    pub log: Arc<dyn Log>,
    /// Command executor, used for before/after scripts.
    pub executor: Arc<dyn Executor>,
    /// Package manager binding.
    pub packages: Arc<dyn PackageManager>,
    /// Preference writer binding.
    pub defaults: Arc<dyn PreferenceWriter>,
    /// Application lookup.
    pub apps: Arc<dyn AppLocator>,
    /// Icon setter binding.
    pub icons: Arc<dyn IconSetter>,
    /// Where displaced symlink targets go.
    pub trash: Arc<dyn TrashMover>,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("paths", &self.paths)
            .field("home", &self.home)
            .field("kind", &self.kind)
            .field("log", &"<dyn Log>")
            .field("executor", &"<dyn Executor>")
            .field("packages", &"<dyn PackageManager>")
            .field("defaults", &"<dyn PreferenceWriter>")
            .field("apps", &"<dyn AppLocator>")
            .field("icons", &"<dyn IconSetter>")
            .field("trash", &"<dyn TrashMover>")
            .finish()
    }
}

impl Context {
    /// Creates a context whose bindings drive the real system through
    /// `executor`.
    #[must_use]
    pub fn new(
        paths: Paths,
        home: PathBuf,
        kind: PackageKind,
        log: Arc<dyn Log>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            packages: Arc::new(Brew::new(Arc::clone(&executor))),
            defaults: Arc::new(Defaults::new(Arc::clone(&executor))),
            apps: Arc::new(MacApps::new(&home)),
            icons: Arc::new(FileIcon::new(Arc::clone(&executor))),
            trash: Arc::new(SystemTrash::for_home(
                &home,
                std::env::var_os("XDG_DATA_HOME"),
            )),
            paths,
            home,
            kind,
            log,
            executor,
        }
    }

    /// Managed symlink root.
    #[must_use]
    pub fn symlink_dir(&self) -> PathBuf {
        self.paths.symlink_dir()
    }

    /// Render `path` for display, with the home directory shown as `~`.
    #[must_use]
    pub fn display_path(&self, path: &Path) -> String {
        crate::config::collapse_user(path, &self.home)
    }
}

/// The user's home directory, from `HOME`.
///
/// # Errors
///
/// Returns an error if `HOME` is unset or empty.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|home| !home.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| anyhow::anyhow!("HOME environment variable is not set"))
}

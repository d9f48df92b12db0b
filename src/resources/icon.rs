//! Application lookup and custom icon bindings.
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use url::Url;

use crate::config::expand_user;
use crate::exec::Executor;

/// Finds installed application bundles by name.
pub trait AppLocator: Send + Sync + std::fmt::Debug {
    /// Bundle path for `name`, if the application is installed.
    fn path_for_app(&self, name: &str) -> Option<PathBuf>;
}

/// Sets and clears custom icons on application bundles.
pub trait IconSetter: Send + Sync + std::fmt::Debug {
    /// Apply the image at `icon` to the bundle at `app`.
    ///
    /// # Errors
    ///
    /// Returns an error if the icon cannot be applied.
    fn set_icon(&self, app: &Path, icon: &Path) -> Result<()>;

    /// Restore the bundle's own icon.
    ///
    /// # Errors
    ///
    /// Returns an error if the icon cannot be removed.
    fn remove_icon(&self, app: &Path) -> Result<()>;
}

/// [`AppLocator`] that searches the standard application folders.
#[derive(Debug, Clone)]
pub struct MacApps {
    search_dirs: Vec<PathBuf>,
}

impl MacApps {
    /// Search `/Applications`, `~/Applications` and `/System/Applications`.
    #[must_use]
    pub fn new(home: &Path) -> Self {
        Self::with_dirs(vec![
            PathBuf::from("/Applications"),
            home.join("Applications"),
            PathBuf::from("/System/Applications"),
        ])
    }

    /// Search exactly `dirs`, in order.
    #[must_use]
    pub const fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }
}

impl AppLocator for MacApps {
    fn path_for_app(&self, name: &str) -> Option<PathBuf> {
        let direct = Path::new(name);
        if direct.is_absolute() {
            return direct.is_dir().then(|| direct.to_path_buf());
        }
        let bundle = if Path::new(name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("app"))
        {
            name.to_string()
        } else {
            format!("{name}.app")
        };
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&bundle))
            .find(|candidate| candidate.is_dir())
    }
}

/// [`IconSetter`] backed by the `fileicon` command.
#[derive(Debug, Clone)]
pub struct FileIcon {
    executor: Arc<dyn Executor>,
}

impl FileIcon {
    /// Create a binding that runs `fileicon` through `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self { executor }
    }
}

impl IconSetter for FileIcon {
    fn set_icon(&self, app: &Path, icon: &Path) -> Result<()> {
        let app = app.to_string_lossy();
        let icon = icon.to_string_lossy();
        self.executor
            .run("fileicon", &["set", &app, &icon])
            .with_context(|| format!("setting icon of {app}"))?;
        Ok(())
    }

    fn remove_icon(&self, app: &Path) -> Result<()> {
        let app = app.to_string_lossy();
        self.executor
            .run("fileicon", &["rm", &app])
            .with_context(|| format!("removing icon of {app}"))?;
        Ok(())
    }
}

/// Where an icon image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSource {
    /// An image already on disk.
    Local(PathBuf),
    /// An image to download first.
    Remote(Url),
}

impl IconSource {
    /// Interpret a manifest icon value.
    ///
    /// Well-formed absolute URIs are remote, except `file://` URIs which map
    /// to their local path.  Anything else is a local path with `~`
    /// expanded.
    #[must_use]
    pub fn parse(raw: &str, home: &Path) -> Self {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_or_else(|()| Self::Local(expand_user(raw, home)), Self::Local),
            Ok(url) if url.has_host() => Self::Remote(url),
            _ => Self::Local(expand_user(raw, home)),
        }
    }
}

/// Download `url` into a fresh temporary directory.
///
/// The returned [`tempfile::TempDir`] owns the file; dropping it deletes the
/// download.
///
/// # Errors
///
/// Returns an error if the request fails or the body cannot be saved.
pub fn download(url: &Url) -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("creating download directory")?;
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("icon");
    let path = dir.path().join(name);

    let mut response = ureq::get(url.as_str())
        .call()
        .with_context(|| format!("downloading {url}"))?;
    let mut file =
        File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    io::copy(&mut response.body_mut().as_reader(), &mut file)
        .with_context(|| format!("saving {url}"))?;

    Ok((dir, path))
}

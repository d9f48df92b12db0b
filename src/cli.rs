use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI entry point for the bootstrap engine.
#[derive(Parser, Debug)]
#[command(
    name = "cider",
    about = "Declarative macOS environment bootstrap engine",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Operate on casks instead of formulas
    #[arg(long, global = true)]
    pub cask: bool,

    /// Override the tool directory (default: $CIDER_DIR or ~/.cider)
    #[arg(long, global = true)]
    pub dir: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Apply the whole bootstrap file to this machine
    Restore,
    /// Install packages and add them to the bootstrap file
    Install(InstallOpts),
    /// Uninstall packages and remove them from the bootstrap file
    Rm(NamesOpts),
    /// Add taps and record them
    Tap(NamesOpts),
    /// Remove taps and forget them
    Untap(NamesOpts),
    /// List bootstrapped packages
    Installed(InstalledOpts),
    /// List installed packages that are not bootstrapped
    Missing(MissingOpts),
    /// Recreate symlinks and remove stale ones
    Relink(ForceOpts),
    /// Write a preference and record it
    SetDefault(SetDefaultOpts),
    /// Delete a preference and forget it
    RemoveDefault(DefaultKeyOpts),
    /// Write every recorded preference
    ApplyDefaults,
    /// Run the before- and after-scripts
    RunScripts,
    /// Set a custom application icon and record it
    SetIcon(SetIconOpts),
    /// Restore an application's own icon and forget the custom one
    RemoveIcon(AppOpts),
    /// Apply every recorded icon
    ApplyIcons,
    /// Print version information
    Version,
}

impl Command {
    /// Name used for this command's log file.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Restore => "restore",
            Self::Install(_) => "install",
            Self::Rm(_) => "rm",
            Self::Tap(_) => "tap",
            Self::Untap(_) => "untap",
            Self::Installed(_) => "installed",
            Self::Missing(_) => "missing",
            Self::Relink(_) => "relink",
            Self::SetDefault(_) => "set-default",
            Self::RemoveDefault(_) => "remove-default",
            Self::ApplyDefaults => "apply-defaults",
            Self::RunScripts => "run-scripts",
            Self::SetIcon(_) => "set-icon",
            Self::RemoveIcon(_) => "remove-icon",
            Self::ApplyIcons => "apply-icons",
            Self::Version => "version",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InstallOpts {
    /// Packages to install
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Reinstall even if already installed
    #[arg(short, long)]
    pub force: bool,
}

/// One or more package or tap names.
#[derive(Args, Debug, Clone)]
pub struct NamesOpts {
    /// Names to act on
    #[arg(required = true)]
    pub names: Vec<String>,
}

/// Options for the `installed` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InstalledOpts {
    /// Only list names starting with this prefix
    pub prefix: Option<String>,
}

/// Options for the `missing` subcommand.
#[derive(Args, Debug, Clone)]
pub struct MissingOpts {
    /// Add every missing package to the bootstrap file
    #[arg(long)]
    pub add: bool,
}

/// A lone `--force` flag.
#[derive(Args, Debug, Clone)]
pub struct ForceOpts {
    /// Move anything in the way to the trash
    #[arg(short, long)]
    pub force: bool,
}

/// Options for the `set-default` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SetDefaultOpts {
    /// Preference domain, e.g. com.apple.dock
    pub domain: String,
    /// Preference key
    pub key: String,
    /// Value; YES/NO become booleans, JSON is parsed, anything else is a string
    pub value: String,
    /// Delete the existing key and retry if the write is rejected
    #[arg(short, long)]
    pub force: bool,
}

/// A preference domain and key.
#[derive(Args, Debug, Clone)]
pub struct DefaultKeyOpts {
    /// Preference domain
    pub domain: String,
    /// Preference key
    pub key: String,
}

/// Options for the `set-icon` subcommand.
#[derive(Args, Debug, Clone)]
pub struct SetIconOpts {
    /// Application name, e.g. iTerm
    pub app: String,
    /// Icon path or URL
    pub icon: String,
}

/// An application name.
#[derive(Args, Debug, Clone)]
pub struct AppOpts {
    /// Application name
    pub app: String,
}

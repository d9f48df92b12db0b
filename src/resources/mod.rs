//! Bindings to the live system: symlinks, the package manager, the
//! preference writer, application icons and the trash.
//!
//! Each binding either checks and applies a single idempotent resource
//! (symlinks) or wraps an external command behind a trait so tasks can be
//! tested against fakes.
pub mod defaults;
pub mod helpers;
pub mod icon;
pub mod package;
pub mod symlink;
pub mod trash;

/// State of a resource on disk.
///
/// # Examples
///
/// ```
/// use cider_cli::resources::ResourceState;
///
/// let missing = ResourceState::Missing;
/// let correct = ResourceState::Correct;
/// let wrong = ResourceState::Incorrect { current: "/other/path".into() };
///
/// assert_ne!(missing, correct);
/// assert_ne!(wrong, correct);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceState {
    /// Resource does not exist.
    Missing,
    /// Resource exists and matches the desired state.
    Correct,
    /// Something else occupies the resource's location.
    Incorrect {
        /// Description of what is there now.
        current: String,
    },
    /// Resource cannot be applied at all.
    Invalid {
        /// Reason why the resource cannot be applied.
        reason: String,
    },
}

impl ResourceState {
    /// Whether applying the resource would change anything.
    #[must_use]
    pub const fn needs_change(&self) -> bool {
        matches!(self, Self::Missing | Self::Incorrect { .. })
    }
}

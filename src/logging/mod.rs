//! Console and file logging built on `tracing`.
//!
//! Components report through the [`Log`] trait: free-form lines, one
//! [`Outcome`] per reconciled item, and one [`TaskEntry`] per phase.

mod logger;
mod memory;
mod subscriber;
mod types;
mod utils;

pub use logger::Logger;
pub use memory::{Level, MemoryLog};
pub use subscriber::init_subscriber;
pub use types::{Log, Outcome, TaskEntry, TaskStatus};

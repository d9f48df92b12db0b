//! Command: print version information.

/// Print the cider version to stdout.
pub fn run() {
    println!("cider {}", crate::VERSION);
}

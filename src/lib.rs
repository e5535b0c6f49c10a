// Library exports for testing and the `glyphd` binary.
//
// # Threading
//
// Font work happens on the worker thread owned by `glyphd_fonts::FontSystem`.
// The command-line front end only submits requests and waits on the deferred
// results, so it needs no async runtime of its own.

/// Application version (root crate version).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod debug;

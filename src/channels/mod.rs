//! User-facing channels.

pub mod repl;

pub use repl::ReplChannel;

//! Command line front end of the `devchain` library.
//!
//! Every sub-command connects a [`devchain::ChainSession`] from the shared connection flags and
//! prints its result to stdout.

mod cmd;
pub use cmd::*;

/// Shared argument groups and helpers
pub mod common;

/// `call` sub-command
pub mod call;
/// `info` sub-command
pub mod info;
/// `send` sub-command
pub mod send;

//! Shared plumbing for the `firebridge-export` and `firebridge-import`
//! binaries: argument parsing, config overrides and logging setup.

pub mod args;
pub mod commands;
pub mod logging;

//! Command-line interface definitions and helpers.

mod args;
mod commands;

pub use args::{Args, Command};
pub use commands::list_cameras;

//! Command-line interface

pub mod commands;
pub mod demo;

pub use commands::*;
pub use demo::cmd_demo;

//! Library side of the `metaform` command line tool

#![warn(unreachable_pub)]

pub mod commands;
pub mod config;

pub use commands::{ReadArgs, WriteArgs};
pub use config::CliConfig;

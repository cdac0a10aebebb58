//! `icl` - one-shot instrument control from the command line

pub mod cli;
pub mod commands;

pub use cli::{Args, Command};

//! Atelie command line library
//!
//! Argument parsing, engine initialization and subcommands, kept out of
//! `main` so they can be tested.

pub mod cli;
pub mod commands;
pub mod engine;

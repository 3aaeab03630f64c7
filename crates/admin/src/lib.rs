//! `cakung-admin`: command-line console for the Cakung Barat backend.
//!
//! The binary in `main.rs` only sets up logging and parses arguments; the
//! command handlers live here so they can be tested as a library.

pub mod cli;
pub mod commands;
pub mod files;

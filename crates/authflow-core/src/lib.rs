//! Core library for the simulated authentication flow shared by the CLI and TUI front-ends.

pub mod config;
pub mod flow;
pub mod provider;
pub mod session;

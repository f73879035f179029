//! Command-line entry point: argument parsing, telemetry setup, dispatch.

pub mod actions;
pub mod commands;
pub mod dispatch;
mod start;

pub use start::start;

#![forbid(unsafe_code)]

//! Scripted demo of scoped channel propagation.
//!
//! Mounts a small app of two deep trees under a `loading` channel, applies
//! a trigger script and reports which nodes recomputed for each trigger.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod inputs;
pub mod logging;
pub mod report;
pub mod runner;
pub mod script;

pub use cli::{run, run_from_env};
pub use error::{DemoError, Result};

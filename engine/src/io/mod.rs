//! I/O helpers for check execution.

pub mod executor;
pub mod process;
pub mod runner;
pub mod workdir;

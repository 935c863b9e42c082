//! Execution engine for scripted compliance checks.
//!
//! A check (an *autopilot*) is an ordered list of levels of shell-scripted
//! steps plus one evaluation script. The engine runs each step in an isolated
//! working directory, wires dependency outputs into dependent steps, parses
//! the evaluator's newline-delimited JSON protocol and derives a validated
//! RED/GREEN/YELLOW/ERROR verdict. The architecture enforces a strict
//! separation:
//!
//! - **[`core`]**: Pure, deterministic logic (output classification, result
//!   folding, verdict validation). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (filesystem, process execution).
//!   Isolated to enable scripted runners in tests.
//!
//! Orchestration modules ([`check`], [`finalize`], [`manual`]) coordinate
//! core logic with I/O to execute one check from start to verdict.

pub mod check;
pub mod core;
pub mod finalize;
pub mod io;
pub mod logging;
pub mod manual;
pub mod report;

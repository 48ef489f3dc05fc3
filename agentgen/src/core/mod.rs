//! Pure logic shared by the build pipeline.
//!
//! Core modules are free of I/O side effects: they derive names, command
//! lines, and result types deterministically so they can be tested in
//! isolation.

pub mod commands;
pub mod naming;
pub mod types;

//! Final assembly stage of the monitor generation toolchain.
//!
//! Takes the sources generated upstream (a monitor class, an aspect, and the
//! compiled `mop/` class tree) and packages them into a deployable agent jar
//! by running a compiler, a weaver, and an archiver in sequence. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure logic (artifact names, tool command lines, result types).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (processes, file copy, tree delete,
//!   staging workspace, config). Process execution sits behind a trait so
//!   tests can script the tools.
//!
//! [`build`] coordinates core logic with I/O to implement the pipeline.

pub mod build;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

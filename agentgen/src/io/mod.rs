//! Side-effecting helpers: processes, filesystem, configuration.

pub mod config;
pub mod fs_ops;
pub mod lock;
pub mod process;
pub mod staging;
pub mod tree_delete;

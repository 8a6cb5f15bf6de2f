//! Core primitives for statwatch
//!
//! This crate provides:
//! - Stat-time snapshots (atime/mtime/ctime)
//! - The `StatSource` abstraction over where those times come from
//! - Filesystem and in-memory sources

pub mod stat;

// Re-exports
pub use stat::{FsStat, MemoryStat, StatSource, StatTimes};

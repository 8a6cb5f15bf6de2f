//! Stat-polling file watcher for statwatch
//!
//! This crate provides:
//! - Per-path change detection from cached stat times
//! - A polling reactor that checks attached entries on each tick
//! - A watch set manager with runtime re-binding of the watched paths
//! - Cooperative shutdown through a cancellation token
//!
//! ```no_run
//! use statwatch::{WatchEvent, WatchSet, Watcher};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() -> statwatch::Result<()> {
//! let observer = |event: &WatchEvent, _watch: &mut WatchSet| -> anyhow::Result<()> {
//!     println!("{} {}", event.kind, event.path.display());
//!     Ok(())
//! };
//!
//! let cancel = CancellationToken::new();
//! let mut watcher = Watcher::new(observer);
//! watcher.listen(["Cargo.toml"], &cancel).await
//! # }
//! ```

pub mod config;
pub mod entry;
pub mod error;
pub mod event;
pub mod manager;
pub mod reactor;

// Re-exports
pub use config::WatchConfig;
pub use entry::{Notice, Notifier, WatchEntry};
pub use error::{Result, WatchError};
pub use event::{EventKind, WatchEvent};
pub use manager::{ManagerState, Observer, WatchSet, Watcher};
pub use reactor::{PollReactor, PollStats, WatchId};
pub use statwatch_core::{FsStat, MemoryStat, StatSource, StatTimes};

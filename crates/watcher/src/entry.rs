//! Per-path change detector
//!
//! A [`WatchEntry`] caches the stat times of one path and, when asked to
//! [`check`](WatchEntry::check), compares the live modification time against
//! the cached one. A strictly newer mtime is a change; anything else (equal,
//! or older after a clock jump or a restored backup) is not.

use crate::error::{Result, WatchError};
use crate::event::WatchEvent;
use statwatch_core::{StatSource, StatTimes};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc;
use tracing::debug;

/// A change notification tagged with the watch-set generation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub generation: u64,
    pub event: WatchEvent,
}

/// Handle an entry uses to report changes back to its owner
///
/// Every entry receives one at construction. Sending never blocks; the
/// owner drains the queue after each poll.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notice>,
    generation: u64,
}

impl Notifier {
    /// Create a notifier and the receiving end of its queue
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx, generation: 0 }, rx)
    }

    /// Same queue, different generation tag
    pub(crate) fn with_generation(&self, generation: u64) -> Self {
        Self {
            tx: self.tx.clone(),
            generation,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report an event
    ///
    /// Fails with [`WatchError::ObserverDetached`] when the receiving end is
    /// gone; there is nobody left to tell and the caller must stop.
    pub fn notify(&self, event: WatchEvent) -> Result<()> {
        let path = event.path.clone();
        self.tx
            .send(Notice {
                generation: self.generation,
                event,
            })
            .map_err(|_| WatchError::ObserverDetached { path })
    }
}

/// Watched path plus its last observed stat times
pub struct WatchEntry {
    path: PathBuf,
    last: StatTimes,
    stat: Arc<dyn StatSource>,
    notifier: Notifier,
}

impl WatchEntry {
    /// Stat `path` and cache its times
    ///
    /// A missing or unreadable path is reported as
    /// [`WatchError::PathUnavailable`] with the underlying I/O error.
    pub fn new(
        path: impl Into<PathBuf>,
        stat: Arc<dyn StatSource>,
        notifier: Notifier,
    ) -> Result<Self> {
        let path = path.into();
        let last = match stat.stat(&path) {
            Ok(times) => times,
            Err(source) => return Err(WatchError::PathUnavailable { path, source }),
        };

        Ok(Self {
            path,
            last,
            stat,
            notifier,
        })
    }

    /// Compare the live mtime against the cached one
    ///
    /// Returns `Ok(true)` when a change was detected and reported. On a
    /// change all three cached times are refreshed from a new stat before
    /// the notifier is called.
    pub fn check(&mut self) -> Result<bool> {
        let modified = self.stat.modified(&self.path).map_err(|source| WatchError::Stat {
            path: self.path.clone(),
            source,
        })?;

        if modified <= self.last.modified {
            return Ok(false);
        }

        self.last = self.stat.stat(&self.path).map_err(|source| WatchError::Stat {
            path: self.path.clone(),
            source,
        })?;
        debug!("Change detected: {}", self.path.display());

        self.notifier.notify(WatchEvent::changed(self.path.clone()))?;
        Ok(true)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached stat times
    pub fn times(&self) -> StatTimes {
        self.last
    }

    pub fn last_accessed(&self) -> SystemTime {
        self.last.accessed
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last.modified
    }

    pub fn last_changed(&self) -> SystemTime {
        self.last.changed
    }
}

impl fmt::Debug for WatchEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchEntry")
            .field("path", &self.path)
            .field("last", &self.last)
            .field("generation", &self.notifier.generation)
            .finish()
    }
}

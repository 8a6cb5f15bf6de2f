//! Stat-time primitives
//!
//! A [`StatSource`] answers "when was this path last accessed, modified and
//! changed". [`FsStat`] reads real filesystem metadata; [`MemoryStat`] keeps
//! the answers in memory so callers can drive the clock themselves.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Access/modify/change timestamps of a single path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatTimes {
    /// Last access time (atime)
    pub accessed: SystemTime,
    /// Last content modification time (mtime)
    pub modified: SystemTime,
    /// Last inode change time (ctime)
    pub changed: SystemTime,
}

impl StatTimes {
    /// All three timestamps set to the same instant
    pub fn uniform(at: SystemTime) -> Self {
        Self {
            accessed: at,
            modified: at,
            changed: at,
        }
    }

    /// Read the timestamps out of already-fetched metadata
    pub fn from_metadata(meta: &fs::Metadata) -> io::Result<Self> {
        let modified = meta.modified()?;
        let accessed = meta.accessed().unwrap_or(modified);

        Ok(Self {
            accessed,
            modified,
            changed: change_time(meta, modified),
        })
    }
}

#[cfg(unix)]
fn change_time(meta: &fs::Metadata, modified: SystemTime) -> SystemTime {
    use std::os::unix::fs::MetadataExt;
    from_unix(meta.ctime(), meta.ctime_nsec()).unwrap_or(modified)
}

#[cfg(not(unix))]
fn change_time(meta: &fs::Metadata, modified: SystemTime) -> SystemTime {
    // No ctime outside unix; creation time is the closest stand-in
    meta.created().unwrap_or(modified)
}

#[cfg(unix)]
/// `None` when the timestamp does not fit in a `SystemTime`
fn from_unix(secs: i64, nsecs: i64) -> Option<SystemTime> {
    use std::time::{Duration, UNIX_EPOCH};

    let nanos = Duration::from_nanos(nsecs.clamp(0, 999_999_999) as u64);
    let whole = Duration::from_secs(secs.unsigned_abs());
    let base = if secs >= 0 {
        UNIX_EPOCH.checked_add(whole)?
    } else {
        UNIX_EPOCH.checked_sub(whole)?
    };
    base.checked_add(nanos)
}

/// Source of stat times for paths
///
/// Errors are passed through untouched so callers can report the
/// underlying cause (missing file, permission denied, ...).
pub trait StatSource: Send + Sync {
    /// Fetch all three timestamps for `path`
    fn stat(&self, path: &Path) -> io::Result<StatTimes>;

    /// Fetch only the modification time for `path`
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        Ok(self.stat(path)?.modified)
    }
}

/// Real filesystem metadata (follows symlinks)
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStat;

impl StatSource for FsStat {
    fn stat(&self, path: &Path) -> io::Result<StatTimes> {
        StatTimes::from_metadata(&fs::metadata(path)?)
    }

    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }
}

/// In-memory stat table
///
/// Paths that were never inserted (or were removed) report `NotFound`,
/// matching what the filesystem does for a missing file.
#[derive(Debug, Default)]
pub struct MemoryStat {
    entries: Mutex<HashMap<PathBuf, StatTimes>>,
}

impl MemoryStat {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the timestamps of a path
    pub fn insert(&self, path: impl Into<PathBuf>, times: StatTimes) {
        self.entries.lock().insert(path.into(), times);
    }

    /// Simulate a content write at `at`
    ///
    /// Bumps mtime and ctime together, like a real write would. Inserts the
    /// path if it is not present yet.
    pub fn touch(&self, path: impl Into<PathBuf>, at: SystemTime) {
        let mut entries = self.entries.lock();
        let times = entries
            .entry(path.into())
            .or_insert_with(|| StatTimes::uniform(at));
        times.modified = at;
        times.changed = at;
    }

    /// Forget a path, as if the file was deleted
    pub fn remove(&self, path: &Path) -> Option<StatTimes> {
        self.entries.lock().remove(path)
    }

    /// Number of known paths
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no path is known
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StatSource for MemoryStat {
    fn stat(&self, path: &Path) -> io::Result<StatTimes> {
        self.entries.lock().get(path).copied().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }
}

//! Polling reactor
//!
//! Owns the attached watch entries and checks each of them once per
//! [`poll`](PollReactor::poll). Timing is the caller's concern; the
//! manager drives `poll` from a tokio interval.

use crate::entry::WatchEntry;
use crate::error::Result;
use tracing::{debug, warn};

/// Handle for an attached entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchId(u64);

/// Outcome of a single poll pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PollStats {
    /// Entries checked
    pub checked: usize,
    /// Entries that reported a change
    pub changed: usize,
    /// Entries whose stat failed this pass
    pub failed: usize,
}

#[derive(Debug)]
struct Slot {
    id: WatchId,
    entry: WatchEntry,
    /// Last check failed to stat; suppresses repeated warnings
    failing: bool,
}

/// Attached entries in attach order
#[derive(Debug, Default)]
pub struct PollReactor {
    slots: Vec<Slot>,
    next_id: u64,
}

impl PollReactor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an entry; it is checked from the next poll on
    pub fn attach(&mut self, entry: WatchEntry) -> WatchId {
        let id = WatchId(self.next_id);
        self.next_id += 1;

        debug!("Attached {} ({:?})", entry.path().display(), id);
        self.slots.push(Slot {
            id,
            entry,
            failing: false,
        });
        id
    }

    /// Detach a single entry
    pub fn detach(&mut self, id: WatchId) -> Option<WatchEntry> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        let slot = self.slots.remove(index);
        debug!("Detached {} ({:?})", slot.entry.path().display(), id);
        Some(slot.entry)
    }

    /// Detach every entry, returning them in attach order
    pub fn detach_all(&mut self) -> Vec<WatchEntry> {
        if !self.slots.is_empty() {
            debug!("Detaching {} entries", self.slots.len());
        }
        self.slots.drain(..).map(|slot| slot.entry).collect()
    }

    /// Currently attached entries
    pub fn watchers(&self) -> impl Iterator<Item = &WatchEntry> {
        self.slots.iter().map(|slot| &slot.entry)
    }

    /// Ids of currently attached entries
    pub fn ids(&self) -> impl Iterator<Item = WatchId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub fn get(&self, id: WatchId) -> Option<&WatchEntry> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| &slot.entry)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Check every attached entry once
    ///
    /// Stat failures are logged and counted; the entry stays attached so a
    /// re-created file is picked up again. Any other error is fatal and is
    /// returned immediately.
    pub fn poll(&mut self) -> Result<PollStats> {
        let mut stats = PollStats::default();

        for slot in &mut self.slots {
            stats.checked += 1;
            match slot.entry.check() {
                Ok(changed) => {
                    if slot.failing {
                        debug!("Path available again: {}", slot.entry.path().display());
                        slot.failing = false;
                    }
                    if changed {
                        stats.changed += 1;
                    }
                }
                Err(e) if !e.is_fatal() => {
                    stats.failed += 1;
                    if !slot.failing {
                        warn!("Check failed: {}", e);
                        slot.failing = true;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Ok(stats)
    }
}

//! Watch set manager
//!
//! [`Watcher`] owns the active [`WatchSet`], drives its [`PollReactor`] from
//! a tokio interval and hands every detected change to a single
//! [`Observer`]. Everything runs on the task that awaits [`Watcher::run`]:
//! the reactor checks all entries, the queued notices are then dispatched
//! one by one, so an observer may [`refresh`](WatchSet::refresh) the set
//! from inside `notify` without touching a collection that is being walked.

use crate::config::WatchConfig;
use crate::entry::{Notice, Notifier, WatchEntry};
use crate::error::{Result, WatchError};
use crate::event::WatchEvent;
use crate::reactor::{PollReactor, PollStats};
use statwatch_core::{FsStat, StatSource};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Receiver of change events
///
/// Closures with the signature of [`Observer::notify`] implement this
/// trait directly.
pub trait Observer {
    /// Called once per detected change, on the watch loop
    ///
    /// `watch` is the live watch set; refreshing it here takes effect
    /// before the next poll. Errors are logged and do not stop the loop.
    fn notify(&mut self, event: &WatchEvent, watch: &mut WatchSet) -> anyhow::Result<()>;

    /// Called each time the loop starts, after all entries are attached
    fn on_listen(&mut self, _watch: &WatchSet) {}
}

impl<F> Observer for F
where
    F: FnMut(&WatchEvent, &mut WatchSet) -> anyhow::Result<()>,
{
    fn notify(&mut self, event: &WatchEvent, watch: &mut WatchSet) -> anyhow::Result<()> {
        self(event, watch)
    }
}

/// Lifecycle of a watch set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerState {
    /// Constructed, or stopped after listening
    Idle,
    /// Entries attached, loop running
    Listening,
}

/// Monitored paths and the reactor their entries are attached to
pub struct WatchSet {
    state: ManagerState,
    paths: Vec<PathBuf>,
    reactor: PollReactor,
    stat: Arc<dyn StatSource>,
    notifier: Notifier,
    /// Bumped on every (re)build; notices from older generations are stale
    generation: u64,
}

impl WatchSet {
    fn new(stat: Arc<dyn StatSource>, notifier: Notifier) -> Self {
        Self {
            state: ManagerState::Idle,
            paths: Vec::new(),
            reactor: PollReactor::new(),
            stat,
            notifier,
            generation: 0,
        }
    }

    pub fn state(&self) -> ManagerState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == ManagerState::Listening
    }

    /// Monitored paths, deduplicated, in the order given
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Attached entries
    pub fn watchers(&self) -> impl Iterator<Item = &WatchEntry> {
        self.reactor.watchers()
    }

    pub fn len(&self) -> usize {
        self.reactor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactor.is_empty()
    }

    /// Rebind the watch set to `paths`
    ///
    /// Every current entry is detached and discarded, then one fresh entry
    /// per path is attached. The new entries are built first: if any path is
    /// unavailable the error is returned and the current set stays in place.
    pub fn refresh<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        if !self.is_listening() {
            return Err(WatchError::NotListening);
        }

        let paths = dedup(paths);
        let generation = self.generation + 1;
        let entries = self.build(&paths, generation)?;

        self.reactor.detach_all();
        self.install(paths, entries, generation);
        info!("Refreshed watch set ({} paths)", self.paths.len());
        Ok(())
    }

    fn start<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        if self.is_listening() {
            return Err(WatchError::AlreadyListening);
        }

        let paths = dedup(paths);
        let generation = self.generation + 1;
        let entries = self.build(&paths, generation)?;

        self.install(paths, entries, generation);
        self.state = ManagerState::Listening;
        Ok(())
    }

    fn stop(&mut self) {
        self.reactor.detach_all();
        self.state = ManagerState::Idle;
    }

    fn build(&self, paths: &[PathBuf], generation: u64) -> Result<Vec<WatchEntry>> {
        let notifier = self.notifier.with_generation(generation);
        paths
            .iter()
            .map(|path| WatchEntry::new(path.clone(), self.stat.clone(), notifier.clone()))
            .collect()
    }

    fn install(&mut self, paths: Vec<PathBuf>, entries: Vec<WatchEntry>, generation: u64) {
        for entry in entries {
            self.reactor.attach(entry);
        }
        self.paths = paths;
        self.generation = generation;
    }
}

/// Collapse repeated paths to their first occurrence
fn dedup<I, P>(paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: Into<PathBuf>,
{
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .map(Into::into)
        .filter(|path: &PathBuf| seen.insert(path.clone()))
        .collect()
}

/// Watch set manager bound to one observer
pub struct Watcher<O> {
    set: WatchSet,
    observer: O,
    notices: mpsc::UnboundedReceiver<Notice>,
    config: WatchConfig,
}

impl<O: Observer> Watcher<O> {
    /// Watch the real filesystem with the default configuration
    pub fn new(observer: O) -> Self {
        let (notifier, notices) = Notifier::channel();
        Self {
            set: WatchSet::new(Arc::new(FsStat), notifier),
            observer,
            notices,
            config: WatchConfig::default(),
        }
    }

    pub fn with_config(mut self, config: WatchConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace where stat times come from
    ///
    /// Entries built after this call use the new source.
    pub fn with_stat_source(mut self, stat: Arc<dyn StatSource>) -> Self {
        self.set.stat = stat;
        self
    }

    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    pub fn state(&self) -> ManagerState {
        self.set.state
    }

    pub fn watch_set(&self) -> &WatchSet {
        &self.set
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    pub fn into_observer(self) -> O {
        self.observer
    }

    /// Attach `paths` and enter the watch loop
    ///
    /// Returns once `cancel` fires, with every entry detached. Fails early
    /// if a path is unavailable or the configuration is invalid.
    pub async fn listen<I, P>(&mut self, paths: I, cancel: &CancellationToken) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.start(paths)?;
        self.run(cancel).await
    }

    /// Attach `paths` without entering the loop
    pub fn start<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.config.validate()?;
        self.set.start(paths)
    }

    /// Run the watch loop until `cancel` fires or a fatal error occurs
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        if !self.set.is_listening() {
            return Err(WatchError::NotListening);
        }

        let mut ticker = interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "Listening on {} paths (interval: {:?})",
            self.set.len(),
            self.config.poll_interval()
        );
        self.observer.on_listen(&self.set);

        let result = loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break Ok(()),
                _ = ticker.tick() => {
                    if let Err(e) = self.poll_now() {
                        break Err(e);
                    }
                }
            }
        };

        self.set.stop();
        while self.notices.try_recv().is_ok() {}

        match &result {
            Ok(()) => info!("Stopped listening"),
            Err(e) => warn!("Watch loop aborted: {}", e),
        }
        result
    }

    /// Rebind the watch set; see [`WatchSet::refresh`]
    pub fn refresh<I, P>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.set.refresh(paths)
    }

    /// Check every entry once and dispatch what they reported
    pub fn poll_now(&mut self) -> Result<PollStats> {
        let stats = self.set.reactor.poll()?;
        self.dispatch_pending();
        Ok(stats)
    }

    /// Hand one event to the observer
    pub fn notify(&mut self, event: &WatchEvent) {
        if let Err(e) = self.observer.notify(event, &mut self.set) {
            warn!("Observer failed for {}: {:#}", event.path.display(), e);
        }
    }

    fn dispatch_pending(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(notice) = self.notices.try_recv() {
            if notice.generation != self.set.generation {
                debug!("Dropping stale event for {}", notice.event.path.display());
                continue;
            }
            self.notify(&notice.event);
            dispatched += 1;
        }
        dispatched
    }
}

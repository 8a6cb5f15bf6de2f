//! Watch paths and report changes

use crate::system_config::SystemConfig;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use statwatch::{EventKind, Observer, WatchEvent, WatchSet, Watcher};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Options for a single `watch` run
#[derive(Debug, Clone, Default)]
pub struct WatchArgs {
    pub paths: Vec<PathBuf>,
    pub exec: Option<String>,
    pub paths_from: Option<PathBuf>,
    pub interval_ms: Option<u64>,
    pub json: bool,
}

pub async fn run(args: WatchArgs, config: SystemConfig) -> Result<()> {
    let mut watch_config = config.watch.clone();
    if let Some(interval_ms) = args.interval_ms {
        watch_config.poll_interval_ms = interval_ms;
    }
    watch_config
        .validate()
        .context("Invalid watch configuration")?;

    let observer = ConsoleObserver {
        json: args.json || config.output.json,
        color: config.output.color,
        exec: args.exec,
        paths_from: args.paths_from,
        base_paths: args.paths,
        changes: 0,
    };

    let paths = observer.watch_list()?;
    if paths.is_empty() {
        anyhow::bail!("Nothing to watch: pass at least one path or --paths-from");
    }

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping");
            signal_token.cancel();
        }
    });

    let mut watcher = Watcher::new(observer).with_config(watch_config);
    watcher
        .listen(paths, &cancel)
        .await
        .context("Failed to watch paths")?;

    let observer = watcher.into_observer();
    if !observer.json {
        println!("Stopped after {} change(s)", observer.changes);
    }
    Ok(())
}

/// Prints events and runs the optional `--exec` hook
struct ConsoleObserver {
    json: bool,
    color: bool,
    exec: Option<String>,
    paths_from: Option<PathBuf>,
    /// Paths given on the command line
    base_paths: Vec<PathBuf>,
    changes: u64,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    event: EventKind,
    path: &'a Path,
    at: String,
}

impl ConsoleObserver {
    /// Command-line paths, then the list file entries, then the list file itself
    fn watch_list(&self) -> Result<Vec<PathBuf>> {
        let mut paths = self.base_paths.clone();
        if let Some(list) = &self.paths_from {
            paths.extend(util::read_path_list(list)?);
            paths.push(list.clone());
        }
        Ok(paths)
    }

    fn is_list_file(&self, path: &Path) -> bool {
        self.paths_from.as_deref() == Some(path)
    }

    fn print(&self, event: &WatchEvent) -> Result<()> {
        let now = chrono::Local::now();

        if self.json {
            let line = JsonLine {
                event: event.kind,
                path: &event.path,
                at: now.to_rfc3339(),
            };
            println!("{}", serde_json::to_string(&line)?);
        } else if self.color {
            println!(
                "{} {} {}",
                now.format("%H:%M:%S").dimmed(),
                event.kind.yellow(),
                event.path.display()
            );
        } else {
            println!(
                "{} {} {}",
                now.format("%H:%M:%S"),
                event.kind,
                event.path.display()
            );
        }
        Ok(())
    }

    /// Start `command` for a changed path
    ///
    /// The child is awaited on its own task so a slow hook neither stalls
    /// polling nor delays Ctrl-C.
    fn exec(&self, command: &str, path: &Path) -> Result<()> {
        let mut child = tokio::process::Command::from(util::shell_command(command))
            .env("STATWATCH_PATH", path)
            .spawn()
            .with_context(|| format!("Failed to run '{}'", command))?;

        let command = command.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    warn!("'{}' exited with {}", command, status)
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to wait for '{}': {}", command, e),
            }
        });
        Ok(())
    }
}

impl Observer for ConsoleObserver {
    fn notify(&mut self, event: &WatchEvent, watch: &mut WatchSet) -> Result<()> {
        self.changes += 1;
        self.print(event)?;

        if self.is_list_file(&event.path) {
            let paths = self.watch_list()?;
            watch
                .refresh(paths)
                .context("Failed to reload watch list")?;
            info!("Watch list reloaded ({} paths)", watch.len());
            return Ok(());
        }

        if let Some(command) = &self.exec {
            self.exec(command, &event.path)?;
        }
        Ok(())
    }

    fn on_listen(&mut self, watch: &WatchSet) {
        if !self.json {
            let label = format!("Watching {} path(s)", watch.len());
            if self.color {
                println!("{}", label.bold());
            } else {
                println!("{}", label);
            }
        }
    }
}

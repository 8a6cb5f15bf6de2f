//! Integration tests for the statwatch binary

mod common;

use common::SwCommand;
use filetime::{set_file_mtime, FileTime};
use std::fs;
use std::io::{BufRead, BufReader};
use std::process::Child;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

fn stdout_lines(child: &mut Child) -> mpsc::Receiver<String> {
    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Wait for a line matching `pred`, skipping others
fn wait_for_line(rx: &mpsc::Receiver<String>, pred: impl Fn(&str) -> bool) -> Option<String> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while let Some(left) = deadline.checked_duration_since(Instant::now()) {
        match rx.recv_timeout(left) {
            Ok(line) if pred(&line) => return Some(line),
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    None
}

fn plain_config(cmd: &SwCommand) {
    fs::write(
        cmd.config_file(),
        "[watch]\npoll_interval_ms = 20\n\n[output]\ncolor = false\n",
    )
    .unwrap();
}

#[test]
fn test_config_example_prints_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let result = SwCommand::new(temp_dir.path())
        .args(&["config", "example"])
        .assert_success()
        .unwrap();

    assert!(result.contains_stdout("poll_interval_ms = 1000"));
    assert!(result.contains_stdout("[output]"));
}

#[test]
fn test_config_set_then_get() {
    let temp_dir = TempDir::new().unwrap();

    SwCommand::new(temp_dir.path())
        .args(&["config", "set", "watch.poll_interval_ms", "250"])
        .assert_success()
        .unwrap();

    let result = SwCommand::new(temp_dir.path())
        .args(&["config", "get", "watch.poll_interval_ms"])
        .assert_success()
        .unwrap();
    assert_eq!(result.stdout.trim(), "250");
}

#[test]
fn test_config_set_rejects_out_of_range() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = SwCommand::new(temp_dir.path());
    let result = cmd
        .args(&["config", "set", "watch.poll_interval_ms", "1"])
        .assert_failure()
        .unwrap();

    assert!(result.contains_stderr("Invalid configuration value"));
    assert!(!cmd.config_file().exists());
}

#[test]
fn test_watch_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = SwCommand::new(temp_dir.path());
    plain_config(&cmd);

    let result = cmd
        .args(&["watch", "does-not-exist.txt"])
        .assert_failure()
        .unwrap();

    assert!(result.contains_stderr("Path unavailable"));
}

#[test]
fn test_watch_without_paths_fails() {
    let temp_dir = TempDir::new().unwrap();
    let mut cmd = SwCommand::new(temp_dir.path());
    plain_config(&cmd);

    let result = cmd.args(&["watch"]).assert_failure().unwrap();
    assert!(result.contains_stderr("Nothing to watch"));
}

#[test]
fn test_watch_reports_modification() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("notes.txt");
    fs::write(&file, b"v1").unwrap();
    let t0 = SystemTime::now() - Duration::from_secs(600);
    set_file_mtime(&file, FileTime::from_system_time(t0)).unwrap();

    let mut cmd = SwCommand::new(temp_dir.path());
    plain_config(&cmd);
    let mut child = cmd.args(&["watch", "notes.txt"]).spawn().unwrap();
    let rx = stdout_lines(&mut child);

    let started = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(started.contains("Watching 1 path(s)"), "{started}");

    set_file_mtime(&file, FileTime::from_system_time(t0 + Duration::from_secs(10))).unwrap();
    let changed = rx.recv_timeout(Duration::from_secs(10));

    child.kill().unwrap();
    child.wait().unwrap();

    let changed = changed.unwrap();
    assert!(changed.contains("changed"), "{changed}");
    assert!(changed.ends_with("notes.txt"), "{changed}");
}

#[test]
fn test_watch_reloads_paths_from_list() {
    let temp_dir = TempDir::new().unwrap();
    let t0 = SystemTime::now() - Duration::from_secs(600);
    let list = temp_dir.path().join("list");
    let a = temp_dir.path().join("a.txt");
    let b = temp_dir.path().join("b.txt");
    fs::write(&list, "a.txt\n").unwrap();
    fs::write(&a, b"a").unwrap();
    fs::write(&b, b"b").unwrap();
    for path in [&list, &a, &b] {
        set_file_mtime(path, FileTime::from_system_time(t0)).unwrap();
    }

    let mut cmd = SwCommand::new(temp_dir.path());
    plain_config(&cmd);
    let mut child = cmd.args(&["watch", "--paths-from", "list"]).spawn().unwrap();
    let rx = stdout_lines(&mut child);

    let started = wait_for_line(&rx, |l| l.contains("Watching"));

    // Add b.txt to the list; the list file itself is watched
    let staged = temp_dir.path().join("list.new");
    fs::write(&staged, "a.txt\nb.txt\n").unwrap();
    set_file_mtime(&staged, FileTime::from_system_time(t0 + Duration::from_secs(10))).unwrap();
    fs::rename(&staged, &list).unwrap();
    let reloaded = wait_for_line(&rx, |l| l.contains("changed") && l.ends_with("list"));

    set_file_mtime(&b, FileTime::from_system_time(t0 + Duration::from_secs(20))).unwrap();
    let changed_b = wait_for_line(&rx, |l| l.contains("changed") && l.ends_with("b.txt"));

    child.kill().unwrap();
    child.wait().unwrap();

    assert!(started.unwrap().contains("Watching 2 path(s)"));
    assert!(reloaded.is_some(), "list change not reported");
    assert!(changed_b.is_some(), "b.txt not watched after reload");
}

#[test]
fn test_watch_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("notes.txt");
    fs::write(&file, b"v1").unwrap();
    let t0 = SystemTime::now() - Duration::from_secs(600);
    set_file_mtime(&file, FileTime::from_system_time(t0)).unwrap();

    let mut cmd = SwCommand::new(temp_dir.path());
    plain_config(&cmd);
    let mut child = cmd.args(&["watch", "--json", "notes.txt"]).spawn().unwrap();
    let rx = stdout_lines(&mut child);

    // JSON mode prints no banner, so keep bumping until the watcher reports
    let mut line = None;
    for step in 1..=40u64 {
        let at = t0 + Duration::from_secs(10 * step);
        set_file_mtime(&file, FileTime::from_system_time(at)).unwrap();
        if let Ok(l) = rx.recv_timeout(Duration::from_millis(250)) {
            line = Some(l);
            break;
        }
    }

    child.kill().unwrap();
    child.wait().unwrap();

    let line = line.expect("no JSON event printed");
    let value: serde_json::Value = serde_json::from_str(&line).unwrap();
    assert_eq!(value["event"], "changed");
    assert!(value["path"].as_str().unwrap().ends_with("notes.txt"));
    assert!(chrono::DateTime::parse_from_rfc3339(value["at"].as_str().unwrap()).is_ok());
}

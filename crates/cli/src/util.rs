//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Read a watch list: one path per line
///
/// Blank lines and lines starting with `#` are skipped. Relative entries
/// are resolved against the directory containing the list file.
pub fn read_path_list(list: &Path) -> Result<Vec<PathBuf>> {
    let contents = fs::read_to_string(list)
        .with_context(|| format!("Failed to read watch list {}", list.display()))?;
    let base = list.parent().unwrap_or_else(|| Path::new(""));

    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let path = Path::new(line);
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                base.join(path)
            }
        })
        .collect())
}

/// Shell invocation for `--exec` commands
pub fn shell_command(command: &str) -> std::process::Command {
    #[cfg(windows)]
    {
        let mut cmd = std::process::Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = std::process::Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[cfg(unix)]
    #[test]
    fn test_read_path_list_skips_comments_and_blanks() {
        let temp_dir = TempDir::new().unwrap();
        let list = temp_dir.path().join("watch.list");
        fs::write(&list, "# sources\nsrc/main.rs\n\n  README.md  \n/etc/hosts\n").unwrap();

        let paths = read_path_list(&list).unwrap();
        assert_eq!(
            paths,
            vec![
                temp_dir.path().join("src/main.rs"),
                temp_dir.path().join("README.md"),
                PathBuf::from("/etc/hosts"),
            ]
        );
    }

    #[test]
    fn test_read_path_list_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_path_list(&temp_dir.path().join("nope")).unwrap_err();
        assert!(err.to_string().contains("Failed to read watch list"));
    }
}

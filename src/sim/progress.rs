/// Unlock progression: persisted threshold of reachable levels.
///
/// ## File format:
///   Key-value lines, one key:
///   ```
///   unlocked=1
///   ```
///   Unknown keys are ignored. A missing or unreadable file means only
///   the first level (ordinal 0) is reachable.
///
/// Stored as `progress.dat` in the save directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::domain::unlock::Progression;
use crate::error::AppError;

const PROGRESS_FILE: &str = "progress.dat";

#[derive(Clone, Debug)]
pub struct ProgressFile {
    path: PathBuf,
    unlocked: usize,
}

// ══════════════════════════════════════════════════════════════
// Paths
// ══════════════════════════════════════════════════════════════

/// Where progress and logs live.
pub fn save_dir() -> PathBuf {
    // 1. Exe directory, when writable (portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            let test_path = parent.join(".write_test_spacenauts");
            if std::fs::write(&test_path, "").is_ok() {
                let _ = std::fs::remove_file(&test_path);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home (~/.local/share/spacenauts)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/spacenauts");
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

// ══════════════════════════════════════════════════════════════
// Load / save
// ══════════════════════════════════════════════════════════════

impl ProgressFile {
    /// Open `progress.dat` in the default save directory.
    pub fn open_default() -> Self {
        Self::open(save_dir().join(PROGRESS_FILE))
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let unlocked = read_unlocked(&path);
        debug!(path = %path.display(), unlocked, "progress loaded");
        ProgressFile { path, unlocked }
    }

    /// Re-read from disk; another process may have advanced it.
    pub fn reload(&mut self) {
        self.unlocked = read_unlocked(&self.path);
    }

    /// Raise the threshold to `ordinal` (never lowers it) and save.
    pub fn unlock(&mut self, ordinal: usize) -> Result<(), AppError> {
        if ordinal <= self.unlocked {
            return Ok(());
        }
        std::fs::write(&self.path, serialize(ordinal)).map_err(|source| AppError::SaveProgress {
            path: self.path.clone(),
            source,
        })?;
        self.unlocked = ordinal;
        Ok(())
    }
}

impl Progression for ProgressFile {
    fn highest_unlocked_ordinal(&self) -> usize {
        self.unlocked
    }
}

fn read_unlocked(path: &Path) -> usize {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_progress(&content).unwrap_or_else(|| {
            warn!(path = %path.display(), "progress file unreadable, starting from first level");
            0
        }),
        Err(_) => 0,
    }
}

fn serialize(unlocked: usize) -> String {
    format!("unlocked={}\n", unlocked)
}

fn parse_progress(content: &str) -> Option<usize> {
    content
        .lines()
        .find_map(|line| line.trim().strip_prefix("unlocked="))
        .and_then(|val| val.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_means_first_level_only() {
        let dir = tempfile::tempdir().unwrap();
        let p = ProgressFile::open(dir.path().join("progress.dat"));
        assert_eq!(p.highest_unlocked_ordinal(), 0);
    }

    #[test]
    fn unlock_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        let mut p = ProgressFile::open(&path);
        p.unlock(2).unwrap();

        let again = ProgressFile::open(&path);
        assert_eq!(again.highest_unlocked_ordinal(), 2);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "unlocked=2\n");
    }

    #[test]
    fn unlock_never_lowers() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = ProgressFile::open(dir.path().join("progress.dat"));
        p.unlock(3).unwrap();
        p.unlock(1).unwrap();
        assert_eq!(p.highest_unlocked_ordinal(), 3);
    }

    #[test]
    fn reload_sees_external_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        let mut p = ProgressFile::open(&path);
        std::fs::write(&path, "# written elsewhere\nunlocked=1\n").unwrap();
        p.reload();
        assert_eq!(p.highest_unlocked_ordinal(), 1);
    }

    #[test]
    fn garbage_falls_back_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.dat");
        std::fs::write(&path, "unlocked=lots\n").unwrap();
        assert_eq!(ProgressFile::open(&path).highest_unlocked_ordinal(), 0);
    }

    #[test]
    fn failed_save_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be written as a file.
        let mut p = ProgressFile::open(dir.path());
        let err = p.unlock(1).unwrap_err();
        assert!(matches!(err, AppError::SaveProgress { .. }));
    }

    #[test]
    fn failed_save_keeps_old_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = ProgressFile::open(dir.path());
        assert!(p.unlock(2).is_err());
        assert_eq!(p.highest_unlocked_ordinal(), 0);
    }
}

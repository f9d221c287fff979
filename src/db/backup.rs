//! Pre-migration snapshots of the journal file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use rusqlite::Connection;
use rusqlite::backup::Backup;

use crate::error::{JournalError, Result};

const BACKUP_DIR: &str = "backups";
const FILE_PREFIX: &str = "journal_v";
pub const BACKUPS_TO_KEEP: usize = 5;

/// `:memory:` and URI memory databases have nothing on disk to copy.
pub fn is_file_database(db_path: &str) -> bool {
    !db_path.is_empty() && db_path != ":memory:" && !db_path.starts_with("file::memory:")
}

/// Copy the database next to itself under `backups/`, check the copy, and
/// prune all but the newest few snapshots.
pub fn snapshot(db_path: &str, target_version: u32) -> Result<PathBuf> {
    let db_file = Path::new(db_path);
    let dir = db_file
        .parent()
        .map(|parent| parent.join(BACKUP_DIR))
        .ok_or_else(|| JournalError::InvalidInput(format!("no parent directory for {}", db_path)))?;
    fs::create_dir_all(&dir).map_err(|e| {
        JournalError::DatabaseError(format!("cannot create {}: {}", dir.display(), e))
    })?;

    // Timestamp sorts lexically, which is what `prune` relies on.
    let path = dir.join(format!(
        "{}{}_{}.db",
        FILE_PREFIX,
        target_version,
        Utc::now().format("%Y%m%d%H%M%S%3f")
    ));

    let source = Connection::open(db_file)?;
    let mut copy = Connection::open(&path)?;
    Backup::new(&source, &mut copy)?.run_to_completion(64, Duration::from_millis(50), None)?;

    let integrity: String = copy.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
    if integrity != "ok" {
        return Err(JournalError::DatabaseError(format!(
            "backup {} failed integrity check: {}",
            path.display(),
            integrity
        )));
    }

    prune(&dir, BACKUPS_TO_KEEP);
    Ok(path)
}

fn stamp(name: &str) -> Option<&str> {
    let rest = name.strip_prefix(FILE_PREFIX)?.strip_suffix(".db")?;
    rest.split_once('_').map(|(_, stamp)| stamp)
}

/// Best effort: failures are logged, never returned.
pub fn prune(dir: &Path, keep: usize) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Cannot list backups in {}: {}", dir.display(), e);
            return;
        }
    };

    let mut backups: Vec<(String, PathBuf)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let stamp = stamp(&name)?.to_string();
            Some((stamp, entry.path()))
        })
        .collect();
    backups.sort();

    let excess = backups.len().saturating_sub(keep);
    for (_, path) in backups.into_iter().take(excess) {
        match fs::remove_file(&path) {
            Ok(()) => log::debug!("Removed old backup {}", path.display()),
            Err(e) => log::warn!("Cannot remove old backup {}: {}", path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_paths_are_not_files() {
        assert!(!is_file_database(":memory:"));
        assert!(!is_file_database("file::memory:?cache=shared"));
        assert!(!is_file_database(""));
        assert!(is_file_database("/tmp/journal.db"));
    }

    #[test]
    fn test_prune_keeps_newest() {
        let dir = tempfile::tempdir().unwrap();
        for stamp in ["20240101000000000", "20240301000000000", "20240201000000000"] {
            fs::write(dir.path().join(format!("journal_v2_{stamp}.db")), b"").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), b"keep me").unwrap();

        prune(dir.path(), 1);

        let mut left: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        left.sort();
        assert_eq!(left, vec!["journal_v2_20240301000000000.db", "notes.txt"]);
    }

    #[test]
    fn test_snapshot_copies_data() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("journal.db");
        let db_path = db_path.to_str().unwrap();
        {
            let conn = Connection::open(db_path).unwrap();
            conn.execute_batch("CREATE TABLE t (x INTEGER); INSERT INTO t VALUES (42);")
                .unwrap();
        }

        let path = snapshot(db_path, 3).unwrap();
        let copy = Connection::open(&path).unwrap();
        let x: i64 = copy.query_row("SELECT x FROM t", [], |row| row.get(0)).unwrap();
        assert_eq!(x, 42);
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("journal_v3_"));
    }
}

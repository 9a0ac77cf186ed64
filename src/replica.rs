//! Shared-storage replica of the occupancy record.
//!
//! The replica is a plain file inside the shared server folder, written by
//! whichever agent holds the resource. Line 1 is the holder identity; line 2
//! is a human-readable timestamp kept for operators. Staleness is judged on
//! the file's modification time, not on the timestamp line.
//!
//! Reads never fail hard: a missing, unreadable or malformed file is treated
//! as vacant. The unexpected cases are still logged so they do not disappear
//! silently.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::{Error, Result};

/// Name of the occupancy file inside the shared server folder.
pub const STATUS_FILE_NAME: &str = "solohost_status.txt";

#[derive(Debug, Clone)]
pub struct ReplicaStore {
    path: PathBuf,
}

enum ReadOutcome {
    Held { identity: String, age: Duration },
    Vacant,
}

impl ReplicaStore {
    pub fn new(folder: &Path) -> Self {
        Self {
            path: folder.join(STATUS_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record the holder, or clear the record when `identity` is `None`.
    ///
    /// Writes go to a temporary file first and are renamed into place so a
    /// concurrent reader never sees a half-written record. Failure to persist
    /// is fatal to the caller: occupancy cannot be safely recorded without it.
    pub fn write(&self, identity: Option<&str>) -> Result<()> {
        match identity {
            Some(identity) => {
                let tmp = self.path.with_extension("txt.tmp");
                let contents = format!("{identity}\n{}\n", Utc::now().to_rfc2822());
                fs::write(&tmp, contents)
                    .and_then(|()| fs::rename(&tmp, &self.path))
                    .map_err(|source| Error::ReplicaWrite {
                        path: self.path.clone(),
                        source,
                    })
            }
            None => match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(source) => Err(Error::ReplicaWrite {
                    path: self.path.clone(),
                    source,
                }),
            },
        }
    }

    /// Read the current holder, treating records older than `threshold` as
    /// vacant. A zero threshold disables staleness checking.
    pub fn read(&self, threshold: Duration) -> Option<String> {
        match self.read_record() {
            ReadOutcome::Vacant => None,
            ReadOutcome::Held { identity, age } => {
                if !threshold.is_zero() && age >= threshold {
                    info!(
                        "Replica record for {} is stale ({}s old, threshold {}s), treating as vacant",
                        identity,
                        age.as_secs(),
                        threshold.as_secs()
                    );
                    None
                } else {
                    Some(identity)
                }
            }
        }
    }

    fn read_record(&self) -> ReadOutcome {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No replica record at {:?}", self.path);
                return ReadOutcome::Vacant;
            }
            Err(e) => {
                // Permission problems and other IO faults still map to
                // vacant, but deserve a warning.
                warn!("Cannot read replica record {:?}: {}", self.path, e);
                return ReadOutcome::Vacant;
            }
        };

        let Some(identity) = contents
            .lines()
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
        else {
            warn!("Replica record {:?} is empty, treating as vacant", self.path);
            return ReadOutcome::Vacant;
        };

        let age = fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .and_then(|modified| {
                SystemTime::now()
                    .duration_since(modified)
                    .map_err(|e| std::io::Error::new(ErrorKind::Other, e))
            })
            .unwrap_or_else(|e| {
                warn!("Cannot determine age of {:?}: {}", self.path, e);
                Duration::ZERO
            });

        ReadOutcome::Held { identity, age }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let replica = ReplicaStore::new(dir.path());

        replica.write(Some("1.2.3.4")).unwrap();
        assert_eq!(replica.read(Duration::ZERO).as_deref(), Some("1.2.3.4"));

        // First line is the identity, second a human-readable timestamp
        let contents = fs::read_to_string(replica.path()).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("1.2.3.4"));
        assert!(lines.next().is_some());
    }

    #[test]
    fn test_missing_file_is_vacant() {
        let dir = tempfile::tempdir().unwrap();
        let replica = ReplicaStore::new(dir.path());
        assert_eq!(replica.read(Duration::ZERO), None);
    }

    #[test]
    fn test_clearing_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let replica = ReplicaStore::new(dir.path());

        replica.write(Some("1.2.3.4")).unwrap();
        replica.write(None).unwrap();
        replica.write(None).unwrap();
        assert_eq!(replica.read(Duration::ZERO), None);
    }

    #[test]
    fn test_empty_record_is_vacant() {
        let dir = tempfile::tempdir().unwrap();
        let replica = ReplicaStore::new(dir.path());
        fs::write(replica.path(), "").unwrap();
        assert_eq!(replica.read(Duration::ZERO), None);
    }

    #[test]
    fn test_stale_record_is_vacant() {
        let dir = tempfile::tempdir().unwrap();
        let replica = ReplicaStore::new(dir.path());
        replica.write(Some("1.2.3.4")).unwrap();

        std::thread::sleep(Duration::from_millis(50));

        // Fresh under a generous threshold, stale under a tiny one
        assert_eq!(
            replica.read(Duration::from_secs(60)).as_deref(),
            Some("1.2.3.4")
        );
        assert_eq!(replica.read(Duration::from_millis(10)), None);

        // Zero threshold trusts the record regardless of age
        assert_eq!(replica.read(Duration::ZERO).as_deref(), Some("1.2.3.4"));
    }
}

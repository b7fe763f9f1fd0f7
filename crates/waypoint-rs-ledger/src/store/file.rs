//! File-backed result store.
//!
//! Layout: `<root>/<domain dir>/<id>.json`, with in-flight writes under
//! `<root>/<domain dir>/.staging/`. A record is written and synced in the
//! staging area, then published with a hard link, which fails if the target
//! exists. Readers therefore never see a partial file, and a committed id
//! can never be overwritten.

use super::{ResultStore, StoreLayout, sort_summaries};
use crate::model::{SearchRecord, SearchSummary};
use log::{debug, info, warn};
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use waypoint_rs_protocol::{Domain, LedgerError, ListOrder, SearchId};

const STAGING_DIR: &str = ".staging";
const RECORD_EXT: &str = "json";
const STAGING_EXT: &str = "tmp";

/// Listing reads only this projection; the payload is skipped by the parser.
#[derive(Deserialize)]
struct RecordHead {
    summary: SearchSummary,
}

/// Result store rooted at a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileResultStore {
    root: PathBuf,
    layout: StoreLayout,
}

impl FileResultStore {
    /// Open a store under `root`. Domain directories are created on first write.
    pub fn open(root: impl AsRef<Path>, layout: StoreLayout) -> Self {
        let root = root.as_ref().to_path_buf();
        info!("opened file result store (root={})", root.display());
        Self { root, layout }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn domain_dir(&self, domain: Domain) -> PathBuf {
        self.root.join(self.layout.directory(domain))
    }

    fn record_path(&self, domain: Domain, id: &SearchId) -> PathBuf {
        self.domain_dir(domain)
            .join(format!("{id}.{RECORD_EXT}"))
    }

    fn staging_dir(&self, domain: Domain) -> PathBuf {
        self.domain_dir(domain).join(STAGING_DIR)
    }

    /// Staging artifacts left behind by interrupted writes.
    pub fn stale_staging(&self, domain: Domain) -> Result<Vec<PathBuf>, LedgerError> {
        let dir = self.staging_dir(domain);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(LedgerError::storage(domain, None, "read staging directory", err)),
        };
        let mut stale = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|err| LedgerError::storage(domain, None, "read staging directory", err))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == STAGING_EXT) {
                stale.push(path);
            }
        }
        stale.sort();
        Ok(stale)
    }

    /// Remove leftover staging artifacts. Never called implicitly, since a
    /// concurrent writer's in-flight file looks the same as an abandoned one.
    pub fn purge_staging(&self, domain: Domain) -> Result<usize, LedgerError> {
        let stale = self.stale_staging(domain)?;
        for path in &stale {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(LedgerError::storage(domain, None, "purge staging file", err));
                }
            }
        }
        info!(
            "purged staging artifacts (domain={}, count={})",
            domain,
            stale.len()
        );
        Ok(stale.len())
    }
}

impl ResultStore for FileResultStore {
    fn put(&self, record: &SearchRecord) -> Result<(), LedgerError> {
        let domain = record.domain;
        let id = &record.id;
        if record.summary.id != *id || record.summary.domain != domain {
            return Err(LedgerError::storage(
                domain,
                Some(id),
                "commit record",
                "summary does not describe this record",
            ));
        }

        let dir = self.domain_dir(domain);
        let staging_dir = dir.join(STAGING_DIR);
        fs::create_dir_all(&staging_dir)
            .map_err(|err| LedgerError::storage(domain, Some(id), "create domain directory", err))?;

        let target = self.record_path(domain, id);
        let encoded = serde_json::to_vec_pretty(record)
            .map_err(|err| LedgerError::storage(domain, Some(id), "encode record", err))?;
        let staging = staging_dir.join(format!(
            "{id}.{}.{STAGING_EXT}",
            Uuid::new_v4().simple()
        ));

        if let Err(err) = write_synced(&staging, &encoded) {
            discard(&staging);
            return Err(LedgerError::storage(domain, Some(id), "write staging file", err));
        }

        if let Err(err) = fs::hard_link(&staging, &target) {
            discard(&staging);
            return Err(if err.kind() == ErrorKind::AlreadyExists {
                LedgerError::storage(domain, Some(id), "publish record", "id is already committed")
            } else {
                LedgerError::storage(domain, Some(id), "publish record", err)
            });
        }
        discard(&staging);
        sync_dir(&dir);

        info!(
            "committed search record (domain={}, id={}, items={})",
            domain,
            id,
            record.result_payload.items.len()
        );
        Ok(())
    }

    fn get(&self, domain: Domain, id: &SearchId) -> Result<SearchRecord, LedgerError> {
        let path = self.record_path(domain, id);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(LedgerError::NotFound {
                    domain,
                    id: id.clone(),
                });
            }
            Err(err) => return Err(LedgerError::storage(domain, Some(id), "read record", err)),
        };
        let record: SearchRecord = serde_json::from_slice(&bytes)
            .map_err(|err| LedgerError::storage(domain, Some(id), "decode record", err))?;
        if record.id != *id || record.domain != domain {
            return Err(LedgerError::storage(
                domain,
                Some(id),
                "read record",
                format!("file holds {} record {}", record.domain, record.id),
            ));
        }
        debug!("loaded search record (domain={}, id={})", domain, id);
        Ok(record)
    }

    fn list(&self, domain: Domain, order: ListOrder) -> Result<Vec<SearchSummary>, LedgerError> {
        let dir = self.domain_dir(domain);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(LedgerError::storage(domain, None, "list records", err)),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|err| LedgerError::storage(domain, None, "list records", err))?;
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let Some(stem) = name.strip_suffix(".json") else {
                continue;
            };
            let Ok(id) = SearchId::parse(stem) else {
                warn!(
                    "skipping record file with invalid id (domain={}, file={})",
                    domain, name
                );
                continue;
            };
            match read_head(&entry.path()) {
                Ok(head) if head.summary.id == id && head.summary.domain == domain => {
                    summaries.push(head.summary)
                }
                Ok(head) => warn!(
                    "skipping record file whose summary names another record (domain={}, file={}, summary_id={})",
                    domain, name, head.summary.id
                ),
                Err(err) => warn!(
                    "skipping unreadable record file (domain={}, file={}, error={})",
                    domain, name, err
                ),
            }
        }

        sort_summaries(&mut summaries, order);
        debug!(
            "listed search records (domain={}, count={})",
            domain,
            summaries.len()
        );
        Ok(summaries)
    }
}

fn read_head(path: &Path) -> io::Result<RecordHead> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)?;
    file.write_all(b"\n")?;
    file.sync_all()
}

fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path)
        && err.kind() != ErrorKind::NotFound
    {
        warn!(
            "failed to remove staging file (path={}, error={})",
            path.display(),
            err
        );
    }
}

/// Persist the directory entry for a new link. Best effort.
fn sync_dir(dir: &Path) {
    #[cfg(unix)]
    {
        if let Err(err) = File::open(dir).and_then(|handle| handle.sync_all()) {
            debug!(
                "directory sync failed (path={}, error={})",
                dir.display(),
                err
            );
        }
    }
    #[cfg(not(unix))]
    let _ = dir;
}

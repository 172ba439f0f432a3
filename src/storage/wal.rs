//! Write-ahead log (component 4.H), grounded on the teacher's
//! `storage::wal`: length-prefixed, CRC-checked records appended to a
//! single file, replayed in order on recovery. The only record this crate
//! needs is `CopyTableRecord`, logged before a bulk copy's node groups are
//! installed so recovery can tell which tables were mid-flush.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::catalog::LabelId;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableType {
    Node,
    Rel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyTableRecord {
    pub table_id: LabelId,
    pub table_type: TableType,
}

pub struct Wal {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl Wal {
    /// `None` path means an in-memory database (`Database::in_memory`):
    /// records are accepted and silently dropped, since there is nothing to
    /// recover across a process that never persisted anything.
    pub fn open(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => Some(OpenOptions::new().create(true).append(true).open(p)?),
            None => None,
        };
        Ok(Wal { path: path.map(PathBuf::from).unwrap_or_default(), file: Mutex::new(file) })
    }

    pub fn append_copy_table(&self, record: &CopyTableRecord) -> Result<()> {
        let mut guard = self.file.lock();
        let Some(file) = guard.as_mut() else { return Ok(()) };
        let payload = bincode::serialize(record)
            .map_err(|e| Error::internal(format!("WAL record serialization failed: {e}")))?;
        let mut hasher = Hasher::new();
        hasher.update(&payload);
        let checksum = hasher.finalize();

        file.write_all(&(payload.len() as u32).to_le_bytes())?;
        file.write_all(&payload)?;
        file.write_all(&checksum.to_le_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Replays every well-formed record in the log; a truncated trailing
    /// record (partial write from a crash mid-append) is silently dropped
    /// rather than treated as corruption, matching the teacher's WAL replay
    /// tolerance for a torn final write.
    pub fn replay(&self) -> Result<Vec<CopyTableRecord>> {
        if self.path.as_os_str().is_empty() {
            return Ok(Vec::new());
        }
        let mut buf = Vec::new();
        File::open(&self.path)?.read_to_end(&mut buf)?;
        let mut out = Vec::new();
        let mut pos = 0;
        while pos + 4 <= buf.len() {
            let len = u32::from_le_bytes(buf[pos..pos + 4].try_into().unwrap()) as usize;
            pos += 4;
            if pos + len + 4 > buf.len() {
                break;
            }
            let payload = &buf[pos..pos + len];
            let checksum = u32::from_le_bytes(buf[pos + len..pos + len + 4].try_into().unwrap());
            let mut hasher = Hasher::new();
            hasher.update(payload);
            if hasher.finalize() != checksum {
                break;
            }
            if let Ok(record) = bincode::deserialize::<CopyTableRecord>(payload) {
                out.push(record);
            }
            pos += len + 4;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copy_table_record_round_trips_through_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wal.log");
        let wal = Wal::open(Some(&path)).unwrap();
        wal.append_copy_table(&CopyTableRecord { table_id: 3, table_type: TableType::Node }).unwrap();
        wal.append_copy_table(&CopyTableRecord { table_id: 7, table_type: TableType::Rel }).unwrap();

        let records = wal.replay().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].table_id, 3);
        assert_eq!(records[1].table_type, TableType::Rel);
    }

    #[test]
    fn in_memory_wal_accepts_and_drops_records() {
        let wal = Wal::open(None).unwrap();
        wal.append_copy_table(&CopyTableRecord { table_id: 1, table_type: TableType::Node }).unwrap();
        assert!(wal.replay().unwrap().is_empty());
    }
}

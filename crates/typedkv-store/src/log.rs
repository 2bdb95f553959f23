use std::collections::HashMap;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::Backend;

/// A single mutation recorded in the log.
///
/// On-disk framing:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized LogRecord)]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogRecord {
    Put { key: Vec<u8>, value: Vec<u8> },
    Delete { key: Vec<u8> },
}

/// Flush strategy for log appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append.
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Outcome of replaying a log file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records applied to the index.
    pub applied: usize,
    /// Entries skipped because of a CRC mismatch or an undecodable payload.
    pub skipped: usize,
    /// Bytes dropped from a torn tail.
    pub truncated_bytes: u64,
}

/// Append handle to the log file.
trait LogFile: Write + Send + Sync {
    fn sync(&self) -> io::Result<()>;
    fn set_len(&self, len: u64) -> io::Result<()>;
}

impl LogFile for File {
    fn sync(&self) -> io::Result<()> {
        self.sync_all()
    }

    fn set_len(&self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

struct LogState {
    index: HashMap<Vec<u8>, Vec<u8>>,
    file: Box<dyn LogFile>,
    /// Length of the log file, which is also the next append offset.
    offset: u64,
}

/// Append-only log backend.
///
/// Every `put` and `delete` is appended to a single file as a framed bincode
/// record and applied to an in-memory index. Opening the backend replays the
/// file front to back. Entries that fail their CRC check are skipped, and a
/// torn tail left by a crash is cut off so later appends stay aligned.
pub struct LogBackend {
    path: PathBuf,
    sync_mode: SyncMode,
    state: RwLock<LogState>,
    replay: ReplayStats,
}

impl LogBackend {
    /// Open (or create) the log at `path` and rebuild the index from it.
    pub fn open(path: impl AsRef<Path>, sync_mode: SyncMode) -> StoreResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;

        let (index, valid_len, replay) = replay(path)?;
        if replay.truncated_bytes > 0 {
            warn!(
                path = %path.display(),
                valid_len,
                dropped = replay.truncated_bytes,
                "truncating torn log tail"
            );
            file.set_len(valid_len)?;
        }

        info!(
            path = %path.display(),
            records = index.len(),
            applied = replay.applied,
            skipped = replay.skipped,
            "opened log backend"
        );

        Ok(Self {
            path: path.to_path_buf(),
            sync_mode,
            state: RwLock::new(LogState {
                index,
                file: Box::new(file),
                offset: valid_len,
            }),
            replay,
        })
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sync_mode(&self) -> SyncMode {
        self.sync_mode
    }

    /// What happened while replaying the log on open.
    pub fn replay_stats(&self) -> &ReplayStats {
        &self.replay
    }

    /// Number of live records.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read()?.index.len())
    }

    /// Returns `true` if there are no live records.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read()?.index.is_empty())
    }

    /// Current size of the log file in bytes.
    pub fn log_size(&self) -> StoreResult<u64> {
        Ok(self.read()?.offset)
    }

    /// Rewrite the log so it holds exactly one `Put` per live record.
    ///
    /// The new log is written next to the old one and renamed over it, so a
    /// crash mid-compaction leaves the previous log intact.
    pub fn compact(&self) -> StoreResult<()> {
        let mut state = self.write()?;
        let before = state.offset;

        let tmp_path = compact_path(&self.path);
        let mut out = BufWriter::new(File::create(&tmp_path)?);
        let mut keys: Vec<&Vec<u8>> = state.index.keys().collect();
        keys.sort();
        let mut offset = 0u64;
        for key in keys {
            let record = LogRecord::Put {
                key: key.clone(),
                value: state.index[key].clone(),
            };
            let frame = encode_entry(&record)?;
            out.write_all(&frame)?;
            offset += frame.len() as u64;
        }
        out.flush()?;
        out.get_ref().sync_all()?;
        drop(out);

        fs::rename(&tmp_path, &self.path)?;
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        state.file = Box::new(file);
        state.offset = offset;

        debug!(before, after = offset, records = state.index.len(), "log compacted");
        Ok(())
    }

    /// Append one framed record. On failure the file is cut back to the
    /// last good offset so no partial frame stays behind.
    fn append(&self, state: &mut LogState, record: &LogRecord) -> StoreResult<()> {
        let frame = encode_entry(record)?;
        if let Err(e) = self.write_frame(state, &frame) {
            if let Err(cut) = state.file.set_len(state.offset) {
                warn!(
                    offset = state.offset,
                    error = %cut,
                    "could not truncate log after failed append"
                );
            }
            return Err(e.into());
        }
        debug!(offset = state.offset, len = frame.len(), "log append");
        state.offset += frame.len() as u64;
        Ok(())
    }

    fn write_frame(&self, state: &mut LogState, frame: &[u8]) -> io::Result<()> {
        state.file.write_all(frame)?;
        state.file.flush()?;
        if self.sync_mode == SyncMode::EveryWrite {
            state.file.sync()?;
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, LogState>> {
        self.state.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, LogState>> {
        self.state.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Backend for LogBackend {
    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        let mut state = self.write()?;
        let record = LogRecord::Put {
            key: key.to_vec(),
            value: value.to_vec(),
        };
        self.append(&mut state, &record)?;
        if let LogRecord::Put { key, value } = record {
            state.index.insert(key, value);
        }
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read()?.index.get(key).cloned())
    }

    fn delete(&self, key: &[u8]) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.index.contains_key(key) {
            return Err(StoreError::not_found(key));
        }
        self.append(&mut state, &LogRecord::Delete { key: key.to_vec() })?;
        state.index.remove(key);
        Ok(())
    }

    fn contains(&self, key: &[u8]) -> StoreResult<bool> {
        Ok(self.read()?.index.contains_key(key))
    }
}

impl std::fmt::Debug for LogBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.state.read().map(|s| s.index.len()).ok();
        f.debug_struct("LogBackend")
            .field("path", &self.path)
            .field("sync_mode", &self.sync_mode)
            .field("record_count", &count)
            .finish()
    }
}

/// Build the complete on-disk frame for one record.
fn encode_entry(record: &LogRecord) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(record)?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization(format!("log record too large: {} bytes", payload.len())))?;
    let crc = crc32fast::hash(&payload);

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc.to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Scratch file used while compacting `path`: the full file name plus
/// `.compact`, so logs sharing a stem never share a scratch file.
fn compact_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".compact");
    path.with_file_name(name)
}

/// Rebuild the index from the log at `path`.
///
/// Returns the index, the length of the well-framed prefix of the file, and
/// replay statistics.
fn replay(path: &Path) -> StoreResult<(HashMap<Vec<u8>, Vec<u8>>, u64, ReplayStats)> {
    let mut file = BufReader::new(File::open(path)?);
    let file_len = file.get_ref().metadata()?.len();
    let mut index = HashMap::new();
    let mut stats = ReplayStats::default();
    let mut offset: u64 = 0;

    while offset < file_len {
        if offset + HEADER_SIZE as u64 > file_len {
            warn!(offset, file_len, "truncated log header; stopping replay");
            break;
        }

        let mut header = [0u8; HEADER_SIZE];
        match file.read_exact(&mut header) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        }
        let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

        let end = offset + HEADER_SIZE as u64 + u64::from(length);
        if end > file_len {
            warn!(offset, length, file_len, "truncated log entry; stopping replay");
            break;
        }

        let mut payload = vec![0u8; length as usize];
        match file.read_exact(&mut payload) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                warn!(offset, "truncated log entry; stopping replay");
                break;
            }
            Err(e) => return Err(e.into()),
        }

        let actual_crc = crc32fast::hash(&payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping log entry"
            );
            stats.skipped += 1;
            offset = end;
            continue;
        }

        match bincode::deserialize::<LogRecord>(&payload) {
            Ok(LogRecord::Put { key, value }) => {
                index.insert(key, value);
                stats.applied += 1;
            }
            Ok(LogRecord::Delete { key }) => {
                index.remove(&key);
                stats.applied += 1;
            }
            Err(e) => {
                warn!(offset, error = %e, "undecodable log entry; skipping");
                stats.skipped += 1;
            }
        }
        offset = end;
    }

    stats.truncated_bytes = file_len - offset;
    debug!(
        applied = stats.applied,
        skipped = stats.skipped,
        "log replay complete"
    );
    Ok((index, offset, stats))
}

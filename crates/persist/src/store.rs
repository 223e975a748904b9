//! File-backed world saves.
//!
//! Layout inside the store directory:
//! ```text
//! world.meta.json            - metadata and schema versions
//! snapshots/
//!   000001.snapshot.cbor.zst - CBOR+zstd compressed grid snapshots
//! events/
//!   000001.log.cbor.zst      - CBOR+zstd compressed session event segments
//! integrity/
//!   manifest.json            - hash chain manifest
//! ```

use crate::snapshot::{SnapshotError, WorldSnapshot};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tileworld_kernel::{GridError, SessionEvent, WorldSession};
use tracing::{debug, info, warn};

const WORLD_SCHEMA_VERSION: u32 = 1;
const EVENT_SCHEMA_VERSION: u32 = 1;

/// Errors from file-backed persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CBOR serialization error: {0}")]
    CborEncode(String),
    #[error("CBOR deserialization error: {0}")]
    CborDecode(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("integrity check failed: expected {expected}, got {actual}")]
    IntegrityMismatch { expected: String, actual: String },
    #[error("{0} is not listed in the integrity manifest")]
    Unlisted(String),
    #[error("schema version mismatch: file has v{file_version}, expected v{expected_version}")]
    SchemaMismatch {
        file_version: u32,
        expected_version: u32,
    },
    #[error("no snapshots found")]
    NoSnapshots,
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("malformed grid: {0}")]
    Grid(#[from] GridError),
}

/// Contents of world.meta.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldMeta {
    pub world_schema_version: u32,
    pub event_schema_version: u32,
    pub snapshot_count: u32,
    pub event_segment_count: u32,
}

/// One written file and its place in the hash chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub filename: String,
    pub sha256: String,
    pub prev_hash: Option<String>,
}

/// Every written file's hash, each entry chained to the one before.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntegrityManifest {
    pub entries: Vec<ManifestEntry>,
}

/// On-disk save directory with schema versioning and integrity checking.
pub struct WorldStore {
    root: PathBuf,
    meta: WorldMeta,
    manifest: IntegrityManifest,
}

impl WorldStore {
    /// Open or create a store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("snapshots"))?;
        std::fs::create_dir_all(root.join("events"))?;
        std::fs::create_dir_all(root.join("integrity"))?;

        let meta_path = root.join("world.meta.json");
        let manifest_path = root.join("integrity").join("manifest.json");

        let (meta, manifest) = if meta_path.exists() {
            let meta: WorldMeta = serde_json::from_reader(std::fs::File::open(&meta_path)?)?;
            check_schema(meta.world_schema_version, WORLD_SCHEMA_VERSION)?;
            check_schema(meta.event_schema_version, EVENT_SCHEMA_VERSION)?;
            let manifest: IntegrityManifest = if manifest_path.exists() {
                serde_json::from_reader(std::fs::File::open(&manifest_path)?)?
            } else {
                IntegrityManifest::default()
            };
            (meta, manifest)
        } else {
            let meta = WorldMeta {
                world_schema_version: WORLD_SCHEMA_VERSION,
                event_schema_version: EVENT_SCHEMA_VERSION,
                snapshot_count: 0,
                event_segment_count: 0,
            };
            let manifest = IntegrityManifest::default();
            serde_json::to_writer_pretty(std::fs::File::create(&meta_path)?, &meta)?;
            serde_json::to_writer_pretty(std::fs::File::create(&manifest_path)?, &manifest)?;
            info!(root = %root.display(), "created world store");
            (meta, manifest)
        };

        Ok(Self {
            root,
            meta,
            manifest,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta(&self) -> &WorldMeta {
        &self.meta
    }

    /// Write a snapshot of `session`. Returns its index, starting at 1.
    pub fn take_snapshot(&mut self, session: &WorldSession) -> Result<u32, StoreError> {
        let snap = WorldSnapshot::capture(session);
        let index = self.meta.snapshot_count + 1;
        let filename = format!("{:06}.snapshot.cbor.zst", index);
        self.write_segment("snapshots", filename, &snap)?;
        self.meta.snapshot_count = index;
        self.save_meta()?;
        info!(index, tick = snap.tick, "snapshot saved");
        Ok(index)
    }

    /// Append events as a new segment. An empty slice writes nothing.
    pub fn append_events(&mut self, events: &[SessionEvent]) -> Result<(), StoreError> {
        if events.is_empty() {
            return Ok(());
        }
        let index = self.meta.event_segment_count + 1;
        let filename = format!("{:06}.log.cbor.zst", index);
        self.write_segment("events", filename, events)?;
        self.meta.event_segment_count = index;
        self.save_meta()?;
        debug!(index, count = events.len(), "event segment saved");
        Ok(())
    }

    /// Snapshot the session and flush its pending events.
    pub fn save_session(&mut self, session: &mut WorldSession) -> Result<u32, StoreError> {
        let index = self.take_snapshot(session)?;
        self.append_events(&session.drain_events())?;
        Ok(index)
    }

    /// The newest snapshot, hash-checked against the manifest and itself.
    pub fn load_latest(&self) -> Result<WorldSnapshot, StoreError> {
        if self.meta.snapshot_count == 0 {
            return Err(StoreError::NoSnapshots);
        }
        let filename = format!("{:06}.snapshot.cbor.zst", self.meta.snapshot_count);
        let snap: WorldSnapshot = self.read_segment("snapshots", &filename)?;
        snap.verify()?;
        Ok(snap)
    }

    /// Load the newest snapshot into `session`.
    pub fn restore_latest(&self, session: &mut WorldSession) -> Result<(), StoreError> {
        let snap = self.load_latest()?;
        snap.restore_into(session)?;
        info!(tick = snap.tick, "session restored from store");
        Ok(())
    }

    /// Every stored event, oldest first.
    pub fn load_events(&self) -> Result<Vec<SessionEvent>, StoreError> {
        let mut events = Vec::new();
        for index in 1..=self.meta.event_segment_count {
            let filename = format!("{:06}.log.cbor.zst", index);
            let segment: Vec<SessionEvent> = self.read_segment("events", &filename)?;
            events.extend(segment);
        }
        Ok(events)
    }

    /// Verify the manifest chain and every file's hash.
    pub fn verify_integrity(&self) -> Result<(), StoreError> {
        let mut prev_hash: Option<String> = None;
        for entry in &self.manifest.entries {
            if entry.prev_hash != prev_hash {
                return Err(StoreError::IntegrityMismatch {
                    expected: prev_hash.unwrap_or_else(|| "None".into()),
                    actual: entry.prev_hash.clone().unwrap_or_else(|| "None".into()),
                });
            }
            let data = std::fs::read(self.segment_path(&entry.filename))?;
            let actual = sha256_hex(&data);
            if actual != entry.sha256 {
                warn!(file = %entry.filename, "integrity check failed");
                return Err(StoreError::IntegrityMismatch {
                    expected: entry.sha256.clone(),
                    actual,
                });
            }
            prev_hash = Some(entry.sha256.clone());
        }
        Ok(())
    }

    fn segment_path(&self, filename: &str) -> PathBuf {
        let dir = if filename.contains("snapshot") {
            "snapshots"
        } else {
            "events"
        };
        self.root.join(dir).join(filename)
    }

    fn write_segment<T: Serialize + ?Sized>(
        &mut self,
        dir: &str,
        filename: String,
        value: &T,
    ) -> Result<(), StoreError> {
        let compressed = zstd_compress(&cbor_serialize(value)?)?;
        let sha256 = sha256_hex(&compressed);
        let prev_hash = self.manifest.entries.last().map(|e| e.sha256.clone());
        std::fs::write(self.root.join(dir).join(&filename), &compressed)?;
        self.manifest.entries.push(ManifestEntry {
            filename,
            sha256,
            prev_hash,
        });
        self.save_manifest()
    }

    fn read_segment<T: for<'de> Deserialize<'de>>(
        &self,
        dir: &str,
        filename: &str,
    ) -> Result<T, StoreError> {
        let compressed = std::fs::read(self.root.join(dir).join(filename))?;
        self.verify_file_hash(filename, &compressed)?;
        cbor_deserialize(&zstd_decompress(&compressed)?)
    }

    fn verify_file_hash(&self, filename: &str, data: &[u8]) -> Result<(), StoreError> {
        let entry = self
            .manifest
            .entries
            .iter()
            .find(|e| e.filename == filename)
            .ok_or_else(|| StoreError::Unlisted(filename.to_string()))?;
        let actual = sha256_hex(data);
        if entry.sha256 != actual {
            return Err(StoreError::IntegrityMismatch {
                expected: entry.sha256.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn save_meta(&self) -> Result<(), StoreError> {
        let path = self.root.join("world.meta.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.meta)?;
        Ok(())
    }

    fn save_manifest(&self) -> Result<(), StoreError> {
        let path = self.root.join("integrity").join("manifest.json");
        serde_json::to_writer_pretty(std::fs::File::create(path)?, &self.manifest)?;
        Ok(())
    }
}

fn check_schema(file_version: u32, expected_version: u32) -> Result<(), StoreError> {
    if file_version != expected_version {
        return Err(StoreError::SchemaMismatch {
            file_version,
            expected_version,
        });
    }
    Ok(())
}

fn cbor_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| StoreError::CborEncode(e.to_string()))?;
    Ok(buf)
}

fn cbor_deserialize<T: for<'de> Deserialize<'de>>(data: &[u8]) -> Result<T, StoreError> {
    ciborium::from_reader(data).map_err(|e| StoreError::CborDecode(e.to_string()))
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut encoder = zstd::Encoder::new(Vec::new(), 3)?;
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut decoder = zstd::Decoder::new(data)?;
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(buf)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

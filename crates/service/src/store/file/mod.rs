//! File-backed store implementations.
//!
//! Each partition lives in its own file under a base directory; partition
//! keys are hex encoded into file names so arbitrary world and zone names
//! stay path-safe. Every mutation is a read-modify-write of a whole
//! partition file, so each store serializes its mutations behind a mutex;
//! writes go to a uniquely named temp file followed by an atomic rename.
//!
//! Zones are stored as JSON for inspectability; reinforced blocks and
//! authorizations are bulk data and use bincode.

mod authorizations;
mod blocks;
mod zones;

pub use authorizations::FileAuthorizationStore;
pub use blocks::FileReinforcedBlockStore;
pub use zones::FileZoneStore;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::store::{Result, StoreError};

/// Sequence for unique temp-file names, so writers never share a temp path.
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// Encodes a partition key into a file name with the given prefix/extension.
fn partition_path(base: &Path, prefix: &str, key: &str, ext: &str) -> PathBuf {
    base.join(format!("{prefix}_{}.{ext}", hex::encode(key.as_bytes())))
}

/// Recovers the partition key from a file name produced by [`partition_path`].
fn partition_key(path: &Path, prefix: &str, ext: &str) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let encoded = name
        .strip_prefix(prefix)?
        .strip_prefix('_')?
        .strip_suffix(ext)?
        .strip_suffix('.')?;
    let bytes = hex::decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// Writes bytes to a temp file then renames over the target.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
    let temp_path = path.with_extension(format!("tmp{seq}"));
    fs::write(&temp_path, bytes).map_err(StoreError::Io)?;
    fs::rename(&temp_path, path).map_err(StoreError::Io)?;
    Ok(())
}

/// Lists partition files under `base` matching the prefix/extension scheme.
fn partition_files(base: &Path, prefix: &str, ext: &str) -> Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(base).map_err(StoreError::Io)? {
        let entry = entry.map_err(StoreError::Io)?;
        let path = entry.path();
        if let Some(key) = partition_key(&path, prefix, ext) {
            files.push((key, path));
        }
    }
    Ok(files)
}

//! File-backed storage: one file per key under a data directory

use crate::error::{CacheError, Result};
use crate::storage::DurableStorage;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

const VALUE_EXTENSION: &str = "dat";
const KEY_EXTENSION: &str = "key";

/// Prefix of file stems named by digest rather than by the key itself
const DIGEST_PREFIX: &str = "sha256-";

/// Longest hex stem used verbatim; NAME_MAX is 255 on common filesystems
const MAX_HEX_STEM: usize = 200;

/// Stores each key as `<hex(key)>.dat` inside `base_dir`
///
/// File names are the hex encoding of the key, so arbitrary uris map to
/// portable names without collisions. Keys whose hex form would exceed
/// the file name limit are stored as `sha256-<digest>.dat` with the key
/// itself in a `.key` sidecar. Writes land in a temporary file that is
/// renamed into place, so readers never see a half-written value.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    /// The directory is created lazily on first write
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.{}", file_stem(key), VALUE_EXTENSION))
    }

    fn sidecar_for(&self, key: &str) -> Option<PathBuf> {
        let stem = file_stem(key);
        stem.starts_with(DIGEST_PREFIX)
            .then(|| self.base_dir.join(format!("{}.{}", stem, KEY_EXTENSION)))
    }

    /// Keys currently stored, sorted
    pub async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        let mut dir = match fs::read_dir(&self.base_dir).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(keys),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(VALUE_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };

            if stem.starts_with(DIGEST_PREFIX) {
                let sidecar = path.with_extension(KEY_EXTENSION);
                match fs::read(&sidecar).await {
                    Ok(bytes) => keys.extend(String::from_utf8(bytes).ok()),
                    Err(e) if e.kind() == ErrorKind::NotFound => {
                        warn!("Missing key sidecar for {:?}", path);
                    }
                    Err(e) => return Err(e.into()),
                }
            } else if let Some(key) = decode_key(stem) {
                keys.push(key);
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn write_atomically(&self, key: &str, target: &Path, bytes: &[u8]) -> Result<()> {
        let temp = self
            .base_dir
            .join(format!(".{}.tmp", uuid::Uuid::new_v4()));

        if let Err(e) = fs::write(&temp, bytes).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::storage(key, e.to_string()));
        }
        if let Err(e) = fs::rename(&temp, target).await {
            let _ = fs::remove_file(&temp).await;
            return Err(CacheError::storage(key, e.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DurableStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CacheError::storage(key, e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
        fs::create_dir_all(&self.base_dir).await?;

        // Sidecar first so a listed value always has its key
        if let Some(sidecar) = self.sidecar_for(key) {
            self.write_atomically(key, &sidecar, key.as_bytes()).await?;
        }
        self.write_atomically(key, &self.path_for(key), &value).await?;

        debug!("Wrote {} bytes for key {}", value.len(), key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let existed = match fs::remove_file(self.path_for(key)).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(CacheError::storage(key, e.to_string())),
        };

        if let Some(sidecar) = self.sidecar_for(key) {
            match fs::remove_file(sidecar).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::storage(key, e.to_string())),
            }
        }

        Ok(existed)
    }
}

fn file_stem(key: &str) -> String {
    let encoded = hex::encode(key);
    if encoded.len() <= MAX_HEX_STEM {
        encoded
    } else {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        format!("{}{}", DIGEST_PREFIX, hex::encode(hasher.finalize()))
    }
}

fn decode_key(stem: &str) -> Option<String> {
    hex::decode(stem)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
}

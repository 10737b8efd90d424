use super::memory::{apply, scan};
use crate::domain::KVStoreError;
use crate::ports::{BatchOperation, KeyValueStore, ScanResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// File-backed key-value store.
///
/// Holds the whole map in memory and rewrites a bincode snapshot on every
/// write (temp file + rename).
pub struct FileBackedKVStore {
    data: HashMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
}

impl FileBackedKVStore {
    /// Open the store at `path`, loading an existing snapshot if present.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match std::fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => {
                let data: HashMap<Vec<u8>, Vec<u8>> = bincode::deserialize(&bytes)
                    .map_err(|e| KVStoreError::Corruption(e.to_string()))?;
                info!(
                    "[qn-02] 💾 Loaded {} keys from {} ({} bytes)",
                    data.len(),
                    path.display(),
                    bytes.len()
                );
                data
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("[qn-02] 📁 No existing storage file at {}", path.display());
                HashMap::new()
            }
            Err(e) => return Err(KVStoreError::Io(e.to_string())),
        };

        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save_to_file(&self) -> Result<(), KVStoreError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KVStoreError::Io(e.to_string()))?;
        }

        let bytes =
            bincode::serialize(&self.data).map_err(|e| KVStoreError::Corruption(e.to_string()))?;

        let temp_path = self.path.with_extension("tmp");
        let mut file =
            std::fs::File::create(&temp_path).map_err(|e| KVStoreError::Io(e.to_string()))?;
        file.write_all(&bytes)
            .map_err(|e| KVStoreError::Io(e.to_string()))?;
        file.sync_all()
            .map_err(|e| KVStoreError::Io(e.to_string()))?;

        std::fs::rename(&temp_path, &self.path).map_err(|e| KVStoreError::Io(e.to_string()))
    }
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), KVStoreError> {
        self.atomic_batch_write(vec![BatchOperation::put(key, value)])
    }

    fn delete(&mut self, key: &[u8]) -> Result<(), KVStoreError> {
        self.atomic_batch_write(vec![BatchOperation::delete(key)])
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let previous = self.data.clone();
        apply(&mut self.data, operations);
        if let Err(e) = self.save_to_file() {
            // Keep memory consistent with what is on disk.
            self.data = previous;
            return Err(e);
        }
        Ok(())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<ScanResult, KVStoreError> {
        Ok(scan(&self.data, prefix))
    }
}

use super::{MemoryStore, NodeDescriptor, SinkWriteError, StateStore};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// [`MemoryStore`] persisted as a JSON snapshot.
///
/// The file is loaded on open so nodes created by an earlier run are not
/// created again, and rewritten on every [`StateStore::flush`].
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    dirty: bool,
}

impl JsonFileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkWriteError> {
        let path = path.as_ref().to_path_buf();
        let inner = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let store: MemoryStore = serde_json::from_str(&contents)?;
            info!("Loaded {} state nodes from {}", store.len(), path.display());
            store
        } else {
            debug!("State file {} does not exist yet", path.display());
            MemoryStore::new()
        };

        Ok(Self {
            path,
            inner,
            dirty: false,
        })
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }
}

impl StateStore for JsonFileStore {
    fn ensure_node(&mut self, path: &str, descriptor: &NodeDescriptor) -> Result<bool, SinkWriteError> {
        let created = self.inner.ensure_node(path, descriptor)?;
        self.dirty |= created;
        Ok(created)
    }

    fn write_value(&mut self, path: &str, value: serde_json::Value) -> Result<(), SinkWriteError> {
        self.inner.write_value(path, value)?;
        self.dirty = true;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkWriteError> {
        if !self.dirty {
            return Ok(());
        }

        // Write next to the target and rename so a crash never leaves half a file.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(&self.inner)?)?;
        fs::rename(&tmp, &self.path)?;
        self.dirty = false;
        debug!("Saved {} state nodes to {}", self.inner.len(), self.path.display());
        Ok(())
    }
}

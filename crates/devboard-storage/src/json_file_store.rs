use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use devboard_core::{
    store::{storage_err, StoreError, TaskStore},
    tasks::{decode_tasks, encode_tasks, Task},
};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

/// Task store backed by a single pretty-printed JSON file. Every save rewrites
/// the whole file through a temp file in the same directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TaskStore for JsonFileStore {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Vec<Task>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("task file missing, starting empty");
                return Ok(Vec::new());
            }
            Err(err) => return Err(storage_err(err)),
        };
        let tasks = decode_tasks(&bytes)?;
        debug!(count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    #[instrument(skip_all, fields(path = %self.path.display(), count = tasks.len()))]
    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let bytes = encode_tasks(tasks).map_err(storage_err)?;
        write_atomically(&self.path, &bytes)
    }
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(storage_err)?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(storage_err)?;
    tmp.write_all(bytes).map_err(storage_err)?;
    tmp.flush().map_err(storage_err)?;
    tmp.persist(path).map_err(|e| storage_err(e.error))?;
    Ok(())
}

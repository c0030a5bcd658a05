use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{storage_err, StoreError, TaskStore};
use crate::tasks::{decode_tasks, encode_tasks, Task};

/// In-memory store for tests and smoke runs. It keeps the encoded document so
/// every load goes through the same decode and normalization as the file store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTaskStore {
    inner: Arc<Mutex<Option<Vec<u8>>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a raw document, e.g. legacy JSON.
    pub fn with_document(document: impl Into<Vec<u8>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(document.into()))),
        }
    }

    /// The currently stored document, if anything was ever written.
    pub fn document(&self) -> Option<Vec<u8>> {
        self.inner.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn load(&self) -> Result<Vec<Task>, StoreError> {
        let guard = self
            .inner
            .lock()
            .map_err(|err| storage_err(format!("lock poisoned: {err}")))?;
        match guard.as_deref() {
            Some(bytes) => Ok(decode_tasks(bytes)?),
            None => Ok(Vec::new()),
        }
    }

    async fn save(&self, tasks: &[Task]) -> Result<(), StoreError> {
        let bytes = encode_tasks(tasks).map_err(storage_err)?;
        let mut guard = self
            .inner
            .lock()
            .map_err(|err| storage_err(format!("lock poisoned: {err}")))?;
        *guard = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::{LoadError, TaskStatus};

    #[tokio::test]
    async fn empty_store_loads_nothing() {
        let store = InMemoryTaskStore::new();
        let tasks = store.load().await.expect("load");
        assert!(tasks.is_empty());
        assert!(store.document().is_none());
    }

    #[tokio::test]
    async fn saves_and_reloads_normalized_tasks() {
        let store = InMemoryTaskStore::with_document(
            r#"[{"id": 3, "title": "Legacy", "done": true, "link": "docs/a.md"}]"#,
        );
        let tasks = store.load().await.expect("load");
        assert_eq!(tasks[0].status, TaskStatus::Done);

        store.save(&tasks).await.expect("save");
        let reloaded = store.load().await.expect("reload");
        assert_eq!(reloaded, tasks);

        let text = String::from_utf8(store.document().expect("document")).expect("utf8");
        assert!(text.contains("\"code_link\": \"docs/a.md\""));
        assert!(!text.contains("\"link\""));
    }

    #[tokio::test]
    async fn surfaces_untrusted_documents() {
        let store = InMemoryTaskStore::with_document(r#"[{"title": "no id"}]"#);
        let err = store.load().await.expect_err("should fail");
        assert_eq!(err, StoreError::Load(LoadError::MissingId { index: 0 }));
    }

    #[tokio::test]
    async fn later_save_wins() {
        let store = InMemoryTaskStore::with_document(r#"[{"id": 1, "title": "a"}]"#);

        let mut first = store.load().await.expect("load first");
        let mut second = store.load().await.expect("load second");

        first[0].blocked = true;
        store.save(&first).await.expect("save first");
        second[0].in_sprint = true;
        store.save(&second).await.expect("save second");

        let tasks = store.load().await.expect("load");
        assert!(tasks[0].in_sprint);
        assert!(!tasks[0].blocked, "earlier mutation is silently lost");
    }
}

use super::object_store::{validate_key, ObjectStore};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct MemoryObject {
    body: String,
    content_type: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, MemoryObject>,
    /// 对象名包含这些片段时写入 / 复制 / 删除失败
    failing_fragments: Vec<String>,
}

/// 进程内对象存储
///
/// clone 之后共享同一份数据。
#[derive(Debug, Clone, Default)]
pub struct MemoryObjectStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 直接写入对象并指定创建时间
    pub fn insert_with_created_at(&self, key: &str, body: &str, created_at: DateTime<Utc>) {
        self.lock().objects.insert(
            key.to_string(),
            MemoryObject {
                body: body.to_string(),
                content_type: super::CONTENT_TYPE_TEXT.to_string(),
                created_at,
            },
        );
    }

    /// 让对象名包含 `fragment` 的写操作失败
    pub fn fail_writes_matching(&self, fragment: impl Into<String>) {
        self.lock().failing_fragments.push(fragment.into());
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.lock().objects.get(key).map(|o| o.content_type.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().objects.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().objects.keys().cloned().collect()
    }

    fn check_writable(inner: &Inner, op: &'static str, key: &str) -> Result<(), StorageError> {
        if inner.failing_fragments.iter().any(|f| key.contains(f.as_str())) {
            return Err(StorageError::Io {
                op,
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "injected failure"),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn download_text(&self, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        self.lock()
            .objects
            .get(key)
            .map(|o| o.body.clone())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn upload_text(
        &self,
        key: &str,
        body: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut inner = self.lock();
        Self::check_writable(&inner, "写入对象", key)?;
        inner.objects.insert(
            key.to_string(),
            MemoryObject {
                body: body.to_string(),
                content_type: content_type.to_string(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        Ok(self
            .lock()
            .objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn created_at(&self, key: &str) -> Result<DateTime<Utc>, StorageError> {
        self.lock()
            .objects
            .get(key)
            .map(|o| o.created_at)
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock();
        Self::check_writable(&inner, "删除对象", key)?;
        inner
            .objects
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        validate_key(to)?;
        let mut inner = self.lock();
        Self::check_writable(&inner, "复制对象", to)?;
        let source = inner
            .objects
            .get(from)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: from.to_string(),
            })?;
        inner.objects.insert(
            to.to_string(),
            MemoryObject {
                created_at: Utc::now(),
                ..source
            },
        );
        Ok(())
    }

    fn describe(&self) -> String {
        "memory://".to_string()
    }
}

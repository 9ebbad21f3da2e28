//! 本地目录存储
//!
//! 把一个目录当作 bucket，对象名中的 `/` 对应子目录。

use super::object_store::{validate_key, ObjectStore};
use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// 本地目录存储
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    base_path: PathBuf,
}

impl LocalObjectStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(key
            .split('/')
            .fold(self.base_path.clone(), |path, seg| path.join(seg)))
    }

    async fn ensure_parent(&self, path: &Path, key: &str) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::io("创建目录", key, e))?;
        }
        Ok(())
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().to_string())
            .collect();
        Some(parts.join("/"))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn ensure_bucket(&self) -> Result<(), StorageError> {
        if !fs::try_exists(&self.base_path).await.unwrap_or(false) {
            fs::create_dir_all(&self.base_path)
                .await
                .map_err(|e| StorageError::io("创建 bucket", self.describe(), e))?;
            info!("✓ 已创建存储目录: {}", self.base_path.display());
        }
        Ok(())
    }

    async fn download_text(&self, key: &str) -> Result<String, StorageError> {
        let path = self.object_path(key)?;
        fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::io("读取对象", key, e))
    }

    async fn upload_text(
        &self,
        key: &str,
        body: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        self.ensure_parent(&path, key).await?;
        fs::write(&path, body)
            .await
            .map_err(|e| StorageError::io("写入对象", key, e))?;
        debug!("上传对象: {} ({}, {} 字节)", key, content_type, body.len());
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        let mut pending = vec![self.base_path.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::io("列出目录", dir.display().to_string(), e)),
            };

            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| StorageError::io("列出目录", dir.display().to_string(), e))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| StorageError::io("读取文件类型", path.display().to_string(), e))?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if let Some(key) = self.key_for(&path) {
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }

    async fn created_at(&self, key: &str) -> Result<DateTime<Utc>, StorageError> {
        let path = self.object_path(key)?;
        let metadata = fs::metadata(&path)
            .await
            .map_err(|e| StorageError::io("读取元数据", key, e))?;
        // 部分文件系统不记录创建时间，退回到修改时间
        let time = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| StorageError::io("读取创建时间", key, e))?;
        Ok(DateTime::<Utc>::from(time))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.object_path(key)?;
        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::io("删除对象", key, e))?;
        debug!("删除对象: {}", key);
        Ok(())
    }

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError> {
        let source = self.object_path(from)?;
        let target = self.object_path(to)?;
        self.ensure_parent(&target, to).await?;
        fs::copy(&source, &target)
            .await
            .map_err(|e| StorageError::io("复制对象", from, e))?;
        debug!("复制对象: {} → {}", from, to);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.base_path.display())
    }
}

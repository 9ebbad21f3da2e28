use crate::error::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// 对象存储能力
///
/// 对象名使用 `/` 分隔的前缀，例如 `avm_results/rentcast_avm_20250101_001.json`。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// bucket 不存在时创建
    async fn ensure_bucket(&self) -> Result<(), StorageError>;

    /// 以文本形式下载对象
    async fn download_text(&self, key: &str) -> Result<String, StorageError>;

    /// 上传文本（覆盖已有对象）
    async fn upload_text(&self, key: &str, body: &str, content_type: &str)
        -> Result<(), StorageError>;

    /// 列出指定前缀下的所有对象名（排序后返回）
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// 对象创建时间
    async fn created_at(&self, key: &str) -> Result<DateTime<Utc>, StorageError>;

    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    async fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;

    /// 日志中显示的存储位置
    fn describe(&self) -> String;
}

/// 校验对象名：不能为空、不能以 `/` 开头、不能包含 `..` 段
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = key.trim().is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if invalid {
        return Err(StorageError::InvalidKey {
            key: key.to_string(),
        });
    }
    Ok(())
}

/// 拼接前缀和文件名
pub(crate) fn join_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

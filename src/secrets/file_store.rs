use super::{SecretPayload, SecretStore};
use crate::error::SecretError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

/// 目录形式的密钥存储
///
/// `<dir>/<name>` 存放密钥内容，可选的 `<dir>/<name>.sha256` 存放校验和。
#[derive(Debug, Clone)]
pub struct FileSecretStore {
    dir: PathBuf,
}

impl FileSecretStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    async fn fetch_latest(&self, name: &str) -> Result<SecretPayload, SecretError> {
        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(SecretError::NotFound {
                name: name.to_string(),
            });
        }

        let path = self.dir.join(name);
        let data = fs::read(&path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                SecretError::NotFound {
                    name: name.to_string(),
                }
            } else {
                SecretError::ReadFailed {
                    name: name.to_string(),
                    source,
                }
            }
        })?;

        let checksum_path = self.dir.join(format!("{}.sha256", name));
        let checksum = match fs::read_to_string(&checksum_path).await {
            Ok(text) => text.split_whitespace().next().map(str::to_string),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(source) => {
                return Err(SecretError::ReadFailed {
                    name: name.to_string(),
                    source,
                })
            }
        };

        debug!("读取密钥 {}（校验和: {}）", name, checksum.is_some());

        Ok(SecretPayload {
            name: name.to_string(),
            data,
            checksum,
        })
    }
}

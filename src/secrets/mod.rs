//! 密钥获取
//!
//! API Key 的来源优先级：命令行 / 配置文件 > 密钥存储 > 环境变量
//! （`AVM_API_KEY`，其次 `RENTCAST_API_KEY`）。
//! 密钥存储读取失败属于启动阶段的致命错误，不会回退到环境变量。

mod file_store;

pub use file_store::FileSecretStore;

use crate::error::{AppError, ConfigError, SecretError};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

/// 存放 API Key 的环境变量，按顺序查找
pub const API_KEY_ENV_VARS: [&str; 2] = ["AVM_API_KEY", "RENTCAST_API_KEY"];

/// 第一个非空的 API Key 环境变量
pub fn api_key_from_env() -> Option<String> {
    API_KEY_ENV_VARS
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// 密钥内容及其校验和
#[derive(Debug, Clone)]
pub struct SecretPayload {
    pub name: String,
    pub data: Vec<u8>,
    /// 十六进制 SHA-256；存储端没有提供时为空
    pub checksum: Option<String>,
}

impl SecretPayload {
    /// 校验内容完整性并返回去除首尾空白的文本
    pub fn verify(self) -> Result<String, SecretError> {
        if let Some(expected) = &self.checksum {
            let actual = hex::encode(Sha256::digest(&self.data));
            if !actual.eq_ignore_ascii_case(expected.trim()) {
                return Err(SecretError::ChecksumMismatch {
                    name: self.name,
                    expected: expected.trim().to_string(),
                    actual,
                });
            }
        }

        let text = String::from_utf8(self.data).map_err(|_| SecretError::InvalidPayload {
            name: self.name.clone(),
        })?;
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(SecretError::InvalidPayload { name: self.name });
        }
        Ok(text)
    }
}

/// 密钥存储
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// 读取指定名称的最新版本
    async fn fetch_latest(&self, name: &str) -> Result<SecretPayload, SecretError>;
}

/// 按优先级解析 API Key
///
/// # 参数
/// - `explicit`: 命令行或配置文件中显式给出的 key
/// - `store`: 密钥存储及密钥名（未配置时跳过）
/// - `env_value`: 环境变量中的值
pub async fn resolve_api_key(
    explicit: Option<&str>,
    store: Option<(&dyn SecretStore, &str)>,
    env_value: Option<String>,
) -> Result<String, AppError> {
    if let Some(key) = explicit.map(str::trim).filter(|k| !k.is_empty()) {
        info!("🔑 使用显式指定的 API Key");
        return Ok(key.to_string());
    }

    if let Some((store, name)) = store {
        let key = store.fetch_latest(name).await?.verify()?;
        info!("🔑 已从密钥存储读取 API Key ({})", name);
        return Ok(key);
    }

    match env_value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(key) => {
            info!("🔑 使用环境变量中的 API Key");
            Ok(key)
        }
        None => {
            warn!("未找到 API Key");
            Err(ConfigError::MissingApiKey.into())
        }
    }
}

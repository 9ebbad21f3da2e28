//! 输入记录读取服务 - 业务能力层
//!
//! 读取失败时退化为"没有记录"，由调用方提前结束本次运行。

use crate::config::{Config, InputFormat};
use crate::error::{SourceError, StorageError};
use crate::models::{parse_address_list, parse_portfolio, PropertyQueryRecord};
use crate::storage::ObjectStore;
use tracing::{error, info, warn};

/// 输入记录来源
pub struct RecordSource<'a> {
    store: &'a dyn ObjectStore,
    object: String,
    format: InputFormat,
}

impl<'a> RecordSource<'a> {
    pub fn new(store: &'a dyn ObjectStore, config: &Config) -> Self {
        Self::with_object(store, config.input_object.clone(), config.input_format)
    }

    pub fn with_object(store: &'a dyn ObjectStore, object: impl Into<String>, format: InputFormat) -> Self {
        Self {
            store,
            object: object.into(),
            format,
        }
    }

    /// 读取并解析，错误原样返回
    pub async fn try_load(&self) -> Result<Vec<PropertyQueryRecord>, SourceError> {
        let content = self.store.download_text(&self.object).await?;
        match self.format {
            InputFormat::Portfolio => parse_portfolio(&content),
            InputFormat::AddressList => Ok(parse_address_list(&content)),
        }
    }

    /// 读取记录；任何错误都记录日志并返回空列表
    pub async fn load(&self) -> Vec<PropertyQueryRecord> {
        info!("📁 正在读取输入: {} ({:?})", self.object, self.format);
        match self.try_load().await {
            Ok(records) => records,
            Err(SourceError::Storage(StorageError::NotFound { key })) => {
                warn!("⚠️ 输入文件不存在: {}", key);
                Vec::new()
            }
            Err(e) => {
                error!("❌ 读取输入失败 ({}): {}", self.object, e);
                Vec::new()
            }
        }
    }
}

//! 批次结果写入服务 - 业务能力层
//!
//! 只负责"把一批结果写入存储"，不关心批次如何划分

use crate::config::Config;
use crate::error::StorageError;
use crate::models::ValuationOutcome;
use crate::services::csv_export;
use crate::storage::{join_key, ObjectStore, CONTENT_TYPE_JSON};
use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

const CONTENT_TYPE_CSV: &str = "text/csv";

/// 批次结果写入服务
///
/// 文件名：`<results_prefix>/<file_prefix>_<YYYYMMDD>_<批次号三位>.json`。
/// 只包含日期，同一天的两次运行会互相覆盖。
pub struct ResultSink<'a> {
    store: &'a dyn ObjectStore,
    results_prefix: String,
    file_prefix: String,
    run_date: NaiveDate,
    write_csv: bool,
}

impl<'a> ResultSink<'a> {
    pub fn new(store: &'a dyn ObjectStore, config: &Config) -> Self {
        Self {
            store,
            results_prefix: config.results_prefix.clone(),
            file_prefix: config.file_prefix.clone(),
            run_date: Utc::now().date_naive(),
            write_csv: config.write_csv,
        }
    }

    /// 指定文件名中的日期
    pub fn with_date(mut self, run_date: NaiveDate) -> Self {
        self.run_date = run_date;
        self
    }

    fn batch_stem(&self, batch_index: usize) -> String {
        let name = format!(
            "{}_{}_{:03}",
            self.file_prefix,
            self.run_date.format("%Y%m%d"),
            batch_index
        );
        join_key(&self.results_prefix, &name)
    }

    /// 批次 JSON 文件名
    pub fn batch_key(&self, batch_index: usize) -> String {
        format!("{}.json", self.batch_stem(batch_index))
    }

    /// 写入一批结果
    ///
    /// # 返回
    /// 成功时返回 JSON 对象名；CSV 写入失败只记录警告
    pub async fn persist(
        &self,
        batch_index: usize,
        outcomes: &[ValuationOutcome],
    ) -> Result<String, StorageError> {
        let key = self.batch_key(batch_index);
        let body = serde_json::to_string_pretty(outcomes).map_err(|e| StorageError::Serialize {
            key: key.clone(),
            reason: e.to_string(),
        })?;

        self.store.upload_text(&key, &body, CONTENT_TYPE_JSON).await?;
        info!("💾 第 {} 批结果已写入: {} ({} 条)", batch_index, key, outcomes.len());

        if self.write_csv {
            self.persist_csv(batch_index, outcomes).await;
        }

        Ok(key)
    }

    async fn persist_csv(&self, batch_index: usize, outcomes: &[ValuationOutcome]) {
        let key = format!("{}.csv", self.batch_stem(batch_index));
        let body = match csv_export::outcomes_to_csv(outcomes) {
            Ok(body) => body,
            Err(e) => {
                warn!("⚠️ 第 {} 批 CSV 生成失败: {}", batch_index, e);
                return;
            }
        };
        match self.store.upload_text(&key, &body, CONTENT_TYPE_CSV).await {
            Ok(()) => info!("💾 第 {} 批 CSV 已写入: {}", batch_index, key),
            Err(e) => warn!("⚠️ 第 {} 批 CSV 写入失败: {}", batch_index, e),
        }
    }
}

//! 批次执行器 - 编排层
//!
//! ## 职责
//!
//! 把记录列表切成固定大小的批次，逐条估值，每批结束后写入一次结果。
//!
//! ## 约定
//!
//! 1. **顺序执行**：批次按顺序处理，批内记录按顺序请求
//! 2. **结果对齐**：每条记录恰好产生一条结果，顺序与输入一致
//! 3. **失败隔离**：单条记录失败、单批写入失败都不会中断后续批次

use crate::clients::{ValuationApi, ValuationQuery};
use crate::error::QueryError;
use crate::models::{BatchStats, HasAddress, RunSummary, ValuationOutcome};
use crate::services::ResultSink;
use crate::utils::logging::{log_batch_complete, log_batch_start};
use crate::utils::truncate_text;
use serde_json::Value;
use std::ops::Range;
use tracing::{error, info, warn};

/// 日志中错误信息的最大长度
const LOG_MESSAGE_LIMIT: usize = 200;

/// 把 `len` 条记录切成若干连续区间
///
/// 除最后一个外每个区间长度都等于 `capacity`；`len == 0` 时返回空列表。
pub fn batch_ranges(len: usize, capacity: usize) -> Vec<Range<usize>> {
    let capacity = capacity.max(1);
    (0..len)
        .step_by(capacity)
        .map(|start| start..(start + capacity).min(len))
        .collect()
}

/// 批次执行器
pub struct BatchRunner<'a> {
    api: &'a dyn ValuationApi,
    sink: &'a ResultSink<'a>,
    capacity: usize,
}

impl<'a> BatchRunner<'a> {
    pub fn new(api: &'a dyn ValuationApi, sink: &'a ResultSink<'a>, capacity: usize) -> Self {
        Self {
            api,
            sink,
            capacity: capacity.max(1),
        }
    }

    /// 处理全部记录
    ///
    /// # 参数
    /// - `records`: 待估值记录
    /// - `build`: 把记录转换成请求；失败的记录直接记为错误结果，不发请求
    ///
    /// # 返回
    /// 本次运行的统计
    pub async fn run<R, F>(&self, records: &[R], build: F) -> RunSummary
    where
        R: HasAddress + Sync,
        F: Fn(&R) -> Result<ValuationQuery, QueryError>,
    {
        let ranges = batch_ranges(records.len(), self.capacity);
        let total_batches = ranges.len();
        let mut summary = RunSummary {
            total: records.len(),
            ..Default::default()
        };

        for (idx, range) in ranges.into_iter().enumerate() {
            let batch_num = idx + 1;
            log_batch_start(
                batch_num,
                total_batches,
                range.start + 1,
                range.end,
                records.len(),
            );

            let (outcomes, stats) = self.process_batch(&records[range], &build).await;

            if let Err(e) = self.sink.persist(batch_num, &outcomes).await {
                error!("❌ 第 {} 批结果写入失败: {}", batch_num, e);
                summary.failed_batches.push(batch_num);
            }

            summary.absorb(&stats);
            log_batch_complete(batch_num, &stats);
        }

        summary
    }

    /// 逐条估值；每条结果的地址与原记录完全一致
    async fn process_batch<R, F>(
        &self,
        batch: &[R],
        build: &F,
    ) -> (Vec<ValuationOutcome>, BatchStats)
    where
        R: HasAddress + Sync,
        F: Fn(&R) -> Result<ValuationQuery, QueryError>,
    {
        let mut outcomes = Vec::with_capacity(batch.len());
        let mut stats = BatchStats::default();

        for record in batch {
            let outcome = match build(record) {
                Ok(query) => self.api.query(&query).await.with_address(record.address()),
                Err(e) => ValuationOutcome::transport_error(record.address(), e.to_string()),
            };
            stats.record(outcome.is_success());

            match &outcome {
                ValuationOutcome::Success { address, payload } => log_valuation(address, payload),
                ValuationOutcome::Error {
                    address,
                    code,
                    message,
                } => warn!(
                    "✗ {} [{}]: {}",
                    address,
                    code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                    truncate_text(message, LOG_MESSAGE_LIMIT)
                ),
            }
            outcomes.push(outcome);
        }

        (outcomes, stats)
    }
}

/// 单条估值摘要：目标房产、估价区间、comparable 数量
fn log_valuation(address: &str, payload: &Value) {
    let subject = payload
        .pointer("/subjectProperty/formattedAddress")
        .and_then(Value::as_str)
        .unwrap_or(address);
    let field = |key: &str| {
        payload
            .get(key)
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let comps = payload
        .get("comparables")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);

    info!(
        "✓ {} | 估价 {} ({} - {}) | comparables: {}",
        subject,
        field("price"),
        field("priceRangeLow"),
        field("priceRangeHigh"),
        comps
    );
}

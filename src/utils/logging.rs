//! 日志工具模块
//!
//! - `init` 安装 tracing 订阅器：同时输出到 stderr 和本次运行的 [`RunLog`]
//! - 其余函数负责批处理各阶段的日志格式

use crate::config::Config;
use crate::models::{BatchStats, RunSummary};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// 本次运行的日志缓冲
///
/// 运行结束后整体上传到存储；clone 之后共享同一缓冲。
#[derive(Clone, Debug, Default)]
pub struct RunLog {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl RunLog {
    /// 创建日志缓冲并写入文件头
    pub fn new() -> Self {
        let log = Self::default();
        let header = format!(
            "{}\nAVM 批处理日志 - {}\n{}\n\n",
            "=".repeat(60),
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            "=".repeat(60)
        );
        log.append(&header);
        log
    }

    pub fn append(&self, text: &str) {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.extend_from_slice(text.as_bytes());
    }

    pub fn contents(&self) -> String {
        let buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// 写入 [`RunLog`] 的 writer
pub struct RunLogWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl Write for RunLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for RunLog {
    type Writer = RunLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RunLogWriter {
            buffer: self.buffer.clone(),
        }
    }
}

/// 初始化日志
///
/// `RUST_LOG` 优先；未设置时默认 `info`，`verbose` 为真时为 `debug`。
pub fn init(verbose: bool) -> RunLog {
    let run_log = RunLog::new();
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(run_log.clone()))
        .try_init();

    if installed.is_err() {
        warn!("日志订阅器已存在，运行日志不会被收集");
    }
    run_log
}

/// 记录程序启动信息
pub fn log_startup(config: &Config, storage: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - AVM 批量估值");
    info!("📦 每批记录数: {}", config.batch_capacity);
    info!("🏠 compCount: {}", config.comp_count());
    info!("🗄️ 存储位置: {}", storage);
    info!("{}", "=".repeat(60));
}

/// 记录输入加载信息
pub fn log_records_loaded(total: usize, batch_capacity: usize) {
    info!("✓ 找到 {} 条待处理的记录", total);
    info!("📋 将以每批 {} 条的方式处理", batch_capacity);
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号（从 1 开始）
/// - `total_batches`: 批次总数
/// - `start`: 起始记录编号（从 1 开始）
/// - `end`: 结束记录编号
/// - `total`: 记录总数
pub fn log_batch_start(batch_num: usize, total_batches: usize, start: usize, end: usize, total: usize) {
    info!("{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批记录: {}-{} / 共 {} 条", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, stats: &BatchStats) {
    info!("{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}",
        batch_num,
        stats.success,
        stats.total()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary) {
    info!("{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.success, summary.total);
    info!("❌ 失败: {}", summary.errors);
    if let Some(rate) = summary.success_rate() {
        info!("📈 成功率: {:.1}%", rate * 100.0);
    }
    if !summary.all_persisted() {
        warn!("⚠️ 写入失败的批次: {:?}", summary.failed_batches);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

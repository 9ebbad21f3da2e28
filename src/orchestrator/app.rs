//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：校验配置、解析 API Key、创建存储和估值客户端
//! 2. **运行前清理**：按保留策略清理日志区和 processed 区
//! 3. **批量估值**：读取输入并交给 [`BatchRunner`]
//! 4. **运行后整理**：把输入文件移动到 processed 区
//! 5. **上传运行日志**：无论成功与否都会执行
//!
//! 只有 `initialize` 会返回错误；`run` 内部的任何失败（包括 panic）都只记录日志。
//! 有批次写入失败时不移动输入文件。

use crate::clients::{QueryParams, RentCastClient, StubValuationClient, ValuationApi};
use crate::config::Config;
use crate::models::RunSummary;
use crate::orchestrator::batch_runner::BatchRunner;
use crate::secrets::{self, FileSecretStore, SecretStore};
use crate::services::{LifecycleManager, RecordSource, ResultSink};
use crate::storage::{join_key, LocalObjectStore, MemoryObjectStore, ObjectStore, CONTENT_TYPE_TEXT};
use crate::utils::logging::{self, RunLog};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{error, info, warn};

/// 启动选项（来自命令行，不进入配置文件）
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// 使用样例估值且只在内存中写结果
    pub dry_run: bool,
}

/// 应用主结构
pub struct App {
    config: Config,
    store: Box<dyn ObjectStore>,
    api: Box<dyn ValuationApi>,
    run_log: RunLog,
    started_at: DateTime<Utc>,
}

impl App {
    /// 初始化应用
    ///
    /// 配置不合法、密钥获取失败、存储不可用时返回错误。
    pub async fn initialize(config: Config, options: RunOptions, run_log: RunLog) -> Result<Self> {
        let config = config.normalize().context("配置校验失败")?;

        let local = LocalObjectStore::new(&config.storage_root);
        local
            .ensure_bucket()
            .await
            .with_context(|| format!("无法准备存储目录 {}", config.storage_root))?;

        let (store, api): (Box<dyn ObjectStore>, Box<dyn ValuationApi>) = if options.dry_run {
            info!("🧪 演示模式: 使用样例估值，结果只写入内存");
            let memory = seed_dry_run_store(&local, &config.input_object).await;
            let stub = StubValuationClient::new().context("样例估值数据损坏")?;
            (Box::new(memory), Box::new(stub))
        } else {
            let api_key = resolve_api_key(&config, secrets::api_key_from_env()).await?;
            let client = RentCastClient::new(
                &api_key,
                &config.api_base_url,
                Duration::from_secs(config.request_timeout_secs),
            )
            .context("无法创建估值客户端")?;
            (Box::new(local), Box::new(client))
        };

        logging::log_startup(&config, &store.describe());

        Ok(Self::from_parts(config, store, api, run_log))
    }

    /// 用现成的组件组装应用
    pub fn from_parts(
        config: Config,
        store: Box<dyn ObjectStore>,
        api: Box<dyn ValuationApi>,
        run_log: RunLog,
    ) -> Self {
        Self {
            config,
            store,
            api,
            run_log,
            started_at: Utc::now(),
        }
    }

    /// 本次运行日志的对象名
    pub fn run_log_key(&self) -> String {
        let name = format!("avm_run_{}.log", self.started_at.format("%Y%m%d_%H%M%S"));
        join_key(&self.config.logs_prefix, &name)
    }

    /// 运行应用主逻辑
    ///
    /// 运行中的错误和 panic 都不会向外传播；结束时总会上传运行日志。
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        match AssertUnwindSafe(self.execute(&mut summary)).catch_unwind().await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("❌ 运行中断: {:#}", e),
            Err(panic) => error!("💥 运行中发生 panic: {}", panic_message(panic.as_ref())),
        }

        self.upload_run_log().await;
        summary
    }

    async fn execute(&self, summary: &mut RunSummary) -> Result<()> {
        let store = self.store.as_ref();
        let lifecycle = LifecycleManager::new(store, &self.config);

        self.cleanup(&lifecycle).await;

        let records = RecordSource::new(store, &self.config).load().await;
        if records.is_empty() {
            warn!("⚠️ 没有找到待处理的记录，程序结束");
            return Ok(());
        }
        logging::log_records_loaded(records.len(), self.config.batch_capacity);

        let sink = ResultSink::new(store, &self.config);
        let runner = BatchRunner::new(self.api.as_ref(), &sink, self.config.batch_capacity);
        let params = QueryParams::from_config(&self.config);

        *summary = runner.run(&records, |record| params.build(record)).await;
        logging::print_final_stats(summary);

        if !summary.all_persisted() {
            warn!(
                "⚠️ 第 {:?} 批结果未写入，保留输入文件 {} 以便重跑",
                summary.failed_batches, self.config.input_object
            );
            return Ok(());
        }

        lifecycle
            .move_input_to_processed()
            .await
            .with_context(|| format!("无法移动输入文件 {}", self.config.input_object))?;

        Ok(())
    }

    async fn cleanup(&self, lifecycle: &LifecycleManager<'_>) {
        info!("🧹 清理过期文件...");
        if let Err(e) = lifecycle
            .cleanup_old_logs(self.config.log_retention_days)
            .await
        {
            error!("❌ 清理日志失败: {}", e);
        }
        if let Err(e) = lifecycle
            .cleanup_old_processed(self.config.processed_retention_days)
            .await
        {
            error!("❌ 清理 processed 文件失败: {}", e);
        }
    }

    async fn upload_run_log(&self) {
        let key = self.run_log_key();
        info!("📝 上传运行日志: {}", key);
        let contents = self.run_log.contents();
        if let Err(e) = self
            .store
            .upload_text(&key, &contents, CONTENT_TYPE_TEXT)
            .await
        {
            error!("❌ 运行日志上传失败: {}", e);
        }
    }
}

/// API Key：命令行 / 配置文件 > 密钥存储 > 环境变量
async fn resolve_api_key(config: &Config, env_value: Option<String>) -> Result<String> {
    let file_store = config
        .secrets_dir
        .as_deref()
        .map(FileSecretStore::new);
    let store = match (&file_store, &config.secret_name) {
        (Some(s), Some(name)) => Some((s as &dyn SecretStore, name.as_str())),
        _ => None,
    };

    let key = secrets::resolve_api_key(config.api_key.as_deref(), store, env_value)
        .await
        .context("无法获取 API Key")?;
    Ok(key)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("未知 panic")
}

/// 演示模式的存储：把本地输入文件复制到内存中
async fn seed_dry_run_store(local: &LocalObjectStore, input_object: &str) -> MemoryObjectStore {
    let memory = MemoryObjectStore::new();
    match local.download_text(input_object).await {
        Ok(body) => memory.insert_with_created_at(input_object, &body, Utc::now()),
        Err(e) => warn!("⚠️ 演示模式读取输入失败: {}", e),
    }
    memory
}

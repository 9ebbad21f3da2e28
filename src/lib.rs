//! # AVM Batch
//!
//! 批量调用 RentCast AVM（自动估值）接口，把结果按批次写入对象存储
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `storage/` - 对象存储抽象 `ObjectStore`，本地目录和内存两种实现
//! - `secrets/` - 密钥存储抽象 `SecretStore`，带 SHA-256 校验
//! - `clients/` - 估值 API 客户端 `ValuationApi`，请求构建器 `ValuationQuery`
//!
//! ### ② 业务能力层（Services）
//! - `RecordSource` - 读取输入记录（JSON 房产列表 / 地址列表）
//! - `ResultSink` - 写入单批结果（JSON，可选 CSV）
//! - `LifecycleManager` - 移动输入文件、清理过期文件
//!
//! ### ③ 编排层（Orchestration）
//! - `orchestrator/batch_runner` - 切分批次、逐条估值、每批写入
//! - `orchestrator/app` - 一次完整运行：清理 → 读取 → 批处理 → 移动 → 上传日志
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod secrets;
pub mod services;
pub mod storage;
pub mod utils;

// 重新导出常用类型
pub use clients::{RentCastClient, StubValuationClient, ValuationApi, ValuationQuery};
pub use config::Config;
pub use error::AppError;
pub use models::{PropertyQueryRecord, RunSummary, ValuationOutcome};
pub use orchestrator::{App, BatchRunner, RunOptions};
pub use services::{LifecycleManager, RecordSource, ResultSink};
pub use storage::{LocalObjectStore, MemoryObjectStore, ObjectStore};

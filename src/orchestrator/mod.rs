//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 初始化（配置、密钥、存储、估值客户端）
//! - 运行前清理、批量估值、移动输入文件
//! - 上传运行日志
//!
//! ### `batch_runner` - 批次执行器
//! - 切分批次，逐条调用估值 API
//! - 每批结束后写入结果，汇总统计
//!
//! ## 层次关系
//!
//! ```text
//! app (一次运行)
//!     ↓
//! batch_runner (Vec<Record> → 批次)
//!     ↓
//! clients::ValuationApi (单条记录)   services::ResultSink (单个批次)
//!     ↓
//! storage::ObjectStore
//! ```

pub mod app;
pub mod batch_runner;

pub use app::{App, RunOptions};
pub use batch_runner::{batch_ranges, BatchRunner};

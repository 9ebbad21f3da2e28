use anyhow::{Context, Result};
use avm_batch::config::{Config, InputFormat};
use avm_batch::orchestrator::{App, RunOptions};
use avm_batch::utils::logging;
use clap::Parser;
use std::path::PathBuf;

/// RentCast AVM 批量估值
#[derive(Parser, Debug)]
#[command(name = "avm-batch")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "批量调用 RentCast AVM 接口并把结果写入存储")]
struct Cli {
    /// TOML 配置文件
    #[arg(short, long, env = "AVM_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// RentCast API Key（优先于密钥存储和环境变量）
    #[arg(long)]
    api_key: Option<String>,

    /// 输入对象名
    #[arg(short, long)]
    input: Option<String>,

    /// 输入格式: portfolio | address_list
    #[arg(short, long)]
    format: Option<InputFormat>,

    /// 每批记录数
    #[arg(short, long)]
    batch_capacity: Option<usize>,

    /// 每个估值返回的 comparable 数量 (1-25)
    #[arg(long)]
    comp_count: Option<i64>,

    /// 额外输出 CSV
    #[arg(long)]
    write_csv: bool,

    /// 使用样例估值，不调用 API，不修改存储
    #[arg(long)]
    dry_run: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 命令行参数覆盖配置
    fn apply(&self, mut config: Config) -> Config {
        if let Some(key) = &self.api_key {
            config.api_key = Some(key.clone());
        }
        if let Some(input) = &self.input {
            config.input_object = input.clone();
        }
        if let Some(format) = self.format {
            config.input_format = format;
        }
        if let Some(capacity) = self.batch_capacity {
            config.batch_capacity = capacity;
        }
        if let Some(comp_count) = self.comp_count {
            config.comp_count = comp_count;
        }
        config.write_csv |= self.write_csv;
        config.verbose_logging |= self.verbose;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // 加载配置
    let config = Config::load(cli.config.as_deref()).context("加载配置失败")?;
    let config = cli.apply(config);

    // 初始化日志
    let run_log = logging::init(config.verbose_logging);

    // 初始化并运行应用
    let options = RunOptions {
        dry_run: cli.dry_run,
    };
    let app = App::initialize(config, options, run_log).await?;
    app.run().await;

    Ok(())
}

//! 程序配置
//!
//! 优先级（低 → 高）：默认值 → TOML 配置文件 → 环境变量 → 命令行参数。
//! 命令行覆盖在 `main.rs` 中完成。

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

/// comp 数量默认值
pub const DEFAULT_COMP_COUNT: u32 = 5;
/// comp 数量上限（API 限制）
pub const MAX_COMP_COUNT: u32 = 25;

/// 输入文件格式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// JSON 数组，每个元素带地址和房屋属性
    Portfolio,
    /// 每行一个地址
    AddressList,
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portfolio" | "json" => Ok(InputFormat::Portfolio),
            "address_list" | "address-list" | "lines" => Ok(InputFormat::AddressList),
            other => Err(format!("未知的输入格式: {}", other)),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    // --- RentCast API 配置 ---
    /// 配置文件或命令行指定的 API Key（优先级最高）
    pub api_key: Option<String>,
    pub api_base_url: String,
    /// 原始 comp 数量，`normalize` 之后保证在 [1, 25]
    pub comp_count: i64,
    pub max_radius: Option<f64>,
    pub days_old: Option<u32>,
    pub lookup_subject_attributes: Option<bool>,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,

    // --- 批处理 ---
    /// 每批记录数
    pub batch_capacity: usize,
    pub input_format: InputFormat,
    /// 输入对象名
    pub input_object: String,
    /// 是否额外输出 CSV
    pub write_csv: bool,

    // --- 存储 ---
    pub storage_root: String,
    pub results_prefix: String,
    pub processed_prefix: String,
    pub logs_prefix: String,
    pub file_prefix: String,
    pub log_retention_days: u32,
    pub processed_retention_days: u32,

    // --- 密钥 ---
    pub secret_name: Option<String>,
    pub secrets_dir: Option<String>,

    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: "https://api.rentcast.io/v1".to_string(),
            comp_count: DEFAULT_COMP_COUNT as i64,
            max_radius: None,
            days_old: None,
            lookup_subject_attributes: None,
            request_timeout_secs: 30,
            batch_capacity: 100,
            input_format: InputFormat::Portfolio,
            input_object: "avm_input/portfolio.json".to_string(),
            write_csv: false,
            storage_root: "./bucket".to_string(),
            results_prefix: "avm_results".to_string(),
            processed_prefix: "avm_processed".to_string(),
            logs_prefix: "avm_logs".to_string(),
            file_prefix: "rentcast_avm".to_string(),
            log_retention_days: 7,
            processed_retention_days: 100,
            secret_name: Some("rentcast-api-key".to_string()),
            secrets_dir: None,
            verbose_logging: false,
        }
    }
}

impl Config {
    /// 读取 TOML 配置文件（缺失字段使用默认值）
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
                path: path.display().to_string(),
                source,
            })?;
        toml::from_str(&content).map_err(|source| ConfigError::FileParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 加载配置：配置文件（可选）+ 环境变量覆盖
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        base.with_env_overrides()
    }

    fn with_env_overrides(self) -> Result<Self, ConfigError> {
        Ok(Self {
            // 环境变量里的 key 只作为最后的回退，见 secrets::api_key_from_env
            api_key: self.api_key,
            api_base_url: env_string("AVM_API_BASE_URL").unwrap_or(self.api_base_url),
            comp_count: env_parse("AVM_COMP_COUNT", self.comp_count)?,
            max_radius: env_parse_opt("AVM_MAX_RADIUS", self.max_radius)?,
            days_old: env_parse_opt("AVM_DAYS_OLD", self.days_old)?,
            lookup_subject_attributes: env_parse_opt(
                "AVM_LOOKUP_SUBJECT_ATTRIBUTES",
                self.lookup_subject_attributes,
            )?,
            request_timeout_secs: env_parse("AVM_REQUEST_TIMEOUT_SECS", self.request_timeout_secs)?,
            batch_capacity: env_parse("AVM_BATCH_CAPACITY", self.batch_capacity)?,
            input_format: env_parse("AVM_INPUT_FORMAT", self.input_format)?,
            input_object: env_string("AVM_INPUT_OBJECT").unwrap_or(self.input_object),
            write_csv: env_parse("AVM_WRITE_CSV", self.write_csv)?,
            storage_root: env_string("AVM_STORAGE_ROOT").unwrap_or(self.storage_root),
            results_prefix: env_string("AVM_RESULTS_PREFIX").unwrap_or(self.results_prefix),
            processed_prefix: env_string("AVM_PROCESSED_PREFIX").unwrap_or(self.processed_prefix),
            logs_prefix: env_string("AVM_LOGS_PREFIX").unwrap_or(self.logs_prefix),
            file_prefix: env_string("AVM_FILE_PREFIX").unwrap_or(self.file_prefix),
            log_retention_days: env_parse("AVM_LOG_RETENTION_DAYS", self.log_retention_days)?,
            processed_retention_days: env_parse(
                "AVM_PROCESSED_RETENTION_DAYS",
                self.processed_retention_days,
            )?,
            secret_name: env_string("AVM_SECRET_NAME").or(self.secret_name),
            secrets_dir: env_string("AVM_SECRETS_DIR").or(self.secrets_dir),
            verbose_logging: env_parse("VERBOSE_LOGGING", self.verbose_logging)?,
        })
    }

    /// 校验并规范化配置
    ///
    /// - `comp_count` 超出 [1, 25] 时回退到默认值并记录警告
    /// - `batch_capacity` 与 `request_timeout_secs` 必须大于 0
    pub fn normalize(mut self) -> Result<Self, ConfigError> {
        self.comp_count = normalize_comp_count(self.comp_count) as i64;

        if self.batch_capacity == 0 {
            return Err(ConfigError::invalid("batch_capacity", "必须大于 0"));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::invalid("request_timeout_secs", "必须大于 0"));
        }
        if self.input_object.trim().is_empty() {
            return Err(ConfigError::invalid("input_object", "不能为空"));
        }
        if let Some(radius) = self.max_radius {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::invalid("max_radius", format!("{}", radius)));
            }
        }
        Ok(self)
    }

    /// 规范化之后的 comp 数量
    pub fn comp_count(&self) -> u32 {
        normalize_comp_count(self.comp_count)
    }
}

/// comp 数量必须在 [1, 25]，否则回退到默认值 5
pub fn normalize_comp_count(value: i64) -> u32 {
    if (1..=MAX_COMP_COUNT as i64).contains(&value) {
        value as u32
    } else {
        warn!(
            "⚠️ compCount 应在 1 到 {} 之间，收到 {}，使用默认值 {}",
            MAX_COMP_COUNT, value, DEFAULT_COMP_COUNT
        );
        DEFAULT_COMP_COUNT
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    Ok(env_parse_opt(name, None)?.unwrap_or(default))
}

fn env_parse_opt<T: FromStr>(name: &str, default: Option<T>) -> Result<Option<T>, ConfigError> {
    match env_string(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comp_count_out_of_range_falls_back() {
        assert_eq!(normalize_comp_count(0), DEFAULT_COMP_COUNT);
        assert_eq!(normalize_comp_count(26), DEFAULT_COMP_COUNT);
        assert_eq!(normalize_comp_count(-3), DEFAULT_COMP_COUNT);
    }

    #[test]
    fn test_comp_count_in_range_passes_through() {
        for value in 1..=25 {
            assert_eq!(normalize_comp_count(value), value as u32);
        }
    }

    #[test]
    fn test_zero_batch_capacity_rejected() {
        let config = Config {
            batch_capacity: 0,
            ..Default::default()
        };
        let err = config.normalize().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "batch_capacity",
                ..
            }
        ));
    }

    #[test]
    fn test_normalize_rewrites_comp_count() {
        let config = Config {
            comp_count: 40,
            ..Default::default()
        }
        .normalize()
        .unwrap();
        assert_eq!(config.comp_count, 5);
        assert_eq!(config.comp_count(), 5);
    }

    #[test]
    fn test_from_file_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("avm.toml");
        std::fs::write(
            &path,
            r#"
batch_capacity = 50
input_format = "address_list"
max_radius = 2.5
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.batch_capacity, 50);
        assert_eq!(config.input_format, InputFormat::AddressList);
        assert_eq!(config.max_radius, Some(2.5));
        assert_eq!(config.log_retention_days, 7);
        assert_eq!(config.processed_retention_days, 100);
        assert_eq!(config.comp_count(), 5);
    }

    #[test]
    fn test_from_file_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "batch_capacity = \"many\"").unwrap();

        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::FileParseFailed { .. })
        ));
    }

    #[test]
    fn test_env_api_key_is_not_treated_as_explicit() {
        std::env::set_var("AVM_API_KEY", "from-env");
        let config = Config::load(None);
        std::env::remove_var("AVM_API_KEY");

        assert_eq!(config.unwrap().api_key, None);
    }

    #[test]
    fn test_input_format_from_str() {
        assert_eq!("portfolio".parse::<InputFormat>(), Ok(InputFormat::Portfolio));
        assert_eq!(
            "address-list".parse::<InputFormat>(),
            Ok(InputFormat::AddressList)
        );
        assert!("xml".parse::<InputFormat>().is_err());
    }
}

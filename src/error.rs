use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 密钥获取错误（启动阶段致命）
    #[error("密钥错误: {0}")]
    Secret(#[from] SecretError),
    /// 对象存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 输入记录读取错误
    #[error("输入错误: {0}")]
    Source(#[from] SourceError),
    /// 请求构建错误
    #[error("请求错误: {0}")]
    Query(#[from] QueryError),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置文件读取失败
    #[error("无法读取配置文件 {path}: {source}")]
    FileReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("无法解析配置文件 {path}: {source}")]
    FileParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 配置值不合法
    #[error("配置项 {field} 不合法: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    /// 缺少 API Key
    #[error("未找到 API Key（命令行参数、密钥存储、环境变量 RENTCAST_API_KEY 均为空）")]
    MissingApiKey,
}

/// 密钥存储错误
#[derive(Debug, Error)]
pub enum SecretError {
    /// 密钥不存在
    #[error("密钥 {name} 不存在")]
    NotFound { name: String },
    /// 读取密钥失败
    #[error("读取密钥 {name} 失败: {source}")]
    ReadFailed {
        name: String,
        #[source]
        source: std::io::Error,
    },
    /// 校验和不匹配
    #[error("密钥 {name} 校验失败: 期望 {expected}, 实际 {actual}")]
    ChecksumMismatch {
        name: String,
        expected: String,
        actual: String,
    },
    /// 密钥内容为空或不是合法 UTF-8
    #[error("密钥 {name} 内容无效")]
    InvalidPayload { name: String },
}

/// 对象存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 对象不存在
    #[error("对象不存在: {key}")]
    NotFound { key: String },
    /// IO 失败
    #[error("{op} 失败 ({key}): {source}")]
    Io {
        op: &'static str,
        key: String,
        #[source]
        source: std::io::Error,
    },
    /// 对象名不合法
    #[error("对象名不合法: {key}")]
    InvalidKey { key: String },
    /// 序列化失败
    #[error("序列化失败 ({key}): {reason}")]
    Serialize { key: String, reason: String },
}

/// 输入记录读取错误
#[derive(Debug, Error)]
pub enum SourceError {
    /// 读取输入对象失败
    #[error("读取输入失败: {0}")]
    Storage(#[from] StorageError),
    /// JSON 解析失败
    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 估值 API 调用错误
///
/// HTTP 状态错误带状态码；传输层失败（超时、DNS、连接重置）不带。
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApiError {
    /// API 返回非 2xx 状态
    #[error("API返回错误响应: status={code}, body={body}")]
    BadStatus { code: u16, body: String },
    /// 2xx 但响应体不是 JSON
    #[error("API响应不是合法 JSON: status={code}")]
    InvalidJson { code: u16, body: String },
    /// 请求未得到响应
    #[error("API请求失败: {0}")]
    Transport(String),
}

/// 请求参数校验错误
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// 地址为空
    #[error("地址不能为空")]
    EmptyAddress,
    /// 数值参数为负数或不是有限数
    #[error("参数 {field} 不合法: {value}")]
    InvalidNumber { field: &'static str, value: f64 },
    /// comp 数量超出范围
    #[error("compCount {0} 超出范围 [1, 25]")]
    CompCountOutOfRange(u32),
}

// ========== 便捷构造函数 ==========

impl StorageError {
    /// 包装 IO 错误；`NotFound` 单独归类
    pub fn io(op: &'static str, key: impl Into<String>, source: std::io::Error) -> Self {
        let key = key.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            StorageError::NotFound { key }
        } else {
            StorageError::Io { op, key, source }
        }
    }
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

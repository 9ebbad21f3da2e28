//! RentCast AVM 客户端
//!
//! 封装所有与估值 API 相关的调用逻辑
use crate::clients::query::ValuationQuery;
use crate::error::ApiError;
use crate::models::ValuationOutcome;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// 估值 API 能力
///
/// 实现方只需要提供 `fetch`；`query` 负责把结果归一成 [`ValuationOutcome`]。
#[async_trait]
pub trait ValuationApi: Send + Sync {
    async fn fetch(&self, query: &ValuationQuery) -> Result<Value, ApiError>;

    async fn query(&self, query: &ValuationQuery) -> ValuationOutcome {
        let address = query.address().to_string();
        match self.fetch(query).await {
            Ok(payload) => ValuationOutcome::success(address, payload),
            Err(ApiError::BadStatus { code, body }) | Err(ApiError::InvalidJson { code, body }) => {
                ValuationOutcome::http_error(address, code, body)
            }
            Err(ApiError::Transport(message)) => ValuationOutcome::transport_error(address, message),
        }
    }
}

/// RentCast API 客户端
pub struct RentCastClient {
    http: reqwest::Client,
    endpoint: String,
}

impl RentCastClient {
    /// 创建新的客户端
    ///
    /// # 参数
    /// - `api_key`: RentCast API Key，放在 `X-Api-Key` 请求头
    /// - `base_url`: 例如 `https://api.rentcast.io/v1`
    /// - `timeout`: 单次请求超时，超时按传输层失败处理，不重试
    pub fn new(api_key: &str, base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| ApiError::Transport(format!("API Key 不是合法的请求头: {}", e)))?;
        key.set_sensitive(true);
        headers.insert("X-Api-Key", key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            http,
            endpoint: format!("{}/avm/value", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ValuationApi for RentCastClient {
    async fn fetch(&self, query: &ValuationQuery) -> Result<Value, ApiError> {
        let url = query
            .to_url(&self.endpoint)
            .map_err(|e| ApiError::Transport(format!("请求地址不合法: {}", e)))?;

        debug!("请求估值: {}", query.address());

        let response = self.http.get(url).send().await.map_err(describe_transport)?;
        let status = response.status();
        let body = response.text().await.map_err(describe_transport)?;

        if !status.is_success() {
            warn!("✗ 估值请求失败 [{}]: {}", status.as_u16(), query.address());
            return Err(ApiError::BadStatus {
                code: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|_| ApiError::InvalidJson {
            code: status.as_u16(),
            body,
        })
    }
}

fn describe_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport(format!("请求超时: {}", err))
    } else if err.is_connect() {
        ApiError::Transport(format!("连接失败: {}", err))
    } else {
        ApiError::Transport(err.to_string())
    }
}

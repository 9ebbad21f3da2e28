use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单次估值调用的结果
///
/// 以 `status` 字段区分成功 / 失败，创建后不再修改。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValuationOutcome {
    Success {
        address: String,
        /// API 原始响应，不做解析
        payload: Value,
    },
    Error {
        address: String,
        /// HTTP 状态码；传输层失败时为空
        #[serde(default)]
        code: Option<u16>,
        message: String,
    },
}

impl ValuationOutcome {
    pub fn success(address: impl Into<String>, payload: Value) -> Self {
        ValuationOutcome::Success {
            address: address.into(),
            payload,
        }
    }

    pub fn http_error(address: impl Into<String>, code: u16, message: impl Into<String>) -> Self {
        ValuationOutcome::Error {
            address: address.into(),
            code: Some(code),
            message: message.into(),
        }
    }

    pub fn transport_error(address: impl Into<String>, message: impl Into<String>) -> Self {
        ValuationOutcome::Error {
            address: address.into(),
            code: None,
            message: message.into(),
        }
    }

    pub fn address(&self) -> &str {
        match self {
            ValuationOutcome::Success { address, .. } | ValuationOutcome::Error { address, .. } => {
                address
            }
        }
    }

    /// 换成指定地址，其余内容不变
    pub fn with_address(self, address: impl Into<String>) -> Self {
        let address = address.into();
        match self {
            ValuationOutcome::Success { payload, .. } => ValuationOutcome::Success { address, payload },
            ValuationOutcome::Error { code, message, .. } => ValuationOutcome::Error {
                address,
                code,
                message,
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ValuationOutcome::Success { .. })
    }

    /// 成功时返回原始响应
    pub fn payload(&self) -> Option<&Value> {
        match self {
            ValuationOutcome::Success { payload, .. } => Some(payload),
            ValuationOutcome::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_with_status_tag() {
        let outcome = ValuationOutcome::success("1 Main St", json!({"price": 250000}));
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(
            value,
            json!({"status": "success", "address": "1 Main St", "payload": {"price": 250000}})
        );
    }

    #[test]
    fn test_transport_error_has_null_code() {
        let outcome = ValuationOutcome::transport_error("1 Main St", "timed out");
        let value = serde_json::to_value(&outcome).unwrap();

        assert_eq!(value["status"], "error");
        assert!(value["code"].is_null());
        assert_eq!(value["message"], "timed out");
        assert!(!outcome.is_success());
        assert_eq!(outcome.address(), "1 Main St");
    }

    #[test]
    fn test_with_address_keeps_status_and_code() {
        let outcome = ValuationOutcome::http_error("1 Main St", 404, "nope").with_address("  1 Main St ");
        assert_eq!(outcome, ValuationOutcome::http_error("  1 Main St ", 404, "nope"));
    }
}

//! 演示用估值客户端
//!
//! 不发起网络请求，对每个地址返回同一份样例估值，用于 `--dry-run`。

use crate::clients::query::ValuationQuery;
use crate::clients::valuation_client::ValuationApi;
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

const SAMPLE_AVM: &str = include_str!("fixtures/sample_avm.json");

pub struct StubValuationClient {
    sample: Value,
}

impl StubValuationClient {
    pub fn new() -> Result<Self, serde_json::Error> {
        Ok(Self {
            sample: serde_json::from_str(SAMPLE_AVM)?,
        })
    }
}

#[async_trait]
impl ValuationApi for StubValuationClient {
    async fn fetch(&self, query: &ValuationQuery) -> Result<Value, ApiError> {
        debug!("[dry-run] 返回样例估值: {}", query.address());
        Ok(self.sample.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stub_returns_sample_for_every_address() {
        let client = StubValuationClient::new().unwrap();
        let query = ValuationQuery::builder("anywhere").build().unwrap();

        let outcome = client.query(&query).await;
        assert!(outcome.is_success());
        assert_eq!(outcome.address(), "anywhere");
        assert_eq!(outcome.payload().unwrap()["price"], 250000);
        assert_eq!(
            outcome.payload().unwrap()["comparables"]
                .as_array()
                .map(Vec::len),
            Some(2)
        );
    }
}

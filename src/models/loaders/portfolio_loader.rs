use crate::error::SourceError;
use crate::models::property::PropertyQueryRecord;

/// 解析组合文件（JSON 数组）为记录列表
///
/// 任何一个元素不合法都会让整个文件解析失败。
pub fn parse_portfolio(content: &str) -> Result<Vec<PropertyQueryRecord>, SourceError> {
    let records: Vec<PropertyQueryRecord> = serde_json::from_str(content)?;
    tracing::debug!("组合文件解析完成，共 {} 条记录", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_portfolio_keeps_order() {
        let content = r#"[
            {"address": "A St", "bedrooms": 2},
            {"address": "B St", "propertyType": "Condo", "squareFootage": 900},
            {"address": "A St"}
        ]"#;

        let records = parse_portfolio(content).unwrap();
        let addresses: Vec<&str> = records.iter().map(|r| r.address.as_str()).collect();
        assert_eq!(addresses, vec!["A St", "B St", "A St"]);
        assert_eq!(records[1].square_footage, Some(900.0));
    }

    #[test]
    fn test_parse_portfolio_rejects_non_array() {
        assert!(parse_portfolio(r#"{"address": "A St"}"#).is_err());
        assert!(parse_portfolio("not json").is_err());
    }
}

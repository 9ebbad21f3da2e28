//! CSV 导出
//!
//! 每个成功结果按 comparable 展开：一行 = 估值 + 目标房产字段 + 一个 comparable。
//! 没有 comparable 时输出一行，comparable 列留空；失败结果不输出。

use crate::models::ValuationOutcome;
use anyhow::Result;
use serde_json::Value;

/// 估值字段 (列名, JSON 字段)
const VALUATION_COLUMNS: &[(&str, &str)] = &[
    ("Estimated_Price", "price"),
    ("Price_Range_Low", "priceRangeLow"),
    ("Price_Range_High", "priceRangeHigh"),
];

/// 目标房产与 comparable 共有的字段
const PROPERTY_FIELDS: &[(&str, &str)] = &[
    ("Property_ID", "id"),
    ("Formatted_Address", "formattedAddress"),
    ("Address_Line_1", "addressLine1"),
    ("Address_Line_2", "addressLine2"),
    ("City", "city"),
    ("State", "state"),
    ("State_FIPS", "stateFips"),
    ("Zip_Code", "zipCode"),
    ("County", "county"),
    ("County_FIPS", "countyFips"),
    ("Latitude", "latitude"),
    ("Longitude", "longitude"),
    ("Property_Type", "propertyType"),
    ("Bedrooms", "bedrooms"),
    ("Bathrooms", "bathrooms"),
    ("Square_Footage", "squareFootage"),
    ("Lot_Size", "lotSize"),
    ("Year_Built", "yearBuilt"),
];

const SUBJECT_EXTRA: &[(&str, &str)] = &[
    ("Last_Sale_Date", "lastSaleDate"),
    ("Last_Sale_Price", "lastSalePrice"),
];

const COMP_EXTRA: &[(&str, &str)] = &[
    ("Status", "status"),
    ("Price", "price"),
    ("Listing_Type", "listingType"),
    ("Listed_Date", "listedDate"),
    ("Removed_Date", "removedDate"),
    ("Last_Seen_Date", "lastSeenDate"),
    ("Days_On_Market", "daysOnMarket"),
    ("Distance_Miles", "distance"),
    ("Days_Old", "daysOld"),
    ("Correlation", "correlation"),
];

fn subject_fields() -> impl Iterator<Item = &'static (&'static str, &'static str)> {
    PROPERTY_FIELDS.iter().chain(SUBJECT_EXTRA.iter())
}

fn comp_fields() -> impl Iterator<Item = &'static (&'static str, &'static str)> {
    PROPERTY_FIELDS.iter().chain(COMP_EXTRA.iter())
}

/// 表头
pub fn headers() -> Vec<String> {
    let mut headers = vec!["Input_Address".to_string()];
    headers.extend(VALUATION_COLUMNS.iter().map(|(name, _)| name.to_string()));
    headers.extend(subject_fields().map(|(name, _)| format!("Subject_{}", name)));
    headers.extend(comp_fields().map(|(name, _)| format!("Comp_{}", name)));
    headers
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// 单个估值结果展开成的行
pub fn payload_rows(address: &str, payload: &Value) -> Vec<Vec<String>> {
    let subject = payload.get("subjectProperty");

    let mut base = vec![address.to_string()];
    base.extend(VALUATION_COLUMNS.iter().map(|(_, key)| cell(payload.get(*key))));
    base.extend(subject_fields().map(|(_, key)| cell(subject.and_then(|s| s.get(*key)))));

    let comparables = payload
        .get("comparables")
        .and_then(Value::as_array)
        .filter(|comps| !comps.is_empty());

    match comparables {
        Some(comps) => comps
            .iter()
            .map(|comp| {
                let mut row = base.clone();
                row.extend(comp_fields().map(|(_, key)| cell(comp.get(*key))));
                row
            })
            .collect(),
        None => {
            let mut row = base;
            row.extend(comp_fields().map(|_| String::new()));
            vec![row]
        }
    }
}

/// 把一批结果转换为 CSV 文本
pub fn outcomes_to_csv(outcomes: &[ValuationOutcome]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers())?;

    for outcome in outcomes {
        if let Some(payload) = outcome.payload() {
            for row in payload_rows(outcome.address(), payload) {
                writer.write_record(&row)?;
            }
        }
    }

    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("CSV 缓冲写出失败: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_header_layout() {
        let headers = headers();
        assert_eq!(headers.len(), 1 + 3 + 20 + 28);
        assert_eq!(headers[1], "Estimated_Price");
        assert_eq!(headers[4], "Subject_Property_ID");
        assert_eq!(headers.last().map(String::as_str), Some("Comp_Correlation"));
    }

    #[test]
    fn test_one_row_per_comparable() {
        let payload = json!({
            "price": 250000,
            "subjectProperty": {"formattedAddress": "5500 Grand Lake Dr", "addressLine2": null},
            "comparables": [
                {"formattedAddress": "5207 Pine Lake Dr", "distance": 0.384},
                {"formattedAddress": "6707 Lake Cliff St", "distance": 0.3286}
            ]
        });

        let rows = payload_rows("5500 Grand Lake Dr, San Antonio, TX", &payload);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.len() == headers().len()));
        assert_eq!(rows[0][1], "250000");
        assert_eq!(rows[0][5], "5500 Grand Lake Dr");
        assert_eq!(rows[0][7], "");

        let distance_col = headers()
            .iter()
            .position(|h| h == "Comp_Distance_Miles")
            .unwrap();
        assert_eq!(rows[1][distance_col], "0.3286");
    }

    #[test]
    fn test_no_comparables_yields_single_row() {
        let rows = payload_rows("1 Main St", &json!({"price": 1, "comparables": []}));
        assert_eq!(rows.len(), 1);
        assert!(rows[0][24..].iter().all(String::is_empty));
    }

    #[test]
    fn test_errors_are_skipped() {
        let outcomes = vec![
            ValuationOutcome::http_error("bad", 404, "not found"),
            ValuationOutcome::success("good, TX", json!({"price": 5})),
        ];

        let csv = outcomes_to_csv(&outcomes).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].starts_with("\"good, TX\",5,"));
    }
}

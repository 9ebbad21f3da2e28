use serde::{Deserialize, Serialize};

/// 带地址的记录，批处理器只依赖这一点
pub trait HasAddress {
    fn address(&self) -> &str;
}

/// 单个待估值房产
///
/// 地址必填，其余属性可选；按地址列表读取时属性全部为空。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyQueryRecord {
    #[serde(alias = "formattedAddress")]
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bedrooms: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub bathrooms: Option<f64>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub square_footage: Option<f64>,
}

impl PropertyQueryRecord {
    /// 只有地址的记录
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            property_type: None,
            bedrooms: None,
            bathrooms: None,
            square_footage: None,
        }
    }
}

impl HasAddress for PropertyQueryRecord {
    fn address(&self) -> &str {
        &self.address
    }
}

impl HasAddress for String {
    fn address(&self) -> &str {
        self
    }
}

// 组合文件里的数值经常以字符串或空串出现（从表格导出）
fn deserialize_optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;
    use std::fmt;

    struct NumberVisitor;

    impl<'de> Visitor<'de> for NumberVisitor {
        type Value = Option<f64>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, a numeric string, or null")
        }

        fn visit_none<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E> {
            Ok(Some(value as f64))
        }

        fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E> {
            Ok(Some(value))
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            let trimmed = value.trim().replace(',', "");
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|_| E::custom(format!("无法解析数值: {}", value)))
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

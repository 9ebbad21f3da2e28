//! 估值请求构建
//!
//! 所有参数先校验再编码，编码由 `url` 完成，不做字符串拼接。

use crate::config::{Config, MAX_COMP_COUNT};
use crate::error::QueryError;
use crate::models::PropertyQueryRecord;
use url::Url;

/// 整次运行不变的请求参数
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParams {
    pub comp_count: u32,
    pub max_radius: Option<f64>,
    pub days_old: Option<u32>,
    pub lookup_subject_attributes: Option<bool>,
}

impl QueryParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            comp_count: config.comp_count(),
            max_radius: config.max_radius,
            days_old: config.days_old,
            lookup_subject_attributes: config.lookup_subject_attributes,
        }
    }

    /// 记录 → 请求，批处理器默认使用的构建函数
    pub fn build(&self, record: &PropertyQueryRecord) -> Result<ValuationQuery, QueryError> {
        let mut builder = ValuationQuery::builder(&record.address).comp_count(self.comp_count);
        if let Some(property_type) = &record.property_type {
            builder = builder.property_type(property_type);
        }
        if let Some(bedrooms) = record.bedrooms {
            builder = builder.bedrooms(bedrooms);
        }
        if let Some(bathrooms) = record.bathrooms {
            builder = builder.bathrooms(bathrooms);
        }
        if let Some(square_footage) = record.square_footage {
            builder = builder.square_footage(square_footage);
        }
        if let Some(radius) = self.max_radius {
            builder = builder.max_radius(radius);
        }
        if let Some(days_old) = self.days_old {
            builder = builder.days_old(days_old);
        }
        if let Some(lookup) = self.lookup_subject_attributes {
            builder = builder.lookup_subject_attributes(lookup);
        }
        builder.build()
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            comp_count: crate::config::DEFAULT_COMP_COUNT,
            max_radius: None,
            days_old: None,
            lookup_subject_attributes: None,
        }
    }
}

/// 已校验的估值请求
#[derive(Debug, Clone, PartialEq)]
pub struct ValuationQuery {
    address: String,
    comp_count: u32,
    property_type: Option<String>,
    bedrooms: Option<f64>,
    bathrooms: Option<f64>,
    square_footage: Option<f64>,
    max_radius: Option<f64>,
    days_old: Option<u32>,
    lookup_subject_attributes: Option<bool>,
}

impl ValuationQuery {
    pub fn builder(address: impl Into<String>) -> ValuationQueryBuilder {
        ValuationQueryBuilder {
            query: ValuationQuery {
                address: address.into(),
                comp_count: crate::config::DEFAULT_COMP_COUNT,
                property_type: None,
                bedrooms: None,
                bathrooms: None,
                square_footage: None,
                max_radius: None,
                days_old: None,
                lookup_subject_attributes: None,
            },
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// 查询参数（未编码），顺序固定
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("address", self.address.clone()),
            ("compCount", self.comp_count.to_string()),
        ];
        if let Some(property_type) = &self.property_type {
            params.push(("propertyType", property_type.clone()));
        }
        if let Some(bedrooms) = self.bedrooms {
            params.push(("bedrooms", format_number(bedrooms)));
        }
        if let Some(bathrooms) = self.bathrooms {
            params.push(("bathrooms", format_number(bathrooms)));
        }
        if let Some(square_footage) = self.square_footage {
            params.push(("squareFootage", format_number(square_footage)));
        }
        if let Some(radius) = self.max_radius {
            params.push(("maxRadius", format_number(radius)));
        }
        if let Some(days_old) = self.days_old {
            params.push(("daysOld", days_old.to_string()));
        }
        if let Some(lookup) = self.lookup_subject_attributes {
            params.push(("lookupSubjectAttributes", lookup.to_string()));
        }
        params
    }

    /// 拼出完整请求 URL
    pub fn to_url(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        Url::parse_with_params(endpoint, self.to_params())
    }
}

/// 请求构建器
#[derive(Debug, Clone)]
pub struct ValuationQueryBuilder {
    query: ValuationQuery,
}

impl ValuationQueryBuilder {
    pub fn comp_count(mut self, comp_count: u32) -> Self {
        self.query.comp_count = comp_count;
        self
    }

    pub fn property_type(mut self, property_type: impl Into<String>) -> Self {
        let value = property_type.into();
        let trimmed = value.trim();
        self.query.property_type = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn bedrooms(mut self, bedrooms: f64) -> Self {
        self.query.bedrooms = Some(bedrooms);
        self
    }

    pub fn bathrooms(mut self, bathrooms: f64) -> Self {
        self.query.bathrooms = Some(bathrooms);
        self
    }

    /// 面积 <= 0 视为未知，不出现在请求中
    pub fn square_footage(mut self, square_footage: f64) -> Self {
        self.query.square_footage = Some(square_footage);
        self
    }

    pub fn max_radius(mut self, radius: f64) -> Self {
        self.query.max_radius = Some(radius);
        self
    }

    pub fn days_old(mut self, days_old: u32) -> Self {
        self.query.days_old = Some(days_old);
        self
    }

    pub fn lookup_subject_attributes(mut self, lookup: bool) -> Self {
        self.query.lookup_subject_attributes = Some(lookup);
        self
    }

    pub fn build(self) -> Result<ValuationQuery, QueryError> {
        let mut query = self.query;

        query.address = query.address.trim().to_string();
        if query.address.is_empty() {
            return Err(QueryError::EmptyAddress);
        }
        if !(1..=MAX_COMP_COUNT).contains(&query.comp_count) {
            return Err(QueryError::CompCountOutOfRange(query.comp_count));
        }

        check_non_negative("bedrooms", query.bedrooms)?;
        check_non_negative("bathrooms", query.bathrooms)?;
        check_non_negative("maxRadius", query.max_radius)?;
        if let Some(square_footage) = query.square_footage {
            if !square_footage.is_finite() {
                return Err(QueryError::InvalidNumber {
                    field: "squareFootage",
                    value: square_footage,
                });
            }
            if square_footage <= 0.0 {
                query.square_footage = None;
            }
        }

        Ok(query)
    }
}

fn check_non_negative(field: &'static str, value: Option<f64>) -> Result<(), QueryError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(QueryError::InvalidNumber { field, value: v }),
        _ => Ok(()),
    }
}

/// 整数值不带小数点输出
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

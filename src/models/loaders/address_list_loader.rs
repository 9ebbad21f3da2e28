use crate::models::property::PropertyQueryRecord;

/// 解析地址列表：每行一个地址，跳过空行
pub fn parse_address_list(content: &str) -> Vec<PropertyQueryRecord> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PropertyQueryRecord::from_address)
        .collect()
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 入库记录 (IN 数据)，只作为订单明细存在，没有独立身份
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    #[serde(default)]
    pub sequence_number: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub quantity: Option<String>,
}

impl ShipmentRecord {
    pub fn new(sequence_number: i64, date: NaiveDate, quantity: impl Into<String>) -> Self {
        Self {
            sequence_number: Some(sequence_number),
            date: Some(date),
            quantity: Some(quantity.into()),
        }
    }

    /// 三个字段全部存在且数量非空
    pub fn is_complete(&self) -> bool {
        self.sequence_number.is_some()
            && self.date.is_some()
            && self
                .quantity
                .as_deref()
                .map(|q| !q.trim().is_empty())
                .unwrap_or(false)
    }
}

/// 宽松解码已存储的 in_data: null/坏 JSON 得到空列表，单个对象包装成列表
pub fn decode_shipments(raw: &Value) -> Vec<ShipmentRecord> {
    match raw {
        Value::Null => Vec::new(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value(item.clone()).ok())
            .collect(),
        Value::Object(_) => serde_json::from_value(raw.clone())
            .map(|record| vec![record])
            .unwrap_or_default(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ Value::Array(_)) => decode_shipments(&parsed),
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!("in_data is not valid JSON, treating as empty: {}", e);
                Vec::new()
            }
        },
        _ => Vec::new(),
    }
}

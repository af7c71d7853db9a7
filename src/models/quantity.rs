use bigdecimal::BigDecimal;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 宽松匹配: 取字符串中第一个 "数字+单位" 片段，忽略其余内容
static QUANTITY_SCAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)([0-9]+(?:\.[0-9]+)?)\s*(KG|LITER|PCS)").expect("quantity scan pattern")
});

/// 严格匹配: 整个字符串必须是 "数字+单位"，用于输入校验
static QUANTITY_STRICT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[0-9]+(?:\.[0-9]+)?\s*(KG|LITER|PCS)$").expect("quantity strict pattern")
});

static UNIT_SCAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(KG|LITER|PCS)").expect("unit scan pattern"));

/// 计量单位
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    Kg,
    Liter,
    Pcs,
}

impl Unit {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Kg => "KG",
            Unit::Liter => "LITER",
            Unit::Pcs => "PCS",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Unit {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "KG" => Ok(Unit::Kg),
            "LITER" => Ok(Unit::Liter),
            "PCS" => Ok(Unit::Pcs),
            _ => Err(QuantityParseError::UnknownUnit(s.to_string())),
        }
    }
}

/// 数量解析失败 (由调用方就地吸收，不向外传播)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityParseError {
    #[error("no quantity found in {0:?}")]
    NoMatch(String),
    #[error("unknown unit {0:?}")]
    UnknownUnit(String),
    #[error("invalid amount {0:?}")]
    InvalidAmount(String),
}

/// 数量值 (数额 + 单位)，数额恒为非负
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: BigDecimal,
    pub unit: Unit,
}

impl Quantity {
    pub fn new(amount: BigDecimal, unit: Unit) -> Self {
        Self { amount, unit }
    }

    pub fn zero(unit: Unit) -> Self {
        Self::new(BigDecimal::from(0), unit)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.unit)
    }
}

impl FromStr for Quantity {
    type Err = QuantityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = QUANTITY_SCAN
            .captures(s)
            .ok_or_else(|| QuantityParseError::NoMatch(s.to_string()))?;

        let skipped = text_before_match(s, caps.get(0).map_or(0, |m| m.start()));
        if !skipped.is_empty() {
            // 如 ".5 KG" 会读成 5 KG
            tracing::warn!("quantity {:?} matched after leading text {:?}", s, skipped);
        }

        let amount = BigDecimal::from_str(&caps[1])
            .map_err(|_| QuantityParseError::InvalidAmount(caps[1].to_string()))?;
        let unit = caps[2].parse::<Unit>()?;

        Ok(Quantity::new(amount, unit))
    }
}

// 匹配位置之前、去掉首部空白后的文本
fn text_before_match(s: &str, start: usize) -> &str {
    s[..start].trim_start()
}

/// 解析 "12.5 KG" 形式的数量字符串 (宽松模式)
pub fn parse_quantity(text: &str) -> Result<Quantity, QuantityParseError> {
    text.parse()
}

/// 整串校验: `^数字(.小数)?\s*(KG|LITER|PCS)$`，大小写不敏感
pub fn is_valid_quantity(text: &str) -> bool {
    QUANTITY_STRICT.is_match(text.trim())
}

/// 在任意文本中查找第一个单位标记
pub fn scan_unit(text: &str) -> Option<Unit> {
    UNIT_SCAN
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

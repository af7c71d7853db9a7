use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// 采购类型定价配置 (pengaturan_pengadaans)，按 type_code 唯一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub id: i64,
    pub type_code: String,
    pub unit: String,
    pub unit_price: BigDecimal,
    pub vat_percent: BigDecimal,         // PPN, 百分比
    pub withholding_percent: BigDecimal, // PPh, 百分比
    pub tax_exempt: bool,
}

impl PricingConfig {
    pub fn default_vat_percent() -> BigDecimal {
        BigDecimal::from(12)
    }

    pub fn default_withholding_percent() -> BigDecimal {
        BigDecimal::new(15.into(), 1)
    }
}

/// 新建/更新定价配置的请求体
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingInput {
    #[serde(default)]
    pub type_code: String,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Option<BigDecimal>,
    pub vat_percent: Option<BigDecimal>,
    pub withholding_percent: Option<BigDecimal>,
    #[serde(default)]
    pub tax_exempt: bool,
}

use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::quantity::{scan_unit, Quantity, Unit};
use super::result::TaxResult;
use super::shipment::ShipmentRecord;

/// 采购订单 (pengadaan)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcurementOrder {
    pub id: i64,
    pub supplier_name: String,
    pub company_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
    pub order_number: String,       // no_preorder
    pub procurement_date: NaiveDate,
    pub submission_date: NaiveDate,
    pub type_code: String,          // jenis_pengadaan_barang
    pub quantity: String,           // 申报数量 (kuantum)，合并时不变
    pub shipments: Vec<ShipmentRecord>,
    pub payment_amount: Option<Quantity>,
    pub spp: String,
    #[serde(flatten)]
    pub tax: TaxResult,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProcurementOrder {
    /// 供应商、公司一致且类型代码忽略大小写一致
    pub fn same_identity(&self, supplier_name: &str, company_name: &str, type_code: &str) -> bool {
        self.supplier_name == supplier_name
            && self.company_name == company_name
            && self.type_code.eq_ignore_ascii_case(type_code)
    }

    /// 用于计税的数额，没有付款数量时为 0
    pub fn payment_value(&self) -> BigDecimal {
        self.payment_amount
            .as_ref()
            .map(|q| q.amount.clone())
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// 展示用付款数量: 为空时显示 "0 单位"，单位取自申报数量，缺省 KG
    pub fn payment_display(&self) -> String {
        match &self.payment_amount {
            Some(q) => q.to_string().to_uppercase(),
            None => {
                let unit = scan_unit(&self.quantity).unwrap_or(Unit::Kg);
                Quantity::zero(unit).to_string()
            }
        }
    }
}

/// 新订单提交 (POST)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSubmission {
    #[serde(default)]
    pub supplier_name: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub bank_name: String,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub account_holder: String,
    #[serde(default)]
    pub order_number: String,
    pub procurement_date: Option<NaiveDate>,
    pub submission_date: Option<NaiveDate>,
    #[serde(default)]
    pub type_code: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub shipments: Vec<ShipmentRecord>,
    pub spp: Option<String>,
}

/// 订单部分更新 (PUT)，order_number 必填
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderUpdate {
    #[serde(default)]
    pub order_number: String,
    pub supplier_name: Option<String>,
    pub company_name: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub account_holder: Option<String>,
    pub procurement_date: Option<NaiveDate>,
    pub submission_date: Option<NaiveDate>,
    pub type_code: Option<String>,
    pub quantity: Option<String>,
    pub shipments: Option<Vec<ShipmentRecord>>,
    pub spp: Option<String>,
}

/// 列表默认每页条数
pub const DEFAULT_PER_PAGE: u64 = 10;

/// 列表查询条件
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub search: Option<String>,
    pub month: Option<String>, // YYYY-MM
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

/// 分页位置，page 从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

impl OrderFilter {
    /// 缺省第 1 页、每页 10 条；0 按 1 处理
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.page.unwrap_or(1).max(1),
            per_page: self.per_page.unwrap_or(DEFAULT_PER_PAGE).max(1),
        }
    }

    /// 解析 YYYY-MM，格式错误返回 None
    pub fn parse_month(month: &str) -> Option<(i32, u32)> {
        let (year, month) = month.trim().split_once('-')?;
        let year: i32 = year.parse().ok()?;
        let month: u32 = month.parse().ok()?;
        (1..=12).contains(&month).then_some((year, month))
    }

    pub fn matches(&self, order: &ProcurementOrder) -> bool {
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [
                &order.type_code,
                &order.order_number,
                &order.supplier_name,
                &order.company_name,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some((year, month)) = self.month.as_deref().and_then(Self::parse_month) {
            let date = order.procurement_date;
            if date.year() != year || date.month() != month {
                return false;
            }
        }

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if order.procurement_date < from || order.procurement_date > to {
                return false;
            }
        }

        true
    }
}

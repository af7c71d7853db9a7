use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use super::order::PageRequest;
use super::ProcurementOrder;

/// 税额计算结果，各字段独立四舍五入到两位小数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxResult {
    pub pre_tax_price: Option<BigDecimal>,
    pub dpp: Option<BigDecimal>,
    pub vat_total: Option<BigDecimal>,
    pub withholding_total: Option<BigDecimal>,
    pub net_amount: Option<BigDecimal>,
}

/// 提交结果: 新建或合并
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", content = "order", rename_all = "snake_case")]
pub enum SubmitOutcome {
    Created(ProcurementOrder),
    Merged(ProcurementOrder),
}

impl SubmitOutcome {
    pub fn order(&self) -> &ProcurementOrder {
        match self {
            SubmitOutcome::Created(order) | SubmitOutcome::Merged(order) => order,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, SubmitOutcome::Created(_))
    }
}

/// 定价变更后批量重算的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecomputeSummary {
    pub type_code: String,
    pub updated: usize,
    pub failed: usize,
}

/// 分页结果，字段与前端分页组件一致
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub current_page: u64,
    pub last_page: u64,
    pub per_page: u64,
    pub total: u64,
    pub from: Option<u64>,
    pub to: Option<u64>,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, page: PageRequest) -> Self {
        let last_page = ((total + page.per_page - 1) / page.per_page).max(1);
        let (from, to) = if data.is_empty() {
            (None, None)
        } else {
            let first = page.offset() + 1;
            (Some(first), Some(first + data.len() as u64 - 1))
        };

        Self {
            data,
            current_page: page.page,
            last_page,
            per_page: page.per_page,
            total,
            from,
            to,
        }
    }
}

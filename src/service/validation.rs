use bigdecimal::BigDecimal;
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

use crate::models::{is_valid_quantity, OrderFilter, OrderSubmission, OrderUpdate, PricingInput};

/// 允许的银行名称；不在列表中的名称至少 3 个字符
pub const ALLOWED_BANKS: &[&str] = &["MANDIRI", "BCA", "BRI", "BANK JATENG", "BNI"];

/// 字段值规则，所有接口共用
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Quantity,
    BankName,
    Alphabetic,
    Length { min: usize, max: usize },
}

impl Rule {
    fn check(&self, value: &str) -> Result<(), String> {
        match self {
            Rule::Required => Ok(()),
            Rule::Quantity => {
                if is_valid_quantity(value) {
                    Ok(())
                } else {
                    Err("must look like <number> KG|LITER|PCS".to_string())
                }
            }
            Rule::BankName => {
                let upper = value.trim().to_uppercase();
                if ALLOWED_BANKS.contains(&upper.as_str()) || upper.chars().count() >= 3 {
                    Ok(())
                } else {
                    Err("bank is not valid or too short".to_string())
                }
            }
            Rule::Alphabetic => {
                if value.chars().all(|c| c.is_ascii_alphabetic()) {
                    Ok(())
                } else {
                    Err("may only contain letters A-Z".to_string())
                }
            }
            Rule::Length { min, max } => {
                let len = value.chars().count();
                if (*min..=*max).contains(&len) {
                    Ok(())
                } else {
                    Err(format!("must be between {} and {} characters", min, max))
                }
            }
        }
    }
}

/// 字段 -> 错误信息列表 (保持字段出现顺序)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = IndexMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        Self(errors)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{} {}", field, messages.join(", ")))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// 校验器: 逐字段套用规则并收集错误
#[derive(Debug, Default)]
pub struct Validator {
    errors: ValidationErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `value` 为 None 或空白时只检查 Required，其余规则视为可空跳过
    pub fn field(&mut self, name: &str, value: Option<&str>, rules: &[Rule]) -> &mut Self {
        let value = value.filter(|v| !v.trim().is_empty());
        let Some(value) = value else {
            if rules.contains(&Rule::Required) {
                self.add(name, "is required");
            }
            return self;
        };

        // 每个字段只报告第一条失败的规则
        if let Some(message) = rules.iter().find_map(|rule| rule.check(value).err()) {
            self.add(name, message);
        }
        self
    }

    /// 部分更新: 字段缺失跳过，出现则必须满足规则 (含非空)
    pub fn present(&mut self, name: &str, value: Option<&str>, rules: &[Rule]) -> &mut Self {
        match value {
            Some(v) => {
                let mut with_required = vec![Rule::Required];
                with_required.extend_from_slice(rules);
                self.field(name, Some(v), &with_required)
            }
            None => self,
        }
    }

    pub fn required<T>(&mut self, name: &str, value: Option<&T>) -> &mut Self {
        if value.is_none() {
            self.add(name, "is required");
        }
        self
    }

    pub fn decimal(
        &mut self,
        name: &str,
        value: Option<&BigDecimal>,
        min: Option<i64>,
        max: Option<i64>,
    ) -> &mut Self {
        if let Some(v) = value {
            if let Some(min) = min {
                if *v < BigDecimal::from(min) {
                    self.add(name, format!("must be at least {}", min));
                }
            }
            if let Some(max) = max {
                if *v > BigDecimal::from(max) {
                    self.add(name, format!("may not be greater than {}", max));
                }
            }
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// 新订单提交校验
pub fn validate_submission(sub: &OrderSubmission) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.field("supplier_name", Some(&sub.supplier_name), &[Rule::Required])
        .field("company_name", Some(&sub.company_name), &[Rule::Required])
        .field("bank_name", Some(&sub.bank_name), &[Rule::Required, Rule::BankName])
        .field("account_number", Some(&sub.account_number), &[Rule::Required])
        .field("account_holder", Some(&sub.account_holder), &[Rule::Required])
        .field("order_number", Some(&sub.order_number), &[Rule::Required])
        .required("procurement_date", sub.procurement_date.as_ref())
        .required("submission_date", sub.submission_date.as_ref())
        .field("type_code", Some(&sub.type_code), &[Rule::Required])
        .field("quantity", Some(&sub.quantity), &[Rule::Required, Rule::Quantity])
        .field("spp", sub.spp.as_deref(), &[Rule::Quantity]);

    for (idx, record) in sub.shipments.iter().enumerate() {
        v.field(
            &format!("shipments.{}.quantity", idx),
            record.quantity.as_deref(),
            &[Rule::Quantity],
        );
    }
    v.finish()
}

/// 订单更新校验 (不含入库记录完整性，由服务层单独判定)
pub fn validate_update(upd: &OrderUpdate) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.field("order_number", Some(&upd.order_number), &[Rule::Required])
        .present("supplier_name", upd.supplier_name.as_deref(), &[])
        .present("company_name", upd.company_name.as_deref(), &[])
        .present("bank_name", upd.bank_name.as_deref(), &[Rule::BankName])
        .present("account_number", upd.account_number.as_deref(), &[])
        .present("account_holder", upd.account_holder.as_deref(), &[])
        .present("type_code", upd.type_code.as_deref(), &[])
        .present("quantity", upd.quantity.as_deref(), &[Rule::Quantity])
        .field("spp", upd.spp.as_deref(), &[Rule::Quantity]);

    for (idx, record) in upd.shipments.iter().flatten().enumerate() {
        v.field(
            &format!("shipments.{}.quantity", idx),
            record.quantity.as_deref(),
            &[Rule::Quantity],
        );
    }
    v.finish()
}

/// 定价配置校验
pub fn validate_pricing(input: &PricingInput) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    v.field("type_code", Some(&input.type_code), &[Rule::Required])
        .field(
            "unit",
            Some(&input.unit),
            &[Rule::Required, Rule::Length { min: 2, max: 20 }, Rule::Alphabetic],
        )
        .required("unit_price", input.unit_price.as_ref())
        .decimal("unit_price", input.unit_price.as_ref(), Some(0), None)
        .decimal("vat_percent", input.vat_percent.as_ref(), Some(0), Some(100))
        .decimal("withholding_percent", input.withholding_percent.as_ref(), Some(0), Some(100));
    v.finish()
}

/// 列表过滤条件校验
pub fn validate_filter(filter: &OrderFilter) -> Result<(), ValidationErrors> {
    let mut v = Validator::new();
    if let Some(month) = filter.month.as_deref().filter(|m| !m.is_empty()) {
        if OrderFilter::parse_month(month).is_none() {
            v.add("month", "must use the YYYY-MM format");
        }
    }
    v.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ShipmentRecord;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn submission() -> OrderSubmission {
        let day = NaiveDate::from_ymd_opt(2025, 6, 1);
        OrderSubmission {
            supplier_name: "Sumber Tani".into(),
            company_name: "CV Makmur".into(),
            bank_name: "bri".into(),
            account_number: "0012".into(),
            account_holder: "Budi".into(),
            order_number: "PO-001".into(),
            procurement_date: day,
            submission_date: day,
            type_code: "beras".into(),
            quantity: "100 KG".into(),
            shipments: vec![],
            spp: None,
        }
    }

    #[test]
    fn bank_rule_accepts_allow_list_or_long_names() {
        assert!(Rule::BankName.check("bni").is_ok());
        assert!(Rule::BankName.check("Bank Jateng").is_ok());
        assert!(Rule::BankName.check("BSI").is_ok());
        assert!(Rule::BankName.check("XY").is_err());
    }

    #[test]
    fn valid_submission_passes() {
        assert!(validate_submission(&submission()).is_ok());
    }

    #[test]
    fn submission_errors_are_collected_per_field_in_order() {
        let mut sub = submission();
        sub.supplier_name.clear();
        sub.quantity = "a lot".into();
        sub.procurement_date = None;
        sub.shipments = vec![ShipmentRecord {
            quantity: Some("5 TON".into()),
            ..Default::default()
        }];

        let errors = validate_submission(&sub).unwrap_err();
        let fields: Vec<&str> = errors.fields().collect();
        assert_eq!(
            fields,
            vec!["supplier_name", "procurement_date", "quantity", "shipments.0.quantity"]
        );
        assert_eq!(errors.get("supplier_name").unwrap(), ["is required".to_string()]);
    }

    #[test]
    fn update_skips_absent_fields_but_rejects_blank_ones() {
        let mut upd = OrderUpdate {
            order_number: "PO-001".into(),
            ..Default::default()
        };
        assert!(validate_update(&upd).is_ok());

        upd.company_name = Some("  ".into());
        let errors = validate_update(&upd).unwrap_err();
        assert!(errors.get("company_name").is_some());
    }

    #[test]
    fn pricing_rules() {
        let mut input = PricingInput {
            type_code: "gabah".into(),
            unit: "kg".into(),
            unit_price: Some(BigDecimal::from(6500)),
            ..Default::default()
        };
        assert!(validate_pricing(&input).is_ok());

        input.unit = "K9".into();
        input.vat_percent = Some(BigDecimal::from_str("120").unwrap());
        input.unit_price = None;
        let errors = validate_pricing(&input).unwrap_err();
        assert!(errors.get("unit").is_some());
        assert!(errors.get("vat_percent").is_some());
        assert!(errors.get("unit_price").is_some());
    }

    #[test]
    fn malformed_month_filter_is_rejected() {
        let filter = OrderFilter { month: Some("06/2025".into()), ..Default::default() };
        assert!(validate_filter(&filter).is_err());
    }
}

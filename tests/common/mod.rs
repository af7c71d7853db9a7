#![allow(dead_code)]

use chrono::NaiveDate;
use pengadaan_ledger::models::{OrderSubmission, ShipmentRecord};

pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

pub fn shipment(sequence_number: i64, quantity: &str) -> ShipmentRecord {
    ShipmentRecord::new(sequence_number, day(sequence_number as u32), quantity)
}

/// 申报 100 KG 的标准提交，入库记录按顺序编号
pub fn submission(
    order_number: &str,
    supplier_name: &str,
    company_name: &str,
    type_code: &str,
    shipments: &[&str],
) -> OrderSubmission {
    OrderSubmission {
        supplier_name: supplier_name.into(),
        company_name: company_name.into(),
        bank_name: "bri".into(),
        account_number: "0012345678".into(),
        account_holder: "Budi Santoso".into(),
        order_number: order_number.into(),
        procurement_date: Some(day(10)),
        submission_date: Some(day(12)),
        type_code: type_code.into(),
        quantity: "100 KG".into(),
        shipments: shipments
            .iter()
            .enumerate()
            .map(|(i, q)| shipment(i as i64 + 1, q))
            .collect(),
        spp: None,
    }
}

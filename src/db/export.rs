use bigdecimal::BigDecimal;
use csv::Writer;
use std::io::Write;

use crate::models::ProcurementOrder;

const HEADER: [&str; 18] = [
    "id",
    "order_number",
    "procurement_date",
    "submission_date",
    "supplier_name",
    "company_name",
    "bank_name",
    "account_number",
    "account_holder",
    "type_code",
    "quantity",
    "payment_amount",
    "spp",
    "pre_tax_price",
    "dpp",
    "vat_total",
    "withholding_total",
    "net_amount",
];

/// 将 Option<BigDecimal> 转换为 CSV 字符串
fn option_to_csv(val: &Option<BigDecimal>) -> String {
    val.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

/// 导出订单台账为 CSV，付款数量列使用展示格式
pub fn export_orders_csv<W: Write>(
    orders: &[ProcurementOrder],
    output: W,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut writer = Writer::from_writer(output);
    writer.write_record(HEADER)?;

    for order in orders {
        writer.write_record(&[
            order.id.to_string(),
            order.order_number.clone(),
            order.procurement_date.to_string(),
            order.submission_date.to_string(),
            order.supplier_name.clone(),
            order.company_name.clone(),
            order.bank_name.clone(),
            order.account_number.clone(),
            order.account_holder.clone(),
            order.type_code.clone(),
            order.quantity.clone(),
            order.payment_display(),
            order.spp.clone(),
            option_to_csv(&order.tax.pre_tax_price),
            option_to_csv(&order.tax.dpp),
            option_to_csv(&order.tax.vat_total),
            option_to_csv(&order.tax.withholding_total),
            option_to_csv(&order.tax.net_amount),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

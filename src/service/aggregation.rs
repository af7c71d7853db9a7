use crate::models::{parse_quantity, Quantity, ShipmentRecord};

/// 汇总入库记录得到付款数量
///
/// 按提交顺序处理，无法解析的条目直接跳过。单位以最后一条成功解析的
/// 记录为准: 单位相同则累加，单位变化时累计值从该条重新开始 (不报错，只告警)。
/// 没有任何可解析条目时返回 None ("无付款数量")。
pub fn aggregate(records: &[ShipmentRecord]) -> Option<Quantity> {
    let mut running: Option<Quantity> = None;

    for (idx, record) in records.iter().enumerate() {
        let Some(text) = record.quantity.as_deref() else {
            continue;
        };

        match parse_quantity(text) {
            Ok(q) => {
                if let Some(prev) = &running {
                    if prev.unit != q.unit {
                        tracing::warn!(
                            "shipment #{} switches unit {} -> {}, total restarts from {}",
                            idx, prev.unit, q.unit, q
                        );
                    }
                }
                running = Some(accumulate(running, q));
            }
            Err(e) => {
                tracing::warn!("shipment #{} skipped: {}", idx, e);
            }
        }
    }

    running
}

/// 两个数量字符串相加: 均可解析且单位相同则求和，否则以新值替换旧值
pub fn sum_quantities(existing: &str, incoming: &str) -> String {
    match (parse_quantity(existing), parse_quantity(incoming)) {
        (Ok(old), Ok(new)) if old.unit == new.unit => accumulate(Some(old), new).to_string(),
        _ => incoming.to_string(),
    }
}

fn accumulate(total: Option<Quantity>, next: Quantity) -> Quantity {
    match total {
        Some(acc) if acc.unit == next.unit => Quantity::new(acc.amount + next.amount, next.unit),
        _ => next,
    }
}

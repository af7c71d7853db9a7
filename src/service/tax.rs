use bigdecimal::BigDecimal;
use crate::models::{PricingConfig, TaxResult};

/// 计算税额
///
/// 免税: nominal = round(数量 × 单价)，其余字段为空。
/// 应税:
///   harga_sebelum_pajak = 数量 × 单价
///   dpp                 = harga_sebelum_pajak × 100/111
///   ppn_total           = dpp × ppn%
///   pph_total           = dpp × pph%
///   nominal             = dpp − pph_total
/// 五个值都由未舍入的中间值计算，再各自四舍五入到两位小数。
pub fn compute(amount: &BigDecimal, pricing: &PricingConfig) -> TaxResult {
    let pre_tax = amount * &pricing.unit_price;

    if pricing.tax_exempt {
        return TaxResult {
            net_amount: Some(round2(&pre_tax)),
            ..TaxResult::default()
        };
    }

    let hundred = BigDecimal::from(100);
    let dpp = (&pre_tax * &hundred) / BigDecimal::from(111);
    let vat = (&dpp * &pricing.vat_percent) / hundred.clone();
    let withholding = (&dpp * &pricing.withholding_percent) / hundred;
    let net = &dpp - &withholding;

    TaxResult {
        pre_tax_price: Some(round2(&pre_tax)),
        dpp: Some(round2(&dpp)),
        vat_total: Some(round2(&vat)),
        withholding_total: Some(round2(&withholding)),
        net_amount: Some(round2(&net)),
    }
}

// 四舍五入 (half-up) 到两位小数，统一 scale 为 2
fn round2(value: &BigDecimal) -> BigDecimal {
    value.round(2).with_scale(2)
}

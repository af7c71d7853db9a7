use bigdecimal::BigDecimal;
use chrono::Utc;
use futures::future::join_all;
use rayon::prelude::*;
use std::sync::Arc;

use crate::db::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::models::{
    OrderFilter, OrderSubmission, OrderUpdate, Paginated, PricingConfig, PricingInput,
    ProcurementOrder, RecomputeSummary, SubmitOutcome, TaxResult,
};
use crate::service::aggregation::aggregate;
use crate::service::tax;
use crate::service::validation::{
    validate_filter, validate_pricing, validate_submission, validate_update, ValidationErrors,
};

/// 采购台账服务: 提交/合并、更新、定价配置及其批量重算
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
}

impl LedgerService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    async fn require_pricing(&self, type_code: &str) -> Result<PricingConfig> {
        self.store
            .find_pricing_by_type(type_code)
            .await?
            .ok_or_else(|| LedgerError::MissingPricingConfig(type_code.to_string()))
    }

    /// 提交订单
    ///
    /// 订单号不存在 -> 新建；存在且供应商/公司/类型一致 -> 追加入库记录并重算；
    /// 存在但身份不一致 -> 冲突。申报数量与 spp 在合并时保持不变。
    pub async fn submit(&self, submission: OrderSubmission) -> Result<SubmitOutcome> {
        validate_submission(&submission)?;

        let type_code = submission.type_code.trim().to_uppercase();
        let existing = self
            .store
            .find_orders_by_number(&submission.order_number)
            .await?;

        let number_taken = !existing.is_empty();
        let target = existing.into_iter().find(|o| {
            o.same_identity(&submission.supplier_name, &submission.company_name, &type_code)
        });
        if number_taken && target.is_none() {
            tracing::warn!(
                "Order number {} reused with different supplier/company/type, rejected",
                submission.order_number
            );
            return Err(LedgerError::IdentityConflict {
                order_number: submission.order_number,
            });
        }

        let pricing = self.require_pricing(&type_code).await?;

        match target {
            Some(mut order) => {
                let incoming = submission.shipments.len();
                order.shipments.extend(submission.shipments);
                order.payment_amount = aggregate(&order.shipments);
                order.tax = tax::compute(&order.payment_value(), &pricing);
                order.updated_at = Utc::now();
                self.store.save_order(&order).await?;

                tracing::info!(
                    "Order {} (#{}) merged {} shipment(s), total {}, payment {}",
                    order.order_number,
                    order.id,
                    incoming,
                    order.shipments.len(),
                    order.payment_display()
                );
                Ok(SubmitOutcome::Merged(order))
            }
            None => {
                let now = Utc::now();
                let payment_amount = aggregate(&submission.shipments);
                let amount = payment_amount
                    .as_ref()
                    .map(|q| q.amount.clone())
                    .unwrap_or_else(|| BigDecimal::from(0));

                let (Some(procurement_date), Some(submission_date)) =
                    (submission.procurement_date, submission.submission_date)
                else {
                    return Err(ValidationErrors::single("procurement_date", "is required").into());
                };

                let order = ProcurementOrder {
                    id: 0,
                    supplier_name: submission.supplier_name,
                    company_name: submission.company_name,
                    bank_name: submission.bank_name.trim().to_uppercase(),
                    account_number: submission.account_number,
                    account_holder: submission.account_holder,
                    order_number: submission.order_number,
                    procurement_date,
                    submission_date,
                    type_code,
                    quantity: submission.quantity.trim().to_uppercase(),
                    shipments: submission.shipments,
                    payment_amount,
                    spp: submission.spp.unwrap_or_default(),
                    tax: tax::compute(&amount, &pricing),
                    created_at: now,
                    updated_at: now,
                };
                let order = self.store.insert_order(order).await?;

                tracing::info!(
                    "Order {} (#{}) created, type {}, payment {}",
                    order.order_number,
                    order.id,
                    order.type_code,
                    order.payment_display()
                );
                Ok(SubmitOutcome::Created(order))
            }
        }
    }

    /// 更新订单 (部分字段)，入库记录整批替换
    pub async fn update_order(&self, id: i64, update: OrderUpdate) -> Result<ProcurementOrder> {
        let mut order = self.get_order(id).await?;
        validate_update(&update)?;

        if let Some(shipments) = &update.shipments {
            if shipments.iter().any(|s| !s.is_complete()) {
                return Err(LedgerError::IncompleteShipmentBatch);
            }
        }

        order.order_number = update.order_number;
        if let Some(v) = update.supplier_name {
            order.supplier_name = v;
        }
        if let Some(v) = update.company_name {
            order.company_name = v;
        }
        if let Some(v) = update.bank_name {
            order.bank_name = v.trim().to_uppercase();
        }
        if let Some(v) = update.account_number {
            order.account_number = v;
        }
        if let Some(v) = update.account_holder {
            order.account_holder = v;
        }
        if let Some(v) = update.procurement_date {
            order.procurement_date = v;
        }
        if let Some(v) = update.submission_date {
            order.submission_date = v;
        }
        if let Some(v) = update.type_code {
            order.type_code = v.trim().to_uppercase();
        }
        if let Some(v) = update.quantity {
            order.quantity = v.trim().to_uppercase();
        }
        if let Some(v) = update.spp {
            order.spp = v;
        }
        if let Some(shipments) = update.shipments {
            order.shipments = shipments;
            order.payment_amount = aggregate(&order.shipments);
        }

        // 先确认定价存在，再写入
        let pricing = self.require_pricing(&order.type_code).await?;
        order.tax = tax::compute(&order.payment_value(), &pricing);
        order.updated_at = Utc::now();
        self.store.save_order(&order).await?;

        tracing::info!("Order #{} updated, payment {}", order.id, order.payment_display());
        Ok(order)
    }

    pub async fn get_order(&self, id: i64) -> Result<ProcurementOrder> {
        self.store
            .get_order(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("order {}", id)))
    }

    /// 分页列表 (默认每页 10 条)
    pub async fn list_orders(&self, filter: &OrderFilter) -> Result<Paginated<ProcurementOrder>> {
        validate_filter(filter)?;
        let page = filter.page_request();
        let total = self.store.count_orders(filter).await?;
        let orders = self.store.list_orders(filter, Some(page)).await?;
        Ok(Paginated::new(orders, total, page))
    }

    /// 不分页的全部匹配订单，用于导出
    pub async fn all_orders(&self, filter: &OrderFilter) -> Result<Vec<ProcurementOrder>> {
        validate_filter(filter)?;
        self.store.list_orders(filter, None).await
    }

    pub async fn delete_order(&self, id: i64) -> Result<()> {
        if !self.store.delete_order(id).await? {
            return Err(LedgerError::NotFound(format!("order {}", id)));
        }
        tracing::info!("Order #{} deleted", id);
        Ok(())
    }

    pub async fn list_pricing(&self) -> Result<Vec<PricingConfig>> {
        self.store.list_pricing().await
    }

    pub async fn get_pricing(&self, id: i64) -> Result<PricingConfig> {
        self.store
            .get_pricing(id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("pricing {}", id)))
    }

    /// 新建定价配置，类型代码不可重复
    pub async fn create_pricing(&self, input: PricingInput) -> Result<PricingConfig> {
        validate_pricing(&input)?;

        let type_code = input.type_code.trim().to_uppercase();
        if self.store.find_pricing_by_type(&type_code).await?.is_some() {
            return Err(LedgerError::DuplicatePricingConfig(type_code));
        }

        let pricing = PricingConfig {
            id: 0,
            type_code,
            unit: input.unit.trim().to_uppercase(),
            unit_price: input.unit_price.unwrap_or_else(|| BigDecimal::from(0)),
            vat_percent: input.vat_percent.unwrap_or_else(PricingConfig::default_vat_percent),
            withholding_percent: input
                .withholding_percent
                .unwrap_or_else(PricingConfig::default_withholding_percent),
            tax_exempt: input.tax_exempt,
        };
        let pricing = self.store.insert_pricing(pricing).await?;
        tracing::info!("Pricing for {} created", pricing.type_code);
        Ok(pricing)
    }

    /// 更新定价配置，并重算该类型下的所有订单
    pub async fn update_pricing(
        &self,
        id: i64,
        input: PricingInput,
    ) -> Result<(PricingConfig, RecomputeSummary)> {
        let current = self.get_pricing(id).await?;
        validate_pricing(&input)?;

        let type_code = input.type_code.trim().to_uppercase();
        if let Some(other) = self.store.find_pricing_by_type(&type_code).await? {
            if other.id != id {
                return Err(LedgerError::DuplicatePricingConfig(type_code));
            }
        }

        let pricing = PricingConfig {
            id,
            type_code,
            unit: input.unit.trim().to_uppercase(),
            unit_price: input.unit_price.unwrap_or(current.unit_price),
            vat_percent: input.vat_percent.unwrap_or(current.vat_percent),
            withholding_percent: input.withholding_percent.unwrap_or(current.withholding_percent),
            tax_exempt: input.tax_exempt,
        };
        self.store.save_pricing(&pricing).await?;

        let summary = self.recompute_for_type(&pricing).await?;
        Ok((pricing, summary))
    }

    pub async fn delete_pricing(&self, id: i64) -> Result<()> {
        if !self.store.delete_pricing(id).await? {
            return Err(LedgerError::NotFound(format!("pricing {}", id)));
        }
        tracing::info!("Pricing #{} deleted", id);
        Ok(())
    }

    /// 按新定价重算同类型订单的税额
    ///
    /// 使用订单已存储的付款数额 (不重新汇总入库记录)。税额并行计算，
    /// 每个订单独立保存，单个失败只计数不影响其他订单。
    pub async fn recompute_for_type(&self, pricing: &PricingConfig) -> Result<RecomputeSummary> {
        let orders = self.store.list_orders_by_type(&pricing.type_code).await?;

        let results: Vec<(i64, TaxResult)> = orders
            .par_iter()
            .map(|order| (order.id, tax::compute(&order.payment_value(), pricing)))
            .collect();

        let saves = results
            .iter()
            .map(|(id, tax)| async move { (*id, self.store.save_order_tax(*id, tax).await) });
        let outcomes = join_all(saves).await;

        let mut summary = RecomputeSummary {
            type_code: pricing.type_code.clone(),
            ..Default::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Recompute of order #{} failed: {}", id, e);
                }
            }
        }

        tracing::info!(
            "Pricing {} changed: {} order(s) recomputed, {} failed",
            summary.type_code, summary.updated, summary.failed
        );
        Ok(summary)
    }
}

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use super::store::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::models::{OrderFilter, PageRequest, PricingConfig, ProcurementOrder, TaxResult};

/// 内存存储，未配置数据库时使用
#[derive(Debug)]
pub struct MemoryStore {
    orders: DashMap<i64, ProcurementOrder>,
    pricing: DashMap<i64, PricingConfig>,
    pricing_types: DashMap<String, i64>, // type_code -> id，唯一约束
    next_order_id: AtomicI64,
    next_pricing_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            pricing: DashMap::new(),
            pricing_types: DashMap::new(),
            next_order_id: AtomicI64::new(1),
            next_pricing_id: AtomicI64::new(1),
        }
    }

    fn collect_orders<F>(&self, pred: F) -> Vec<ProcurementOrder>
    where
        F: Fn(&ProcurementOrder) -> bool,
    {
        let mut orders: Vec<ProcurementOrder> = self
            .orders
            .iter()
            .filter(|entry| pred(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        orders.sort_by(|a, b| {
            b.procurement_date
                .cmp(&a.procurement_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        orders
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn find_pricing_by_type(&self, type_code: &str) -> Result<Option<PricingConfig>> {
        let id = self.pricing_types.get(type_code).map(|entry| *entry.value());
        Ok(id.and_then(|id| self.pricing.get(&id).map(|entry| entry.value().clone())))
    }

    async fn get_pricing(&self, id: i64) -> Result<Option<PricingConfig>> {
        Ok(self.pricing.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_pricing(&self) -> Result<Vec<PricingConfig>> {
        let mut all: Vec<PricingConfig> = self.pricing.iter().map(|e| e.value().clone()).collect();
        all.sort_by_key(|p| p.id);
        Ok(all)
    }

    async fn insert_pricing(&self, mut pricing: PricingConfig) -> Result<PricingConfig> {
        // 占位与分配 id 在同一个 entry 内完成
        pricing.id = match self.pricing_types.entry(pricing.type_code.clone()) {
            Entry::Occupied(_) => {
                return Err(LedgerError::DuplicatePricingConfig(pricing.type_code));
            }
            Entry::Vacant(slot) => {
                let id = self.next_pricing_id.fetch_add(1, Ordering::SeqCst);
                slot.insert(id);
                id
            }
        };
        self.pricing.insert(pricing.id, pricing.clone());
        Ok(pricing)
    }

    async fn save_pricing(&self, pricing: &PricingConfig) -> Result<()> {
        let Some(current_type) = self.pricing.get(&pricing.id).map(|e| e.type_code.clone()) else {
            return Err(LedgerError::NotFound(format!("pricing {}", pricing.id)));
        };

        if current_type != pricing.type_code {
            match self.pricing_types.entry(pricing.type_code.clone()) {
                Entry::Occupied(_) => {
                    return Err(LedgerError::DuplicatePricingConfig(pricing.type_code.clone()));
                }
                Entry::Vacant(slot) => {
                    slot.insert(pricing.id);
                }
            }
            self.pricing_types.remove(&current_type);
        }

        if let Some(mut entry) = self.pricing.get_mut(&pricing.id) {
            *entry = pricing.clone();
        }
        Ok(())
    }

    async fn delete_pricing(&self, id: i64) -> Result<bool> {
        match self.pricing.remove(&id) {
            Some((_, removed)) => {
                self.pricing_types.remove(&removed.type_code);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_orders_by_number(&self, order_number: &str) -> Result<Vec<ProcurementOrder>> {
        let mut orders = self.collect_orders(|o| o.order_number == order_number);
        orders.sort_by_key(|o| o.id);
        Ok(orders)
    }

    async fn list_orders_by_type(&self, type_code: &str) -> Result<Vec<ProcurementOrder>> {
        Ok(self.collect_orders(|o| o.type_code == type_code))
    }

    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<ProcurementOrder>> {
        let orders = self.collect_orders(|o| filter.matches(o));
        Ok(match page {
            Some(page) => orders
                .into_iter()
                .skip(page.offset() as usize)
                .take(page.per_page as usize)
                .collect(),
            None => orders,
        })
    }

    async fn count_orders(&self, filter: &OrderFilter) -> Result<u64> {
        Ok(self.orders.iter().filter(|entry| filter.matches(entry.value())).count() as u64)
    }

    async fn get_order(&self, id: i64) -> Result<Option<ProcurementOrder>> {
        Ok(self.orders.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert_order(&self, mut order: ProcurementOrder) -> Result<ProcurementOrder> {
        order.id = self.next_order_id.fetch_add(1, Ordering::SeqCst);
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn save_order(&self, order: &ProcurementOrder) -> Result<()> {
        match self.orders.get_mut(&order.id) {
            Some(mut entry) => {
                *entry = order.clone();
                Ok(())
            }
            None => Err(LedgerError::NotFound(format!("order {}", order.id))),
        }
    }

    async fn save_order_tax(&self, id: i64, tax: &TaxResult) -> Result<()> {
        match self.orders.get_mut(&id) {
            Some(mut entry) => {
                entry.tax = tax.clone();
                entry.updated_at = Utc::now();
                Ok(())
            }
            None => Err(LedgerError::NotFound(format!("order {}", id))),
        }
    }

    async fn delete_order(&self, id: i64) -> Result<bool> {
        Ok(self.orders.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quantity, Unit};
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn order(order_number: &str, type_code: &str, day: u32) -> ProcurementOrder {
        let date = NaiveDate::from_ymd_opt(2025, 6, day).unwrap();
        ProcurementOrder {
            id: 0,
            supplier_name: "Sumber Tani".into(),
            company_name: "CV Makmur".into(),
            bank_name: "BRI".into(),
            account_number: "0012".into(),
            account_holder: "Budi".into(),
            order_number: order_number.into(),
            procurement_date: date,
            submission_date: date,
            type_code: type_code.into(),
            quantity: "10 KG".into(),
            shipments: Vec::new(),
            payment_amount: Some(Quantity::new(BigDecimal::from(10), Unit::Kg)),
            spp: String::new(),
            tax: TaxResult::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn ids_are_assigned_and_listing_is_newest_first() {
        let store = MemoryStore::new();
        let first = store.insert_order(order("PO-1", "BERAS", 1)).await.unwrap();
        let second = store.insert_order(order("PO-2", "GABAH", 20)).await.unwrap();
        assert_eq!((first.id, second.id), (1, 2));

        let all = store.list_orders(&OrderFilter::default(), None).await.unwrap();
        let ids: Vec<i64> = all.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![2, 1]);

        let beras = store.list_orders_by_type("BERAS").await.unwrap();
        assert_eq!(beras.len(), 1);
        assert_eq!(beras[0].order_number, "PO-1");
    }

    #[tokio::test]
    async fn same_number_lookup_is_ordered_by_id() {
        let store = MemoryStore::new();
        store.insert_order(order("PO-1", "BERAS", 1)).await.unwrap();
        store.insert_order(order("PO-1", "GABAH", 25)).await.unwrap();

        let found = store.find_orders_by_number("PO-1").await.unwrap();
        let ids: Vec<i64> = found.iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn listing_is_sliced_by_page() {
        let store = MemoryStore::new();
        for day in 1..=5 {
            store.insert_order(order(&format!("PO-{}", day), "BERAS", day)).await.unwrap();
        }
        let filter = OrderFilter::default();
        let page = PageRequest { page: 2, per_page: 2 };

        let slice = store.list_orders(&filter, Some(page)).await.unwrap();
        let numbers: Vec<&str> = slice.iter().map(|o| o.order_number.as_str()).collect();
        assert_eq!(numbers, vec!["PO-3", "PO-2"]);
        assert_eq!(store.count_orders(&filter).await.unwrap(), 5);

        let past_end = PageRequest { page: 4, per_page: 2 };
        assert!(store.list_orders(&filter, Some(past_end)).await.unwrap().is_empty());
    }

    fn pricing(type_code: &str) -> PricingConfig {
        PricingConfig {
            id: 0,
            type_code: type_code.into(),
            unit: "KG".into(),
            unit_price: BigDecimal::from(10),
            vat_percent: PricingConfig::default_vat_percent(),
            withholding_percent: PricingConfig::default_withholding_percent(),
            tax_exempt: false,
        }
    }

    #[tokio::test]
    async fn pricing_type_code_stays_unique_at_insert_and_rename() {
        let store = MemoryStore::new();
        let beras = store.insert_pricing(pricing("BERAS")).await.unwrap();
        let gabah = store.insert_pricing(pricing("GABAH")).await.unwrap();

        let err = store.insert_pricing(pricing("BERAS")).await.unwrap_err();
        assert!(matches!(err, LedgerError::DuplicatePricingConfig(ref t) if t == "BERAS"));

        let renamed = PricingConfig { type_code: "BERAS".into(), ..gabah.clone() };
        assert!(matches!(
            store.save_pricing(&renamed).await,
            Err(LedgerError::DuplicatePricingConfig(_))
        ));

        let moved = PricingConfig { type_code: "JAGUNG".into(), ..gabah };
        store.save_pricing(&moved).await.unwrap();
        assert!(store.find_pricing_by_type("GABAH").await.unwrap().is_none());
        assert_eq!(store.find_pricing_by_type("JAGUNG").await.unwrap().unwrap().id, moved.id);

        assert!(store.delete_pricing(beras.id).await.unwrap());
        store.insert_pricing(pricing("BERAS")).await.unwrap();
    }

    #[tokio::test]
    async fn tax_save_touches_only_tax_fields() {
        let store = MemoryStore::new();
        let stored = store.insert_order(order("PO-1", "BERAS", 1)).await.unwrap();

        let tax = TaxResult {
            net_amount: Some(BigDecimal::from(5)),
            ..Default::default()
        };
        store.save_order_tax(stored.id, &tax).await.unwrap();

        let reloaded = store.get_order(stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.tax, tax);
        assert_eq!(reloaded.payment_amount, stored.payment_amount);
        assert_eq!(reloaded.shipments, stored.shipments);
    }

    #[tokio::test]
    async fn saving_unknown_rows_is_not_found() {
        let store = MemoryStore::new();
        let missing = order("PO-1", "BERAS", 1);
        assert!(matches!(store.save_order(&missing).await, Err(LedgerError::NotFound(_))));
        assert!(matches!(
            store.save_order_tax(42, &TaxResult::default()).await,
            Err(LedgerError::NotFound(_))
        ));
        assert!(!store.delete_order(42).await.unwrap());
    }
}

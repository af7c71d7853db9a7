use async_trait::async_trait;

use crate::error::Result;
use crate::models::{OrderFilter, PageRequest, PricingConfig, ProcurementOrder, TaxResult};

/// 订单与定价配置的持久化接口
///
/// 单条订单的读-改-写由存储保证原子性；同一订单号的并发提交不做额外加锁。
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn find_pricing_by_type(&self, type_code: &str) -> Result<Option<PricingConfig>>;
    async fn get_pricing(&self, id: i64) -> Result<Option<PricingConfig>>;
    async fn list_pricing(&self) -> Result<Vec<PricingConfig>>;
    /// 忽略 `pricing.id`，返回带新 id 的配置；类型代码已存在时返回 `DuplicatePricingConfig`
    async fn insert_pricing(&self, pricing: PricingConfig) -> Result<PricingConfig>;
    /// 改名到其他配置已占用的类型代码时返回 `DuplicatePricingConfig`
    async fn save_pricing(&self, pricing: &PricingConfig) -> Result<()>;
    async fn delete_pricing(&self, id: i64) -> Result<bool>;

    /// 按 id 升序
    async fn find_orders_by_number(&self, order_number: &str) -> Result<Vec<ProcurementOrder>>;
    async fn list_orders_by_type(&self, type_code: &str) -> Result<Vec<ProcurementOrder>>;
    /// 采购日期降序；`page` 为 None 时返回全部
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<ProcurementOrder>>;
    async fn count_orders(&self, filter: &OrderFilter) -> Result<u64>;
    async fn get_order(&self, id: i64) -> Result<Option<ProcurementOrder>>;
    /// 忽略 `order.id`，返回带新 id 的订单
    async fn insert_order(&self, order: ProcurementOrder) -> Result<ProcurementOrder>;
    async fn save_order(&self, order: &ProcurementOrder) -> Result<()>;
    /// 只写回税额字段
    async fn save_order_tax(&self, id: i64, tax: &TaxResult) -> Result<()>;
    async fn delete_order(&self, id: i64) -> Result<bool>;
}

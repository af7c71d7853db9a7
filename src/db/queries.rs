use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use std::future::Future;
use std::time::Duration;

use super::store::LedgerStore;
use crate::error::{LedgerError, Result};
use crate::models::{
    decode_shipments, OrderFilter, PageRequest, PricingConfig, ProcurementOrder, Quantity, TaxResult, Unit,
};

/// 写操作超时
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);

const ORDER_COLUMNS: &str = r#"
    id, nama_suplier, nama_perusahaan, jenis_bank, no_rekening, atasnama_rekening,
    no_preorder, tanggal_pengadaan, tanggal_pengajuan, jenis_pengadaan_barang, kuantum,
    in_data, jumlah_pembayaran, satuan_pembayaran, spp,
    harga_sebelum_pajak, dpp, ppn_total, pph_total, nominal,
    created_at, updated_at
"#;

const PRICING_COLUMNS: &str =
    "id, jenis_pengadaan_barang, satuan, harga_per_satuan, ppn, pph, tanpa_pajak";

/// 定价配置表 (pengaturan_pengadaans)
#[derive(Debug, Clone, FromRow)]
struct PricingRow {
    id: i64,
    jenis_pengadaan_barang: String,
    satuan: String,
    harga_per_satuan: BigDecimal,
    ppn: BigDecimal,
    pph: BigDecimal,
    tanpa_pajak: bool,
}

impl From<PricingRow> for PricingConfig {
    fn from(row: PricingRow) -> Self {
        Self {
            id: row.id,
            type_code: row.jenis_pengadaan_barang,
            unit: row.satuan,
            unit_price: row.harga_per_satuan,
            vat_percent: row.ppn,
            withholding_percent: row.pph,
            tax_exempt: row.tanpa_pajak,
        }
    }
}

/// 采购订单表 (pengadaan)
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: i64,
    nama_suplier: String,
    nama_perusahaan: String,
    jenis_bank: String,
    no_rekening: String,
    atasnama_rekening: String,
    no_preorder: String,
    tanggal_pengadaan: NaiveDate,
    tanggal_pengajuan: NaiveDate,
    jenis_pengadaan_barang: String,
    kuantum: String,
    in_data: Option<serde_json::Value>,
    jumlah_pembayaran: Option<BigDecimal>,
    satuan_pembayaran: Option<String>,
    spp: String,
    harga_sebelum_pajak: Option<BigDecimal>,
    dpp: Option<BigDecimal>,
    ppn_total: Option<BigDecimal>,
    pph_total: Option<BigDecimal>,
    nominal: Option<BigDecimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for ProcurementOrder {
    fn from(row: OrderRow) -> Self {
        // 数额和单位分列存储，两者都有才构成付款数量
        let payment_amount = match (row.jumlah_pembayaran, row.satuan_pembayaran) {
            (Some(amount), Some(unit)) => unit.parse::<Unit>().ok().map(|u| Quantity::new(amount, u)),
            _ => None,
        };

        Self {
            id: row.id,
            supplier_name: row.nama_suplier,
            company_name: row.nama_perusahaan,
            bank_name: row.jenis_bank,
            account_number: row.no_rekening,
            account_holder: row.atasnama_rekening,
            order_number: row.no_preorder,
            procurement_date: row.tanggal_pengadaan,
            submission_date: row.tanggal_pengajuan,
            type_code: row.jenis_pengadaan_barang,
            quantity: row.kuantum,
            shipments: row
                .in_data
                .as_ref()
                .map(decode_shipments)
                .unwrap_or_default(),
            payment_amount,
            spp: row.spp,
            tax: TaxResult {
                pre_tax_price: row.harga_sebelum_pajak,
                dpp: row.dpp,
                vat_total: row.ppn_total,
                withholding_total: row.pph_total,
                net_amount: row.nominal,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres 存储
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建表 (幂等)
    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in include_str!("schema.sql").split(';') {
            let statement = statement.trim();
            if statement.is_empty() {
                continue;
            }
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::info!("Database schema ready");
        Ok(())
    }
}

/// 带超时的写操作，失败时记录耗时
async fn timed_write<T, F>(op: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let start = std::time::Instant::now();
    match tokio::time::timeout(WRITE_TIMEOUT, fut).await {
        Ok(Ok(value)) => {
            tracing::debug!("✓ {} 完成, 耗时: {:?}", op, start.elapsed());
            Ok(value)
        }
        Ok(Err(e)) => {
            tracing::error!("✗ {} 失败, 耗时: {:?}, 错误: {:?}", op, start.elapsed(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::error!("✗ {} 超时 (>{}秒)!", op, WRITE_TIMEOUT.as_secs());
            Err(LedgerError::Timeout(op))
        }
    }
}

fn payment_columns(order: &ProcurementOrder) -> (Option<BigDecimal>, Option<String>) {
    match &order.payment_amount {
        Some(q) => (Some(q.amount.clone()), Some(q.unit.to_string())),
        None => (None, None),
    }
}

/// 列表与计数共用的过滤条件
fn push_filter(query_builder: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        query_builder
            .push(" AND (jenis_pengadaan_barang ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR no_preorder ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR nama_suplier ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR nama_perusahaan ILIKE ")
            .push_bind(pattern)
            .push(")");
    }

    if let Some((year, month)) = filter.month.as_deref().and_then(OrderFilter::parse_month) {
        query_builder
            .push(" AND EXTRACT(YEAR FROM tanggal_pengadaan) = ")
            .push_bind(year)
            .push(" AND EXTRACT(MONTH FROM tanggal_pengadaan) = ")
            .push_bind(month as i32);
    }

    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        query_builder
            .push(" AND tanggal_pengadaan BETWEEN ")
            .push_bind(from)
            .push(" AND ")
            .push_bind(to);
    }
}

/// Postgres 唯一约束冲突 (23505)
fn is_unique_violation(err: &LedgerError) -> bool {
    match err {
        LedgerError::Database(e) => e
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code == "23505")
            .unwrap_or(false),
        _ => false,
    }
}

/// 并发写入同一类型代码时，唯一约束冲突按重复配置处理
fn map_pricing_conflict(err: LedgerError, type_code: &str) -> LedgerError {
    if is_unique_violation(&err) {
        LedgerError::DuplicatePricingConfig(type_code.to_string())
    } else {
        err
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    /// 按类型代码查询定价配置
    async fn find_pricing_by_type(&self, type_code: &str) -> Result<Option<PricingConfig>> {
        let row = sqlx::query_as::<_, PricingRow>(&format!(
            "SELECT {} FROM pengaturan_pengadaans WHERE jenis_pengadaan_barang = $1",
            PRICING_COLUMNS
        ))
        .bind(type_code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn get_pricing(&self, id: i64) -> Result<Option<PricingConfig>> {
        let row = sqlx::query_as::<_, PricingRow>(&format!(
            "SELECT {} FROM pengaturan_pengadaans WHERE id = $1",
            PRICING_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn list_pricing(&self) -> Result<Vec<PricingConfig>> {
        let rows = sqlx::query_as::<_, PricingRow>(&format!(
            "SELECT {} FROM pengaturan_pengadaans ORDER BY id",
            PRICING_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_pricing(&self, pricing: PricingConfig) -> Result<PricingConfig> {
        let sql = format!(
            r#"
            INSERT INTO pengaturan_pengadaans
                (jenis_pengadaan_barang, satuan, harga_per_satuan, ppn, pph, tanpa_pajak)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            PRICING_COLUMNS
        );
        let row = timed_write(
            "INSERT pengaturan_pengadaans",
            sqlx::query_as::<_, PricingRow>(&sql)
                .bind(&pricing.type_code)
                .bind(&pricing.unit)
                .bind(&pricing.unit_price)
                .bind(&pricing.vat_percent)
                .bind(&pricing.withholding_percent)
                .bind(pricing.tax_exempt)
                .fetch_one(&self.pool),
        )
        .await
        .map_err(|e| map_pricing_conflict(e, &pricing.type_code))?;
        Ok(row.into())
    }

    async fn save_pricing(&self, pricing: &PricingConfig) -> Result<()> {
        let result = timed_write(
            "UPDATE pengaturan_pengadaans",
            sqlx::query(
                r#"
                UPDATE pengaturan_pengadaans
                SET jenis_pengadaan_barang = $2, satuan = $3, harga_per_satuan = $4,
                    ppn = $5, pph = $6, tanpa_pajak = $7, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(pricing.id)
            .bind(&pricing.type_code)
            .bind(&pricing.unit)
            .bind(&pricing.unit_price)
            .bind(&pricing.vat_percent)
            .bind(&pricing.withholding_percent)
            .bind(pricing.tax_exempt)
            .execute(&self.pool),
        )
        .await
        .map_err(|e| map_pricing_conflict(e, &pricing.type_code))?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(format!("pricing {}", pricing.id)));
        }
        Ok(())
    }

    async fn delete_pricing(&self, id: i64) -> Result<bool> {
        let result = timed_write(
            "DELETE pengaturan_pengadaans",
            sqlx::query("DELETE FROM pengaturan_pengadaans WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// 按订单号查询 (可能有历史遗留的多条)
    async fn find_orders_by_number(&self, order_number: &str) -> Result<Vec<ProcurementOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM pengadaan WHERE no_preorder = $1 ORDER BY id",
            ORDER_COLUMNS
        ))
        .bind(order_number)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_orders_by_type(&self, type_code: &str) -> Result<Vec<ProcurementOrder>> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM pengadaan WHERE jenis_pengadaan_barang = $1 ORDER BY id",
            ORDER_COLUMNS
        ))
        .bind(type_code)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 列表查询: 关键字、月份、日期区间，按采购日期降序
    async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<PageRequest>,
    ) -> Result<Vec<ProcurementOrder>> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM pengadaan WHERE TRUE", ORDER_COLUMNS));
        push_filter(&mut query_builder, filter);
        query_builder.push(" ORDER BY tanggal_pengadaan DESC, id ASC");

        if let Some(page) = page {
            query_builder
                .push(" LIMIT ")
                .push_bind(page.per_page as i64)
                .push(" OFFSET ")
                .push_bind(page.offset() as i64);
        }

        let rows = query_builder
            .build_query_as::<OrderRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn count_orders(&self, filter: &OrderFilter) -> Result<u64> {
        let mut query_builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM pengadaan WHERE TRUE");
        push_filter(&mut query_builder, filter);

        let total: i64 = query_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(total as u64)
    }

    async fn get_order(&self, id: i64) -> Result<Option<ProcurementOrder>> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {} FROM pengadaan WHERE id = $1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn insert_order(&self, order: ProcurementOrder) -> Result<ProcurementOrder> {
        let (amount, unit) = payment_columns(&order);
        let sql = format!(
            r#"
            INSERT INTO pengadaan (
                nama_suplier, nama_perusahaan, jenis_bank, no_rekening, atasnama_rekening,
                no_preorder, tanggal_pengadaan, tanggal_pengajuan, jenis_pengadaan_barang, kuantum,
                in_data, jumlah_pembayaran, satuan_pembayaran, spp,
                harga_sebelum_pajak, dpp, ppn_total, pph_total, nominal,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                      $15, $16, $17, $18, $19, $20, $21)
            RETURNING {}
            "#,
            ORDER_COLUMNS
        );

        let row = timed_write(
            "INSERT pengadaan",
            sqlx::query_as::<_, OrderRow>(&sql)
                .bind(&order.supplier_name)
                .bind(&order.company_name)
                .bind(&order.bank_name)
                .bind(&order.account_number)
                .bind(&order.account_holder)
                .bind(&order.order_number)
                .bind(order.procurement_date)
                .bind(order.submission_date)
                .bind(&order.type_code)
                .bind(&order.quantity)
                .bind(Json(&order.shipments))
                .bind(amount)
                .bind(unit)
                .bind(&order.spp)
                .bind(&order.tax.pre_tax_price)
                .bind(&order.tax.dpp)
                .bind(&order.tax.vat_total)
                .bind(&order.tax.withholding_total)
                .bind(&order.tax.net_amount)
                .bind(order.created_at)
                .bind(order.updated_at)
                .fetch_one(&self.pool),
        )
        .await?;
        Ok(row.into())
    }

    async fn save_order(&self, order: &ProcurementOrder) -> Result<()> {
        let (amount, unit) = payment_columns(order);
        let result = timed_write(
            "UPDATE pengadaan",
            sqlx::query(
                r#"
                UPDATE pengadaan SET
                    nama_suplier = $2, nama_perusahaan = $3, jenis_bank = $4, no_rekening = $5,
                    atasnama_rekening = $6, no_preorder = $7, tanggal_pengadaan = $8,
                    tanggal_pengajuan = $9, jenis_pengadaan_barang = $10, kuantum = $11,
                    in_data = $12, jumlah_pembayaran = $13, satuan_pembayaran = $14, spp = $15,
                    harga_sebelum_pajak = $16, dpp = $17, ppn_total = $18, pph_total = $19,
                    nominal = $20, updated_at = $21
                WHERE id = $1
                "#,
            )
            .bind(order.id)
            .bind(&order.supplier_name)
            .bind(&order.company_name)
            .bind(&order.bank_name)
            .bind(&order.account_number)
            .bind(&order.account_holder)
            .bind(&order.order_number)
            .bind(order.procurement_date)
            .bind(order.submission_date)
            .bind(&order.type_code)
            .bind(&order.quantity)
            .bind(Json(&order.shipments))
            .bind(amount)
            .bind(unit)
            .bind(&order.spp)
            .bind(&order.tax.pre_tax_price)
            .bind(&order.tax.dpp)
            .bind(&order.tax.vat_total)
            .bind(&order.tax.withholding_total)
            .bind(&order.tax.net_amount)
            .bind(order.updated_at)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(format!("order {}", order.id)));
        }
        Ok(())
    }

    /// 只更新税额字段 (定价变更后的重算)
    async fn save_order_tax(&self, id: i64, tax: &TaxResult) -> Result<()> {
        let result = timed_write(
            "UPDATE pengadaan tax",
            sqlx::query(
                r#"
                UPDATE pengadaan SET
                    harga_sebelum_pajak = $2, dpp = $3, ppn_total = $4, pph_total = $5,
                    nominal = $6, updated_at = now()
                WHERE id = $1
                "#,
            )
            .bind(id)
            .bind(&tax.pre_tax_price)
            .bind(&tax.dpp)
            .bind(&tax.vat_total)
            .bind(&tax.withholding_total)
            .bind(&tax.net_amount)
            .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(LedgerError::NotFound(format!("order {}", id)));
        }
        Ok(())
    }

    async fn delete_order(&self, id: i64) -> Result<bool> {
        let result = timed_write(
            "DELETE pengadaan",
            sqlx::query("DELETE FROM pengadaan WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

pub mod extract;
pub mod handlers;

pub use extract::ApiJson;

pub use handlers::*;

use crate::service::LedgerService;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// 构建路由
pub fn routes(service: Arc<LedgerService>) -> Router {
    // 采购订单
    let order_routes = Router::new()
        .route("/api/pengadaan", post(submit_order).get(list_orders))
        .route("/api/pengadaan/export", get(export_orders))
        .route(
            "/api/pengadaan/:id",
            get(show_order).put(update_order).delete(delete_order),
        )
        .route("/api/pengadaan/:id/download", get(download_order));

    // 定价配置
    let pricing_routes = Router::new()
        .route("/api/pengaturan", get(list_pricing).post(create_pricing))
        .route(
            "/api/pengaturan/:id",
            get(show_pricing).put(update_pricing).delete(delete_pricing),
        );

    Router::new()
        .route("/health", get(health_check))
        .merge(order_routes)
        .merge(pricing_routes)
        .with_state(service)
}

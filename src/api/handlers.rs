use super::extract::ApiJson;
use crate::db::export_orders_csv;
use crate::error::LedgerError;
use crate::models::{
    OrderFilter, OrderSubmission, OrderUpdate, PricingConfig, PricingInput, RecomputeSummary,
    SubmitOutcome,
};
use crate::service::{LedgerService, ValidationErrors};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

/// 统一响应体
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ValidationErrors>,
}

/// 定价更新响应: 配置本身 + 重算统计
#[derive(Debug, Serialize)]
pub struct PricingUpdateResponse {
    pub pricing: PricingConfig,
    pub recompute: RecomputeSummary,
}

fn success<T: Serialize>(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Response {
    let response = ApiResponse {
        success: true,
        message: message.into(),
        data,
        errors: None,
    };
    (status, Json(response)).into_response()
}

fn failure(e: LedgerError) -> Response {
    let status = e.status_code();
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    } else {
        tracing::info!("Request rejected ({}): {}", status.as_u16(), e);
    }

    let errors = match &e {
        LedgerError::Validation(errors) => Some(errors.clone()),
        _ => None,
    };
    let response: ApiResponse<()> = ApiResponse {
        success: false,
        message: format!("Error: {}", e),
        data: None,
        errors,
    };
    (status, Json(response)).into_response()
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 提交订单: 201 新建 / 200 合并 / 409 冲突 / 400 缺少定价
pub async fn submit_order(
    State(service): State<Arc<LedgerService>>,
    ApiJson(req): ApiJson<OrderSubmission>,
) -> Response {
    match service.submit(req).await {
        Ok(outcome @ SubmitOutcome::Created(_)) => {
            success(StatusCode::CREATED, "Order created", Some(outcome))
        }
        Ok(outcome @ SubmitOutcome::Merged(_)) => {
            success(StatusCode::OK, "Order merged with incoming shipments", Some(outcome))
        }
        Err(e) => failure(e),
    }
}

pub async fn list_orders(
    State(service): State<Arc<LedgerService>>,
    Query(filter): Query<OrderFilter>,
) -> Response {
    match service.list_orders(&filter).await {
        Ok(page) => {
            let message = format!("{} of {} orders", page.data.len(), page.total);
            success(StatusCode::OK, message, Some(page))
        }
        Err(e) => failure(e),
    }
}

/// 导出 CSV 台账 (不分页)
pub async fn export_orders(
    State(service): State<Arc<LedgerService>>,
    Query(filter): Query<OrderFilter>,
) -> Response {
    let orders = match service.all_orders(&filter).await {
        Ok(orders) => orders,
        Err(e) => return failure(e),
    };

    let mut body = Vec::new();
    if let Err(e) = export_orders_csv(&orders, &mut body) {
        tracing::error!("CSV export failed: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "CSV export failed").into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"pengadaan.csv\""),
        ],
        body,
    )
        .into_response()
}

pub async fn show_order(State(service): State<Arc<LedgerService>>, Path(id): Path<i64>) -> Response {
    match service.get_order(id).await {
        Ok(order) => success(StatusCode::OK, "Order found", Some(order)),
        Err(e) => failure(e),
    }
}

/// 单个订单以 JSON 附件下载
pub async fn download_order(
    State(service): State<Arc<LedgerService>>,
    Path(id): Path<i64>,
) -> Response {
    let order = match service.get_order(id).await {
        Ok(order) => order,
        Err(e) => return failure(e),
    };

    let body = match serde_json::to_vec_pretty(&order) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Order #{} download failed: {}", id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Download failed").into_response();
        }
    };

    let disposition = format!("attachment; filename=\"pengadaan_{}.json\"", order.id);
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

pub async fn update_order(
    State(service): State<Arc<LedgerService>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<OrderUpdate>,
) -> Response {
    match service.update_order(id, req).await {
        Ok(order) => success(StatusCode::OK, "Order updated", Some(order)),
        Err(e) => failure(e),
    }
}

pub async fn delete_order(State(service): State<Arc<LedgerService>>, Path(id): Path<i64>) -> Response {
    match service.delete_order(id).await {
        Ok(()) => success::<()>(StatusCode::OK, "Order deleted", None),
        Err(e) => failure(e),
    }
}

pub async fn list_pricing(State(service): State<Arc<LedgerService>>) -> Response {
    match service.list_pricing().await {
        Ok(all) => success(StatusCode::OK, format!("{} pricing configs", all.len()), Some(all)),
        Err(e) => failure(e),
    }
}

pub async fn create_pricing(
    State(service): State<Arc<LedgerService>>,
    ApiJson(req): ApiJson<PricingInput>,
) -> Response {
    match service.create_pricing(req).await {
        Ok(pricing) => success(StatusCode::CREATED, "Pricing created", Some(pricing)),
        Err(e) => failure(e),
    }
}

pub async fn show_pricing(State(service): State<Arc<LedgerService>>, Path(id): Path<i64>) -> Response {
    match service.get_pricing(id).await {
        Ok(pricing) => success(StatusCode::OK, "Pricing found", Some(pricing)),
        Err(e) => failure(e),
    }
}

/// 更新定价并重算同类型订单
pub async fn update_pricing(
    State(service): State<Arc<LedgerService>>,
    Path(id): Path<i64>,
    ApiJson(req): ApiJson<PricingInput>,
) -> Response {
    match service.update_pricing(id, req).await {
        Ok((pricing, recompute)) => {
            let message = format!(
                "Pricing updated, {} order(s) recomputed, {} failed",
                recompute.updated, recompute.failed
            );
            success(StatusCode::OK, message, Some(PricingUpdateResponse { pricing, recompute }))
        }
        Err(e) => failure(e),
    }
}

pub async fn delete_pricing(State(service): State<Arc<LedgerService>>, Path(id): Path<i64>) -> Response {
    match service.delete_pricing(id).await {
        Ok(()) => success::<()>(StatusCode::OK, "Pricing deleted", None),
        Err(e) => failure(e),
    }
}

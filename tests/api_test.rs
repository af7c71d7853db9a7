use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use pengadaan_ledger::db::MemoryStore;
use pengadaan_ledger::{api, LedgerService};

fn app() -> Router {
    let service = LedgerService::new(Arc::new(MemoryStore::new()));
    api::routes(Arc::new(service))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn order_body(order_number: &str, company: &str, type_code: &str, shipments: Value) -> Value {
    json!({
        "supplier_name": "Sumber Tani",
        "company_name": company,
        "bank_name": "Mandiri",
        "account_number": "0012345678",
        "account_holder": "Budi Santoso",
        "order_number": order_number,
        "procurement_date": "2025-06-10",
        "submission_date": "2025-06-12",
        "type_code": type_code,
        "quantity": "100 KG",
        "shipments": shipments
    })
}

async fn with_beras_pricing() -> Router {
    let app = app();
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/pengaturan",
        Some(json!({"type_code": "beras", "unit": "kg", "unit_price": "10"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    app
}

#[tokio::test]
async fn health_check_responds() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");
}

#[tokio::test]
async fn submit_creates_then_merges() {
    let app = with_beras_pricing().await;
    let first = order_body(
        "PO-001",
        "CV Makmur",
        "BERAS",
        json!([{"sequence_number": 1, "date": "2025-06-01", "quantity": "5 KG"}]),
    );
    let (status, body) = send_json(&app, Method::POST, "/api/pengadaan", Some(first)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["outcome"], "created");
    assert_eq!(body["data"]["order"]["bank_name"], "MANDIRI");

    let second = order_body(
        "PO-001",
        "CV Makmur",
        "beras",
        json!([{"sequence_number": 2, "date": "2025-06-02", "quantity": "3 KG"}]),
    );
    let (status, body) = send_json(&app, Method::POST, "/api/pengadaan", Some(second)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["outcome"], "merged");
    assert_eq!(body["data"]["order"]["shipments"].as_array().unwrap().len(), 2);

    let (status, body) = send_json(&app, Method::GET, "/api/pengadaan", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn conflicting_identity_is_409() {
    let app = with_beras_pricing().await;
    let (status, _) = send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body("PO-001", "CV Makmur", "BERAS", json!([]))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body("PO-001", "PT Lain", "BERAS", json!([]))),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_pricing_is_400() {
    let app = app();
    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body("PO-009", "CV Makmur", "GABAH", json!([]))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = send_json(&app, Method::GET, "/api/pengadaan", None).await;
    assert!(body["data"]["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn validation_errors_are_listed_per_field() {
    let app = with_beras_pricing().await;
    let mut body = order_body("PO-001", "CV Makmur", "BERAS", json!([]));
    body["quantity"] = json!("seratus");
    body["supplier_name"] = json!("");

    let (status, body) = send_json(&app, Method::POST, "/api/pengadaan", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["supplier_name"].is_array());
    assert!(body["errors"]["quantity"].is_array());
}

#[tokio::test]
async fn update_with_incomplete_shipment_is_422() {
    let app = with_beras_pricing().await;
    let (_, created) = send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body("PO-001", "CV Makmur", "BERAS", json!([]))),
    )
    .await;
    let id = created["data"]["order"]["id"].as_i64().unwrap();

    let update = json!({
        "order_number": "PO-001",
        "shipments": [{"sequence_number": 1, "quantity": "5 KG"}]
    });
    let (status, _) =
        send_json(&app, Method::PUT, &format!("/api/pengadaan/{}", id), Some(update)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pricing_update_reports_recompute() {
    let app = with_beras_pricing().await;
    send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body(
            "PO-001",
            "CV Makmur",
            "BERAS",
            json!([{"sequence_number": 1, "date": "2025-06-01", "quantity": "10 KG"}]),
        )),
    )
    .await;

    let (status, body) = send_json(
        &app,
        Method::PUT,
        "/api/pengaturan/1",
        Some(json!({"type_code": "BERAS", "unit": "KG", "unit_price": "20"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["recompute"]["updated"], 1);
    assert_eq!(body["data"]["recompute"]["failed"], 0);
}

#[tokio::test]
async fn export_returns_csv_with_payment_display() {
    let app = with_beras_pricing().await;
    send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body("PO-001", "CV Makmur", "BERAS", json!([]))),
    )
    .await;

    let (status, body) = send(&app, Method::GET, "/api/pengadaan/export", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(body).unwrap();
    let mut lines = text.lines();
    assert!(lines.next().unwrap().starts_with("id,order_number"));
    assert!(lines.next().unwrap().contains("0 KG"));
}

#[tokio::test]
async fn unknown_order_is_404() {
    let (status, _) = send_json(&app(), Method::GET, "/api/pengadaan/42", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_returns_paging_metadata() {
    let app = with_beras_pricing().await;
    for n in 1..=3 {
        let (status, _) = send_json(
            &app,
            Method::POST,
            "/api/pengadaan",
            Some(order_body(&format!("PO-00{}", n), "CV Makmur", "BERAS", json!([]))),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send_json(&app, Method::GET, "/api/pengadaan?per_page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    let page = &body["data"];
    assert_eq!(page["data"].as_array().unwrap().len(), 2);
    assert_eq!(page["current_page"], 1);
    assert_eq!(page["last_page"], 2);
    assert_eq!(page["per_page"], 2);
    assert_eq!(page["total"], 3);
    assert_eq!(page["from"], 1);
    assert_eq!(page["to"], 2);

    let (_, body) = send_json(&app, Method::GET, "/api/pengadaan?per_page=2&page=2", None).await;
    assert_eq!(body["data"]["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["from"], 3);
}

#[tokio::test]
async fn download_returns_order_as_json_attachment() {
    let app = with_beras_pricing().await;
    let (_, created) = send_json(
        &app,
        Method::POST,
        "/api/pengadaan",
        Some(order_body("PO-001", "CV Makmur", "BERAS", json!([]))),
    )
    .await;
    let id = created["data"]["order"]["id"].as_i64().unwrap();

    let request = Request::builder()
        .uri(format!("/api/pengadaan/{}/download", id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"pengadaan_{}.json\"", id).as_str()
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let order: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(order["order_number"], "PO-001");

    let (status, _) = send_json(&app, Method::GET, "/api/pengadaan/99/download", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_body_uses_the_error_envelope() {
    let app = with_beras_pricing().await;
    let mut body = order_body("PO-001", "CV Makmur", "BERAS", json!([]));
    body["procurement_date"] = json!("10/06/2025");

    let (status, body) = send_json(&app, Method::POST, "/api/pengadaan", Some(body)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["body"].is_array());

    let (status, body) = send(&app, Method::POST, "/api/pengaturan", None).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["success"], false);
}

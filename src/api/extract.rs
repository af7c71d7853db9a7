use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use super::handlers::ApiResponse;
use crate::service::ValidationErrors;

/// JSON 请求体，解析失败时返回统一响应体而不是纯文本
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(reject(rejection)),
        }
    }
}

fn reject(rejection: JsonRejection) -> Response {
    let status = rejection.status();
    let detail = rejection.body_text();
    tracing::info!("Request body rejected ({}): {}", status.as_u16(), detail);

    let response: ApiResponse<()> = ApiResponse {
        success: false,
        message: format!("Error: {}", detail),
        data: None,
        errors: Some(ValidationErrors::single("body", detail)),
    };
    (status, Json(response)).into_response()
}

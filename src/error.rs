use axum::http::StatusCode;
use thiserror::Error;

use crate::service::validation::ValidationErrors;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// 账本操作错误
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// 更新时任一入库记录不完整，整批拒绝
    #[error("every shipment record must have a sequence number, date and quantity")]
    IncompleteShipmentBatch,

    #[error("procurement type {0} has no pricing configuration")]
    MissingPricingConfig(String),

    #[error("order number {order_number} is already used by a different supplier, company or type")]
    IdentityConflict { order_number: String },

    #[error("pricing configuration for {0} already exists")]
    DuplicatePricingConfig(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0} timed out")]
    Timeout(&'static str),
}

impl LedgerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            LedgerError::Validation(_) | LedgerError::IncompleteShipmentBatch => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            LedgerError::MissingPricingConfig(_) => StatusCode::BAD_REQUEST,
            LedgerError::IdentityConflict { .. } | LedgerError::DuplicatePricingConfig(_) => {
                StatusCode::CONFLICT
            }
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::Database(_) | LedgerError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for LedgerError {
    fn from(errors: ValidationErrors) -> Self {
        LedgerError::Validation(errors)
    }
}

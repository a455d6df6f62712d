//! Error handling for the Opsline inventory backend
//!
//! Every error is rendered as `{"error": {"code", "message", "field", "details"}}`

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{BomError, ItemId, StockShortage};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock for {} item(s)", .shortages.len())]
    InsufficientStock {
        shortages: BTreeMap<ItemId, StockShortage>,
    },

    #[error("Cyclic recipe: {0}")]
    CyclicRecipe(String),

    #[error("Quantity overflow: {0}")]
    QuantityOverflow(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<BomError> for AppError {
    fn from(err: BomError) -> Self {
        match err {
            BomError::ItemNotFound(item_id) => AppError::NotFound(format!("Item {}", item_id)),
            BomError::CyclicRecipe { .. } => AppError::CyclicRecipe(err.to_string()),
            BomError::QuantityOverflow { .. } => AppError::QuantityOverflow(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let first = field_errors
            .iter()
            .min_by_key(|(field, _)| **field)
            .and_then(|(field, errs)| errs.first().map(|err| (*field, err)));

        match first {
            Some((field, err)) => AppError::Validation {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|msg| msg.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field)),
            },
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            details: None,
        }
    }
}

impl AppError {
    /// HTTP status and response body for this error
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::InvalidHeader(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("INVALID_HEADER", msg.clone()),
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock { shortages } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    details: Some(serde_json::json!({ "insufficient_items": shortages })),
                    ..ErrorDetail::new(
                        "INSUFFICIENT_STOCK",
                        "Insufficient stock for refill operation",
                    )
                },
            ),
            AppError::CyclicRecipe(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("CYCLIC_RECIPE", msg.clone()),
            ),
            AppError::QuantityOverflow(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("QUANTITY_OVERFLOW", msg.clone()),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("CONFIGURATION_ERROR", format!("Configuration error: {}", msg)),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(code = %error_detail.code, error = %self, "Request rejected");
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use shared::UnitType;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::NotFound("Item 3".into()), StatusCode::NOT_FOUND),
            (AppError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (AppError::InvalidHeader("x-operator-id".into()), StatusCode::BAD_REQUEST),
            (AppError::CyclicRecipe("loop".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::QuantityOverflow("big".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (AppError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (
                AppError::DatabaseError(sqlx::Error::RowNotFound),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_server_error_codes() {
        let cases = [
            (AppError::Configuration("port".into()), "CONFIGURATION_ERROR"),
            (AppError::Internal("boom".into()), "INTERNAL_ERROR"),
            (AppError::DatabaseError(sqlx::Error::PoolTimedOut), "DATABASE_ERROR"),
        ];
        for (err, code) in cases {
            let (status, detail) = err.status_and_detail();
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(detail.code, code);
        }
    }

    #[test]
    fn test_bom_errors_convert() {
        assert!(matches!(
            AppError::from(BomError::ItemNotFound(9)),
            AppError::NotFound(ref msg) if msg == "Item 9"
        ));
        assert!(matches!(
            AppError::from(BomError::CyclicRecipe { item_id: 1, path: vec![1, 1] }),
            AppError::CyclicRecipe(_)
        ));
        assert!(matches!(
            AppError::from(BomError::QuantityOverflow { item_id: 1 }),
            AppError::QuantityOverflow(_)
        ));
    }

    #[test]
    fn test_insufficient_stock_carries_shortages() {
        let shortages = BTreeMap::from([(
            11,
            StockShortage {
                item_id: 11,
                item_name: "Cacao".into(),
                required: Decimal::from(1200),
                available: Decimal::from(1000),
                shortage: Decimal::from(200),
                unit_type: UnitType::G,
            },
        )]);
        let (status, detail) = AppError::InsufficientStock { shortages }.status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.code, "INSUFFICIENT_STOCK");
        let details = detail.details.unwrap();
        assert_eq!(details["insufficient_items"]["11"]["item_name"], "Cacao");
        assert_eq!(details["insufficient_items"]["11"]["unit_type"], "G");
    }

    #[test]
    fn test_validation_errors_name_the_field() {
        use validator::Validate;

        let request = shared::RefillRequest {
            location_id: 1,
            items: vec![],
            remarks: None,
        };
        let err = AppError::from(request.validate().unwrap_err());
        match err {
            AppError::Validation { field, message } => {
                assert_eq!(field, "items");
                assert_eq!(message, "At least one item is required");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

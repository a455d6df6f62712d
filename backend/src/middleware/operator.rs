//! Acting operator extraction
//!
//! Requests may name the operator performing them in the `X-Operator-Id`
//! header. The id is recorded as `performed_by` on stock movements.

use axum::http::{request::Parts, HeaderMap};
use shared::OperatorId;

use crate::error::AppError;

pub const OPERATOR_HEADER: &str = "x-operator-id";

/// Operator named by the request, if any
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Operator(pub Option<OperatorId>);

/// Read the operator id from request headers. A missing header is not an error.
pub fn operator_from_headers(headers: &HeaderMap) -> Result<Option<OperatorId>, AppError> {
    let Some(value) = headers.get(OPERATOR_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .map(str::trim)
        .and_then(|raw| raw.parse::<OperatorId>().ok())
        .filter(|id| *id > 0)
        .map(Some)
        .ok_or_else(|| {
            AppError::InvalidHeader(format!("{} must be a positive integer", OPERATOR_HEADER))
        })
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for Operator
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        operator_from_headers(&parts.headers).map(Operator)
    }
}

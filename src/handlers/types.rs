//! # Common API Types
//!
//! Response envelopes, list metadata and query helpers shared by the
//! handlers.

use axum::{
    Json,
    extract::{
        Query,
        rejection::{JsonRejection, QueryRejection},
    },
};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::telemetry;

pub const DEFAULT_LIMIT: u64 = 100;
pub const MAX_LIMIT: u64 = 500;

/// Keep an explicit `null` apart from an absent field: with `#[serde(default)]`
/// a missing field is `None` and `null` is `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Response metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResponseMeta {
    /// Request identifier, equal to the `X-Trace-Id` of the response
    #[schema(example = "0f8fad5b-d9cb-469f-a165-70867728950e")]
    pub request_id: String,
    /// Response timestamp (ISO 8601)
    #[schema(example = "2026-10-16T10:30:00Z")]
    pub timestamp: String,
}

impl ResponseMeta {
    pub fn current() -> Self {
        Self {
            request_id: telemetry::current_trace_id()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Standard wrapper for single-resource responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            meta: ResponseMeta::current(),
        }
    }
}

/// Standard wrapper for list responses
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub meta: ResponseMeta,
    /// Number of items in `data`
    pub total: u64,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>) -> Self {
        Self {
            total: data.len() as u64,
            data,
            meta: ResponseMeta::current(),
        }
    }
}

/// Offset pagination parameters
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// Page size, 1..=500 (default 100)
    pub limit: Option<u64>,
    /// Rows to skip (default 0)
    pub offset: Option<u64>,
}

impl PageParams {
    /// Resolve to `(limit, offset)`, rejecting out-of-range limits.
    pub fn resolve(&self) -> Result<(u64, u64), ApiError> {
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(field_error(
                "limit",
                &format!("limit must be between 1 and {MAX_LIMIT}"),
            ));
        }
        Ok((limit, self.offset.unwrap_or(0)))
    }
}

/// Validation failure for a single field.
pub fn field_error(field: &str, message: &str) -> ApiError {
    validation_error(
        message,
        serde_json::json!({ "field": field, "message": message }),
    )
}

/// Unwrap a query extractor, rendering rejections as problem+json.
pub fn query<T>(result: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    result.map(|Query(value)| value).map_err(ApiError::from)
}

/// Unwrap a JSON body extractor, rendering rejections as problem+json.
pub fn json_body<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    result.map(|Json(value)| value).map_err(ApiError::from)
}

/// Blank-string-aware presence check for required text fields.
pub fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(field_error(field, &format!("{field} is required")));
    }
    Ok(())
}

/// Light email shape check: non-empty and containing `@`.
pub fn require_email(field: &str, value: &str) -> Result<(), ApiError> {
    require_text(field, value)?;
    if !value.contains('@') {
        return Err(field_error(field, &format!("{field} must be a valid email address")));
    }
    Ok(())
}

//! Server API Types
//!
//! Query parameters and error bodies for the REST endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::desk::DeskError;

/// `?limit=` is taken raw so a malformed or repeated value falls back
/// instead of rejecting the request
#[derive(Debug, Default, Deserialize)]
pub struct HistoricTradesQuery {
    pub limit: Option<String>,
}

impl HistoricTradesQuery {
    /// Build from decoded query pairs; the first `limit` wins
    pub fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        Self {
            limit: pairs
                .into_iter()
                .find(|(key, _)| key == "limit")
                .map(|(_, value)| value),
        }
    }

    /// Positive limit from the leading digits, else `default`
    pub fn resolve_limit(&self, default: usize) -> usize {
        self.limit
            .as_deref()
            .and_then(leading_count)
            .filter(|&limit| limit > 0)
            .unwrap_or(default)
    }
}

/// Leading unsigned integer of `raw` ("25abc" -> 25, "2.5" -> 2).
/// Negative values and inputs without leading digits give `None`.
fn leading_count(raw: &str) -> Option<usize> {
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let digits = &raw[..end];

    if digits.is_empty() {
        return None;
    }
    // Saturate rather than reject absurdly long digit runs
    Some(digits.parse::<usize>().unwrap_or(usize::MAX))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error returned by API handlers
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl From<DeskError> for ApiError {
    fn from(err: DeskError) -> Self {
        match err {
            DeskError::TradeNotFound(id) => {
                tracing::debug!(trade_id = %id, "Trade lookup missed");
                Self {
                    status: StatusCode::NOT_FOUND,
                    message: "Trade not found".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

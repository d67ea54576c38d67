//! Request & response types of the Ad Store REST API.
//!
//! Every response carries the [`Status`] discriminator and, on failure,
//! a human-readable `message`. Callers branch only on the discriminator,
//! there are no structured error codes.

use serde::{Deserialize, Serialize};

use crate::{Ad, Stats};

pub use crate::analytics::RecordRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// Response of the routes which only confirm an operation,
/// e.g. `DELETE /api/ads/:id` or the analytics record routes.
/// Also the body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub status: Status,
    pub message: String,
}

/// Response of `GET /` & `GET /api` - the health route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub status: Status,
    pub message: String,
    pub version: String,
}

/// Response of the routes returning a single [`Ad`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdResponse {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Ad,
}

/// Response of `GET /api/ads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdListResponse {
    pub status: Status,
    pub count: u64,
    pub data: Vec<Ad>,
}

/// Response of `GET /api/analytics/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    pub status: Status,
    pub data: Stats,
}

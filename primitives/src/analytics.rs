use chrono::{DateTime, Utc};
use parse_display::Display;
use serde::{Deserialize, Serialize};

use crate::AdId;

pub const IMPRESSION: EventType = EventType::Impression;
pub const CLICK: EventType = EventType::Click;

#[derive(Debug, Display, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[display(style = "SNAKE_CASE")]
pub enum EventType {
    Impression,
    Click,
}

/// A single tracked rendering (impression) or activation (click) of an ad.
///
/// Events are appended to the store's event log on every successful
/// record operation, in addition to incrementing the [`Ad`] counter.
/// The log is the audit trail for the optional `location` the record
/// payload carries.
///
/// [`Ad`]: crate::Ad
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub ad_id: AdId,
    /// Server-assigned at the time the event was recorded.
    pub time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Payload of the `POST /api/analytics/impression` & `/api/analytics/click` routes.
///
/// `ad_id` is deserialized as an optional raw string so that the server
/// can distinguish a missing id from an invalid one in its responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRequest {
    pub ad_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// The aggregate analytics snapshot, recomputed on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_impressions: u64,
    pub total_clicks: u64,
    /// Click-through rate in percent, rounded to 2 decimal places.
    /// `0` when there are no impressions.
    pub ctr: f64,
}

impl Stats {
    pub fn new(total_impressions: u64, total_clicks: u64) -> Self {
        let ctr = if total_impressions > 0 {
            (total_clicks as f64 / total_impressions as f64 * 10_000.0).round() / 100.0
        } else {
            0.0
        };

        Self {
            total_impressions,
            total_clicks,
            ctr,
        }
    }
}

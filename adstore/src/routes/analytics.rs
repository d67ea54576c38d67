//! Routes of the `/api/analytics` resource.

use std::sync::Arc;

use axum::{http::StatusCode, Extension, Json};
use chrono::Utc;
use slog::info;

use primitives::{
    adstore::{MessageResponse, RecordRequest, StatsResponse, Status},
    analytics::{Event, EventType, CLICK, IMPRESSION},
    Stats,
};

use crate::{response::ResponseError, routes::ads::parse_ad_id, Application};

/// `POST /api/analytics/impression`
pub async fn record_impression(
    Extension(app): Extension<Arc<Application>>,
    Json(request): Json<RecordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ResponseError> {
    record(app, IMPRESSION, request, "Impression tracked").await
}

/// `POST /api/analytics/click`
pub async fn record_click(
    Extension(app): Extension<Arc<Application>>,
    Json(request): Json<RecordRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ResponseError> {
    record(app, CLICK, request, "Click tracked").await
}

/// Increments the matching counter of the ad and appends an [`Event`]
/// to the audit log. Counters live on ads, so recording against an
/// unknown id fails with `404 Ad not found`.
async fn record(
    app: Arc<Application>,
    event_type: EventType,
    request: RecordRequest,
    message: &str,
) -> Result<(StatusCode, Json<MessageResponse>), ResponseError> {
    let ad_id = request
        .ad_id
        .ok_or_else(|| ResponseError::BadRequest("Missing ad_id".to_string()))?;
    let ad_id = parse_ad_id(&ad_id)?;

    if !app.ads.record(ad_id, event_type).await {
        return Err(ResponseError::NotFound("Ad not found".to_string()));
    }

    app.events
        .append(Event {
            event_type,
            ad_id,
            time: Utc::now(),
            location: request.location,
        })
        .await;

    info!(&app.logger, "Recorded {}", event_type; "ad_id" => ad_id.to_string(), "module" => "analytics");

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            status: Status::Success,
            message: message.to_string(),
        }),
    ))
}

/// `GET /api/analytics/stats`
///
/// The snapshot is derived from the per-ad counters on every read,
/// it is never persisted independently.
pub async fn stats(Extension(app): Extension<Arc<Application>>) -> Json<StatsResponse> {
    let (total_impressions, total_clicks) = app.ads.totals().await;

    Json(StatsResponse {
        status: Status::Success,
        data: Stats::new(total_impressions, total_clicks),
    })
}

//! Routes of the `/api/ads` resource.

use std::sync::Arc;

use axum::{extract::Path, http::StatusCode, Extension, Json};
use slog::info;

use primitives::{
    adstore::{AdListResponse, AdResponse, MessageResponse, Status},
    Ad, AdFields, AdId,
};

use crate::{response::ResponseError, Application};

pub(crate) fn parse_ad_id(id: &str) -> Result<AdId, ResponseError> {
    id.parse::<AdId>()
        .map_err(|_| ResponseError::BadRequest("Invalid ad ID".to_string()))
}

/// `GET /api/ads`
///
/// Returns all ads - active and inactive - so that the admin console
/// can manage both; only random selection filters on `active`.
pub async fn ad_list(Extension(app): Extension<Arc<Application>>) -> Json<AdListResponse> {
    let ads = app.ads.list().await;

    Json(AdListResponse {
        status: Status::Success,
        count: ads.len() as u64,
        data: ads,
    })
}

/// `GET /api/ads/random`
pub async fn ad_random(
    Extension(app): Extension<Arc<Application>>,
) -> Result<Json<AdResponse>, ResponseError> {
    let ad = app
        .ads
        .random_active()
        .await
        .ok_or_else(|| ResponseError::NotFound("No ads available".to_string()))?;

    Ok(Json(AdResponse {
        status: Status::Success,
        message: None,
        data: ad,
    }))
}

/// `GET /api/ads/:id`
pub async fn ad_get(
    Extension(app): Extension<Arc<Application>>,
    Path(id): Path<String>,
) -> Result<Json<AdResponse>, ResponseError> {
    let ad_id = parse_ad_id(&id)?;

    let ad = app
        .ads
        .get(ad_id)
        .await
        .ok_or_else(|| ResponseError::NotFound("Ad not found".to_string()))?;

    Ok(Json(AdResponse {
        status: Status::Success,
        message: None,
        data: ad,
    }))
}

/// `POST /api/ads`
pub async fn ad_create(
    Extension(app): Extension<Arc<Application>>,
    Json(fields): Json<AdFields>,
) -> Result<(StatusCode, Json<AdResponse>), ResponseError> {
    let content = fields.validate()?;

    let ad = Ad::new(content);
    app.ads.insert(ad.clone()).await;

    info!(&app.logger, "Created Ad"; "ad_id" => ad.ad_id.to_string(), "module" => "ads");

    Ok((
        StatusCode::CREATED,
        Json(AdResponse {
            status: Status::Success,
            message: Some("Ad created successfully".to_string()),
            data: ad,
        }),
    ))
}

/// `PUT /api/ads/:id`
///
/// Full replace of the editable fields - a field omitted from the payload
/// is not preserved. `ad_id`, `created_at` and the counters survive.
pub async fn ad_update(
    Extension(app): Extension<Arc<Application>>,
    Path(id): Path<String>,
    Json(fields): Json<AdFields>,
) -> Result<Json<AdResponse>, ResponseError> {
    let ad_id = parse_ad_id(&id)?;
    let content = fields.validate()?;

    let ad = app
        .ads
        .update(ad_id, content)
        .await
        .ok_or_else(|| ResponseError::NotFound("Ad not found".to_string()))?;

    info!(&app.logger, "Updated Ad"; "ad_id" => ad.ad_id.to_string(), "module" => "ads");

    Ok(Json(AdResponse {
        status: Status::Success,
        message: Some("Ad updated successfully".to_string()),
        data: ad,
    }))
}

/// `DELETE /api/ads/:id`
///
/// Irreversible, there is no soft-delete.
pub async fn ad_delete(
    Extension(app): Extension<Arc<Application>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ResponseError> {
    let ad_id = parse_ad_id(&id)?;

    if !app.ads.delete(ad_id).await {
        return Err(ResponseError::NotFound("Ad not found".to_string()));
    }

    info!(&app.logger, "Deleted Ad"; "ad_id" => ad_id.to_string(), "module" => "ads");

    Ok(Json(MessageResponse {
        status: Status::Success,
        message: "Ad deleted successfully".to_string(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use primitives::test_util::{dummy_fields, dummy_inactive_ad};

    use crate::test_util::setup_test_app;

    #[tokio::test]
    async fn create_then_get_round_trips_the_submitted_fields() {
        let app = setup_test_app();

        let mut fields = dummy_fields("Inferno Callouts");
        fields.location = Some("EU".to_string());

        let (status_code, Json(created)) =
            ad_create(Extension(app.clone()), Json(fields.clone()))
                .await
                .expect("Should create");

        assert_eq!(StatusCode::CREATED, status_code);
        assert_eq!(Status::Success, created.status);
        assert_eq!(Some("Ad created successfully".to_string()), created.message);
        assert_eq!(0, created.data.impressions);
        assert_eq!(0, created.data.clicks);

        let Json(fetched) = ad_get(
            Extension(app.clone()),
            Path(created.data.ad_id.to_string()),
        )
        .await
        .expect("Should fetch");

        assert_eq!(created.data, fetched.data);
        assert_eq!(fields.title.as_deref(), Some(fetched.data.title.as_str()));
        assert_eq!(Some("EU".to_string()), fetched.data.location);

        // the single active ad is also what random selection returns
        let Json(random) = ad_random(Extension(app)).await.expect("Should pick one");
        assert_eq!(created.data, random.data);
    }

    #[tokio::test]
    async fn create_validates_the_payload() {
        let app = setup_test_app();

        let missing = AdFields {
            title: None,
            ..dummy_fields("Invalid")
        };
        assert_eq!(
            Err(ResponseError::BadRequest(
                "Missing required field: title".to_string()
            )),
            ad_create(Extension(app.clone()), Json(missing))
                .await
                .map(|_| ())
        );

        let invalid_url = AdFields {
            image_url: Some("not a url".to_string()),
            ..dummy_fields("Invalid")
        };
        assert_eq!(
            Err(ResponseError::BadRequest("Invalid image URL".to_string())),
            ad_create(Extension(app), Json(invalid_url))
                .await
                .map(|_| ())
        );
    }

    #[tokio::test]
    async fn update_replaces_and_delete_is_final() {
        let app = setup_test_app();

        let (_, Json(created)) = ad_create(Extension(app.clone()), Json(dummy_fields("Original")))
            .await
            .expect("Should create");
        let id_string = created.data.ad_id.to_string();

        // omitted `location` is cleared, the id & created_at survive
        let update = AdFields {
            title: Some("Replaced".to_string()),
            active: Some(false),
            ..dummy_fields("Original")
        };
        let Json(updated) = ad_update(
            Extension(app.clone()),
            Path(id_string.clone()),
            Json(update),
        )
        .await
        .expect("Should update");

        assert_eq!(created.data.ad_id, updated.data.ad_id);
        assert_eq!(created.data.created_at, updated.data.created_at);
        assert_eq!("Replaced", &updated.data.title);
        assert!(!updated.data.active);

        let Json(deleted) = ad_delete(Extension(app.clone()), Path(id_string.clone()))
            .await
            .expect("Should delete");
        assert_eq!("Ad deleted successfully", &deleted.message);

        assert_eq!(
            Err(ResponseError::NotFound("Ad not found".to_string())),
            ad_get(Extension(app), Path(id_string)).await.map(|_| ())
        );
    }

    #[tokio::test]
    async fn invalid_and_unknown_ids_are_distinguished() {
        let app = setup_test_app();

        assert_eq!(
            Err(ResponseError::BadRequest("Invalid ad ID".to_string())),
            ad_get(Extension(app.clone()), Path("not-an-id".to_string()))
                .await
                .map(|_| ())
        );

        assert_eq!(
            Err(ResponseError::NotFound("Ad not found".to_string())),
            ad_get(Extension(app.clone()), Path(AdId::new().to_string()))
                .await
                .map(|_| ())
        );

        // no active ads -> random has nothing to pick
        app.ads.insert(dummy_inactive_ad("Inactive")).await;
        assert_eq!(
            Err(ResponseError::NotFound("No ads available".to_string())),
            ad_random(Extension(app)).await.map(|_| ())
        );
    }
}

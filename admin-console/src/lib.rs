#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

//! The admin console of the Ad Store - a typed client over the CRUD &
//! analytics routes, driven by the CLI binary.

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use primitives::{
    ad::ValidationError,
    adstore::{AdListResponse, AdResponse, MessageResponse, StatsResponse},
    Ad, AdFields, AdId, ApiUrl, Config, Stats,
};

#[derive(Debug, Error)]
pub enum Error {
    /// An application-level failure signaled by the store.
    ///
    /// The console collapses every failure into a logged error line,
    /// but the kinds stay distinguishable here.
    #[error("The Ad Store responded with {status}: {message}")]
    AdStore {
        status: StatusCode,
        message: String,
    },
    /// A transport or decode failure.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    /// The console pre-validates urls before submitting, so that an
    /// obviously broken form never reaches the store.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Building request url: {0}")]
    Url(#[from] url::ParseError),
}

/// A typed client for the Ad Store REST API.
#[derive(Debug, Clone)]
pub struct AdStoreApi {
    client: Client,
    ad_store_url: ApiUrl,
}

impl AdStoreApi {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.fetch_timeout.into()))
            .build()?;

        Ok(Self {
            client,
            ad_store_url: config.ad_store_url.clone(),
        })
    }

    /// `GET /api/ads` - all ads with their count.
    pub async fn list_ads(&self) -> Result<AdListResponse, Error> {
        let request = self.request(Method::GET, "api/ads")?;

        handle(request.send().await?).await
    }

    /// `GET /api/ads/:id`
    pub async fn get_ad(&self, ad_id: AdId) -> Result<Ad, Error> {
        let request = self.request(Method::GET, &format!("api/ads/{}", ad_id))?;

        let response: AdResponse = handle(request.send().await?).await?;

        Ok(response.data)
    }

    /// `POST /api/ads`
    pub async fn create_ad(&self, fields: &AdFields) -> Result<Ad, Error> {
        prevalidate_urls(fields)?;

        let request = self.request(Method::POST, "api/ads")?.json(fields);
        let response: AdResponse = handle(request.send().await?).await?;

        Ok(response.data)
    }

    /// `PUT /api/ads/:id` - full replace of the editable fields.
    pub async fn update_ad(&self, ad_id: AdId, fields: &AdFields) -> Result<Ad, Error> {
        prevalidate_urls(fields)?;

        let request = self
            .request(Method::PUT, &format!("api/ads/{}", ad_id))?
            .json(fields);
        let response: AdResponse = handle(request.send().await?).await?;

        Ok(response.data)
    }

    /// `DELETE /api/ads/:id` - irreversible.
    pub async fn delete_ad(&self, ad_id: AdId) -> Result<String, Error> {
        let request = self.request(Method::DELETE, &format!("api/ads/{}", ad_id))?;

        let response: MessageResponse = handle(request.send().await?).await?;

        Ok(response.message)
    }

    /// `GET /api/analytics/stats`
    pub async fn stats(&self) -> Result<Stats, Error> {
        let request = self.request(Method::GET, "api/analytics/stats")?;

        let response: StatsResponse = handle(request.send().await?).await?;

        Ok(response.data)
    }

    fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder, Error> {
        let url = self.ad_store_url.join(endpoint)?;

        Ok(self.client.request(method, url))
    }
}

/// Client-side validation of the submitted urls, performed before any
/// request is issued. The remaining validation (required fields) is left
/// to the store, whose messages are surfaced as [`Error::AdStore`].
fn prevalidate_urls(fields: &AdFields) -> Result<(), ValidationError> {
    if let Some(image_url) = fields.image_url.as_deref() {
        image_url
            .trim()
            .parse::<Url>()
            .map_err(|_| ValidationError::InvalidImageUrl)?;
    }

    if let Some(link_url) = fields.link_url.as_deref() {
        link_url
            .trim()
            .parse::<Url>()
            .map_err(|_| ValidationError::InvalidLinkUrl)?;
    }

    Ok(())
}

/// Decodes a successful response, or surfaces the envelope message of a
/// failed one. A non-envelope error body falls back to the status line.
async fn handle<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, Error> {
    let status = response.status();

    if status.is_success() {
        Ok(response.json().await?)
    } else {
        let message = response
            .json::<MessageResponse>()
            .await
            .map(|body| body.message)
            .unwrap_or_else(|_| status.to_string());

        Err(Error::AdStore { status, message })
    }
}

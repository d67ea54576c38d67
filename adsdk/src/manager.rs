//! The Ad [`Manager`]

use std::{collections::VecDeque, sync::Arc, time::Duration};

use async_std::sync::RwLock;
use log::{error, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use primitives::{
    adstore::{AdResponse, MessageResponse, RecordRequest},
    analytics::{EventType, CLICK, IMPRESSION},
    Ad, AdId, ApiUrl,
};

use crate::{PENDING_EVENTS_LIMIT, Url};

pub const DEFAULT_FETCH_TIMEOUT: u32 = 5000;

#[derive(Debug, Error)]
pub enum Error {
    /// An application-level failure - the store replied with a non-success
    /// status; `message` is the decoded envelope message when available.
    #[error("Request to the Ad Store failed: status {status} at url {url}: {message}")]
    AdStore {
        status: StatusCode,
        url: Url,
        message: String,
    },
    /// A transport or decode failure.
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Building request url: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Whether retrying the exact same request could ever succeed:
    /// transport failures and 5xx responses can, 4xx rejections can not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::AdStore { status, .. } => status.is_server_error(),
            Error::Request(_) => true,
            Error::Url(_) => false,
        }
    }
}

/// The Ad [`Manager`]'s options for fetching & tracking ads.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    /// The base url of the Ad Store, resolved by the embedder at startup.
    #[serde(rename = "adStoreURL")]
    pub ad_store_url: ApiUrl,
    /// Optional targeting hint forwarded with every record.
    #[serde(default)]
    pub location: Option<String>,
    /// Whether failed impression/click records should be queued and
    /// retried (at-least-once) instead of being dropped.
    ///
    /// default: `false` - fire-and-forget
    #[serde(default)]
    pub retry_analytics: bool,
    /// Client timeout for all requests to the store.
    /// In milliseconds
    ///
    /// default: `5000`: [`DEFAULT_FETCH_TIMEOUT`]
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: u32,
}

fn default_fetch_timeout() -> u32 {
    DEFAULT_FETCH_TIMEOUT
}

/// An impression or click which failed to be delivered and awaits
/// a retry through [`Manager::flush_pending`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvent {
    pub event_type: EventType,
    pub ad_id: AdId,
    pub location: Option<String>,
}

/// The Ad Manager
#[derive(Debug, Clone)]
pub struct Manager {
    options: Options,
    /// Failed records from old to new, trimmed to [`PENDING_EVENTS_LIMIT`]
    /// by removing the oldest entries.
    pending: Arc<RwLock<VecDeque<PendingEvent>>>,
    client: reqwest::Client,
}

impl Manager {
    pub fn new(options: Options) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(options.fetch_timeout.into()))
            .build()?;

        Ok(Self {
            options,
            pending: Arc::new(RwLock::new(VecDeque::new())),
            client,
        })
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// `GET /api/ads/random` - one random **active** ad.
    pub async fn fetch_random_ad(&self) -> Result<Ad, Error> {
        let url = self.options.ad_store_url.join("api/ads/random")?;

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = decode_message(response, status).await;
            return Err(Error::AdStore {
                status,
                url,
                message,
            });
        }

        let ad_response = response.json::<AdResponse>().await?;

        Ok(ad_response.data)
    }

    /// `POST /api/analytics/impression` - increments the impressions counter by 1.
    pub async fn record_impression(&self, ad_id: AdId) -> Result<(), Error> {
        self.record(IMPRESSION, ad_id).await
    }

    /// `POST /api/analytics/click` - increments the clicks counter by 1.
    pub async fn record_click(&self, ad_id: AdId) -> Result<(), Error> {
        self.record(CLICK, ad_id).await
    }

    async fn record(&self, event_type: EventType, ad_id: AdId) -> Result<(), Error> {
        let location = self.options.location.clone();

        match self.send_record(event_type, ad_id, location.clone()).await {
            Ok(()) => Ok(()),
            Err(error) if self.options.retry_analytics && error.is_retryable() => {
                warn!("Queued {} record of {} for retry: {}", event_type, ad_id, error);

                self.push_pending(PendingEvent {
                    event_type,
                    ad_id,
                    location,
                })
                .await;

                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// The number of failed records currently awaiting a retry.
    pub async fn pending_events(&self) -> usize {
        self.pending.read().await.len()
    }

    /// Retries the queued records from oldest to newest, returning how many
    /// were delivered. Stops - keeping the remainder queued - on the first
    /// retryable failure; records rejected with a 4xx are dropped, since
    /// resending those can never succeed.
    pub async fn flush_pending(&self) -> Result<usize, Error> {
        let mut delivered = 0;

        loop {
            let event = { self.pending.write().await.pop_front() };
            let event = match event {
                Some(event) => event,
                None => break,
            };

            match self
                .send_record(event.event_type, event.ad_id, event.location.clone())
                .await
            {
                Ok(()) => delivered += 1,
                Err(error) if error.is_retryable() => {
                    self.pending.write().await.push_front(event);
                    return Err(error);
                }
                Err(error) => {
                    error!(
                        "Dropping {} record of {} rejected by the Ad Store: {}",
                        event.event_type, event.ad_id, error
                    );
                }
            }
        }

        Ok(delivered)
    }

    async fn send_record(
        &self,
        event_type: EventType,
        ad_id: AdId,
        location: Option<String>,
    ) -> Result<(), Error> {
        let endpoint = match event_type {
            EventType::Impression => "api/analytics/impression",
            EventType::Click => "api/analytics/click",
        };
        let url = self.options.ad_store_url.join(endpoint)?;

        let request = RecordRequest {
            ad_id: Some(ad_id.to_string()),
            location,
        };

        let response = self.client.post(url.clone()).json(&request).send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let message = decode_message(response, status).await;
            Err(Error::AdStore {
                status,
                url,
                message,
            })
        }
    }

    async fn push_pending(&self, event: PendingEvent) {
        let mut pending = self.pending.write().await;
        pending.push_back(event);

        while pending.len() > PENDING_EVENTS_LIMIT {
            pending.pop_front();
        }
    }
}

/// The envelope message of an error response, falling back to the
/// HTTP status line when the body is not the expected envelope.
async fn decode_message(response: reqwest::Response, status: StatusCode) -> String {
    response
        .json::<MessageResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string())
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use primitives::test_util::DUMMY_AD;
    use serde_json::json;
    use wiremock::{
        matchers::{body_partial_json, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    async fn manager_for(mock_server: &MockServer, retry_analytics: bool) -> Manager {
        let options = Options {
            ad_store_url: mock_server.uri().parse().expect("Valid mock server url"),
            location: Some("EU".to_string()),
            retry_analytics,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        };

        Manager::new(options).expect("Should create the Manager")
    }

    #[tokio::test]
    async fn fetches_a_random_ad() {
        let mock_server = MockServer::start().await;
        let manager = manager_for(&mock_server, false).await;

        Mock::given(method("GET"))
            .and(path("/api/ads/random"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "data": *DUMMY_AD,
            })))
            .expect(1)
            .named("get_random_ad")
            .mount(&mock_server)
            .await;

        let ad = manager.fetch_random_ad().await.expect("Should fetch");

        assert_eq!(*DUMMY_AD, ad);
    }

    #[tokio::test]
    async fn surfaces_the_store_message_on_application_failure() {
        let mock_server = MockServer::start().await;
        let manager = manager_for(&mock_server, false).await;

        Mock::given(method("GET"))
            .and(path("/api/ads/random"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": "error",
                "message": "No ads available",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let error = manager
            .fetch_random_ad()
            .await
            .expect_err("Should fail with an application error");

        match error {
            Error::AdStore {
                status, message, ..
            } => {
                assert_eq!(StatusCode::NOT_FOUND, status);
                assert_eq!("No ads available", &message);
            }
            other => panic!("Expected an AdStore error, got: {}", other),
        }
    }

    #[tokio::test]
    async fn fire_and_forget_returns_the_failure_without_queueing() {
        let mock_server = MockServer::start().await;
        let manager = manager_for(&mock_server, false).await;

        Mock::given(method("POST"))
            .and(path("/api/analytics/impression"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "status": "error",
                "message": "Internal error",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = manager.record_impression(DUMMY_AD.ad_id).await;

        assert!(matches!(result, Err(Error::AdStore { .. })));
        assert_eq!(0, manager.pending_events().await);
    }

    #[tokio::test]
    async fn retry_analytics_queues_a_5xx_and_flush_delivers_it() {
        let mock_server = MockServer::start().await;
        let manager = manager_for(&mock_server, true).await;

        // the first record attempt fails with a retryable 500
        Mock::given(method("POST"))
            .and(path("/api/analytics/click"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(1)
            .expect(1)
            .named("failing_click")
            .mount(&mock_server)
            .await;

        // the retry succeeds and carries the same payload
        Mock::given(method("POST"))
            .and(path("/api/analytics/click"))
            .and(body_partial_json(json!({
                "ad_id": DUMMY_AD.ad_id,
                "location": "EU",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": "success",
                "message": "Click tracked",
            })))
            .expect(1)
            .named("tracked_click")
            .mount(&mock_server)
            .await;

        manager
            .record_click(DUMMY_AD.ad_id)
            .await
            .expect("A queued record is not a failure");
        assert_eq!(1, manager.pending_events().await);

        let delivered = manager.flush_pending().await.expect("Should flush");

        assert_eq!(1, delivered);
        assert_eq!(0, manager.pending_events().await);
    }

    #[tokio::test]
    async fn retry_analytics_never_queues_a_4xx() {
        let mock_server = MockServer::start().await;
        let manager = manager_for(&mock_server, true).await;

        Mock::given(method("POST"))
            .and(path("/api/analytics/impression"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": "error",
                "message": "Ad not found",
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = manager.record_impression(DUMMY_AD.ad_id).await;

        assert!(matches!(result, Err(Error::AdStore { .. })));
        assert_eq!(
            0,
            manager.pending_events().await,
            "A rejected record can never succeed, it should not be queued"
        );
    }
}

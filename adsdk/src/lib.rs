#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

//! SDK for embedding ads served by an Ad Store.
//!
//! The [`Manager`] talks to the store - one random active ad per view,
//! plus fire-and-forget impression & click records - while the helpers
//! generate the embeddable ad view HTML with the event delivery wired in.

pub mod helpers;
pub mod manager;

pub use helpers::{error_placeholder_html, get_ad_html, get_ad_html_with_events};
pub use manager::{Error, Manager, Options};
pub use url::Url;

/// The number of failed analytics records kept for retry, see
/// [`Options::retry_analytics`]. Beyond the limit the oldest are dropped.
pub const PENDING_EVENTS_LIMIT: usize = 50;

//! Testing fixtures for the Ad Store and its clients.
//!
//! Enabled with the `test-util` feature.

use once_cell::sync::Lazy;

use crate::{Ad, AdFields};

/// A single valid [`Ad`] fixture, freshly created (counters at 0).
///
/// **Note:** the `ad_id` and `created_at` are generated on first access.
pub static DUMMY_AD: Lazy<Ad> = Lazy::new(|| dummy_ad("Dust2 Callouts"));

/// Valid [`AdFields`] for a create/update request.
pub fn dummy_fields(title: &str) -> AdFields {
    AdFields {
        title: Some(title.to_string()),
        description: Some(format!("{} - interactive map with all callouts", title)),
        image_url: Some("https://cdn.example.com/maps/banner.png".to_string()),
        link_url: Some("https://example.com/maps".to_string()),
        location: None,
        active: Some(true),
    }
}

/// A valid [`Ad`] with a random [`AdId`](crate::AdId) and zeroed counters.
pub fn dummy_ad(title: &str) -> Ad {
    Ad::new(
        dummy_fields(title)
            .validate()
            .expect("The dummy fields should be valid"),
    )
}

/// An inactive [`Ad`], excluded from random selection.
pub fn dummy_inactive_ad(title: &str) -> Ad {
    let mut ad = dummy_ad(title);
    ad.active = false;

    ad
}

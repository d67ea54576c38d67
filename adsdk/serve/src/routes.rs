use std::sync::Arc;

use axum::{response::Html, Extension};
use tera::Context;
use tracing::error;

use adsdk::{error_placeholder_html, get_ad_html_with_events};

use crate::app::State;

/// `GET /`
pub async fn get_index(Extension(state): Extension<Arc<State>>) -> Html<String> {
    let html = state
        .tera
        .render("index.html", &Default::default())
        .expect("Should render");

    Html(html)
}

/// `GET /ad`
///
/// Fetches one random ad through the [`Manager`](adsdk::Manager) and embeds
/// the generated ad view - the impression record fires on image `onload`,
/// the click record on the anchor `onclick` before opening `link_url`.
/// On a fetch failure the page embeds the inline error placeholder instead,
/// without any automatic retry.
pub async fn get_ad(Extension(state): Extension<Arc<State>>) -> Html<String> {
    let ad_code = match state.manager.fetch_random_ad().await {
        Ok(ad) => get_ad_html_with_events(state.manager.options(), &ad),
        Err(error) => {
            error!("Failed to fetch a random ad: {error}");

            error_placeholder_html("Failed to load ad")
        }
    };

    let html = {
        let mut context = Context::new();
        context.insert("ad_code", &ad_code);

        state.tera.render("ad.html", &context).expect("Should render")
    };

    Html(html)
}

//! Generates the embeddable ad view HTML and the browser-side event delivery.

use primitives::{
    analytics::{EventType, RecordRequest, CLICK, IMPRESSION},
    Ad,
};

use crate::manager::Options;

fn image_html(on_load: &str, ad: &Ad) -> String {
    // the alt text is fixed - `title` is free text and would break the
    // attribute on a `"` quote
    format!(
        "<img loading=\"lazy\" src=\"{image_url}\" alt=\"Advertisement\" rel=\"nofollow\" onload=\"{on_load}\">",
        image_url = ad.image_url,
    )
}

/// Generates the ad view HTML for a given [`Ad`] -
/// image, title & description inside an anchor to the `link_url`.
///
/// The `on_load` & `on_click` values are placed inside the respective
/// html attributes of the image & the anchor.
fn ad_html(ad: &Ad, on_load: &str, on_click: &str) -> String {
    // replace all `"` quotes with a single quote `'`
    // these values are used inside `onclick` & `onload` html attributes
    let on_load = on_load.replace('\"', "'");
    let on_click = on_click.replace('\"', "'");

    let image_html = image_html(&on_load, ad);

    format!(
        "<div class=\"ad-unit\" style=\"position: relative; overflow: hidden;\">
        <a href=\"{link_url}\" target=\"_blank\" onclick=\"{on_click}\" rel=\"noopener noreferrer\">
        {image_html}
        <strong class=\"ad-title\">{title}</strong>
        <p class=\"ad-description\">{description}</p>
        </a>
        </div>",
        link_url = ad.link_url,
        title = ad.title,
        description = ad.description,
    )
}

/// The ad view HTML without any event delivery, e.g. for previewing.
pub fn get_ad_html(ad: &Ad) -> String {
    ad_html(ad, "", "")
}

/// Generates the ad view HTML for a given [`Ad`], as well as the code for
/// sending the events to the Ad Store:
/// - an impression record on image `onload` (one rendering = one impression)
/// - a click record on anchor `onclick`, before the browser opens `link_url`
pub fn get_ad_html_with_events(options: &Options, ad: &Ad) -> String {
    let get_fetch_code = |event_type: EventType| -> String {
        let endpoint = match event_type {
            EventType::Impression => "api/analytics/impression",
            EventType::Click => "api/analytics/click",
        };

        let request = RecordRequest {
            ad_id: Some(ad.ad_id.to_string()),
            location: options.location.clone(),
        };
        let body =
            serde_json::to_string(&request).expect("It should always serialize RecordRequest");

        // after the quote replacement in `ad_html` the body is a JS object
        // literal with `'` quotes, so it has to be stringified at runtime -
        // a plain object passed to `fetch` coerces to `[object Object]`
        let fetch_opts = format!("var fetchOpts = {{ method: 'POST', headers: {{ 'content-type': 'application/json' }}, body: JSON.stringify({body}) }};");
        // the record is fire-and-forget from the browser's perspective
        let fetch_url = format!("{}{}", options.ad_store_url, endpoint);

        format!("{fetch_opts} fetch('{fetch_url}', fetchOpts)")
    };

    ad_html(ad, &get_fetch_code(IMPRESSION), &get_fetch_code(CLICK))
}

/// The inline placeholder an embedder renders when fetching an ad fails.
/// No automatic retry occurs.
pub fn error_placeholder_html(message: &str) -> String {
    format!("<div class=\"ad-unit ad-unit-error\">{message}</div>")
}

#[cfg(test)]
mod test {
    use super::*;
    use primitives::test_util::{dummy_ad, DUMMY_AD};
    use scraper::{Html, Selector};

    fn options() -> Options {
        Options {
            ad_store_url: "http://127.0.0.1:5000".parse().expect("Valid ApiUrl"),
            location: None,
            retry_analytics: false,
            fetch_timeout: 5000,
        }
    }

    #[test]
    fn ad_html_links_and_renders_the_ad() {
        let html = get_ad_html(&DUMMY_AD);
        let fragment = Html::parse_fragment(&html);

        let anchor_selector = Selector::parse("a").expect("Valid selector");
        let anchor = fragment
            .select(&anchor_selector)
            .next()
            .expect("There should be an anchor");

        assert_eq!(Some(DUMMY_AD.link_url.as_str()), anchor.value().attr("href"));
        assert_eq!(Some(""), anchor.value().attr("onclick"));

        let img_selector = Selector::parse("img").expect("Valid selector");
        let img = fragment
            .select(&img_selector)
            .next()
            .expect("There should be an image");
        assert_eq!(Some(DUMMY_AD.image_url.as_str()), img.value().attr("src"));

        let title_selector = Selector::parse("strong.ad-title").expect("Valid selector");
        let title = fragment
            .select(&title_selector)
            .next()
            .expect("There should be a title");
        assert_eq!(DUMMY_AD.title, title.inner_html());
    }

    #[test]
    fn ad_html_with_events_wires_the_records() {
        let html = get_ad_html_with_events(&options(), &DUMMY_AD);
        let fragment = Html::parse_fragment(&html);

        let img_selector = Selector::parse("img").expect("Valid selector");
        let on_load = fragment
            .select(&img_selector)
            .next()
            .expect("There should be an image")
            .value()
            .attr("onload")
            .expect("There should be an onload attribute")
            .to_string();

        assert!(on_load.contains("fetch('http://127.0.0.1:5000/api/analytics/impression'"));
        // the body object literal must be stringified at runtime, a plain
        // object would reach the store as `[object Object]`
        assert!(on_load.contains("body: JSON.stringify({"));
        assert!(on_load.contains(&ad_id_json()));

        let anchor_selector = Selector::parse("a").expect("Valid selector");
        let on_click = fragment
            .select(&anchor_selector)
            .next()
            .expect("There should be an anchor")
            .value()
            .attr("onclick")
            .expect("There should be an onclick attribute")
            .to_string();

        assert!(on_click.contains("fetch('http://127.0.0.1:5000/api/analytics/click'"));
        assert!(on_click.contains("body: JSON.stringify({"));
        // double quotes are replaced for use inside the html attribute
        assert!(!on_click.contains('"'));
    }

    #[test]
    fn quoted_title_does_not_break_the_attributes() {
        let ad = dummy_ad("The \"Best\" Callouts");

        let html = get_ad_html_with_events(&options(), &ad);
        let fragment = Html::parse_fragment(&html);

        let img_selector = Selector::parse("img").expect("Valid selector");
        let img = fragment
            .select(&img_selector)
            .next()
            .expect("There should be an image");
        // the alt text is fixed, the free-text title never enters an attribute
        assert_eq!(Some("Advertisement"), img.value().attr("alt"));
        assert_eq!(Some(ad.image_url.as_str()), img.value().attr("src"));
        assert!(img
            .value()
            .attr("onload")
            .expect("There should be an onload attribute")
            .contains("fetch("));

        let title_selector = Selector::parse("strong.ad-title").expect("Valid selector");
        let title = fragment
            .select(&title_selector)
            .next()
            .expect("There should be a title");
        assert!(title.inner_html().contains("Best"));
    }

    fn ad_id_json() -> String {
        format!("'ad_id':'{}'", DUMMY_AD.ad_id)
    }

    #[test]
    fn error_placeholder_carries_the_message() {
        let html = error_placeholder_html("Failed to load ad");
        let fragment = Html::parse_fragment(&html);

        let selector = Selector::parse("div.ad-unit-error").expect("Valid selector");
        let placeholder = fragment
            .select(&selector)
            .next()
            .expect("There should be a placeholder");

        assert_eq!("Failed to load ad", placeholder.inner_html());
    }
}

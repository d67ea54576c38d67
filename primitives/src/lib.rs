#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

pub mod ad;
pub mod adstore;
pub mod analytics;
pub mod config;
#[cfg(feature = "test-util")]
pub mod test_util;
pub mod util {
    pub mod api;
    pub mod logging;

    pub use api::ApiUrl;
}

pub use self::ad::{Ad, AdContent, AdFields, AdId};
pub use self::analytics::{Event, EventType, Stats};
pub use self::config::Config;
pub use self::util::ApiUrl;

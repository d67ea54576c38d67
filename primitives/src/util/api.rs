use std::{convert::TryFrom, fmt, str::FromStr};

use parse_display::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

// `url::Url::scheme()` returns a lower-cased ASCII string without the `:`
const SCHEMES: [&str; 2] = ["http", "https"];

#[derive(Debug, Error, PartialEq)]
pub enum Error {
    #[error("Invalid scheme '{0}', only 'http' & 'https' are allowed")]
    InvalidScheme(String),
    #[error("The Url has to be a base, i.e. `data:`, `mailto:` etc. are not allowed")]
    ShouldBeABase,
    #[error("Having a fragment (i.e. `#fragment`) is not allowed")]
    HasFragment,
    #[error("Having query parameters (i.e. `?query_param=value`) is not allowed")]
    HasQuery,
    #[error("Parsing the url: {0}")]
    Parsing(#[from] url::ParseError),
}

/// A safe base Url for REST API calls, like the Ad Store url.
///
/// Always ends with a `/`, so joining an endpoint on it never replaces
/// the last path segment. On top of the [`url::Url`] validation it rejects:
/// - a `Scheme` other than `http` & `https`
/// - non-base urls like `data:` & `mailto:`
/// - a `Fragment`, e.g. `#fragment`
/// - a `Query`, e.g. `?query_param=value`
#[derive(Clone, Hash, Display, Ord, PartialOrd, Eq, PartialEq, Deserialize, Serialize)]
#[serde(try_from = "Url", into = "Url")]
pub struct ApiUrl(Url);

impl ApiUrl {
    pub fn parse(input: &str) -> Result<Self, Error> {
        Self::from_str(input)
    }

    /// Joins an endpoint on the url, stripping a prefixed `/` from the
    /// endpoint first so that the url's own path is preserved.
    pub fn join(&self, endpoint: &str) -> Result<Url, url::ParseError> {
        let stripped = endpoint.strip_prefix('/').unwrap_or(endpoint);
        // this join is safe, the url always ends with a `/`
        self.0.join(stripped)
    }

    pub fn to_url(&self) -> Url {
        self.0.clone()
    }
}

impl fmt::Debug for ApiUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Url({})", self)
    }
}

impl TryFrom<Url> for ApiUrl {
    type Error = Error;

    fn try_from(mut url: Url) -> Result<Self, Self::Error> {
        if url.cannot_be_a_base() {
            return Err(Error::ShouldBeABase);
        }

        if url.fragment().is_some() {
            return Err(Error::HasFragment);
        }

        if !SCHEMES.contains(&url.scheme()) {
            return Err(Error::InvalidScheme(url.scheme().to_string()));
        }

        if url.query().is_some() {
            return Err(Error::HasQuery);
        }

        let url_path = url.path();

        let mut stripped_path = url_path.strip_suffix('/').unwrap_or(url_path).to_string();
        // Make sure to always end the path with `/`!
        stripped_path.push('/');

        url.set_path(&stripped_path);

        Ok(Self(url))
    }
}

impl From<ApiUrl> for Url {
    fn from(api_url: ApiUrl) -> Self {
        api_url.0
    }
}

impl FromStr for ApiUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.parse::<Url>()?)
    }
}

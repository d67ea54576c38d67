use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use ad_id::{AdId, ParseError};

mod ad_id {
    use hex::{FromHex, FromHexError};
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
    use std::{fmt, str::FromStr};
    use thiserror::Error;
    use uuid::Uuid;

    /// An Id of 16 bytes, (de)serialized as a `0x` prefixed hex string.
    ///
    /// The canonical representation of an advertisement identifier is an
    /// opaque string, generated from a `Uuid::new_v4()`.
    #[derive(Debug, Clone, Copy, Hash, Ord, PartialOrd, Eq, PartialEq)]
    pub struct AdId([u8; 16]);

    impl AdId {
        /// Generates a random `AdId` using `Uuid::new_v4()`.
        pub fn new() -> Self {
            Self::default()
        }

        pub fn as_bytes(&self) -> &[u8; 16] {
            &self.0
        }

        pub fn from_bytes(bytes: [u8; 16]) -> Self {
            Self(bytes)
        }
    }

    impl Default for AdId {
        fn default() -> Self {
            Self(*Uuid::new_v4().as_bytes())
        }
    }

    impl AsRef<[u8]> for AdId {
        fn as_ref(&self) -> &[u8] {
            &self.0
        }
    }

    #[derive(Debug, Error, PartialEq)]
    pub enum ParseError {
        /// the `0x` prefix is missing
        #[error("Expected a `0x` prefix")]
        ExpectedPrefix,
        #[error(transparent)]
        InvalidHex(#[from] FromHexError),
    }

    impl FromStr for AdId {
        type Err = ParseError;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.strip_prefix("0x") {
                Some(hex) => Ok(Self(<[u8; 16]>::from_hex(hex)?)),
                None => Err(ParseError::ExpectedPrefix),
            }
        }
    }

    impl fmt::Display for AdId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "0x{}", hex::encode(self.0))
        }
    }

    impl Serialize for AdId {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for AdId {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where
            D: Deserializer<'de>,
        {
            let string = String::deserialize(deserializer)?;

            string.parse().map_err(de::Error::custom)
        }
    }
}

/// An Advertisement record, as kept and returned by the Ad Store.
///
/// The `impressions` & `clicks` counters are owned by the store,
/// clients only ever trigger increments through the analytics routes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ad {
    pub ad_id: AdId,
    pub title: String,
    pub description: String,
    pub image_url: Url,
    pub link_url: Url,
    /// Optional free-text targeting hint, absent means untargeted.
    pub location: Option<String>,
    pub active: bool,
    /// Server-assigned on create, preserved by update.
    pub created_at: DateTime<Utc>,
    pub impressions: u64,
    pub clicks: u64,
}

impl Ad {
    /// Creates a new [`Ad`] with a randomly assigned [`AdId`],
    /// the current time as `created_at` and zeroed counters.
    pub fn new(content: AdContent) -> Self {
        Self {
            ad_id: AdId::new(),
            title: content.title,
            description: content.description,
            image_url: content.image_url,
            link_url: content.link_url,
            location: content.location,
            active: content.active,
            created_at: Utc::now(),
            impressions: 0,
            clicks: 0,
        }
    }

    /// Replaces all editable fields of the [`Ad`] (full replace, not a patch).
    ///
    /// `ad_id`, `created_at` and the counters are preserved.
    pub fn apply(&mut self, content: AdContent) {
        self.title = content.title;
        self.description = content.description;
        self.image_url = content.image_url;
        self.link_url = content.link_url;
        self.location = content.location;
        self.active = content.active;
    }
}

/// The client-submitted subset of an [`Ad`] - the create & update payload.
///
/// All fields are deserialized as optional so that validation happens
/// explicitly through [`AdFields::validate`] and the Ad Store controls the
/// error messages, instead of them coming from the deserializer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdFields {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub location: Option<String>,
    pub active: Option<bool>,
}

/// A validated [`AdFields`] payload with all required fields present
/// and both urls parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdContent {
    pub title: String,
    pub description: String,
    pub image_url: Url,
    pub link_url: Url,
    pub location: Option<String>,
    pub active: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid image URL")]
    InvalidImageUrl,
    #[error("Invalid link URL")]
    InvalidLinkUrl,
}

impl AdFields {
    /// Validates the submitted fields into an [`AdContent`].
    ///
    /// The first absent or empty (after trimming) required field wins,
    /// checked in the order `title`, `description`, `image_url`, `link_url`.
    /// Only afterwards are the urls parsed.
    /// `active` defaults to `true` when omitted.
    pub fn validate(&self) -> Result<AdContent, ValidationError> {
        let title = required(&self.title, "title")?;
        let description = required(&self.description, "description")?;
        let image_url = required(&self.image_url, "image_url")?;
        let link_url = required(&self.link_url, "link_url")?;

        let image_url = image_url
            .parse::<Url>()
            .map_err(|_| ValidationError::InvalidImageUrl)?;
        let link_url = link_url
            .parse::<Url>()
            .map_err(|_| ValidationError::InvalidLinkUrl)?;

        Ok(AdContent {
            title,
            description,
            image_url,
            link_url,
            location: self.location.clone(),
            active: self.active.unwrap_or(true),
        })
    }
}

fn required(field: &Option<String>, name: &'static str) -> Result<String, ValidationError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(ValidationError::MissingField(name)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{from_value, json, to_value};

    fn fields() -> AdFields {
        AdFields {
            title: Some("Dust2 Callouts".to_string()),
            description: Some("Interactive map with all callouts".to_string()),
            image_url: Some("https://cdn.example.com/dust2.png".to_string()),
            link_url: Some("https://example.com/dust2".to_string()),
            location: Some("EU".to_string()),
            active: None,
        }
    }

    #[test]
    fn ad_id_de_serializes_from_and_to_prefixed_hex() {
        let ad_id = "0x936da01f9abd4d9d80c702af85c822a8"
            .parse::<AdId>()
            .expect("Should parse");

        assert_eq!("0x936da01f9abd4d9d80c702af85c822a8", &ad_id.to_string());
        assert_eq!(
            json!("0x936da01f9abd4d9d80c702af85c822a8"),
            to_value(ad_id).expect("Should serialize")
        );
        assert_eq!(
            ad_id,
            from_value::<AdId>(json!("0x936da01f9abd4d9d80c702af85c822a8"))
                .expect("Should deserialize")
        );
    }

    #[test]
    fn ad_id_rejects_missing_prefix_and_bad_hex() {
        assert_eq!(
            Err(ad_id::ParseError::ExpectedPrefix),
            "936da01f9abd4d9d80c702af85c822a8".parse::<AdId>()
        );

        assert!(matches!(
            "0xNOT_HEX".parse::<AdId>(),
            Err(ad_id::ParseError::InvalidHex(_))
        ));
        // 15 bytes instead of 16
        assert!(matches!(
            "0x936da01f9abd4d9d80c702af85c822".parse::<AdId>(),
            Err(ad_id::ParseError::InvalidHex(_))
        ));
    }

    #[test]
    fn validates_the_fields_in_order() {
        let valid = fields().validate().expect("Should validate");
        assert_eq!("Dust2 Callouts", valid.title);
        assert!(valid.active, "`active` should default to true");

        let cases = [
            (AdFields::default(), ValidationError::MissingField("title")),
            (
                AdFields {
                    description: None,
                    ..fields()
                },
                ValidationError::MissingField("description"),
            ),
            (
                AdFields {
                    image_url: Some("  ".to_string()),
                    ..fields()
                },
                ValidationError::MissingField("image_url"),
            ),
            (
                AdFields {
                    link_url: None,
                    ..fields()
                },
                ValidationError::MissingField("link_url"),
            ),
            (
                AdFields {
                    image_url: Some("not a url".to_string()),
                    ..fields()
                },
                ValidationError::InvalidImageUrl,
            ),
            (
                AdFields {
                    link_url: Some("/relative/path".to_string()),
                    ..fields()
                },
                ValidationError::InvalidLinkUrl,
            ),
        ];

        for (fields, expected) in cases {
            assert_eq!(Err(expected), fields.validate().map(|_| ()));
        }
    }

    #[test]
    fn update_replaces_all_editable_fields() {
        let mut ad = Ad::new(fields().validate().expect("Should validate"));
        ad.impressions = 42;
        ad.clicks = 3;

        let before = ad.clone();

        // `location` is omitted this time - it should be cleared, not preserved
        let update = AdFields {
            title: Some("Mirage Callouts".to_string()),
            location: None,
            active: Some(false),
            ..fields()
        };
        ad.apply(update.validate().expect("Should validate"));

        assert_eq!(before.ad_id, ad.ad_id);
        assert_eq!(before.created_at, ad.created_at);
        assert_eq!(42, ad.impressions);
        assert_eq!(3, ad.clicks);
        assert_eq!("Mirage Callouts", &ad.title);
        assert_eq!(None, ad.location);
        assert!(!ad.active);
    }
}

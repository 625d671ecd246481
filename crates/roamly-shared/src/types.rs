use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

// The content API emits integer ids while credentials carry them as strings.
// Every id is normalised to a trimmed string so the two compare equal.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl RawId {
    fn normalise(self) -> String {
        match self {
            RawId::Text(s) => s.trim().to_string(),
            RawId::Number(n) => n.to_string(),
        }
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Serialize, PartialEq, Eq, Hash)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl AsRef<str>) -> Self {
                Self(id.as_ref().trim().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                RawId::deserialize(deserializer).map(|raw| Self(raw.normalise()))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Server-assigned user identifier.
    UserId
);
string_id!(
    /// Server-assigned image identifier. Only persisted images have one.
    ImageId
);
string_id!(
    /// Server-assigned adventure identifier; images belong to one adventure.
    AdventureId
);

/// One row of a live user lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchRecord {
    #[serde(alias = "user_id")]
    pub identifier: UserId,
    #[serde(rename = "displayName", alias = "username")]
    pub display_name: String,
}

/// An image the server has stored, as returned in every gallery snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedImage {
    #[serde(alias = "imageId")]
    pub image_id: ImageId,
    pub url: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub caption: String,
}

/// Raw image bytes picked by the user, not yet uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaPayload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl MediaPayload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// A payload paired with its caption, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    /// Draft row this item was taken from.
    pub slot_index: usize,
    pub payload: MediaPayload,
    pub caption: String,
}

/// Body of a successful image upload.
///
/// Servers either answer with the full gallery or with the single created
/// resource; both are accepted.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum UploadOutcome {
    Snapshot(Vec<PersistedImage>),
    Created(PersistedImage),
}

/// Summary of a freshly created adventure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdventureSummary {
    #[serde(alias = "adventureId")]
    pub adventure_id: AdventureId,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
}

/// Body returned by the account creation endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AccountCreated {
    pub jwt_token: String,
    pub username: String,
    pub email: String,
    /// Server timestamp, kept verbatim; only ever displayed.
    #[serde(default)]
    pub created_at: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

//! Wire types for the relay's inbound API and the provider's completion API.
//!
//! Decoding is lenient: a `null` document, missing or `null` string fields
//! all become empty values and unknown fields are ignored, so the relay
//! forwards whatever it is given and leaves validation to the provider.
//! Inbound keys match case-insensitively, an exact match taking precedence.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Role used for the single chat turn sent upstream.
pub const USER_ROLE: &str = "user";

/// Decodes a JSON document, treating a top-level `null` as `T::default()`.
pub fn decode_or_default<T>(bytes: &[u8]) -> Result<T, serde_json::Error>
where
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_slice::<Option<T>>(bytes)?.unwrap_or_default())
}

/// Inbound `POST /chat` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    /// Caller identifier. Accepted but not used by the relay.
    pub user: String,
    /// Text forwarded to the provider as the user turn.
    pub message: String,
}

impl<'de> Deserialize<'de> for ChatRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Self {
            user: string_field(&object, "user").map_err(D::Error::custom)?,
            message: string_field(&object, "message").map_err(D::Error::custom)?,
        })
    }
}

/// Looks up `name` in `object`, falling back to a case-insensitive match.
/// Absent and `null` read as an empty string; any other non-string is an error.
fn string_field(object: &Map<String, Value>, name: &str) -> Result<String, String> {
    let value = object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    });
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(format!("field `{name}` must be a string, got {other}")),
    }
}

/// Outbound `POST /chat` success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// A single turn in a provider completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    pub role: String,
    pub content: String,
}

/// Completion request sent to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRequest {
    pub model: String,
    pub store: bool,
    pub messages: Vec<ProviderMessage>,
}

impl ProviderRequest {
    /// Builds a single-turn request carrying `message` as the user turn.
    pub fn single_turn(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            store: true,
            messages: vec![ProviderMessage {
                role: USER_ROLE.to_string(),
                content: message.into(),
            }],
        }
    }
}

impl From<(&str, ChatRequest)> for ProviderRequest {
    fn from((model, request): (&str, ChatRequest)) -> Self {
        Self::single_turn(model, request.message)
    }
}

/// Completion response returned by the provider. Only the fields the relay
/// reads are modelled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub choices: Vec<ProviderChoice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderChoice {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: ProviderChoiceMessage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderChoiceMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
}

impl ProviderResponse {
    /// Content of the first choice, or `None` when the provider returned no
    /// choices at all.
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }

    /// Consumes the response and returns the first choice's content.
    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next().map(|c| c.message.content)
    }
}

/// Treats an explicit JSON `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

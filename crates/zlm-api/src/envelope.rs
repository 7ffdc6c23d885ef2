//! The `{code, msg, data}` wrapper every API response uses.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::endpoint::Endpoint;
use crate::error::ApiError;

/// Status code the server uses for a successful call.
pub const SUCCESS_CODE: i64 = 0;

/// Generic response envelope.
///
/// `data` is kept as raw JSON until the status code has been checked, so an
/// error response is reported as such even when its payload does not match the
/// shape the caller expects.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T = Value> {
    pub code: i64,
    #[serde(default, deserialize_with = "message_text")]
    pub msg: String,
    #[serde(default)]
    pub data: Option<T>,
}

/// Read `msg` as text whatever its JSON type; `null` becomes empty.
fn message_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Access to the status fields of a decoded envelope.
pub trait ApiStatus {
    fn code(&self) -> i64;
    fn message(&self) -> &str;

    fn is_success(&self) -> bool {
        self.code() == SUCCESS_CODE
    }
}

impl<T> ApiStatus for ApiResponse<T> {
    fn code(&self) -> i64 {
        self.code
    }

    fn message(&self) -> &str {
        &self.msg
    }
}

impl<T> ApiResponse<T> {
    /// Returns the payload if the status code signals success.
    pub fn into_result(self, endpoint: Endpoint) -> Result<Option<T>, ApiError> {
        if !self.is_success() {
            return Err(ApiError::Api {
                endpoint,
                code: self.code,
                message: self.msg,
            });
        }
        Ok(self.data)
    }
}

/// Decode `raw` as an envelope, check its status code and return the payload.
///
/// A missing or `null` payload on a successful response yields `T::default()`.
pub fn decode_and_validate<T>(endpoint: Endpoint, raw: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    let envelope: ApiResponse = serde_json::from_slice(raw)
        .map_err(|source| ApiError::malformed(endpoint, source))?;

    match envelope.into_result(endpoint)? {
        None | Some(Value::Null) => Ok(T::default()),
        Some(data) => {
            serde_json::from_value(data).map_err(|source| ApiError::malformed(endpoint, source))
        }
    }
}

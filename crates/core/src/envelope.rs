//! The uniform `{success, data | error}` wrapper every backend endpoint returns.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Backend response envelope.
///
/// On success `data` holds the payload; on failure `error` holds a message and
/// `redirect` optionally names a re-authentication URL. `status` is attached by
/// the client when the failure came from an HTTP error status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl Envelope {
    /// Successful envelope carrying `data`.
    pub fn ok(data: Value) -> Self {
        Self { success: true, data: Some(data), error: None, redirect: None, status: None }
    }

    /// Failure envelope with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(message.into()), redirect: None, status: None }
    }

    /// Attach an HTTP status to the envelope.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Normalize a client-side error into a failure envelope.
    pub fn from_error(err: &Error) -> Self {
        let envelope = Self::failure(err.message());
        match err.status() {
            Some(status) => envelope.with_status(status),
            None => envelope,
        }
    }

    /// Error message, or an empty string for successful envelopes.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or_default()
    }

    /// Deserialize the `data` payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Malformed` if the envelope has no data or the data does
    /// not match `T`.
    pub fn data_as<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let data = self
            .data
            .clone()
            .ok_or_else(|| Error::Malformed("envelope has no data".to_string()))?;
        serde_json::from_value(data).map_err(|e| Error::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_success() {
        let env: Envelope = serde_json::from_str(r#"{"success":true,"data":[{"id":1}]}"#).unwrap();
        assert!(env.success);
        assert_eq!(env.data, Some(json!([{"id": 1}])));
        assert!(env.error.is_none());
    }

    #[test]
    fn test_deserialize_failure_with_redirect() {
        let env: Envelope =
            serde_json::from_str(r#"{"success":false,"error":"expired","redirect":"https://t.me/bot"}"#).unwrap();
        assert!(!env.success);
        assert_eq!(env.error_message(), "expired");
        assert_eq!(env.redirect.as_deref(), Some("https://t.me/bot"));
    }

    #[test]
    fn test_serialize_skips_empty_fields() {
        let text = serde_json::to_string(&Envelope::failure("boom")).unwrap();
        assert_eq!(text, r#"{"success":false,"error":"boom"}"#);
    }

    #[test]
    fn test_from_error_attaches_status() {
        let env = Envelope::from_error(&Error::Auth { status: 403, message: "forbidden".into() });
        assert!(!env.success);
        assert_eq!(env.status, Some(403));
        assert_eq!(env.error_message(), "forbidden");

        let env = Envelope::from_error(&Error::Transport("reset".into()));
        assert_eq!(env.status, None);
    }

    #[test]
    fn test_data_as() {
        #[derive(Deserialize)]
        struct Product {
            name: String,
        }

        let env = Envelope::ok(json!([{"name": "flour"}]));
        let products: Vec<Product> = env.data_as().unwrap();
        assert_eq!(products[0].name, "flour");

        let err = Envelope::failure("nope").data_as::<Vec<Product>>();
        assert!(matches!(err, Err(Error::Malformed(_))));
    }
}

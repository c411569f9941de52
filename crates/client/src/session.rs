//! Session identity carried on every API request.
//!
//! The host may expose the session either as the raw init-data string or only
//! as its decoded key/value form. The raw string is sent verbatim; the decoded
//! form is re-serialized as a URL-encoded query string with object-valued
//! fields JSON-stringified.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

use bizdesk_core::{AppConfig, Error};

/// Header carrying the session identity.
pub const INIT_DATA_HEADER: &str = "x-telegram-init-data";

/// Session identity as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionIdentity {
    /// Raw init-data string.
    Raw(String),
    /// Decoded key/value form.
    Decoded(Map<String, Value>),
    /// No session available; the header is sent empty.
    #[default]
    Anonymous,
}

impl SessionIdentity {
    /// Pick the identity from configuration. A non-empty raw string wins.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if `init_data_unsafe` is set but is not a
    /// JSON object.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        if let Some(raw) = config.init_data.as_deref().filter(|s| !s.is_empty()) {
            return Ok(Self::Raw(raw.to_string()));
        }

        match config.init_data_unsafe.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => Ok(Self::Decoded(map)),
                Ok(_) => Err(Error::InvalidInput("init_data_unsafe must be a JSON object".into())),
                Err(e) => Err(Error::InvalidInput(format!("init_data_unsafe: {e}"))),
            },
            None => Ok(Self::Anonymous),
        }
    }

    /// Token value for the init-data header.
    pub fn token(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Decoded(map) => {
                let mut query = url::form_urlencoded::Serializer::new(String::new());
                for (key, value) in map {
                    match value {
                        Value::String(s) => query.append_pair(key, s),
                        Value::Object(_) | Value::Array(_) => query.append_pair(key, &value.to_string()),
                        other => query.append_pair(key, &other.to_string()),
                    };
                }
                query.finish()
            }
            Self::Anonymous => String::new(),
        }
    }

    /// Default headers for an API request.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` if the token contains bytes not allowed in
    /// a header value.
    pub fn headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let token = HeaderValue::from_str(&self.token())
            .map_err(|e| Error::InvalidInput(format!("session token is not a valid header value: {e}")))?;
        headers.insert(HeaderName::from_static(INIT_DATA_HEADER), token);

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decoded(value: Value) -> SessionIdentity {
        match value {
            Value::Object(map) => SessionIdentity::Decoded(map),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_raw_token_verbatim() {
        let session = SessionIdentity::Raw("query_id=AA&user=%7B%7D&hash=ff".into());
        assert_eq!(session.token(), "query_id=AA&user=%7B%7D&hash=ff");
    }

    #[test]
    fn test_decoded_token_urlencoded() {
        let session = decoded(json!({
            "query_id": "AAH",
            "user": {"id": 42, "first_name": "Ali"},
            "auth_date": 1700000000,
            "hash": "abc"
        }));

        let token = session.token();
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(token.as_bytes()).into_owned().collect();

        assert!(pairs.contains(&("query_id".into(), "AAH".into())));
        assert!(pairs.contains(&("auth_date".into(), "1700000000".into())));
        assert!(pairs.contains(&("hash".into(), "abc".into())));
        let user = pairs.iter().find(|(k, _)| k == "user").map(|(_, v)| v.clone()).unwrap();
        let user: Value = serde_json::from_str(&user).unwrap();
        assert_eq!(user["id"], 42);
    }

    #[test]
    fn test_anonymous_token_empty() {
        assert_eq!(SessionIdentity::Anonymous.token(), "");
    }

    #[test]
    fn test_headers_shape() {
        let headers = SessionIdentity::Raw("abc123".into()).headers().unwrap();
        assert_eq!(headers.get(INIT_DATA_HEADER).unwrap(), "abc123");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_headers_reject_control_chars() {
        let result = SessionIdentity::Raw("bad\ntoken".into()).headers();
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_config_prefers_raw() {
        let config = AppConfig {
            init_data: Some("raw".into()),
            init_data_unsafe: Some(r#"{"query_id":"x"}"#.into()),
            ..Default::default()
        };
        assert_eq!(SessionIdentity::from_config(&config).unwrap(), SessionIdentity::Raw("raw".into()));
    }

    #[test]
    fn test_from_config_decoded() {
        let config = AppConfig { init_data_unsafe: Some(r#"{"query_id":"x"}"#.into()), ..Default::default() };
        assert!(matches!(SessionIdentity::from_config(&config).unwrap(), SessionIdentity::Decoded(_)));
    }

    #[test]
    fn test_from_config_rejects_non_object() {
        let config = AppConfig { init_data_unsafe: Some("[1,2]".into()), ..Default::default() };
        assert!(SessionIdentity::from_config(&config).is_err());
    }

    #[test]
    fn test_from_config_anonymous() {
        let config = AppConfig::default();
        assert_eq!(SessionIdentity::from_config(&config).unwrap(), SessionIdentity::Anonymous);
    }
}

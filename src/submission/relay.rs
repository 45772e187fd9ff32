//! JSON form relay backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use super::fields::RELAY_FIELD_MAP;
use super::{Ack, SubmissionBackend};
use crate::application::ApplicationRecord;
use crate::config::{is_placeholder, RELAY_ENDPOINT_PREFIX};
use crate::error::{Channel, RecruitError, Result, TransportError};
use crate::types::Timestamp;

/// Posts the record as JSON to a third-party form relay.
///
/// The relay answers synchronously, so success is [`Ack::Confirmed`].
#[derive(Clone, Debug)]
pub struct RelayBackend {
    client: Client,
    endpoint: Option<String>,
    allowed_prefix: String,
    timeout: Duration,
}

impl RelayBackend {
    /// Creates a relay backend. The endpoint is checked on submit, not here.
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network(Channel::Relay, e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            allowed_prefix: RELAY_ENDPOINT_PREFIX.to_string(),
            timeout,
        })
    }

    /// Accepts endpoints under `prefix` instead of the hosted relay
    /// (self-hosted relays, local mocks).
    pub fn with_allowed_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.allowed_prefix = prefix.into();
        self
    }

    fn endpoint(&self) -> Result<&str> {
        validate_endpoint(self.endpoint.as_deref(), &self.allowed_prefix)
    }
}

/// Checks a relay endpoint: set, not a template placeholder, under `prefix`.
///
/// # Errors
///
/// Returns [`RecruitError::Config`] naming the first failed check.
pub fn validate_endpoint<'a>(endpoint: Option<&'a str>, prefix: &str) -> Result<&'a str> {
    let endpoint = match endpoint {
        Some(e) if !e.trim().is_empty() => e,
        _ => return Err(RecruitError::config("relay endpoint is not set")),
    };
    if is_placeholder(endpoint) {
        return Err(RecruitError::config(
            "relay endpoint still contains a placeholder form id",
        ));
    }
    if !endpoint.starts_with(prefix) {
        return Err(RecruitError::config(format!(
            "relay endpoint must start with {}",
            prefix
        )));
    }
    Ok(endpoint)
}

/// Builds the JSON body: the eight fields plus `submittedAt`.
fn body(record: &ApplicationRecord, submitted_at: Timestamp) -> Value {
    let mut map = Map::new();
    for (key, value) in RELAY_FIELD_MAP.encode(record, false) {
        map.insert(key.to_string(), Value::String(value));
    }
    map.insert(
        "submittedAt".to_string(),
        Value::String(submitted_at.to_rfc3339()),
    );
    Value::Object(map)
}

/// Pulls a reference id out of the relay's success body, if any.
fn reference(body: &Value) -> Option<String> {
    ["id", "submission_id", "reference"]
        .iter()
        .find_map(|key| match body.get(*key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[async_trait]
impl SubmissionBackend for RelayBackend {
    fn name(&self) -> &'static str {
        "relay"
    }

    fn validate_configuration(&self) -> Result<()> {
        self.endpoint().map(|_| ())
    }

    #[instrument(skip_all, fields(email = %record.masked_email()))]
    async fn submit(&self, record: &ApplicationRecord) -> Result<Ack> {
        let endpoint = self.endpoint()?;
        debug!("Posting application to relay");

        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .json(&body(record, Timestamp::now()))
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(Channel::Relay, &e, self.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::from_reqwest(Channel::Relay, &e, self.timeout))?;
        let parsed: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(|v| v.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| {
                    format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("unknown")
                    )
                });
            warn!(status = status.as_u16(), %message, "Relay rejected submission");
            return Err(RecruitError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let reference = match &parsed {
            Some(value) => reference(value),
            None => {
                warn!("Relay accepted submission with an unparseable body");
                None
            }
        };
        info!(reference = ?reference, "Relay accepted submission");
        Ok(Ack::Confirmed { reference })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Field;

    #[test]
    fn test_validate_endpoint() {
        let prefix = RELAY_ENDPOINT_PREFIX;
        assert!(validate_endpoint(None, prefix).unwrap_err().is_config());
        assert!(validate_endpoint(Some(""), prefix).is_err());
        assert!(validate_endpoint(Some("https://usebasin.com/f/YOUR_FORM_ID"), prefix).is_err());
        assert!(validate_endpoint(Some("your_basin_endpoint_here"), prefix).is_err());
        assert!(validate_endpoint(Some("https://example.com/f/abc"), prefix).is_err());
        assert_eq!(
            validate_endpoint(Some("https://usebasin.com/f/abc123"), prefix).unwrap(),
            "https://usebasin.com/f/abc123"
        );
    }

    #[test]
    fn test_body_has_all_fields_and_timestamp() {
        let record = ApplicationRecord::new()
            .with(Field::Name, " Jo ")
            .with(Field::Email, "jo@x.com");
        let value = body(&record, Timestamp::from_millis(0));
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 9);
        assert_eq!(object["name"], " Jo ");
        assert_eq!(object["experience"], "");
        assert_eq!(object["submittedAt"], "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_reference_extraction() {
        assert_eq!(
            reference(&serde_json::json!({"id": "abc"})),
            Some("abc".into())
        );
        assert_eq!(reference(&serde_json::json!({"id": 42})), Some("42".into()));
        assert_eq!(reference(&serde_json::json!({"ok": true})), None);
    }

    #[tokio::test]
    async fn test_unconfigured_submit_fails_before_network() {
        let backend = RelayBackend::new(None, Duration::from_secs(1)).unwrap();
        let err = backend.submit(&ApplicationRecord::new()).await.unwrap_err();
        assert!(err.is_config());
    }
}

//! PostgREST-backed application store.
//!
//! Talks to a hosted Postgres through its PostgREST API (the shape Supabase
//! exposes): rows live in `applications`, with a unique constraint on
//! `email`. Credentials are checked lazily so that a misconfigured
//! deployment still starts and reports the problem on submit.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use super::{ApplicationFilter, ApplicationStore, SortKey, DUPLICATE_EMAIL_MESSAGE};
use crate::application::{mask_email, Application, ApplicationRecord, Field};
use crate::config::is_placeholder;
use crate::error::{Channel, RecruitError, Result, TransportError};
use crate::types::{ApplicationId, Timestamp};

/// Postgres `unique_violation` SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

const NO_ROW_RETURNED: &str = "No data returned from database insertion";

/// Store backed by a PostgREST `applications` table.
#[derive(Clone, Debug)]
pub struct RestStore {
    client: Client,
    url: Option<String>,
    api_key: Option<String>,
    timeout: Duration,
}

/// Row shape returned by PostgREST. Text columns may come back `null`.
#[derive(Debug, Deserialize)]
struct Row {
    id: Uuid,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    university: Option<String>,
    #[serde(default)]
    year: Option<String>,
    #[serde(default)]
    position: Option<String>,
    #[serde(default)]
    skills: Option<String>,
    #[serde(default)]
    experience: Option<String>,
    #[serde(default)]
    motivation: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl From<Row> for Application {
    fn from(row: Row) -> Self {
        let created_at = Timestamp::from(row.created_at);
        Self {
            id: ApplicationId(row.id),
            record: ApplicationRecord {
                name: row.name.unwrap_or_default(),
                email: row.email.unwrap_or_default(),
                university: row.university.unwrap_or_default(),
                year: row.year.unwrap_or_default(),
                position: row.position.unwrap_or_default(),
                skills: row.skills.unwrap_or_default(),
                experience: row.experience.unwrap_or_default(),
                motivation: row.motivation.unwrap_or_default(),
            },
            created_at,
            updated_at: row.updated_at.map(Timestamp::from).unwrap_or(created_at),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdRow {
    id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl RestStore {
    /// Creates a store. Missing or placeholder credentials are accepted here
    /// and reported by [`check_configuration`](ApplicationStore::check_configuration).
    ///
    /// # Errors
    ///
    /// Returns a transport error if the HTTP client cannot be built.
    pub fn new(url: Option<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::network(Channel::Database, e.to_string()))?;
        Ok(Self {
            client,
            url,
            api_key,
            timeout,
        })
    }

    fn credentials(&self) -> Result<(&str, &str)> {
        let url = match self.url.as_deref() {
            Some(url) if !is_placeholder(url) => url,
            _ => return Err(RecruitError::config("database URL is not configured")),
        };
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(RecruitError::config(format!(
                "database URL must be an http(s) URL, got '{}'",
                url
            )));
        }
        let key = match self.api_key.as_deref() {
            Some(key) if !is_placeholder(key) => key,
            _ => return Err(RecruitError::config("database API key is not configured")),
        };
        Ok((url, key))
    }

    fn request(&self, method: reqwest::Method) -> Result<RequestBuilder> {
        let (url, key) = self.credentials()?;
        let endpoint = format!("{}/rest/v1/applications", url.trim_end_matches('/'));
        Ok(self
            .client
            .request(method, endpoint)
            .header("apikey", key)
            .bearer_auth(key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        request
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(Channel::Database, &e, self.timeout).into())
    }

    /// Decodes a success body. A body that arrives but does not parse is
    /// an unknown error, not a network failure: the write may have landed.
    async fn read_json<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let status = response.status();
        response.json::<T>().await.map_err(|e| {
            if e.is_decode() {
                RecruitError::unknown(format!(
                    "unreadable database response (HTTP {}): {}",
                    status.as_u16(),
                    e
                ))
            } else {
                TransportError::from_reqwest(Channel::Database, &e, self.timeout).into()
            }
        })
    }
}

/// Maps a non-success PostgREST response to an error.
async fn rejection(response: Response) -> RecruitError {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();

    let duplicate = status == StatusCode::CONFLICT
        || body.code.as_deref() == Some(UNIQUE_VIOLATION)
        || text.contains("duplicate key");
    if duplicate {
        return RecruitError::conflict(Field::Email, DUPLICATE_EMAIL_MESSAGE);
    }

    RecruitError::Rejected {
        status: status.as_u16(),
        message: body
            .message
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string()),
    }
}

/// Strips characters that would break a PostgREST `or=(...)` expression.
fn sanitize_search(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '*' | '"'))
        .collect()
}

#[async_trait]
impl ApplicationStore for RestStore {
    fn name(&self) -> &'static str {
        "database"
    }

    fn check_configuration(&self) -> Result<()> {
        self.credentials().map(|_| ())
    }

    #[instrument(skip_all, fields(email = %record.masked_email()))]
    async fn insert(&self, record: &ApplicationRecord) -> Result<Application> {
        let request = self
            .request(reqwest::Method::POST)?
            .header("Prefer", "return=representation")
            .json(record);
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let rows: Vec<Row> = self.read_json(response).await?;
        match rows.into_iter().next() {
            Some(row) => {
                let application = Application::from(row);
                debug!(id = %application.id, "Application stored");
                Ok(application)
            }
            None => {
                warn!("Insert succeeded without returning a row");
                Err(RecruitError::unknown(NO_ROW_RETURNED))
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<ApplicationId>> {
        let request = self.request(reqwest::Method::GET)?.query(&[
            ("email", format!("eq.{}", email.trim())),
            ("select", "id".to_string()),
            ("limit", "1".to_string()),
        ]);
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let rows: Vec<IdRow> = self.read_json(response).await?;
        let found = rows.into_iter().next().map(|row| ApplicationId(row.id));
        debug!(email = %mask_email(email), found = found.is_some(), "Email lookup");
        Ok(found)
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let order = match filter.sort {
            SortKey::Newest => "created_at.desc",
            SortKey::Name => "name.asc",
            SortKey::Position => "position.asc,created_at.desc",
        };
        let mut query = vec![
            ("select", "*".to_string()),
            ("order", order.to_string()),
        ];
        if let Some(position) = &filter.position {
            query.push(("position", format!("eq.{}", position)));
        }
        if let Some(term) = filter.search.as_deref().map(sanitize_search) {
            let term = term.trim();
            if !term.is_empty() {
                query.push((
                    "or",
                    format!(
                        "(name.ilike.*{0}*,email.ilike.*{0}*,university.ilike.*{0}*)",
                        term
                    ),
                ));
            }
        }

        let request = self.request(reqwest::Method::GET)?.query(&query);
        let response = self.send(request).await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let rows: Vec<Row> = self.read_json(response).await?;
        Ok(rows.into_iter().map(Application::from).collect())
    }
}

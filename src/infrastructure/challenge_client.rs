//! Client for the remote challenge ledger service
//!
//! The service hands out the run's manifest and a session token, serves the
//! listing pages, accepts record batches and receives the completion signal.
//! Every call after `request_manifest` carries the token in `Authorization`.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::constants::challenge as endpoints;
use crate::domain::{JobRecord, ManifestGrant};
use crate::infrastructure::config::ChallengeConfig;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Unexpected status {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("Service rejected request to {endpoint}: {body}")]
    Rejected { endpoint: String, body: String },

    #[error("Malformed response from {endpoint}: {source}")]
    Envelope {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Empty listing markup for page {page}")]
    EmptyPage { page: u32 },

    #[error("Invalid service URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    fn http(endpoint: &str, source: reqwest::Error) -> Self {
        Self::Http {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}

/// Operations the run controller needs from the challenge service.
#[async_trait]
pub trait ChallengeClient: Send + Sync {
    /// Request the run's manifest; the returned token authorizes later calls.
    async fn request_manifest(&self) -> Result<ManifestGrant, ClientError>;

    /// Raw markup of listing page `page` (1-based).
    async fn fetch_page(&self, page: u32) -> Result<String, ClientError>;

    /// Submit one page's records; `Ok(true)` means the batch was acknowledged.
    async fn submit_batch(&self, records: &[JobRecord], page: u32) -> Result<bool, ClientError>;

    /// Signal that every manifest id has been submitted.
    async fn complete_challenge(&self) -> Result<bool, ClientError>;
}

/// `{"data": ...}` request body used by every POST
#[derive(Debug, Serialize)]
struct DataBody<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct Identity<'a> {
    email: &'a str,
}

/// `{"success": bool, "data": ...}` response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ChallengeGrant {
    token: String,
    assigned_job_ids: Vec<String>,
}

/// reqwest-backed challenge client
pub struct HttpChallengeClient {
    client: Client,
    base_url: Url,
    email: String,
    auth_token: RwLock<Option<String>>,
}

impl HttpChallengeClient {
    /// Create a new client from the challenge configuration
    pub fn new(config: &ChallengeConfig) -> Result<Self, ClientError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()
            .map_err(|e| ClientError::http("client", e))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(&config.base_url)?,
            email: config.email.clone(),
            auth_token: RwLock::new(None),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    /// Attach the session token, if one has been issued.
    async fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.auth_token.read().await.as_deref() {
            Some(token) => request.header(AUTHORIZATION, token),
            None => request,
        }
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, ClientError> {
        let response = self
            .authorized(request)
            .await
            .send()
            .await
            .map_err(|e| ClientError::http(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    async fn post_json<B, T>(&self, path: &str, body: Option<&B>) -> Result<Envelope<T>, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let mut request = self
            .client
            .post(self.endpoint(path)?)
            .header(CONTENT_TYPE, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        self.send(path, request)
            .await?
            .json::<Envelope<T>>()
            .await
            .map_err(|source| ClientError::Envelope {
                endpoint: path.to_string(),
                source,
            })
    }

    /// Token captured from the last successful manifest request.
    pub async fn auth_token(&self) -> Option<String> {
        self.auth_token.read().await.clone()
    }
}

/// `Url::join` drops the last path segment unless the base ends with `/`.
fn normalize_base_url(base_url: &str) -> Result<Url, ClientError> {
    if base_url.ends_with('/') {
        Ok(Url::parse(base_url)?)
    } else {
        Ok(Url::parse(&format!("{base_url}/"))?)
    }
}

#[async_trait]
impl ChallengeClient for HttpChallengeClient {
    async fn request_manifest(&self) -> Result<ManifestGrant, ClientError> {
        let body = DataBody {
            data: Identity { email: &self.email },
        };
        let envelope: Envelope<ChallengeGrant> = self
            .post_json(endpoints::CHALLENGES_PATH, Some(&body))
            .await?;

        match envelope {
            Envelope {
                success: true,
                data: Some(grant),
            } => {
                debug!("🔑 Session token issued ({} chars)", grant.token.len());
                *self.auth_token.write().await = Some(grant.token.clone());
                Ok(ManifestGrant {
                    auth_token: grant.token,
                    job_ids: grant.assigned_job_ids,
                })
            }
            _ => Err(ClientError::Rejected {
                endpoint: endpoints::CHALLENGES_PATH.to_string(),
                body: "Failed posting challenge".to_string(),
            }),
        }
    }

    async fn fetch_page(&self, page: u32) -> Result<String, ClientError> {
        let request = self
            .client
            .get(self.endpoint(endpoints::JOBS_PATH)?)
            .query(&[("page", page)]);

        let markup = self
            .send(endpoints::JOBS_PATH, request)
            .await?
            .text()
            .await
            .map_err(|e| ClientError::http(endpoints::JOBS_PATH, e))?;

        if markup.trim().is_empty() {
            return Err(ClientError::EmptyPage { page });
        }

        debug!("Fetched page {} ({} bytes)", page, markup.len());
        Ok(markup)
    }

    async fn submit_batch(&self, records: &[JobRecord], page: u32) -> Result<bool, ClientError> {
        let body = DataBody { data: records };
        let envelope: Envelope<serde_json::Value> = self
            .post_json(endpoints::JOBS_BATCH_PATH, Some(&body))
            .await?;

        if !envelope.success {
            warn!("Batch for page {} was not acknowledged", page);
        }
        Ok(envelope.success)
    }

    async fn complete_challenge(&self) -> Result<bool, ClientError> {
        let envelope: Envelope<serde_json::Value> = self
            .post_json::<(), _>(endpoints::COMPLETE_PATH, None)
            .await?;

        if envelope.success {
            if let Some(data) = envelope.data {
                info!("🏁 Challenge completion response: {}", data);
            }
        } else {
            warn!("Completion was not acknowledged");
        }
        Ok(envelope.success)
    }
}

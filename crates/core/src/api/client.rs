use super::ApplicationsApi;
use crate::error::ApiError;
use crate::intake::ApplicationSubmission;
use crate::models::{
    Application, ListResponse, Status, SubmitApplicationResponse, UpdateStatusRequest,
    UpdateStatusResponse,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("loandesk/", env!("CARGO_PKG_VERSION"));

/// Locations of the remote endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// GET endpoint returning `{ success, applications }`
    #[serde(default = "default_list_url")]
    pub list_url: String,

    /// POST endpoint accepting `{ id, status }`
    #[serde(default = "default_update_url")]
    pub update_url: String,

    /// POST endpoint for public form submissions; without it submissions
    /// are only confirmed locally
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submit_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_list_url() -> String {
    "http://127.0.0.1:8081/applications".to_string()
}

fn default_update_url() -> String {
    "http://127.0.0.1:8081/update-status".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            list_url: default_list_url(),
            update_url: default_update_url(),
            submit_url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// `ApplicationsApi` over HTTP
///
/// Response bodies are decoded whatever the HTTP status, since the
/// endpoints report business failures through the `success` flag.
#[derive(Debug, Clone)]
pub struct HttpApplicationsApi {
    client: Client,
    config: EndpointConfig,
}

impl HttpApplicationsApi {
    pub fn new(config: EndpointConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!(
            "Application API configured (list: {}, update: {}, submit: {})",
            config.list_url,
            config.update_url,
            config.submit_url.as_deref().unwrap_or("local only")
        );

        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &EndpointConfig {
        &self.config
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!("Response {} ({} bytes)", status, bytes.len());
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait::async_trait]
impl ApplicationsApi for HttpApplicationsApi {
    async fn list_applications(&self) -> Result<Vec<Application>, ApiError> {
        let response = self.client.get(&self.config.list_url).send().await?;
        let body: ListResponse = Self::decode(response).await?;

        if body.success {
            Ok(body.applications.unwrap_or_default())
        } else {
            Err(ApiError::Rejected(body.error))
        }
    }

    async fn update_status(&self, id: i64, status: &Status) -> Result<(), ApiError> {
        let request = UpdateStatusRequest {
            id,
            status: status.clone(),
        };
        let response = self
            .client
            .post(&self.config.update_url)
            .json(&request)
            .send()
            .await?;
        let body: UpdateStatusResponse = Self::decode(response).await?;

        if body.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(body.error))
        }
    }

    async fn submit_application(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<Option<i64>, ApiError> {
        let Some(url) = self.config.submit_url.as_deref() else {
            return Ok(None);
        };

        let response = self.client.post(url).json(submission).send().await?;
        let body: SubmitApplicationResponse = Self::decode(response).await?;

        if body.success {
            Ok(body.application_id)
        } else {
            Err(ApiError::Rejected(body.error))
        }
    }
}

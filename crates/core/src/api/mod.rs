//! Remote application endpoints

use crate::error::ApiError;
use crate::intake::ApplicationSubmission;
use crate::models::{Application, Status};

mod client;
pub use client::{EndpointConfig, HttpApplicationsApi};

#[cfg(test)]
use mockall::automock;

/// The external HTTP API that stores, lists and updates applications
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait ApplicationsApi: Send + Sync {
    /// Fetch all applications, newest first.
    async fn list_applications(&self) -> Result<Vec<Application>, ApiError>;

    /// Change the status of one application.
    async fn update_status(&self, id: i64, status: &Status) -> Result<(), ApiError>;

    /// Send a public form submission.
    ///
    /// Returns the id assigned by the endpoint, or `None` when no submit
    /// endpoint is configured and the submission is only confirmed locally.
    async fn submit_application(
        &self,
        submission: &ApplicationSubmission,
    ) -> Result<Option<i64>, ApiError>;
}

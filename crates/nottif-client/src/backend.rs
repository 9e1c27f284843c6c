use async_trait::async_trait;
use nottif_core::{CronJob, Event, JobId};

use crate::client::SendRequest;
use crate::error::FetchError;

/// The backend's request/response surface.
///
/// Implemented by [`ActionClient`](crate::ActionClient) over HTTP. The
/// dashboard only depends on this trait, so tests can swap in an in-memory
/// backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/cron/list`
    async fn list_jobs(&self) -> Result<Vec<CronJob>, FetchError>;

    /// `GET /api/events`
    async fn list_events(&self) -> Result<Vec<Event>, FetchError>;

    /// `POST /api/cron/add`. The server assigns the id; callers refetch.
    async fn add_job(&self, message: &str, schedule: &str) -> Result<(), FetchError>;

    /// `DELETE /api/cron/delete/{id}`
    async fn delete_job(&self, id: &JobId) -> Result<(), FetchError>;

    /// `POST /api/webhook/update`
    async fn update_webhook(&self, url: &str) -> Result<(), FetchError>;

    /// `POST /api/webhook/test`. On failure the error carries the backend's
    /// message when it sent one (see [`FetchError::server_message`]).
    async fn test_webhook(&self) -> Result<(), FetchError>;

    /// `POST /api/send`
    async fn send_notification(&self, req: &SendRequest) -> Result<(), FetchError>;

    /// `GET /api/healthcheck`
    async fn health(&self) -> Result<(), FetchError>;
}

use std::time::Duration;

use async_trait::async_trait;
use nottif_core::config::{PayloadShape, ServerConfig};
use nottif_core::types::lenient_list;
use nottif_core::{CronJob, Event, JobId, NottifError};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::backend::Backend;
use crate::error::FetchError;
use crate::push::PushChannel;

pub const JOBS_LIST_PATH: &str = "/api/cron/list";
pub const JOBS_ADD_PATH: &str = "/api/cron/add";
pub const JOBS_DELETE_PATH: &str = "/api/cron/delete";
pub const EVENTS_PATH: &str = "/api/events";
pub const EVENTS_STREAM_PATH: &str = "/api/events/stream";
pub const WEBHOOK_UPDATE_PATH: &str = "/api/webhook/update";
pub const WEBHOOK_TEST_PATH: &str = "/api/webhook/test";
pub const SEND_PATH: &str = "/api/send";
pub const HEALTH_PATH: &str = "/api/healthcheck";

/// Body of `POST /api/send`. Empty optional fields let the backend apply its
/// own username and avatar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SendRequest {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl SendRequest {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

#[derive(Serialize)]
struct AddJobBody<'a> {
    message: &'a str,
    schedule: &'a str,
}

#[derive(Serialize)]
struct WebhookBody<'a> {
    url: &'a str,
}

// Error bodies and the webhook test result (deserialization only)

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

#[derive(Deserialize)]
struct TestOutcome {
    ok: Option<bool>,
    error: Option<String>,
}

/// HTTP implementation of [`Backend`].
///
/// Cheap to clone; clones share one connection pool. The per-request timeout
/// is applied to REST calls only, never to the event stream.
#[derive(Debug, Clone)]
pub struct ActionClient {
    client: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl ActionClient {
    pub fn new(config: &ServerConfig) -> nottif_core::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| NottifError::Config(format!("http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// A not-yet-connected live event stream on the same connection pool.
    pub fn push_channel(&self, shape: PayloadShape) -> PushChannel {
        PushChannel::new(self.client.clone(), self.url(EVENTS_STREAM_PATH), shape)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send with the request timeout and turn any non-2xx into [`FetchError::Status`].
    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
        path: &str,
    ) -> Result<reqwest::Response, FetchError> {
        let resp = builder
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                path: path.to_string(),
                source,
            })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error);
        debug!(path, status = status.as_u16(), "backend rejected request");
        Err(FetchError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn get_list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let resp = self.execute(self.client.get(self.url(path)), path).await?;
        let value: Value = resp.json().await.map_err(|e| FetchError::Decode {
            path: path.to_string(),
            reason: e.to_string(),
        })?;
        Ok(lenient_list(value))
    }
}

#[async_trait]
impl Backend for ActionClient {
    async fn list_jobs(&self) -> Result<Vec<CronJob>, FetchError> {
        self.get_list(JOBS_LIST_PATH).await
    }

    async fn list_events(&self) -> Result<Vec<Event>, FetchError> {
        self.get_list(EVENTS_PATH).await
    }

    async fn add_job(&self, message: &str, schedule: &str) -> Result<(), FetchError> {
        debug!(%schedule, "adding cron job");
        let builder = self
            .client
            .post(self.url(JOBS_ADD_PATH))
            .json(&AddJobBody { message, schedule });
        self.execute(builder, JOBS_ADD_PATH).await?;
        Ok(())
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), FetchError> {
        let path = format!("{}/{}", JOBS_DELETE_PATH, urlencoding::encode(id.as_str()));
        debug!(job_id = %id, "deleting cron job");
        self.execute(self.client.delete(self.url(&path)), &path)
            .await?;
        Ok(())
    }

    async fn update_webhook(&self, url: &str) -> Result<(), FetchError> {
        let builder = self
            .client
            .post(self.url(WEBHOOK_UPDATE_PATH))
            .json(&WebhookBody { url });
        self.execute(builder, WEBHOOK_UPDATE_PATH).await?;
        Ok(())
    }

    async fn test_webhook(&self) -> Result<(), FetchError> {
        let resp = self
            .execute(self.client.post(self.url(WEBHOOK_TEST_PATH)), WEBHOOK_TEST_PATH)
            .await?;
        let body = resp.text().await.unwrap_or_default();
        // A 2xx that still says `ok: false` is a failed send.
        if let Ok(TestOutcome {
            ok: Some(false),
            error,
        }) = serde_json::from_str::<TestOutcome>(&body)
        {
            return Err(FetchError::Rejected {
                path: WEBHOOK_TEST_PATH.to_string(),
                message: error,
            });
        }
        Ok(())
    }

    async fn send_notification(&self, req: &SendRequest) -> Result<(), FetchError> {
        if req.content.trim().is_empty() {
            return Err(FetchError::InvalidRequest(
                "content field is required".to_string(),
            ));
        }
        let builder = self.client.post(self.url(SEND_PATH)).json(req);
        self.execute(builder, SEND_PATH).await?;
        Ok(())
    }

    async fn health(&self) -> Result<(), FetchError> {
        self.execute(self.client.get(self.url(HEALTH_PATH)), HEALTH_PATH)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ActionClient {
        ActionClient::new(&ServerConfig {
            base_url: server.uri(),
            ..ServerConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn list_jobs_decodes_backend_array() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JOBS_LIST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "a1", "message": "Backup", "schedule": "0 2 * * *"},
                {"id": "b2", "message": "Report", "schedule": "0 9 * * 1"}
            ])))
            .mount(&server)
            .await;

        let jobs = client_for(&server).list_jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].message, "Backup");
        assert_eq!(jobs[1].id.as_str(), "b2");
    }

    #[tokio::test]
    async fn list_events_null_body_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(EVENTS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let events = client_for(&server).list_events().await.unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn non_2xx_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(JOBS_LIST_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server).list_jobs().await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert!(err.server_message().is_none());
    }

    #[tokio::test]
    async fn add_job_posts_message_and_schedule() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(JOBS_ADD_PATH))
            .and(body_json(serde_json::json!({"message": "Backup", "schedule": "0 2 * * *"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "new-id", "message": "Backup", "schedule": "0 2 * * *"
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .add_job("Backup", "0 2 * * *")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_missing_job_keeps_server_message() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/cron/delete/42"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "Cron job not found"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .delete_job(&JobId::from(42u64))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.server_message(), Some("Cron job not found"));
    }

    #[tokio::test]
    async fn update_webhook_posts_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBHOOK_UPDATE_PATH))
            .and(body_json(serde_json::json!({"url": "https://discord.test/hook"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "updated"})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .update_webhook("https://discord.test/hook")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_webhook_surfaces_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBHOOK_TEST_PATH))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({"error": "Failed to send test notification"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).test_webhook().await.unwrap_err();
        assert_eq!(err.server_message(), Some("Failed to send test notification"));
    }

    #[tokio::test]
    async fn test_webhook_ok_false_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBHOOK_TEST_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"ok": false, "error": "webhook URL is not configured"})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).test_webhook().await.unwrap_err();
        assert!(matches!(err, FetchError::Rejected { .. }));
        assert_eq!(err.status(), None);
        assert_eq!(err.server_message(), Some("webhook URL is not configured"));
        assert_eq!(
            err.to_string(),
            "/api/webhook/test reported failure: webhook URL is not configured"
        );
    }

    #[tokio::test]
    async fn test_webhook_plain_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(WEBHOOK_TEST_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "sent"})))
            .mount(&server)
            .await;

        assert!(client_for(&server).test_webhook().await.is_ok());
    }

    #[tokio::test]
    async fn send_rejects_empty_content_without_calling_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .send_notification(&SendRequest::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn send_omits_unset_optional_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .and(body_json(serde_json::json!({"content": "deploy finished"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "sent"})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .send_notification(&SendRequest::new("deploy finished"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .mount(&server)
            .await;

        assert!(client_for(&server).health().await.is_ok());
    }
}

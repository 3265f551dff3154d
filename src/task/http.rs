//! HTTP GET target

use super::{Task, TaskOutcome};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Issues one GET per invocation and reads the full body
pub struct HttpGetTask {
    client: Client,
    url: String,
    name: String,
}

impl HttpGetTask {
    /// Build a task sharing one pooled client across all workers
    pub fn new(url: &str, timeout: Duration, max_idle_per_host: usize) -> Result<Self> {
        let parsed = url::Url::parse(url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(AppError::config(format!(
                "Unsupported URL scheme '{}' for HTTP target",
                parsed.scheme()
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(max_idle_per_host.max(1))
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            name: format!("GET {}", url),
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Task for HttpGetTask {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self) -> Result<TaskOutcome> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();

        if status.is_client_error() || status.is_server_error() {
            return Err(AppError::http_request(format!(
                "{} returned {}",
                self.url, status
            )));
        }

        let body = response.bytes().await?;
        Ok(TaskOutcome::with_detail(format!("{} ({} bytes)", status, body.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_successful_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(3)
            .mount(&server)
            .await;

        let task = HttpGetTask::new(&format!("{}/health", server.uri()), Duration::from_secs(5), 4).unwrap();
        for _ in 0..3 {
            let outcome = task.invoke().await.unwrap();
            assert_eq!(outcome.detail.as_deref(), Some("200 OK (2 bytes)"));
        }
    }

    #[tokio::test]
    async fn test_error_status_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let task = HttpGetTask::new(&server.uri(), Duration::from_secs(5), 1).unwrap();
        let result = task.invoke().await;
        assert!(matches!(result, Err(AppError::HttpRequest(_))));
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let task = HttpGetTask::new(&server.uri(), Duration::from_millis(200), 1).unwrap();
        let result = task.invoke().await;
        assert!(matches!(result, Err(AppError::Timeout(_))));
    }

    #[test]
    fn test_rejects_non_http_scheme() {
        assert!(HttpGetTask::new("ftp://example.com", Duration::from_secs(1), 1).is_err());
        assert!(HttpGetTask::new("not a url", Duration::from_secs(1), 1).is_err());
    }

    #[test]
    fn test_name_includes_url() {
        let task = HttpGetTask::new("http://localhost:8080/x", Duration::from_secs(1), 1).unwrap();
        assert_eq!(task.name(), "GET http://localhost:8080/x");
        assert_eq!(task.url(), "http://localhost:8080/x");
    }
}

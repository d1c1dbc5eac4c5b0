//! Docker Hub repository management

use crate::error::{OpsError, Result};
use serde::Serialize;
use tracing::debug;

/// Public Docker Hub API endpoint.
pub const DOCKER_HUB_URL: &str = "https://hub.docker.com";

/// Outcome of an ensure call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoStatus {
    /// The repository was already present; nothing was written.
    AlreadyExists,
    /// The repository was created by this call.
    Created,
}

/// Client for the Docker Hub repositories API. The token is held in
/// memory and sent as a Bearer header; it is never exported to the
/// process environment.
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
    namespace: String,
    token: String,
}

/// Repository creation payload
#[derive(Serialize)]
struct CreateRepositoryRequest<'a> {
    namespace: &'a str,
    name: &'a str,
    is_private: bool,
}

impl HubClient {
    /// Client against the public Docker Hub.
    pub fn new(namespace: &str, token: &str) -> Self {
        Self::with_base_url(DOCKER_HUB_URL, namespace, token)
    }

    /// Client against an arbitrary endpoint. Tests point this at a local
    /// mock server.
    pub fn with_base_url(base_url: &str, namespace: &str, token: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            namespace: namespace.to_string(),
            token: token.to_string(),
        }
    }

    /// Make sure `repository` exists under the namespace, creating it when
    /// the lookup reports 404. At most one write per call; calling again
    /// for an existing repository performs none.
    pub async fn ensure_repository(&self, repository: &str) -> Result<RepoStatus> {
        let url = format!(
            "{}/v2/repositories/{}/{}/",
            self.base_url, self.namespace, repository
        );

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?;

        if response.status().is_success() {
            debug!(repository, "repository already exists");
            return Ok(RepoStatus::AlreadyExists);
        }

        if response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(OpsError::Registry {
                status: response.status(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        self.create_repository(repository).await?;
        Ok(RepoStatus::Created)
    }

    async fn create_repository(&self, repository: &str) -> Result<()> {
        let url = format!("{}/v2/repositories/", self.base_url);
        let body = CreateRepositoryRequest {
            namespace: &self.namespace,
            name: repository,
            is_private: false,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OpsError::Registry {
                status: response.status(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        debug!(repository, "repository created");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> HubClient {
        HubClient::with_base_url(&server.base_url(), "iammasterbrucewayne", "test-token")
    }

    #[tokio::test]
    async fn test_existing_repository_performs_no_creation() {
        let server = MockServer::start();
        let lookup = server.mock(|when, then| {
            when.method(GET)
                .path("/v2/repositories/iammasterbrucewayne/dcs-backend/")
                .header("Authorization", "Bearer test-token");
            then.status(200).json_body(json!({"name": "dcs-backend"}));
        });
        let create = server.mock(|when, then| {
            when.method(POST).path("/v2/repositories/");
            then.status(201);
        });

        let hub = client(&server);
        let first = hub.ensure_repository("dcs-backend").await.unwrap();
        let second = hub.ensure_repository("dcs-backend").await.unwrap();

        assert_eq!(first, RepoStatus::AlreadyExists);
        assert_eq!(second, RepoStatus::AlreadyExists);
        assert_eq!(lookup.hits(), 2);
        assert_eq!(create.hits(), 0);
    }

    #[tokio::test]
    async fn test_missing_repository_is_created() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v2/repositories/iammasterbrucewayne/dcs-backend/");
            then.status(404).json_body(json!({"message": "not found"}));
        });
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/v2/repositories/")
                .header("Authorization", "Bearer test-token")
                .json_body(json!({
                    "namespace": "iammasterbrucewayne",
                    "name": "dcs-backend",
                    "is_private": false
                }));
            then.status(201).json_body(json!({"name": "dcs-backend"}));
        });

        let hub = client(&server);
        let status = hub.ensure_repository("dcs-backend").await.unwrap();

        assert_eq!(status, RepoStatus::Created);
        create.assert();
    }

    #[tokio::test]
    async fn test_lookup_error_is_fatal_with_status_and_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v2/repositories/iammasterbrucewayne/dcs-backend/");
            then.status(500).body("internal error");
        });

        let hub = client(&server);
        let error = hub.ensure_repository("dcs-backend").await.unwrap_err();

        match error {
            OpsError::Registry { status, body } => {
                assert_eq!(status.as_u16(), 500);
                assert!(body.contains("internal error"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_creation_is_fatal() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET)
                .path("/v2/repositories/iammasterbrucewayne/dcs-backend/");
            then.status(404);
        });
        server.mock(|when, then| {
            when.method(POST).path("/v2/repositories/");
            then.status(403).body("quota exceeded");
        });

        let hub = client(&server);
        let error = hub.ensure_repository("dcs-backend").await.unwrap_err();

        match error {
            OpsError::Registry { status, body } => {
                assert_eq!(status.as_u16(), 403);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}

//! GitHub REST API client.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::errors::GitHubError;

/// Request body for `POST /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPullRequest {
    pub title: String,
    pub body: String,
    /// Branch containing the changes.
    pub head: String,
    /// Branch the changes should be merged into.
    pub base: String,
    pub draft: bool,
    pub maintainer_can_modify: bool,
}

impl NewPullRequest {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        head: impl Into<String>,
        base: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            head: head.into(),
            base: base.into(),
            draft: false,
            maintainer_can_modify: true,
        }
    }

    pub fn draft(mut self, draft: bool) -> Self {
        self.draft = draft;
        self
    }
}

/// The subset of a created pull request that callers use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub draft: bool,
}

/// Asynchronous GitHub REST API client.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> Result<Self, GitHubError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("gitscribe/", env!("CARGO_PKG_VERSION"))),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        info!(api_url = %api_url, "created GitHubClient");
        Ok(Self {
            http,
            api_url,
            token: token.into(),
        })
    }

    /// Open a pull request on `repo` (`owner/name`).
    #[instrument(skip(self, request), fields(head = %request.head, base = %request.base))]
    pub async fn create_pull_request(
        &self,
        repo: &str,
        request: &NewPullRequest,
    ) -> Result<PullRequest, GitHubError> {
        let url = format!("{}/repos/{}/pulls", self.api_url, repo);
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;
        let resp = check_response(resp).await?;
        let pr: PullRequest = resp
            .json()
            .await
            .map_err(|e| GitHubError::ParseError(e.to_string()))?;

        if pr.html_url.as_deref().map_or(true, str::is_empty) {
            return Err(GitHubError::ParseError(
                "response is missing 'html_url'".into(),
            ));
        }
        info!(number = pr.number, draft = pr.draft, "created pull request");
        Ok(pr)
    }
}

async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, GitHubError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(GitHubError::AuthenticationFailed(format!(
            "HTTP {}",
            status
        )));
    }
    if status.as_u16() == 429 {
        let reset = resp
            .headers()
            .get("x-ratelimit-reset")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        return Err(GitHubError::RateLimited { reset_at: reset });
    }
    let body = resp.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "GitHub API request failed");
    Err(GitHubError::ApiError {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn sample_request() -> NewPullRequest {
        NewPullRequest::new("Add stats", "Adds a stats command.", "feature/stats", "main")
    }

    #[tokio::test]
    async fn test_create_pull_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/acme/widgets/pulls")
            .match_header("authorization", "Bearer tok")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "title": "Add stats",
                "head": "feature/stats",
                "base": "main",
                "draft": false,
                "maintainer_can_modify": true
            })))
            .with_status(201)
            .with_body(r#"{"number": 7, "html_url": "https://github.com/acme/widgets/pull/7", "draft": false}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "tok").unwrap();
        let pr = client
            .create_pull_request("acme/widgets", &sample_request())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(pr.number, 7);
        assert_eq!(
            pr.html_url.as_deref(),
            Some("https://github.com/acme/widgets/pull/7")
        );
    }

    #[tokio::test]
    async fn test_create_draft_pull_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/repos/acme/widgets/pulls")
            .match_body(Matcher::PartialJson(serde_json::json!({"draft": true})))
            .with_status(201)
            .with_body(r#"{"number": 8, "html_url": "https://github.com/acme/widgets/pull/8", "draft": true}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "tok").unwrap();
        let pr = client
            .create_pull_request("acme/widgets", &sample_request().draft(true))
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(pr.draft);
    }

    #[tokio::test]
    async fn test_missing_html_url_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/acme/widgets/pulls")
            .with_status(201)
            .with_body(r#"{"number": 9}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "tok").unwrap();
        let result = client
            .create_pull_request("acme/widgets", &sample_request())
            .await;
        assert!(matches!(result, Err(GitHubError::ParseError(_))));
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/acme/widgets/pulls")
            .with_status(401)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "bad").unwrap();
        let result = client
            .create_pull_request("acme/widgets", &sample_request())
            .await;
        assert!(matches!(result, Err(GitHubError::AuthenticationFailed(_))));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/acme/widgets/pulls")
            .with_status(429)
            .with_header("x-ratelimit-reset", "1700000000")
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "tok").unwrap();
        let result = client
            .create_pull_request("acme/widgets", &sample_request())
            .await;
        match result {
            Err(GitHubError::RateLimited { reset_at }) => assert_eq!(reset_at, "1700000000"),
            other => panic!("expected RateLimited, got {:?}", other.map(|p| p.number)),
        }
    }

    #[tokio::test]
    async fn test_validation_failure_keeps_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/repos/acme/widgets/pulls")
            .with_status(422)
            .with_body(r#"{"message": "Validation Failed"}"#)
            .create_async()
            .await;

        let client = GitHubClient::new(server.url(), "tok").unwrap();
        let result = client
            .create_pull_request("acme/widgets", &sample_request())
            .await;
        match result {
            Err(GitHubError::ApiError { status, body }) => {
                assert_eq!(status, 422);
                assert!(body.contains("Validation Failed"));
            }
            other => panic!("expected ApiError, got {:?}", other.map(|p| p.number)),
        }
    }
}

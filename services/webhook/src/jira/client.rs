use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use storybot_common::error::{StorybotError, StorybotResult};
use storybot_config::env::{get_var, get_var_or};

use super::custom_fields::DecodeError;
use super::models::{Comment, Issue};
use super::tracker::Tracker;

pub const DEFAULT_BASE_URL: &str = "https://jirat.hbm.com";

#[derive(Clone)]
pub struct JiraClientConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: Option<u64>,
}

impl JiraClientConfig {
    /// Load Jira config from environment.
    ///
    /// `JIRA_USERNAME` and `JIRA_PASSWORD` are required; the base URL falls
    /// back to [`DEFAULT_BASE_URL`]. Without `JIRA_TIMEOUT_SECS` requests have
    /// no timeout; a value that is not a whole number of seconds is an error.
    pub fn from_env() -> StorybotResult<Self> {
        let base_url = get_var_or("JIRA_BASE_URL", DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let username = get_var("JIRA_USERNAME")?;
        let password = get_var("JIRA_PASSWORD")?;
        let timeout_secs = std::env::var("JIRA_TIMEOUT_SECS")
            .ok()
            .map(|v| v.parse::<u64>())
            .transpose()
            .map_err(|e| StorybotError::Config(format!("invalid JIRA_TIMEOUT_SECS: {e}")))?;

        Ok(Self {
            base_url,
            username,
            password,
            timeout_secs,
        })
    }
}

impl fmt::Debug for JiraClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"***")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone)]
pub struct JiraClient {
    client: Client,
    config: JiraClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum JiraClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid issue key: {0:?}")]
    InvalidKey(String),

    #[error("unexpected issue payload: {0}")]
    Decode(#[from] DecodeError),
}

impl JiraClient {
    pub fn new(config: JiraClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;
        Ok(Self { client, config })
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub fn config(&self) -> &JiraClientConfig {
        &self.config
    }

    fn issue_url(&self, key: &str) -> Result<String, JiraClientError> {
        // keys come from webhook payloads and end up in the request path
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(JiraClientError::InvalidKey(key.to_string()));
        }
        Ok(format!("{}/rest/api/2/issue/{}", self.config.base_url, key))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, JiraClientError> {
        let response = request
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(JiraClientError::HttpError { status, body })
    }
}

#[async_trait]
impl Tracker for JiraClient {
    async fn get_issue(&self, key: &str) -> Result<Issue, JiraClientError> {
        let url = self.issue_url(key)?;
        let response = self.send(self.client.get(url)).await?;
        let bytes = response.bytes().await?;
        Ok(Issue::from_slice(&bytes)?)
    }

    async fn update_issue_fields(
        &self,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<StatusCode, JiraClientError> {
        let url = self.issue_url(key)?;
        let body = serde_json::json!({ "fields": fields });
        let response = self.send(self.client.put(url).json(&body)).await?;
        Ok(response.status())
    }

    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment, JiraClientError> {
        let url = format!("{}/comment", self.issue_url(key)?);
        let payload = serde_json::json!({ "body": body });
        let response = self.send(self.client.post(url).json(&payload)).await?;
        Ok(response.json::<Comment>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> JiraClientConfig {
        JiraClientConfig {
            base_url: "http://localhost".to_string(),
            username: "bot".to_string(),
            password: "secret".to_string(),
            timeout_secs: Some(5),
        }
    }

    async fn client_for(server: &MockServer) -> JiraClient {
        JiraClient::new(test_config())
            .unwrap()
            .with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn get_issue_decodes_custom_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/EPIC-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "10001",
                "key": "EPIC-1",
                "self": "https://jira.example.com/rest/api/2/issue/10001",
                "fields": {
                    "description": "the epic",
                    "customfield_10021": 8,
                    "customfield_10020": [{ "id": 1 }]
                }
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let issue = client.get_issue("EPIC-1").await.unwrap();

        assert_eq!(issue.id, "10001");
        assert_eq!(issue.key, "EPIC-1");
        assert_eq!(issue.fields.description.as_deref(), Some("the epic"));
        assert_eq!(issue.fields.custom_fields.len(), 1);
        assert_eq!(
            issue.fields.custom_fields.number("customfield_10021").unwrap(),
            8.0
        );
    }

    #[tokio::test]
    async fn uses_basic_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/EPIC-1"))
            .and(header("Authorization", "Basic Ym90OnNlY3JldA=="))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "key": "EPIC-1",
                "fields": {}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.get_issue("EPIC-1").await.unwrap();
    }

    #[tokio::test]
    async fn get_issue_not_found_is_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/EPIC-404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Issue Does Not Exist"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_issue("EPIC-404").await.unwrap_err();
        match err {
            JiraClientError::HttpError { status, body } => {
                assert_eq!(status, StatusCode::NOT_FOUND);
                assert_eq!(body, "Issue Does Not Exist");
            }
            other => panic!("expected HttpError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn get_issue_with_malformed_body_is_decode_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/2/issue/EPIC-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.get_issue("EPIC-1").await.unwrap_err();
        assert!(matches!(err, JiraClientError::Decode(_)), "got: {err:?}");
    }

    #[tokio::test]
    async fn update_issue_sends_partial_fields() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/EPIC-1"))
            .and(body_json(serde_json::json!({
                "fields": { "customfield_10021": 5.0 }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let mut fields = Map::new();
        fields.insert("customfield_10021".to_string(), serde_json::json!(5.0));

        let status = client.update_issue_fields("EPIC-1", fields).await.unwrap();
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn update_issue_server_error_is_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/rest/api/2/issue/EPIC-1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .update_issue_fields("EPIC-1", Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, JiraClientError::HttpError { .. }));
    }

    #[tokio::test]
    async fn add_comment_posts_body_and_returns_comment() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/rest/api/2/issue/PROJ-123/comment"))
            .and(body_json(serde_json::json!({ "body": "hello" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "id": "20001",
                "self": "https://jira.example.com/rest/api/2/issue/10042/comment/20001",
                "body": "hello"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let comment = client.add_comment("PROJ-123", "hello").await.unwrap();
        assert_eq!(comment.id, "20001");
        assert_eq!(comment.body, "hello");
        assert!(comment.self_url.ends_with("/comment/20001"));
    }

    #[tokio::test]
    async fn rejects_keys_that_would_escape_the_issue_path() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        for key in ["", "../myself", "EPIC-1?expand=x", "EPIC 1"] {
            let err = client.get_issue(key).await.unwrap_err();
            assert!(matches!(err, JiraClientError::InvalidKey(_)), "key {key:?}");
        }
    }

    // ── Config tests ─────────────────────────────────────────────

    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn from_env_fails_without_credentials() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("JIRA_USERNAME");
        std::env::remove_var("JIRA_PASSWORD");
        let err = JiraClientConfig::from_env().unwrap_err();
        assert!(err.to_string().contains("JIRA_USERNAME"), "got: {err}");
    }

    #[test]
    fn from_env_uses_default_base_url() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_TIMEOUT_SECS");
        std::env::set_var("JIRA_USERNAME", "bot");
        std::env::set_var("JIRA_PASSWORD", "secret");

        let cfg = JiraClientConfig::from_env().unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.username, "bot");
        assert_eq!(cfg.password, "secret");
        assert!(cfg.timeout_secs.is_none());

        std::env::remove_var("JIRA_USERNAME");
        std::env::remove_var("JIRA_PASSWORD");
    }

    #[test]
    fn from_env_trims_trailing_slash_and_reads_timeout() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("JIRA_BASE_URL", "https://jira.example.com/");
        std::env::set_var("JIRA_USERNAME", "bot");
        std::env::set_var("JIRA_PASSWORD", "secret");
        std::env::set_var("JIRA_TIMEOUT_SECS", "15");

        let cfg = JiraClientConfig::from_env().unwrap();
        assert_eq!(cfg.base_url, "https://jira.example.com");
        assert_eq!(cfg.timeout_secs, Some(15));

        std::env::remove_var("JIRA_BASE_URL");
        std::env::remove_var("JIRA_USERNAME");
        std::env::remove_var("JIRA_PASSWORD");
        std::env::remove_var("JIRA_TIMEOUT_SECS");
    }

    #[test]
    fn from_env_rejects_unparsable_timeout() {
        let _g = ENV_LOCK.lock().unwrap();
        std::env::set_var("JIRA_USERNAME", "bot");
        std::env::set_var("JIRA_PASSWORD", "secret");
        std::env::set_var("JIRA_TIMEOUT_SECS", "ten");

        let err = JiraClientConfig::from_env().unwrap_err();
        assert!(matches!(err, StorybotError::Config(_)));
        assert!(err.to_string().contains("JIRA_TIMEOUT_SECS"), "got: {err}");

        std::env::remove_var("JIRA_USERNAME");
        std::env::remove_var("JIRA_PASSWORD");
        std::env::remove_var("JIRA_TIMEOUT_SECS");
    }

    #[test]
    fn debug_output_redacts_password() {
        let cfg = JiraClientConfig {
            base_url: "https://jira.example.com".into(),
            username: "bot".into(),
            password: "hunter2".into(),
            timeout_secs: None,
        };
        let printed = format!("{cfg:?}");
        assert!(!printed.contains("hunter2"), "got: {printed}");
        assert!(printed.contains("bot"));
    }
}

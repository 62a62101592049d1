use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{Map, Value};

use super::client::JiraClientError;
use super::models::{Comment, Issue};

/// Remote issue-tracker operations used by the reconciliation workflow.
///
/// Implementations must be usable from many in-flight requests at once.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Fetch an issue by key, including its scalar custom fields.
    async fn get_issue(&self, key: &str) -> Result<Issue, JiraClientError>;

    /// Apply a partial update to the issue's fields.
    async fn update_issue_fields(
        &self,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<StatusCode, JiraClientError>;

    /// Append a comment to the issue.
    async fn add_comment(&self, key: &str, body: &str) -> Result<Comment, JiraClientError>;
}

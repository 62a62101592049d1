use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::custom_fields::{custom_fields_at, CustomFields, DecodeError};

pub const ISSUE_CREATED: &str = "issue_created";
pub const ISSUE_UPDATED: &str = "issue_updated";

/// Jira sends `null` for unset attributes; treat it like an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// `issue_event_type_name` of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum IssueEventType {
    Created,
    Updated,
    Other(String),
}

impl IssueEventType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => ISSUE_CREATED,
            Self::Updated => ISSUE_UPDATED,
            Self::Other(name) => name,
        }
    }
}

impl From<String> for IssueEventType {
    fn from(name: String) -> Self {
        match name.as_str() {
            ISSUE_CREATED => Self::Created,
            ISSUE_UPDATED => Self::Updated,
            _ => Self::Other(name),
        }
    }
}

impl Default for IssueEventType {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl fmt::Display for IssueEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Jira webhook delivery.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Event {
    #[serde(rename = "webhookEvent", deserialize_with = "null_as_default")]
    pub webhook_event: String,
    #[serde(deserialize_with = "null_as_default")]
    pub issue_event_type_name: IssueEventType,
    /// Milliseconds since the Unix epoch.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub issue: Issue,
    pub user: Option<User>,
    pub changelog: Option<Changelog>,
}

impl Event {
    /// Decode a webhook body, including the custom fields of the issue.
    pub fn from_slice(payload: &[u8]) -> Result<Self, DecodeError> {
        let root: Value = serde_json::from_slice(payload)?;
        let mut event = Self::deserialize(&root)?;
        event.issue.fields.custom_fields = custom_fields_at(&root, &["issue", "fields"]);
        Ok(event)
    }

    pub fn description(&self) -> &str {
        self.issue.fields.description.as_deref().unwrap_or_default()
    }

    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        if !self.timestamp.is_finite() || self.timestamp <= 0.0 {
            return None;
        }
        DateTime::from_timestamp_millis(self.timestamp as i64)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Issue {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub fields: Fields,
}

impl Issue {
    /// Decode an issue returned by `GET /rest/api/2/issue/{key}`.
    pub fn from_slice(payload: &[u8]) -> Result<Self, DecodeError> {
        let root: Value = serde_json::from_slice(payload)?;
        let mut issue = Self::deserialize(&root)?;
        issue.fields.custom_fields = custom_fields_at(&root, &["fields"]);
        Ok(issue)
    }
}

/// The statically known part of an issue's fields.
///
/// `custom_fields` is never read from the schema; it is filled by the
/// extractor with the scalar `customfield_*` entries of the same object.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Fields {
    pub description: Option<String>,
    #[serde(rename = "issuetype", alias = "issueType")]
    pub issue_type: Option<IssueType>,
    pub priority: Option<Priority>,
    pub reporter: Option<User>,
    pub creator: Option<User>,
    pub created: Option<String>,
    pub duedate: Option<String>,
    /// Seconds.
    pub timespent: Option<i64>,
    /// Seconds.
    pub timeestimate: Option<i64>,
    #[serde(rename = "fixVersions", deserialize_with = "null_as_default")]
    pub fix_versions: Vec<FixVersion>,
    #[serde(rename = "aggregateprogress")]
    pub aggregate_progress: Option<AggregateProgress>,
    pub watches: Option<Watches>,
    pub worklog: Option<Worklog>,
    #[serde(skip)]
    pub custom_fields: CustomFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub active: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub avatar_urls: HashMap<String, String>,
    pub display_name: Option<String>,
    pub email_address: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Priority {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icon_url: String,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IssueType {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub icon_url: String,
    pub avatar_id: Option<i64>,
    #[serde(deserialize_with = "null_as_default")]
    pub subtask: bool,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixVersion {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub archived: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub released: bool,
    pub release_date: Option<String>,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Watches {
    #[serde(deserialize_with = "null_as_default")]
    pub watch_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub is_watching: bool,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Worklog {
    #[serde(deserialize_with = "null_as_default")]
    pub start_at: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_results: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub worklogs: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AggregateProgress {
    #[serde(deserialize_with = "null_as_default")]
    pub progress: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Changelog {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<ChangeItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeItem {
    #[serde(deserialize_with = "null_as_default")]
    pub field: String,
    #[serde(rename = "fieldtype", alias = "fieldType", deserialize_with = "null_as_default")]
    pub field_type: String,
    pub from: Option<String>,
    pub from_string: Option<String>,
    pub to: Option<String>,
    pub to_string: Option<String>,
}

/// A comment as returned by `POST /rest/api/2/issue/{key}/comment`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Comment {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(rename = "self", deserialize_with = "null_as_default")]
    pub self_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: String,
}

use reqwest::StatusCode;
use serde_json::{Map, Value};

use super::ReconcileSettings;
use crate::jira::client::JiraClientError;
use crate::jira::custom_fields::FieldError;
use crate::jira::models::Event;
use crate::jira::tracker::Tracker;

/// Inputs read from a triggering event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationRequest {
    pub issue_key: String,
    pub story_points: f64,
    pub epic_key: String,
}

impl ReconciliationRequest {
    pub fn from_event(event: &Event, settings: &ReconcileSettings) -> Result<Self, FieldError> {
        let custom = &event.issue.fields.custom_fields;
        Ok(Self {
            issue_key: event.issue.key.clone(),
            story_points: custom.number(&settings.story_points_field)?,
            epic_key: custom.text(&settings.epic_link_field)?.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationOutcome {
    pub issue_key: String,
    pub epic_key: String,
    pub subtracted: f64,
    pub remaining: f64,
    pub update_status: StatusCode,
    pub comment_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("invalid reconciliation input: {0}")]
    Input(#[from] FieldError),

    #[error("failed to fetch epic {epic_key}: {source}")]
    FetchEpic {
        epic_key: String,
        source: JiraClientError,
    },

    #[error("epic {epic_key} has no usable story points: {source}")]
    MalformedEpic { epic_key: String, source: FieldError },

    #[error("failed to update epic {epic_key}: {source}")]
    UpdateEpic {
        epic_key: String,
        source: JiraClientError,
    },

    #[error("failed to comment on {issue_key}: {source}")]
    Comment {
        issue_key: String,
        source: JiraClientError,
    },
}

/// Points left on the epic. Negative totals are passed through unchanged.
pub fn remaining_points(epic_points: f64, story_points: f64) -> f64 {
    epic_points - story_points
}

/// Confirmation posted on the new issue; point values are truncated toward zero.
pub fn comment_body(story_points: f64, epic_key: &str, remaining: f64) -> String {
    format!(
        "subtracted {} story points from epic {}. the epic has {} story points left.",
        story_points as i64, epic_key, remaining as i64
    )
}

/// Subtracts a new issue's story points from its epic.
///
/// Runs fetch, update and comment strictly in order and stops at the first
/// failure. A failed comment does not undo the epic update.
pub struct Reconciler<'a, T: ?Sized> {
    tracker: &'a T,
    settings: &'a ReconcileSettings,
}

impl<'a, T> Reconciler<'a, T>
where
    T: Tracker + ?Sized,
{
    pub fn new(tracker: &'a T, settings: &'a ReconcileSettings) -> Self {
        Self { tracker, settings }
    }

    pub async fn run(&self, event: &Event) -> Result<ReconciliationOutcome, ReconcileError> {
        let request = ReconciliationRequest::from_event(event, self.settings)?;
        self.apply(&request).await
    }

    pub async fn apply(
        &self,
        request: &ReconciliationRequest,
    ) -> Result<ReconciliationOutcome, ReconcileError> {
        let points_field = &self.settings.story_points_field;

        let epic = self
            .tracker
            .get_issue(&request.epic_key)
            .await
            .map_err(|source| ReconcileError::FetchEpic {
                epic_key: request.epic_key.clone(),
                source,
            })?;
        let epic_points = epic
            .fields
            .custom_fields
            .number(points_field)
            .map_err(|source| ReconcileError::MalformedEpic {
                epic_key: request.epic_key.clone(),
                source,
            })?;

        tracing::info!(id = %epic.id, key = %epic.key, points = epic_points, "epic found");

        let remaining = remaining_points(epic_points, request.story_points);

        let mut fields = Map::new();
        fields.insert(points_field.clone(), Value::from(remaining));

        let update_status = self
            .tracker
            .update_issue_fields(&request.epic_key, fields)
            .await
            .map_err(|source| ReconcileError::UpdateEpic {
                epic_key: request.epic_key.clone(),
                source,
            })?;

        tracing::info!(status_code = update_status.as_u16(), remaining, "epic updated");

        let body = comment_body(request.story_points, &request.epic_key, remaining);
        let comment = self
            .tracker
            .add_comment(&request.issue_key, &body)
            .await
            .map_err(|source| ReconcileError::Comment {
                issue_key: request.issue_key.clone(),
                source,
            })?;

        tracing::info!(id = %comment.id, self_url = %comment.self_url, "comment added");

        Ok(ReconciliationOutcome {
            issue_key: request.issue_key.clone(),
            epic_key: request.epic_key.clone(),
            subtracted: request.story_points,
            remaining,
            update_status,
            comment_id: comment.id,
        })
    }
}

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use storybot_common::error::StorybotError;

use crate::error::ApiError;
use crate::jira::models::Event;
use crate::reconcile::trigger::should_reconcile;
use crate::reconcile::workflow::Reconciler;
use crate::AppState;

/// Receive a Jira webhook delivery.
///
/// Only an undecodable body is reported to the caller. Whether the event was
/// ignored, reconciled or failed half way is visible in the logs and on the
/// tracker itself.
pub async fn receive_event(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let event = Event::from_slice(&body).map_err(|e| {
        tracing::warn!(error = %e, "rejecting undecodable webhook payload");
        StorybotError::Decode(e.to_string())
    })?;

    tracing::info!(
        event = %event.issue_event_type_name,
        webhook_event = %event.webhook_event,
        key = %event.issue.key,
        occurred_at = ?event.occurred_at(),
        description = %event.description(),
        custom_fields = event.issue.fields.custom_fields.len(),
        "webhook event received"
    );

    if let Some(changelog) = &event.changelog {
        for item in &changelog.items {
            tracing::debug!(
                changelog_id = %changelog.id,
                field = %item.field,
                from = ?item.from_string,
                to = ?item.to_string,
                "changelog item"
            );
        }
    }

    if !should_reconcile(&event, &state.settings.trigger_phrase) {
        return Ok(accepted());
    }

    let reconciler = Reconciler::new(state.tracker.as_ref(), &state.settings);
    match reconciler.run(&event).await {
        Ok(outcome) => {
            tracing::info!(
                key = %outcome.issue_key,
                epic = %outcome.epic_key,
                subtracted = outcome.subtracted,
                remaining = outcome.remaining,
                "story points reconciled"
            );
        }
        Err(e) => {
            tracing::error!(key = %event.issue.key, error = %e, "reconciliation failed");
        }
    }

    Ok(accepted())
}

fn accepted() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "accepted" }))
}

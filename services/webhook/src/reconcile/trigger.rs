use crate::jira::models::{Event, IssueEventType};

/// Whether an event asks the bot to reconcile story points.
///
/// Only issue-created events qualify, and the description must contain the
/// trigger phrase verbatim (case-sensitive substring).
pub fn should_reconcile(event: &Event, trigger_phrase: &str) -> bool {
    if event.issue_event_type_name != IssueEventType::Created {
        return false;
    }
    let description = event.description();
    !description.is_empty() && !trigger_phrase.is_empty() && description.contains(trigger_phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHRASE: &str = "@bot subtract";

    fn event(event_type: &str, description: Option<&str>) -> Event {
        let payload = serde_json::json!({
            "issue_event_type_name": event_type,
            "issue": { "key": "PROJ-1", "fields": { "description": description } }
        });
        Event::from_slice(&serde_json::to_vec(&payload).unwrap()).unwrap()
    }

    #[test]
    fn fires_on_created_event_with_phrase() {
        assert!(should_reconcile(
            &event("issue_created", Some("hey @bot subtract please")),
            PHRASE
        ));
        assert!(should_reconcile(&event("issue_created", Some(PHRASE)), PHRASE));
    }

    #[test]
    fn ignores_other_event_types() {
        assert!(!should_reconcile(
            &event("issue_updated", Some("@bot subtract")),
            PHRASE
        ));
        assert!(!should_reconcile(
            &event("issue_generic", Some("@bot subtract")),
            PHRASE
        ));
    }

    #[test]
    fn match_is_case_sensitive_and_literal() {
        assert!(!should_reconcile(
            &event("issue_created", Some("@Bot Subtract")),
            PHRASE
        ));
        assert!(!should_reconcile(
            &event("issue_created", Some("@bot  subtract")),
            PHRASE
        ));
        assert!(should_reconcile(
            &event("issue_created", Some("x@bot subtracting")),
            PHRASE
        ));
    }

    #[test]
    fn missing_or_empty_description_never_fires() {
        assert!(!should_reconcile(&event("issue_created", None), PHRASE));
        assert!(!should_reconcile(&event("issue_created", Some("")), PHRASE));
        assert!(!should_reconcile(&event("issue_created", Some("")), ""));
    }
}

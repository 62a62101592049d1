pub mod trigger;
pub mod workflow;

use storybot_config::env::get_var_or;

pub const DEFAULT_STORY_POINTS_FIELD: &str = "customfield_10021";
pub const DEFAULT_EPIC_LINK_FIELD: &str = "customfield_10025";
pub const DEFAULT_TRIGGER_PHRASE: &str = "@bot subtract";

/// Tenant-specific ids and the command marker the bot reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    pub story_points_field: String,
    pub epic_link_field: String,
    pub trigger_phrase: String,
}

impl ReconcileSettings {
    pub fn from_env() -> Self {
        Self {
            story_points_field: get_var_or("STORY_POINTS_FIELD", DEFAULT_STORY_POINTS_FIELD),
            epic_link_field: get_var_or("EPIC_LINK_FIELD", DEFAULT_EPIC_LINK_FIELD),
            trigger_phrase: get_var_or("TRIGGER_PHRASE", DEFAULT_TRIGGER_PHRASE),
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self {
            story_points_field: DEFAULT_STORY_POINTS_FIELD.to_string(),
            epic_link_field: DEFAULT_EPIC_LINK_FIELD.to_string(),
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
        }
    }
}

pub mod client;
pub mod custom_fields;
pub mod models;
pub mod tracker;

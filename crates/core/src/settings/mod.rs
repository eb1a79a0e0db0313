//! Settings module - week boundary configuration.

mod settings_model;

pub use settings_model::{WeekSettings, WeekStart};

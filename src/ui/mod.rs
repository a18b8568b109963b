pub mod calendar;
pub mod components;
pub mod dashboard;
pub mod project_wizard;
pub mod projects;
pub mod sign_in;
pub mod time_entry_wizard;

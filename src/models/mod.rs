mod project;
mod session;
mod time_entry;

pub use project::{Project, ProjectInput, ProjectSummary};
pub use session::{Session, User};
pub use time_entry::{TimeEntryInput, TimeEntryWithProject};
#[cfg(test)]
pub use time_entry::TimeEntry;

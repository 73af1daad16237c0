pub mod categories;
pub mod collision;
pub mod file_organizer;

pub use categories::{CategoryTable, OTHERS};
pub use collision::unique_target;
pub use file_organizer::{FileOrganizer, FileOutcome, OrganizeReport, SkipReason, UndoReport};

pub mod bounds;
pub mod history_entry;
pub mod library;
pub mod rewatch_policy;
pub mod user;
pub mod watch_record;

pub use bounds::DateBound;
pub use history_entry::HistoryEntry;
pub use library::LibraryMovie;
pub use rewatch_policy::RewatchPolicy;
pub use user::SourceUser;
pub use watch_record::WatchRecord;

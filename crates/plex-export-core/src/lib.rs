pub mod cache;
pub mod checkpoint;
pub mod rating;
pub mod rewatch;
pub mod slice;
pub mod tags;
pub mod transform;
pub mod writer;

pub use cache::read_cached_records;
pub use checkpoint::{export_file_name, latest_export, resolve_checkpoint, scope_name};
pub use rating::normalize_rating;
pub use rewatch::resolve_rewatches;
pub use slice::slice_by_date;
pub use tags::compose_tags;
pub use transform::transform_history;
pub use writer::{write_csv, ExportOptions, ExportSummary};

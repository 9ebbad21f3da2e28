pub mod csv_export;
pub mod lifecycle;
pub mod record_source;
pub mod result_sink;

pub use lifecycle::{ArtifactClass, LifecycleManager, RetentionPolicy};
pub use record_source::RecordSource;
pub use result_sink::ResultSink;

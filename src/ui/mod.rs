pub mod output;
pub mod progress;
pub mod signals;

pub use output::{format_bytes, format_duration, OutputFormatter, OutputMode};
pub use progress::{update_copy_progress, update_organize_progress, ProgressManager};
pub use signals::{GracefulShutdown, ShutdownToken};

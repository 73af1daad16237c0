pub mod copy;
pub mod manager;

pub use copy::{needs_copy, CopyStats, TreeCopier};
pub use manager::{backup_name, BackupManager, BackupReport, BACKUP_PREFIX};

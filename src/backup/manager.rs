use crate::backup::copy::{CopyStats, TreeCopier};
use crate::error::{Result, ToolError};
use crate::ui::ShutdownToken;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

pub const BACKUP_PREFIX: &str = "backup_";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    pub name: String,
    pub path: PathBuf,
    pub incremental: bool,
    pub created_at: DateTime<Local>,
    pub stats: CopyStats,
}

pub struct BackupManager {
    source: PathBuf,
    destination: PathBuf,
    clock: fn() -> DateTime<Local>,
    shutdown: Option<ShutdownToken>,
}

impl BackupManager {
    /// The source must exist; the destination root is created when missing
    /// and may not sit inside a source directory.
    pub fn new<S: AsRef<Path>, D: AsRef<Path>>(source: S, destination: D) -> Result<Self> {
        let source = source.as_ref();
        let destination = destination.as_ref();

        if !source.exists() {
            return Err(ToolError::SourceNotFound {
                path: source.display().to_string(),
            });
        }

        fs::create_dir_all(destination)?;

        if source.is_dir() && resolve(destination)?.starts_with(resolve(source)?) {
            return Err(ToolError::InvalidPath {
                path: format!(
                    "Backup destination {} is inside the source {}",
                    destination.display(),
                    source.display()
                ),
            });
        }

        Ok(Self {
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
            clock: Local::now,
            shutdown: None,
        })
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn create_backup(&self, incremental: bool) -> Result<PathBuf> {
        self.create_backup_with_progress(incremental, None)
            .map(|report| report.path)
    }

    pub fn create_backup_with_progress(
        &self,
        incremental: bool,
        progress_callback: Option<&dyn Fn(&CopyStats)>,
    ) -> Result<BackupReport> {
        let created_at = (self.clock)();
        let name = backup_name(&created_at);
        let backup_path = self.destination.join(&name);

        log::info!("Creating backup: {}", name);

        let copier = TreeCopier::new()
            .with_incremental(incremental)
            .with_shutdown(self.shutdown.clone());

        let stats = if self.source.is_file() {
            let bytes_copied = copier.copy_file(&self.source, &backup_path)?;
            CopyStats {
                files_copied: 1,
                files_skipped: 0,
                bytes_copied,
            }
        } else {
            copier.copy_tree(&self.source, &backup_path, progress_callback)?
        };

        log::info!(
            "Backup completed: {} ({} copied, {} up to date)",
            backup_path.display(),
            stats.files_copied,
            stats.files_skipped
        );

        Ok(BackupReport {
            name,
            path: backup_path,
            incremental,
            created_at,
            stats,
        })
    }

    /// Names of backup folders, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>> {
        let mut backups = Vec::new();

        for entry in fs::read_dir(&self.destination)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(BACKUP_PREFIX) {
                backups.push(name);
            }
        }

        backups.sort_unstable_by(|a, b| b.cmp(a));
        Ok(backups)
    }

    /// Replace `target` (the original source by default) with a backup.
    pub fn restore_backup(&self, backup_name: &str, target: Option<&Path>) -> Result<PathBuf> {
        let backup_path = self.resolve_backup(backup_name)?;
        let target_path = target.unwrap_or(self.source.as_path()).to_path_buf();

        log::info!("Restoring backup {} to {}", backup_name, target_path.display());

        let copier = TreeCopier::new().with_shutdown(self.shutdown.clone());

        if backup_path.is_file() {
            let file_target = if target_path.is_dir() {
                target_path.join(backup_name)
            } else {
                target_path
            };
            if resolve(&file_target)? == resolve(&backup_path)? {
                return Err(overlap_error(&file_target, &backup_path));
            }
            copier.copy_file(&backup_path, &file_target)?;
            log::info!("Restore completed");
            return Ok(file_target);
        }

        // Nothing is deleted while the target and the backup overlap.
        let (backup_real, target_real) = (resolve(&backup_path)?, resolve(&target_path)?);
        if backup_real.starts_with(&target_real) || target_real.starts_with(&backup_real) {
            return Err(overlap_error(&target_path, &backup_path));
        }

        if target_path.is_dir() {
            fs::remove_dir_all(&target_path)?;
        } else if target_path.symlink_metadata().is_ok() {
            fs::remove_file(&target_path)?;
        }

        copier.copy_tree(&backup_path, &target_path, None)?;
        log::info!("Restore completed");

        Ok(target_path)
    }

    fn resolve_backup(&self, backup_name: &str) -> Result<PathBuf> {
        if !is_plain_name(backup_name) {
            return Err(ToolError::InvalidPath {
                path: format!("Backup name must not contain path components: {}", backup_name),
            });
        }

        let backup_path = self.destination.join(backup_name);
        if !backup_path.exists() {
            return Err(ToolError::BackupNotFound {
                name: backup_name.to_string(),
            });
        }

        Ok(backup_path)
    }
}

pub fn backup_name(timestamp: &DateTime<Local>) -> String {
    format!("{}{}", BACKUP_PREFIX, timestamp.format(TIMESTAMP_FORMAT))
}

fn overlap_error(target: &Path, backup: &Path) -> ToolError {
    ToolError::InvalidPath {
        path: format!(
            "Restore target {} overlaps backup {}",
            target.display(),
            backup.display()
        ),
    }
}

// Canonical form of a path whose last component may not exist yet.
fn resolve(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(fs::canonicalize(path)?);
    }
    let absolute = std::path::absolute(path)?;
    match (absolute.parent(), absolute.file_name()) {
        (Some(parent), Some(name)) => Ok(resolve(parent)?.join(name)),
        _ => Ok(absolute),
    }
}

// A lone normal component cannot escape the destination root.
fn is_plain_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

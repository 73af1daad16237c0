use crate::error::{Result, ToolError};
use crate::ui::ShutdownToken;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CopyStats {
    pub files_copied: usize,
    /// Files left alone because the destination copy was up to date
    pub files_skipped: usize,
    pub bytes_copied: u64,
}

impl CopyStats {
    pub fn files_seen(&self) -> usize {
        self.files_copied + self.files_skipped
    }
}

/// Recursive copier used for creating and restoring backups.
pub struct TreeCopier {
    incremental: bool,
    buffer_size: usize,
    shutdown: Option<ShutdownToken>,
}

impl TreeCopier {
    pub fn new() -> Self {
        Self {
            incremental: false,
            buffer_size: 64 * 1024,
            shutdown: None,
        }
    }

    /// Only copy files that are missing or older at the destination.
    pub fn with_incremental(mut self, incremental: bool) -> Self {
        self.incremental = incremental;
        self
    }

    pub fn with_shutdown(mut self, shutdown: Option<ShutdownToken>) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Count regular files under `source`, used to size progress bars.
    pub fn count_files(source: &Path) -> usize {
        WalkDir::new(source)
            .follow_links(true)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .count()
    }

    /// Copy the tree at `source` into `dest`.
    ///
    /// A full copy refuses to write into an existing `dest`; an incremental
    /// copy reuses it and skips files whose destination mtime is not older.
    pub fn copy_tree(
        &self,
        source: &Path,
        dest: &Path,
        progress_callback: Option<&dyn Fn(&CopyStats)>,
    ) -> Result<CopyStats> {
        if !self.incremental && dest.exists() {
            return Err(ToolError::BackupExists {
                path: dest.display().to_string(),
            });
        }

        fs::create_dir_all(dest)?;

        let mut stats = CopyStats::default();
        let mut directories: Vec<(PathBuf, PathBuf)> = Vec::new();

        for entry in WalkDir::new(source).follow_links(true).min_depth(1) {
            let entry = entry?;
            self.check_shutdown()?;

            let relative_path = entry
                .path()
                .strip_prefix(source)
                .map_err(|_| ToolError::InvalidPath {
                    path: entry.path().display().to_string(),
                })?;
            let target = dest.join(relative_path);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&target)?;
                directories.push((entry.path().to_path_buf(), target));
                continue;
            }

            if !entry.file_type().is_file() {
                log::debug!("Skipping special file: {}", entry.path().display());
                continue;
            }

            if self.incremental && !needs_copy(entry.path(), &target)? {
                stats.files_skipped += 1;
            } else {
                stats.bytes_copied += self.copy_file(entry.path(), &target)?;
                stats.files_copied += 1;
                log::debug!("  Backed up: {}", relative_path.display());
            }

            if let Some(callback) = progress_callback {
                callback(&stats);
            }
        }

        // children are written, so directory metadata can be applied now
        for (source_dir, target_dir) in directories.iter().rev() {
            copy_metadata(source_dir, target_dir)?;
        }
        if !self.incremental {
            copy_metadata(source, dest)?;
        }

        Ok(stats)
    }

    /// Copy one file, creating parent directories and keeping its
    /// modification time and permissions.
    pub fn copy_file(&self, source: &Path, dest: &Path) -> Result<u64> {
        if !source.is_file() {
            return Err(ToolError::InvalidPath {
                path: format!("Source is not a file: {}", source.display()),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        let bytes = self.copy_file_with_buffer(source, dest)?;
        copy_metadata(source, dest)?;

        Ok(bytes)
    }

    fn copy_file_with_buffer(&self, source: &Path, dest: &Path) -> Result<u64> {
        let source_file = fs::File::open(source)?;

        // read-only copies from an earlier run cannot be truncated in place
        if dest.is_file() {
            let mut permissions = fs::metadata(dest)?.permissions();
            if permissions.readonly() {
                #[allow(clippy::permissions_set_readonly_false)]
                permissions.set_readonly(false);
                fs::set_permissions(dest, permissions)?;
            }
        }
        let dest_file = fs::File::create(dest)?;

        let mut reader = BufReader::with_capacity(self.buffer_size, source_file);
        let mut writer = BufWriter::with_capacity(self.buffer_size, dest_file);

        let mut total_bytes = 0u64;
        let mut buffer = vec![0u8; 8192];

        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            writer.write_all(&buffer[..bytes_read])?;
            total_bytes += bytes_read as u64;
        }

        writer.flush()?;

        Ok(total_bytes)
    }

    fn check_shutdown(&self) -> Result<()> {
        match self.shutdown {
            Some(ref token) => token.check(),
            None => Ok(()),
        }
    }
}

impl Default for TreeCopier {
    fn default() -> Self {
        Self::new()
    }
}

/// True when `dest` is missing or `source` was modified strictly later.
pub fn needs_copy(source: &Path, dest: &Path) -> Result<bool> {
    let dest_modified = match fs::metadata(dest) {
        Ok(metadata) => metadata.modified()?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(e.into()),
    };

    let source_modified = fs::metadata(source)?.modified()?;
    Ok(source_modified > dest_modified)
}

fn copy_metadata(source: &Path, dest: &Path) -> Result<()> {
    let metadata = fs::metadata(source)?;
    let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

    filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified))?;
    fs::set_permissions(dest, metadata.permissions())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use filetime::FileTime;
    use tempfile::TempDir;

    fn set_mtime(path: &Path, seconds: i64) {
        filetime::set_file_mtime(path, FileTime::from_unix_time(seconds, 0)).unwrap();
    }

    fn mtime(path: &Path) -> SystemTime {
        fs::metadata(path).unwrap().modified().unwrap()
    }

    #[test]
    fn test_copy_file_preserves_mtime_and_creates_parents() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("a.txt");
        fs::write(&source, "hello").unwrap();
        set_mtime(&source, 1_600_000_000);

        let dest = dir.path().join("out/nested/a.txt");
        let bytes = TreeCopier::new().copy_file(&source, &dest).unwrap();

        assert_eq!(bytes, 5);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "hello");
        assert_eq!(mtime(&dest), mtime(&source));
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let source = dir.path().join("run.sh");
        fs::write(&source, "#!/bin/sh").unwrap();
        fs::set_permissions(&source, fs::Permissions::from_mode(0o750)).unwrap();

        let dest = dir.path().join("copy.sh");
        TreeCopier::new().copy_file(&source, &dest).unwrap();

        let mode = fs::metadata(&dest).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn test_needs_copy() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("src.txt");
        let dest = dir.path().join("dst.txt");
        fs::write(&source, "x").unwrap();

        assert!(needs_copy(&source, &dest).unwrap());

        fs::write(&dest, "x").unwrap();
        set_mtime(&source, 1_000);
        set_mtime(&dest, 1_000);
        assert!(!needs_copy(&source, &dest).unwrap());

        set_mtime(&dest, 2_000);
        assert!(!needs_copy(&source, &dest).unwrap());

        set_mtime(&source, 3_000);
        assert!(needs_copy(&source, &dest).unwrap());
    }

    #[test]
    fn test_full_copy_refuses_existing_destination() {
        let source = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        fs::write(source.path().join("a.txt"), "a").unwrap();

        let result = TreeCopier::new().copy_tree(source.path(), dest.path(), None);
        assert!(matches!(result, Err(ToolError::BackupExists { .. })));
    }

    #[test]
    fn test_tree_copy_keeps_structure() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(source.path().join("docs/deep")).unwrap();
        fs::write(source.path().join("top.txt"), "top").unwrap();
        fs::write(source.path().join("docs/deep/leaf.md"), "leaf").unwrap();
        fs::create_dir(source.path().join("empty")).unwrap();

        let dest = out.path().join("copy");
        let stats = TreeCopier::new().copy_tree(source.path(), &dest, None).unwrap();

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.bytes_copied, 7);
        assert!(dest.join("docs/deep/leaf.md").exists());
        assert!(dest.join("empty").is_dir());
    }

    #[test]
    fn test_incremental_copy_skips_up_to_date_files() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(source.path().join("a.txt"), "a").unwrap();
        fs::write(source.path().join("b.txt"), "b").unwrap();
        set_mtime(&source.path().join("a.txt"), 1_000);
        set_mtime(&source.path().join("b.txt"), 1_000);

        let dest = out.path().join("copy");
        let copier = TreeCopier::new().with_incremental(true);

        let first = copier.copy_tree(source.path(), &dest, None).unwrap();
        assert_eq!(first.files_copied, 2);

        let second = copier.copy_tree(source.path(), &dest, None).unwrap();
        assert_eq!(second.files_copied, 0);
        assert_eq!(second.files_skipped, 2);

        fs::write(source.path().join("b.txt"), "bb").unwrap();
        set_mtime(&source.path().join("b.txt"), 5_000);

        let third = copier.copy_tree(source.path(), &dest, None).unwrap();
        assert_eq!(third.files_copied, 1);
        assert_eq!(fs::read_to_string(dest.join("b.txt")).unwrap(), "bb");
    }

    #[test]
    fn test_cancelled_copy() {
        let source = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(source.path().join("a.txt"), "a").unwrap();

        let token = ShutdownToken::new();
        token.cancel();

        let result = TreeCopier::new()
            .with_shutdown(Some(token))
            .copy_tree(source.path(), &out.path().join("copy"), None);
        assert!(matches!(result, Err(ToolError::Cancelled)));
    }
}

use std::path::{Path, PathBuf};

/// First free path for `file_name` inside `dir`.
///
/// Returns `dir/file_name` when it is unused, otherwise the first of
/// `dir/{stem}{infix}{n}{ext}` for n = 1, 2, ... that does not exist.
pub fn unique_target(dir: &Path, file_name: &Path, infix: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !exists(&candidate) {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter: u64 = 1;
    loop {
        let candidate = dir.join(format!("{}{}{}{}", stem, infix, counter, extension));
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

// Dangling symlinks still occupy the name.
fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_free_name_is_kept() {
        let dir = TempDir::new().unwrap();
        let target = unique_target(dir.path(), Path::new("report.pdf"), "_");
        assert_eq!(target, dir.path().join("report.pdf"));
    }

    #[test]
    fn test_lowest_free_suffix_wins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.txt"), "").unwrap();
        fs::write(dir.path().join("x_1.txt"), "").unwrap();
        fs::write(dir.path().join("x_2.txt"), "").unwrap();

        let target = unique_target(dir.path(), Path::new("x.txt"), "_");
        assert_eq!(target, dir.path().join("x_3.txt"));
    }

    #[test]
    fn test_gap_is_filled_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.txt"), "").unwrap();
        fs::write(dir.path().join("x_2.txt"), "").unwrap();

        let target = unique_target(dir.path(), Path::new("x.txt"), "_");
        assert_eq!(target, dir.path().join("x_1.txt"));
    }

    #[test]
    fn test_restored_infix() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("song.mp3"), "").unwrap();

        let target = unique_target(dir.path(), Path::new("song.mp3"), "_restored_");
        assert_eq!(target, dir.path().join("song_restored_1.mp3"));
    }

    #[test]
    fn test_multi_dot_names_keep_last_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.tar.gz"), "").unwrap();

        let target = unique_target(dir.path(), Path::new("data.tar.gz"), "_");
        assert_eq!(target, dir.path().join("data.tar_1.gz"));
    }
}

use crate::error::{Result, ToolError};
use crate::organizer::categories::{CategoryTable, OTHERS};
use crate::organizer::collision::unique_target;
use crate::ui::ShutdownToken;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// What happened to one directory entry during a run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Moved {
        file: String,
        category: String,
        target: PathBuf,
    },
    Planned {
        file: String,
        category: String,
        target: PathBuf,
    },
    Skipped {
        file: String,
        reason: SkipReason,
    },
    Failed {
        file: String,
        error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Hidden,
    NoExtension,
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            FileOutcome::Moved { file, .. }
            | FileOutcome::Planned { file, .. }
            | FileOutcome::Skipped { file, .. }
            | FileOutcome::Failed { file, .. } => file,
        }
    }

    fn category(&self) -> Option<&str> {
        match self {
            FileOutcome::Moved { category, .. } | FileOutcome::Planned { category, .. } => {
                Some(category)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeReport {
    pub directory: PathBuf,
    pub dry_run: bool,
    /// Files classified per category; includes dry-run and failed moves.
    pub categories: BTreeMap<String, usize>,
    pub outcomes: Vec<FileOutcome>,
}

impl OrganizeReport {
    fn new(directory: PathBuf, dry_run: bool) -> Self {
        Self {
            directory,
            dry_run,
            categories: BTreeMap::new(),
            outcomes: Vec::new(),
        }
    }

    fn record(&mut self, category: Option<&str>, outcome: FileOutcome) {
        if let Some(category) = category.or_else(|| outcome.category()) {
            *self.categories.entry(category.to_string()).or_insert(0) += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn total_classified(&self) -> usize {
        self.categories.values().sum()
    }

    pub fn moved(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Moved { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Skipped { .. }))
    }

    pub fn errors(&self) -> usize {
        self.count(|o| matches!(o, FileOutcome::Failed { .. }))
    }

    fn count<F: Fn(&FileOutcome) -> bool>(&self, predicate: F) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UndoReport {
    pub restored: usize,
    pub removed_folders: Vec<String>,
    pub errors: Vec<String>,
}

impl UndoReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct FileOrganizer {
    directory: PathBuf,
    create_folders: bool,
    categories: CategoryTable,
    shutdown: Option<ShutdownToken>,
}

impl FileOrganizer {
    pub fn new<P: AsRef<Path>>(directory: P, create_folders: bool) -> Result<Self> {
        let path = directory.as_ref();

        if !path.exists() {
            return Err(ToolError::SourceNotFound {
                path: path.display().to_string(),
            });
        }

        if !path.is_dir() {
            return Err(ToolError::NotADirectory {
                path: path.display().to_string(),
            });
        }

        Ok(Self {
            directory: path.canonicalize()?,
            create_folders,
            categories: CategoryTable::default(),
            shutdown: None,
        })
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_shutdown(mut self, shutdown: ShutdownToken) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn get_file_category(&self, path: &Path) -> Option<&str> {
        self.categories.categorize(path)
    }

    pub fn organize(&self, dry_run: bool) -> Result<OrganizeReport> {
        self.organize_with_progress(dry_run, None)
    }

    /// Sort the immediate children of the directory into category folders.
    pub fn organize_with_progress(
        &self,
        dry_run: bool,
        progress_callback: Option<&dyn Fn(usize, &FileOutcome)>,
    ) -> Result<OrganizeReport> {
        log::info!("Starting file organization in: {}", self.directory.display());
        log::info!("Dry run mode: {}", dry_run);

        let mut report = OrganizeReport::new(self.directory.clone(), dry_run);
        let files = self.list_files()?;

        if files.is_empty() {
            log::warn!("No files found to organize");
            return Ok(report);
        }

        log::info!("Found {} files to process", files.len());

        for (index, file_path) in files.iter().enumerate() {
            self.check_shutdown()?;

            let (category, outcome) = self.process_file(file_path, dry_run);
            report.record(category, outcome);

            if let (Some(callback), Some(last)) = (progress_callback, report.outcomes.last()) {
                callback(index + 1, last);
            }
        }

        log::info!("Total files processed: {}", report.total_classified());
        if !dry_run {
            log::info!("Successfully moved: {}", report.moved());
        }
        if report.errors() > 0 {
            log::warn!("Errors encountered: {}", report.errors());
        }

        Ok(report)
    }

    fn process_file<'a>(
        &'a self,
        file_path: &Path,
        dry_run: bool,
    ) -> (Option<&'a str>, FileOutcome) {
        let file_name = display_name(file_path);

        if file_name.starts_with('.') {
            log::debug!("Skipping hidden file: {}", file_name);
            let outcome = FileOutcome::Skipped {
                file: file_name,
                reason: SkipReason::Hidden,
            };
            return (None, outcome);
        }

        let Some(category) = self.categories.categorize(file_path) else {
            log::debug!("Skipping file without extension: {}", file_name);
            let outcome = FileOutcome::Skipped {
                file: file_name,
                reason: SkipReason::NoExtension,
            };
            return (None, outcome);
        };

        match self.place_file(file_path, category, dry_run) {
            Ok(outcome) => (None, outcome),
            Err(e) => {
                log::error!("Error processing {}: {}", file_name, e);
                // still classified, just not moved
                let outcome = FileOutcome::Failed {
                    file: file_name,
                    error: e.to_string(),
                };
                (Some(category), outcome)
            }
        }
    }

    fn place_file(&self, file_path: &Path, category: &str, dry_run: bool) -> Result<FileOutcome> {
        let file_name = display_name(file_path);
        let category_folder = self.directory.join(category);

        if !dry_run && self.create_folders {
            fs::create_dir_all(&category_folder)?;
        }

        let target = unique_target(&category_folder, Path::new(&file_name), "_");
        if target.file_name() != file_path.file_name() {
            log::info!("Renamed to avoid conflict: {}", display_name(&target));
        }

        if dry_run {
            log::info!("[DRY RUN] Would move: {} → {}/", file_name, category);
            return Ok(FileOutcome::Planned {
                file: file_name,
                category: category.to_string(),
                target,
            });
        }

        if !category_folder.is_dir() {
            return Err(ToolError::NotADirectory {
                path: category_folder.display().to_string(),
            });
        }

        move_file(file_path, &target)?;
        log::info!("Moved: {} → {}/", file_name, category);

        Ok(FileOutcome::Moved {
            file: file_name,
            category: category.to_string(),
            target,
        })
    }

    /// Move files out of every category folder, `Others` included, back into
    /// the directory.
    pub fn undo(&self) -> Result<UndoReport> {
        log::info!("Starting undo operation...");

        let mut report = UndoReport::default();

        let mut folders: Vec<PathBuf> = fs::read_dir(&self.directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_dir())
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name == OTHERS || self.categories.is_category(name))
            })
            .collect();
        folders.sort();

        for folder in folders {
            self.check_shutdown()?;

            let folder_name = display_name(&folder);
            if let Err(e) = self.restore_folder(&folder, &mut report) {
                log::error!("Error during undo for {}: {}", folder_name, e);
                report.errors.push(format!("{}: {}", folder_name, e));
            }
        }

        log::info!("Undo complete. Restored {} files", report.restored);
        if !report.is_success() {
            log::warn!("Errors encountered: {}", report.errors.len());
        }

        Ok(report)
    }

    fn restore_folder(&self, folder: &Path, report: &mut UndoReport) -> Result<()> {
        let mut files: Vec<PathBuf> = fs::read_dir(folder)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        files.sort();

        for file_path in files.iter().filter(|p| p.is_file()) {
            let file_name = display_name(file_path);
            let target = unique_target(&self.directory, Path::new(&file_name), "_restored_");

            match move_file(file_path, &target) {
                Ok(()) => {
                    log::info!("Restored: {}", file_name);
                    report.restored += 1;
                }
                Err(e) => {
                    log::error!("Failed to restore {}: {}", file_path.display(), e);
                    report.errors.push(format!("{}: {}", file_path.display(), e));
                }
            }
        }

        if fs::read_dir(folder)?.next().is_none() {
            fs::remove_dir(folder)?;
            let name = display_name(folder);
            log::info!("Removed empty folder: {}", name);
            report.removed_folders.push(name);
        }

        Ok(())
    }

    fn list_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.directory)? {
            let path = entry?.path();
            // follows symlinks, so links to files are organized too
            if path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn check_shutdown(&self) -> Result<()> {
        match self.shutdown {
            Some(ref token) => token.check(),
            None => Ok(()),
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn move_file(source: &Path, target: &Path) -> Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    // rename does not cross filesystems
    fs::copy(source, target)?;
    fs::remove_file(source)?;
    Ok(())
}

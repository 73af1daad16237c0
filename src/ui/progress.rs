use crate::backup::CopyStats;
use crate::organizer::FileOutcome;
use crate::ui::output::format_bytes;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_file_progress(&self, total_files: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(total_files));
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>7}/{len:7} files {msg}"
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        );
        pb.set_message("Processing files...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn create_spinner(&self, message: &str) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new_spinner());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} ({elapsed})")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        pb.set_message(message.to_string());
        pb
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub fn update_copy_progress(pb: &ProgressBar, stats: &CopyStats) {
    pb.set_position(stats.files_seen() as u64);
    if stats.files_skipped > 0 {
        pb.set_message(format!(
            "{} copied, {} up to date",
            format_bytes(stats.bytes_copied),
            stats.files_skipped
        ));
    } else {
        pb.set_message(format!("{} copied", format_bytes(stats.bytes_copied)));
    }
}

pub fn update_organize_progress(pb: &ProgressBar, processed: usize, outcome: &FileOutcome) {
    pb.set_position(processed as u64);
    let verb = match outcome {
        FileOutcome::Moved { .. } => "Moved",
        FileOutcome::Planned { .. } => "Planned",
        FileOutcome::Skipped { .. } => "Skipped",
        FileOutcome::Failed { .. } => "Failed",
    };
    pb.set_message(format!("{} {}", verb, outcome.file()));
}

use crate::backup::BackupReport;
use crate::error::{ToolError, UserFriendlyError};
use crate::mailer::BulkReport;
use crate::organizer::{FileOutcome, OrganizeReport, UndoReport};
use crate::scrape::ScrapeResult;
use console::{style, Emoji, Term};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    #[allow(dead_code)]
    term: Term,
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let term = Term::stdout();
        let use_colors = match mode {
            OutputMode::Human => term.features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            term,
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        if self.quiet {
            return;
        }
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(MessageType::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    pub fn warning(&self, message: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Warning, message),
                OutputMode::Json => self.print_json_message("warning", message),
                OutputMode::Plain => println!("WARNING: {}", message),
            }
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(MessageType::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(0) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &ToolError) {
        let user_message = error.user_message();
        self.error(&user_message);

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    eprintln!();
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {}
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    // Backup

    pub fn print_backup_report(&self, report: &BackupReport, elapsed: Duration) {
        match self.mode {
            OutputMode::Json => self.print_json_pretty(report),
            OutputMode::Plain => {
                println!("BACKUP: {}", report.path.display());
                println!("Incremental: {}", report.incremental);
                println!("Files copied: {}", report.stats.files_copied);
                println!("Files skipped: {}", report.stats.files_skipped);
                println!("Bytes copied: {}", report.stats.bytes_copied);
            }
            OutputMode::Human => {
                if self.quiet {
                    return;
                }
                self.print_separator();
                self.success(&format!("Backup created: {}", report.path.display()));
                println!();
                self.print_field("Files copied", &report.stats.files_copied.to_string());
                if report.incremental {
                    self.print_field("Up to date", &report.stats.files_skipped.to_string());
                }
                self.print_field("Size", &format_bytes(report.stats.bytes_copied));
                self.print_field("Time taken", &format_duration(elapsed));
                self.print_separator();
            }
        }
    }

    pub fn print_backup_list(&self, destination: &Path, backups: &[String]) {
        match self.mode {
            OutputMode::Json => self.print_json_pretty(&serde_json::json!({
                "destination": destination,
                "backups": backups,
            })),
            OutputMode::Plain => {
                for name in backups {
                    println!("{}", name);
                }
            }
            OutputMode::Human => {
                if backups.is_empty() {
                    self.warning(&format!("No backups found in {}", destination.display()));
                    return;
                }
                self.print_header(&format!("Available backups in {}", destination.display()));
                for name in backups {
                    if self.use_colors {
                        println!("  {}", style(name).cyan());
                    } else {
                        println!("  {}", name);
                    }
                }
            }
        }
    }

    pub fn print_restore(&self, backup_name: &str, target: &Path) {
        match self.mode {
            OutputMode::Json => self.print_json_object(&serde_json::json!({
                "type": "restore",
                "backup": backup_name,
                "target": target,
            })),
            OutputMode::Plain => println!("RESTORED: {} -> {}", backup_name, target.display()),
            OutputMode::Human => {
                self.success(&format!("Restored {} to {}", backup_name, target.display()))
            }
        }
    }

    // Organizer

    pub fn print_organize_summary(&self, report: &OrganizeReport) {
        match self.mode {
            OutputMode::Json => self.print_json_pretty(report),
            OutputMode::Plain => {
                for (category, count) in &report.categories {
                    println!("{}\t{}", category, count);
                }
                println!("Total: {}", report.total_classified());
                if !report.dry_run {
                    println!("Moved: {}", report.moved());
                }
                println!("Skipped: {}", report.skipped());
                println!("Errors: {}", report.errors());
            }
            OutputMode::Human => {
                if self.quiet {
                    return;
                }
                self.print_separator();
                let title = if report.dry_run {
                    "ORGANIZATION SUMMARY (DRY RUN)"
                } else {
                    "ORGANIZATION SUMMARY"
                };
                if self.use_colors {
                    println!("{}", style(title).bold());
                } else {
                    println!("{}", title);
                }
                self.print_separator();

                for (category, count) in &report.categories {
                    println!("  {:<15} {:>5} files", category, count);
                }
                self.print_separator();
                self.print_field("Total files", &report.total_classified().to_string());
                if !report.dry_run {
                    self.print_field("Moved", &report.moved().to_string());
                }
                if report.skipped() > 0 {
                    self.print_field("Skipped", &report.skipped().to_string());
                }

                let failures: Vec<&FileOutcome> = report
                    .outcomes
                    .iter()
                    .filter(|o| matches!(o, FileOutcome::Failed { .. }))
                    .collect();
                if !failures.is_empty() {
                    self.print_field("Errors", &failures.len().to_string());
                    for failure in failures {
                        if let FileOutcome::Failed { file, error } = failure {
                            println!("    - {}: {}", file, error);
                        }
                    }
                }
            }
        }
    }

    pub fn print_undo_report(&self, report: &UndoReport) {
        match self.mode {
            OutputMode::Json => self.print_json_pretty(report),
            OutputMode::Plain => {
                println!("Restored: {}", report.restored);
                println!("Removed folders: {}", report.removed_folders.len());
                println!("Errors: {}", report.errors.len());
            }
            OutputMode::Human => {
                if report.is_success() {
                    self.success(&format!("Undo complete. Restored {} files", report.restored));
                } else {
                    self.error(&format!(
                        "Undo finished with {} error(s); restored {} files",
                        report.errors.len(),
                        report.restored
                    ));
                    for error in &report.errors {
                        eprintln!("  - {}", error);
                    }
                }
            }
        }
    }

    // Mailer

    pub fn print_mail_report(&self, report: &BulkReport) {
        match self.mode {
            OutputMode::Json => self.print_json_pretty(report),
            OutputMode::Plain => {
                println!("Sent: {}", report.success);
                println!("Failed: {}", report.failed);
            }
            OutputMode::Human => {
                if report.failed == 0 {
                    self.success(&format!("Sent {} email(s)", report.success));
                } else {
                    self.warning(&format!(
                        "Sent {} of {} email(s), {} failed",
                        report.success,
                        report.total(),
                        report.failed
                    ));
                }
            }
        }
    }

    // Scraper

    pub fn print_scrape_summary(&self, url: &str, data: &ScrapeResult, saved_to: Option<&Path>) {
        match self.mode {
            OutputMode::Json => {
                if saved_to.is_none() {
                    self.print_json_pretty(data);
                } else {
                    let counts: std::collections::BTreeMap<_, _> =
                        data.iter().map(|(k, v)| (k.clone(), v.len())).collect();
                    self.print_json_object(&serde_json::json!({
                        "type": "summary",
                        "url": url,
                        "fields": counts,
                        "output": saved_to,
                    }));
                }
            }
            OutputMode::Plain => {
                for (field, values) in data {
                    for value in values {
                        println!("{}\t{}", field, value);
                    }
                }
            }
            OutputMode::Human => {
                if self.quiet {
                    return;
                }
                self.print_header(&format!("Scraped {}", url));
                for (field, values) in data {
                    if self.use_colors {
                        println!("{} ({})", style(field).bold(), values.len());
                    } else {
                        println!("{} ({})", field, values.len());
                    }
                    if saved_to.is_none() {
                        for value in values {
                            println!("  {}", value);
                        }
                    }
                }
                if let Some(path) = saved_to {
                    println!();
                    self.success(&format!("Data saved to {}", path.display()));
                }
            }
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_field(&self, label: &str, value: &str) {
        if self.use_colors {
            println!("  {:<12} {}", format!("{}:", label), style(value).cyan().bold());
        } else {
            println!("  {:<12} {}", format!("{}:", label), value);
        }
    }

    fn print_human_message(&self, msg_type: MessageType, message: &str) {
        #[allow(clippy::type_complexity)]
        let (emoji, color_fn): (Emoji, Box<dyn Fn(&str) -> console::StyledObject<&str>>) =
            match msg_type {
                MessageType::Success => (CHECKMARK, Box::new(|msg| style(msg).green().bold())),
                MessageType::Error => (CROSS, Box::new(|msg| style(msg).red().bold())),
                MessageType::Warning => (WARNING, Box::new(|msg| style(msg).yellow().bold())),
                MessageType::Info => (INFO, Box::new(|msg| style(msg).cyan())),
            };

        if self.use_colors {
            match msg_type {
                MessageType::Error => eprintln!("{}{}", emoji, color_fn(message)),
                _ => println!("{}{}", emoji, color_fn(message)),
            }
        } else {
            let prefix = match msg_type {
                MessageType::Success => "✓",
                MessageType::Error => "✗",
                MessageType::Warning => "!",
                MessageType::Info => "i",
            };

            match msg_type {
                MessageType::Error => eprintln!("{} {}", prefix, message),
                _ => println!("{} {}", prefix, message),
            }
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }

    fn print_json_pretty<T: serde::Serialize + ?Sized>(&self, value: &T) {
        println!(
            "{}",
            serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

#[derive(Debug, Clone, Copy)]
enum MessageType {
    Success,
    Error,
    Warning,
    Info,
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}

pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod mailer;
pub mod organizer;
pub mod scrape;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, Command, OutputFormat};
pub use config::{CliOverrides, Config};
pub use error::{Result, ToolError, UserFriendlyError};

// Core functionality re-exports
pub use backup::{BackupManager, BackupReport, CopyStats};
pub use mailer::{BulkReport, EmailSender, Recipient, SendOutcome, SmtpSettings};
pub use organizer::{CategoryTable, FileOrganizer, OrganizeReport, UndoReport};
pub use scrape::{ScrapeResult, WebScraper};
pub use ui::{GracefulShutdown, OutputFormatter, OutputMode, ProgressManager};

use cli::{BackupArgs, MailArgs, OrganizeArgs, ScrapeArgs};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;
use tokio::task;

/// Fields extracted when no `--select` is given.
const DEFAULT_SELECTORS: &[(&str, &str)] = &[("titles", "h1, h2"), ("paragraphs", "p")];

/// Shared runtime for the subcommands: configuration, output and Ctrl+C
/// handling.
pub struct Toolbelt {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
}

impl Toolbelt {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);
        let shutdown = GracefulShutdown::new()?;

        Ok(Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
        })
    }

    /// Instance without a process-wide signal handler.
    #[cfg(test)]
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self {
            config,
            output_formatter: OutputFormatter::new(output_mode, verbose, quiet),
            progress_manager: ProgressManager::new(false),
            shutdown: GracefulShutdown::new_for_test(),
        }
    }

    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        Self::new(
            config,
            output_mode_for(&cli_args.output_format),
            cli_args.verbose,
            cli_args.quiet,
        )
    }

    /// Create, list or restore backups depending on the flags given.
    pub fn run_backup(&self, args: &BackupArgs) -> Result<()> {
        let destination = self
            .config
            .backup
            .destination
            .clone()
            .ok_or_else(|| ToolError::Config {
                message: "No backup destination given (use --dest or [backup].destination)"
                    .to_string(),
            })?;

        let manager = BackupManager::new(&args.source, &destination)?
            .with_shutdown(self.shutdown.token());

        if args.list {
            let backups = manager.list_backups()?;
            self.output_formatter
                .print_backup_list(manager.destination(), &backups);
            return Ok(());
        }

        if let Some(ref name) = args.restore {
            self.output_formatter
                .start_operation(&format!("Restoring backup {}", name));
            let restored = manager.restore_backup(name, args.target.as_deref())?;
            self.output_formatter.print_restore(name, &restored);
            return Ok(());
        }

        let incremental = args.incremental || self.config.backup.incremental;
        self.output_formatter.start_operation(&format!(
            "Creating {} backup of {}",
            if incremental { "incremental" } else { "full" },
            manager.source().display()
        ));

        let started = Instant::now();
        let total_files = if manager.source().is_dir() {
            backup::TreeCopier::count_files(manager.source())
        } else {
            1
        };

        let progress_bar = self.progress_manager.create_file_progress(total_files as u64);
        let progress_callback = {
            let pb = progress_bar.clone();
            move |stats: &CopyStats| ui::update_copy_progress(&pb, stats)
        };

        let result = manager.create_backup_with_progress(incremental, Some(&progress_callback));
        progress_bar.finish_and_clear();
        let report = result?;

        self.output_formatter
            .print_backup_report(&report, started.elapsed());
        Ok(())
    }

    /// Organize or undo; `Ok(false)` means an undo finished with errors.
    pub fn run_organize(&self, args: &OrganizeArgs) -> Result<bool> {
        let organizer = FileOrganizer::new(&args.path, self.config.organizer.create_folders)?
            .with_categories(CategoryTable::new(&self.config.organizer))
            .with_shutdown(self.shutdown.token());

        if args.undo {
            self.output_formatter.start_operation(&format!(
                "Undoing organization of {}",
                organizer.directory().display()
            ));
            let report = organizer.undo()?;
            self.output_formatter.print_undo_report(&report);
            return Ok(report.is_success());
        }

        self.output_formatter.start_operation(&format!(
            "Organizing {}{}",
            organizer.directory().display(),
            if args.dry_run { " (dry run)" } else { "" }
        ));

        let spinner = self.progress_manager.create_spinner("Scanning files...");
        let progress_callback = {
            let pb = spinner.clone();
            move |processed: usize, outcome: &crate::organizer::FileOutcome| {
                ui::update_organize_progress(&pb, processed, outcome)
            }
        };

        let result = organizer.organize_with_progress(args.dry_run, Some(&progress_callback));
        spinner.finish_and_clear();
        let report = result?;

        self.output_formatter.print_organize_summary(&report);
        if args.dry_run {
            self.output_formatter
                .info("Dry run completed! Run without --dry-run to actually move files.");
        }

        Ok(true)
    }

    /// Send one message or a templated bulk run.
    ///
    /// A failed single send is an error; bulk failures only show up in the
    /// returned counts.
    pub async fn run_mail(&self, args: &MailArgs) -> Result<BulkReport> {
        let settings = SmtpSettings::from(&self.config.mail);
        if settings.username.is_empty() {
            self.output_formatter
                .warning("No SMTP username configured (set EMAIL_USERNAME or --username)");
        }

        let subject = args.subject.clone();
        let report = match (&args.recipients, &args.template) {
            (Some(recipients_path), Some(template_path)) => {
                let recipients = mailer::load_recipients(recipients_path)?;
                let template = std::fs::read_to_string(template_path)?;
                self.output_formatter.start_operation(&format!(
                    "Sending to {} recipient(s) via {}",
                    recipients.len(),
                    settings.host
                ));

                let shutdown = self.shutdown.token();
                task::spawn_blocking(move || {
                    EmailSender::new(settings)
                        .with_shutdown(shutdown)
                        .send_bulk_emails(&recipients, &subject, &template)
                })
                .await
                .map_err(|e| ToolError::Mail {
                    message: format!("Mail task failed: {}", e),
                })?
            }
            _ => {
                let to = args.to.clone();
                let body = args.body.clone().unwrap_or_default();
                let html = args.html;
                self.output_formatter.start_operation(&format!(
                    "Sending to {} via {}",
                    to.join(", "),
                    settings.host
                ));

                let outcome = task::spawn_blocking(move || {
                    EmailSender::new(settings).send_email(&to, &subject, &body, html)
                })
                .await
                .map_err(|e| ToolError::Mail {
                    message: format!("Mail task failed: {}", e),
                })?;

                if let SendOutcome::Failed(reason) = outcome {
                    return Err(ToolError::Mail { message: reason });
                }
                BulkReport {
                    success: 1,
                    failed: 0,
                }
            }
        };

        self.output_formatter.print_mail_report(&report);
        self.shutdown.check_shutdown()?;
        Ok(report)
    }

    /// Fetch one page and extract the requested fields.
    pub async fn run_scrape(&self, args: &ScrapeArgs) -> Result<ScrapeResult> {
        let base_url = match args.base_url {
            Some(ref base) => base.clone(),
            None => url::Url::parse(&args.url)?.origin().ascii_serialization(),
        };

        let scraper = WebScraper::with_config(
            &base_url,
            self.config.scraper_delay_duration(),
            &self.config.scraper,
        )?;

        let selectors: BTreeMap<String, String> = if args.selectors.is_empty() && !args.links {
            DEFAULT_SELECTORS
                .iter()
                .map(|(name, css)| (name.to_string(), css.to_string()))
                .collect()
        } else {
            args.selectors.iter().cloned().collect()
        };

        self.output_formatter
            .start_operation(&format!("Fetching {}", args.url));
        self.shutdown.check_shutdown()?;

        let document = scraper
            .fetch_page(&args.url)
            .await
            .ok_or_else(|| ToolError::Http {
                message: format!("Failed to fetch {}", args.url),
            })?;

        let mut data = scraper.extract_fields(&document, &selectors)?;
        if args.links {
            let links = scraper.extract_links(&document);
            self.output_formatter
                .info(&format!("Found {} links", links.len()));
            data.insert("links".to_string(), links);
        }

        if let Some(ref output) = args.output {
            scrape::save_to_json(&data, output)?;
        }

        self.output_formatter
            .print_scrape_summary(&args.url, &data, args.output.as_deref());
        Ok(data)
    }

    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn handle_error(&self, error: &ToolError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

pub fn output_mode_for(format: &OutputFormat) -> OutputMode {
    match format {
        OutputFormat::Human => OutputMode::Human,
        OutputFormat::Json => OutputMode::Json,
        OutputFormat::Plain => OutputMode::Plain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::fs;
    use tempfile::TempDir;

    fn toolbelt() -> Toolbelt {
        Toolbelt::new_for_test(Config::default(), OutputMode::Plain, 0, true)
    }

    fn parse(args: &[&str]) -> Command {
        let mut full = vec!["toolbelt"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full)
            .unwrap()
            .command
            .unwrap()
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        Toolbelt::generate_sample_config(&config_path).unwrap();

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[backup]"));
        assert!(content.contains("[organizer]"));
        assert!(content.contains("[mail]"));
        assert!(content.contains("[scraper]"));
    }

    #[test]
    fn test_backup_requires_destination() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().display().to_string();

        let Command::Backup(args) = parse(&["backup", "--source", &source]) else {
            panic!("expected backup command");
        };

        let result = toolbelt().run_backup(&args);
        assert!(matches!(result, Err(ToolError::Config { .. })));
    }

    #[test]
    fn test_backup_create_list_restore() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("project");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("sub/a.txt"), "alpha").unwrap();

        let mut config = Config::default();
        config.backup.destination = Some(temp_dir.path().join("backups"));
        let toolbelt = Toolbelt::new_for_test(config, OutputMode::Plain, 0, true);

        let source_arg = source.display().to_string();
        let Command::Backup(create) = parse(&["backup", "--source", &source_arg]) else {
            panic!("expected backup command");
        };
        toolbelt.run_backup(&create).unwrap();

        let backups: Vec<_> = fs::read_dir(temp_dir.path().join("backups"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].starts_with("backup_"));

        fs::write(source.join("sub/a.txt"), "changed").unwrap();
        let Command::Backup(restore) =
            parse(&["backup", "--source", &source_arg, "--restore", &backups[0]])
        else {
            panic!("expected backup command");
        };
        toolbelt.run_backup(&restore).unwrap();
        assert_eq!(fs::read_to_string(source.join("sub/a.txt")).unwrap(), "alpha");
    }

    #[test]
    fn test_organize_and_undo() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photo.png"), "p").unwrap();
        fs::write(temp_dir.path().join("report.pdf"), "r").unwrap();
        let path = temp_dir.path().display().to_string();

        let Command::Organize(organize) = parse(&["organize", "--path", &path]) else {
            panic!("expected organize command");
        };
        assert!(toolbelt().run_organize(&organize).unwrap());
        assert!(temp_dir.path().join("Images/photo.png").exists());
        assert!(temp_dir.path().join("Documents/report.pdf").exists());

        let Command::Organize(undo) = parse(&["organize", "--path", &path, "--undo"]) else {
            panic!("expected organize command");
        };
        assert!(toolbelt().run_organize(&undo).unwrap());
        assert!(temp_dir.path().join("photo.png").exists());
        assert!(!temp_dir.path().join("Images").exists());
    }

    #[test]
    fn test_organize_cancelled() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("photo.png"), "p").unwrap();
        let path = temp_dir.path().display().to_string();

        let toolbelt = toolbelt();
        toolbelt.shutdown.token().cancel();
        assert!(toolbelt.shutdown.check_shutdown().is_err());

        let Command::Organize(args) = parse(&["organize", "--path", &path]) else {
            panic!("expected organize command");
        };
        assert!(matches!(toolbelt.run_organize(&args), Err(ToolError::Cancelled)));
        assert!(temp_dir.path().join("photo.png").exists());
    }

    #[tokio::test]
    async fn test_mail_missing_recipients_file() {
        let temp_dir = TempDir::new().unwrap();
        let template = temp_dir.path().join("body.txt");
        fs::write(&template, "Hi {name}").unwrap();
        let template_arg = template.display().to_string();
        let missing = temp_dir.path().join("missing.json").display().to_string();

        let Command::Mail(args) = parse(&[
            "mail", "--recipients", &missing, "--template", &template_arg, "--subject", "S",
        ]) else {
            panic!("expected mail command");
        };

        assert!(matches!(toolbelt().run_mail(&args).await, Err(ToolError::Io(_))));
    }

    #[tokio::test]
    async fn test_scrape_unreachable_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let Command::Scrape(args) = parse(&["scrape", "--url", &url, "--delay", "0"]) else {
            panic!("expected scrape command");
        };

        assert!(matches!(toolbelt().run_scrape(&args).await, Err(ToolError::Http { .. })));
    }

    #[test]
    fn test_output_mode_mapping() {
        assert_eq!(output_mode_for(&OutputFormat::Json), OutputMode::Json);
        assert_eq!(output_mode_for(&OutputFormat::Plain), OutputMode::Plain);
        assert_eq!(output_mode_for(&OutputFormat::Human), OutputMode::Human);
    }
}

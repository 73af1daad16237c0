use crate::config::{CliOverrides, Config};
use crate::error::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub use crate::scrape::validate_http_url;

#[derive(Parser, Debug)]
#[command(name = "toolbelt")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Backups, file organizing, bulk mail and web scraping from one binary")]
#[command(
    long_about = "toolbelt bundles four small utilities: a timestamped backup manager, \
                  an extension-based file organizer, an SMTP bulk mailer and a web scraper."
)]
#[command(before_help = "🧰 toolbelt - everyday automation utilities")]
#[command(after_help = "EXAMPLES:\n  \
    toolbelt backup --source ~/projects --dest /mnt/backups --incremental\n  \
    toolbelt backup --source ~/projects --dest /mnt/backups --list\n  \
    toolbelt organize --path ~/Downloads --dry-run\n  \
    toolbelt organize --path ~/Downloads --undo\n  \
    toolbelt mail --to a@example.com,b@example.com --subject Hi --body 'Hello!'\n  \
    toolbelt mail --recipients people.json --subject Hi --template body.txt\n  \
    toolbelt scrape --url https://example.com --select title=h1 --links --output out.json")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Configuration file path
    #[arg(short, long, global = true, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    pub quiet: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Write a sample toolbelt.toml to the current directory")]
    pub generate_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create, list or restore timestamped backups
    Backup(BackupArgs),
    /// Sort files into folders by extension
    Organize(OrganizeArgs),
    /// Send email to one or many recipients over SMTP
    Mail(MailArgs),
    /// Fetch a page and extract links and text
    Scrape(ScrapeArgs),
}

#[derive(clap::Args, Debug)]
pub struct BackupArgs {
    /// File or directory to back up
    #[arg(long)]
    pub source: PathBuf,

    /// Directory holding the backups (defaults to [backup].destination)
    #[arg(long)]
    pub dest: Option<PathBuf>,

    /// Only copy files newer than the existing copy
    #[arg(long, conflicts_with_all = ["list", "restore"])]
    pub incremental: bool,

    /// List available backups
    #[arg(short, long, conflicts_with = "restore")]
    pub list: bool,

    /// Restore the named backup
    #[arg(long, value_name = "NAME")]
    pub restore: Option<String>,

    /// Restore target (defaults to the source path)
    #[arg(long, requires = "restore")]
    pub target: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct OrganizeArgs {
    /// Path to directory to organize
    #[arg(long)]
    pub path: PathBuf,

    /// Show what would be done without actually moving files
    #[arg(long, conflicts_with = "undo")]
    pub dry_run: bool,

    /// Undo previous organization
    #[arg(long)]
    pub undo: bool,

    /// Do not create category folders (they must exist)
    #[arg(long)]
    pub no_create_folders: bool,
}

#[derive(clap::Args, Debug)]
pub struct MailArgs {
    #[arg(long, env = "SMTP_SERVER")]
    pub smtp_server: Option<String>,

    #[arg(long, env = "SMTP_PORT")]
    pub smtp_port: Option<u16>,

    #[arg(long, env = "EMAIL_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Comma-separated recipient addresses, all in one message
    #[arg(
        long,
        value_delimiter = ',',
        required_unless_present = "recipients",
        conflicts_with = "recipients"
    )]
    pub to: Vec<String>,

    #[arg(long)]
    pub subject: String,

    /// Message body for a single send
    #[arg(long, required_unless_present = "recipients", conflicts_with = "template")]
    pub body: Option<String>,

    /// Send the body as HTML
    #[arg(long)]
    pub html: bool,

    /// JSON array of recipient records, each with an "email" field
    #[arg(long, requires = "template")]
    pub recipients: Option<PathBuf>,

    /// Body template file with {field} placeholders
    #[arg(long, requires = "recipients")]
    pub template: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ScrapeArgs {
    /// Page to fetch
    #[arg(long, value_parser = validate_http_url)]
    pub url: String,

    /// Base for root-relative links (defaults to the page origin)
    #[arg(long, value_parser = validate_http_url)]
    pub base_url: Option<String>,

    /// Field to extract, as name=css-selector (repeatable)
    #[arg(long = "select", value_name = "NAME=CSS", value_parser = parse_selector_pair)]
    pub selectors: Vec<(String, String)>,

    /// Also extract every link on the page
    #[arg(long)]
    pub links: bool,

    /// Write results to this JSON file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Seconds to wait after each fetch
    #[arg(long)]
    pub delay: Option<f64>,

    /// HTTP timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        match self.command {
            Some(Command::Backup(ref args)) => {
                CliOverrides::new().with_backup_destination(args.dest.clone())
            }
            Some(Command::Organize(ref args)) => {
                CliOverrides::new().with_create_folders(args.no_create_folders.then_some(false))
            }
            Some(Command::Mail(ref args)) => CliOverrides::new()
                .with_smtp_server(args.smtp_server.clone())
                .with_smtp_port(args.smtp_port)
                .with_smtp_credentials(args.username.clone(), args.password.clone()),
            Some(Command::Scrape(ref args)) => CliOverrides::new()
                .with_scrape_delay(args.delay)
                .with_scrape_timeout(args.timeout),
            None => CliOverrides::new(),
        }
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Parse `name=selector`; the selector itself may contain `=`.
pub fn parse_selector_pair(s: &str) -> std::result::Result<(String, String), String> {
    let (name, selector) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=CSS, got '{}'", s))?;

    let name = name.trim();
    let selector = selector.trim();

    if name.is_empty() {
        return Err("field name must not be empty".to_string());
    }
    if selector.is_empty() {
        return Err(format!("selector for '{}' must not be empty", name));
    }

    Ok((name.to_string(), selector.to_string()))
}

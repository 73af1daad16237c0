use clap::Parser;
use std::process;
use toolbelt::{Cli, Command, OutputFormatter, Toolbelt, ToolError, UserFriendlyError};

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(cli.verbosity_level(), cli.quiet);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(ref command) = cli.command else {
        eprintln!("No subcommand given. Run with --help for usage.");
        return 2;
    };

    let toolbelt = match Toolbelt::from_cli(&cli) {
        Ok(toolbelt) => toolbelt,
        Err(e) => {
            print_startup_error(&cli, &e);
            return exit_code_for(&e);
        }
    };

    let result = match command {
        Command::Backup(args) => toolbelt.run_backup(args).map(|()| 0),
        Command::Organize(args) => toolbelt
            .run_organize(args)
            .map(|success| if success { 0 } else { 1 }),
        Command::Mail(args) => toolbelt.run_mail(args).await.map(|_| 0),
        Command::Scrape(args) => toolbelt.run_scrape(args).await.map(|_| 0),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            log::debug!("command failed: {:?}", e);
            toolbelt.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &ToolError) -> i32 {
    match error {
        ToolError::Cancelled => 130, // Interrupted (SIGINT)
        _ => 1,
    }
}

/// `RUST_LOG` wins; otherwise `-v` raises the crate's level step by step.
fn setup_logging(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace",
    };

    let filter = format!("toolbelt={}", level);
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(filter))
        .format_target(false)
        .format_timestamp_secs()
        .try_init()
        .ok();
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "toolbelt.toml".to_string());

    match Toolbelt::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  toolbelt --config {} <command>", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(cli: &Cli, error: &ToolError) {
    let formatter = OutputFormatter::new(toolbelt::output_mode_for(&cli.output_format), 0, false);
    formatter.print_user_friendly_error(error);
}

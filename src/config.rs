use crate::error::{Result, ToolError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub organizer: OrganizerConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BackupConfig {
    /// Default destination root when `--dest` is not given
    pub destination: Option<PathBuf>,
    #[serde(default)]
    pub incremental: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub create_folders: bool,
    /// Ordered category table; the first category listing an extension wins.
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryConfig {
    pub name: String,
    pub extensions: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Pause after every successful fetch, in seconds
    pub delay: f64,
    pub timeout: u64,
    pub user_agent: String,
}

fn category(name: &str, extensions: &[&str]) -> CategoryConfig {
    CategoryConfig {
        name: name.to_string(),
        extensions: extensions.iter().map(|e| e.to_string()).collect(),
    }
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            create_folders: true,
            categories: vec![
                category("Images", &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp", "ico"]),
                category("Documents", &["pdf", "doc", "docx", "txt", "xlsx", "pptx", "odt", "rtf"]),
                category("Videos", &["mp4", "avi", "mkv", "mov", "flv", "wmv", "webm"]),
                category("Audio", &["mp3", "wav", "flac", "aac", "ogg", "m4a", "wma"]),
                category("Archives", &["zip", "rar", "7z", "tar", "gz", "bz2", "xz"]),
                category(
                    "Code",
                    &["py", "js", "html", "css", "java", "cpp", "c", "h", "php", "rb", "go"],
                ),
                category("Executables", &["exe", "msi", "dmg", "deb", "rpm", "app"]),
                category("Fonts", &["ttf", "otf", "woff", "woff2", "eot"]),
                category("Books", &["epub", "mobi", "azw", "azw3"]),
                category("Presentations", &["ppt", "pptx", "key", "odp"]),
            ],
        }
    }
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: String::new(),
            password: String::new(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            delay: 1.0,
            timeout: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ToolError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ToolError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ToolError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["toolbelt.toml", ".toolbelt.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        log::debug!("Using configuration file {}", default_path);
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref destination) = cli_args.backup_destination {
            self.backup.destination = Some(destination.clone());
        }

        if let Some(create_folders) = cli_args.create_folders {
            self.organizer.create_folders = create_folders;
        }

        if let Some(ref server) = cli_args.smtp_server {
            self.mail.smtp_server = server.clone();
        }

        if let Some(port) = cli_args.smtp_port {
            self.mail.smtp_port = port;
        }

        if let Some(ref username) = cli_args.smtp_username {
            self.mail.username = username.clone();
        }

        if let Some(ref password) = cli_args.smtp_password {
            self.mail.password = password.clone();
        }

        if let Some(delay) = cli_args.scrape_delay {
            self.scraper.delay = delay;
        }

        if let Some(timeout) = cli_args.scrape_timeout {
            self.scraper.timeout = timeout;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self).map_err(|e| ToolError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        std::fs::write(path, content).map_err(|e| ToolError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.organizer.categories.is_empty() {
            return Err(ToolError::Config {
                message: "At least one organizer category must be specified".to_string(),
            });
        }

        for category in &self.organizer.categories {
            if category.name.trim().is_empty() {
                return Err(ToolError::Config {
                    message: "Organizer category names must be non-empty".to_string(),
                });
            }

            if category.name == crate::organizer::OTHERS {
                return Err(ToolError::Config {
                    message: format!(
                        "'{}' is reserved for unmatched extensions",
                        crate::organizer::OTHERS
                    ),
                });
            }

            if category.extensions.is_empty() {
                return Err(ToolError::Config {
                    message: format!("Category {} has no extensions", category.name),
                });
            }
        }

        if self.mail.smtp_port == 0 {
            return Err(ToolError::Config {
                message: "SMTP port must be greater than 0".to_string(),
            });
        }

        if Duration::try_from_secs_f64(self.scraper.delay).is_err() {
            return Err(ToolError::Config {
                message: "Scraper delay must be a non-negative number of seconds".to_string(),
            });
        }

        if self.scraper.timeout == 0 {
            return Err(ToolError::Config {
                message: "Scraper timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    pub fn scraper_delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.scraper.delay).unwrap_or_default()
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub backup_destination: Option<PathBuf>,
    pub create_folders: Option<bool>,
    pub smtp_server: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub scrape_delay: Option<f64>,
    pub scrape_timeout: Option<u64>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backup_destination(mut self, destination: Option<PathBuf>) -> Self {
        self.backup_destination = destination;
        self
    }

    pub fn with_create_folders(mut self, create_folders: Option<bool>) -> Self {
        self.create_folders = create_folders;
        self
    }

    pub fn with_smtp_server(mut self, server: Option<String>) -> Self {
        self.smtp_server = server;
        self
    }

    pub fn with_smtp_port(mut self, port: Option<u16>) -> Self {
        self.smtp_port = port;
        self
    }

    pub fn with_smtp_credentials(
        mut self,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.smtp_username = username;
        self.smtp_password = password;
        self
    }

    pub fn with_scrape_delay(mut self, delay: Option<f64>) -> Self {
        self.scrape_delay = delay;
        self
    }

    pub fn with_scrape_timeout(mut self, timeout: Option<u64>) -> Self {
        self.scrape_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.organizer.categories.len(), 10);
        assert_eq!(config.organizer.categories[0].name, "Images");
        assert!(config.organizer.create_folders);
        assert_eq!(config.mail.smtp_port, 587);
        assert_eq!(config.scraper.timeout, 10);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.scraper.timeout = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.organizer.categories.push(category("Others", &["zzz"]));
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.scraper.delay = -1.0;
        assert!(config.validate().is_err());

        for delay in [f64::NAN, f64::INFINITY, 1e20] {
            let mut config = Config::default();
            config.scraper.delay = delay;
            assert!(matches!(config.validate(), Err(ToolError::Config { .. })));
            assert_eq!(config.scraper_delay_duration(), Duration::ZERO);
        }
    }

    #[test]
    fn test_config_file_operations() {
        let mut config = Config::default();
        config.scraper.delay = 2.5;
        let temp_file = NamedTempFile::new().unwrap();

        config.save_to_file(temp_file.path()).unwrap();

        let loaded_config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(loaded_config.scraper.delay, 2.5);
        assert_eq!(loaded_config.organizer.categories, config.organizer.categories);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[backup]\ndestination = \"/tmp/backups\"\n").unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.backup.destination, Some(PathBuf::from("/tmp/backups")));
        assert_eq!(config.organizer.categories.len(), 10);
        assert_eq!(config.scraper.timeout, 10);
    }

    #[test]
    fn test_partial_section_keeps_other_fields() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(
            temp_file.path(),
            "[organizer]\ncreate_folders = false\n\n[mail]\nsmtp_port = 465\n",
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).unwrap();
        assert!(!config.organizer.create_folders);
        assert_eq!(config.organizer.categories.len(), 10);
        assert_eq!(config.mail.smtp_port, 465);
        assert_eq!(config.mail.smtp_server, "smtp.gmail.com");
    }

    #[test]
    fn test_missing_config_file() {
        let result = Config::load_from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(ToolError::Config { .. })));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = Config::default();

        let overrides = CliOverrides::new()
            .with_smtp_server(Some("mail.example.com".to_string()))
            .with_smtp_port(Some(2525))
            .with_create_folders(Some(false))
            .with_scrape_delay(Some(0.0));

        config.merge_with_cli_args(&overrides);

        assert_eq!(config.mail.smtp_server, "mail.example.com");
        assert_eq!(config.mail.smtp_port, 2525);
        assert!(!config.organizer.create_folders);
        assert_eq!(config.scraper_delay_duration(), Duration::ZERO);
        assert_eq!(config.scraper.timeout, 10);
    }

    #[test]
    fn test_sample_config_generation() {
        let sample = Config::create_sample_config();
        assert!(!sample.is_empty());
        assert!(sample.contains("[organizer]"));
        assert!(sample.contains("[mail]"));
        assert!(sample.contains("[scraper]"));
        assert!(sample.contains("[[organizer.categories]]"));
    }
}

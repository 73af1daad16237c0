use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Source path does not exist: {path}")]
    SourceNotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("Backup does not exist: {name}")]
    BackupNotFound { name: String },

    #[error("Backup folder already exists: {path}")]
    BackupExists { path: String },

    #[error("Path validation failed: {path}")]
    InvalidPath { path: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },

    #[error("Template rendering failed: {message}")]
    Template { message: String },

    #[error("Mail error: {message}")]
    Mail { message: String },

    #[error("HTTP request failed: {message}")]
    Http { message: String },

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for ToolError {
    fn user_message(&self) -> String {
        match self {
            ToolError::SourceNotFound { path } => {
                format!("Source path {} does not exist", path)
            }
            ToolError::NotADirectory { path } => {
                format!("{} is not a directory", path)
            }
            ToolError::BackupNotFound { name } => {
                format!("Backup {} does not exist", name)
            }
            ToolError::BackupExists { path } => {
                format!("Backup folder already exists: {}", path)
            }
            ToolError::InvalidPath { path } => {
                format!("Invalid path: {}", path)
            }
            ToolError::InvalidUrl { url } => {
                format!("Invalid URL: {}", url)
            }
            ToolError::InvalidSelector { selector } => {
                format!("Could not parse CSS selector: {}", selector)
            }
            ToolError::Template { message } => {
                format!("Template error: {}", message)
            }
            ToolError::Mail { message } => {
                format!("Mail error: {}", message)
            }
            ToolError::Http { message } => {
                format!("HTTP error: {}", message)
            }
            ToolError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            ToolError::Cancelled => "Operation cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            ToolError::SourceNotFound { .. } => Some(
                "Check the path for typos and make sure it is readable by the current user.".to_string()
            ),
            ToolError::BackupNotFound { .. } => Some(
                "Run `toolbelt backup --source <path> --dest <dir> --list` to see the available backups.".to_string()
            ),
            ToolError::BackupExists { .. } => Some(
                "Wait a second before starting another full backup, or use --incremental to refresh the existing folder.".to_string()
            ),
            ToolError::InvalidUrl { .. } => Some(
                "Provide an absolute http(s) URL (e.g., https://example.com).".to_string()
            ),
            ToolError::InvalidSelector { .. } => Some(
                "Selectors use CSS syntax, e.g. --select titles='h1, h2'.".to_string()
            ),
            ToolError::Template { .. } => Some(
                "Every {placeholder} in the template must be a field of each recipient record. Use {{ and }} for literal braces.".to_string()
            ),
            ToolError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<url::ParseError> for ToolError {
    fn from(error: url::ParseError) -> Self {
        ToolError::InvalidUrl {
            url: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for ToolError {
    fn from(error: toml::de::Error) -> Self {
        ToolError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ToolError>;

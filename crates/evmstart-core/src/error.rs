//! Error types for evmstart

use std::path::PathBuf;

use thiserror::Error;

use crate::project::RejectionReason;

/// Result type alias using evmstart's Error
pub type Result<T> = std::result::Result<T, Error>;

/// evmstart error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Pre-flight errors (E001-E099)
    #[error("Invalid project name: {0}")]
    InvalidName(#[from] RejectionReason),

    #[error("Directory \"{}\" already exists. Please choose a different name.", .0.display())]
    DirectoryExists(PathBuf),

    #[error("Template directory not found: {}", .0.display())]
    TemplateNotFound(PathBuf),

    // Scaffolding errors (E100-E199)
    #[error("Failed to copy {}: {source}", path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Process errors (E200-E299)
    #[error("Could not launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {waited_ms}ms waiting for {what}")]
    ReadinessTimeout { what: String, waited_ms: u128 },

    // Artifact errors (E300-E399)
    #[error("Malformed deployment artifact {}: {source}", path.display())]
    ArtifactParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // Rewrite errors (E400-E499)
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Invalid rewrite pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Not a contract address: {0}")]
    InvalidAddress(String),

    // User errors (E700-E799)
    #[error("Project creation cancelled")]
    UserCancelled,

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName(_) => "E001",
            Self::DirectoryExists(_) => "E002",
            Self::TemplateNotFound(_) => "E003",
            Self::Copy { .. } => "E100",
            Self::Launch { .. } => "E200",
            Self::ReadinessTimeout { .. } => "E201",
            Self::ArtifactParse { .. } => "E300",
            Self::ConfigNotFound(_) => "E400",
            Self::Pattern(_) => "E401",
            Self::InvalidAddress(_) => "E402",
            Self::UserCancelled => "E700",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidName(_) => {
                Some("Use lowercase letters, numbers, and hyphens only".to_string())
            }
            Self::DirectoryExists(path) => path
                .file_name()
                .map(|name| format!("rm -r {} or pick another name", name.to_string_lossy())),
            Self::TemplateNotFound(_) => {
                Some("Set EVMSTART_TEMPLATES_DIR or `evmstart config set templates.dir <path>`".to_string())
            }
            Self::Launch { command, .. } => Some(format!("Check that `{}` is installed and on PATH", command)),
            Self::InvalidAddress(_) => Some("Addresses are 0x followed by 40 hex digits".to_string()),
            _ => None,
        }
    }

    /// True when the process failed to start at all, as opposed to running and failing
    pub fn is_launch_failure(&self) -> bool {
        matches!(self, Self::Launch { .. })
    }
}

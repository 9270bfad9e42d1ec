use std::path::PathBuf;
use thiserror::Error;

use crate::patcher::StructureError;

#[derive(Error, Debug)]
pub enum PatchError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Config file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected structure in {path}: {source}")]
    StructuralMismatch {
        path: PathBuf,
        #[source]
        source: StructureError,
    },

    #[error("Failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Invalid agent id '{id}': {reason}")]
    InvalidAgentId { id: String, reason: String },

    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Could not determine home directory. Set HOME or pass --home")]
    HomeNotFound,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PatchError {
    /// Short category name used in log events
    pub fn kind(&self) -> &'static str {
        match self {
            PatchError::Read { .. } | PatchError::Parse { .. } => "read",
            PatchError::StructuralMismatch { .. } => "structure",
            PatchError::Write { .. } | PatchError::Serialize(_) => "write",
            PatchError::InvalidAgentId { .. } => "input",
            PatchError::SettingsParse(_) | PatchError::HomeNotFound => "settings",
            PatchError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, PatchError>;

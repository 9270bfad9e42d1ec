use crate::cli::Cli;
use crate::error::{PatchError, Result};
use crate::records::DEFAULT_MODEL;
use crate::utils::path::{expand_tilde, home_dir};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Optional operator settings file, relative to the home directory
pub const SETTINGS_FILE: &str = ".openclaw/agent-patch.toml";

/// Contents of the settings file; every key is optional
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    #[serde(default)]
    pub config_path: Option<String>,

    #[serde(default)]
    pub default_model: Option<String>,
}

/// Resolved operator settings handed to the patch command
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Home directory the config and workspace paths are derived from
    pub home: PathBuf,

    /// Document to patch
    pub config_path: PathBuf,

    /// Model used when none is given on the command line
    pub default_model: String,

    /// Print instead of writing (not stored in settings file)
    pub dry_run: bool,
}

impl Settings {
    /// Built-in defaults for `home`
    pub fn defaults(home: PathBuf) -> Self {
        let config_path = home.join(".openclaw").join("openclaw.json");
        Self {
            home,
            config_path,
            default_model: DEFAULT_MODEL.to_string(),
            dry_run: false,
        }
    }

    /// Load settings with precedence:
    /// 1. CLI flags (and their environment variables)
    /// 2. `OPENCLAW_DEFAULT_MODEL`
    /// 3. Settings file (~/.openclaw/agent-patch.toml)
    /// 4. Built-in defaults
    pub fn load(cli: &Cli) -> Result<Self> {
        let home = match &cli.home {
            Some(home) => home.clone(),
            None => home_dir().ok_or(PatchError::HomeNotFound)?,
        };

        let mut settings = Self::defaults(home);

        let settings_file = settings.home.join(SETTINGS_FILE);
        if settings_file.exists() {
            settings = settings.merge(Self::from_file(&settings_file)?);
        }

        settings = settings.merge_env();

        let settings = settings.with_cli_overrides(cli);
        debug!(
            home = %settings.home.display(),
            config = %settings.config_path.display(),
            "settings resolved"
        );
        Ok(settings)
    }

    /// Parse a TOML settings file
    pub fn from_file(path: &Path) -> Result<SettingsFile> {
        let contents = std::fs::read_to_string(path)?;
        let file: SettingsFile = toml::from_str(&contents)?;
        Ok(file)
    }

    /// Merge a settings file into these settings (file takes precedence)
    fn merge(mut self, file: SettingsFile) -> Self {
        if let Some(config_path) = file.config_path {
            self.config_path = self.expand(&config_path);
        }
        if let Some(model) = file.default_model.filter(|m| !m.is_empty()) {
            self.default_model = model;
        }
        self
    }

    /// Apply environment variable overrides
    fn merge_env(mut self) -> Self {
        if let Ok(model) = std::env::var("OPENCLAW_DEFAULT_MODEL") {
            if !model.is_empty() {
                self.default_model = model;
            }
        }
        self
    }

    /// Apply CLI overrides (highest precedence)
    pub fn with_cli_overrides(mut self, cli: &Cli) -> Self {
        if let Some(config) = &cli.config {
            self.config_path = self.expand(config);
        }
        self.dry_run = cli.dry_run;
        self
    }

    fn expand<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        let path = path.as_ref();
        expand_tilde(path, &self.home).unwrap_or_else(|| path.to_path_buf())
    }
}

use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Application configuration structure.
///
/// Layered from defaults, an optional `archiver` config file, and
/// `ARCHIVER_`-prefixed environment variables. Command-line flags override
/// whatever is loaded here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Output placement
    pub output: OutputConfig,
    /// Logging behavior
    pub logging: LoggingConfig,
}

/// Where the archive lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for documents and attachment subdirectories; a leading
    /// `~/` is expanded against the home directory
    pub directory: String,
}

/// How the run logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when no flag or RUST_LOG says otherwise
    pub level: String,
    /// Log file path; stderr only when unset
    pub file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output: OutputConfig {
                directory: "~/out".to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence.
    pub fn load() -> Result<Self> {
        let config = Config::builder()
            // Start with default values
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add config file if it exists
            .add_source(File::with_name("archiver").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix("ARCHIVER").separator("_"))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {}", e))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        if self.output.directory.trim().is_empty() {
            return Err(anyhow::anyhow!("Output directory cannot be empty"));
        }

        Ok(())
    }
}

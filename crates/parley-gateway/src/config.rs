use anyhow::anyhow;
use parley_logging::LogFormat;
use parley_timeline::TimelineConfig;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[storage]
path = "parley.db"  # Set via PARLEY_DB_PATH env var

[logging]
level = "warn"  # trace, debug, info, warn, error
format = "pretty"  # or "json"

[timeline]
page_size = 20
reply_delay_ms = 2000
reply_cooldown_ms = 3000
load_latency_ms = 1000
seed_newest_id = 100  # 0 starts new rooms empty
"#;

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
}

impl Config {
    /// Get the global config path: ~/.parley/parley.toml
    fn global_config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not find home directory"))?;
        Ok(home.join(".parley").join("parley.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<PathBuf> {
        let config_path = Self::global_config_path()?;

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(config_path)
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.parley/parley.toml (auto-created if missing)
    /// 2. Local override: ./parley.toml (optional)
    /// 3. Environment variables (highest priority)
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;

        let mut config_builder = config::Config::builder()
            .add_source(config::File::from(global_config_path))
            .add_source(config::File::with_name("parley").required(false))
            // PARLEY__TIMELINE__PAGE_SIZE=50 and friends
            .add_source(
                config::Environment::with_prefix("PARLEY")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(path) = env::var("PARLEY_DB_PATH") {
            config_builder = config_builder.set_override("storage.path", path)?;
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .expect("valid source")
            .try_deserialize()
            .expect("valid config")
    }

    #[test]
    fn test_default_template_parses() {
        let config = from_toml(DEFAULT_CONFIG);
        assert_eq!(config.storage.path, "parley.db");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.timeline, TimelineConfig::default());
    }

    #[test]
    fn test_timeline_section_is_optional() {
        let config = from_toml(
            r#"
            [storage]
            path = "/tmp/chat.db"

            [logging]
            level = "debug"
            format = "json"
            "#,
        );
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.timeline.page_size, 20);
    }
}

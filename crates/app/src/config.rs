use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use services::ClassifierConfig;

/// Prefix for environment overrides, e.g. `SIGNPLAY__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "SIGNPLAY";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub classifier: ClassifierSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser; `*` allows any.
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

impl Settings {
    /// Layer defaults, optional `config/default` and `config/local` files,
    /// `SIGNPLAY__*` variables, then `overrides` (command-line flags).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or a value has the
    /// wrong type.
    pub fn load(overrides: &[(&str, String)]) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.cors_origins", vec!["*"])?
            .set_default("database.url", "sqlite://signplay.sqlite3")?
            .set_default("classifier.base_url", "http://localhost:5001")?
            .set_default("classifier.timeout_secs", 10)?
            .set_default("logging.level", "info")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins"),
            );

        for (key, value) in overrides {
            builder = builder.set_override(*key, value.as_str())?;
        }

        builder.build()?.try_deserialize()
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    #[must_use]
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig::new(
            self.classifier.base_url.clone(),
            Duration::from_secs(self.classifier.timeout_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_files() {
        let settings = Settings::load(&[]).unwrap();
        assert_eq!(settings.classifier.timeout_secs, 10);
        assert_eq!(settings.logging.level, "info");
        assert!(settings.database.url.starts_with("sqlite:"));
        assert_eq!(settings.server.cors_origins, vec!["*".to_owned()]);
    }

    #[test]
    fn overrides_win_and_are_parsed() {
        let settings = Settings::load(&[
            ("server.port", "6100".to_owned()),
            ("server.host", "127.0.0.1".to_owned()),
            ("classifier.base_url", "http://gpu-box:9000".to_owned()),
        ])
        .unwrap();
        assert_eq!(settings.bind_addr(), "127.0.0.1:6100");
        let classifier = settings.classifier_config();
        assert_eq!(classifier.base_url, "http://gpu-box:9000");
        assert_eq!(classifier.timeout, Duration::from_secs(10));
    }

    #[test]
    fn non_numeric_port_is_rejected() {
        assert!(Settings::load(&[("server.port", "http".to_owned())]).is_err());
    }
}

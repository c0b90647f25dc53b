use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use error::ConfigError;
pub use settings::{
    CacheSettings, ClientConfig, LogFormat, LoggingSettings, NamespaceSettings, Settings,
    ValidationSettings,
};

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the TOML file (`dashboard.toml`
/// in the working directory unless `path` points elsewhere), then environment
/// variables prefixed with `DASHBOARD__` (e.g. `DASHBOARD__CLIENT__TIMEOUT_MS`).
/// An explicitly supplied file must exist; the default one is optional.
pub fn load_config(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("dashboard").required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("DASHBOARD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.client.timeout_ms, 10_000);
        assert_eq!(settings.client.max_retries, 3);
        assert_eq!(settings.client.base_retry_delay_ms, 1_000);
        assert_eq!(settings.client.concurrency_limit, 5);
        assert_eq!(settings.cache.ttl_ms, 60_000);
        assert_eq!(settings.validation.starting_capital, dec!(100000));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn loads_partial_toml_over_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[client]
base_url = "https://game.example.com/api"
timeout_ms = 2500

[cache.namespaces.leaderboard]
max_entries = 3

[validation]
starting_capital = 50000
"#
        )
        .unwrap();

        let settings = load_config(Some(file.path())).unwrap();
        assert_eq!(settings.client.base_url, "https://game.example.com/api");
        assert_eq!(settings.client.timeout_ms, 2500);
        assert_eq!(settings.client.max_retries, 3);
        assert_eq!(settings.cache.max_entries_for("leaderboard"), 3);
        assert_eq!(settings.cache.max_entries_for("unknown"), 100);
        assert_eq!(settings.validation.starting_capital, dec!(50000));
    }

    #[test]
    fn rejects_zero_concurrency_limit() {
        let mut settings = Settings::default();
        settings.client.concurrency_limit = 0;
        assert!(matches!(settings.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here/dashboard.toml")));
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}

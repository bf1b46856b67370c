// src/pipeline/validate.rs

use std::path::Path;

use crate::error::Result;
use crate::models::Config;

/// Load and validate a configuration file, logging what it defines.
pub fn run_validate(path: &Path) -> Result<Config> {
    log::info!("Validating configuration {}", path.display());

    let config = Config::load(path).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    match config {
        Ok(config) => {
            log::info!("Configuration is valid");
            log::info!("  user agent: {}", config.fetcher.user_agent);
            log::info!("  timeout: {}s", config.fetcher.timeout_secs);
            log::info!("  store: {}", config.storage.path.display());
            log::info!(
                "  caps: {} events, {} jobs; message limit {}",
                config.query.event_cap,
                config.query.career_cap,
                config.query.message_limit
            );
            for source in &config.sources {
                log::info!(
                    "  source '{}': {:?} {} via {:?} rules ({})",
                    source.name,
                    source.format,
                    source.kind,
                    source.rules,
                    source.locator
                );
            }
            Ok(config)
        }
        Err(e) => {
            log::error!("Configuration invalid: {}", e);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::TempDir;

    #[test]
    fn test_valid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [[sources]]
            name = "workshops"
            locator = "https://example.com/workshops.rss"
            format = "syndication"
            kind = "event"
            sub_kind = "workshop"
            rules = "events"
            "#,
        )
        .unwrap();

        let config = run_validate(&path).unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[fetcher]\ntimeout_secs = 0\n").unwrap();
        assert!(matches!(
            run_validate(&path).unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(run_validate(&dir.path().join("absent.toml")).is_err());
    }
}

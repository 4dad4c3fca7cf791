use std::path::PathBuf;

use crate::config::AppConfig;

/// Logging settings resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: String,
    pub dir: PathBuf,
    pub json: bool,
    /// Production also keeps an error-only file.
    pub error_file: bool,
}

impl LogSettings {
    pub fn from_env(config: &AppConfig) -> Self {
        let level = std::env::var("LOG_LEVEL")
            .ok()
            .map(|l| l.trim().to_lowercase())
            .filter(|l| !l.is_empty());
        let dir = std::env::var("LOG_DIR")
            .ok()
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);
        Self::resolve(config.is_production(), level, dir)
    }

    fn resolve(is_production: bool, level: Option<String>, dir: Option<PathBuf>) -> Self {
        Self {
            level: level.unwrap_or_else(|| {
                let default = if is_production { "info" } else { "debug" };
                default.to_string()
            }),
            dir: dir.unwrap_or_else(|| PathBuf::from("logs")),
            json: is_production,
            error_file: is_production,
        }
    }

    /// Default directive when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        format!("portfolio_cms={},tower_http=debug,axum=info", self.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let settings = LogSettings::resolve(false, None, None);
        assert_eq!(settings.level, "debug");
        assert_eq!(settings.dir, PathBuf::from("logs"));
        assert!(!settings.json);
        assert!(!settings.error_file);
    }

    #[test]
    fn test_production_uses_json_and_info() {
        let settings = LogSettings::resolve(true, None, Some(PathBuf::from("/var/log/cms")));
        assert_eq!(settings.level, "info");
        assert!(settings.json);
        assert!(settings.error_file);
        assert_eq!(settings.dir, PathBuf::from("/var/log/cms"));
    }

    #[test]
    fn test_filter_directive_names_crate() {
        let settings = LogSettings::resolve(false, Some("warn".to_string()), None);
        assert_eq!(
            settings.filter_directive(),
            "portfolio_cms=warn,tower_http=debug,axum=info"
        );
    }
}

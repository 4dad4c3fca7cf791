//! Application configuration, read once from the environment at startup.

use std::path::PathBuf;

/// Development-only signing secret. Production refuses to start with it.
pub const DEFAULT_JWT_SECRET: &str = "default-jwt-secret-change-in-production";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub database_url: Option<String>,
    pub upload_dir: PathBuf,
    pub frontend_dist: PathBuf,
    pub frontend_url: String,
    pub jwt_secret: String,
    pub token_expiry_days: i64,
    pub max_upload_bytes: usize,
    pub allowed_origins: Vec<String>,
    pub admin: Option<AdminSeed>,
}

/// Admin account created at startup when it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            environment: "development".to_string(),
            database_url: None,
            upload_dir: PathBuf::from("uploads"),
            frontend_dist: PathBuf::from("../frontend/dist"),
            frontend_url: "http://localhost:5173".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_expiry_days: 30,
            max_upload_bytes: 10 * 1024 * 1024,
            allowed_origins: Vec::new(),
            admin: None,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let environment = env_non_empty("ENVIRONMENT")
            .or_else(|| env_non_empty("NODE_ENV"))
            .unwrap_or(defaults.environment);
        let is_production = environment == "production";

        let upload_dir = env_non_empty("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                if is_production {
                    PathBuf::from("/var/data/uploads")
                } else {
                    defaults.upload_dir
                }
            });

        let allowed_origins = env_non_empty("ALLOWED_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let admin = match (env_non_empty("ADMIN_EMAIL"), env_non_empty("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: env_non_empty("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Self {
            host: env_non_empty("HOST").unwrap_or(defaults.host),
            port: env_parse("PORT").unwrap_or(defaults.port),
            environment,
            database_url: env_non_empty("DATABASE_URL"),
            upload_dir,
            frontend_dist: env_non_empty("FRONTEND_DIST")
                .map(PathBuf::from)
                .unwrap_or(defaults.frontend_dist),
            frontend_url: env_non_empty("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            jwt_secret: env_non_empty("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_expiry_days: env_parse("TOKEN_EXPIRY_DAYS")
                .filter(|days: &i64| *days > 0)
                .unwrap_or(defaults.token_expiry_days),
            max_upload_bytes: env_parse::<usize>("MAX_UPLOAD_MB")
                .filter(|mb| *mb > 0)
                .map(|mb| mb * 1024 * 1024)
                .unwrap_or(defaults.max_upload_bytes),
            allowed_origins,
            admin,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Refuse insecure settings that are tolerable only in development.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.is_production()
            && (self.jwt_secret.is_empty() || self.jwt_secret == DEFAULT_JWT_SECRET)
        {
            anyhow::bail!(
                "JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }
        Ok(())
    }

    /// Request body cap: the upload limit plus room for multipart framing.
    pub fn body_limit_bytes(&self) -> usize {
        self.max_upload_bytes + 64 * 1024
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port_is_8000() {
        assert_eq!(AppConfig::default().port, 8000);
    }

    #[test]
    fn test_production_rejects_default_secret() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_accepts_custom_secret() {
        let config = AppConfig {
            environment: "production".to_string(),
            jwt_secret: "a-long-random-secret".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_development_tolerates_default_secret() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_body_limit_exceeds_upload_limit() {
        let config = AppConfig::default();
        assert!(config.body_limit_bytes() > config.max_upload_bytes);
    }
}

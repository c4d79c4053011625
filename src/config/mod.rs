use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    #[error("JWT expiry must be between 1 and {max} hours, got {hours}")]
    InvalidJwtExpiry { hours: u64, max: u64 },
}

/// Longest accepted token lifetime (one year)
pub const MAX_JWT_EXPIRY_HOURS: u64 = 24 * 366;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Partial overlay read from the optional YAML file; absent keys keep the profile default
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    server: Option<FileServer>,
    database: Option<FileDatabase>,
    security: Option<FileSecurity>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileServer {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileDatabase {
    url: Option<String>,
    max_connections: Option<u32>,
    connection_timeout_secs: Option<u64>,
    run_migrations: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSecurity {
    jwt_secret: Option<String>,
    jwt_expiry_hours: Option<u64>,
    enable_cors: Option<bool>,
    cors_origins: Option<Vec<String>>,
}

impl AppConfig {
    /// Profile defaults, then the YAML file (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::for_environment(Self::environment_from_env());

        if let Some(path) = path {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let overlay: FileConfig =
                serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                    path: path.display().to_string(),
                    source,
                })?;
            config.apply_file(overlay);
        }

        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    fn environment_from_env() -> Environment {
        match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Missing("JWT_SECRET"));
        }
        let hours = self.security.jwt_expiry_hours;
        if hours == 0 || hours > MAX_JWT_EXPIRY_HOURS {
            return Err(ConfigError::InvalidJwtExpiry { hours, max: MAX_JWT_EXPIRY_HOURS });
        }
        match &self.database.url {
            Some(url) if !url.is_empty() => {
                url::Url::parse(url).map_err(|_| ConfigError::InvalidDatabaseUrl(redact(url)))?;
                Ok(())
            }
            _ => Err(ConfigError::Missing("DATABASE_URL")),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn jwt_ttl(&self) -> Duration {
        // Out-of-range values saturate; the issuer refuses a lifetime it cannot add
        self.security
            .jwt_expiry_hours
            .checked_mul(60 * 60)
            .map(Duration::from_secs)
            .unwrap_or(Duration::MAX)
    }

    fn apply_file(&mut self, file: FileConfig) {
        if let Some(server) = file.server {
            if let Some(v) = server.host { self.server.host = v; }
            if let Some(v) = server.port { self.server.port = v; }
        }
        if let Some(db) = file.database {
            if db.url.is_some() { self.database.url = db.url; }
            if let Some(v) = db.max_connections { self.database.max_connections = v; }
            if let Some(v) = db.connection_timeout_secs { self.database.connection_timeout_secs = v; }
            if let Some(v) = db.run_migrations { self.database.run_migrations = v; }
        }
        if let Some(sec) = file.security {
            if let Some(v) = sec.jwt_secret { self.security.jwt_secret = v; }
            if let Some(v) = sec.jwt_expiry_hours { self.security.jwt_expiry_hours = v; }
            if let Some(v) = sec.enable_cors { self.security.enable_cors = v; }
            if let Some(v) = sec.cors_origins { self.security.cors_origins = v; }
        }
    }

    fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        // Server overrides
        if let Ok(v) = env::var("HTTP_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("HTTP_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        } else if let Some(url) = Self::database_url_from_parts()? {
            self.database.url = Some(url);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout_secs = v.parse().unwrap_or(self.database.connection_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        Ok(self)
    }

    /// Assemble a postgres URL from the DB_* variables when DATABASE_URL is absent
    fn database_url_from_parts() -> Result<Option<String>, ConfigError> {
        let name = match env::var("DB_NAME") {
            Ok(name) => name,
            Err(_) => return Ok(None),
        };
        let host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let port = env::var("DB_PORT").ok().and_then(|p| p.parse::<u16>().ok()).unwrap_or(5432);

        build_database_url(
            &host,
            port,
            env::var("DB_USER").ok().as_deref(),
            env::var("DB_PASSWORD").ok().as_deref(),
            &name,
            env::var("DB_SSLMODE").ok().as_deref(),
        )
        .map(Some)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout_secs: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout_secs: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout_secs: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: false,
                cors_origins: vec![],
            },
        }
    }
}

pub fn build_database_url(
    host: &str,
    port: u16,
    user: Option<&str>,
    password: Option<&str>,
    name: &str,
    sslmode: Option<&str>,
) -> Result<String, ConfigError> {
    let base = format!("postgres://{}:{}", host, port);
    let mut url = url::Url::parse(&base).map_err(|_| ConfigError::InvalidDatabaseUrl(base.clone()))?;

    if let Some(user) = user {
        url.set_username(user)
            .map_err(|_| ConfigError::InvalidDatabaseUrl(base.clone()))?;
    }
    if let Some(password) = password {
        url.set_password(Some(password))
            .map_err(|_| ConfigError::InvalidDatabaseUrl(base.clone()))?;
    }
    url.set_path(&format!("/{}", name));
    if let Some(mode) = sslmode {
        url.query_pairs_mut().append_pair("sslmode", mode);
    }

    Ok(url.into())
}

/// Strip credentials before a URL ends up in an error message or a log line
pub fn redact(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut url) => {
            if url.password().is_some() {
                let _ = url.set_password(Some("***"));
            }
            url.into()
        }
        Err(_) => "<unparseable>".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert!(config.database.run_migrations);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn validate_rejects_missing_secret_and_url() {
        let mut config = AppConfig::production();
        config.database.url = Some("postgres://localhost/todo".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Missing("JWT_SECRET"))));

        let config = AppConfig::development();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn validate_bounds_jwt_expiry() {
        let mut config = AppConfig::development();
        config.database.url = Some("postgres://localhost/todo".to_string());
        assert!(config.validate().is_ok());

        config.security.jwt_expiry_hours = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry { hours: 0, .. })));

        config.security.jwt_expiry_hours = 2_400_000_000;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidJwtExpiry { .. })));

        config.security.jwt_expiry_hours = MAX_JWT_EXPIRY_HOURS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn jwt_ttl_saturates_instead_of_overflowing() {
        let mut config = AppConfig::development();
        config.security.jwt_expiry_hours = u64::MAX;
        assert_eq!(config.jwt_ttl(), Duration::MAX);
    }

    #[test]
    fn builds_url_from_parts() {
        let url = build_database_url("db", 5433, Some("app"), Some("s3cret"), "todo", Some("disable")).unwrap();
        assert_eq!(url, "postgres://app:s3cret@db:5433/todo?sslmode=disable");
    }

    #[test]
    fn redacts_password() {
        let redacted = redact("postgres://app:s3cret@db:5432/todo");
        assert!(!redacted.contains("s3cret"));
        assert!(redacted.contains("app:***@db"));
    }

    #[test]
    fn yaml_overlay_keeps_unset_fields() {
        let mut config = AppConfig::development();
        let overlay: FileConfig = serde_yaml::from_str("server:\n  port: 9090\nsecurity:\n  jwt_expiry_hours: 2\n").unwrap();
        config.apply_file(overlay);

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.security.jwt_expiry_hours, 2);
        assert_eq!(config.jwt_ttl(), Duration::from_secs(2 * 3600));
    }
}

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Errors raised while loading configuration. Any of these aborts startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub storage: StorageConfig,
    pub upload: UploadLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// `APP_ENV` value to environment; unknown or unset means development
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        }
    }

    /// Read `APP_ENV` alone, before the full configuration is loaded
    pub fn from_env() -> Self {
        Self::from_name(env::var("APP_ENV").ok().as_deref())
    }

    pub fn is_production(self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Single allowed browser origin; `None` means permissive CORS
    pub cors_origin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub bcrypt_cost: u32,
}

/// Whether uploaded objects are addressed by a plain URL or a pre-signed one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(skip_serializing)]
    pub access_key_id: String,
    #[serde(skip_serializing)]
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
    pub endpoint_url: Option<String>,
    pub visibility: Visibility,
    pub signed_url_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadLimits {
    pub max_files: usize,
    pub max_file_bytes: u64,
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_files: 4,
            max_file_bytes: 5 * 1024 * 1024, // 5MB
            allowed_mime_types: vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "image/jpg".to_string(),
            ],
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Blank values
    /// count as unset.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(lookup(key));
        let required = |key: &'static str| var(key).ok_or(ConfigError::Missing(key));

        let environment = Environment::from_name(var("APP_ENV").as_deref());

        let endpoint_url = match var("AWS_ENDPOINT_URL") {
            Some(raw) => {
                url::Url::parse(&raw).map_err(|_| ConfigError::Invalid {
                    key: "AWS_ENDPOINT_URL",
                    value: raw.clone(),
                })?;
                Some(raw)
            }
            None => None,
        };

        let visibility = match var("UPLOAD_VISIBILITY").as_deref() {
            None | Some("public") => Visibility::Public,
            Some("private") => Visibility::Private,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "UPLOAD_VISIBILITY",
                    value: other.to_string(),
                })
            }
        };

        // Storage credentials are mandatory; without them uploads cannot work
        let storage = StorageConfig {
            access_key_id: required("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required("AWS_SECRET_ACCESS_KEY")?,
            region: required("AWS_REGION")?,
            bucket: required("AWS_S3_BUCKET")?,
            endpoint_url,
            visibility,
            signed_url_ttl_secs: 3600,
        };

        let mut config = Self {
            environment,
            server: ServerConfig {
                port: 5001,
                cors_origin: var("CORS_ORIGIN"),
            },
            database: DatabaseConfig::from_vars(&lookup)?,
            security: SecurityConfig {
                jwt_secret: var("JWT_SECRET").unwrap_or_default(),
                jwt_expiry_hours: 2,
                bcrypt_cost: 10,
            },
            storage,
            upload: UploadLimits::default(),
        };

        // Numeric overrides
        if let Some(v) = var("PORT") {
            config.server.port = parse("PORT", &v)?;
        }
        if let Some(v) = var("JWT_EXPIRY_HOURS") {
            config.security.jwt_expiry_hours = parse("JWT_EXPIRY_HOURS", &v)?;
        }
        if let Some(v) = var("BCRYPT_COST") {
            config.security.bcrypt_cost = parse("BCRYPT_COST", &v)?;
        }
        if let Some(v) = var("UPLOAD_SIGNED_URL_TTL_SECS") {
            config.storage.signed_url_ttl_secs = parse("UPLOAD_SIGNED_URL_TTL_SECS", &v)?;
        }
        if let Some(v) = var("UPLOAD_MAX_FILES") {
            config.upload.max_files = parse_positive("UPLOAD_MAX_FILES", &v)?;
        }
        if let Some(v) = var("UPLOAD_MAX_FILE_BYTES") {
            config.upload.max_file_bytes = parse_positive("UPLOAD_MAX_FILE_BYTES", &v)?;
        }

        Ok(config)
    }
}

impl DatabaseConfig {
    /// Database settings alone, for commands that never touch storage
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| non_blank(lookup(key));
        let mut database = Self {
            url: var("DATABASE_URL"),
            max_connections: 10,
            connection_timeout: 30,
        };
        if let Some(v) = var("DATABASE_MAX_CONNECTIONS") {
            database.max_connections = parse("DATABASE_MAX_CONNECTIONS", &v)?;
        }
        if let Some(v) = var("DATABASE_CONNECTION_TIMEOUT") {
            database.connection_timeout = parse("DATABASE_CONNECTION_TIMEOUT", &v)?;
        }
        Ok(database)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr + Default + PartialEq,
{
    let parsed: T = parse(key, value)?;
    if parsed == T::default() {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

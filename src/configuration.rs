use config::ConfigError;
use jsonwebtoken::Algorithm;
use std::str::FromStr;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    #[serde(default)]
    pub application: ApplicationSettings,
    #[serde(default)]
    pub redis: RedisSettings,
    #[serde(default)]
    pub jwt: JwtSettings,
    #[serde(default)]
    pub email: EmailSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_app_host")]
    pub host: String,
    #[serde(default = "default_app_port")]
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: default_app_host(),
            port: default_app_port(),
        }
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    #[serde(default = "default_db_username")]
    pub username: String,
    #[serde(default = "default_db_password")]
    pub password: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_db_name")]
    pub database_name: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            username: default_db_username(),
            password: default_db_password(),
            port: default_db_port(),
            host: default_host(),
            database_name: default_db_name(),
        }
    }
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct RedisSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_redis_port(),
        }
    }
}

impl RedisSettings {
    pub fn url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

/// JWT signing settings. The secret has no default on purpose: an unset
/// secret must abort startup rather than fall back to a known value.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    #[serde(default = "default_access_token_expire_minutes")]
    pub access_token_expire_minutes: i64,
    #[serde(default = "default_refresh_token_expire_days")]
    pub refresh_token_expire_days: i64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

impl Default for JwtSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: default_algorithm(),
            access_token_expire_minutes: default_access_token_expire_minutes(),
            refresh_token_expire_days: default_refresh_token_expire_days(),
            issuer: default_issuer(),
        }
    }
}

impl JwtSettings {
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_expire_minutes * 60
    }

    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_expire_days * 24 * 60 * 60
    }

    /// Parse the configured algorithm name. Only the HMAC family is
    /// accepted since signing uses a shared secret.
    pub fn signing_algorithm(&self) -> Result<Algorithm, ConfigError> {
        let algorithm = Algorithm::from_str(&self.algorithm).map_err(|_| {
            ConfigError::Message(format!("unknown signing algorithm: {}", self.algorithm))
        })?;
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
            _ => Err(ConfigError::Message(format!(
                "signing algorithm {} requires key material this service does not manage; use HS256, HS384 or HS512",
                self.algorithm
            ))),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::Message(
                "signing secret is not set; provide SECRET_KEY_JWT or jwt.secret".to_string(),
            ));
        }
        self.signing_algorithm()?;
        if self.access_token_expire_minutes <= 0 {
            return Err(ConfigError::Message(
                "ACCESS_TOKEN_EXPIRE_MINUTES must be positive".to_string(),
            ));
        }
        if self.refresh_token_expire_days <= 0 {
            return Err(ConfigError::Message(
                "REFRESH_TOKEN_EXPIRE_DAYS must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct EmailSettings {
    #[serde(default = "default_email_base_url")]
    pub base_url: String,
    #[serde(default = "default_email_sender")]
    pub sender: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            base_url: default_email_base_url(),
            sender: default_email_sender(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_app_host() -> String {
    "127.0.0.1".to_string()
}

fn default_app_port() -> u16 {
    8000
}

fn default_db_username() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "password".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "bookshelf".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_algorithm() -> String {
    "HS256".to_string()
}

fn default_access_token_expire_minutes() -> i64 {
    30
}

fn default_refresh_token_expire_days() -> i64 {
    30
}

fn default_issuer() -> String {
    "bookshelf".to_string()
}

fn default_email_base_url() -> String {
    "http://127.0.0.1:8025".to_string()
}

fn default_email_sender() -> String {
    "no-reply@bookshelf.local".to_string()
}

/// Load settings from `configuration.yaml` (optional) and the environment.
///
/// The flat variables `SECRET_KEY_JWT`, `ALGORITHM`,
/// `ACCESS_TOKEN_EXPIRE_MINUTES` and `REFRESH_TOKEN_EXPIRE_DAYS` override the
/// `jwt` section; `REDIS_HOST`/`REDIS_PORT` override the `redis` section.
/// A missing signing secret is a hard error.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .build()?;
    let mut settings = settings.try_deserialize::<Settings>()?;

    if let Ok(secret) = std::env::var("SECRET_KEY_JWT") {
        settings.jwt.secret = secret;
    }
    if let Ok(algorithm) = std::env::var("ALGORITHM") {
        settings.jwt.algorithm = algorithm;
    }
    if let Ok(minutes) = std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES") {
        settings.jwt.access_token_expire_minutes = minutes.parse().map_err(|_| {
            ConfigError::Message("ACCESS_TOKEN_EXPIRE_MINUTES must be an integer".to_string())
        })?;
    }
    if let Ok(days) = std::env::var("REFRESH_TOKEN_EXPIRE_DAYS") {
        settings.jwt.refresh_token_expire_days = days.parse().map_err(|_| {
            ConfigError::Message("REFRESH_TOKEN_EXPIRE_DAYS must be an integer".to_string())
        })?;
    }
    if let Ok(host) = std::env::var("REDIS_HOST") {
        settings.redis.host = host;
    }
    if let Ok(port) = std::env::var("REDIS_PORT") {
        settings.redis.port = port
            .parse()
            .map_err(|_| ConfigError::Message("REDIS_PORT must be a port number".to_string()))?;
    }

    settings.jwt.validate()?;
    Ok(settings)
}

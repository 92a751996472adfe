use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or, env_required};

/// Placeholder in `DATABASE` replaced by `DATABASE_PASSWORD`
pub const PASSWORD_PLACEHOLDER: &str = "<PASSWORD>";

pub const DEFAULT_DATABASE_NAME: &str = "natours";

/// MongoDB connection settings
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Connection string with any password already substituted
    pub url: String,
    pub database: String,
    /// Reported to the server in connection metadata
    pub app_name: Option<String>,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Connection string safe for logs, with credentials masked.
    pub fn redacted_url(&self) -> String {
        match (self.url.find("://"), self.url.rfind('@')) {
            (Some(scheme_end), Some(at)) if at > scheme_end => {
                format!("{}://***@{}", &self.url[..scheme_end], &self.url[at + 1..])
            }
            _ => self.url.clone(),
        }
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: DEFAULT_DATABASE_NAME.to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
        }
    }
}

/// Substitute `<PASSWORD>` in a connection string.
pub fn substitute_password(url: &str, password: Option<&str>) -> String {
    match password {
        Some(password) => url.replace(PASSWORD_PLACEHOLDER, password),
        None => url.to_string(),
    }
}

/// Environment variables:
/// - `DATABASE` (required): connection string, may contain `<PASSWORD>`
/// - `DATABASE_PASSWORD`: substituted into `<PASSWORD>`
/// - `DATABASE_NAME` (default: natours)
/// - `MONGODB_APP_NAME`
/// - `MONGODB_MAX_POOL_SIZE` (default: 100), `MONGODB_MIN_POOL_SIZE` (default: 5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env_required("DATABASE")?;
        let password = std::env::var("DATABASE_PASSWORD").ok();

        if raw_url.contains(PASSWORD_PLACEHOLDER) && password.is_none() {
            return Err(ConfigError::MissingEnvVar("DATABASE_PASSWORD".to_string()));
        }

        let defaults = Self::default();

        Ok(Self {
            url: substitute_password(&raw_url, password.as_deref()),
            database: env_or_default("DATABASE_NAME", DEFAULT_DATABASE_NAME),
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size: env_parse_or("MONGODB_MAX_POOL_SIZE", defaults.max_pool_size)?,
            min_pool_size: env_parse_or("MONGODB_MIN_POOL_SIZE", defaults.min_pool_size)?,
            connect_timeout_secs: env_parse_or(
                "MONGODB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout_secs,
            )?,
            server_selection_timeout_secs: env_parse_or(
                "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
                defaults.server_selection_timeout_secs,
            )?,
        })
    }
}

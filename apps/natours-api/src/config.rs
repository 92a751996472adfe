use axum_helpers::{HttpConfig, JwtConfig};
use core_config::{AppInfo, FromEnv, app_info};
use database::mongodb::MongoConfig;
use domain_notifications::EmailConfig;

pub use core_config::Environment;

/// Application configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub environment: Environment,
    pub mongodb: MongoConfig,
    pub http: HttpConfig,
    pub jwt: JwtConfig,
    pub email: EmailConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        Ok(Self {
            app: app_info!(),
            environment: Environment::from_env(),
            mongodb: MongoConfig::from_env()?,
            http: HttpConfig::from_env()?,
            jwt: JwtConfig::from_env()?,
            email: EmailConfig::from_env()?,
        })
    }
}

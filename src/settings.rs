use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Postgres {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Platform {
    pub url: String,
    pub auth_token: String,
    pub main_account_id: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthService {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notifier {
    pub event_url: String,
    pub mailer_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Otp {
    pub secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bonus {
    pub scan_interval_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub postgres: Postgres,
    pub server: Server,
    pub platform: Platform,
    pub auth: AuthService,
    pub notifier: Notifier,
    pub otp: Otp,
    pub bonus: Bonus,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config.toml"))
            .build()?;

        config.try_deserialize()
    }
}

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Runtime settings, read from the process environment
/// (`DATABASE_URL`, `LISTEN_ADDR`, `RUN_MIGRATIONS`).
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub listen_addr: String,
    pub run_migrations: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(Environment::default().try_parsing(true))
    }

    fn load(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("listen_addr", "0.0.0.0:3000")?
            .set_default("run_migrations", true)?
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

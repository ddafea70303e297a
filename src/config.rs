use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub telemetry: TelemetryConfig,
    pub clock: ClockConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub rust_log: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClockConfig {
    pub tick_millis: u64,
}

impl ClockConfig {
    /// Period between two timer ticks.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self { tick_millis: 1000 }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")?;
        let max_connections: u32 = optional_var("DATABASE_MAX_CONNECTIONS", 5)?;
        let acquire_timeout_secs: u64 = optional_var("DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let tick_millis: u64 = optional_var("MATCH_TICK_MILLIS", 1000)?;

        if tick_millis == 0 {
            anyhow::bail!("MATCH_TICK_MILLIS must be greater than zero");
        }

        Ok(Config {
            database: DatabaseConfig {
                url: database_url,
                max_connections,
                acquire_timeout_secs,
            },
            telemetry: TelemetryConfig { rust_log },
            clock: ClockConfig { tick_millis },
        })
    }
}

fn optional_var<T>(key: &str, default: T) -> Result<T, anyhow::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}

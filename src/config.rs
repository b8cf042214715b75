use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Seconds between keep-alive heartbeats on live streams.
    /// Set via WORKHUB_KEEPALIVE_SECS. Default: 30.
    pub keepalive_secs: u64,
    /// Maximum rows returned by the recent-notifications listing.
    /// Set via WORKHUB_RECENT_LIMIT. Default: 50.
    pub recent_limit: i64,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    Ok(Config {
        port: std::env::var("WORKHUB_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/workhub".into()),
        keepalive_secs: std::env::var("WORKHUB_KEEPALIVE_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30),
        recent_limit: std::env::var("WORKHUB_RECENT_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(50),
    })
}

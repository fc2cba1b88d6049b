// ABOUTME: Environment-driven server configuration
// ABOUTME: Port, CORS origin, database URL, and the optional job-bus endpoint

use std::env;

// Environment variable names
pub const INKLINE_API_PORT: &str = "INKLINE_API_PORT";
pub const INKLINE_CORS_ORIGIN: &str = "INKLINE_CORS_ORIGIN";
pub const INKLINE_DATABASE_URL: &str = "INKLINE_DATABASE_URL";
pub const INKLINE_JOB_BUS_URL: &str = "INKLINE_JOB_BUS_URL";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub cors_origin: String,
    pub database_url: String,
    /// Event-bus endpoint; when unset, submissions are recorded in memory
    pub job_bus_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var(INKLINE_API_PORT)
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(4870);

        let cors_origin = env::var(INKLINE_CORS_ORIGIN)
            .unwrap_or_else(|_| format!("http://localhost:{port}"));

        let database_url = env::var(INKLINE_DATABASE_URL)
            .unwrap_or_else(|_| "sqlite://inkline.db".to_string());

        let job_bus_url = env::var(INKLINE_JOB_BUS_URL).ok();

        Config {
            port,
            cors_origin,
            database_url,
            job_bus_url,
        }
    }
}

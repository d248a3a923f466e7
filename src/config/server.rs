use super::env_or;
use crate::core::Result;
use serde::Deserialize;
use std::env;

/// Server configuration for HTTP server
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
    /// Allowed browser origin for CORS
    pub frontend_origin: String,
}

impl ServerConfig {
    pub fn new(host: String, port: u16) -> Self {
        Self {
            host,
            port,
            workers: num_cpus::get() * 2, // 2x CPU cores for I/O-bound workload
            frontend_origin: "http://localhost:5173".to_string(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(
            env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            env_or("SERVER_PORT", "8000")?,
        );
        config.workers = env_or("SERVER_WORKERS", &config.workers.to_string())?;
        if let Ok(origin) = env::var("FRONTEND_ORIGIN") {
            config.frontend_origin = origin;
        }
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

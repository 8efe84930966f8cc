use std::net::SocketAddr;

use anyhow::Context;

/// Which graph store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for GraphBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown GRAPH_BACKEND `{other}`"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: GraphBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub environment: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let backend = std::env::var("GRAPH_BACKEND")
            .ok()
            .map(|v| v.parse::<GraphBackend>())
            .transpose()?
            .unwrap_or(GraphBackend::Postgres);

        let database_url = std::env::var("DATABASE_URL").ok();
        if backend == GraphBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when GRAPH_BACKEND=postgres");
        }

        let port = match std::env::var("APP_PORT") {
            Ok(v) => v.parse::<u16>().context("APP_PORT must be a port number")?,
            Err(_) => 3000,
        };

        Ok(Self {
            backend,
            database_url,
            max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port,
            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
        })
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

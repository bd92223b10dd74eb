use smartsense_core::classify::Thresholds;

/// Server configuration loaded from environment variables.
///
/// Everything except the danger gas threshold has a default suitable for
/// local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Classification thresholds used by the ingestion gateway.
    pub thresholds: Thresholds,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `8000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `DANGER_GAS_PPM`       | required                   |
    ///
    /// Deployments have used both 500 and 1000 ppm as the danger gas bound,
    /// so there is no default: the operator must pick one.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let danger_gas_ppm: u32 = std::env::var("DANGER_GAS_PPM")
            .expect("DANGER_GAS_PPM must be set (500 or 1000 are the usual choices)")
            .parse()
            .expect("DANGER_GAS_PPM must be a valid u32");

        let thresholds = Thresholds::new(danger_gas_ppm)
            .unwrap_or_else(|e| panic!("Invalid DANGER_GAS_PPM: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            thresholds,
        }
    }
}

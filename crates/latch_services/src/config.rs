//! Host/port configuration for the simulation service binary (§6,
//! "Environment / CLI").

use std::env;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 4884;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
}

impl ServiceConfig {
    /// Read `LATCH_SIM_HOST` / `LATCH_SIM_PORT`, falling back to the
    /// loopback host and a fixed default port. An unparseable port falls
    /// back to the default rather than failing startup.
    pub fn from_env() -> Self {
        let host = env::var("LATCH_SIM_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string());
        let port = env::var("LATCH_SIM_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        ServiceConfig { host, port }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_loopback_and_fixed_port() {
        assert_eq!(ServiceConfig::default(), ServiceConfig {
            host: "127.0.0.1".to_string(),
            port: 4884,
        });
    }
}

//! Shared environment configuration for the squid binaries.
//!
//! Consolidates `SQUID_PORT`, `SQUID_LOG`, `RAYON_NUM_THREADS` and the
//! collaborator credentials (`GOOGLE_CLIENT_ID`, `STRIPE_SECRET_KEY`,
//! `STRIPE_PRICE_ID`).

use tracing::Level;

use crate::constants::DEFAULT_PORT;

/// Settings of the HTTP service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub google_client_id: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub stripe_price_id: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            port: var("SQUID_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            google_client_id: var("GOOGLE_CLIENT_ID"),
            stripe_secret_key: var("STRIPE_SECRET_KEY"),
            stripe_price_id: var("STRIPE_PRICE_ID"),
        }
    }
}

/// Read `SQUID_LOG` (default `info`).
pub fn log_level() -> Level {
    std::env::var("SQUID_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Level::INFO)
}

/// Install the global `fmt` subscriber. A second call is a no-op.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(log_level())
        .try_init();
}

/// Read `RAYON_NUM_THREADS` and build the global pool, tolerating an
/// already-initialized one. Returns the thread count in use.
pub fn init_rayon_threads_lenient() -> usize {
    if let Some(num_threads) = std::env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
    {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok();
    }
    rayon::current_num_threads()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.google_client_id, None);
        assert_eq!(cfg.stripe_secret_key, None);
    }

    #[test]
    fn test_reads_values_and_ignores_blank() {
        let cfg = ServerConfig::from_lookup(lookup(&[
            ("SQUID_PORT", "8081"),
            ("GOOGLE_CLIENT_ID", "client.apps"),
            ("STRIPE_SECRET_KEY", "  "),
            ("STRIPE_PRICE_ID", "price_1"),
        ]));
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.google_client_id.as_deref(), Some("client.apps"));
        assert_eq!(cfg.stripe_secret_key, None);
        assert_eq!(cfg.stripe_price_id.as_deref(), Some("price_1"));
    }

    #[test]
    fn test_bad_port_falls_back() {
        let cfg = ServerConfig::from_lookup(lookup(&[("SQUID_PORT", "http")]));
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}

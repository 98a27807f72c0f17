//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// HTTP surface configuration: listener and CORS policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub http: HttpConfig,
    pub cors: CorsConfig,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let field = |name: &'static str, reason: &str| ConfigError::Invalid {
            field: name,
            reason: reason.to_string(),
        };

        if self.http.max_body_bytes == 0 {
            return Err(field("http.max_body_bytes", "must be positive"));
        }
        if self.http.request_timeout.is_zero() {
            return Err(field("http.request_timeout", "must be positive"));
        }
        if self.cors.allowed_origins.is_empty() {
            return Err(field("cors.allowed_origins", "list at least one origin or \"*\""));
        }
        if self.cors.allowed_methods.iter().all(|m| !m.eq_ignore_ascii_case("POST")) {
            return Err(field("cors.allowed_methods", "every endpoint is POST"));
        }
        Ok(())
    }

    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// Listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Larger bodies are answered with 413 before parsing.
    pub max_body_bytes: usize,
    /// Per-request deadline, covering provider and ledger round trips.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            max_body_bytes: 16 * 1024,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Cross-origin policy. Wallet front ends call from arbitrary origins, so
/// the default admits all of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// `"*"` admits any origin.
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    /// Preflight cache lifetime in seconds.
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".into()],
            allowed_methods: vec!["POST".into(), "OPTIONS".into()],
            allowed_headers: vec!["Content-Type".into()],
            max_age: 24 * 60 * 60,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// `Duration` as a string with a unit suffix (`ms`, `s`, `m`); a bare number
/// is seconds.
pub mod humantime_serde {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    const UNITS: [(&str, u64); 3] = [("ms", 1), ("s", 1_000), ("m", 60_000)];

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        let millis = value.as_millis();
        if millis % 1_000 == 0 {
            s.collect_str(&format_args!("{}s", millis / 1_000))
        } else {
            s.collect_str(&format_args!("{}ms", millis))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        parse_duration(&raw).map_err(de::Error::custom)
    }

    pub fn parse_duration(raw: &str) -> Result<Duration, String> {
        let raw = raw.trim();
        // "ms" must be tried before "s"
        let (digits, scale) = UNITS
            .iter()
            .find_map(|(suffix, scale)| raw.strip_suffix(suffix).map(|d| (d, *scale)))
            .unwrap_or((raw, 1_000));

        digits
            .trim()
            .parse::<u64>()
            .ok()
            .and_then(|n| n.checked_mul(scale))
            .map(Duration::from_millis)
            .ok_or_else(|| format!("invalid duration {:?}", raw))
    }
}

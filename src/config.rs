//! Server and client configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`). Pool capacity is a compile-time
//! constant and deliberately not configurable.

use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::TesseraError;

/// Default server bind address.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";

/// Default address the client dials.
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:8080";

/// Default capacity of the event bus ring buffer.
pub const DEFAULT_EVENT_BUS_CAPACITY: usize = 1024;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-field lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(TesseraError::Config(format!("unknown LOG_FORMAT `{other}`"))),
        }
    }
}

/// Top-level server configuration.
///
/// Loaded once at startup via [`ServerConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind the listener to (e.g. `0.0.0.0:8080`).
    pub listen_addr: SocketAddr,

    /// Capacity of the event bus broadcast channel.
    pub event_bus_capacity: usize,

    /// Log output format.
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults when a variable is not set. Calls
    /// `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Config`] if `LISTEN_ADDR` or `LOG_FORMAT` is
    /// set but cannot be parsed.
    pub fn from_env() -> Result<Self, TesseraError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TesseraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let listen_addr = parse_addr(&lookup, "LISTEN_ADDR", DEFAULT_LISTEN_ADDR)?;
        let event_bus_capacity =
            parse_or_default(&lookup, "EVENT_BUS_CAPACITY", DEFAULT_EVENT_BUS_CAPACITY);
        let log_format = parse_log_format(&lookup)?;

        Ok(Self {
            listen_addr,
            event_bus_capacity,
            log_format,
        })
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the tessera server.
    pub server_addr: SocketAddr,

    /// Log output format.
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`TesseraError::Config`] if `SERVER_ADDR` or `LOG_FORMAT` is
    /// set but cannot be parsed.
    pub fn from_env() -> Result<Self, TesseraError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`ClientConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TesseraError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server_addr: parse_addr(&lookup, "SERVER_ADDR", DEFAULT_SERVER_ADDR)?,
            log_format: parse_log_format(&lookup)?,
        })
    }
}

fn parse_addr<F>(lookup: &F, key: &str, default: &str) -> Result<SocketAddr, TesseraError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key).unwrap_or_else(|| default.to_string());
    raw.parse()
        .map_err(|err| TesseraError::Config(format!("{key}=`{raw}`: {err}")))
}

fn parse_log_format<F>(lookup: &F) -> Result<LogFormat, TesseraError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LOG_FORMAT").map_or(Ok(LogFormat::default()), |raw| raw.parse())
}

/// Parses a variable as `T`, returning `default` on missing or invalid
/// values.
fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

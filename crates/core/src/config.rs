use std::collections::HashMap;
use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u32(profile: &str, key: &str, default: u32) -> u32 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub postgres: PostgresConfig,
    pub alarm: AlarmConfig,
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Build config for a named profile (call `load_dotenv()` first).
    /// With a profile such as `PROD`, every key is first looked up as
    /// `{PROFILE}_{KEY}`, falling back to `{KEY}`. Empty string = default.
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            postgres: PostgresConfig::from_env_profiled(p),
            alarm: AlarmConfig::from_env_profiled(p),
            delivery: DeliveryConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:      {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  postgres:    host={}, db={}, configured={}",
            self.postgres.host,
            self.postgres.database,
            self.postgres.is_configured()
        );
        tracing::info!(
            "  alarm:       tick={}s, batch={}, shutdown={}s",
            self.alarm.tick_secs,
            self.alarm.batch_size,
            self.alarm.shutdown_secs
        );
        tracing::info!(
            "  delivery:    callback={}, headers={:?}",
            if self.delivery.is_configured() { "configured" } else { "(log only)" },
            self.delivery.callback_headers.keys().collect::<Vec<_>>()
        );
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3002),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ── PostgreSQL ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: String,
    pub max_connections: u32,
}

impl PostgresConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "PG_HOST", "localhost"),
            port: profiled_env_u16(p, "PG_PORT", 5432),
            database: profiled_env_or(p, "PG_DATABASE", "deadline"),
            username: profiled_env_opt(p, "PG_USERNAME"),
            password: profiled_env_opt(p, "PG_PASSWORD"),
            ssl_mode: profiled_env_or(p, "PG_SSL_MODE", "prefer"),
            max_connections: profiled_env_u32(p, "PG_MAX_CONNECTIONS", 10),
        }
    }

    pub fn database_url(&self) -> String {
        let user = self.username.as_deref().unwrap_or("postgres");
        let pass = self.password.as_deref().unwrap_or("");
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            user, pass, self.host, self.port, self.database, self.ssl_mode
        )
    }

    pub fn is_configured(&self) -> bool {
        self.username.is_some()
    }
}

// ── Alarm scheduler ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    /// Seconds between reconcile passes.
    pub tick_secs: u64,
    /// Maximum due alarms loaded per pass.
    pub batch_size: u32,
    /// Grace period granted to an in-flight pass on shutdown.
    pub shutdown_secs: u64,
}

impl AlarmConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            tick_secs: profiled_env_u64(p, "ALARM_TICK_SECS", 60),
            batch_size: profiled_env_u32(p, "ALARM_BATCH_SIZE", 1024),
            shutdown_secs: profiled_env_u64(p, "ALARM_SHUTDOWN_SECS", 10),
        }
    }
}

// ── Delivery callback ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Endpoint of the external notification-dispatch service.
    pub callback_url: Option<String>,
    /// Extra request headers; values may reference `${VAR}`.
    pub callback_headers: HashMap<String, String>,
}

impl DeliveryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            callback_url: profiled_env_opt(p, "DELIVERY_CALLBACK_URL"),
            callback_headers: profiled_env_opt(p, "DELIVERY_CALLBACK_HEADERS")
                .map(|raw| parse_headers(&raw))
                .unwrap_or_default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.callback_url.is_some()
    }
}

/// Parse `Name:Value,Name2:Value2`. Entries without a name are skipped.
fn parse_headers(raw: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    for entry in raw.split(',') {
        match entry.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                headers.insert(name.trim().to_string(), value.trim().to_string());
            }
            _ if entry.trim().is_empty() => {}
            _ => tracing::warn!(entry = entry.trim(), "ignoring malformed callback header"),
        }
    }
    headers
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub autosave: AutosaveConfig,
    pub sync: SyncConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutosaveConfig {
    pub enabled: bool,
    pub quiet_period_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    /// 0 keeps failed operations forever.
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            autosave: AutosaveConfig::default(),
            sync: SyncConfig::default(),
            remote: RemoteConfig::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: 5,
            connection_timeout: 30,
        }
    }
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet_period_ms: 1000,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync: true,
            sync_interval: 300, // 5 minutes
            max_attempts: 0,
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            request_timeout: 15,
        }
    }
}

impl AutosaveConfig {
    pub fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}

impl SyncConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.sync_interval)
    }

    pub fn max_attempts(&self) -> Option<u32> {
        if self.max_attempts == 0 {
            None
        } else {
            Some(self.max_attempts)
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("STOIC_DATABASE_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.database.url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("STOIC_DATABASE_MAX_CONNECTIONS")
            && let Some(value) = parse_u32(&v)
        {
            cfg.database.max_connections = value;
        }

        if let Ok(v) = std::env::var("STOIC_AUTOSAVE_ENABLED") {
            cfg.autosave.enabled = parse_bool(&v, cfg.autosave.enabled);
        }
        if let Ok(v) = std::env::var("STOIC_AUTOSAVE_QUIET_MS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.autosave.quiet_period_ms = value;
        }

        if let Ok(v) = std::env::var("STOIC_SYNC_AUTO") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("STOIC_SYNC_INTERVAL_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.sync.sync_interval = value.max(1);
        }
        if let Ok(v) = std::env::var("STOIC_SYNC_MAX_ATTEMPTS")
            && let Some(value) = parse_u32(&v)
        {
            cfg.sync.max_attempts = value;
        }

        if let Ok(v) = std::env::var("STOIC_REMOTE_URL") {
            cfg.remote.base_url = non_empty(v);
        }
        if let Ok(v) = std::env::var("STOIC_REMOTE_API_KEY") {
            cfg.remote.api_key = non_empty(v);
        }
        if let Ok(v) = std::env::var("STOIC_REMOTE_TIMEOUT_SECS")
            && let Some(value) = parse_u64(&v)
        {
            cfg.remote.request_timeout = value;
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.autosave.quiet_period_ms == 0 {
            return Err("Autosave quiet_period_ms must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        if self.remote.request_timeout == 0 {
            return Err("Remote request_timeout must be greater than 0".to_string());
        }
        if let Some(url) = &self.remote.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(format!("Remote base_url must be an http(s) URL: {url}"));
        }
        Ok(())
    }
}

fn default_database_url() -> String {
    match dirs::data_dir() {
        Some(dir) => format!(
            "sqlite://{}?mode=rwc",
            dir.join("stoic-offline").join("offline.db").display()
        ),
        None => "sqlite://./data/offline.db?mode=rwc".to_string(),
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::network::ReconnectPolicy;
use crate::network::client::TransportOptions;

pub const DEFAULT_CONFIG_PATH: &str = "config/viewx.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Broker endpoint. Derived from `api_base_url` when unset.
    pub ws_url: Option<String>,
    /// Front-end index page polled for new builds.
    pub frontend_index_url: Option<String>,
    pub request_timeout_secs: u64,
    pub reconnect_base_delay_ms: u64,
    pub max_reconnect_attempts: u32,
    pub heartbeat_ms: u64,
    pub typing_window_ms: u64,
    pub history_page_size: u32,
    pub desktop_notifications: bool,
    pub version_check_interval_secs: u64,
    pub client_version: String,
    pub data_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            ws_url: None,
            frontend_index_url: None,
            request_timeout_secs: 10,
            reconnect_base_delay_ms: 3000,
            max_reconnect_attempts: 5,
            heartbeat_ms: 4000,
            typing_window_ms: 3000,
            history_page_size: 50,
            desktop_notifications: false,
            version_check_interval_secs: 300,
            client_version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::from("data"),
        }
    }
}

impl ClientConfig {
    /// `ws://host/api/ws/websocket` for an `http://host/api` base. The
    /// broker endpoint sits under the API context path.
    pub fn websocket_url(&self) -> String {
        if let Some(url) = &self.ws_url {
            return url.clone();
        }
        let base = self.api_base_url.trim_end_matches('/');
        let base = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base.to_string()
        };
        format!("{base}/ws/websocket")
    }

    /// Index page of the deployed front-end; the API origin unless configured.
    pub fn index_url(&self) -> String {
        if let Some(url) = &self.frontend_index_url {
            return url.clone();
        }
        let base = self.api_base_url.trim_end_matches('/');
        let origin = base.strip_suffix("/api").unwrap_or(base);
        format!("{origin}/")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn typing_window(&self) -> Duration {
        Duration::from_millis(self.typing_window_ms)
    }

    pub fn version_check_interval(&self) -> Duration {
        Duration::from_secs(self.version_check_interval_secs)
    }

    pub fn transport_options(&self) -> TransportOptions {
        TransportOptions {
            reconnect: ReconnectPolicy {
                base_delay: Duration::from_millis(self.reconnect_base_delay_ms),
                max_attempts: self.max_reconnect_attempts,
            },
            heartbeat: Duration::from_millis(self.heartbeat_ms),
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("client.db")
    }

    /// Applies `VIEWX_*` overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("VIEWX_API_BASE_URL") {
            self.api_base_url = url;
        }
        if let Some(url) = lookup("VIEWX_WS_URL") {
            self.ws_url = Some(url);
        }
        if let Some(dir) = lookup("VIEWX_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("VIEWX_DESKTOP_NOTIFICATIONS") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.desktop_notifications = true,
                "0" | "false" | "no" | "off" => self.desktop_notifications = false,
                other => log::warn!("Ignoring VIEWX_DESKTOP_NOTIFICATIONS={other}"),
            }
        }
    }
}

pub fn load_config(path: &str) -> ClientConfig {
    let path = Path::new(path);
    let mut config = match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<ClientConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                ClientConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            ClientConfig::default()
        }
    };
    config.apply_env();
    config
}

pub fn save_config(path: &str, config: &ClientConfig) -> std::io::Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}

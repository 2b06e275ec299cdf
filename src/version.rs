//! Update detection.
//!
//! Two signals are polled: the build hash embedded in the deployed front-end
//! index page, and the server's `/system/check-update` answer for the
//! running client version.

use std::cmp::Ordering;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use reqwest::header::CACHE_CONTROL;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::api::system::{SystemApi, SystemVersionInfo, UpdateType};
use crate::api::ApiError;
use crate::notify::{NoticeLevel, Notifier};

static BUILD_HASH: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"/assets/index-([a-f0-9]+)\.js").ok());

/// Build hash of the bundle referenced by an index page.
pub fn extract_build_hash(html: &str) -> Option<&str> {
    BUILD_HASH
        .as_ref()?
        .captures(html)?
        .get(1)
        .map(|hash| hash.as_str())
}

/// Compares dotted numeric versions; missing or non-numeric parts count as 0.
pub fn compare_version(a: &str, b: &str) -> Ordering {
    let parse = |version: &str| -> Vec<u64> {
        version
            .trim()
            .split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let (left, right) = (parse(a), parse(b));
    let len = left.len().max(right.len());
    (0..len)
        .map(|i| {
            let l = left.get(i).copied().unwrap_or(0);
            let r = right.get(i).copied().unwrap_or(0);
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

pub fn update_type_label(update_type: Option<UpdateType>) -> &'static str {
    match update_type {
        Some(UpdateType::Major) => "Major update",
        Some(UpdateType::Minor) => "Feature update",
        Some(UpdateType::Patch) => "Patch update",
        None => "Update",
    }
}

pub struct VersionChecker {
    system: SystemApi,
    http: reqwest::Client,
    index_url: String,
    current_version: String,
    notifier: Arc<dyn Notifier>,
    initial_hash: Option<String>,
}

impl VersionChecker {
    /// `timeout` bounds each index-page fetch, like the API requests.
    pub fn new(
        system: SystemApi,
        index_url: impl Into<String>,
        current_version: impl Into<String>,
        notifier: Arc<dyn Notifier>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            system,
            http: reqwest::Client::builder().timeout(timeout).build()?,
            index_url: index_url.into(),
            current_version: current_version.into(),
            notifier,
            initial_hash: None,
        })
    }

    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// Records the build hash that later checks compare against.
    pub async fn init(&mut self) {
        self.initial_hash = self.build_hash().await;
        log::debug!("Front-end build hash at start: {:?}", self.initial_hash);
    }

    async fn build_hash(&self) -> Option<String> {
        let url = format!(
            "{}?{}",
            self.index_url,
            chrono::Utc::now().timestamp_millis()
        );
        let response = self
            .http
            .get(&url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await;
        let html = match response {
            Ok(response) => response.text().await,
            Err(err) => Err(err),
        };
        match html {
            Ok(html) => extract_build_hash(&html).map(str::to_string),
            Err(err) => {
                log::warn!("Failed to fetch build hash from {}: {err}", self.index_url);
                None
            }
        }
    }

    /// One polling round. A changed build hash wins over the server check;
    /// failures are logged only.
    pub async fn check_for_updates(&self) -> Option<SystemVersionInfo> {
        if let Some(hash) = self.build_hash().await {
            if self.initial_hash.as_deref().is_some_and(|initial| initial != hash) {
                self.notifier.notify(
                    NoticeLevel::Warning,
                    "A new version is available, restart to get the best experience",
                );
                return None;
            }
        }

        match self.system.poll_update(Some(&self.current_version)).await {
            Ok(Some(info)) => {
                self.announce(&info);
                Some(info)
            }
            Ok(None) => None,
            Err(err) => {
                log::warn!("Update check failed: {err}");
                None
            }
        }
    }

    /// User-initiated check; always reports an outcome.
    pub async fn manual_check(&self) -> Result<Option<SystemVersionInfo>, ApiError> {
        match self.system.poll_update(Some(&self.current_version)).await {
            Ok(Some(info)) => {
                let mut message = format!(
                    "New version available\nCurrent version: {}\nLatest version: {}\nUpdate type: {}",
                    self.current_version,
                    info.version,
                    update_type_label(info.update_type)
                );
                if let Some(build_time) = &info.build_time {
                    message.push_str(&format!("\nReleased: {build_time}"));
                }
                if let Some(log) = info.update_log.as_deref().filter(|log| !log.is_empty()) {
                    message.push_str(&format!("\nChanges:\n{log}"));
                }
                self.notifier.notify(NoticeLevel::Info, &message);
                Ok(Some(info))
            }
            Ok(None) => {
                self.notifier.notify(
                    NoticeLevel::Success,
                    &format!("Version {} is up to date", self.current_version),
                );
                Ok(None)
            }
            Err(err) => {
                self.notifier.notify(
                    NoticeLevel::Error,
                    "Unable to reach the server, please try again later",
                );
                Err(err)
            }
        }
    }

    /// Tells the server the client is moving to `info.version`.
    pub async fn perform_upgrade(&self, info: &SystemVersionInfo) {
        if let Err(err) = self
            .system
            .perform_upgrade(&self.current_version, &info.version)
            .await
        {
            log::error!("Upgrade hook failed: {err}");
        }
    }

    fn announce(&self, info: &SystemVersionInfo) {
        let mut message = format!(
            "New version {} ({})",
            info.version,
            update_type_label(info.update_type)
        );
        if let Some(log) = info.update_log.as_deref().filter(|log| !log.is_empty()) {
            message.push('\n');
            message.push_str(log);
        }
        let level = if info.force_update {
            NoticeLevel::Error
        } else {
            NoticeLevel::Info
        };
        self.notifier.notify(level, &message);
    }

    /// Polls every `interval` on a background task.
    pub fn spawn(mut self, interval: Duration) -> VersionPoller {
        let interval = interval.max(Duration::from_secs(1));
        let handle = tokio::spawn(async move {
            self.init().await;
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.check_for_updates().await;
            }
        });
        VersionPoller { handle }
    }
}

/// Running poll loop; dropping it stops polling too.
pub struct VersionPoller {
    handle: JoinHandle<()>,
}

impl VersionPoller {
    pub fn stop(self) {
        self.handle.abort();
    }
}

impl Drop for VersionPoller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

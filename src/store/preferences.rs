use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::storage::{KvStore, StorageError};

const VOLUME_KEY: &str = "viewx_video_volume";
const PLAYBACK_RATE_KEY: &str = "viewx_video_playback_rate";
const MUTED_KEY: &str = "viewx_video_muted";
const VIEW_MODE_KEY: &str = "viewx_home_view_mode";

/// Video player settings shared by every player instance.
pub struct PlayerPreferences {
    kv: Arc<KvStore>,
    volume: f64,
    playback_rate: f64,
    muted: bool,
}

impl PlayerPreferences {
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self {
            kv,
            volume: 1.0,
            playback_rate: 1.0,
            muted: false,
        }
    }

    /// Built from saved values.
    pub fn load(kv: Arc<KvStore>) -> Self {
        let mut preferences = Self::new(kv);
        preferences.restore();
        preferences
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Clamped to `[0, 1]`.
    pub fn set_volume(&mut self, volume: f64) -> Result<(), StorageError> {
        self.volume = if volume.is_nan() {
            0.0
        } else {
            volume.clamp(0.0, 1.0)
        };
        self.kv.set(VOLUME_KEY, &self.volume.to_string())
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> Result<(), StorageError> {
        self.playback_rate = rate;
        self.kv.set(PLAYBACK_RATE_KEY, &rate.to_string())
    }

    pub fn toggle_mute(&mut self) -> Result<bool, StorageError> {
        self.muted = !self.muted;
        self.kv.set(MUTED_KEY, &self.muted.to_string())?;
        Ok(self.muted)
    }

    /// Reads saved values; missing or unparseable ones keep the current value.
    pub fn restore(&mut self) {
        if let Some(volume) = self.read::<f64>(VOLUME_KEY) {
            self.volume = volume;
        }
        if let Some(rate) = self.read::<f64>(PLAYBACK_RATE_KEY) {
            self.playback_rate = rate;
        }
        if let Some(muted) = self.read::<bool>(MUTED_KEY) {
            self.muted = muted;
        }
    }

    fn read<T: FromStr>(&self, key: &str) -> Option<T> {
        match self.kv.get(key) {
            Ok(raw) => raw.and_then(|raw| raw.trim().parse().ok()),
            Err(err) => {
                log::warn!("Failed to read preference {key}: {err}");
                None
            }
        }
    }
}

/// Home page layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Grid,
    Feed,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Feed => "feed",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Grid => Self::Feed,
            Self::Feed => Self::Grid,
        }
    }

    /// Saved mode, `Grid` when unset or unrecognized.
    pub fn load(kv: &KvStore) -> Self {
        kv.get(VIEW_MODE_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_default()
    }

    pub fn save(self, kv: &KvStore) -> Result<(), StorageError> {
        kv.set(VIEW_MODE_KEY, self.as_str())
    }

    /// Flips and persists the saved mode.
    pub fn toggle(kv: &KvStore) -> Result<Self, StorageError> {
        let mode = Self::load(kv).toggled();
        mode.save(kv)?;
        Ok(mode)
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "grid" => Ok(Self::Grid),
            "feed" => Ok(Self::Feed),
            other => Err(format!("unknown view mode `{other}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv() -> Arc<KvStore> {
        Arc::new(KvStore::in_memory().unwrap())
    }

    #[test]
    fn volume_is_clamped_and_persisted() {
        let kv = kv();
        let mut player = PlayerPreferences::new(Arc::clone(&kv));

        player.set_volume(1.7).unwrap();
        assert_eq!(player.volume(), 1.0);
        player.set_volume(-0.2).unwrap();
        assert_eq!(player.volume(), 0.0);
        player.set_volume(0.35).unwrap();

        assert_eq!(kv.get(VOLUME_KEY).unwrap().as_deref(), Some("0.35"));
    }

    #[test]
    fn settings_survive_a_restore() {
        let kv = kv();
        let mut player = PlayerPreferences::new(Arc::clone(&kv));
        player.set_volume(0.5).unwrap();
        player.set_playback_rate(1.5).unwrap();
        assert!(player.toggle_mute().unwrap());

        let restored = PlayerPreferences::load(kv);
        assert_eq!(restored.volume(), 0.5);
        assert_eq!(restored.playback_rate(), 1.5);
        assert!(restored.is_muted());
    }

    #[test]
    fn garbage_values_are_ignored() {
        let kv = kv();
        kv.set(VOLUME_KEY, "loud").unwrap();
        kv.set(MUTED_KEY, "yes").unwrap();
        kv.set(PLAYBACK_RATE_KEY, "2").unwrap();

        let player = PlayerPreferences::load(kv);
        assert_eq!(player.volume(), 1.0);
        assert!(!player.is_muted());
        assert_eq!(player.playback_rate(), 2.0);
    }

    #[test]
    fn view_mode_defaults_to_grid_and_toggles() {
        let kv = kv();
        assert_eq!(ViewMode::load(&kv), ViewMode::Grid);

        assert_eq!(ViewMode::toggle(&kv).unwrap(), ViewMode::Feed);
        assert_eq!(kv.get(VIEW_MODE_KEY).unwrap().as_deref(), Some("feed"));
        assert_eq!(ViewMode::load(&kv), ViewMode::Feed);

        kv.set(VIEW_MODE_KEY, "carousel").unwrap();
        assert_eq!(ViewMode::load(&kv), ViewMode::Grid);
    }
}

use std::{ops::Not, path::PathBuf};

use chrono::NaiveTime;
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl From<Theme> for egui::Visuals {
    fn from(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self::dark(),
            Theme::Light => Self::light(),
        }
    }
}

/// what happens to a sound edit while an alarm is armed
/// the armed alarm captured its sound at schedule time either way
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum SoundEditPolicy {
    /// allow the edit, it only affects the next test or re-schedule
    #[default]
    Cosmetic,
    /// refuse the edit until the alarm is cancelled or fires
    LockWhilePending,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub time_format: String,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_sound")]
    pub alarm_sound: PathBuf,
    #[serde(default)]
    pub sound_edit_policy: SoundEditPolicy,
    /// pre-fills the time input with the next occurrence of this wall-clock time
    #[serde(default = "default_wake_time", with = "toml_datetime_compat")]
    pub default_wake_time: NaiveTime,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            time_format: "%H:%M:%S".to_string(),
            theme: Theme::Dark,
            alarm_sound: default_sound(),
            sound_edit_policy: SoundEditPolicy::default(),
            default_wake_time: default_wake_time(),
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// a missing or unreadable config is not fatal, the defaults are fine
    #[must_use]
    pub fn load_or_default(path: PathBuf) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|err| {
                log::warn!("couldn't parse config file, using defaults: {err}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self, path: PathBuf) {
        let config = toml::to_string(self).expect("couldn't serialize config");
        std::fs::create_dir_all(path.parent().unwrap()).expect("couldn't create config dir");
        std::fs::write(path, config).expect("couldn't write config file");
    }

    #[must_use]
    pub fn config_path() -> PathBuf {
        let mut path = directories::ProjectDirs::from("", "", "larkrise")
            .expect("couldn't get config path")
            .config_dir()
            .to_path_buf();
        path.push("config.toml");
        path
    }

    #[must_use]
    pub fn is_config_present() -> bool {
        Self::config_path().exists()
    }
}

fn default_wake_time() -> NaiveTime {
    NaiveTime::from_hms_opt(7, 0, 0).expect("valid time")
}

/// every OS ships at least one sound that works as an alarm out of the box
#[must_use]
pub fn default_sound() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/System/Library/Sounds/Glass.aiff")
    } else if cfg!(target_os = "windows") {
        PathBuf::from(r"C:\Windows\Media\Alarm01.wav")
    } else {
        PathBuf::from("/usr/share/sounds/freedesktop/stereo/alarm-clock-elapsed.oga")
    }
}

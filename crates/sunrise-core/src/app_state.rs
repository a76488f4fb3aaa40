//! Application state owned by the UI state machine.
//!
//! Everything the renderer needs to know about "where the user is" lives
//! here. The renderer only ever gets a shared reference.

use core::time::Duration;

use crate::config::PersistedSettings;
use crate::time::Timestamp;
use crate::touch::{Calibration, CalibrationCapture};

/// Settings currently in effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub refresh_interval: Duration,
    pub calibration: Calibration,
}

/// Editable copy of the location/interval settings while Settings is open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettingsDraft {
    pub latitude: f64,
    pub longitude: f64,
    pub refresh_interval: Duration,
}

impl SettingsDraft {
    pub fn from_live(settings: &LiveSettings) -> Self {
        Self {
            latitude: settings.latitude,
            longitude: settings.longitude,
            refresh_interval: settings.refresh_interval,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenMode {
    Normal,
    Settings(SettingsDraft),
    /// Calibration keeps the settings draft so BACK can return to it.
    Calibration {
        capture: CalibrationCapture,
        draft: SettingsDraft,
    },
}

/// One-line message shown until the next accepted tap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    SaveFailed,
}

impl Notice {
    pub fn message(&self) -> &'static str {
        match self {
            Notice::SaveFailed => "save failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub settings: LiveSettings,
    /// Colour theme id (0..3).
    pub theme: u8,
    /// Active page on the normal screen (0..3).
    pub page: u8,
    pub mode: ScreenMode,
    pub exit_armed_until: Option<Timestamp>,
    pub exit_requested: bool,
    /// Accepted (non-debounced) touches since start.
    pub touch_count: u32,
    pub notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    /// Build from already sanitized settings.
    pub fn from_settings(settings: &PersistedSettings) -> Self {
        Self {
            settings: LiveSettings {
                latitude: settings.latitude,
                longitude: settings.longitude,
                refresh_interval: settings.refresh_interval(),
                calibration: settings.calibration(),
            },
            theme: settings.theme_id(),
            page: 0,
            mode: ScreenMode::Normal,
            exit_armed_until: None,
            exit_requested: false,
            touch_count: 0,
            notice: None,
            dirty: true,
        }
    }

    /// Snapshot for persistence.
    pub fn to_persisted(&self) -> PersistedSettings {
        Self::persisted_with(&self.settings, self.theme)
    }

    /// Persisted form of `settings` under `theme`, without touching `self`.
    pub fn persisted_with(settings: &LiveSettings, theme: u8) -> PersistedSettings {
        PersistedSettings {
            latitude: settings.latitude,
            longitude: settings.longitude,
            interval_seconds: settings.refresh_interval.as_secs() as i64,
            dark_mode: theme == 1,
            theme: theme as i32,
            cal_x_scale: settings.calibration.x_scale,
            cal_y_scale: settings.calibration.y_scale,
            cal_x_offset: settings.calibration.x_offset,
            cal_y_offset: settings.calibration.y_offset,
        }
    }

    /// Whether the exit confirmation window is open at `now`.
    pub fn exit_armed(&self, now: Timestamp) -> bool {
        matches!(self.exit_armed_until, Some(deadline) if now < deadline)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

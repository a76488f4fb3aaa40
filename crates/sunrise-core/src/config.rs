//! Persisted settings and runtime configuration.
//!
//! [`PersistedSettings`] is what survives a restart, encoded with `postcard`.
//! [`DashboardConfig`] holds the knobs the bootstrap layer sets from the
//! command line and that are never written back.

use alloc::string::String;
use alloc::vec::Vec;
use core::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::time::UtcOffset;
use crate::touch::Calibration;

/// Shortest refresh interval accepted from storage.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(180);

/// Number of colour themes (ids `0..THEME_COUNT`).
pub const THEME_COUNT: u8 = 3;

/// Number of pages on the normal screen.
pub const PAGE_COUNT: u8 = 3;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no stored settings")]
    NotFound,
    #[error("stored settings are malformed: {0}")]
    Malformed(postcard::Error),
    #[error("settings storage failed: {0}")]
    Storage(String),
}

/// Settings as written to storage.
///
/// `dark_mode` predates the theme id and is only consulted when the stored
/// theme is out of range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PersistedSettings {
    pub latitude: f64,
    pub longitude: f64,
    pub interval_seconds: i64,
    pub dark_mode: bool,
    pub theme: i32,
    pub cal_x_scale: f64,
    pub cal_y_scale: f64,
    pub cal_x_offset: f64,
    pub cal_y_offset: f64,
}

impl PersistedSettings {
    /// Fresh settings with the given location and interval, theme 0 and
    /// identity calibration.
    pub fn seeded(latitude: f64, longitude: f64, interval: Duration) -> Self {
        let cal = Calibration::identity();
        Self {
            latitude,
            longitude,
            interval_seconds: interval.as_secs() as i64,
            dark_mode: false,
            theme: 0,
            cal_x_scale: cal.x_scale,
            cal_y_scale: cal.y_scale,
            cal_x_offset: cal.x_offset,
            cal_y_offset: cal.y_offset,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(ConfigError::Malformed)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(ConfigError::Malformed)
    }

    /// Repair out-of-range values. Location fields that are unusable are
    /// taken from `seed`.
    pub fn sanitized(self, seed: &PersistedSettings) -> Self {
        let mut out = self;

        if !(out.latitude.is_finite() && (-90.0..=90.0).contains(&out.latitude)) {
            warn!("stored latitude {} unusable, using {}", out.latitude, seed.latitude);
            out.latitude = seed.latitude;
        }
        if !(out.longitude.is_finite() && (-180.0..=180.0).contains(&out.longitude)) {
            warn!("stored longitude {} unusable, using {}", out.longitude, seed.longitude);
            out.longitude = seed.longitude;
        }

        let min_interval = MIN_REFRESH_INTERVAL.as_secs() as i64;
        if out.interval_seconds < min_interval {
            out.interval_seconds = min_interval;
        }

        if out.theme < 0 || out.theme >= THEME_COUNT as i32 {
            out.theme = if out.dark_mode { 1 } else { 0 };
        }

        let cal = self.calibration().sanitized();
        out.cal_x_scale = cal.x_scale;
        out.cal_y_scale = cal.y_scale;
        out.cal_x_offset = cal.x_offset;
        out.cal_y_offset = cal.y_offset;
        out
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(0) as u64)
    }

    /// Theme id clamped into range.
    pub fn theme_id(&self) -> u8 {
        self.theme.clamp(0, THEME_COUNT as i32 - 1) as u8
    }

    pub fn calibration(&self) -> Calibration {
        Calibration {
            x_scale: self.cal_x_scale,
            y_scale: self.cal_y_scale,
            x_offset: self.cal_x_offset,
            y_offset: self.cal_y_offset,
        }
    }
}

/// Where [`PersistedSettings`] live between runs.
pub trait ConfigStore {
    fn load(&mut self) -> Result<PersistedSettings, ConfigError>;

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), ConfigError>;
}

/// Load from `store`, substituting `seed` for missing or unreadable data,
/// then sanitize.
pub fn load_or_default<S: ConfigStore>(store: &mut S, seed: PersistedSettings) -> PersistedSettings {
    let loaded = match store.load() {
        Ok(settings) => {
            info!("loaded stored settings");
            settings
        }
        Err(ConfigError::NotFound) => {
            info!("no stored settings, using defaults");
            seed
        }
        Err(err) => {
            warn!("config load skipped: {}", err);
            seed
        }
    };
    loaded.sanitized(&seed)
}

/// In-memory store holding the encoded bytes, as a device without
/// persistent storage (or a test) would.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    bytes: Option<Vec<u8>>,
    fail_saves: bool,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Some(bytes),
            fail_saves: false,
        }
    }

    /// Make every subsequent save fail, to exercise error paths.
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&mut self) -> Result<PersistedSettings, ConfigError> {
        let bytes = self.bytes.as_deref().ok_or(ConfigError::NotFound)?;
        PersistedSettings::from_bytes(bytes)
    }

    fn save(&mut self, settings: &PersistedSettings) -> Result<(), ConfigError> {
        if self.fail_saves {
            return Err(ConfigError::Storage(String::from("store is read-only")));
        }
        self.bytes = Some(settings.to_bytes()?);
        Ok(())
    }
}

/// Which optional parts of the dashboard are enabled.
///
/// The sunrise-only dashboard and the full one are the same state machine
/// with different capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub settings: bool,
    pub calibration: bool,
    /// Pages reachable with the PAGE button (1..=3).
    pub page_count: u8,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl Capabilities {
    pub const fn full() -> Self {
        Self {
            settings: true,
            calibration: true,
            page_count: PAGE_COUNT,
        }
    }

    /// Sunrise page only, theme and exit controls.
    pub const fn minimal() -> Self {
        Self {
            settings: false,
            calibration: false,
            page_count: 1,
        }
    }

    pub fn page_count(&self) -> u8 {
        self.page_count.clamp(1, PAGE_COUNT)
    }

    /// Calibration is only reachable through settings.
    pub fn calibration_enabled(&self) -> bool {
        self.settings && self.calibration
    }
}

/// Runtime options owned by the bootstrap layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardConfig {
    pub poll_interval: Duration,
    pub partial_refresh: bool,
    pub utc_offset: UtcOffset,
    pub capabilities: Capabilities,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            partial_refresh: false,
            utc_offset: UtcOffset::UTC,
            capabilities: Capabilities::full(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> PersistedSettings {
        PersistedSettings::seeded(37.7749, -122.4194, Duration::from_secs(900))
    }

    #[test]
    fn test_bytes_round_trip() {
        let mut settings = seed();
        settings.theme = 2;
        settings.cal_x_offset = -4.5;

        let bytes = settings.to_bytes().unwrap();
        assert_eq!(PersistedSettings::from_bytes(&bytes).unwrap(), settings);
    }

    #[test]
    fn test_garbage_bytes_are_malformed() {
        assert!(matches!(
            PersistedSettings::from_bytes(&[0xff, 0x01]),
            Err(ConfigError::Malformed(_))
        ));
    }

    #[test]
    fn test_sanitize_enforces_minimum_interval() {
        let mut short = seed();
        short.interval_seconds = 60;
        assert_eq!(short.sanitized(&seed()).interval_seconds, 180);

        short.interval_seconds = -5;
        assert_eq!(
            short.sanitized(&seed()).refresh_interval(),
            MIN_REFRESH_INTERVAL
        );
    }

    #[test]
    fn test_sanitize_theme_falls_back_to_dark_mode_flag() {
        let mut settings = seed();
        settings.theme = 7;
        settings.dark_mode = true;
        assert_eq!(settings.sanitized(&seed()).theme, 1);

        settings.dark_mode = false;
        settings.theme = -1;
        assert_eq!(settings.sanitized(&seed()).theme, 0);

        settings.theme = 2;
        assert_eq!(settings.sanitized(&seed()).theme, 2);
    }

    #[test]
    fn test_sanitize_repairs_calibration_and_location() {
        let mut settings = seed();
        settings.cal_x_scale = 0.0;
        settings.cal_y_scale = 0.0;
        settings.latitude = f64::NAN;
        settings.longitude = 500.0;

        let clean = settings.sanitized(&seed());
        assert_eq!(clean.calibration(), Calibration::identity());
        assert_eq!(clean.latitude, seed().latitude);
        assert_eq!(clean.longitude, seed().longitude);
    }

    #[test]
    fn test_load_or_default_falls_back_on_missing_and_malformed() {
        let mut empty = MemoryConfigStore::new();
        assert_eq!(load_or_default(&mut empty, seed()), seed());

        let mut broken = MemoryConfigStore::with_bytes(alloc::vec![0xff]);
        assert_eq!(load_or_default(&mut broken, seed()), seed());
    }

    #[test]
    fn test_memory_store_round_trip_and_failure() {
        let mut store = MemoryConfigStore::new();
        let mut settings = seed();
        settings.latitude = 51.5;
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);

        store.set_fail_saves(true);
        assert!(matches!(
            store.save(&seed()),
            Err(ConfigError::Storage(_))
        ));
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_capabilities() {
        assert_eq!(Capabilities::default(), Capabilities::full());
        assert!(Capabilities::full().calibration_enabled());

        let minimal = Capabilities::minimal();
        assert!(!minimal.calibration_enabled());
        assert_eq!(minimal.page_count(), 1);

        let odd = Capabilities {
            settings: false,
            calibration: true,
            page_count: 0,
        };
        assert!(!odd.calibration_enabled());
        assert_eq!(odd.page_count(), 1);
    }
}

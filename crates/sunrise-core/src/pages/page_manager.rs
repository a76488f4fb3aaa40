//! UI state machine: turns accepted taps into screen transitions.

use core::time::Duration;

use log::{debug, info, warn};

use crate::app_state::{AppState, LiveSettings, Notice, ScreenMode, SettingsDraft};
use crate::config::{Capabilities, ConfigStore, THEME_COUNT};
use crate::pages::page::{Screen, ScreenWrapper};
use crate::time::Timestamp;
use crate::touch::{Calibration, CalibrationCapture, LogicalPoint, MappedTouch, TouchDebouncer};
use crate::ui::core::{Action, SettingField, Step, hit_test};

/// How long the first EXIT tap stays armed.
pub const EXIT_CONFIRM_WINDOW: Duration = Duration::from_secs(5);

/// Latitude/longitude change per ± tap, in degrees.
const COORD_STEP_DEG: f64 = 0.01;

const INTERVAL_STEP: Duration = Duration::from_secs(5 * 60);
const MIN_INTERVAL: Duration = Duration::from_secs(5 * 60);
const MAX_INTERVAL: Duration = Duration::from_secs(6 * 3_600);

/// Owns [`AppState`] and is its only writer.
pub struct UiStateMachine {
    state: AppState,
    capabilities: Capabilities,
    debouncer: TouchDebouncer,
}

impl UiStateMachine {
    pub fn new(state: AppState, capabilities: Capabilities) -> Self {
        Self {
            state,
            capabilities,
            debouncer: TouchDebouncer::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Calibration currently applied to touch input.
    pub fn calibration(&self) -> &Calibration {
        &self.state.settings.calibration
    }

    pub fn exit_requested(&self) -> bool {
        self.state.exit_requested
    }

    /// Whether a redraw was requested; clears the request.
    pub fn take_dirty(&mut self) -> bool {
        let dirty = self.state.is_dirty();
        self.state.mark_clean();
        dirty
    }

    /// Feed one poll result. Returns the action of the tapped region, if
    /// the touch survived debouncing and hit one.
    pub fn on_touch<S: ConfigStore>(
        &mut self,
        reading: Option<MappedTouch>,
        now: Timestamp,
        store: &mut S,
    ) -> Option<Action> {
        let space = ScreenWrapper::for_state(&self.state, self.capabilities).touch_space();
        let point = self
            .debouncer
            .filter(reading.map(|touch| touch.point_in(space)), now)?;

        self.state.touch_count = self.state.touch_count.saturating_add(1);
        if self.state.notice.take().is_some() {
            self.state.mark_dirty();
        }

        self.tap(point, now, store)
    }

    /// Expire the exit confirmation window.
    pub fn tick(&mut self, now: Timestamp) {
        if self.state.exit_armed_until.is_some() && !self.state.exit_armed(now) {
            debug!("exit confirmation expired");
            self.state.exit_armed_until = None;
            self.state.mark_dirty();
        }
    }

    fn tap<S: ConfigStore>(
        &mut self,
        point: LogicalPoint,
        now: Timestamp,
        store: &mut S,
    ) -> Option<Action> {
        let action = {
            let screen = ScreenWrapper::for_state(&self.state, self.capabilities);
            debug!("tap at ({}, {}) on {}", point.x, point.y, screen.title());
            hit_test(&screen.regions(), point)
        };

        match action {
            Some(action) => self.apply(action, now, store),
            None => {
                if let ScreenMode::Calibration { capture, .. } = &mut self.state.mode
                    && capture.push(point)
                {
                    self.state.mark_dirty();
                }
            }
        }
        action
    }

    fn apply<S: ConfigStore>(&mut self, action: Action, now: Timestamp, store: &mut S) {
        match action {
            Action::CycleTheme => {
                self.state.theme = (self.state.theme + 1) % THEME_COUNT;
                info!("theme -> {}", self.state.theme);
                self.state.mark_dirty();
            }
            Action::CyclePage => {
                let count = self.capabilities.page_count();
                self.state.page = (self.state.page + 1) % count;
                info!("page -> {}", self.state.page);
                self.state.mark_dirty();
            }
            Action::OpenSettings => {
                let draft = SettingsDraft::from_live(&self.state.settings);
                self.state.mode = ScreenMode::Settings(draft);
                info!("screen -> settings");
                self.state.mark_dirty();
            }
            Action::Exit => self.exit_tap(now),
            Action::Back => self.back(),
            Action::Save => self.save(store),
            Action::Calibrate => {
                if let ScreenMode::Settings(draft) = self.state.mode {
                    self.state.mode = ScreenMode::Calibration {
                        capture: CalibrationCapture::new(),
                        draft,
                    };
                    info!("screen -> calibration");
                    self.state.mark_dirty();
                }
            }
            Action::Adjust(field, step) => {
                if let ScreenMode::Settings(draft) = &mut self.state.mode
                    && adjust(draft, field, step)
                {
                    self.state.mark_dirty();
                }
            }
            Action::Apply => self.apply_calibration(store),
        }
    }

    fn exit_tap(&mut self, now: Timestamp) {
        if self.state.exit_armed(now) {
            info!("exit confirmed");
            self.state.exit_requested = true;
        } else {
            info!("exit armed for {}s", EXIT_CONFIRM_WINDOW.as_secs());
            self.state.exit_armed_until = Some(now.saturating_add(EXIT_CONFIRM_WINDOW));
        }
        self.state.mark_dirty();
    }

    fn back(&mut self) {
        self.state.mode = match &self.state.mode {
            ScreenMode::Normal => return,
            ScreenMode::Settings(_) => {
                info!("screen -> normal, draft discarded");
                ScreenMode::Normal
            }
            ScreenMode::Calibration { draft, .. } => {
                info!("screen -> settings, calibration cancelled");
                ScreenMode::Settings(*draft)
            }
        };
        self.state.mark_dirty();
    }

    fn save<S: ConfigStore>(&mut self, store: &mut S) {
        let ScreenMode::Settings(draft) = self.state.mode else {
            return;
        };
        let candidate = LiveSettings {
            latitude: draft.latitude,
            longitude: draft.longitude,
            refresh_interval: draft.refresh_interval,
            calibration: self.state.settings.calibration,
        };

        if self.persist(&candidate, store) {
            info!(
                "settings saved: lat={:.4} lon={:.4} interval={}s",
                candidate.latitude,
                candidate.longitude,
                candidate.refresh_interval.as_secs()
            );
            self.state.settings = candidate;
            self.state.mode = ScreenMode::Normal;
        }
        self.state.mark_dirty();
    }

    fn apply_calibration<S: ConfigStore>(&mut self, store: &mut S) {
        let ScreenMode::Calibration { capture, .. } = &mut self.state.mode else {
            return;
        };
        if !capture.is_complete() {
            debug!("apply ignored at step {}", capture.step());
            return;
        }

        let calibration = match capture.compute() {
            Ok(calibration) => calibration,
            Err(err) => {
                warn!("calibration failed: {}", err);
                capture.record_error(err);
                self.state.mark_dirty();
                return;
            }
        };

        let candidate = LiveSettings {
            calibration,
            ..self.state.settings
        };
        if self.persist(&candidate, store) {
            info!("calibration applied: {:?}", calibration);
            self.state.settings = candidate;
            self.state.mode = ScreenMode::Normal;
        }
        self.state.mark_dirty();
    }

    /// Write `candidate` with the current theme. On failure the notice is
    /// raised and nothing else changes.
    fn persist<S: ConfigStore>(&mut self, candidate: &LiveSettings, store: &mut S) -> bool {
        let persisted = AppState::persisted_with(candidate, self.state.theme);
        match store.save(&persisted) {
            Ok(()) => true,
            Err(err) => {
                warn!("failed to persist settings: {}", err);
                self.state.notice = Some(Notice::SaveFailed);
                false
            }
        }
    }
}

/// Apply one ± step to `draft`. Returns whether anything changed.
fn adjust(draft: &mut SettingsDraft, field: SettingField, step: Step) -> bool {
    let before = *draft;
    let sign = match step {
        Step::Down => -1.0,
        Step::Up => 1.0,
    };
    match field {
        SettingField::Latitude => {
            draft.latitude = (draft.latitude + sign * COORD_STEP_DEG).clamp(-90.0, 90.0);
        }
        SettingField::Longitude => {
            draft.longitude = (draft.longitude + sign * COORD_STEP_DEG).clamp(-180.0, 180.0);
        }
        SettingField::Interval => {
            let interval = draft.refresh_interval;
            let next = match step {
                Step::Down if interval > MIN_INTERVAL => interval.saturating_sub(INTERVAL_STEP),
                Step::Up if interval < MAX_INTERVAL => interval + INTERVAL_STEP,
                _ => interval,
            };
            draft.refresh_interval = next.clamp(MIN_INTERVAL, MAX_INTERVAL);
        }
    }
    *draft != before
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MemoryConfigStore, PersistedSettings};
    use crate::touch::{CALIBRATION_TARGETS, LogicalPoint};

    fn machine(capabilities: Capabilities) -> UiStateMachine {
        let settings = PersistedSettings::seeded(37.7749, -122.4194, Duration::from_secs(900));
        let mut machine = UiStateMachine::new(AppState::from_settings(&settings), capabilities);
        machine.take_dirty();
        machine
    }

    fn at(x: u16, y: u16) -> MappedTouch {
        let point = LogicalPoint::new(x, y);
        MappedTouch {
            base: point,
            calibrated: point,
        }
    }

    /// Release then press, so the debouncer sees a fresh contact.
    fn tap(
        machine: &mut UiStateMachine,
        store: &mut MemoryConfigStore,
        x: u16,
        y: u16,
        ms: i64,
    ) -> Option<Action> {
        let now = Timestamp::from_millis(ms);
        machine.on_touch(None, now, store);
        machine.on_touch(Some(at(x, y)), now, store)
    }

    #[test]
    fn test_theme_and_page_cycle() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        for (i, expected) in [1, 2, 0].into_iter().enumerate() {
            let action = tap(&mut sm, &mut store, 10, 10, 1_000 + i as i64 * 1_000);
            assert_eq!(action, Some(Action::CycleTheme));
            assert_eq!(sm.state().theme, expected);
        }
        assert!(sm.take_dirty());
        assert!(!sm.take_dirty());

        for (i, expected) in [1, 2, 0].into_iter().enumerate() {
            tap(&mut sm, &mut store, 70, 10, 20_000 + i as i64 * 1_000);
            assert_eq!(sm.state().page, expected);
        }
    }

    #[test]
    fn test_set_opens_settings_with_live_values() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        assert_eq!(tap(&mut sm, &mut store, 150, 10, 1_000), Some(Action::OpenSettings));
        let ScreenMode::Settings(draft) = sm.state().mode else {
            panic!("expected settings, got {:?}", sm.state().mode);
        };
        assert_eq!(draft, SettingsDraft::from_live(&sm.state().settings));
        assert!(sm.take_dirty());
    }

    #[test]
    fn test_back_discards_draft() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());
        let live = sm.state().settings;

        tap(&mut sm, &mut store, 150, 10, 1_000);
        tap(&mut sm, &mut store, 100, 40, 2_000); // LAT+
        tap(&mut sm, &mut store, 100, 100, 3_000); // INT+
        let ScreenMode::Settings(draft) = sm.state().mode else {
            panic!("expected settings");
        };
        assert!((draft.latitude - (live.latitude + 0.01)).abs() < 1e-9);
        assert_eq!(draft.refresh_interval, Duration::from_secs(1_200));

        assert_eq!(tap(&mut sm, &mut store, 10, 10, 4_000), Some(Action::Back));
        assert_eq!(sm.state().mode, ScreenMode::Normal);
        assert_eq!(sm.state().settings, live);
        assert!(store.bytes().is_none());
    }

    #[test]
    fn test_save_commits_and_persists() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        tap(&mut sm, &mut store, 150, 10, 1_000);
        tap(&mut sm, &mut store, 20, 70, 2_000); // LON-
        tap(&mut sm, &mut store, 150, 70, 3_000); // THEME CYCLE
        assert_eq!(sm.state().theme, 1);
        assert_eq!(tap(&mut sm, &mut store, 120, 10, 4_000), Some(Action::Save));

        assert_eq!(sm.state().mode, ScreenMode::Normal);
        assert!((sm.state().settings.longitude - (-122.4294)).abs() < 1e-9);

        let saved = store.load().unwrap();
        assert_eq!(saved, sm.state().to_persisted());
        assert_eq!(saved.theme, 1);
        assert!(saved.dark_mode);
    }

    #[test]
    fn test_save_failure_keeps_state_and_shows_notice() {
        let mut store = MemoryConfigStore::new();
        store.set_fail_saves(true);
        let mut sm = machine(Capabilities::full());
        let live = sm.state().settings;

        tap(&mut sm, &mut store, 150, 10, 1_000);
        tap(&mut sm, &mut store, 100, 40, 2_000);
        tap(&mut sm, &mut store, 120, 10, 3_000);

        assert!(matches!(sm.state().mode, ScreenMode::Settings(_)));
        assert_eq!(sm.state().settings, live);
        assert_eq!(sm.state().notice, Some(Notice::SaveFailed));

        // The next accepted tap clears the notice, even on empty space.
        sm.take_dirty();
        assert_eq!(tap(&mut sm, &mut store, 60, 118, 4_000), None);
        assert_eq!(sm.state().notice, None);
        assert!(sm.take_dirty());
    }

    #[test]
    fn test_interval_is_clamped() {
        let mut draft = SettingsDraft {
            latitude: 0.0,
            longitude: 0.0,
            refresh_interval: Duration::from_secs(5 * 60),
        };
        assert!(!adjust(&mut draft, SettingField::Interval, Step::Down));
        assert_eq!(draft.refresh_interval, MIN_INTERVAL);

        draft.refresh_interval = Duration::from_secs(4 * 60);
        adjust(&mut draft, SettingField::Interval, Step::Up);
        assert_eq!(draft.refresh_interval, Duration::from_secs(9 * 60));

        draft.refresh_interval = MAX_INTERVAL;
        assert!(!adjust(&mut draft, SettingField::Interval, Step::Up));
        assert!(adjust(&mut draft, SettingField::Interval, Step::Down));
        assert_eq!(draft.refresh_interval, MAX_INTERVAL - INTERVAL_STEP);
    }

    #[test]
    fn test_exit_needs_confirmation_inside_window() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        tap(&mut sm, &mut store, 200, 10, 1_000);
        assert!(!sm.exit_requested());
        assert!(sm.state().exit_armed(Timestamp::from_millis(5_999)));
        assert!(sm.take_dirty());

        tap(&mut sm, &mut store, 200, 10, 3_000);
        assert!(sm.exit_requested());
    }

    #[test]
    fn test_exit_window_expires() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        tap(&mut sm, &mut store, 200, 10, 1_000);
        sm.take_dirty();

        sm.tick(Timestamp::from_millis(5_000));
        assert!(!sm.take_dirty());
        sm.tick(Timestamp::from_millis(6_000));
        assert!(sm.take_dirty());
        assert_eq!(sm.state().exit_armed_until, None);

        tap(&mut sm, &mut store, 200, 10, 7_000);
        assert!(!sm.exit_requested());
    }

    #[test]
    fn test_debounce_scenarios() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        // Identical taps 100 ms apart fire once.
        tap(&mut sm, &mut store, 50, 50, 1_000);
        tap(&mut sm, &mut store, 50, 50, 1_100);
        assert_eq!(sm.state().touch_count, 1);

        // 1000 ms apart both fire.
        tap(&mut sm, &mut store, 50, 50, 3_000);
        tap(&mut sm, &mut store, 50, 50, 4_000);
        assert_eq!(sm.state().touch_count, 3);

        // A held finger fires once.
        let now = Timestamp::from_millis(9_000);
        sm.on_touch(None, now, &mut store);
        assert_eq!(
            sm.on_touch(Some(at(10, 10)), now, &mut store),
            Some(Action::CycleTheme)
        );
        let later = Timestamp::from_millis(10_000);
        assert_eq!(sm.on_touch(Some(at(10, 10)), later, &mut store), None);
        assert_eq!(sm.state().theme, 1);
    }

    #[test]
    fn test_empty_tap_does_not_request_redraw() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());

        assert_eq!(tap(&mut sm, &mut store, 60, 100, 1_000), None);
        assert_eq!(sm.state().touch_count, 1);
        assert!(!sm.take_dirty());
    }

    #[test]
    fn test_minimal_capabilities_ignore_hidden_controls() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::minimal());

        assert_eq!(tap(&mut sm, &mut store, 70, 10, 1_000), None);
        assert_eq!(tap(&mut sm, &mut store, 150, 10, 2_000), None);
        assert_eq!(sm.state().page, 0);
        assert_eq!(sm.state().mode, ScreenMode::Normal);
    }

    fn open_calibration(sm: &mut UiStateMachine, store: &mut MemoryConfigStore) {
        tap(sm, store, 150, 10, 1_000);
        assert_eq!(tap(sm, store, 200, 40, 2_000), Some(Action::Calibrate));
        assert!(matches!(sm.state().mode, ScreenMode::Calibration { .. }));
    }

    #[test]
    fn test_calibration_capture_and_apply() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());
        open_calibration(&mut sm, &mut store);

        // APPLY does nothing and captures nothing before three samples.
        assert_eq!(tap(&mut sm, &mut store, 200, 10, 3_000), Some(Action::Apply));
        let ScreenMode::Calibration { capture, .. } = &sm.state().mode else {
            panic!("expected calibration");
        };
        assert_eq!(capture.step(), 0);

        // Sensor reads every target 5 px right of where it is drawn.
        for (i, target) in CALIBRATION_TARGETS.iter().enumerate() {
            let touch = MappedTouch {
                base: LogicalPoint::new(target.x + 5, target.y),
                calibrated: LogicalPoint::new(0, 121),
            };
            let now = Timestamp::from_millis(4_000 + i as i64 * 1_000);
            sm.on_touch(None, now, &mut store);
            assert_eq!(sm.on_touch(Some(touch), now, &mut store), None);
        }

        tap(&mut sm, &mut store, 200, 10, 8_000);
        assert_eq!(sm.state().mode, ScreenMode::Normal);
        let cal = *sm.calibration();
        assert!((cal.x_scale - 1.0).abs() < 1e-9);
        assert!((cal.x_offset + 5.0).abs() < 1e-9);
        assert_eq!(store.load().unwrap().calibration(), cal);
    }

    #[test]
    fn test_calibration_debounces_uncalibrated_points() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());
        open_calibration(&mut sm, &mut store);

        // A skewed calibration pins every touch to the same corner.
        let pinned = |target: LogicalPoint| MappedTouch {
            base: target,
            calibrated: LogicalPoint::new(0, 121),
        };
        let first = CALIBRATION_TARGETS[0];
        let second = CALIBRATION_TARGETS[1];

        let t0 = Timestamp::from_millis(3_000);
        sm.on_touch(None, t0, &mut store);
        sm.on_touch(Some(pinned(first)), t0, &mut store);

        let t1 = Timestamp::from_millis(3_300);
        sm.on_touch(None, t1, &mut store);
        sm.on_touch(Some(pinned(second)), t1, &mut store);

        // Same target again inside the window.
        let t2 = Timestamp::from_millis(3_600);
        sm.on_touch(None, t2, &mut store);
        sm.on_touch(Some(pinned(second)), t2, &mut store);

        let ScreenMode::Calibration { capture, .. } = &sm.state().mode else {
            panic!("expected calibration");
        };
        assert_eq!(capture.step(), 2);
    }

    #[test]
    fn test_calibration_failure_keeps_capture() {
        let mut store = MemoryConfigStore::new();
        let mut sm = machine(Capabilities::full());
        open_calibration(&mut sm, &mut store);

        for (i, (x, y)) in [(20, 38), (21, 38), (125, 106)].into_iter().enumerate() {
            tap(&mut sm, &mut store, x, y, 3_000 + i as i64 * 1_000);
        }
        tap(&mut sm, &mut store, 200, 10, 7_000);

        let ScreenMode::Calibration { capture, .. } = &sm.state().mode else {
            panic!("expected calibration");
        };
        assert_eq!(capture.step(), 3);
        assert!(capture.last_error().is_some());
        assert_eq!(*sm.calibration(), Calibration::identity());
        assert!(store.bytes().is_none());

        // BACK returns to settings with the draft intact.
        tap(&mut sm, &mut store, 10, 10, 8_000);
        assert!(matches!(sm.state().mode, ScreenMode::Settings(_)));
    }
}

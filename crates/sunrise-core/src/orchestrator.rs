//! The dashboard loop: poll, update, render, plan, write.
//!
//! One [`Orchestrator::run_cycle`] call is one loop iteration with a single
//! `now`. All I/O goes through the capability traits, so the loop runs the
//! same against real hardware, the host simulator or test fakes.

use core::time::Duration;

use log::{debug, info, warn};

use crate::app_state::AppState;
use crate::config::{ConfigStore, DashboardConfig, PersistedSettings, load_or_default};
use crate::drivers::{DriverError, PanelColor, PanelDriver, RefreshMode, TouchDriver};
use crate::pages::UiStateMachine;
use crate::refresh::{RefreshKind, RefreshPlanner, RefreshPolicy};
use crate::renderer::{FrameRenderer, RenderContext};
use crate::solar::next_sunrise_or_fallback;
use crate::time::{Clock, Timestamp};
use crate::touch::TouchMapper;

/// Minimum spacing between two logged touch-driver errors.
const TOUCH_ERROR_LOG_INTERVAL: Duration = Duration::from_secs(3);

/// What a single loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No redraw trigger fired.
    Idle,
    /// A frame was rendered and planned; `Skip` means the panel already
    /// showed it.
    Rendered(RefreshKind),
    /// The panel rejected the update. The redraw stays pending and is
    /// retried on the next cycle.
    PanelError,
    /// Exit was confirmed; call [`Orchestrator::shutdown`].
    Exit,
}

pub struct Orchestrator<T, P, S>
where
    T: TouchDriver,
    P: PanelDriver,
    S: ConfigStore,
{
    touch: T,
    panel: P,
    store: S,
    ui: UiStateMachine,
    planner: RefreshPlanner,
    config: DashboardConfig,
    started_at: Timestamp,
    last_draw: Option<Timestamp>,
    redraw_pending: bool,
    draw_count: u32,
    panel_awake: bool,
    last_touch_error_log: Option<Timestamp>,
}

impl<T, P, S> Orchestrator<T, P, S>
where
    T: TouchDriver,
    P: PanelDriver,
    S: ConfigStore,
{
    /// Load settings from `store` (falling back to `seed`) and build the
    /// initial state.
    pub fn new(
        touch: T,
        panel: P,
        mut store: S,
        seed: PersistedSettings,
        config: DashboardConfig,
        now: Timestamp,
    ) -> Self {
        let settings = load_or_default(&mut store, seed);
        info!(
            "settings: lat={:.4} lon={:.4} interval={}s theme={}",
            settings.latitude,
            settings.longitude,
            settings.interval_seconds,
            settings.theme
        );

        Self {
            touch,
            panel,
            store,
            ui: UiStateMachine::new(AppState::from_settings(&settings), config.capabilities),
            planner: RefreshPlanner::new(RefreshPolicy::new(config.partial_refresh)),
            config,
            started_at: now,
            last_draw: None,
            redraw_pending: false,
            draw_count: 0,
            panel_awake: false,
            last_touch_error_log: None,
        }
    }

    /// Bring the panel up and blank it.
    pub fn start(&mut self) -> Result<(), DriverError> {
        let size = self.panel.size();
        info!("panel {}x{}, starting", size.width, size.height);

        self.panel.init()?;
        self.panel.set_refresh_mode(RefreshMode::Full)?;
        self.panel.clear(PanelColor::White)?;
        self.panel_awake = true;
        Ok(())
    }

    /// One loop iteration at `now`.
    pub fn run_cycle(&mut self, now: Timestamp) -> CycleOutcome {
        if self.ui.exit_requested() {
            return CycleOutcome::Exit;
        }

        let reading = match self.touch.poll() {
            Ok(reading) => reading,
            Err(err) => {
                self.log_touch_error(err, now);
                None
            }
        };
        let mapped = reading.and_then(|raw| TouchMapper::map(raw, self.ui.calibration()));
        if let Some(action) = self.ui.on_touch(mapped, now, &mut self.store) {
            debug!("action: {:?}", action);
        }
        self.ui.tick(now);

        if self.ui.exit_requested() {
            return CycleOutcome::Exit;
        }

        if self.ui.take_dirty() {
            self.redraw_pending = true;
        }
        let interval = self.ui.state().settings.refresh_interval;
        let interval_due = self
            .last_draw
            .is_none_or(|at| now.duration_since(at) >= interval);
        if !self.redraw_pending && !interval_due {
            return CycleOutcome::Idle;
        }

        self.redraw(now)
    }

    /// Render and write one frame. `last_draw` and the pending flag only
    /// move once the panel has accepted the frame (or had nothing to do).
    fn redraw(&mut self, now: Timestamp) -> CycleOutcome {
        if !self.panel_awake {
            if let Err(err) = self.panel.init() {
                warn!("panel wake failed: {}", err);
                return CycleOutcome::PanelError;
            }
            self.panel_awake = true;
        }

        let draw_count = self.draw_count.wrapping_add(1);
        let state = self.ui.state();
        let ctx = RenderContext {
            now,
            utc_offset: self.config.utc_offset,
            sunrise: next_sunrise_or_fallback(
                now,
                state.settings.latitude,
                state.settings.longitude,
                self.config.utc_offset,
            ),
            started_at: self.started_at,
            draw_count,
            partial_enabled: self.config.partial_refresh,
            capabilities: self.config.capabilities,
        };
        let frame = FrameRenderer::render(state, &ctx).to_panel_orientation();

        let decision = self.planner.decide(&frame, now);
        let Some(mode) = decision.kind.panel_mode() else {
            self.finish_draw(draw_count, now);
            return CycleOutcome::Rendered(RefreshKind::Skip);
        };

        if let Err(err) = self.panel.set_refresh_mode(mode) {
            warn!("set refresh mode {:?} failed: {}", mode, err);
            return CycleOutcome::PanelError;
        }
        if let Err(err) = self.panel.draw_region(&decision.rect, &frame) {
            warn!("draw failed: {}", err);
            return CycleOutcome::PanelError;
        }

        self.planner.commit(frame, &decision, now);
        self.finish_draw(draw_count, now);
        CycleOutcome::Rendered(decision.kind)
    }

    fn finish_draw(&mut self, draw_count: u32, now: Timestamp) {
        self.draw_count = draw_count;
        self.last_draw = Some(now);
        self.redraw_pending = false;
        self.sleep_panel();
    }

    fn sleep_panel(&mut self) {
        if !self.panel_awake {
            return;
        }
        match self.panel.sleep() {
            Ok(()) => self.panel_awake = false,
            Err(err) => warn!("panel sleep failed: {}", err),
        }
    }

    fn log_touch_error(&mut self, err: DriverError, now: Timestamp) {
        let due = self
            .last_touch_error_log
            .is_none_or(|at| now.duration_since(at) > TOUCH_ERROR_LOG_INTERVAL);
        if due {
            warn!("touch poll error: {}", err);
            self.last_touch_error_log = Some(now);
        }
    }

    /// Loop until exit is confirmed (or `max_cycles` have run), then shut
    /// the panel down.
    pub fn run<C: Clock>(
        &mut self,
        clock: &mut C,
        max_cycles: Option<u64>,
    ) -> Result<(), DriverError> {
        self.start()?;

        let mut cycles = 0u64;
        loop {
            let now = clock.now();
            if self.run_cycle(now) == CycleOutcome::Exit {
                info!("exit requested, shutting down");
                break;
            }
            cycles += 1;
            if max_cycles.is_some_and(|max| cycles >= max) {
                info!("stopping after {} cycles", cycles);
                break;
            }
            clock.sleep(self.config.poll_interval);
        }

        self.shutdown()
    }

    /// Blank the panel, put it to sleep and release it.
    ///
    /// Every step is attempted; the first failure is returned.
    pub fn shutdown(&mut self) -> Result<(), DriverError> {
        let mut first_error = None;
        let mut note = |step: &str, result: Result<(), DriverError>| {
            if let Err(err) = result {
                warn!("shutdown {} failed: {}", step, err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        };

        if !self.panel_awake {
            note("wake", self.panel.init());
        }
        note("clear", self.panel.clear(PanelColor::White));
        note("sleep", self.panel.sleep());
        note("halt", self.panel.halt());
        self.panel_awake = false;

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn ui(&self) -> &UiStateMachine {
        &self.ui
    }

    pub fn planner(&self) -> &RefreshPlanner {
        &self.planner
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn draw_count(&self) -> u32 {
        self.draw_count
    }
}

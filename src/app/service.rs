//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the local-interface FSM, the safety gate, the result
//! store and the one test run that may be active.  Both front ends, the
//! buttons and the host serial link, drive the same instance.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  ButtonPress ──▶ ┌──────────────────────────┐ ──▶ DisplayPort
//!  SerialPort  ◀──▶│        AppService        │ ──▶ EventSink
//!  SensorPort  ──▶ │  FSM · Gate · Run · Store│ ◀─▶ StoragePort
//!  ActuatorPort ◀──└──────────────────────────┘
//! ```
//!
//! The service never blocks.  A loaded test advances one step per
//! [`tick`](AppService::tick); buttons and host bytes are handled between
//! ticks.

use log::{debug, info, warn};

use crate::config::TesterConfig;
use crate::control::{CancelToken, RunSpec, RunStatus, TestRun};
use crate::error::TestFault;
use crate::events::ButtonPress;
use crate::fsm::context::{FsmContext, Request};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, Input, StateId};
use crate::model::{TestMode, TestResult};
use crate::remote::RemoteSession;
use crate::remote::reply::{self, LOW_VOLTAGE, NO_CONNECTION, TARGET_REACHED, UNLOADED_OK};
use crate::safety::{SafetyGate, Verdict};
use crate::store::ResultStore;
use crate::ui::{self, Screen};

use super::commands::AppCommand;
use super::events::AppEvent;
use super::ports::{ConfigPort, DisplayPort, EventSink, SerialPort, StoragePort, TesterHardware};

/// Which front end started the active run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Local,
    Remote,
}

struct ActiveRun {
    run: TestRun,
    origin: Origin,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<S: StoragePort> {
    fsm: Fsm,
    ctx: FsmContext,
    gate: SafetyGate,
    store: ResultStore<S>,
    cancel: &'static CancelToken,
    active: Option<ActiveRun>,
    session: RemoteSession,
    /// Last frame pushed to the display, to skip identical redraws.
    last_screen: Option<Screen>,
}

impl<S: StoragePort> AppService<S> {
    /// Construct the service.  `cancel` is the token the button ISR raises.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: TesterConfig, store: ResultStore<S>, cancel: &'static CancelToken) -> Self {
        let gate = SafetyGate::new(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::MainMenu);
        Self {
            fsm,
            ctx,
            gate,
            store,
            cancel,
            active: None,
            session: RemoteSession::new(),
            last_screen: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in the main menu and draw it.
    pub fn start(&mut self, hw: &mut impl TesterHardware, sink: &mut impl EventSink) {
        hw.sound(false);
        hw.enable_actuator(false);
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
        self.refresh(hw);
    }

    // ── Local interface ───────────────────────────────────────

    /// Feed one button press to the local interface.
    ///
    /// Presses are ignored while a host-started run owns the instrument;
    /// the ISR still raises the cancel token on BACK.
    pub fn handle_button(
        &mut self,
        press: ButtonPress,
        hw: &mut impl TesterHardware,
        sink: &mut impl EventSink,
    ) {
        if matches!(&self.active, Some(a) if a.origin == Origin::Remote) {
            debug!("Button {:?} ignored during remote test", press);
            return;
        }
        self.feed(Input::Button(press), sink);
        self.apply_requests(hw, sink);
        self.refresh(hw);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One control tick: advance the active run, then serve the host.
    ///
    /// While any run is active only a cancel byte is honoured; other host
    /// commands are dropped.
    pub fn tick(
        &mut self,
        hw: &mut impl TesterHardware,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        if self.active.is_some() {
            self.advance_run(hw, serial, sink);
        }

        if self.active.is_some() {
            self.poll_cancel(serial, sink);
        } else {
            while self.active.is_none() {
                match self.session.poll(serial) {
                    Some(Ok(cmd)) => self.handle_command(cmd, hw, serial, sink),
                    Some(Err(e)) => sink.emit(&AppEvent::RemoteRejected(e)),
                    None => break,
                }
            }
        }

        self.refresh(hw);
    }

    // ── Command handling ──────────────────────────────────────

    /// Carry out one host command and send its reply.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl TesterHardware,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        sink.emit(&AppEvent::RemoteCommand(cmd));
        let gap = self.ctx.config.serial_inter_byte_ms;

        match cmd {
            AppCommand::UnloadedTest => {
                if self.active.is_some() {
                    warn!("REMOTE: unloaded test refused, a run is active");
                    return;
                }
                let verdict = self.gate.check_readiness(hw);
                sink.emit(&AppEvent::ReadinessChecked(verdict));
                self.ctx.result.unloaded = *self.gate.scratch();
                match verdict {
                    Verdict::Testing => reply::transmit(serial, &[UNLOADED_OK], gap),
                    Verdict::Error(TestFault::Connection) => {
                        reply::transmit(serial, &[NO_CONNECTION], gap);
                    }
                    Verdict::Error(TestFault::Safety) => {
                        reply::transmit(serial, &[LOW_VOLTAGE], gap);
                        let volts = reply::encode_voltages(&self.ctx.result.unloaded);
                        reply::transmit(serial, &volts, gap);
                    }
                }
            }

            AppCommand::LoadedTest { mode, amps } => {
                if self.active.is_some() {
                    warn!("REMOTE: loaded test refused, a run is active");
                    return;
                }
                let spec = RunSpec {
                    mode,
                    target_amps: amps,
                    measure_unloaded: false,
                };
                self.begin_run(spec, Origin::Remote, sink);
            }

            AppCommand::SendResult => {
                reply::transmit(serial, &reply::encode_result(&self.ctx.result), gap);
            }

            AppCommand::SendSlot(slot) => match self.store.load(slot) {
                Ok(record) => {
                    sink.emit(&AppEvent::ResultLoaded(slot));
                    reply::transmit(serial, &reply::encode_result(&record), gap);
                }
                Err(e) => sink.emit(&AppEvent::StoreFailed(e)),
            },

            AppCommand::Cancel => match &self.active {
                Some(_) => self.cancel.request(),
                None => debug!("REMOTE: cancel with no run active"),
            },
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current top-level local-interface state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn context(&self) -> &FsmContext {
        &self.ctx
    }

    /// The in-memory result of the latest test.
    pub fn result(&self) -> &TestResult {
        &self.ctx.result
    }

    pub fn store(&self) -> &ResultStore<S> {
        &self.store
    }

    pub fn config(&self) -> &TesterConfig {
        &self.ctx.config
    }

    /// `true` while a loaded test is running.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The frame currently on the display.
    pub fn screen(&self) -> Option<&Screen> {
        self.last_screen.as_ref()
    }

    // ── Config persistence ────────────────────────────────────

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.ctx.config_dirty
    }

    /// Persist settings once the operator has left the Settings menu.
    /// Returns `true` if the config was saved.
    pub fn save_config_if_dirty(
        &mut self,
        storage: &impl ConfigPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if !self.ctx.config_dirty || self.fsm.current_state() == StateId::Settings {
            return false;
        }
        match storage.save(&self.ctx.config) {
            Ok(()) => {
                self.ctx.config_dirty = false;
                self.gate.reconfigure(&self.ctx.config);
                sink.emit(&AppEvent::ConfigSaved);
                true
            }
            Err(e) => {
                warn!("Config save failed: {}", e);
                false
            }
        }
    }

    // ── Internal ──────────────────────────────────────────────

    /// Feed one input to the FSM and report any top-level transition.
    fn feed(&mut self, input: Input, sink: &mut impl EventSink) {
        let prev = self.fsm.current_state();
        self.fsm.handle(input, &mut self.ctx);
        let next = self.fsm.current_state();
        if next != prev {
            sink.emit(&AppEvent::StateChanged { from: prev, to: next });
        }
    }

    /// Carry out what the handlers asked for.  Answering a request can
    /// feed the FSM again, so this drains until nothing is left.
    fn apply_requests(&mut self, hw: &mut impl TesterHardware, sink: &mut impl EventSink) {
        loop {
            let requests = self.ctx.take_requests();
            if requests.is_empty() {
                break;
            }
            for req in requests {
                self.apply(req, hw, sink);
            }
        }
    }

    fn apply(&mut self, req: Request, hw: &mut impl TesterHardware, sink: &mut impl EventSink) {
        match req {
            Request::CheckReadiness => {
                let verdict = self.gate.check_readiness(hw);
                sink.emit(&AppEvent::ReadinessChecked(verdict));
                self.feed(Input::Readiness(verdict), sink);
            }
            Request::StartRun => {
                if self.active.is_some() {
                    warn!("Run already active, start ignored");
                    return;
                }
                let spec = RunSpec {
                    mode: self.ctx.config.test_mode,
                    target_amps: self.ctx.config.load_current_amps,
                    measure_unloaded: true,
                };
                self.begin_run(spec, Origin::Local, sink);
            }
            Request::CancelRun => {
                if self.active.is_some() {
                    self.cancel.request();
                }
            }
            Request::Save(slot) => match self.store.save(slot, &self.ctx.result) {
                Ok(()) => sink.emit(&AppEvent::ResultSaved(slot)),
                Err(e) => sink.emit(&AppEvent::StoreFailed(e)),
            },
            Request::Load(slot) => match self.store.load(slot) {
                Ok(record) => {
                    self.ctx.viewed = record;
                    sink.emit(&AppEvent::ResultLoaded(slot));
                }
                Err(e) => {
                    self.ctx.viewed = TestResult::default();
                    sink.emit(&AppEvent::StoreFailed(e));
                }
            },
            Request::Erase(slot) => match self.store.erase(slot) {
                Ok(()) => sink.emit(&AppEvent::ResultErased(slot)),
                Err(e) => sink.emit(&AppEvent::StoreFailed(e)),
            },
        }
    }

    fn begin_run(&mut self, spec: RunSpec, origin: Origin, sink: &mut impl EventSink) {
        let run = TestRun::new(spec, &self.ctx.config, self.cancel);
        sink.emit(&AppEvent::RunStarted {
            mode: spec.mode,
            amps: spec.target_amps,
            remote: origin == Origin::Remote,
        });
        self.active = Some(ActiveRun { run, origin });
    }

    fn advance_run(
        &mut self,
        hw: &mut impl TesterHardware,
        serial: &mut impl SerialPort,
        sink: &mut impl EventSink,
    ) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let status = active
            .run
            .tick(hw, &self.ctx.config, self.cancel, &mut self.ctx.result);
        let origin = active.origin;
        let mode = active.run.spec().mode;
        let gap = self.ctx.config.serial_inter_byte_ms;

        match status {
            RunStatus::Running => {}
            RunStatus::TargetReached => {
                sink.emit(&AppEvent::TargetReached(active.run.live_current()));
                if origin == Origin::Remote && mode == TestMode::Manual {
                    reply::transmit(serial, &[TARGET_REACHED], gap);
                }
            }
            RunStatus::Finished(outcome) => {
                self.active = None;
                sink.emit(&AppEvent::RunFinished(outcome));
                match origin {
                    Origin::Local => {
                        self.feed(Input::RunFinished(outcome), sink);
                        self.apply_requests(hw, sink);
                    }
                    Origin::Remote => {
                        reply::transmit(serial, &[reply::completion_byte(mode, outcome)], gap);
                    }
                }
            }
        }
    }

    /// During a run only `c` is acted on; anything else is dropped.
    fn poll_cancel(&mut self, serial: &mut impl SerialPort, sink: &mut impl EventSink) {
        match self.session.poll(serial) {
            Some(Ok(AppCommand::Cancel)) => {
                sink.emit(&AppEvent::RemoteCommand(AppCommand::Cancel));
                self.cancel.request();
            }
            Some(Ok(other)) => warn!("REMOTE: busy, ignoring {:?}", other),
            Some(Err(e)) => sink.emit(&AppEvent::RemoteRejected(e)),
            None => {}
        }
    }

    /// Draw the current frame if it differs from the last one.
    fn refresh(&mut self, display: &mut impl DisplayPort) {
        let screen = match &self.active {
            Some(a) if a.origin == Origin::Remote || self.fsm.current_state() == StateId::Test => {
                ui::run_progress(&a.run)
            }
            _ => ui::render(self.fsm.current_state(), &self.ctx),
        };
        if self.last_screen.as_ref() != Some(&screen) {
            display.show(&screen);
            self.last_screen = Some(screen);
        }
    }
}

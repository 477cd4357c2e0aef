//! Mock hardware for integration tests.
//!
//! [`Bench`] simulates a quad pack on a carbon-pile load: cell voltages
//! sag with discharge current, and each awake stepper pulse moves the
//! current by a fixed amount.  Every screen and buzzer edge is recorded so
//! tests can assert on the full history without touching real GPIO.

use std::cell::{Cell, RefCell};

use quadpack::adapters::serial::HostLink;
use quadpack::app::events::AppEvent;
use quadpack::app::ports::{
    ActuatorPort, ConfigPort, Direction, DisplayPort, EnvironmentPort, EventSink, SensorPort,
    StoragePort, Tap,
};
use quadpack::app::service::AppService;
use quadpack::config::TesterConfig;
use quadpack::control::CancelToken;
use quadpack::error::{ConfigError, StorageError};
use quadpack::events::ButtonPress;
use quadpack::model::{RECORD_LEN, Slot, TestDate, TestResult};
use quadpack::store::ResultStore;
use quadpack::ui::Screen;

// ── Bench: pack + load + panel ────────────────────────────────

pub struct Bench {
    /// Open-circuit voltage of each cell.
    pub cells: [f32; 4],
    /// Volts lost per amp of discharge current, per cell.
    pub sag_per_amp: f32,
    /// Reported B4−GND reading, replacing the sum of the cells.
    pub pack_override: Option<f32>,
    pub amps: f32,
    pub amps_per_step: f32,
    pub dir: Direction,
    pub awake: bool,
    pub pulses: u32,
    pub buzzer: bool,
    pub buzzer_edges: Vec<bool>,
    pub frames: Vec<Screen>,
    pub ambient: u8,
    pub date: TestDate,
}

#[allow(dead_code)]
impl Bench {
    /// A healthy pack at 3.2 V per cell with the load parked at zero.
    pub fn healthy() -> Self {
        Self {
            cells: [3.2; 4],
            sag_per_amp: 0.01,
            pack_override: None,
            amps: 0.0,
            amps_per_step: 1.0,
            dir: Direction::Decrease,
            awake: false,
            pulses: 0,
            buzzer: false,
            buzzer_edges: Vec::new(),
            frames: Vec::new(),
            ambient: 23,
            date: TestDate {
                year: 25,
                month: 6,
                day: 14,
            },
        }
    }

    pub fn with_cells(cells: [f32; 4]) -> Self {
        Self {
            cells,
            ..Self::healthy()
        }
    }

    /// Potential of `tap` above GND.
    fn potential(&self, tap: Tap) -> f32 {
        let n = match tap {
            Tap::Gnd => 0,
            Tap::B1 => 1,
            Tap::B2 => 2,
            Tap::B3 => 3,
            Tap::B4 => 4,
        };
        self.cells[..n]
            .iter()
            .map(|v| v - self.sag_per_amp * self.amps)
            .sum()
    }

    /// Most recent frame.
    pub fn screen(&self) -> &Screen {
        self.frames.last().expect("nothing drawn yet")
    }

    /// `true` if any line of the current frame contains `text`.
    pub fn shows(&self, text: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|s| s.lines().any(|l| l.contains(text)))
    }
}

impl SensorPort for Bench {
    fn read_cell_voltage(&mut self, pos: Tap, neg: Tap) -> f32 {
        if let (Tap::B4, Tap::Gnd, Some(v)) = (pos, neg, self.pack_override) {
            return v;
        }
        self.potential(pos) - self.potential(neg)
    }

    fn read_discharge_current(&mut self) -> f32 {
        self.amps
    }
}

impl ActuatorPort for Bench {
    fn set_direction(&mut self, dir: Direction) {
        self.dir = dir;
    }

    fn actuate_step(&mut self) {
        if !self.awake {
            return;
        }
        self.pulses += 1;
        self.amps = match self.dir {
            Direction::Increase => self.amps + self.amps_per_step,
            Direction::Decrease => (self.amps - self.amps_per_step).max(0.0),
        };
    }

    fn enable_actuator(&mut self, on: bool) {
        self.awake = on;
    }

    fn sound(&mut self, on: bool) {
        if self.buzzer != on {
            self.buzzer_edges.push(on);
        }
        self.buzzer = on;
    }
}

impl DisplayPort for Bench {
    fn show(&mut self, screen: &Screen) {
        self.frames.push(screen.clone());
    }
}

impl EnvironmentPort for Bench {
    fn ambient_temp_c(&mut self) -> u8 {
        self.ambient
    }

    fn today(&mut self) -> TestDate {
        self.date
    }
}

// ── Eeprom: in-memory 512-byte part ───────────────────────────

pub struct Eeprom {
    pub bytes: Vec<u8>,
    pub writes: usize,
    /// When set, every write fails with an I/O error.
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl Eeprom {
    pub fn blank() -> Self {
        Self {
            bytes: vec![0xFF; 512],
            writes: 0,
            fail_writes: false,
        }
    }

    /// Pre-program `slot` as if an earlier session had saved `result`.
    pub fn with_record(mut self, slot: Slot, result: &TestResult) -> Self {
        let at = slot.index() * RECORD_LEN;
        self.bytes[at..at + RECORD_LEN].copy_from_slice(&result.to_bytes());
        self
    }

    pub fn record_bytes(&self, slot: Slot) -> &[u8] {
        let at = slot.index() * RECORD_LEN;
        &self.bytes[at..at + RECORD_LEN]
    }
}

impl StoragePort for Eeprom {
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let src = self
            .bytes
            .get(offset..offset + buf.len())
            .ok_or(StorageError::OutOfBounds)?;
        buf.copy_from_slice(src);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Io);
        }
        let dst = self
            .bytes
            .get_mut(offset..offset + data.len())
            .ok_or(StorageError::OutOfBounds)?;
        dst.copy_from_slice(data);
        self.writes += 1;
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

// ── Config store ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemConfig {
    pub saved: RefCell<Option<TesterConfig>>,
    pub saves: Cell<u32>,
}

impl ConfigPort for MemConfig {
    fn load(&self) -> Result<TesterConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &TesterConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.saved.borrow_mut() = Some(config.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct EventRecorder {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventRecorder {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for EventRecorder {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}

// ── Harness ───────────────────────────────────────────────────

/// A fresh token per test; the service needs `'static`.
pub fn token() -> &'static CancelToken {
    Box::leak(Box::new(CancelToken::new()))
}

/// Everything one test drives, wired the way `main` wires the board.
pub struct Harness {
    pub app: AppService<Eeprom>,
    pub hw: Bench,
    pub link: HostLink,
    pub sink: EventRecorder,
    pub cancel: &'static CancelToken,
}

#[allow(dead_code)]
impl Harness {
    pub fn new(config: TesterConfig, hw: Bench) -> Self {
        Self::with_eeprom(config, hw, Eeprom::blank())
    }

    pub fn with_eeprom(config: TesterConfig, mut hw: Bench, eeprom: Eeprom) -> Self {
        let cancel = token();
        let store = ResultStore::new(eeprom).expect("512 bytes holds the table");
        let mut sink = EventRecorder::default();
        let mut app = AppService::new(config, store, cancel);
        app.start(&mut hw, &mut sink);
        Self {
            app,
            hw,
            link: HostLink::new(),
            sink,
            cancel,
        }
    }

    pub fn press(&mut self, press: ButtonPress) {
        self.app.handle_button(press, &mut self.hw, &mut self.sink);
    }

    pub fn presses(&mut self, presses: &[ButtonPress]) {
        for &p in presses {
            self.press(p);
        }
    }

    pub fn tick(&mut self) {
        self.app.tick(&mut self.hw, &mut self.link, &mut self.sink);
    }

    /// Tick until `done` holds, up to `max` ticks.  Returns ticks used.
    pub fn tick_until(&mut self, max: usize, mut done: impl FnMut(&Self) -> bool) -> usize {
        for n in 0..max {
            if done(self) {
                return n;
            }
            self.tick();
        }
        assert!(done(self), "condition not met within {max} ticks");
        max
    }

    /// Tick until the active run ends.
    pub fn finish_run(&mut self) -> usize {
        self.tick_until(2_000, |h| !h.app.is_running())
    }

    /// Queue host bytes.
    pub fn send(&mut self, bytes: &[u8]) {
        self.link.push_rx(bytes);
    }

    /// Host bytes received since the last call.
    pub fn replies(&mut self) -> Vec<u8> {
        self.link.take_tx()
    }
}

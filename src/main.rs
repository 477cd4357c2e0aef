//! Quad-pack tester firmware: main entry point.
//!
//! Hexagonal architecture with a single cooperative control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          LogEventSink   NvsAdapter  HostLink  │
//! │  (Sensor+Actuator+        (EventSink)    (Config +   (Serial)  │
//! │   Display+Environment)                    Storage)             │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  FSM · Safety gate · Test run · Result store · Remote  │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Button ISR → input queue + cancel token                       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{self, UartDriver};

use quadpack::adapters::environment::Esp32Environment;
use quadpack::adapters::hardware::{HardwareAdapter, board_stepper};
use quadpack::adapters::log_sink::LogEventSink;
use quadpack::adapters::nvs::{NvsAdapter, NvsResultTable};
use quadpack::adapters::serial::HostLink;
use quadpack::app::ports::ConfigPort;
use quadpack::app::service::AppService;
use quadpack::config::TesterConfig;
use quadpack::control::CANCEL;
use quadpack::drivers::buzzer::Buzzer;
use quadpack::drivers::gpio::{BoardDelay, BoardPin};
use quadpack::drivers::lcd::Lcd;
use quadpack::drivers::hw_init;
use quadpack::drivers::watchdog::Watchdog;
use quadpack::events;
use quadpack::pins;
use quadpack::sensors::{Scaling, SensorHub};
use quadpack::store::ResultStore;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  QuadPack tester v{}              ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // No ADC means no gate; never let a test start.
        error!("HAL init failed: {}; halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    if let Err(e) = hw_init::init_isr_service() {
        error!("ISR service init failed: {}; buttons disabled", e);
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new()?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            TesterConfig::default()
        }
    };
    let store = match NvsResultTable::open(nvs.clone()) {
        Ok(table) => ResultStore::new(table)?,
        Err(e) => anyhow::bail!("result table unavailable: {e}"),
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;

    // LCD on pins::LCD_SDA_GPIO / pins::LCD_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(pins::LCD_I2C_BAUD_HZ.Hz()),
    )?;
    let mut lcd = Lcd::new(i2c, pins::LCD_I2C_ADDR, BoardDelay);
    if let Err(e) = lcd.init() {
        warn!("LCD init failed: {:?}", e);
    }

    // Host link on pins::HOST_UART_TX_GPIO / pins::HOST_UART_RX_GPIO.
    let uart = UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        Option::<esp_idf_hal::gpio::AnyIOPin>::None,
        &uart::config::Config::new().baudrate(Hertz(pins::HOST_UART_BAUD)),
    )?;
    let mut serial = HostLink::new(uart);

    let mut hw = HardwareAdapter::new(
        SensorHub::new(Scaling::from_config(&config)),
        board_stepper(config.step_period_us),
        Buzzer::new(BoardPin::new(pins::BUZZER_GPIO)),
        lcd,
        Esp32Environment::default(),
    );
    let mut log_sink = LogEventSink::new();
    let watchdog = Watchdog::default();

    // ── 5. Construct app service ──────────────────────────────
    let mut app = AppService::new(config, store, &CANCEL);
    app.start(&mut hw, &mut log_sink);

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        events::drain_events(|press| app.handle_button(press, &mut hw, &mut log_sink));

        app.tick(&mut hw, &mut serial, &mut log_sink);

        if app.save_config_if_dirty(&nvs, &mut log_sink) {
            hw.set_scaling(Scaling::from_config(app.config()));
        }

        watchdog.feed();
        esp_idf_hal::delay::FreeRtos::delay_ms(app.config().control_tick_ms);
    }
}

//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `hardware`     | SensorPort         | ESP32 ADC (cell taps, shunt)|
//! |                | ActuatorPort       | A4988 stepper, buzzer GPIO  |
//! |                | DisplayPort        | HD44780 LCD over I²C        |
//! |                | EnvironmentPort    | see `environment`           |
//! | `environment`  | EnvironmentPort    | System wall clock           |
//! | `log_sink`     | EventSink          | Serial log output           |
//! | `nvs`          | ConfigPort         | NVS / in-memory store       |
//! |                | StoragePort        | (result slot table blob)    |
//! | `serial`       | SerialPort         | Host UART                   |

pub mod environment;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod serial;

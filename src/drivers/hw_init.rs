//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC channels, GPIO directions and the button interrupts
//! using raw ESP-IDF sys calls.  Called once from `main()` before the
//! event loop starts.  The host build keeps the same API with inert bodies.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 0 dB attenuation keeps the input range close to the 2.048 V reference
    // the divider and shunt amplifier were scaled for.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_0,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for ch in [
        pins::ADC1_CH_B1,
        pins::ADC1_CH_B2,
        pins::ADC1_CH_B3,
        pins::ADC1_CH_B4,
        pins::ADC1_CH_SHUNT,
    ] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ch, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcInitFailed(ret));
        }
    }

    info!("hw_init: ADC1 configured (4 cell taps + shunt)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
const BUTTON_PINS: [i32; 4] = [
    pins::BUTTON_OK_GPIO,
    pins::BUTTON_BACK_GPIO,
    pins::BUTTON_UP_GPIO,
    pins::BUTTON_DOWN_GPIO,
];

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    for &pin in &BUTTON_PINS {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_NEGEDGE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
    }

    info!("hw_init: button inputs configured");
    Ok(())
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    let output_pins = [
        pins::STEPPER_STEP_GPIO,
        pins::STEPPER_DIR_GPIO,
        pins::STEPPER_SLEEP_GPIO,
        pins::BUZZER_GPIO,
    ];

    for &pin in &output_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_OUTPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }
        // Stepper asleep, buzzer silent.
        unsafe { gpio_set_level(pin, 0) };
    }

    info!("hw_init: stepper and buzzer outputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an output pin configured in
    // init_gpio_outputs(). Main-loop only.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::button_isr_handler;
#[cfg(target_os = "espidf")]
use crate::events::ButtonPress;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(arg: *mut core::ffi::c_void) {
    // The handler argument carries the ButtonPress discriminant.
    let Some(press) = ButtonPress::from_u8(arg as usize as u8) else {
        return;
    };
    // SAFETY: esp_timer_get_time is a RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    button_isr_handler(press, now_ms);
}

/// Install the per-pin GPIO ISR service and register the button handlers.
/// Call after init_peripherals() and before the event loop.
#[cfg(target_os = "espidf")]
pub fn init_isr_service() -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service was already
    // installed.  The handlers only touch atomics and the
    // critical-section input queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let buttons = [
            (pins::BUTTON_OK_GPIO, ButtonPress::Ok),
            (pins::BUTTON_BACK_GPIO, ButtonPress::Back),
            (pins::BUTTON_UP_GPIO, ButtonPress::Up),
            (pins::BUTTON_DOWN_GPIO, ButtonPress::Down),
        ];
        for (pin, press) in buttons {
            gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_NEGEDGE);
            gpio_isr_handler_add(pin, Some(button_gpio_isr), press as u8 as usize as *mut _);
            gpio_intr_enable(pin);
        }

        info!("hw_init: ISR service installed (4 buttons)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

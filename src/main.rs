//! ColdGuard Firmware: Main Entry Point
//!
//! Hexagonal architecture with event-driven execution.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter   Esp32Clock      │
//! │  (Sensor+Relay)    (EventSink)    (Config+NVS) (ClockPort)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          ControllerService (pure logic)                │    │
//! │  │  Signal · Health · Protections · Cascade · Alarms      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ISR event flags · command / relay-ack channels · watchdog     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::{debug, info, warn};

use coldguard::adapters::hardware::HardwareAdapter;
use coldguard::adapters::log_sink::LogEventSink;
use coldguard::adapters::nvs::NvsAdapter;
use coldguard::adapters::time::Esp32Clock;
use coldguard::app::ports::{ClockPort, ConfigPort};
use coldguard::app::service::ControllerService;
use coldguard::channels::{self, RELAY_ACK_CHANNEL};
use coldguard::config::ControllerConfig;
use coldguard::diagnostics;
use coldguard::drivers::{hw_init, hw_timer, relay::RelayDriver, watchdog::Watchdog};
use coldguard::events::{self, Event};
use coldguard::pins;
use coldguard::sensors::{power::PowerMeter, temperature::NtcProbe, SensorHub};

/// Status line every minute at the default tick.
const STATUS_LOG_EVERY: u32 = 12;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    info!("╔══════════════════════════════════════╗");
    info!("║  ColdGuard v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = match NvsAdapter::new() {
        Ok(n) => n,
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            NvsAdapter::default()
        }
    };
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            ControllerConfig::default()
        }
    };

    // ── 3. Initialise hardware peripherals ────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Relay stays de-energised; the watchdog is not armed yet, so
        // halt here and let the operator see the log.
        log::error!("HAL init failed: {}, halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    #[cfg(target_os = "espidf")]
    let (coil, feedback) = {
        use esp_idf_hal::gpio::PinDriver;
        use esp_idf_hal::peripherals::Peripherals;

        let p = Peripherals::take()?;
        // Must match pins::RELAY_COIL_GPIO / pins::RELAY_FEEDBACK_GPIO.
        let coil = PinDriver::output(p.pins.gpio10)?;
        let feedback = if pins::RELAY_FEEDBACK_FITTED {
            Some(PinDriver::input(p.pins.gpio11)?)
        } else {
            None
        };
        (coil, feedback)
    };

    #[cfg(not(target_os = "espidf"))]
    let (coil, feedback) = {
        use coldguard::drivers::relay::SimCoil;
        let coil = SimCoil::new(false);
        let contact = pins::RELAY_FEEDBACK_FITTED.then(|| coil.contact());
        (coil, contact)
    };

    let relay = RelayDriver::new(coil, feedback, &RELAY_ACK_CHANNEL);

    if let Err(e) = hw_init::init_isr_service() {
        log::error!("ISR service init failed: {}, override button disabled", e);
    }
    hw_timer::start_timers(config.control_interval_ms);
    let watchdog = Watchdog::default();

    // ── 4. Construct adapters ─────────────────────────────────
    let sensor_hub = SensorHub::new(
        NtcProbe::new(pins::ADC1_CH_AIR),
        NtcProbe::new(pins::ADC1_CH_EVAP),
        PowerMeter::new(pins::ADC1_CH_POWER, pins::POWER_CT_FITTED),
    );
    let clock = Esp32Clock::new();
    let mut hw = HardwareAdapter::new(sensor_hub, relay, Esp32Clock::new());
    let mut log_sink = LogEventSink::new(STATUS_LOG_EVERY);

    // ── 5. Construct the controller and reconcile ─────────────
    let mut controller = ControllerService::new(config.clone());
    let report = controller.boot(&hw, &clock, &mut nvs, &mut log_sink);
    info!(
        "Boot: {:?} (offline credit {} s, cycle counted: {})",
        report.case, report.elapsed_secs, report.cycle_counted
    );

    let faults = controller.faults(&nvs);
    if !faults.is_empty() {
        warn!("{} fault(s) recorded since last clear", faults.len());
        for f in &faults {
            warn!("  [{} s] {:?}: {}", f.uptime_secs, f.kind, f.reason);
        }
    }

    info!("System ready. Entering event loop.");

    // ── 6. Event loop ─────────────────────────────────────────
    loop {
        // Simulate timer interrupts via sleep on non-espidf targets.
        #[cfg(not(target_os = "espidf"))]
        {
            std::thread::sleep(std::time::Duration::from_millis(u64::from(
                controller.config().control_interval_ms,
            )));
            events::push_event(Event::ControlTick);
        }

        events::drain_events(|event| match event {
            Event::ControlTick => {
                let _ = controller.tick(&mut hw, &clock, &mut nvs, &mut log_sink);
            }

            Event::CommandReceived => {
                while let Some(cmd) = channels::next_command() {
                    debug!("Command: {:?}", cmd);
                    // Rejections are emitted through the sink.
                    let _ = controller.handle_command(cmd, &clock, &mut nvs, &mut log_sink);
                }
            }

            Event::OverrideEdge => {
                // The level is sampled on the next control tick.
                debug!("Override input edge");
            }

            Event::RelayFeedback => {
                // Verified against the command on the next ack poll.
                debug!("Relay contact edge");
            }

            Event::WatchdogTick => watchdog.feed(),
        });

        // Config auto-save (debounced after the last change).
        controller.auto_save_if_needed(clock.monotonic_secs(), &nvs);

        // Feed watchdog on every iteration.
        if watchdog.is_starved() {
            warn!("Control loop overran the {} ms watchdog limit", watchdog.timeout_ms());
        }
        watchdog.feed();

        #[cfg(target_os = "espidf")]
        esp_idf_hal::delay::FreeRtos::delay_ms(10);
    }
}

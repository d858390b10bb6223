//! Integration tests: ControllerService on the host build of the real
//! adapters (simulated ADC, simulated relay pins, in-memory NVS).

#![cfg(not(target_os = "espidf"))]

use std::cell::Cell;
use std::rc::Rc;

use embassy_sync::channel::Channel;

use coldguard::adapters::hardware::HardwareAdapter;
use coldguard::adapters::log_sink::LogEventSink;
use coldguard::adapters::nvs::NvsAdapter;
use coldguard::app::ports::{ClockPort, ConfigPort, StoragePort};
use coldguard::app::service::ControllerService;
use coldguard::boot::BootCase;
use coldguard::channels::AckChannel;
use coldguard::codes::StatusCode;
use coldguard::config::ControllerConfig;
use coldguard::drivers::hw_init::sim_set_adc;
use coldguard::drivers::relay::{RelayDriver, SimCoil, SimContact};
use coldguard::persist;
use coldguard::safety::Alarm;
use coldguard::sensors::SensorHub;
use coldguard::sensors::power::PowerMeter;
use coldguard::sensors::temperature::{NtcProbe, adc_to_celsius};

// ── Helpers ───────────────────────────────────────────────────

/// Clock shared between the adapter (sample stamps) and the service.
#[derive(Clone, Default)]
struct SharedClock(Rc<Cell<u64>>);

impl SharedClock {
    fn set(&self, secs: u64) {
        self.0.set(secs);
    }
}

impl ClockPort for SharedClock {
    fn monotonic_secs(&self) -> u64 {
        self.0.get()
    }

    fn wall_secs(&self) -> Option<u64> {
        None
    }

    fn local_hour(&self) -> Option<u8> {
        None
    }
}

/// ADC count closest to a probe temperature.
fn raw_for(celsius: f32) -> u16 {
    (1..4095u16)
        .filter_map(|raw| adc_to_celsius(raw).ok().map(|c| (raw, (c - celsius).abs())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(raw, _)| raw)
        .unwrap()
}

fn hub(air_ch: u32, evap_ch: u32) -> SensorHub {
    SensorHub::new(
        NtcProbe::new(air_ch),
        NtcProbe::new(evap_ch),
        PowerMeter::new(0, false),
    )
}

// ── Tests ─────────────────────────────────────────────────────

#[test]
fn warm_cabinet_energises_the_coil_and_confirms() {
    static ACKS: AckChannel = Channel::new();
    // Each test drives its own ADC channels.
    sim_set_adc(0, raw_for(7.0));
    sim_set_adc(1, raw_for(-10.0));

    let clock = SharedClock::default();
    let coil = SimCoil::new(false);
    let relay = RelayDriver::new(coil.clone(), Some(coil.contact()), &ACKS);
    let mut hw = HardwareAdapter::new(hub(0, 1), relay, clock.clone());
    let mut nvs = NvsAdapter::default();
    let mut sink = LogEventSink::default();

    let mut ctl = ControllerService::new(nvs.load().unwrap());
    let report = ctl.boot(&hw, &clock, &mut nvs, &mut sink);
    assert_eq!(report.case, BootCase::KeepIdle);
    assert!(nvs.exists(persist::NAMESPACE, persist::keys::RELAY));

    clock.set(5);
    ctl.tick(&mut hw, &clock, &mut nvs, &mut sink).unwrap();
    assert!(coil.is_energised());
    assert_eq!(ctl.status(), StatusCode::Cooling);
    assert!(!ctl.build_status(5).relay_confirmed);

    // The contact is verified on the next poll.
    clock.set(10);
    ctl.tick(&mut hw, &clock, &mut nvs, &mut sink).unwrap();
    let status = ctl.build_status(10);
    assert!(status.relay_confirmed);
    assert_eq!(status.relay_errors, 0);
    let air = status.air_raw_c.unwrap();
    assert!((air - 7.0).abs() < 0.2, "air read as {air}");
}

#[test]
fn contact_that_never_closes_is_counted_as_relay_error() {
    static ACKS: AckChannel = Channel::new();
    sim_set_adc(2, raw_for(8.0));
    sim_set_adc(3, raw_for(-10.0));

    let clock = SharedClock::default();
    let coil = SimCoil::new(false);
    let relay = RelayDriver::new(coil.clone(), Some(SimContact::stuck(false)), &ACKS);
    let mut hw = HardwareAdapter::new(hub(2, 3), relay, clock.clone());
    let mut nvs = NvsAdapter::default();
    let mut sink = LogEventSink::default();

    let mut ctl = ControllerService::new(ControllerConfig::default());
    ctl.boot(&hw, &clock, &mut nvs, &mut sink);

    clock.set(5);
    ctl.tick(&mut hw, &clock, &mut nvs, &mut sink).unwrap();
    assert!(ctl.state().timing.intended());

    clock.set(10);
    ctl.tick(&mut hw, &clock, &mut nvs, &mut sink).unwrap();
    let status = ctl.build_status(10);
    assert!(status.relay_errors >= 1);
    assert!(!status.relay_confirmed);
}

#[test]
fn welded_contact_latches_weld_after_one_off_command() {
    static ACKS: AckChannel = Channel::new();
    sim_set_adc(4, raw_for(2.0));
    sim_set_adc(5, raw_for(-10.0));

    // Contacts fused closed: the board boots with the compressor running.
    let clock = SharedClock::default();
    let coil = SimCoil::new(false);
    let relay = RelayDriver::new(coil.clone(), Some(SimContact::stuck(true)), &ACKS);
    let mut hw = HardwareAdapter::new(hub(4, 5), relay, clock.clone());
    let mut nvs = NvsAdapter::default();
    let mut sink = LogEventSink::default();

    let mut ctl = ControllerService::new(ControllerConfig::default());
    assert_eq!(ctl.boot(&hw, &clock, &mut nvs, &mut sink).case, BootCase::SyncedOn);

    let mut t = 0;
    while ctl.state().timing.intended() {
        t += 5;
        assert!(t <= 120, "cold cabinet never switched off");
        clock.set(t);
        ctl.tick(&mut hw, &clock, &mut nvs, &mut sink).unwrap();
    }
    assert!(!coil.is_energised());

    for _ in 0..20 {
        t += 5;
        clock.set(t);
        ctl.tick(&mut hw, &clock, &mut nvs, &mut sink).unwrap();
    }
    assert!(ctl.state().alarms.is_active(Alarm::Weld));
    assert!(ctl.state().alarms.is_fatal());
    assert!(!ctl.state().timing.intended());
    assert!(!coil.is_energised());
    let status = ctl.build_status(t);
    assert!(status.relay_confirmed);
    assert!(status.relay_stuck);
    assert_eq!(status.cycles, 0);
}

#[test]
fn config_saved_through_nvs_is_loaded_on_next_start() {
    let nvs = NvsAdapter::default();
    let mut ctl = ControllerService::new(nvs.load().unwrap());
    let cfg = ControllerConfig {
        target_temp_c: 2.5,
        hysteresis_c: 0.8,
        ..ControllerConfig::default()
    };

    let clock = SharedClock::default();
    let mut storage = NvsAdapter::default();
    let mut sink = LogEventSink::default();
    ctl.handle_command(
        coldguard::app::commands::ControlCommand::UpdateConfig(cfg.clone()),
        &clock,
        &mut storage,
        &mut sink,
    )
    .unwrap();

    ctl.force_save_if_dirty(&nvs);
    assert!(!ctl.is_config_dirty());
    assert_eq!(nvs.load().unwrap(), cfg);
}

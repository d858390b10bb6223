//! End-to-end scenarios: ports → ControllerService → relay commands.
//!
//! Every scenario ticks at the default 5 s control interval against the
//! mock adapters.

use coldguard::app::commands::{CommandRejection, ControlCommand};
use coldguard::app::events::ControllerEvent;
use coldguard::app::service::ControllerService;
use coldguard::boot::BootCase;
use coldguard::codes::{ReasonCode, StatusCode};
use coldguard::config::ControllerConfig;
use coldguard::safety::Alarm;

use super::mock_hw::{MockClock, MockHardware, MockStorage, RecordingSink};

const WALL: u64 = 1_700_000_000;

struct Rig {
    ctl: ControllerService,
    hw: MockHardware,
    clock: MockClock,
    storage: MockStorage,
    sink: RecordingSink,
}

impl Rig {
    fn new(hw: MockHardware, clock: MockClock, storage: MockStorage) -> Self {
        Self {
            ctl: ControllerService::new(ControllerConfig::default()),
            hw,
            clock,
            storage,
            sink: RecordingSink::new(),
        }
    }

    fn booted() -> Self {
        Self::booted_with(ControllerConfig::default())
    }

    fn booted_with(config: ControllerConfig) -> Self {
        let mut rig = Self::new(MockHardware::new(), MockClock::new(), MockStorage::new());
        rig.ctl = ControllerService::new(config);
        rig.boot();
        rig
    }

    fn boot(&mut self) -> BootCase {
        self.ctl
            .boot(&self.hw, &self.clock, &mut self.storage, &mut self.sink)
            .case
    }

    fn tick_at(&mut self, t: u64) -> Option<coldguard::cascade::DecisionResult> {
        self.clock.set(t);
        self.hw.set_now(t);
        self.ctl
            .tick(&mut self.hw, &self.clock, &mut self.storage, &mut self.sink)
    }

    fn command(&mut self, cmd: ControlCommand) -> Result<(), CommandRejection> {
        self.ctl
            .handle_command(cmd, &self.clock, &mut self.storage, &mut self.sink)
    }
}

// ── Thermostat ────────────────────────────────────────────────

#[test]
fn warm_cabinet_starts_cooling() {
    let mut rig = Rig::booted();
    assert_eq!(rig.ctl.status(), StatusCode::Idle);

    let d = rig.tick_at(5).expect("decision");
    assert!(d.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Cooling);
    assert_eq!(rig.hw.relay_calls, vec![true]);
    assert_eq!(
        rig.sink.count(|e| matches!(e, ControllerEvent::RelaySwitched { on: true, .. })),
        1
    );

    let status = rig.sink.last_status().expect("status report");
    assert!(status.relay_on);
    assert_eq!(status.setpoint_c, 4.0);
}

#[test]
fn min_on_holds_relay_until_elapsed() {
    let mut rig = Rig::booted();
    rig.tick_at(5);
    assert!(rig.hw.relay_on);

    rig.hw.air_c = Some(2.0);
    rig.tick_at(10);
    assert_eq!(rig.ctl.status(), StatusCode::WantIdle);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::ProtMinOn);

    for t in (15..=60).step_by(5) {
        rig.tick_at(t);
        assert!(rig.hw.relay_on, "relay dropped at t={t}");
    }
    assert_eq!(rig.hw.switch_count(), 1);

    rig.tick_at(65);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
    assert_eq!(rig.ctl.state().stats.cycles(), 1);
}

#[test]
fn min_off_blocks_quick_restart() {
    // The step back to 9 °C would otherwise look like an open door.
    let mut rig = Rig::booted_with(ControllerConfig {
        door_rate_c_per_min: 100.0,
        ..ControllerConfig::default()
    });
    rig.tick_at(5);
    rig.hw.air_c = Some(2.0);
    for t in (10..=65).step_by(5) {
        rig.tick_at(t);
    }
    assert!(!rig.hw.relay_on);

    rig.hw.air_c = Some(9.0);
    let mut t = 70;
    while t < 65 + 180 {
        rig.tick_at(t);
        assert!(!rig.hw.relay_on, "restarted after only {}s", t - 65);
        t += 5;
    }
    assert_eq!(rig.ctl.status(), StatusCode::WantCool);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::ProtMinOff);

    rig.tick_at(65 + 180);
    assert!(rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Cooling);
}

// ── Defrost ───────────────────────────────────────────────────

#[test]
fn cold_evaporator_holds_dynamic_defrost_until_warm_and_dwelled() {
    let mut rig = Rig::booted();
    rig.hw.evap_c = Some(-20.0);
    for t in [5, 10, 15] {
        rig.tick_at(t);
        assert!(!rig.hw.relay_on);
        assert_eq!(rig.ctl.state().decision.reason, ReasonCode::DefrostDynamic);
    }

    rig.hw.evap_c = Some(2.0);
    let mut ended_at = None;
    for t in (20..=400).step_by(5) {
        rig.tick_at(t);
        if !rig.ctl.state().defrost.any_active() {
            ended_at = Some(t);
            break;
        }
        assert!(!rig.hw.relay_on, "compressor ran during defrost at t={t}");
        assert!(rig.sink.last_status().is_some_and(|s| s.defrost));
    }

    let ended_at = ended_at.expect("defrost never finished");
    assert!(ended_at >= 20 + 120, "dwell cut short: ended at {ended_at}");
    // Same tick: the thermostat takes over again.
    assert!(rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Cooling);
}

#[test]
fn manual_defrost_forces_compressor_off() {
    let mut rig = Rig::booted();
    rig.tick_at(5);
    assert!(rig.hw.relay_on);

    rig.clock.set(7);
    assert_eq!(rig.command(ControlCommand::StartDefrost), Ok(()));
    assert_eq!(
        rig.command(ControlCommand::StartDefrost),
        Err(CommandRejection::DefrostUnavailable)
    );

    // Forced off ignores the minimum run time.
    rig.tick_at(10);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::DefrostTriggered);
    assert!(rig.sink.last_status().is_some_and(|s| s.defrost));
}

#[test]
fn manual_defrost_refused_during_turbo() {
    let mut rig = Rig::booted();
    assert_eq!(rig.command(ControlCommand::SetTurbo(true)), Ok(()));
    assert_eq!(
        rig.command(ControlCommand::StartDefrost),
        Err(CommandRejection::DefrostUnavailable)
    );
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            ControllerEvent::CommandRejected(CommandRejection::DefrostUnavailable)
        )),
        1
    );
}

#[test]
fn sudden_warming_pauses_for_open_door() {
    let mut rig = Rig::booted();
    rig.tick_at(5);
    rig.tick_at(10);
    assert!(rig.hw.relay_on);

    rig.hw.air_c = Some(10.0);
    rig.tick_at(15);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::ProtDoorOpen);
    assert!(rig.sink.last_status().is_some_and(|s| s.door_open));
}

// ── Sensor failure ────────────────────────────────────────────

#[test]
fn air_probe_loss_goes_critical_then_limp() {
    let mut rig = Rig::booted();
    rig.tick_at(5);
    assert!(rig.hw.relay_on);

    rig.hw.air_c = None;
    for t in [10, 15, 20, 25] {
        rig.tick_at(t);
        assert!(!rig.ctl.state().air.health.is_critical());
    }

    // 25 s without a valid sample.
    let d = rig.tick_at(30).expect("decision");
    assert_eq!(d.detail, "air_critical");
    assert!(!rig.hw.relay_on);
    assert!(rig.ctl.state().limp.is_active());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::AlarmRaised(Alarm::SensorFail))),
        1
    );

    // Limp duty cycle starts in its on phase and bypasses min-off.
    rig.tick_at(35);
    assert!(rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::LimpCool);
    assert!(rig.sink.last_status().is_some_and(|s| s.limp && s.air_flags.critical));
}

#[test]
fn recovered_probe_leaves_limp() {
    let mut rig = Rig::booted();
    rig.hw.air_c = None;
    for t in (5..=30).step_by(5) {
        rig.tick_at(t);
    }
    assert!(rig.ctl.state().limp.is_active());

    rig.hw.air_c = Some(7.0);
    rig.tick_at(35);
    assert!(!rig.ctl.state().limp.is_active());
    assert!(!rig.ctl.state().air.health.is_critical());
}

// ── Override / turbo ──────────────────────────────────────────

#[test]
fn override_press_toggles_turbo() {
    let mut rig = Rig::booted();

    rig.hw.override_pressed = true;
    rig.tick_at(5);
    assert!(rig.ctl.state().turbo.is_active());
    assert_eq!(rig.ctl.status(), StatusCode::TurboCool);

    // Holding the button is not a second press.
    rig.tick_at(10);
    assert!(rig.ctl.state().turbo.is_active());

    rig.hw.override_pressed = false;
    rig.tick_at(15);
    rig.hw.override_pressed = true;
    rig.tick_at(20);
    assert!(!rig.ctl.state().turbo.is_active());
    assert_eq!(rig.ctl.status(), StatusCode::Cooling);
}

// ── Reboot ────────────────────────────────────────────────────

#[test]
fn reboot_after_power_cut_counts_cycle_and_rests() {
    let mut first = Rig::new(MockHardware::new(), MockClock::with_wall(WALL), MockStorage::new());
    assert_eq!(first.boot(), BootCase::KeepIdle);
    first.tick_at(5);
    assert!(first.hw.relay_on);

    // Power returns 100 s later with the relay dropped out.
    let storage = std::mem::take(&mut first.storage);
    let mut second = Rig::new(MockHardware::new(), MockClock::with_wall(WALL + 105), storage);
    let report = second
        .ctl
        .boot(&second.hw, &second.clock, &mut second.storage, &mut second.sink);
    assert_eq!(report.case, BootCase::SyncedOff);
    assert!(report.cycle_counted);
    assert_eq!(second.ctl.state().stats.cycles(), 1);
    assert_eq!(
        second
            .sink
            .count(|e| matches!(e, ControllerEvent::Started(BootCase::SyncedOff))),
        1
    );

    second.tick_at(5);
    assert!(!second.hw.relay_on);
    assert_eq!(second.ctl.status(), StatusCode::WantCool);
    assert_eq!(second.ctl.state().decision.reason, ReasonCode::ProtMinOff);
}

#[test]
fn reboot_with_relay_still_on_keeps_running() {
    let mut first = Rig::new(MockHardware::new(), MockClock::with_wall(WALL), MockStorage::new());
    first.boot();
    first.tick_at(5);

    let storage = std::mem::take(&mut first.storage);
    let mut second = Rig::new(
        MockHardware::with_relay_on(),
        MockClock::with_wall(WALL + 105),
        storage,
    );
    assert_eq!(second.boot(), BootCase::KeepRunning);
    assert!(second.ctl.state().timing.intended());

    // The run before the reboot already covers the minimum run time.
    second.hw.air_c = Some(2.0);
    second.tick_at(5);
    assert!(!second.hw.relay_on);
    assert_eq!(second.hw.relay_calls, vec![false]);
}

#[test]
fn tick_before_boot_reports_boot_and_leaves_relay() {
    let mut rig = Rig::new(MockHardware::new(), MockClock::new(), MockStorage::new());
    assert!(rig.tick_at(5).is_none());
    assert!(rig.hw.relay_calls.is_empty());
    assert_eq!(
        rig.sink.last_status().map(|s| s.status),
        Some(StatusCode::Boot)
    );
}

#[test]
fn persisted_setpoint_survives_reboot() {
    let mut first = Rig::booted();
    assert_eq!(first.command(ControlCommand::SetSetpoint(6.0)), Ok(()));
    first.tick_at(5);

    let storage = std::mem::take(&mut first.storage);
    let mut second = Rig::new(MockHardware::new(), MockClock::new(), storage);
    second.boot();
    assert_eq!(second.ctl.config().target_temp_c, 6.0);
}

// ── Commands and config ───────────────────────────────────────

#[test]
fn setpoint_outside_limits_is_rejected() {
    let mut rig = Rig::booted();
    assert_eq!(
        rig.command(ControlCommand::SetSetpoint(40.0)),
        Err(CommandRejection::SetpointOutOfRange)
    );
    assert_eq!(
        rig.command(ControlCommand::SetSetpoint(f32::NAN)),
        Err(CommandRejection::SetpointOutOfRange)
    );
    assert_eq!(rig.ctl.config().target_temp_c, 4.0);
}

#[test]
fn setpoint_floor_follows_freeze_cutoff() {
    let mut rig = Rig::booted();
    assert_eq!(
        rig.command(ControlCommand::SetSetpoint(1.0)),
        Err(CommandRejection::SetpointOutOfRange)
    );
    let floor = rig.ctl.config().min_setpoint_c();
    assert!(floor > 1.0);
    assert_eq!(rig.command(ControlCommand::SetSetpoint(floor)), Ok(()));
    assert_eq!(rig.ctl.config().target_temp_c, floor);
}

#[test]
fn config_update_is_validated_then_auto_saved() {
    let mut rig = Rig::booted();

    let bad = ControllerConfig {
        hysteresis_c: 0.0,
        ..ControllerConfig::default()
    };
    assert!(matches!(
        rig.command(ControlCommand::UpdateConfig(bad)),
        Err(CommandRejection::InvalidConfig(_))
    ));
    assert!(!rig.ctl.is_config_dirty());

    let good = ControllerConfig {
        target_temp_c: 3.0,
        ..ControllerConfig::default()
    };
    rig.clock.set(10);
    assert_eq!(rig.command(ControlCommand::UpdateConfig(good)), Ok(()));
    assert!(rig.ctl.is_config_dirty());
    assert_eq!(rig.ctl.config().target_temp_c, 3.0);

    assert!(!rig.ctl.auto_save_if_needed(12, &rig.storage));
    assert!(rig.ctl.auto_save_if_needed(15, &rig.storage));
    assert!(!rig.ctl.is_config_dirty());
    assert_eq!(rig.storage.saved_config().map(|c| c.target_temp_c), Some(3.0));
}

#[test]
fn status_dump_is_json() {
    let mut rig = Rig::booted();
    rig.tick_at(5);
    assert_eq!(rig.command(ControlCommand::DumpStatus), Ok(()));

    let json = rig
        .sink
        .events
        .iter()
        .find_map(|e| match e {
            ControllerEvent::StatusDump(json) => Some(json.clone()),
            _ => None,
        })
        .expect("status dump emitted");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["relay_on"], serde_json::Value::Bool(true));
    assert_eq!(value["status"], serde_json::Value::from("COOLING"));
}

// ── Relay faults ──────────────────────────────────────────────

#[test]
fn refused_relay_command_is_counted_and_status_mirrors_relay() {
    let mut rig = Rig::booted();
    rig.hw.refuse_commands = true;

    rig.tick_at(5);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(rig.ctl.state().relay_errors.total, 1);

    rig.hw.refuse_commands = false;
    rig.tick_at(10);
    assert!(rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Cooling);
}

#[test]
fn failed_ack_reverts_intended_state() {
    let mut rig = Rig::booted();
    rig.hw.fail_acks = true;

    rig.tick_at(5);
    assert!(rig.ctl.state().timing.intended());

    // The failure reverts to OFF and the thermostat asks again.
    rig.hw.fail_acks = false;
    rig.tick_at(10);
    assert_eq!(rig.ctl.state().relay_errors.total, 1);
    assert!(rig.hw.relay_on);
    assert!(rig.ctl.state().timing.intended());
    assert_eq!(rig.hw.relay_calls, vec![true, true]);
}

#[test]
fn fused_contact_latches_weld_without_retrying() {
    let mut rig = Rig::booted();
    for t in (5..=65).step_by(5) {
        rig.tick_at(t);
    }
    assert!(rig.hw.relay_on);

    // The contact is fused: every OFF comes back as a feedback mismatch.
    rig.hw.fail_acks = true;
    rig.hw.air_c = Some(2.0);
    let mut off_at = 65;
    while rig.hw.relay_calls.len() < 2 {
        off_at += 5;
        assert!(off_at < 200, "thermostat never asked for OFF");
        rig.tick_at(off_at);
    }
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
    assert_eq!(rig.ctl.state().stats.cycles(), 1);

    rig.tick_at(off_at + 5);
    assert!(rig.hw.relay_on);
    assert!(rig.ctl.state().alarms.is_active(Alarm::Weld));
    assert!(rig.ctl.state().alarms.is_fatal());
    assert!(!rig.ctl.state().timing.intended());
    assert!(rig.ctl.state().timing.confirmed());
    // The run never ended, so no cycle is counted.
    assert_eq!(rig.ctl.state().stats.cycles(), 0);

    // Cabinet keeps cooling with the compressor stuck on.
    for i in 2..=120u64 {
        rig.hw.air_c = Some(2.0 - 1.2 * i as f32 / 120.0);
        rig.tick_at(off_at + i * 5);
    }
    assert_eq!(rig.hw.relay_calls, vec![true, false]);
    assert_eq!(rig.ctl.state().stats.cycles(), 0);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::AlarmRaised(Alarm::Weld))),
        1
    );
    let status = rig.sink.last_status().expect("status report");
    assert!(status.relay_stuck);
    assert!(status.relay_confirmed);
    assert!(!status.relay_on);
    assert_eq!(status.alarm, Some(Alarm::Weld));

    // The latch survives a reboot; OFF is commanded once more and no new
    // alarm is raised.
    let storage = std::mem::take(&mut rig.storage);
    let mut second = Rig::new(MockHardware::with_relay_on(), MockClock::new(), storage);
    second.hw.fail_acks = true;
    second.boot();
    assert!(second.ctl.state().alarms.is_active(Alarm::Weld));
    for t in (5..=60).step_by(5) {
        second.tick_at(t);
    }
    assert_eq!(second.hw.relay_calls, vec![false]);
    assert_eq!(
        second
            .sink
            .count(|e| matches!(e, ControllerEvent::AlarmRaised(_))),
        0
    );
}

#[test]
fn cabinet_cooling_after_off_flags_weld() {
    let mut rig = Rig::booted_with(ControllerConfig {
        door_rate_c_per_min: 100.0,
        ..ControllerConfig::default()
    });
    rig.tick_at(5);
    rig.hw.air_c = Some(2.5);
    for t in (10..=65).step_by(5) {
        rig.tick_at(t);
    }
    assert!(!rig.hw.relay_on);
    let off_at = 65;

    // No relay feedback: only the air temperature shows the weld.
    rig.hw.air_c = Some(0.8);
    let mut raised_at = None;
    for t in (70..=off_at + 700).step_by(5) {
        rig.tick_at(t);
        if rig.ctl.state().alarms.is_active(Alarm::Weld) {
            raised_at = Some(t);
            break;
        }
    }
    let raised_at = raised_at.expect("weld never detected");
    assert!(raised_at >= off_at + 600, "weld flagged during the wait: {raised_at}");
    assert!(rig.ctl.state().alarms.is_fatal());
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::None);
    assert!(!rig.hw.relay_on);
}

// ── Protections ───────────────────────────────────────────────

#[test]
fn max_run_forces_compressor_off() {
    let mut rig = Rig::booted_with(ControllerConfig {
        max_on_secs: 300,
        ..ControllerConfig::default()
    });
    rig.tick_at(5);
    for t in (10..305).step_by(5) {
        rig.tick_at(t);
        assert!(rig.hw.relay_on, "relay dropped at t={t}");
    }

    rig.tick_at(305);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::ProtMaxOn);

    // Still warm, but the rest period applies.
    rig.tick_at(310);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::WantCool);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::ProtMinOff);
}

#[test]
fn freeze_lock_holds_until_recovered() {
    let mut rig = Rig::booted_with(ControllerConfig {
        door_rate_c_per_min: 100.0,
        ..ControllerConfig::default()
    });
    rig.tick_at(5);
    assert!(rig.hw.relay_on);

    rig.hw.air_c = Some(0.2);
    let mut t = 5;
    while rig.ctl.state().decision.reason != ReasonCode::ProtAirFreeze {
        t += 5;
        assert!(t < 200, "freeze lock never engaged");
        rig.tick_at(t);
    }
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(rig.ctl.state().protection.freeze.lock_count(), 1);

    // Back above cut-off + recovery hysteresis.
    rig.hw.air_c = Some(2.0);
    let warmed_at = t;
    while rig.ctl.state().decision.reason == ReasonCode::ProtAirFreeze {
        t += 5;
        assert!(t < warmed_at + 600, "freeze lock never released");
        rig.tick_at(t);
        assert!(!rig.hw.relay_on);
    }
    assert!(t >= warmed_at + 300, "released after {}s", t - warmed_at);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::None);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
}

#[test]
fn locked_rotor_stays_latched_across_reboot() {
    let mut rig = Rig::booted();
    rig.hw.power_w = Some(900.0);
    rig.tick_at(5);
    rig.tick_at(10);
    // Inrush mask still covers the start.
    assert!(rig.hw.relay_on);

    rig.tick_at(15);
    assert!(!rig.hw.relay_on);
    assert!(rig.ctl.state().alarms.is_active(Alarm::Locked));
    assert!(rig.ctl.state().alarms.is_fatal());
    assert_eq!(
        rig.sink
            .count(|e| matches!(e, ControllerEvent::AlarmRaised(Alarm::Locked))),
        1
    );

    let storage = std::mem::take(&mut rig.storage);
    let mut second = Rig::new(MockHardware::new(), MockClock::new(), storage);
    second.boot();
    for t in (5..=300).step_by(5) {
        second.tick_at(t);
    }
    assert!(second.hw.relay_calls.is_empty());
    assert!(second.ctl.state().alarms.is_fatal());
    assert_eq!(
        second.sink.last_status().and_then(|s| s.alarm),
        Some(Alarm::Locked)
    );
}

#[test]
fn ghost_run_escalates_to_fatal() {
    let mut rig = Rig::booted_with(ControllerConfig {
        ghost_fatal_count: 1,
        ..ControllerConfig::default()
    });
    // Relay on but the compressor draws nothing.
    rig.hw.power_w = Some(5.0);
    let mut t = 0;
    while !rig.ctl.state().alarms.is_active(Alarm::CompGhost) {
        t += 5;
        assert!(t <= 120, "ghost run never detected");
        rig.tick_at(t);
    }
    assert!(t >= 15 + 60, "ghost flagged after only {t}s");
    assert!(rig.ctl.state().alarms.is_fatal());
    assert!(!rig.hw.relay_on);

    let storage = std::mem::take(&mut rig.storage);
    let mut second = Rig::new(MockHardware::new(), MockClock::new(), storage);
    second.boot();
    second.tick_at(5);
    assert!(second.ctl.state().alarms.is_active(Alarm::CompGhost));
    assert!(second.ctl.state().alarms.is_fatal());
    assert!(second.hw.relay_calls.is_empty());
}

// ── Scheduled defrost and tuning ──────────────────────────────

#[test]
fn scheduled_defrost_starts_on_the_hour() {
    let mut rig = Rig::booted();
    rig.clock.hour.set(Some(2));
    rig.tick_at(5);
    assert!(rig.hw.relay_on);

    rig.clock.hour.set(Some(3));
    rig.tick_at(10);
    assert!(!rig.hw.relay_on);
    assert_eq!(rig.ctl.status(), StatusCode::Idle);
    assert_eq!(rig.ctl.state().decision.reason, ReasonCode::DefrostScheduled);
    assert!(rig.sink.last_status().is_some_and(|s| s.defrost));

    // Fixed dwell from the first tick of the cycle, then the thermostat
    // takes over.
    for t in (15..1_215).step_by(5) {
        rig.tick_at(t);
        assert!(!rig.hw.relay_on, "compressor ran during defrost at t={t}");
    }
    rig.tick_at(1_215);
    assert!(!rig.ctl.state().defrost.any_active());
    assert!(rig.hw.relay_on);
}

#[test]
fn short_cycling_widens_the_running_band() {
    let mut rig = Rig::booted_with(ControllerConfig {
        door_rate_c_per_min: 100.0,
        adaptive_interval_secs: 1_200,
        adaptive_min_loops: 10,
        ..ControllerConfig::default()
    });

    // Cabinet drops as soon as the compressor runs: minimum-length cycles.
    let mut t = 0;
    while t < 1_200 {
        t += 5;
        rig.hw.air_c = Some(if rig.hw.relay_on { 2.0 } else { 7.0 });
        rig.tick_at(t);
    }
    assert!(rig.ctl.state().stats.cycles() >= 3);
    assert!((rig.ctl.state().tuner.shift_c() - 0.3).abs() < 1e-4);
    let hysteresis = rig.sink.last_status().map(|s| s.hysteresis_c);
    assert!(hysteresis.is_some_and(|h| (h - 1.3).abs() < 1e-4));

    // Wait for the next start.
    while !rig.hw.relay_on {
        t += 5;
        assert!(t < 1_600, "compressor never restarted");
        rig.hw.air_c = Some(7.0);
        rig.tick_at(t);
    }

    // 2.8 °C is below the unshifted OFF threshold but inside the widened band.
    rig.hw.air_c = Some(2.8);
    for _ in 0..30 {
        t += 5;
        rig.tick_at(t);
        assert!(rig.hw.relay_on, "band did not widen: relay off at t={t}");
    }
    assert_eq!(rig.ctl.status(), StatusCode::Cooling);
}

// ── Fault log ─────────────────────────────────────────────────

#[test]
fn clear_faults_erases_the_log() {
    let mut rig = Rig::booted();
    rig.tick_at(10);
    assert!(rig.tick_at(5).is_none());
    assert_eq!(rig.ctl.faults(&rig.storage).len(), 1);

    assert_eq!(rig.command(ControlCommand::ClearFaults), Ok(()));
    assert!(rig.ctl.faults(&rig.storage).is_empty());
}

//! Controller service: the hexagonal core.
//!
//! [`ControllerService`] owns the controller state, the live configuration
//! and the fault log.  It exposes a clean, hardware-agnostic API.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │       ControllerService       │
//!   RelayPort ◀──▶│  health · protection · cascade│ ◀─▶ StoragePort
//!                 └──────────────────────────────┘
//!                               ▲
//!                           ClockPort
//! ```
//!
//! One tick, in order:
//!
//! 1. drain relay acknowledgements, check for a stuck relay
//! 2. manual override edge (toggles turbo)
//! 3. sample and condition both probes, update sensor health
//! 4. protections and alarms, limp entry / exit
//! 5. turbo expiry, defrost, door, statistics, adaptive tuner
//! 6. cascade decision, relay command
//! 7. persistence, status report

use core::fmt::Write as _;

use log::{debug, error, info, warn};

use crate::boot::{self, BootReport};
use crate::cascade::{self, CascadeContext, DecisionResult, Mode};
use crate::codes::{ReasonCode, StatusCode};
use crate::config::ControllerConfig;
use crate::control::defrost::DefrostInputs;
use crate::control::health::HealthTransition;
use crate::control::protection::ProtectionInputs;
use crate::diagnostics::{FaultEntry, FaultKind, FaultLog};
use crate::error::{ActuatorError, Error, Result};
use crate::persist::{AlarmRecord, PersistedState, RelayRecord, TuningRecord, UserRecord};
use crate::safety::Alarm;
use crate::state::{BookedEdge, ControllerState, DecisionSnapshot, ProbeState};

use super::commands::{CommandRejection, ControlCommand};
use super::events::{ControllerEvent, ProbeFlags, StatusReport};
use super::ports::{
    ClockPort, ConfigError, ConfigPort, EventSink, InputId, RelayAck, RelayPort, SensorId,
    SensorPort, StoragePort,
};

/// Upper bound on relay acknowledgements drained per tick.
const MAX_ACKS_PER_TICK: usize = 8;

/// Seconds a config change must settle before it is written.
const CONFIG_SAVE_DEBOUNCE_SECS: u64 = 5;

// ───────────────────────────────────────────────────────────────
// ControllerService
// ───────────────────────────────────────────────────────────────

/// The controller service orchestrates all domain logic.
pub struct ControllerService {
    config: ControllerConfig,
    state: ControllerState,
    fault_log: FaultLog,
    tick_count: u64,
    config_dirty: bool,
    config_dirty_since: u64,
    /// Persisted parts changed since the last save.
    state_dirty: bool,
    last_persist_at: u64,
}

impl ControllerService {
    /// Construct the service from configuration.
    ///
    /// Does **not** restore anything; call [`boot`](Self::boot) next.
    /// Until then every tick reports `BOOT` and leaves the relay alone.
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: ControllerState::new(0),
            fault_log: FaultLog::new(),
            tick_count: 0,
            config_dirty: false,
            config_dirty_since: 0,
            state_dirty: false,
            last_persist_at: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load the persisted snapshot and reconcile it with the live relay.
    pub fn boot(
        &mut self,
        relay: &impl RelayPort,
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> BootReport {
        let now = clock.monotonic_secs();
        self.state = ControllerState::new(now);
        self.fault_log.init(&*storage);

        let persisted = PersistedState::load(&*storage);
        if let Some(user) = persisted.user {
            self.apply_user_record(user, now);
        }

        let report = boot::reconcile(
            &mut self.state,
            &persisted,
            relay.relay_state(),
            now,
            clock.wall_secs(),
            &self.config,
        );
        self.state.last_tick_at = Some(now);

        self.persist(clock, storage);
        sink.emit(&ControllerEvent::Started(report.case));
        info!(
            "ControllerService started: {:?}, setpoint {:.1}°C",
            report.case, self.config.target_temp_c
        );
        report
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full control cycle.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`RelayPort`], which avoids a double mutable borrow while keeping
    /// the port boundary explicit.
    ///
    /// Returns `None` when the tick produced no decision (before boot, or
    /// after an internal fault).
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Option<DecisionResult> {
        self.tick_count += 1;
        let now = clock.monotonic_secs();

        if !self.state.booted {
            warn!("Tick before boot reconciliation, relay untouched");
            sink.emit(&ControllerEvent::Status(self.build_status(now)));
            return None;
        }

        match self.run_tick(hw, clock, storage, sink, now) {
            Ok(decision) => {
                self.state.consecutive_faults = 0;
                Some(decision)
            }
            Err(e) => {
                self.on_tick_fault(e, now, hw, storage, sink);
                None
            }
        }
    }

    fn run_tick(
        &mut self,
        hw: &mut (impl SensorPort + RelayPort),
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
        now: u64,
    ) -> Result<DecisionResult> {
        let dt = match self.state.last_tick_at {
            Some(last) if now < last => {
                return Err(Error::Internal("monotonic clock went backwards"));
            }
            Some(last) => now - last,
            None => self.config.tick_secs(),
        };
        self.state.last_tick_at = Some(now);

        // 1. Relay feedback
        self.drain_relay_acks(hw, sink);
        let stuck = self.state.timing.relay_stuck(now, &self.config);
        if stuck && !self.state.relay_errors.stuck {
            error!(
                "Relay stuck: commanded {} but still {}",
                on_off(self.state.timing.intended()),
                on_off(self.state.timing.confirmed())
            );
            self.state.relay_errors.record(self.config.relay_error_limit);
        }
        self.state.relay_errors.stuck = stuck;

        // 2. Manual override: a press toggles turbo
        let level = hw.read_digital_input(InputId::ManualOverride);
        if level && !self.state.override_level {
            let enable = !self.state.turbo.is_active();
            info!("Manual override pressed");
            self.set_turbo(enable, now);
        }
        self.state.override_level = level;

        // 3. Probes
        let air_reading = hw.read_sensor(SensorId::Air).map(|r| r.celsius);
        let evap_reading = hw.read_sensor(SensorId::Evaporator).map(|r| r.celsius);
        let air_transition = condition_probe(&mut self.state.air, air_reading, now, &self.config);
        condition_probe(&mut self.state.evap, evap_reading, now, &self.config);
        self.state.power_w = hw.read_power().filter(|w| w.is_finite());

        let air = self.state.air.usable_value();
        let evap = self.state.evap.usable_value();

        // 4. Protections and alarms
        let alarms_before = self.state.alarms.mask();
        let latch_before = self.state.alarms.latch();
        let air_critical = self.state.air.health.is_critical();
        let air_stuck = self.state.air.health.is_stuck();
        self.state.alarms.eval_alarm(Alarm::SensorFail, air_critical);
        self.state.alarms.eval_alarm(Alarm::SensorStuck, air_stuck);
        self.state.limp.update(air_critical || air_stuck, now);

        let inputs = ProtectionInputs {
            now,
            relay_on: self.state.timing.intended(),
            run_secs: self.state.timing.run_secs(now),
            air,
            evap,
            power_w: self.state.power_w,
        };
        let report = self.state.protection.evaluate(&inputs, &self.config);
        report.apply_to(&mut self.state.alarms);

        let raised = self.state.alarms.mask() & !alarms_before;
        for alarm in Alarm::ALL.into_iter().filter(|a| raised & a.mask() != 0) {
            sink.emit(&ControllerEvent::AlarmRaised(alarm));
        }
        if self.state.alarms.latch() != latch_before {
            self.state_dirty = true;
        }

        // 5. Modes and bookkeeping
        if self.state.turbo.expired(now, &self.config) {
            info!("Turbo expired after {}s", self.config.turbo_max_secs);
            self.set_turbo(false, now);
        }

        let defrost_inputs = DefrostInputs {
            now,
            evap,
            local_hour: clock.local_hour(),
        };
        self.state
            .defrost
            .update(&defrost_inputs, self.state.turbo.is_active(), &self.config);

        self.state
            .door
            .update(self.state.air.raw, now, dt, &self.config);

        let relay_on = self.state.timing.intended();
        let hour_rolled = self.state.stats.record_tick(relay_on, dt, now);
        self.state.tuner.record_tick(relay_on, dt);
        if let Some(shift) =
            self.state
                .tuner
                .evaluate(now, self.state.turbo.is_active(), &self.config)
        {
            info!(
                "Hysteresis adjusted: shift {:+.2}°C, effective ±{:.2}°C",
                shift,
                self.state.tuner.effective_hysteresis(&self.config)
            );
            self.state_dirty = true;
        }

        // 6. Decision and execution
        let decision = if air_transition == HealthTransition::WentCritical {
            DecisionResult {
                want_on: false,
                relay_on: false,
                status: StatusCode::Idle,
                reason: ReasonCode::None,
                detail: "air_critical",
                mode: Mode::Normal,
            }
        } else {
            let ctx = self.cascade_context(now, report.freeze_locked);
            cascade::decide(&ctx, &self.state.timing, now)
        };

        let current = self.state.timing.intended();
        let mut status = decision.status;
        let mut switched = false;
        if decision.switches(current) {
            if hw.set_relay(decision.relay_on) {
                self.on_relay_switched(decision.relay_on, decision.reason, now);
                sink.emit(&ControllerEvent::RelaySwitched {
                    on: decision.relay_on,
                    reason: decision.reason,
                });
                switched = true;
            } else {
                warn!("Relay refused {} command", on_off(decision.relay_on));
                if self.state.relay_errors.record(self.config.relay_error_limit) {
                    error!(
                        "Relay failed {} times in a row",
                        self.state.relay_errors.consecutive
                    );
                }
                status = decision.mirror(current);
            }
        }

        if status != self.state.decision.status {
            debug!("Status {} → {} ({})", self.state.decision.status, status, decision.detail);
        }
        self.state.decision = DecisionSnapshot {
            status,
            reason: decision.reason,
            detail: decision.detail,
        };

        // 7. Persistence and report
        let persist_due = now.saturating_sub(self.last_persist_at)
            >= u64::from(self.config.persist_interval_secs);
        if switched || hour_rolled || persist_due || self.state_dirty {
            self.persist(clock, storage);
        }

        sink.emit(&ControllerEvent::Status(self.build_status(now)));
        Ok(decision)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command (front panel, serial console, remote
    /// link).  Rejections are also emitted as
    /// [`ControllerEvent::CommandRejected`].
    pub fn handle_command(
        &mut self,
        cmd: ControlCommand,
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), CommandRejection> {
        let now = clock.monotonic_secs();
        let result = self.apply_command(cmd, now, clock, storage, sink);
        if let Err(rejection) = result {
            warn!("Command rejected: {}", rejection);
            sink.emit(&ControllerEvent::CommandRejected(rejection));
        }
        result
    }

    fn apply_command(
        &mut self,
        cmd: ControlCommand,
        now: u64,
        clock: &impl ClockPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> core::result::Result<(), CommandRejection> {
        match cmd {
            ControlCommand::SetSetpoint(setpoint) => {
                if !self.config.setpoint_allowed(setpoint) {
                    return Err(CommandRejection::SetpointOutOfRange);
                }
                let candidate = ControllerConfig {
                    target_temp_c: setpoint,
                    ..self.config.clone()
                };
                candidate.validate().map_err(rejection_from)?;
                self.config = candidate;
                self.mark_config_dirty(now);
                self.state_dirty = true;
                info!("Setpoint changed to {:.1}°C", setpoint);
            }
            ControlCommand::SetTurbo(on) => {
                self.set_turbo(on, now);
            }
            ControlCommand::ResetAlarms { remote } => {
                let include_fatal = !remote || self.config.allow_remote_fatal_reset;
                let cleared = self.state.alarms.reset(include_fatal);
                if include_fatal {
                    self.state.protection.power.clear_escalation();
                }
                sink.emit(&ControllerEvent::AlarmsReset(cleared));
                self.persist(clock, storage);
                if !include_fatal && self.state.alarms.is_fatal() {
                    return Err(CommandRejection::FatalResetNotAllowed);
                }
            }
            ControlCommand::DumpStatus => match self.build_status(now).to_json() {
                Ok(json) => sink.emit(&ControllerEvent::StatusDump(json)),
                Err(e) => warn!("Status dump failed: {}", e),
            },
            ControlCommand::StartDefrost => {
                if !self
                    .state
                    .defrost
                    .start_manual(now, self.state.turbo.is_active())
                {
                    return Err(CommandRejection::DefrostUnavailable);
                }
            }
            ControlCommand::UpdateConfig(new_config) => {
                new_config.validate().map_err(rejection_from)?;
                self.config = new_config;
                let shift = self.state.tuner.shift_c();
                self.state.tuner.restore_shift(shift, &self.config);
                self.mark_config_dirty(now);
                self.state_dirty = true;
                info!("Configuration updated at runtime");
            }
            ControlCommand::SaveState => {
                self.persist(clock, storage);
                self.config_dirty = true;
                self.config_dirty_since = now.saturating_sub(CONFIG_SAVE_DEBOUNCE_SECS);
                info!("Explicit save requested (config flushes on next auto-save check)");
            }
            ControlCommand::ClearFaults => {
                let cleared = self.fault_log.count(&*storage);
                self.fault_log.clear(&mut *storage);
                info!("Fault log cleared ({} entries)", cleared);
            }
        }
        Ok(())
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from the current state.
    pub fn build_status(&self, now: u64) -> StatusReport {
        let s = &self.state;
        StatusReport {
            uptime_secs: s.uptime_secs(now),
            status: s.decision.status,
            reason: s.decision.reason,
            alarm: s.alarms.highest(),
            alarm_mask: s.alarms.mask(),
            air_raw_c: s.air.raw,
            air_c: s.air.signal.smoothed().map(|r| r.value),
            evap_raw_c: s.evap.raw,
            evap_c: s.evap.signal.smoothed().map(|r| r.value),
            air_flags: probe_flags(&s.air),
            evap_flags: probe_flags(&s.evap),
            relay_on: s.timing.intended(),
            relay_confirmed: s.timing.confirmed(),
            relay_stuck: s.relay_errors.stuck,
            relay_errors: s.relay_errors.total,
            power_w: s.power_w,
            duty_hour_pct: s.stats.duty_hour(),
            duty_day_pct: s.stats.duty_day(),
            duty_life_pct: s.stats.duty_life(),
            cycles: s.stats.cycles(),
            avg_on_secs: s.stats.avg_on_secs(),
            avg_off_secs: s.stats.avg_off_secs(),
            setpoint_c: self.config.target_temp_c,
            hysteresis_c: s.tuner.effective_hysteresis(&self.config),
            defrost: s.defrost.any_active(),
            door_open: s.door.is_paused(),
            turbo: s.turbo.is_active(),
            limp: s.limp.is_active(),
            cooling_delta_c: s.protection.cooling.delta_c(),
        }
    }

    /// Read-only view of the controller state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Live configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Status of the last decision.
    pub fn status(&self) -> StatusCode {
        self.state.decision.status
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Stored fault entries.
    pub fn faults(&self, storage: &impl StoragePort) -> heapless::Vec<FaultEntry, 4> {
        self.fault_log.read_all(storage)
    }

    // ── Internal ──────────────────────────────────────────────

    fn cascade_context(&self, now: u64, freeze_locked: bool) -> CascadeContext<'_> {
        let s = &self.state;
        CascadeContext {
            cfg: &self.config,
            uptime_secs: s.uptime_secs(now),
            relay_on: s.timing.intended(),
            air: s.air.usable_value(),
            fatal_alarm: s.alarms.is_fatal(),
            limp: s.limp.is_active(),
            turbo: s.turbo.is_active(),
            door_open: s.door.is_paused(),
            scheduled_defrost: s.defrost.scheduled_reason(),
            freeze_locked,
            max_run_exceeded: s.timing.max_run_exceeded(now, &self.config),
            dynamic_defrost: s.defrost.dynamic_active(),
            hysteresis_shift_c: s.tuner.shift_c(),
        }
    }

    fn drain_relay_acks(&mut self, hw: &mut impl RelayPort, sink: &mut impl EventSink) {
        for _ in 0..MAX_ACKS_PER_TICK {
            let Some(ack) = hw.poll_ack() else {
                break;
            };
            match ack {
                RelayAck::Confirmed(on) => {
                    self.state.timing.confirm(on);
                    self.state.relay_errors.clear_consecutive();
                    if self.state.unconfirmed_edge.is_some_and(|edge| edge.on == on) {
                        self.state.unconfirmed_edge = None;
                    }
                }
                RelayAck::Failed(e) => {
                    warn!("Relay command failed: {}", e);
                    self.retract_edge();
                    let off_failed = !self.state.timing.intended();
                    if off_failed && e == ActuatorError::FeedbackMismatch {
                        self.on_welded_contact(sink);
                    } else {
                        self.state.timing.revert_to_confirmed();
                    }
                    if self.state.relay_errors.record(self.config.relay_error_limit) {
                        error!(
                            "Relay failed {} times in a row",
                            self.state.relay_errors.consecutive
                        );
                    }
                }
            }
        }
    }

    /// The contact stayed closed after an OFF command.  The intent stays
    /// OFF so the command is not repeated, and WELD latches.
    fn on_welded_contact(&mut self, sink: &mut impl EventSink) {
        error!("Relay contact still closed after OFF, contacts welded");
        self.state.timing.mark_welded();
        if !self.state.alarms.is_active(Alarm::Weld) {
            self.state.alarms.raise(Alarm::Weld);
            sink.emit(&ControllerEvent::AlarmRaised(Alarm::Weld));
        }
        self.state_dirty = true;
    }

    /// Undo the statistics booked for an edge the relay did not make.
    fn retract_edge(&mut self) {
        let s = &mut self.state;
        let Some(edge) = s.unconfirmed_edge.take() else {
            return;
        };
        if !edge.period {
            return;
        }
        if edge.on {
            s.stats.retract_off_period();
        } else {
            s.stats.retract_on_period();
            s.tuner.retract_cycle();
        }
    }

    /// Book-keeping for an accepted relay command.  Statistics stay
    /// provisional until the relay confirms the edge.
    fn on_relay_switched(&mut self, on: bool, reason: ReasonCode, now: u64) {
        let s = &mut self.state;
        let mut period = false;
        if on {
            if let Some(rested) = s.timing.since_off(now) {
                s.stats.record_off_period(rested);
                period = true;
            }
        } else if let Some(ran) = s.timing.since_on(now) {
            s.stats.record_on_period(ran);
            s.tuner.record_cycle();
            period = true;
        }
        s.unconfirmed_edge = Some(BookedEdge { on, period });

        s.timing.commit(on, now);
        if on {
            s.protection.weld.reset();
        } else {
            s.protection.weld.on_relay_off(s.air.usable_value(), now);
        }
        info!("Compressor {} ({})", on_off(on), reason);
    }

    fn set_turbo(&mut self, on: bool, now: u64) {
        if self.state.turbo.set(on, now) {
            if on {
                self.state.defrost.abort_all("turbo enabled");
            }
            self.state_dirty = true;
        }
    }

    fn apply_user_record(&mut self, user: UserRecord, now: u64) {
        let candidate = ControllerConfig {
            target_temp_c: user.setpoint_c,
            ..self.config.clone()
        };
        if self.config.setpoint_allowed(user.setpoint_c) && candidate.validate().is_ok()
        {
            self.config = candidate;
        } else {
            warn!(
                "Persisted setpoint {:.1}°C rejected, keeping {:.1}°C",
                user.setpoint_c, self.config.target_temp_c
            );
        }
        if user.turbo {
            self.state.turbo.set(true, now);
        }
    }

    fn on_tick_fault(
        &mut self,
        e: Error,
        now: u64,
        hw: &mut impl RelayPort,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        error!("Tick fault: {}", e);
        let uptime = self.state.uptime_secs(now);
        let mut reason: heapless::String<64> = heapless::String::new();
        let _ = write!(reason, "{e}");
        self.fault_log
            .record(&mut *storage, &FaultEntry::new(uptime, FaultKind::Tick, &reason));

        self.state.consecutive_faults = self.state.consecutive_faults.saturating_add(1);
        sink.emit(&ControllerEvent::TickFault(e));

        if self.state.consecutive_faults < self.config.max_consecutive_faults {
            return;
        }

        let was_on = self.state.timing.intended();
        if hw.set_relay(false) {
            if was_on {
                self.state.timing.commit(false, now);
                self.state.protection.weld.on_relay_off(None, now);
                sink.emit(&ControllerEvent::RelaySwitched {
                    on: false,
                    reason: ReasonCode::None,
                });
            }
        } else {
            error!("Relay refused forced OFF");
        }

        if self.state.consecutive_faults == self.config.max_consecutive_faults {
            error!(
                "{} consecutive tick faults, compressor forced OFF",
                self.state.consecutive_faults
            );
            self.fault_log.record(
                &mut *storage,
                &FaultEntry::new(uptime, FaultKind::ForcedOff, "consecutive tick faults"),
            );
        }
    }

    /// Write the persisted snapshot.  Failures are logged, never fatal.
    fn persist(&mut self, clock: &impl ClockPort, storage: &mut impl StoragePort) {
        let now = clock.monotonic_secs();
        let snapshot = self.snapshot(now, clock.wall_secs());
        match snapshot.save(&mut *storage) {
            Ok(()) => debug!("Controller state persisted"),
            Err(e) => warn!("Persisting controller state failed: {}", e),
        }
        self.state_dirty = false;
        self.last_persist_at = now;
    }

    fn snapshot(&self, now: u64, wall_now: Option<u64>) -> PersistedState {
        let s = &self.state;
        let wall_at = |since: Option<u64>| match (wall_now, since) {
            (Some(w), Some(since)) => Some(w.saturating_sub(since)),
            _ => None,
        };
        let (fatal, escalated) = s.alarms.latch();

        PersistedState {
            relay: Some(RelayRecord {
                believed_on: s.timing.intended(),
                on_at: wall_at(s.timing.since_on(now)),
                off_at: wall_at(s.timing.since_off(now)),
                saved_at: wall_now,
            }),
            stats: Some(s.stats.snapshot()),
            tuning: Some(TuningRecord {
                shift_c: s.tuner.shift_c(),
                ghost_count: s.protection.power.ghost_count(),
            }),
            alarms: Some(AlarmRecord {
                fatal,
                escalated,
                freeze_lock_count: s.protection.freeze.lock_count(),
            }),
            user: Some(UserRecord {
                setpoint_c: self.config.target_temp_c,
                turbo: s.turbo.is_active(),
            }),
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.
    pub fn mark_config_dirty(&mut self, now: u64) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.config_dirty_since = now;
        }
    }

    /// Save the config once it has been stable for 5 seconds.
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, now: u64, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        if now.saturating_sub(self.config_dirty_since) < CONFIG_SAVE_DEBOUNCE_SECS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Force-save if dirty (call before a planned restart).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) {
        if !self.config_dirty {
            return;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config force-saved before restart");
            }
            Err(e) => warn!("Config force-save failed: {}", e),
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

// ───────────────────────────────────────────────────────────────
// Helpers
// ───────────────────────────────────────────────────────────────

/// Feed one tick's sample through health and conditioning.
fn condition_probe(
    probe: &mut ProbeState,
    reading: Option<f32>,
    now: u64,
    cfg: &ControllerConfig,
) -> HealthTransition {
    let sample = reading.filter(|v| v.is_finite());
    probe.raw = sample;
    let transition = probe.health.observe(sample, now, cfg);
    if let Some(value) = sample {
        if transition == HealthTransition::Recovered {
            probe.signal.reseed(value, cfg.ema_alpha);
        } else {
            probe.signal.push(value, cfg.ema_alpha);
        }
    }
    transition
}

fn probe_flags(probe: &ProbeState) -> ProbeFlags {
    ProbeFlags {
        offline: probe.health.is_offline(),
        critical: probe.health.is_critical(),
        stuck: probe.health.is_stuck(),
    }
}

fn rejection_from(e: ConfigError) -> CommandRejection {
    match e {
        ConfigError::ValidationFailed(msg) => CommandRejection::InvalidConfig(msg),
        _ => CommandRejection::InvalidConfig("config rejected"),
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

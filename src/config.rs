//! Controller configuration parameters
//!
//! All tunable parameters for the ColdGuard controller.
//! Values can be overridden via NVS (non-volatile storage) or the command channel.
//! Every change goes through [`ControllerConfig::validate`] before it is
//! applied or persisted.

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Absolute setpoint floor.  The usable floor also depends on the freeze
/// cut-off and the band: see [`ControllerConfig::min_setpoint_c`].
pub const SETPOINT_MIN_C: f32 = -5.0;
/// Setpoint resolution of the front panel and console.
pub const SETPOINT_STEP_C: f32 = 0.1;
/// Highest setpoint accepted from a remote command.
pub const SETPOINT_MAX_C: f32 = 12.0;

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Timing ---
    /// Control loop interval (milliseconds)
    pub control_interval_ms: u32,
    /// Periodic state persistence interval (seconds)
    pub persist_interval_secs: u32,

    // --- Thermostat ---
    /// Cabinet air target (°C)
    pub target_temp_c: f32,
    /// Half-width of the on/off band around the target (°C)
    pub hysteresis_c: f32,
    /// EMA smoothing factor applied after the median-of-3 despike
    pub ema_alpha: f32,

    // --- Sensor health ---
    /// Seconds without a valid reading before the soft offline flag
    pub no_reading_secs: u32,
    /// Seconds without a valid reading before critical failure
    pub critical_secs: u32,
    /// Change below this (°C) counts as "unchanged" for stuck detection
    pub stuck_epsilon_c: f32,
    /// Seconds unchanged before a sensor is declared stuck
    pub stuck_secs: u32,

    // --- Compressor timing ---
    pub min_on_secs: u32,
    pub min_off_secs: u32,
    pub max_on_secs: u32,
    /// Seconds the relay may disagree with its command before "stuck"
    pub relay_response_timeout_secs: u32,
    /// Consecutive relay errors before the error is escalated
    pub relay_error_limit: u32,

    // --- Freeze protection ---
    pub freeze_cutoff_c: f32,
    pub freeze_recovery_hyst_c: f32,
    pub freeze_recovery_secs: u32,

    // --- Power protection ---
    /// Power checks are masked this long after every start (inrush)
    pub inrush_mask_secs: u32,
    pub locked_rotor_watts: f32,
    pub ghost_min_watts: f32,
    pub ghost_trip_secs: u32,
    /// Ghost-run occurrences before the warning becomes fatal
    pub ghost_fatal_count: u8,

    // --- Weld detection ---
    pub weld_wait_secs: u32,
    pub weld_window_secs: u32,
    pub weld_drop_c: f32,

    // --- Cooling health ---
    pub cooling_check_secs: u32,
    pub cooling_margin_c: f32,

    // --- Defrost ---
    pub defrost_trigger_c: f32,
    pub defrost_end_c: f32,
    pub defrost_dwell_secs: u32,
    pub defrost_max_secs: u32,
    /// Local hour (0-23) for the scheduled defrost, `None` disables it
    pub defrost_schedule_hour: Option<u8>,
    pub sched_defrost_secs: u32,

    // --- Door detection ---
    pub door_window_secs: u32,
    pub door_min_sample_secs: u32,
    pub door_rate_c_per_min: f32,
    pub door_pause_secs: u32,

    // --- Adaptive hysteresis ---
    pub adaptive_enabled: bool,
    pub adaptive_interval_secs: u32,
    pub adaptive_min_loops: u32,
    pub adaptive_stabilize_secs: u32,
    pub adaptive_min_shift_c: f32,
    pub adaptive_max_shift_c: f32,
    pub adaptive_freeze_margin_c: f32,

    // --- Limp mode ---
    pub limp_on_secs: u32,
    pub limp_off_secs: u32,

    // --- Turbo ---
    pub turbo_target_c: f32,
    pub turbo_hysteresis_c: f32,
    pub turbo_max_secs: u32,

    // --- Alarms ---
    pub high_temp_alarm_c: f32,
    pub high_temp_delay_secs: u32,
    /// Whether `ResetAlarms` from the command channel may clear fatal alarms
    pub allow_remote_fatal_reset: bool,

    // --- Internal faults ---
    /// Consecutive failed ticks before the relay is forced off
    pub max_consecutive_faults: u8,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Timing
            control_interval_ms: 5_000, // 0.2 Hz
            persist_interval_secs: 600,

            // Thermostat
            target_temp_c: 4.0,
            hysteresis_c: 1.0,
            ema_alpha: 0.3,

            // Sensor health
            no_reading_secs: 15,
            critical_secs: 25,
            stuck_epsilon_c: 0.02,
            stuck_secs: 5_400, // 90 min

            // Compressor timing
            min_on_secs: 60,
            min_off_secs: 180,
            max_on_secs: 7_200,
            relay_response_timeout_secs: 10,
            relay_error_limit: 5,

            // Freeze
            freeze_cutoff_c: 0.5,
            freeze_recovery_hyst_c: 1.0,
            freeze_recovery_secs: 300,

            // Power
            inrush_mask_secs: 10,
            locked_rotor_watts: 400.0,
            ghost_min_watts: 20.0,
            ghost_trip_secs: 60,
            ghost_fatal_count: 3,

            // Weld
            weld_wait_secs: 600,
            weld_window_secs: 1_800,
            weld_drop_c: 1.5,

            // Cooling health
            cooling_check_secs: 900,
            cooling_margin_c: 5.0,

            // Defrost
            defrost_trigger_c: -16.0,
            defrost_end_c: -5.0,
            defrost_dwell_secs: 120,
            defrost_max_secs: 2_700,
            defrost_schedule_hour: Some(3),
            sched_defrost_secs: 1_200,

            // Door
            door_window_secs: 60,
            door_min_sample_secs: 10,
            door_rate_c_per_min: 1.5,
            door_pause_secs: 300,

            // Adaptive hysteresis
            adaptive_enabled: true,
            adaptive_interval_secs: 3_600,
            adaptive_min_loops: 720, // one hour of 5 s ticks
            adaptive_stabilize_secs: 7_200,
            adaptive_min_shift_c: -0.5,
            adaptive_max_shift_c: 1.5,
            adaptive_freeze_margin_c: 0.5,

            // Limp mode
            limp_on_secs: 1_200,
            limp_off_secs: 600,

            // Turbo
            turbo_target_c: 2.0,
            turbo_hysteresis_c: 0.5,
            turbo_max_secs: 7_200,

            // Alarms
            high_temp_alarm_c: 12.0,
            high_temp_delay_secs: 1_800,
            allow_remote_fatal_reset: true,

            max_consecutive_faults: 3,
        }
    }
}

impl ControllerConfig {
    /// Control tick period in whole seconds (never zero).
    pub fn tick_secs(&self) -> u64 {
        (u64::from(self.control_interval_ms) / 1000).max(1)
    }

    /// Lowest setpoint this configuration accepts: the lower band edge must
    /// stay above the freeze cut-off.
    pub fn min_setpoint_c(&self) -> f32 {
        SETPOINT_MIN_C.max(self.freeze_cutoff_c + self.hysteresis_c + SETPOINT_STEP_C)
    }

    /// `setpoint` is finite and within [`min_setpoint_c`](Self::min_setpoint_c)
    /// ..= [`SETPOINT_MAX_C`].
    pub fn setpoint_allowed(&self, setpoint: f32) -> bool {
        setpoint.is_finite() && (self.min_setpoint_c()..=SETPOINT_MAX_C).contains(&setpoint)
    }

    /// Range- and consistency-check every field.
    ///
    /// Invalid values are rejected, never clamped: a bad remote update
    /// must not be able to disable a protection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1_000..=60_000).contains(&self.control_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "control_interval_ms must be 1000–60000",
            ));
        }
        if !(SETPOINT_MIN_C..=SETPOINT_MAX_C).contains(&self.target_temp_c) {
            return Err(ConfigError::ValidationFailed(
                "target_temp_c must be -5.0–12.0",
            ));
        }
        if !(0.2..=5.0).contains(&self.hysteresis_c) {
            return Err(ConfigError::ValidationFailed("hysteresis_c must be 0.2–5.0"));
        }
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(ConfigError::ValidationFailed("ema_alpha must be in (0, 1]"));
        }
        if self.no_reading_secs == 0 || self.critical_secs <= self.no_reading_secs {
            return Err(ConfigError::ValidationFailed(
                "critical_secs must exceed no_reading_secs (> 0)",
            ));
        }
        if self.stuck_epsilon_c <= 0.0 || self.stuck_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "stuck detection parameters must be positive",
            ));
        }
        if self.min_on_secs == 0 || self.min_off_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "min_on_secs and min_off_secs must be > 0",
            ));
        }
        if self.max_on_secs <= self.min_on_secs {
            return Err(ConfigError::ValidationFailed(
                "max_on_secs must exceed min_on_secs",
            ));
        }
        if self.freeze_recovery_hyst_c <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "freeze_recovery_hyst_c must be > 0",
            ));
        }
        if self.target_temp_c - self.hysteresis_c <= self.freeze_cutoff_c {
            return Err(ConfigError::ValidationFailed(
                "lower band edge must stay above freeze_cutoff_c",
            ));
        }
        if self.turbo_target_c - self.turbo_hysteresis_c <= self.freeze_cutoff_c {
            return Err(ConfigError::ValidationFailed(
                "turbo band must stay above freeze_cutoff_c",
            ));
        }
        if self.ghost_min_watts >= self.locked_rotor_watts {
            return Err(ConfigError::ValidationFailed(
                "ghost_min_watts must be below locked_rotor_watts",
            ));
        }
        if self.ghost_fatal_count == 0 {
            return Err(ConfigError::ValidationFailed("ghost_fatal_count must be > 0"));
        }
        if self.weld_drop_c <= 0.0 || self.weld_window_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "weld detection parameters must be positive",
            ));
        }
        if self.defrost_end_c <= self.defrost_trigger_c {
            return Err(ConfigError::ValidationFailed(
                "defrost_end_c must be above defrost_trigger_c",
            ));
        }
        if self.defrost_max_secs <= self.defrost_dwell_secs {
            return Err(ConfigError::ValidationFailed(
                "defrost_max_secs must exceed defrost_dwell_secs",
            ));
        }
        if let Some(hour) = self.defrost_schedule_hour {
            if hour > 23 {
                return Err(ConfigError::ValidationFailed(
                    "defrost_schedule_hour must be 0–23",
                ));
            }
        }
        if self.sched_defrost_secs == 0 {
            return Err(ConfigError::ValidationFailed("sched_defrost_secs must be > 0"));
        }
        if self.door_window_secs == 0
            || self.door_min_sample_secs == 0
            || self.door_min_sample_secs > self.door_window_secs
        {
            return Err(ConfigError::ValidationFailed(
                "door_min_sample_secs must be 1..=door_window_secs",
            ));
        }
        if self.door_rate_c_per_min <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "door_rate_c_per_min must be > 0",
            ));
        }
        if self.adaptive_min_shift_c > 0.0
            || self.adaptive_max_shift_c < 0.0
            || self.adaptive_min_shift_c >= self.adaptive_max_shift_c
        {
            return Err(ConfigError::ValidationFailed(
                "adaptive shift limits must straddle zero",
            ));
        }
        if self.adaptive_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "adaptive_interval_secs must be > 0",
            ));
        }
        if self.limp_on_secs == 0 || self.limp_off_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "limp_on_secs and limp_off_secs must be > 0",
            ));
        }
        if self.limp_off_secs >= self.limp_on_secs {
            return Err(ConfigError::ValidationFailed(
                "limp_off_secs must be shorter than limp_on_secs",
            ));
        }
        if self.turbo_max_secs == 0 {
            return Err(ConfigError::ValidationFailed("turbo_max_secs must be > 0"));
        }
        if self.high_temp_alarm_c <= self.target_temp_c + self.hysteresis_c {
            return Err(ConfigError::ValidationFailed(
                "high_temp_alarm_c must be above the upper band edge",
            ));
        }
        if self.max_consecutive_faults == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_consecutive_faults must be > 0",
            ));
        }
        Ok(())
    }
}

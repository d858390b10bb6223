//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing controller events to the ESP-IDF
//! logger (UART / USB-CDC in production).  A telemetry or display
//! adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::ControllerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ControllerEvent`] to the serial console.
///
/// Status lines are printed every `status_every` reports, and always
/// when the status or reason changes.
pub struct LogEventSink {
    status_every: u32,
    since_last: u32,
    last_line: Option<(crate::codes::StatusCode, crate::codes::ReasonCode)>,
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new(1)
    }
}

impl LogEventSink {
    pub fn new(status_every: u32) -> Self {
        Self {
            status_every: status_every.max(1),
            since_last: 0,
            last_line: None,
        }
    }
}

fn temp(v: Option<f32>) -> f32 {
    v.unwrap_or(f32::NAN)
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ControllerEvent) {
        match event {
            ControllerEvent::Status(s) => {
                self.since_last += 1;
                let key = (s.status, s.reason);
                if self.last_line == Some(key) && self.since_last < self.status_every {
                    return;
                }
                self.since_last = 0;
                self.last_line = Some(key);
                info!(
                    "STATUS | {} ({}) | air={:.1}\u{00b0}C evap={:.1}\u{00b0}C | \
                     relay={} | set={:.1}\u{00b1}{:.1} | duty h/d={:.0}/{:.0}% | \
                     alarms=0b{:08b}",
                    s.status,
                    s.reason,
                    temp(s.air_c),
                    temp(s.evap_c),
                    if s.relay_on { "ON" } else { "OFF" },
                    s.setpoint_c,
                    s.hysteresis_c,
                    s.duty_hour_pct,
                    s.duty_day_pct,
                    s.alarm_mask,
                );
            }
            ControllerEvent::Started(case) => {
                info!("START | boot reconciliation: {:?}", case);
            }
            ControllerEvent::RelaySwitched { on, reason } => {
                info!("RELAY | {} ({})", if *on { "ON" } else { "OFF" }, reason);
            }
            ControllerEvent::AlarmRaised(alarm) => {
                warn!("ALARM | raised {}", alarm);
            }
            ControllerEvent::AlarmsReset(mask) => {
                info!("ALARM | reset, cleared=0b{:08b}", mask);
            }
            ControllerEvent::CommandRejected(why) => {
                warn!("CMD   | rejected: {}", why);
            }
            ControllerEvent::TickFault(e) => {
                warn!("FAULT | tick failed: {}", e);
            }
            ControllerEvent::StatusDump(json) => {
                info!("DUMP  | {}", json);
            }
        }
    }
}

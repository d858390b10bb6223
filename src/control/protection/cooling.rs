//! Cooling-health check: is the evaporator actually pulling heat?
//!
//! After the compressor has run for `cooling_check_secs`, the evaporator
//! must be at least `cooling_margin_c` colder than the cabinet air.
//! `air - evap` is kept as the cooling-health metric for the status report.

use log::{info, warn};

use crate::config::ControllerConfig;

#[derive(Debug, Clone, Default)]
pub struct CoolingMonitor {
    delta_c: Option<f32>,
    failing: bool,
}

impl CoolingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `evap` must be `None` whenever the evaporator probe is unusable;
    /// the check is then disabled.
    pub fn update(
        &mut self,
        relay_on: bool,
        run_secs: u64,
        air: Option<f32>,
        evap: Option<f32>,
        cfg: &ControllerConfig,
    ) -> bool {
        let (Some(air), Some(evap)) = (air, evap) else {
            self.delta_c = None;
            if self.failing {
                info!("Cooling check disabled (probe unavailable)");
            }
            self.failing = false;
            return false;
        };

        let delta = air - evap;
        self.delta_c = Some(delta);

        if !relay_on || run_secs < u64::from(cfg.cooling_check_secs) {
            return self.failing;
        }

        if delta < cfg.cooling_margin_c {
            if !self.failing {
                warn!(
                    "Cooling weak: air-evap {:.1}°C after {}s run (want ≥ {:.1}°C)",
                    delta, run_secs, cfg.cooling_margin_c
                );
            }
            self.failing = true;
        } else {
            self.failing = false;
        }
        self.failing
    }

    /// Latest `air - evap`.
    pub fn delta_c(&self) -> Option<f32> {
        self.delta_c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_checked_before_run_time() {
        let c = ControllerConfig::default();
        let mut m = CoolingMonitor::new();
        assert!(!m.update(true, 100, Some(8.0), Some(7.0), &c));
        assert_eq!(m.delta_c(), Some(1.0));
    }

    #[test]
    fn weak_margin_after_run_time_fails_then_clears() {
        let c = ControllerConfig::default();
        let mut m = CoolingMonitor::new();
        assert!(m.update(true, 900, Some(8.0), Some(5.0), &c));
        // Off: condition latched until re-evaluated
        assert!(m.update(false, 0, Some(8.0), Some(6.0), &c));
        assert!(!m.update(true, 1_000, Some(6.0), Some(-4.0), &c));
    }

    #[test]
    fn missing_evaporator_disables_check() {
        let c = ControllerConfig::default();
        let mut m = CoolingMonitor::new();
        m.update(true, 900, Some(8.0), Some(5.0), &c);
        assert!(!m.update(true, 905, Some(8.0), None, &c));
        assert!(m.delta_c().is_none());
    }
}

//! NTC thermistor probes (10 kOhm @ 25 C, B = 3950).
//!
//! Each probe sits on the low side of a voltage divider with a fixed
//! 10 kOhm resistor and is read via an ADC1 channel.  The simplified Beta
//! (Steinhart-Hart) equation converts resistance to temperature.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads the oneshot ADC initialised by `hw_init`.
//! On host/test: reads the per-channel simulation value set with
//! [`hw_init::sim_set_adc`](crate::drivers::hw_init::sim_set_adc).

use crate::drivers::hw_init;
use crate::error::SensorError;

const R25: f32 = 10_000.0;
const BETA: f32 = 3950.0;
const T25_K: f32 = 298.15;
const R_DIVIDER: f32 = 10_000.0;
const ADC_MAX: f32 = 4095.0;
const V_REF: f32 = 3.3;

/// Rail margin below which the divider reads as shorted or open.
const RAIL_MARGIN_V: f32 = 0.01;

/// Plausible range for a refrigeration probe.
pub const PROBE_MIN_C: f32 = -50.0;
pub const PROBE_MAX_C: f32 = 80.0;

/// One NTC probe on a fixed ADC1 channel.
pub struct NtcProbe {
    channel: u32,
}

impl NtcProbe {
    pub fn new(channel: u32) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }

    /// Sample the probe and convert to degrees Celsius.
    pub fn read(&self) -> Result<f32, SensorError> {
        let raw = hw_init::adc1_read(self.channel).ok_or(SensorError::AdcReadFailed)?;
        adc_to_celsius(raw)
    }
}

/// Convert a raw 12-bit ADC sample to degrees Celsius.
pub fn adc_to_celsius(raw: u16) -> Result<f32, SensorError> {
    let voltage = (raw as f32 / ADC_MAX) * V_REF;
    if voltage <= RAIL_MARGIN_V {
        return Err(SensorError::ShortCircuit);
    }
    if voltage >= V_REF - RAIL_MARGIN_V {
        return Err(SensorError::OpenCircuit);
    }
    let r_ntc = R_DIVIDER * voltage / (V_REF - voltage);
    let inv_t = (1.0 / T25_K) + (1.0 / BETA) * (r_ntc / R25).ln();
    if inv_t <= 0.0 {
        return Err(SensorError::OutOfRange);
    }
    let celsius = (1.0 / inv_t) - 273.15;
    if !(PROBE_MIN_C..=PROBE_MAX_C).contains(&celsius) {
        return Err(SensorError::OutOfRange);
    }
    Ok(celsius)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Raw ADC value the divider produces at `celsius`.
    fn raw_for(celsius: f32) -> u16 {
        let t = celsius + 273.15;
        let r = R25 * (BETA * (1.0 / t - 1.0 / T25_K)).exp();
        let v = V_REF * r / (R_DIVIDER + r);
        (v / V_REF * ADC_MAX).round() as u16
    }

    #[test]
    fn midscale_is_twenty_five_degrees() {
        let c = adc_to_celsius(2048).unwrap();
        assert!((c - 25.0).abs() < 0.2, "got {c}");
    }

    #[test]
    fn cabinet_temperatures_convert_accurately() {
        for target in [-30.0_f32, -18.0, -5.0, 0.0, 4.0, 10.0, 40.0] {
            let c = adc_to_celsius(raw_for(target)).unwrap();
            assert!((c - target).abs() < 0.5, "{target} -> {c}");
        }
    }

    #[test]
    fn rails_are_wiring_faults() {
        assert_eq!(adc_to_celsius(0), Err(SensorError::ShortCircuit));
        assert_eq!(adc_to_celsius(4095), Err(SensorError::OpenCircuit));
    }

    #[test]
    fn implausible_readings_are_out_of_range() {
        // Very cold: NTC resistance huge, sample close to the top rail.
        assert_eq!(adc_to_celsius(raw_for(-60.0)), Err(SensorError::OutOfRange));
        assert_eq!(adc_to_celsius(raw_for(95.0)), Err(SensorError::OutOfRange));
    }

    #[cfg(not(target_os = "espidf"))]
    #[test]
    fn probe_reads_its_own_channel() {
        let probe = NtcProbe::new(9);
        hw_init::sim_set_adc(9, raw_for(4.0));
        let c = probe.read().unwrap();
        assert!((c - 4.0).abs() < 0.5);
    }
}

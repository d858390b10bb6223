//! Compressor power meter (current transformer on the supply line).
//!
//! The CT burden voltage is rectified and read through an ADC1 channel.
//! A two-point linear calibration maps the sample to watts.  Boards
//! without a CT fitted report `None` so the power-based protections stay
//! inactive.

use crate::drivers::hw_init;

#[derive(Debug, Clone, Copy)]
pub struct PowerCalibration {
    /// ADC count with the compressor stopped.
    pub zero_adc: u16,
    /// ADC count at the span point.
    pub span_adc: u16,
    /// Electrical power at the span point.
    pub span_watts: f32,
}

impl Default for PowerCalibration {
    fn default() -> Self {
        Self {
            zero_adc: 60,
            span_adc: 3000,
            span_watts: 400.0,
        }
    }
}

pub struct PowerMeter {
    channel: u32,
    fitted: bool,
    cal: PowerCalibration,
}

impl PowerMeter {
    pub fn new(channel: u32, fitted: bool) -> Self {
        Self {
            channel,
            fitted,
            cal: PowerCalibration::default(),
        }
    }

    pub fn set_calibration(&mut self, cal: PowerCalibration) {
        self.cal = cal;
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    /// Current compressor draw in watts.
    pub fn read(&self) -> Option<f32> {
        if !self.fitted {
            return None;
        }
        let raw = hw_init::adc1_read(self.channel)?;
        Some(self.adc_to_watts(raw))
    }

    fn adc_to_watts(&self, raw: u16) -> f32 {
        let span = self.cal.span_adc.saturating_sub(self.cal.zero_adc);
        if span == 0 {
            return 0.0;
        }
        let counts = raw.saturating_sub(self.cal.zero_adc) as f32;
        counts * self.cal.span_watts / span as f32
    }
}

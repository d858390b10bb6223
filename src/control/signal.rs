//! Signal conditioner: median-of-3 despike followed by an EMA.
//!
//! One conditioner per temperature stream.  Samples go into a 3-slot ring;
//! the median of the three most recent samples feeds an exponential moving
//! average.  The first sample after (re)initialisation seeds the EMA.
//!
//! Until three samples have been collected the *decision value* is the
//! latest raw sample; afterwards it is the smoothed value.

/// Number of samples in the despike window.
const WINDOW: usize = 3;

/// Output of the conditioner at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedReading {
    /// EMA value (seeded by the first sample).
    pub value: f32,
    /// Samples collected since the last reset, saturating at the window size.
    pub samples: u8,
    /// True once the median window is full.
    pub window_full: bool,
}

/// Per-stream despike + smoothing state.
#[derive(Debug, Clone)]
pub struct SignalConditioner {
    ring: [f32; WINDOW],
    head: usize,
    count: usize,
    ema: Option<f32>,
    latest: Option<f32>,
}

impl Default for SignalConditioner {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalConditioner {
    pub const fn new() -> Self {
        Self {
            ring: [0.0; WINDOW],
            head: 0,
            count: 0,
            ema: None,
            latest: None,
        }
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Reset and seed with a fresh sample (sensor recovery path).
    pub fn reseed(&mut self, sample: f32, alpha: f32) -> Option<f32> {
        self.reset();
        self.push(sample, alpha)
    }

    /// Feed one valid sample and return the new decision value.
    ///
    /// Non-finite samples are treated as missing and leave the state
    /// untouched; the previous decision value is returned.
    pub fn push(&mut self, sample: f32, alpha: f32) -> Option<f32> {
        if !sample.is_finite() {
            return self.decision_value();
        }

        self.ring[self.head] = sample;
        self.head = (self.head + 1) % WINDOW;
        if self.count < WINDOW {
            self.count += 1;
        }
        self.latest = Some(sample);

        match self.ema {
            None => self.ema = Some(sample),
            Some(prev) if self.count == WINDOW => {
                let med = median3(self.ring[0], self.ring[1], self.ring[2]);
                self.ema = Some(alpha * med + (1.0 - alpha) * prev);
            }
            Some(_) => {}
        }

        self.decision_value()
    }

    /// Raw sample until the window fills, smoothed value afterwards.
    pub fn decision_value(&self) -> Option<f32> {
        if self.window_full() {
            self.ema
        } else {
            self.latest
        }
    }

    pub fn window_full(&self) -> bool {
        self.count == WINDOW
    }

    pub fn smoothed(&self) -> Option<SmoothedReading> {
        self.ema.map(|value| SmoothedReading {
            value,
            samples: self.count as u8,
            window_full: self.window_full(),
        })
    }
}

/// Median of three values without sorting.
pub fn median3(a: f32, b: f32, c: f32) -> f32 {
    a.min(b).max(a.max(b).min(c))
}

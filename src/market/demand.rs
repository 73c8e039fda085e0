//! Predicted demand patterns and realized-demand noise.

use std::f64::consts::PI;
use std::str::FromStr;

use rand::{SeedableRng, rngs::StdRng};

use crate::config::DemandConfig;
use crate::devices::types::{gaussian_noise, hour_of_day};
use crate::error::{Result, SimError};

/// Source of predicted demand as a function of time-of-day.
///
/// `time_fraction` is the elapsed fraction of a day (`1.0` = 24 hours);
/// values past one day wrap. Any `Fn(f64) -> f64` is a profile, so tests
/// and hosts can inject their own curve.
///
/// # Examples
///
/// ```
/// use iso_pcs_sim::market::demand::DemandProfile;
///
/// let flat = |_t: f64| 120.0;
/// assert_eq!(flat.predict(0.3), 120.0);
/// ```
pub trait DemandProfile {
    fn predict(&self, time_fraction: f64) -> f64;
}

impl<F> DemandProfile for F
where
    F: Fn(f64) -> f64,
{
    fn predict(&self, time_fraction: f64) -> f64 {
        self(time_fraction)
    }
}

/// Built-in demand pattern identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemandPattern {
    /// Cosine around `base_load` peaking at `peak_hour`.
    Sinusoidal,
    /// Flat `base_load`.
    Constant,
    /// Two Gaussian bumps at the morning and evening peak hours.
    DoublePeak,
}

impl FromStr for DemandPattern {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sinusoidal" => Ok(Self::Sinusoidal),
            "constant" => Ok(Self::Constant),
            "double_peak" => Ok(Self::DoublePeak),
            _ => Err(SimError::UnsupportedDemandPattern(s.to_string())),
        }
    }
}

/// Demand profile built from the `[demand]` configuration section.
#[derive(Debug, Clone)]
pub struct PatternDemand {
    pub pattern: DemandPattern,
    pub base_load: f64,
    pub amplitude: f64,
    pub peak_hour: f64,
    pub morning_peak_hour: f64,
    pub peak_width_hours: f64,
    pub period_hours: f64,
}

impl PatternDemand {
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedDemandPattern`] for an unknown pattern.
    pub fn from_config(config: &DemandConfig) -> Result<Self> {
        Ok(Self {
            pattern: config.pattern.parse()?,
            base_load: config.base_load,
            amplitude: config.amplitude,
            peak_hour: config.peak_hour,
            morning_peak_hour: config.morning_peak_hour,
            peak_width_hours: config.peak_width_hours,
            period_hours: config.period_hours,
        })
    }

    fn bump(&self, hour: f64, center: f64) -> f64 {
        // circular distance so a peak near midnight wraps
        let d = (hour - center).rem_euclid(24.0);
        let d = d.min(24.0 - d);
        (-(d * d) / (2.0 * self.peak_width_hours * self.peak_width_hours)).exp()
    }
}

impl DemandProfile for PatternDemand {
    fn predict(&self, time_fraction: f64) -> f64 {
        let hour = hour_of_day(time_fraction);
        let value = match self.pattern {
            DemandPattern::Constant => self.base_load,
            DemandPattern::Sinusoidal => {
                let angle = 2.0 * PI * (hour - self.peak_hour) / self.period_hours;
                self.base_load + self.amplitude * angle.cos()
            }
            DemandPattern::DoublePeak => {
                let bumps =
                    self.bump(hour, self.morning_peak_hour) + self.bump(hour, self.peak_hour);
                self.base_load + self.amplitude * bumps
            }
        };
        value.max(0.0)
    }
}

/// Zero-mean Gaussian noise turning predicted into realized demand.
#[derive(Debug, Clone)]
pub struct DemandNoise {
    sigma: f64,
    rng: StdRng,
}

impl DemandNoise {
    pub fn new(sigma: f64, seed: u64) -> Self {
        Self {
            sigma: sigma.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Realized demand for one step.
    pub fn realize(&mut self, predicted: f64) -> f64 {
        predicted + gaussian_noise(&mut self.rng, self.sigma)
    }
}

use rand::{SeedableRng, rngs::StdRng};

use crate::config::ProductionConfig;
use crate::devices::types::{EnergyProfile, gaussian_noise, hour_of_day};

/// On-site generation attached to a PCS unit (e.g. rooftop solar).
///
/// `Production` follows a half-sine shape between sunrise and sunset with a
/// configurable peak and optional multiplicative noise. Output is never
/// negative.
#[derive(Debug, Clone)]
pub struct Production {
    /// Peak energy produced per step (MWh) under ideal conditions.
    pub peak: f64,

    /// Hour of day when generation starts (inclusive).
    pub sunrise_hour: f64,

    /// Hour of day when generation stops (exclusive).
    pub sunset_hour: f64,

    /// Standard deviation of the multiplicative noise (e.g. 0.05 for +/-5%).
    pub noise_std: f64,

    rng: StdRng,
}

impl Production {
    /// Creates a production profile from its configuration section.
    ///
    /// # Panics
    ///
    /// Panics if `sunrise_hour >= sunset_hour`.
    pub fn new(config: &ProductionConfig, seed: u64) -> Self {
        assert!(config.sunrise_hour < config.sunset_hour);
        Self {
            peak: config.peak.max(0.0),
            sunrise_hour: config.sunrise_hour,
            sunset_hour: config.sunset_hour,
            noise_std: config.noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Shape of the daylight curve in `[0, 1]` at the given hour.
    pub fn daylight_frac(&self, hour: f64) -> f64 {
        if hour < self.sunrise_hour || hour >= self.sunset_hour {
            return 0.0;
        }
        let span = self.sunset_hour - self.sunrise_hour;
        (std::f64::consts::PI * (hour - self.sunrise_hour) / span).sin()
    }

    /// Maximum energy this profile can produce in one step.
    pub fn max_output(&self) -> f64 {
        self.peak * (1.0 + 3.0 * self.noise_std)
    }
}

impl EnergyProfile for Production {
    fn energy_at(&mut self, time_fraction: f64) -> f64 {
        let frac = self.daylight_frac(hour_of_day(time_fraction));
        if frac <= 0.0 {
            return 0.0;
        }

        let noise_mult = 1.0 + gaussian_noise(&mut self.rng, self.noise_std);
        (self.peak * frac * noise_mult).max(0.0)
    }

    fn profile_type(&self) -> &'static str {
        "Production"
    }
}

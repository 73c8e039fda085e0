use rand::{SeedableRng, rngs::StdRng};

use crate::config::ConsumptionConfig;
use crate::devices::types::{EnergyProfile, gaussian_noise};

/// Local load attached to a PCS unit.
///
/// `Consumption` creates a sinusoidal daily pattern with configurable
/// baseline, amplitude, phase, and random noise. The result is never
/// negative.
///
/// # Examples
///
/// ```
/// use iso_pcs_sim::config::ConsumptionConfig;
/// use iso_pcs_sim::devices::{Consumption, EnergyProfile};
///
/// let mut load = Consumption::new(&ConsumptionConfig::default(), 42);
/// let evening = load.energy_at(0.8);
/// assert!(evening >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Consumption {
    /// Baseline consumption per step (MWh).
    pub base: f64,

    /// Amplitude of the sinusoidal variation (MWh).
    pub amplitude: f64,

    /// Phase offset of the sinusoidal pattern in radians.
    pub phase_rad: f64,

    /// Standard deviation of the additive Gaussian noise (MWh).
    pub noise_std: f64,

    rng: StdRng,
}

impl Consumption {
    /// Creates a consumption profile from its configuration section.
    pub fn new(config: &ConsumptionConfig, seed: u64) -> Self {
        Self {
            base: config.base,
            amplitude: config.amplitude,
            phase_rad: config.phase_rad,
            noise_std: config.noise_std.max(0.0),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Upper bound used for the consumption action range.
    pub fn max_output(&self) -> f64 {
        (self.base + self.amplitude.abs() + 3.0 * self.noise_std).max(0.0)
    }
}

impl EnergyProfile for Consumption {
    fn energy_at(&mut self, time_fraction: f64) -> f64 {
        let day_pos = time_fraction.rem_euclid(1.0);
        let angle = 2.0 * std::f64::consts::PI * day_pos + self.phase_rad;
        let noise = gaussian_noise(&mut self.rng, self.noise_std);

        (self.base + self.amplitude * angle.sin() + noise).max(0.0)
    }

    fn profile_type(&self) -> &'static str {
        "Consumption"
    }
}

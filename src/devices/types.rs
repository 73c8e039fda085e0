//! Common types and traits for PCS-side device models.

use rand::{Rng, rngs::StdRng};

/// Hours in one simulated day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Trait for a device whose energy output or draw depends on the time of day.
///
/// Implemented by production and consumption profiles so a [`PcsUnit`]
/// can query them uniformly.
///
/// [`PcsUnit`]: crate::devices::PcsUnit
pub trait EnergyProfile {
    /// Returns the energy (MWh) produced or consumed over one step at the
    /// given time of day.
    ///
    /// # Arguments
    ///
    /// * `time_fraction` - Time of day as a fraction in `[0, 1]`; values past
    ///   1.0 wrap to the next day
    fn energy_at(&mut self, time_fraction: f64) -> f64;

    /// Returns a human-readable type name for the profile.
    fn profile_type(&self) -> &'static str;
}

/// Converts a fraction of the day into the hour of day in `[0, 24)`.
pub fn hour_of_day(time_fraction: f64) -> f64 {
    (time_fraction.rem_euclid(1.0)) * HOURS_PER_DAY
}

/// Utility function to generate Gaussian noise using Box-Muller transform.
///
/// # Arguments
///
/// * `rng` - Random number generator
/// * `std_dev` - Standard deviation of the noise
///
/// # Returns
///
/// Random value from a Gaussian distribution with mean 0 and specified standard deviation
pub fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }

    let u1: f64 = rng.random::<f64>().clamp(1e-12, 1.0);
    let u2: f64 = rng.random::<f64>();
    let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    z0 * std_dev
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn hour_of_day_wraps() {
        assert_eq!(hour_of_day(0.5), 12.0);
        assert_eq!(hour_of_day(1.25), 6.0);
        assert_eq!(hour_of_day(0.0), 0.0);
    }

    #[test]
    fn zero_std_gives_zero_noise() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(gaussian_noise(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn noise_is_seeded() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(gaussian_noise(&mut a, 2.0), gaussian_noise(&mut b, 2.0));
        }
    }

    #[test]
    fn noise_mean_is_near_zero() {
        let mut rng = StdRng::seed_from_u64(42);
        let n = 5000;
        let sum: f64 = (0..n).map(|_| gaussian_noise(&mut rng, 1.0)).sum();
        assert!((sum / n as f64).abs() < 0.1);
    }
}

use tracing::{debug, warn};

use crate::config::BatteryConfig;

/// Absolute distance from a bound (MWh) at which requests toward that bound
/// are rejected outright.
pub const LEVEL_TOLERANCE: f64 = 1e-6;

/// Width of the soft band near each bound, as a fraction of usable capacity.
///
/// Inside the band, requests toward the bound are scaled linearly to zero.
pub const EDGE_BAND_FRACTION: f64 = 0.01;

/// Energy storage model for one PCS unit.
///
/// `BatteryStorage` tracks the stored energy level and applies rate limits,
/// round-trip efficiency and capacity bounds to every requested action.
///
/// # Action Convention
/// - Positive action: Charging (energy drawn from the grid into storage)
/// - Negative action: Discharging (energy released from storage)
///
/// The level can only change through [`BatteryStorage::update`] and stays
/// within `[min, max]` at every observable point.
#[derive(Debug, Clone)]
pub struct BatteryStorage {
    /// Minimum stored energy in MWh.
    pub min: f64,

    /// Maximum stored energy in MWh.
    pub max: f64,

    /// Maximum charge per step in MWh (positive value).
    pub charge_rate_max: f64,

    /// Maximum discharge per step in MWh (positive value).
    pub discharge_rate_max: f64,

    /// Charging efficiency (0..1.0].
    pub charge_efficiency: f64,

    /// Discharging efficiency (0..1.0].
    pub discharge_efficiency: f64,

    /// Level restored by [`BatteryStorage::reset`] when no override is given.
    initial_level: f64,

    level: f64,
    previous_level: f64,
    last_energy_change: f64,
}

/// Snapshot of the battery state exposed to controllers and metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryStatus {
    pub level: f64,
    pub previous_level: f64,
    pub energy_change: f64,
    /// Remaining headroom (`max - level`).
    pub available_capacity: f64,
    /// `level / max`, or 0 for a zero-capacity battery.
    pub used_capacity_ratio: f64,
}

impl BatteryStorage {
    /// Creates a new battery from its configuration section.
    ///
    /// The initial level is clamped into `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `max < min`, rates are negative, or efficiencies are outside
    /// `(0, 1]`. Configuration is validated before reaching this point.
    pub fn new(config: &BatteryConfig) -> Self {
        assert!(config.max >= config.min);
        assert!(config.charge_rate_max >= 0.0 && config.discharge_rate_max >= 0.0);
        assert!(config.charge_efficiency > 0.0 && config.charge_efficiency <= 1.0);
        assert!(config.discharge_efficiency > 0.0 && config.discharge_efficiency <= 1.0);

        let initial_level = config.init.clamp(config.min, config.max);
        Self {
            min: config.min,
            max: config.max,
            charge_rate_max: config.charge_rate_max,
            discharge_rate_max: config.discharge_rate_max,
            charge_efficiency: config.charge_efficiency,
            discharge_efficiency: config.discharge_efficiency,
            initial_level,
            level: initial_level,
            previous_level: initial_level,
            last_energy_change: 0.0,
        }
    }

    /// Current stored energy in MWh.
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Usable capacity (`max - min`) in MWh.
    pub fn capacity(&self) -> f64 {
        self.max - self.min
    }

    /// Configured level restored on reset.
    pub fn initial_level(&self) -> f64 {
        self.initial_level
    }

    /// Multiplier applied to requests heading toward a bound `distance` away.
    fn edge_scale(&self, distance: f64) -> f64 {
        let band = EDGE_BAND_FRACTION * self.capacity();
        if band <= 0.0 || distance >= band {
            1.0
        } else {
            (distance / band).max(0.0)
        }
    }

    /// Computes the energy change an action would cause, without mutating.
    ///
    /// Charging is limited by `charge_rate_max`, reduced by
    /// `charge_efficiency`, then limited by headroom. Discharging is limited
    /// by `discharge_rate_max` and by the stored energy expressed in input
    /// units (`available / discharge_efficiency`), then reduced by
    /// `discharge_efficiency`.
    ///
    /// Within [`LEVEL_TOLERANCE`] of a bound, requests toward it return exactly
    /// `0.0`. Within [`EDGE_BAND_FRACTION`] of capacity they are scaled down
    /// linearly.
    ///
    /// # Returns
    ///
    /// `(energy_change, new_level)` where `energy_change` is positive when
    /// charging and `new_level` is clamped into `[min, max]`.
    pub fn calculate_energy_change(&self, action: f64) -> (f64, f64) {
        let energy_change = if action > 0.0 {
            let headroom = self.max - self.level;
            if headroom <= LEVEL_TOLERANCE {
                0.0
            } else {
                let requested = action.min(self.charge_rate_max) * self.edge_scale(headroom);
                (requested * self.charge_efficiency).min(headroom)
            }
        } else if action < 0.0 {
            let available = self.level - self.min;
            if available <= LEVEL_TOLERANCE {
                0.0
            } else {
                let magnitude = (-action)
                    .min(self.discharge_rate_max)
                    .min(available / self.discharge_efficiency)
                    * self.edge_scale(available);
                -(magnitude * self.discharge_efficiency)
            }
        } else {
            0.0
        };

        let new_level = (self.level + energy_change).clamp(self.min, self.max);

        debug!(
            action,
            energy_change,
            new_level,
            max = self.max,
            "battery energy change"
        );

        (energy_change, new_level)
    }

    /// Applies an action and returns the actual energy change.
    pub fn update(&mut self, action: f64) -> f64 {
        let (energy_change, new_level) = self.calculate_energy_change(action);

        self.previous_level = self.level;
        self.level = new_level;
        self.last_energy_change = energy_change;

        debug!(
            from = self.previous_level,
            to = self.level,
            delta = energy_change,
            "battery updated"
        );

        energy_change
    }

    /// Clips a requested action to what the battery can physically deliver.
    ///
    /// Charge requests are limited to `charge_rate_max`; discharge requests to
    /// the smaller of `discharge_rate_max` and the stored energy above `min`.
    /// Requests toward a bound already within [`LEVEL_TOLERANCE`] become `0.0`.
    pub fn validate_action(&self, action: f64) -> f64 {
        let validated = if action > 0.0 {
            if self.max - self.level <= LEVEL_TOLERANCE {
                0.0
            } else {
                action.min(self.charge_rate_max)
            }
        } else if action < 0.0 {
            let limit = self.discharge_rate_max.min(self.level - self.min);
            if limit <= LEVEL_TOLERANCE {
                0.0
            } else {
                action.max(-limit)
            }
        } else {
            0.0
        };

        if validated != action && !action.is_nan() {
            warn!(
                requested = action,
                validated,
                level = self.level,
                "battery action saturated"
            );
        }

        validated
    }

    /// Returns a snapshot of the current state.
    pub fn status(&self) -> BatteryStatus {
        BatteryStatus {
            level: self.level,
            previous_level: self.previous_level,
            energy_change: self.last_energy_change,
            available_capacity: self.max - self.level,
            used_capacity_ratio: if self.max > 0.0 {
                self.level / self.max
            } else {
                0.0
            },
        }
    }

    /// Restores the battery to `initial_level`, or to the configured level.
    ///
    /// Overrides are clamped into `[min, max]`.
    pub fn reset(&mut self, initial_level: Option<f64>) {
        let level = initial_level
            .map(|l| l.clamp(self.min, self.max))
            .unwrap_or(self.initial_level);
        self.level = level;
        self.previous_level = level;
        self.last_energy_change = 0.0;
    }
}

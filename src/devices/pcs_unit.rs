//! Power Consumption & Storage unit: a battery with local production and load.

use crate::config::{ConsumptionConfig, ProductionConfig, ScenarioConfig};
use crate::devices::battery::BatteryStorage;
use crate::devices::consumption::Consumption;
use crate::devices::production::Production;
use crate::devices::types::EnergyProfile;
use crate::sim::power_balance::pcs_net_exchange;

/// Seed offset for the consumption RNG to avoid correlation with production.
const CONSUMPTION_SEED_OFFSET: u64 = 31;

/// Outcome of one PCS unit update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcsStep {
    /// Battery action after validation (MWh, positive=charge).
    pub battery_action: f64,
    /// Energy actually stored (positive) or released (negative).
    pub energy_change: f64,
    /// Battery level after the update.
    pub battery_level: f64,
    /// Energy produced this step.
    pub production: f64,
    /// Energy consumed this step.
    pub consumption: f64,
    /// Net energy requested from the grid (negative when exporting).
    pub net_exchange: f64,
}

/// A PCS unit owning exactly one [`BatteryStorage`] plus its production and
/// consumption profiles.
#[derive(Debug, Clone)]
pub struct PcsUnit {
    battery: BatteryStorage,
    production: Production,
    consumption: Consumption,
    seed: u64,
    production_config: ProductionConfig,
    consumption_config: ConsumptionConfig,
}

impl PcsUnit {
    /// Builds a unit from the scenario's battery, production and consumption
    /// sections.
    pub fn new(config: &ScenarioConfig, seed: u64) -> Self {
        Self {
            battery: BatteryStorage::new(&config.battery),
            production: Production::new(&config.production, seed),
            consumption: Consumption::new(
                &config.consumption,
                seed.wrapping_add(CONSUMPTION_SEED_OFFSET),
            ),
            seed,
            production_config: config.production.clone(),
            consumption_config: config.consumption.clone(),
        }
    }

    /// Read access to the battery.
    pub fn battery(&self) -> &BatteryStorage {
        &self.battery
    }

    /// Upper bound for a production override action.
    pub fn max_production(&self) -> f64 {
        self.production.max_output()
    }

    /// Upper bound for a consumption override action.
    pub fn max_consumption(&self) -> f64 {
        self.consumption.max_output()
    }

    /// Advances the unit by one step.
    ///
    /// The battery action is validated, then applied. `consumption_action` and
    /// `production_action` replace the profile values when present, saturated
    /// into `[0, max_consumption]` and `[0, max_production]`.
    pub fn update(
        &mut self,
        time_fraction: f64,
        battery_action: f64,
        consumption_action: Option<f64>,
        production_action: Option<f64>,
    ) -> PcsStep {
        let battery_action = self.battery.validate_action(battery_action);
        let energy_change = self.battery.update(battery_action);

        let production = match production_action {
            Some(p) => p.min(self.max_production()).max(0.0),
            None => self.production.energy_at(time_fraction),
        };
        let consumption = match consumption_action {
            Some(c) => c.min(self.max_consumption()).max(0.0),
            None => self.consumption.energy_at(time_fraction),
        };

        PcsStep {
            battery_action,
            energy_change,
            battery_level: self.battery.level(),
            production,
            consumption,
            net_exchange: pcs_net_exchange(consumption, production, energy_change),
        }
    }

    /// Peeks at the production and consumption the profiles would report,
    /// without advancing their noise generators.
    pub fn preview(&self, time_fraction: f64) -> (f64, f64) {
        let mut production = self.production.clone();
        let mut consumption = self.consumption.clone();
        (
            production.energy_at(time_fraction),
            consumption.energy_at(time_fraction),
        )
    }

    /// Restores the battery and reseeds the profiles.
    pub fn reset(&mut self, initial_level: Option<f64>) {
        self.battery.reset(initial_level);
        self.production = Production::new(&self.production_config, self.seed);
        self.consumption = Consumption::new(
            &self.consumption_config,
            self.seed.wrapping_add(CONSUMPTION_SEED_OFFSET),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> PcsUnit {
        let mut cfg = ScenarioConfig::baseline();
        cfg.production.noise_std = 0.0;
        cfg.consumption.noise_std = 0.0;
        cfg.battery.init = 50.0;
        cfg.battery.charge_efficiency = 1.0;
        cfg.battery.discharge_efficiency = 1.0;
        PcsUnit::new(&cfg, 3)
    }

    #[test]
    fn charging_adds_to_grid_import() {
        let mut u = unit();
        let (production, consumption) = u.preview(0.5);
        let step = u.update(0.5, 5.0, None, None);
        assert_eq!(step.energy_change, 5.0);
        assert!((step.net_exchange - (consumption - production + 5.0)).abs() < 1e-12);
    }

    #[test]
    fn discharging_reduces_grid_import() {
        let mut u = unit();
        let step = u.update(0.0, -4.0, Some(1.0), Some(0.0));
        assert_eq!(step.energy_change, -4.0);
        assert_eq!(step.net_exchange, -3.0);
        assert_eq!(step.battery_level, 46.0);
    }

    #[test]
    fn overrides_are_clamped_at_zero() {
        let mut u = unit();
        let step = u.update(0.5, 0.0, Some(-2.0), Some(-1.0));
        assert_eq!(step.consumption, 0.0);
        assert_eq!(step.production, 0.0);
    }

    #[test]
    fn overrides_saturate_at_profile_maximum() {
        let mut u = unit();
        let step = u.update(0.5, 0.0, Some(1e9), Some(1e9));
        assert_eq!(step.consumption, u.max_consumption());
        assert_eq!(step.production, u.max_production());
        assert_eq!(step.net_exchange, u.max_consumption() - u.max_production());
    }

    #[test]
    fn reset_restores_battery() {
        let mut u = unit();
        u.update(0.1, 10.0, None, None);
        u.reset(None);
        assert_eq!(u.battery().level(), 50.0);
    }
}

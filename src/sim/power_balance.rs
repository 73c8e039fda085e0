//! Grid energy balance helpers.
//!
//! Sign convention: positive values are energy drawn from the grid,
//! negative values are energy fed into it.

/// Net energy one PCS unit requests from the grid in a step.
///
/// Charging (`energy_change > 0`) is counted as grid import, since the
/// stored energy is bought from the grid; discharging reduces the import.
/// A net buyer is therefore positive.
///
/// # Arguments
///
/// * `consumption` - Local load (MWh, >= 0)
/// * `production` - On-site generation (MWh, >= 0)
/// * `energy_change` - Energy stored (+) or released (-) by the battery
pub fn pcs_net_exchange(consumption: f64, production: f64, energy_change: f64) -> f64 {
    consumption - production + energy_change
}

/// Grid net demand: realized demand plus aggregate PCS import.
pub fn net_demand(realized_demand: f64, pcs_demand: f64) -> f64 {
    realized_demand + pcs_demand
}

/// Unmet net demand beyond dispatch; never negative.
pub fn shortfall(net_demand: f64, dispatch: f64) -> f64 {
    (net_demand - dispatch).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_only_imports() {
        assert_eq!(pcs_net_exchange(3.0, 0.0, 0.0), 3.0);
    }

    #[test]
    fn production_exports() {
        assert_eq!(pcs_net_exchange(1.0, 4.0, 0.0), -3.0);
    }

    #[test]
    fn charging_adds_import() {
        assert_eq!(pcs_net_exchange(1.0, 1.0, 2.5), 2.5);
    }

    #[test]
    fn discharge_reduces_import() {
        assert_eq!(pcs_net_exchange(2.0, 0.0, -1.5), 0.5);
    }

    #[test]
    fn shortfall_is_clamped() {
        assert_eq!(shortfall(90.0, 100.0), 0.0);
        assert_eq!(shortfall(110.0, 100.0), 10.0);
        assert_eq!(net_demand(100.0, -5.0), 95.0);
    }
}

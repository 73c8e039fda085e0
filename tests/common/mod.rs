//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use iso_pcs_sim::config::ScenarioConfig;
use iso_pcs_sim::sim::iso_controller::IsoController;
use iso_pcs_sim::sim::pcs_controller::PcsController;
use iso_pcs_sim::market::pricing::PricingPolicy;
use iso_pcs_sim::sim::schedule::DayAheadSchedule;

/// Baseline scenario shortened to `horizon` steps, device noise disabled.
pub fn short_config(horizon: usize) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::baseline();
    cfg.time.max_steps_per_episode = horizon;
    cfg.production.noise_std = 0.0;
    cfg.consumption.noise_std = 0.0;
    cfg
}

/// Same as [`short_config`] with the given pricing policy.
pub fn config_with_policy(policy: &str, horizon: usize) -> ScenarioConfig {
    let mut cfg = short_config(horizon);
    cfg.pricing.policy = policy.to_string();
    cfg
}

pub fn iso_controller(cfg: ScenarioConfig) -> IsoController {
    IsoController::new(cfg).expect("iso controller should build")
}

pub fn pcs_controller(cfg: ScenarioConfig) -> PcsController {
    PcsController::new(cfg).expect("pcs controller should build")
}

/// Quadratic bid with flat prices and the given dispatch profile.
pub fn quadratic_bid(profile: &[f64], buy: f64, sell: f64) -> Vec<f64> {
    DayAheadSchedule::bid_action(PricingPolicy::Quadratic, profile, buy, sell)
}

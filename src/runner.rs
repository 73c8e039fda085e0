//! Baseline episode runners used by the binary and integration tests.
//!
//! The ISO runner bids a forecast-following day-ahead schedule (or flat
//! online prices); the PCS runner drives one battery with the configured
//! fixed policy against a paired forecast-following ISO.

use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::forecast::NaiveForecast;
use crate::market::pricing::PricingPolicy;
use crate::sim::iso_controller::IsoController;
use crate::sim::kpi::KpiReport;
use crate::sim::pcs_controller::PcsController;
use crate::sim::policy::{PcsObservation, PcsPolicy, policy_from_config};
use crate::sim::schedule::DayAheadSchedule;
use crate::sim::types::{Environment, PcsAction, ResetOptions, StepInfo};

/// Records and KPIs of one finished episode.
#[derive(Debug, Clone)]
pub struct EpisodeOutcome {
    /// 1-based episode index.
    pub episode: usize,
    pub records: Vec<StepInfo>,
    pub kpi: KpiReport,
}

fn episode_seed(seed: Option<u64>, episode: usize) -> Option<u64> {
    seed.map(|s| s.wrapping_add(episode as u64))
}

/// Dispatch profile for the baseline bid.
fn bid_profile(policy: PricingPolicy, forecast: &[f64]) -> Vec<f64> {
    match policy {
        PricingPolicy::Constant => DayAheadSchedule::flat_target(forecast),
        PricingPolicy::Quadratic | PricingPolicy::Online => forecast.to_vec(),
    }
}

/// Runs `episodes` ISO-primary episodes with the baseline bid.
///
/// The first episode bids the predicted-demand forecast; later episodes
/// bid a naive forecast built from the previous episode's realized demand.
///
/// # Errors
///
/// Returns any construction or step error from the controller.
pub fn run_iso_episodes(
    config: &ScenarioConfig,
    episodes: usize,
    seed: Option<u64>,
) -> Result<Vec<EpisodeOutcome>> {
    let mut env = IsoController::new(config.clone())?;
    let policy = env.pricing().policy();
    let horizon = config.time.max_steps_per_episode;
    let capacity = config.battery.max - config.battery.min;
    let mut forecast = env.demand_forecast();
    let mut outcomes = Vec::with_capacity(episodes);

    for episode in 0..episodes {
        env.reset(episode_seed(seed, episode), ResetOptions::default())?;
        let action = DayAheadSchedule::bid_action(
            policy,
            &bid_profile(policy, &forecast),
            config.pricing.default_buy_price,
            config.pricing.default_sell_price,
        );

        let mut records = Vec::with_capacity(horizon);
        loop {
            let t = env.step(&action)?;
            records.push(t.info);
            if t.terminated || t.truncated {
                break;
            }
        }

        let realized: Vec<f64> = records.iter().map(|r| r.grid.realized_demand).collect();
        forecast = NaiveForecast.forecast(&realized, horizon);

        let kpi = KpiReport::from_records(&records, capacity);
        info!(episode = episode + 1, total_reward = kpi.total_reward, "iso episode complete");
        outcomes.push(EpisodeOutcome {
            episode: episode + 1,
            records,
            kpi,
        });
    }
    Ok(outcomes)
}

/// Runs `episodes` PCS-primary episodes with the configured fixed policy.
///
/// # Errors
///
/// Returns any construction or step error from the controller.
pub fn run_pcs_episodes(
    config: &ScenarioConfig,
    episodes: usize,
    seed: Option<u64>,
) -> Result<Vec<EpisodeOutcome>> {
    let mut env = PcsController::new(config.clone())?;
    let horizon = config.time.max_steps_per_episode;
    let capacity = config.battery.max - config.battery.min;

    let iso = IsoController::new(config.clone())?;
    let policy = iso.pricing().policy();
    let bid = DayAheadSchedule::bid_action(
        policy,
        &bid_profile(policy, &iso.demand_forecast()),
        config.pricing.default_buy_price,
        config.pricing.default_sell_price,
    );
    env.set_iso_policy(Box::new(move |_obs: &[f64; 3]| bid.clone()));

    let mut pcs_policy = policy_from_config(&config.pcs_policy)?;
    let mut outcomes = Vec::with_capacity(episodes);

    for episode in 0..episodes {
        let (mut obs, _) = env.reset(episode_seed(seed, episode), ResetOptions::default())?;
        let mut records = Vec::with_capacity(horizon);
        loop {
            let view = PcsObservation {
                battery_level: obs[0],
                time: obs[1],
                buy_price: obs[2],
                sell_price: obs[3],
                ..PcsObservation::default()
            };
            let battery = match pcs_policy.as_mut() {
                Some(policy) => policy.battery_action(&view),
                None => 0.0,
            };
            let action = PcsAction::Scalar(battery);
            let t = env.step(&action)?;
            obs = t.observation;
            records.push(t.info);
            if t.terminated || t.truncated {
                break;
            }
        }

        let kpi = KpiReport::from_records(&records, capacity);
        info!(episode = episode + 1, total_reward = kpi.total_reward, "pcs episode complete");
        outcomes.push(EpisodeOutcome {
            episode: episode + 1,
            records,
            kpi,
        });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn short(mut cfg: ScenarioConfig) -> ScenarioConfig {
        cfg.time.max_steps_per_episode = 6;
        cfg
    }

    #[test]
    fn iso_runner_produces_full_episodes() {
        let outcomes = run_iso_episodes(&short(ScenarioConfig::baseline()), 2, Some(5)).unwrap();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.records.len() == 6));
        assert_eq!(outcomes[1].episode, 2);
    }

    #[test]
    fn pcs_runner_produces_full_episode() {
        let outcomes = run_pcs_episodes(&short(ScenarioConfig::constant()), 1, Some(5)).unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].kpi.steps, 6);
    }

    #[test]
    fn online_runner_works() {
        let outcomes = run_iso_episodes(&short(ScenarioConfig::online()), 1, None).unwrap();
        assert_eq!(outcomes[0].records.len(), 6);
    }
}

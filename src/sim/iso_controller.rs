//! ISO-primary controller: the agent sets prices, PCS agents respond.

use tracing::debug;

use crate::config::ScenarioConfig;
use crate::error::Result;
use crate::market::demand::DemandProfile;
use crate::market::pricing::{ActionSpace, Pricing, PricingStrategy};
use crate::reward::RewardFunction;
use crate::sim::episode::EpisodeCore;
use crate::sim::metrics::EpisodeMetrics;
use crate::sim::pcs_simulator::PcsSimulator;
use crate::sim::types::{Environment, ResetOptions, StepInfo, Transition};

/// ISO observation: `[time_fraction, predicted_demand, pcs_net_demand]`.
pub type IsoObservation = [f64; 3];

/// Controller where the agent is the ISO.
///
/// Each step consumes a pricing action, lets every PCS agent respond to the
/// resulting prices and prices the grid balance.
///
/// # Examples
///
/// ```
/// use iso_pcs_sim::config::ScenarioConfig;
/// use iso_pcs_sim::sim::iso_controller::IsoController;
/// use iso_pcs_sim::sim::types::{Environment, ResetOptions};
///
/// let mut cfg = ScenarioConfig::online();
/// cfg.time.max_steps_per_episode = 2;
/// let mut env = IsoController::new(cfg).unwrap();
/// env.reset(Some(1), ResetOptions::default()).unwrap();
/// let t = env.step(&[6.0, 4.0]).unwrap();
/// assert!(t.info.grid.shortfall >= 0.0);
/// ```
pub struct IsoController {
    config: ScenarioConfig,
    core: EpisodeCore,
    pricing: Pricing,
    pcs: PcsSimulator,
    last_pcs_demand: f64,
}

impl IsoController {
    /// Builds the controller from a scenario.
    ///
    /// # Errors
    ///
    /// Returns the matching `Unsupported*` error for an unknown pricing
    /// policy, reward, demand pattern or cost type, and
    /// [`crate::error::SimError::Config`] for any other invalid field.
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        let pricing = Pricing::from_config(&config)?;
        let core = EpisodeCore::new(&config, &config.simulation.iso_reward)?;
        config.ensure_valid()?;
        let pcs = PcsSimulator::from_config(&config)?;
        Ok(Self {
            config,
            core,
            pricing,
            pcs,
            last_pcs_demand: 0.0,
        })
    }

    /// Replaces the predicted demand source.
    pub fn with_demand_profile(mut self, profile: impl DemandProfile + Send + 'static) -> Self {
        self.core.set_demand_profile(Box::new(profile));
        self
    }

    /// Replaces the reward function until the next `reset` that names one.
    pub fn set_reward_function(&mut self, reward: Box<dyn RewardFunction + Send>) {
        self.core.set_reward_function(reward);
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn pricing(&self) -> &Pricing {
        &self.pricing
    }

    pub fn pcs_simulator(&self) -> &PcsSimulator {
        &self.pcs
    }

    /// Mutable access for installing agent policies.
    pub fn pcs_simulator_mut(&mut self) -> &mut PcsSimulator {
        &mut self.pcs
    }

    pub fn metrics(&self) -> &EpisodeMetrics {
        &self.core.metrics
    }

    /// Predicted demand for each step of an episode, in step order.
    pub fn demand_forecast(&self) -> Vec<f64> {
        (1..=self.core.clock.horizon())
            .map(|step| self.core.predict(self.core.clock.time_fraction_at(step)))
            .collect()
    }
}

impl Environment for IsoController {
    type Action = [f64];
    type Observation = IsoObservation;

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: ResetOptions,
    ) -> Result<(IsoObservation, StepInfo)> {
        self.core.reset(seed, &options)?;
        self.pricing.reset();
        self.pcs.reset(options.battery_level);
        self.last_pcs_demand = 0.0;

        let predicted = self.core.predict(0.0);
        let info = StepInfo {
            battery_levels: self.pcs.battery_levels(),
            ..StepInfo::default()
        };
        Ok(([0.0, predicted, 0.0], info))
    }

    fn step(&mut self, action: &[f64]) -> Result<Transition<IsoObservation>> {
        let (count, time) = self.core.next_step()?;
        let predicted = self.core.predict(time);
        let quote = self.pricing.process_action(action, count, predicted)?;

        let response = self
            .pcs
            .simulate_step(time, quote.buy_price, quote.sell_price);
        let grid = self.core.assess(predicted, response.total_demand, &quote);
        self.last_pcs_demand = response.total_demand;

        let (info, terminated) = self.core.finish(StepInfo {
            step: count,
            time,
            grid,
            production: response.production,
            consumption: response.consumption,
            battery_levels: response.battery_levels,
            battery_actions: response.battery_actions,
            energy_changes: response.energy_changes,
            reward: 0.0,
            total_reward: 0.0,
        });
        debug!(step = count, reward = info.reward, shortfall = info.grid.shortfall, "iso step");

        Ok(Transition {
            observation: [time, predicted, self.last_pcs_demand],
            reward: info.reward,
            terminated,
            truncated: false,
            info,
        })
    }

    fn observation_space(&self) -> ActionSpace {
        let horizon_days = self.core.clock.time_fraction_at(self.core.clock.horizon());
        ActionSpace::new(
            vec![0.0, 0.0, f64::NEG_INFINITY],
            vec![horizon_days, f64::INFINITY, f64::INFINITY],
        )
    }

    fn action_space(&self) -> ActionSpace {
        self.pricing.create_action_space()
    }
}

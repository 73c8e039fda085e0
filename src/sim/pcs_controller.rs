//! PCS-primary controller: the agent drives one battery against ISO prices.

use tracing::debug;

use crate::config::ScenarioConfig;
use crate::devices::pcs_unit::PcsUnit;
use crate::error::Result;
use crate::market::demand::DemandProfile;
use crate::market::pricing::{ActionSpace, PriceQuote, Pricing, PricingStrategy};
use crate::reward::RewardFunction;
use crate::sim::episode::EpisodeCore;
use crate::sim::metrics::EpisodeMetrics;
use crate::sim::policy::IsoPolicy;
use crate::sim::types::{Environment, PcsAction, ResetOptions, StepInfo, Transition};

/// PCS observation: `[battery_level, time_fraction, buy_price, sell_price]`.
pub type PcsObservationVec = [f64; 4];

/// Controller where the agent is a single PCS unit.
///
/// Prices come from a paired ISO policy run through the configured pricing
/// strategy. Without one, the configured default prices apply and dispatch
/// follows predicted demand.
pub struct PcsController {
    config: ScenarioConfig,
    core: EpisodeCore,
    pricing: Pricing,
    iso_policy: Option<Box<dyn IsoPolicy + Send>>,
    unit: PcsUnit,
    multi_action: bool,
    last_pcs_demand: f64,
}

impl PcsController {
    /// Builds the controller from a scenario.
    ///
    /// # Errors
    ///
    /// Returns the matching `Unsupported*` error for an unknown pricing
    /// policy, reward, demand pattern or cost type, and
    /// [`crate::error::SimError::Config`] for any other invalid field.
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        let pricing = Pricing::from_config(&config)?;
        let core = EpisodeCore::new(&config, &config.simulation.pcs_reward)?;
        config.ensure_valid()?;
        let unit = PcsUnit::new(&config, config.simulation.seed);
        Ok(Self {
            multi_action: config.action.multi_action,
            config,
            core,
            pricing,
            iso_policy: None,
            unit,
            last_pcs_demand: 0.0,
        })
    }

    /// Replaces the predicted demand source.
    pub fn with_demand_profile(mut self, profile: impl DemandProfile + Send + 'static) -> Self {
        self.core.set_demand_profile(Box::new(profile));
        self
    }

    /// Pairs the controller with an ISO policy.
    pub fn set_iso_policy(&mut self, policy: Box<dyn IsoPolicy + Send>) {
        self.iso_policy = Some(policy);
    }

    /// Falls back to the configured default prices.
    pub fn clear_iso_policy(&mut self) {
        self.iso_policy = None;
    }

    /// Replaces the reward function until the next `reset` that names one.
    pub fn set_reward_function(&mut self, reward: Box<dyn RewardFunction + Send>) {
        self.core.set_reward_function(reward);
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn unit(&self) -> &PcsUnit {
        &self.unit
    }

    pub fn metrics(&self) -> &EpisodeMetrics {
        &self.core.metrics
    }

    fn default_quote(&self, predicted_demand: f64) -> PriceQuote {
        PriceQuote {
            buy_price: self.config.pricing.default_buy_price,
            sell_price: self.config.pricing.default_sell_price,
            dispatch: predicted_demand,
            first_action_taken: false,
        }
    }

    fn resolve_quote(&mut self, count: usize, time: f64, predicted: f64) -> Result<PriceQuote> {
        if let Some(policy) = self.iso_policy.as_mut() {
            let action = policy.pricing_action(&[time, predicted, self.last_pcs_demand]);
            return self.pricing.process_action(&action, count, predicted);
        }
        Ok(self.default_quote(predicted))
    }
}

impl Environment for PcsController {
    type Action = PcsAction;
    type Observation = PcsObservationVec;

    fn reset(
        &mut self,
        seed: Option<u64>,
        options: ResetOptions,
    ) -> Result<(PcsObservationVec, StepInfo)> {
        self.core.reset(seed, &options)?;
        self.pricing.reset();
        self.unit.reset(options.battery_level);
        self.last_pcs_demand = 0.0;

        let quote = self.default_quote(self.core.predict(0.0));
        let level = self.unit.battery().level();
        let info = StepInfo {
            battery_levels: vec![level],
            ..StepInfo::default()
        };
        Ok(([level, 0.0, quote.buy_price, quote.sell_price], info))
    }

    fn step(&mut self, action: &PcsAction) -> Result<Transition<PcsObservationVec>> {
        let command = action.decode(self.multi_action)?;
        let (count, time) = self.core.next_step()?;
        let predicted = self.core.predict(time);
        let quote = self.resolve_quote(count, time, predicted)?;

        let pcs = self.unit.update(
            time,
            command.battery,
            command.consumption,
            command.production,
        );
        let grid = self.core.assess(predicted, pcs.net_exchange, &quote);
        self.last_pcs_demand = pcs.net_exchange;

        let (info, terminated) = self.core.finish(StepInfo {
            step: count,
            time,
            grid,
            production: pcs.production,
            consumption: pcs.consumption,
            battery_levels: vec![pcs.battery_level],
            battery_actions: vec![pcs.battery_action],
            energy_changes: vec![pcs.energy_change],
            reward: 0.0,
            total_reward: 0.0,
        });
        debug!(step = count, level = pcs.battery_level, reward = info.reward, "pcs step");

        Ok(Transition {
            observation: [pcs.battery_level, time, quote.buy_price, quote.sell_price],
            reward: info.reward,
            terminated,
            truncated: false,
            info,
        })
    }

    fn observation_space(&self) -> ActionSpace {
        let battery = self.unit.battery();
        let horizon_days = self.core.clock.time_fraction_at(self.core.clock.horizon());
        ActionSpace::new(
            vec![battery.min, 0.0, 0.0, 0.0],
            vec![battery.max, horizon_days, f64::INFINITY, f64::INFINITY],
        )
    }

    fn action_space(&self) -> ActionSpace {
        let battery = self.unit.battery();
        let space = ActionSpace::new(
            vec![-battery.discharge_rate_max],
            vec![battery.charge_rate_max],
        );
        if self.multi_action {
            space.concat(ActionSpace::new(
                vec![0.0, 0.0],
                vec![self.unit.max_consumption(), self.unit.max_production()],
            ))
        } else {
            space
        }
    }
}

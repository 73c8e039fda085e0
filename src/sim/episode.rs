//! Episode bookkeeping shared by both controllers.

use tracing::info;

use crate::config::ScenarioConfig;
use crate::error::{Result, SimError};
use crate::market::cost::{CostModel, GridStepRecord};
use crate::market::demand::{DemandNoise, DemandProfile, PatternDemand};
use crate::market::pricing::PriceQuote;
use crate::reward::{RewardFunction, create_reward};
use crate::sim::clock::EpisodeClock;
use crate::sim::metrics::EpisodeMetrics;
use crate::sim::types::{ResetOptions, StepInfo};

/// Clock, demand, costs, reward and metrics for one controller.
pub(crate) struct EpisodeCore {
    pub clock: EpisodeClock,
    pub metrics: EpisodeMetrics,
    demand: Box<dyn DemandProfile + Send>,
    noise: DemandNoise,
    costs: CostModel,
    reward: Box<dyn RewardFunction + Send>,
    master_seed: u64,
    battery_capacity: f64,
    started: bool,
}

impl EpisodeCore {
    pub fn new(config: &ScenarioConfig, reward_name: &str) -> Result<Self> {
        Ok(Self {
            clock: EpisodeClock::new(
                config.time.max_steps_per_episode,
                config.time.step_duration_minutes,
                config.time.minutes_per_day,
            ),
            metrics: EpisodeMetrics::new(),
            demand: Box::new(PatternDemand::from_config(&config.demand)?),
            noise: DemandNoise::new(config.demand.sigma, config.simulation.seed),
            costs: CostModel::from_config(&config.costs)?,
            reward: create_reward(reward_name)?,
            master_seed: config.simulation.seed,
            battery_capacity: config.battery.max - config.battery.min,
            started: false,
        })
    }

    pub fn set_demand_profile(&mut self, profile: Box<dyn DemandProfile + Send>) {
        self.demand = profile;
    }

    pub fn set_reward_function(&mut self, reward: Box<dyn RewardFunction + Send>) {
        self.reward = reward;
    }

    pub fn predict(&self, time: f64) -> f64 {
        self.demand.predict(time)
    }

    /// Starts a new episode and returns the seed it runs with.
    pub fn reset(&mut self, seed: Option<u64>, options: &ResetOptions) -> Result<u64> {
        if let Some(name) = options.reward.as_deref() {
            self.reward = create_reward(name)?;
        }
        let seed = seed.unwrap_or_else(|| {
            self.master_seed
                .wrapping_add(self.metrics.episode_count() as u64)
        });
        self.noise.reseed(seed);
        self.clock.reset();
        self.metrics.start_episode();
        self.started = true;
        info!(
            episode = self.metrics.episode_count(),
            seed,
            horizon = self.clock.horizon(),
            "episode reset"
        );
        Ok(seed)
    }

    /// Step count and time fraction of the next step, without advancing.
    pub fn next_step(&self) -> Result<(usize, f64)> {
        if !self.started {
            return Err(SimError::NotReset);
        }
        if self.clock.is_finished() {
            return Err(SimError::EpisodeFinished);
        }
        let count = self.clock.count() + 1;
        Ok((count, self.clock.time_fraction_at(count)))
    }

    /// Draws realized demand and prices the step.
    pub fn assess(
        &mut self,
        predicted: f64,
        pcs_demand: f64,
        quote: &PriceQuote,
    ) -> GridStepRecord {
        let realized = self.noise.realize(predicted);
        self.costs.assess(predicted, realized, pcs_demand, quote)
    }

    /// Advances the clock, scores and records the step.
    ///
    /// Returns the completed record and whether the episode terminated.
    pub fn finish(&mut self, mut info: StepInfo) -> (StepInfo, bool) {
        self.clock.tick();
        info.reward = self.reward.compute_reward(&info);
        info.total_reward = self.metrics.total_reward() + info.reward;
        self.metrics.record(&info);

        let terminated = self.clock.is_finished();
        if terminated {
            self.metrics.end_episode(self.battery_capacity);
        }
        (info, terminated)
    }
}

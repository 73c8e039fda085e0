//! Multi-agent PCS simulation and grid-facing aggregation.

use tracing::debug;

use crate::config::ScenarioConfig;
use crate::devices::pcs_unit::PcsUnit;
use crate::error::{Result, SimError};
use crate::sim::policy::{PcsObservation, PcsPolicy, policy_from_config};

/// Seed stride between agents so their noise streams differ.
const AGENT_SEED_STRIDE: u64 = 1_000;

/// One PCS unit with an optional response policy.
pub struct PcsAgent {
    unit: PcsUnit,
    policy: Option<Box<dyn PcsPolicy + Send>>,
}

impl PcsAgent {
    pub fn unit(&self) -> &PcsUnit {
        &self.unit
    }

    pub fn has_policy(&self) -> bool {
        self.policy.is_some()
    }
}

/// Aggregated PCS response for one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PcsResponse {
    /// Sum of every agent's net exchange (positive = net import).
    pub total_demand: f64,
    pub production: f64,
    pub consumption: f64,
    pub battery_levels: Vec<f64>,
    pub battery_actions: Vec<f64>,
    pub energy_changes: Vec<f64>,
}

/// Owns N independent PCS units and sums their grid exchange.
pub struct PcsSimulator {
    agents: Vec<PcsAgent>,
}

impl PcsSimulator {
    /// Creates `num_agents` idle agents from the scenario's device sections.
    pub fn new(config: &ScenarioConfig, num_agents: usize, seed: u64) -> Self {
        let agents = (0..num_agents)
            .map(|i| PcsAgent {
                unit: PcsUnit::new(config, seed.wrapping_add(i as u64 * AGENT_SEED_STRIDE)),
                policy: None,
            })
            .collect();
        Self { agents }
    }

    /// Creates the configured number of agents, each running the
    /// configured fixed policy.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedPolicy`] for an unknown policy kind.
    pub fn from_config(config: &ScenarioConfig) -> Result<Self> {
        let mut sim = Self::new(
            config,
            config.simulation.num_pcs_agents,
            config.simulation.seed,
        );
        for agent in &mut sim.agents {
            agent.policy = policy_from_config(&config.pcs_policy)?;
        }
        Ok(sim)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn agents(&self) -> &[PcsAgent] {
        &self.agents
    }

    /// Installs a response policy on one agent.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AgentIndexOutOfRange`] for a bad index.
    pub fn set_policy(&mut self, index: usize, policy: Box<dyn PcsPolicy + Send>) -> Result<()> {
        let agents = self.agents.len();
        let agent = self
            .agents
            .get_mut(index)
            .ok_or(SimError::AgentIndexOutOfRange { index, agents })?;
        agent.policy = Some(policy);
        Ok(())
    }

    /// Removes an agent's policy so it idles.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::AgentIndexOutOfRange`] for a bad index.
    pub fn clear_policy(&mut self, index: usize) -> Result<()> {
        let agents = self.agents.len();
        let agent = self
            .agents
            .get_mut(index)
            .ok_or(SimError::AgentIndexOutOfRange { index, agents })?;
        agent.policy = None;
        Ok(())
    }

    pub fn battery_levels(&self) -> Vec<f64> {
        self.agents.iter().map(|a| a.unit.battery().level()).collect()
    }

    /// Runs every agent for one step at the given prices.
    pub fn simulate_step(&mut self, time: f64, buy_price: f64, sell_price: f64) -> PcsResponse {
        let mut response = PcsResponse {
            battery_levels: Vec::with_capacity(self.agents.len()),
            battery_actions: Vec::with_capacity(self.agents.len()),
            energy_changes: Vec::with_capacity(self.agents.len()),
            ..PcsResponse::default()
        };

        for (index, agent) in self.agents.iter_mut().enumerate() {
            let (production, consumption) = agent.unit.preview(time);
            let obs = PcsObservation {
                time,
                battery_level: agent.unit.battery().level(),
                production,
                consumption,
                buy_price,
                sell_price,
            };
            let action = match agent.policy.as_mut() {
                Some(policy) => policy.battery_action(&obs),
                None => 0.0,
            };
            let step = agent.unit.update(time, action, None, None);
            debug!(
                agent = index,
                action = step.battery_action,
                level = step.battery_level,
                net = step.net_exchange,
                "pcs agent step"
            );

            response.total_demand += step.net_exchange;
            response.production += step.production;
            response.consumption += step.consumption;
            response.battery_levels.push(step.battery_level);
            response.battery_actions.push(step.battery_action);
            response.energy_changes.push(step.energy_change);
        }
        response
    }

    /// Restores every battery (to `battery_level` when given) and reseeds
    /// the device profiles.
    pub fn reset(&mut self, battery_level: Option<f64>) {
        for agent in &mut self.agents {
            agent.unit.reset(battery_level);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::policy::ThresholdPolicy;

    fn config() -> ScenarioConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.production.noise_std = 0.0;
        cfg.consumption.noise_std = 0.0;
        cfg
    }

    #[test]
    fn idle_agents_sum_load_minus_production() {
        let cfg = config();
        let mut sim = PcsSimulator::new(&cfg, 3, 1);
        let single = PcsUnit::new(&cfg, 1).preview(0.5);
        let r = sim.simulate_step(0.5, 5.0, 5.0);
        assert!((r.total_demand - 3.0 * (single.1 - single.0)).abs() < 1e-9);
        assert_eq!(r.energy_changes, vec![0.0, 0.0, 0.0]);
        assert_eq!(r.battery_levels.len(), 3);
    }

    #[test]
    fn policy_moves_only_its_agent() {
        let cfg = config();
        let mut sim = PcsSimulator::new(&cfg, 2, 1);
        let policy = ThresholdPolicy {
            charge_below: 10.0,
            discharge_above: 100.0,
            rate: 5.0,
        };
        sim.set_policy(1, Box::new(policy)).unwrap();
        let r = sim.simulate_step(0.25, 1.0, 1.0);
        assert_eq!(r.battery_actions[0], 0.0);
        assert_eq!(r.battery_actions[1], 5.0);
        assert!(r.battery_levels[1] > r.battery_levels[0]);
    }

    #[test]
    fn set_policy_bad_index() {
        let mut sim = PcsSimulator::new(&config(), 2, 1);
        let err = sim.set_policy(5, Box::new(crate::sim::policy::IdlePolicy));
        assert!(matches!(
            err,
            Err(SimError::AgentIndexOutOfRange { index: 5, agents: 2 })
        ));
    }

    #[test]
    fn reset_restores_initial_levels() {
        let cfg = config();
        let mut sim = PcsSimulator::new(&cfg, 2, 1);
        sim.set_policy(0, Box::new(|_: &PcsObservation| -10.0)).unwrap();
        sim.simulate_step(0.1, 1.0, 1.0);
        sim.reset(None);
        assert_eq!(sim.battery_levels(), vec![cfg.battery.init; 2]);
    }

    #[test]
    fn from_config_installs_policies() {
        let cfg = ScenarioConfig::online();
        let sim = PcsSimulator::from_config(&cfg).unwrap();
        assert_eq!(sim.len(), 2);
        assert!(sim.agents().iter().all(|a| a.has_policy()));
    }
}

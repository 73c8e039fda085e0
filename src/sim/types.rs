//! Core simulation types: step records, actions and the controller contract.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, SimError};
use crate::market::cost::GridStepRecord;
use crate::market::pricing::ActionSpace;

/// Complete record of one simulation step, exposed as the step `info`.
///
/// Per-agent quantities are ordered by agent index.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepInfo {
    /// 1-based step index (0 for the record returned by `reset`).
    pub step: usize,
    /// Elapsed fraction of a day.
    pub time: f64,
    /// Demand, dispatch, prices and costs.
    #[serde(flatten)]
    pub grid: GridStepRecord,
    /// Total PCS production (MWh).
    pub production: f64,
    /// Total PCS consumption (MWh).
    pub consumption: f64,
    /// Battery level of each agent after the step.
    pub battery_levels: Vec<f64>,
    /// Validated battery action of each agent.
    pub battery_actions: Vec<f64>,
    /// Energy stored (+) or released (-) by each agent.
    pub energy_changes: Vec<f64>,
    /// Reward computed from this record.
    pub reward: f64,
    /// Running reward total for the episode.
    pub total_reward: f64,
}

impl StepInfo {
    /// Flat `field -> value` mapping of the record.
    pub fn to_json_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

impl fmt::Display for StepInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mean_level = if self.battery_levels.is_empty() {
            0.0
        } else {
            self.battery_levels.iter().sum::<f64>() / self.battery_levels.len() as f64
        };
        write!(
            f,
            "t={:>3} ({:>5.2}d) | demand={:>7.2} net={:>7.2} dispatch={:>7.2} \
             short={:>6.2} | buy={:>5.2} sell={:>5.2} | pcs={:>6.2} \
             bat={:.2} | reward={:>9.2} total={:>10.2}",
            self.step,
            self.time,
            self.grid.realized_demand,
            self.grid.net_demand,
            self.grid.dispatch,
            self.grid.shortfall,
            self.grid.buy_price,
            self.grid.sell_price,
            self.grid.pcs_demand,
            mean_level,
            self.reward,
            self.total_reward,
        )
    }
}

/// Outcome of one `step` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O> {
    pub observation: O,
    pub reward: f64,
    /// True once the step counter reaches the episode horizon.
    pub terminated: bool,
    /// Always false; episodes end only at the horizon.
    pub truncated: bool,
    pub info: StepInfo,
}

/// Options accepted by `reset`.
#[derive(Debug, Clone, Default)]
pub struct ResetOptions {
    /// Reward variant for the new episode (`"iso"` or `"cost"`).
    pub reward: Option<String>,
    /// Battery level override for every agent.
    pub battery_level: Option<f64>,
}

/// Action of the PCS-primary controller.
#[derive(Debug, Clone, PartialEq)]
pub enum PcsAction {
    /// Battery action only.
    Scalar(f64),
    /// `[battery]` or, with multi-action enabled, `[battery, consumption, production]`.
    Vector(Vec<f64>),
}

/// Decoded PCS action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PcsCommand {
    pub battery: f64,
    pub consumption: Option<f64>,
    pub production: Option<f64>,
}

impl PcsAction {
    /// Splits the action into battery, consumption and production parts.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidActionType`] for any vector that is not
    /// length 1, or length 3 when `multi_action` is set.
    pub fn decode(&self, multi_action: bool) -> Result<PcsCommand> {
        match self {
            PcsAction::Scalar(battery) => Ok(PcsCommand {
                battery: *battery,
                consumption: None,
                production: None,
            }),
            PcsAction::Vector(values) => match values.as_slice() {
                [battery] => Ok(PcsCommand {
                    battery: *battery,
                    consumption: None,
                    production: None,
                }),
                [battery, consumption, production] if multi_action => Ok(PcsCommand {
                    battery: *battery,
                    consumption: Some(*consumption),
                    production: Some(*production),
                }),
                other => Err(SimError::InvalidActionType(format!(
                    "PCS action vector of length {} (multi_action={multi_action})",
                    other.len()
                ))),
            },
        }
    }
}

impl From<f64> for PcsAction {
    fn from(value: f64) -> Self {
        PcsAction::Scalar(value)
    }
}

impl From<Vec<f64>> for PcsAction {
    fn from(values: Vec<f64>) -> Self {
        PcsAction::Vector(values)
    }
}

/// Step/reset contract shared by the ISO-primary and PCS-primary controllers.
pub trait Environment {
    type Action: ?Sized;
    type Observation;

    /// Starts a new episode.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedRewardType`] when `options.reward`
    /// names an unknown reward.
    fn reset(
        &mut self,
        seed: Option<u64>,
        options: ResetOptions,
    ) -> Result<(Self::Observation, StepInfo)>;

    /// Advances the episode by one step.
    fn step(&mut self, action: &Self::Action) -> Result<Transition<Self::Observation>>;

    /// Bounds of the observation vector.
    fn observation_space(&self) -> ActionSpace;

    /// Bounds of the raw action.
    fn action_space(&self) -> ActionSpace;
}

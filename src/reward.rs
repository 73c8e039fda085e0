//! Pluggable per-step reward functions.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimError};
use crate::sim::types::StepInfo;

/// Maps one step record to a scalar reward.
///
/// Implementations must be pure: the reward depends only on the record
/// built in the same step.
pub trait RewardFunction {
    fn compute_reward(&self, info: &StepInfo) -> f64;
}

/// ISO-side reward: negative net operating cost.
///
/// The ISO pays for dispatch and reserve and collects the PCS exchange.
#[derive(Debug, Default, Clone, Copy)]
pub struct IsoReward;

impl RewardFunction for IsoReward {
    fn compute_reward(&self, info: &StepInfo) -> f64 {
        let g = &info.grid;
        -(g.dispatch_cost + g.reserve_cost - g.pcs_costs)
    }
}

/// PCS-side reward: negative exchange cost.
#[derive(Debug, Default, Clone, Copy)]
pub struct CostReward;

impl RewardFunction for CostReward {
    fn compute_reward(&self, info: &StepInfo) -> f64 {
        -info.grid.pcs_costs
    }
}

/// Reward variant selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    Iso,
    Cost,
}

impl FromStr for RewardKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iso" => Ok(Self::Iso),
            "cost" => Ok(Self::Cost),
            _ => Err(SimError::UnsupportedRewardType(s.to_string())),
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iso => f.write_str("iso"),
            Self::Cost => f.write_str("cost"),
        }
    }
}

impl RewardFunction for RewardKind {
    fn compute_reward(&self, info: &StepInfo) -> f64 {
        match self {
            Self::Iso => IsoReward.compute_reward(info),
            Self::Cost => CostReward.compute_reward(info),
        }
    }
}

/// Parses a reward name into a boxed reward function.
///
/// # Errors
///
/// Returns [`SimError::UnsupportedRewardType`] for an unknown name.
pub fn create_reward(name: &str) -> Result<Box<dyn RewardFunction + Send>> {
    Ok(match name.parse::<RewardKind>()? {
        RewardKind::Iso => Box::new(IsoReward),
        RewardKind::Cost => Box::new(CostReward),
    })
}

//! Fixed response policies for PCS agents and the paired ISO side.

use std::str::FromStr;

use crate::config::PcsPolicyConfig;
use crate::error::{Result, SimError};

/// Local view a PCS agent uses to choose its battery action.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PcsObservation {
    pub time: f64,
    pub battery_level: f64,
    pub production: f64,
    pub consumption: f64,
    pub buy_price: f64,
    pub sell_price: f64,
}

/// Maps a PCS observation to a battery action (MWh, positive=charge).
pub trait PcsPolicy {
    fn battery_action(&mut self, obs: &PcsObservation) -> f64;
}

impl<F> PcsPolicy for F
where
    F: FnMut(&PcsObservation) -> f64,
{
    fn battery_action(&mut self, obs: &PcsObservation) -> f64 {
        self(obs)
    }
}

/// ISO action source used by the PCS-primary controller.
///
/// Receives `[time_fraction, predicted_demand, pcs_demand]` and returns an
/// action in the pricing strategy's layout.
pub trait IsoPolicy {
    fn pricing_action(&mut self, obs: &[f64; 3]) -> Vec<f64>;
}

impl<F> IsoPolicy for F
where
    F: FnMut(&[f64; 3]) -> Vec<f64>,
{
    fn pricing_action(&mut self, obs: &[f64; 3]) -> Vec<f64> {
        self(obs)
    }
}

/// Never moves the battery.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePolicy;

impl PcsPolicy for IdlePolicy {
    fn battery_action(&mut self, _obs: &PcsObservation) -> f64 {
        0.0
    }
}

/// Charges on cheap energy, discharges on expensive energy.
///
/// Charges `rate` when the ISO sell price (what the PCS pays) is at or
/// below `charge_below`; discharges `rate` when the ISO buy price (what the
/// PCS earns) is at or above `discharge_above`; otherwise idles.
#[derive(Debug, Clone, Copy)]
pub struct ThresholdPolicy {
    pub charge_below: f64,
    pub discharge_above: f64,
    pub rate: f64,
}

impl ThresholdPolicy {
    pub fn from_config(config: &PcsPolicyConfig) -> Self {
        Self {
            charge_below: config.charge_below,
            discharge_above: config.discharge_above,
            rate: config.rate.abs(),
        }
    }
}

impl PcsPolicy for ThresholdPolicy {
    fn battery_action(&mut self, obs: &PcsObservation) -> f64 {
        if obs.buy_price >= self.discharge_above {
            -self.rate
        } else if obs.sell_price <= self.charge_below {
            self.rate
        } else {
            0.0
        }
    }
}

/// Fixed policy identifier from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcsPolicyKind {
    Idle,
    Threshold,
}

impl FromStr for PcsPolicyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "threshold" => Ok(Self::Threshold),
            _ => Err(SimError::UnsupportedPolicy(s.to_string())),
        }
    }
}

/// Builds the configured fixed policy, or `None` for idle agents.
///
/// # Errors
///
/// Returns [`SimError::UnsupportedPolicy`] for an unknown kind.
pub fn policy_from_config(config: &PcsPolicyConfig) -> Result<Option<Box<dyn PcsPolicy + Send>>> {
    Ok(match config.kind.parse::<PcsPolicyKind>()? {
        PcsPolicyKind::Idle => None,
        PcsPolicyKind::Threshold => Some(Box::new(ThresholdPolicy::from_config(config))),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(buy_price: f64, sell_price: f64) -> PcsObservation {
        PcsObservation {
            buy_price,
            sell_price,
            ..PcsObservation::default()
        }
    }

    fn threshold() -> ThresholdPolicy {
        ThresholdPolicy {
            charge_below: 3.0,
            discharge_above: 6.0,
            rate: 5.0,
        }
    }

    #[test]
    fn idle_never_acts() {
        assert_eq!(IdlePolicy.battery_action(&obs(100.0, 0.0)), 0.0);
    }

    #[test]
    fn charges_when_cheap() {
        assert_eq!(threshold().battery_action(&obs(2.0, 2.5)), 5.0);
    }

    #[test]
    fn discharges_when_expensive() {
        assert_eq!(threshold().battery_action(&obs(7.0, 8.0)), -5.0);
    }

    #[test]
    fn idles_in_between() {
        assert_eq!(threshold().battery_action(&obs(4.0, 5.0)), 0.0);
    }

    #[test]
    fn closures_are_policies() {
        let mut p = |o: &PcsObservation| o.battery_level * 0.1;
        let o = PcsObservation {
            battery_level: 20.0,
            ..PcsObservation::default()
        };
        assert_eq!(p.battery_action(&o), 2.0);
    }

    #[test]
    fn config_selects_kind() {
        let mut cfg = PcsPolicyConfig::default();
        assert!(policy_from_config(&cfg).unwrap().is_none());
        cfg.kind = "threshold".to_string();
        assert!(policy_from_config(&cfg).unwrap().is_some());
        cfg.kind = "ppo".to_string();
        assert!(policy_from_config(&cfg).is_err());
    }
}

//! Grid costs: dispatch, reserve and PCS exchange.

use std::str::FromStr;

use serde::Serialize;

use crate::config::CostsConfig;
use crate::error::{Result, SimError};
use crate::market::pricing::PriceQuote;
use crate::sim::power_balance::{net_demand, shortfall};

/// Cost model identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostType {
    /// Fixed dispatch and reserve prices.
    Constant,
}

impl FromStr for CostType {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "constant" => Ok(Self::Constant),
            _ => Err(SimError::UnsupportedCostType(s.to_string())),
        }
    }
}

/// Grid-side quantities for one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GridStepRecord {
    pub predicted_demand: f64,
    pub realized_demand: f64,
    /// Aggregate PCS import (negative when exporting).
    pub pcs_demand: f64,
    pub net_demand: f64,
    pub dispatch: f64,
    /// `max(0, net_demand - dispatch)`.
    pub shortfall: f64,
    pub dispatch_cost: f64,
    pub reserve_cost: f64,
    /// Paid by the PCS side (negative when the PCS is paid).
    pub pcs_costs: f64,
    pub buy_price: f64,
    pub sell_price: f64,
}

/// Prices dispatch and shortfall for every step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostModel {
    pub cost_type: CostType,
    pub dispatch_price: f64,
    pub reserve_price: f64,
}

impl CostModel {
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedCostType`] for an unknown cost type.
    pub fn from_config(config: &CostsConfig) -> Result<Self> {
        let cost_type = config.cost_type.parse()?;
        Ok(Self {
            cost_type,
            dispatch_price: config.dispatch_price,
            reserve_price: config
                .reserve_price
                .unwrap_or(config.dispatch_price * config.reserve_multiplier),
        })
    }

    /// Cost of the PCS exchange.
    ///
    /// A net-importing PCS buys at the ISO's sell price; a net-exporting
    /// one is paid the ISO's buy price.
    pub fn pcs_exchange_cost(pcs_demand: f64, buy_price: f64, sell_price: f64) -> f64 {
        if pcs_demand > 0.0 {
            pcs_demand * sell_price
        } else {
            pcs_demand * buy_price
        }
    }

    /// Combines demand, PCS response and the step's quote into a record.
    pub fn assess(
        &self,
        predicted_demand: f64,
        realized_demand: f64,
        pcs_demand: f64,
        quote: &PriceQuote,
    ) -> GridStepRecord {
        let net = net_demand(realized_demand, pcs_demand);
        let short = shortfall(net, quote.dispatch);
        GridStepRecord {
            predicted_demand,
            realized_demand,
            pcs_demand,
            net_demand: net,
            dispatch: quote.dispatch,
            shortfall: short,
            dispatch_cost: self.dispatch_price * quote.dispatch,
            reserve_cost: self.reserve_price * short,
            pcs_costs: Self::pcs_exchange_cost(pcs_demand, quote.buy_price, quote.sell_price),
            buy_price: quote.buy_price,
            sell_price: quote.sell_price,
        }
    }
}

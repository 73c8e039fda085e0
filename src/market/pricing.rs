//! ISO pricing strategies and the day-ahead commitment state machine.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::config::{PricingConfig, ScenarioConfig};
use crate::error::{Result, SimError};
use crate::market::quadratic::QuadraticPrice;

/// Throughput at which committed price functions are evaluated.
const UNIT_THROUGHPUT: f64 = 1.0;

/// Number of coefficients per quadratic price function.
const QUADRATIC_COEFFICIENTS: usize = 3;

/// Box-shaped bounds for a flat `f64` action or observation vector.
///
/// # Examples
///
/// ```
/// use iso_pcs_sim::market::pricing::ActionSpace;
///
/// let space = ActionSpace::new(vec![0.0, -1.0], vec![10.0, 1.0]);
/// assert_eq!(space.clip(&[12.0, -3.0]), vec![10.0, -1.0]);
/// assert!(space.contains(&[5.0, 0.0]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    low: Vec<f64>,
    high: Vec<f64>,
}

impl ActionSpace {
    /// Creates a box from per-dimension bounds.
    ///
    /// # Panics
    ///
    /// Panics if the bound vectors differ in length.
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Self {
        assert_eq!(low.len(), high.len(), "bound vectors must match in length");
        Self { low, high }
    }

    /// Creates a box with the same bounds in every dimension.
    pub fn uniform(low: f64, high: f64, len: usize) -> Self {
        Self::new(vec![low; len], vec![high; len])
    }

    /// Appends the dimensions of `other` after this box.
    pub fn concat(mut self, other: ActionSpace) -> Self {
        self.low.extend(other.low);
        self.high.extend(other.high);
        self
    }

    pub fn low(&self) -> &[f64] {
        &self.low
    }

    pub fn high(&self) -> &[f64] {
        &self.high
    }

    pub fn len(&self) -> usize {
        self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    /// True when `values` has the right length and lies inside the box.
    pub fn contains(&self, values: &[f64]) -> bool {
        values.len() == self.len()
            && values
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(v, (lo, hi))| *v >= *lo && *v <= *hi)
    }

    /// Clamps one dimension into its bounds.
    pub fn clip_at(&self, index: usize, value: f64) -> f64 {
        value.clamp(self.low[index], self.high[index])
    }

    /// Clamps every dimension into its bounds. Extra values are dropped.
    pub fn clip(&self, values: &[f64]) -> Vec<f64> {
        values
            .iter()
            .enumerate()
            .take(self.len())
            .map(|(i, v)| self.clip_at(i, *v))
            .collect()
    }
}

/// Prices and dispatch resolved for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceQuote {
    /// Price the ISO pays per MWh bought from a PCS.
    pub buy_price: f64,
    /// Price the ISO charges per MWh sold to a PCS.
    pub sell_price: f64,
    /// Energy dispatched outside the PCS exchange (MWh).
    pub dispatch: f64,
    /// Whether a day-ahead commitment is in force after this step.
    pub first_action_taken: bool,
}

/// Day-ahead bid frozen at the first step of an episode.
#[derive(Debug, Clone, PartialEq)]
pub struct DayAheadBid {
    pub buy: QuadraticPrice,
    pub sell: QuadraticPrice,
    pub dispatch_profile: Vec<f64>,
}

impl DayAheadBid {
    /// Dispatch for a 1-based step; zero past the end of the profile.
    pub fn dispatch_at(&self, step_count: usize) -> f64 {
        step_count
            .checked_sub(1)
            .and_then(|i| self.dispatch_profile.get(i))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Commitment state of a day-ahead strategy within one episode.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Commitment {
    /// Waiting for the step-1 action.
    #[default]
    Uncommitted,
    /// Bid frozen for the rest of the episode.
    Committed(DayAheadBid),
}

impl Commitment {
    pub fn is_committed(&self) -> bool {
        matches!(self, Commitment::Committed(_))
    }

    pub fn bid(&self) -> Option<&DayAheadBid> {
        match self {
            Commitment::Committed(bid) => Some(bid),
            Commitment::Uncommitted => None,
        }
    }

    /// Zero quote for an uncommitted strategy asked for a later step.
    fn missing_quote(step_count: usize) -> PriceQuote {
        warn!(step_count, "day-ahead strategy not committed, quoting zero");
        PriceQuote {
            buy_price: 0.0,
            sell_price: 0.0,
            dispatch: 0.0,
            first_action_taken: false,
        }
    }
}

/// Common contract for ISO pricing strategies.
pub trait PricingStrategy {
    /// Bounds of the raw action this strategy consumes.
    fn create_action_space(&self) -> ActionSpace;

    /// Maps a raw action into prices and dispatch for a 1-based step.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::ShapeMismatch`] when the action has the wrong
    /// length at a step where it is consumed. No state is changed in that
    /// case.
    fn process_action(
        &mut self,
        action: &[f64],
        step_count: usize,
        predicted_demand: f64,
    ) -> Result<PriceQuote>;

    /// Drops any commitment so the next episode starts uncommitted.
    fn reset(&mut self);
}

/// Pricing policy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PricingPolicy {
    Quadratic,
    Constant,
    Online,
}

impl FromStr for PricingPolicy {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quadratic" => Ok(Self::Quadratic),
            "constant" => Ok(Self::Constant),
            "online" => Ok(Self::Online),
            _ => Err(SimError::UnsupportedPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for PricingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Quadratic => "quadratic",
            Self::Constant => "constant",
            Self::Online => "online",
        };
        f.write_str(name)
    }
}

/// Day-ahead quadratic pricing.
///
/// Action layout: `[b0, b1, b2, s0, s1, s2, dispatch_profile(H)]`.
#[derive(Debug, Clone)]
pub struct QuadraticPricing {
    horizon: usize,
    dispatch_min: f64,
    dispatch_max: f64,
    coefficient_min: f64,
    coefficient_max: f64,
    commitment: Commitment,
}

impl QuadraticPricing {
    pub fn new(config: &PricingConfig, horizon: usize) -> Self {
        let q = &config.quadratic;
        Self {
            horizon,
            dispatch_min: q.dispatch_min,
            dispatch_max: q.dispatch_max,
            coefficient_min: q.coefficient_min,
            coefficient_max: q.coefficient_max,
            commitment: Commitment::Uncommitted,
        }
    }

    pub fn expected_len(&self) -> usize {
        2 * QUADRATIC_COEFFICIENTS + self.horizon
    }

    fn dispatch_space(&self) -> ActionSpace {
        ActionSpace::uniform(self.dispatch_min, self.dispatch_max, self.horizon)
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }
}

impl PricingStrategy for QuadraticPricing {
    fn create_action_space(&self) -> ActionSpace {
        ActionSpace::uniform(
            self.coefficient_min,
            self.coefficient_max,
            2 * QUADRATIC_COEFFICIENTS,
        )
        .concat(self.dispatch_space())
    }

    fn process_action(
        &mut self,
        action: &[f64],
        step_count: usize,
        _predicted_demand: f64,
    ) -> Result<PriceQuote> {
        if step_count == 1 && !self.commitment.is_committed() {
            let expected = self.expected_len();
            if action.len() != expected {
                return Err(SimError::ShapeMismatch {
                    expected,
                    actual: action.len(),
                });
            }
            let (coefficients, profile) = action.split_at(2 * QUADRATIC_COEFFICIENTS);
            let bid = DayAheadBid {
                buy: QuadraticPrice::from_slice(&coefficients[..QUADRATIC_COEFFICIENTS]),
                sell: QuadraticPrice::from_slice(&coefficients[QUADRATIC_COEFFICIENTS..]),
                dispatch_profile: self.dispatch_space().clip(profile),
            };
            info!(buy = ?bid.buy, sell = ?bid.sell, "quadratic day-ahead bid committed");
            self.commitment = Commitment::Committed(bid);
        }

        let Some(bid) = self.commitment.bid() else {
            return Ok(Commitment::missing_quote(step_count));
        };
        let quote = PriceQuote {
            buy_price: bid.buy.eval(UNIT_THROUGHPUT).max(0.0),
            sell_price: bid.sell.eval(UNIT_THROUGHPUT).max(0.0),
            dispatch: bid.dispatch_at(step_count),
            first_action_taken: true,
        };
        debug!(step_count, ?quote, "quadratic quote");
        Ok(quote)
    }

    fn reset(&mut self) {
        self.commitment = Commitment::Uncommitted;
    }
}

/// Day-ahead constant pricing.
///
/// Action layout: `[buy_price, sell_price, dispatch_profile(H)]`.
#[derive(Debug, Clone)]
pub struct ConstantPricing {
    horizon: usize,
    dispatch_min: f64,
    dispatch_max: f64,
    price_min: f64,
    price_max: f64,
    commitment: Commitment,
}

impl ConstantPricing {
    pub fn new(config: &PricingConfig, horizon: usize) -> Self {
        let c = &config.constant;
        Self {
            horizon,
            dispatch_min: c.dispatch_min,
            dispatch_max: c.dispatch_max,
            price_min: c.price_min.unwrap_or(config.min_price),
            price_max: c.price_max.unwrap_or(config.max_price),
            commitment: Commitment::Uncommitted,
        }
    }

    pub fn expected_len(&self) -> usize {
        2 + self.horizon
    }

    fn dispatch_space(&self) -> ActionSpace {
        ActionSpace::uniform(self.dispatch_min, self.dispatch_max, self.horizon)
    }

    pub fn commitment(&self) -> &Commitment {
        &self.commitment
    }
}

impl PricingStrategy for ConstantPricing {
    fn create_action_space(&self) -> ActionSpace {
        ActionSpace::uniform(self.price_min, self.price_max, 2).concat(self.dispatch_space())
    }

    fn process_action(
        &mut self,
        action: &[f64],
        step_count: usize,
        _predicted_demand: f64,
    ) -> Result<PriceQuote> {
        if step_count == 1 && !self.commitment.is_committed() {
            let expected = self.expected_len();
            if action.len() != expected {
                return Err(SimError::ShapeMismatch {
                    expected,
                    actual: action.len(),
                });
            }
            let bid = DayAheadBid {
                buy: QuadraticPrice::constant(action[0]),
                sell: QuadraticPrice::constant(action[1]),
                dispatch_profile: self.dispatch_space().clip(&action[2..]),
            };
            info!(
                buy_price = action[0],
                sell_price = action[1],
                "constant day-ahead bid committed"
            );
            self.commitment = Commitment::Committed(bid);
        }

        let Some(bid) = self.commitment.bid() else {
            return Ok(Commitment::missing_quote(step_count));
        };
        let quote = PriceQuote {
            buy_price: bid.buy.eval(UNIT_THROUGHPUT),
            sell_price: bid.sell.eval(UNIT_THROUGHPUT),
            dispatch: bid.dispatch_at(step_count),
            first_action_taken: true,
        };
        debug!(step_count, ?quote, "constant quote");
        Ok(quote)
    }

    fn reset(&mut self) {
        self.commitment = Commitment::Uncommitted;
    }
}

/// Per-step pricing with no commitment.
///
/// Action layout: `[buy_price, sell_price]`; a single value is used for
/// both sides. Dispatch always follows predicted demand.
#[derive(Debug, Clone)]
pub struct OnlinePricing {
    buy_min: f64,
    buy_max: f64,
    sell_min: f64,
    sell_max: f64,
}

impl OnlinePricing {
    pub fn new(config: &PricingConfig) -> Self {
        let o = &config.online;
        Self {
            buy_min: o.buy_price_min.unwrap_or(config.min_price),
            buy_max: o.buy_price_max.unwrap_or(config.max_price),
            sell_min: o.sell_price_min.unwrap_or(config.min_price),
            sell_max: o.sell_price_max.unwrap_or(config.max_price),
        }
    }
}

impl PricingStrategy for OnlinePricing {
    fn create_action_space(&self) -> ActionSpace {
        ActionSpace::new(
            vec![self.buy_min, self.sell_min],
            vec![self.buy_max, self.sell_max],
        )
    }

    fn process_action(
        &mut self,
        action: &[f64],
        step_count: usize,
        predicted_demand: f64,
    ) -> Result<PriceQuote> {
        let (buy, sell) = match action {
            [price] => (*price, *price),
            [buy, sell] => (*buy, *sell),
            _ => {
                return Err(SimError::ShapeMismatch {
                    expected: 2,
                    actual: action.len(),
                });
            }
        };
        let quote = PriceQuote {
            buy_price: buy.clamp(self.buy_min, self.buy_max),
            sell_price: sell.clamp(self.sell_min, self.sell_max),
            dispatch: predicted_demand,
            first_action_taken: false,
        };
        debug!(step_count, ?quote, "online quote");
        Ok(quote)
    }

    fn reset(&mut self) {}
}

/// Closed set of pricing strategies selected by [`create_pricing_strategy`].
#[derive(Debug, Clone)]
pub enum Pricing {
    Quadratic(QuadraticPricing),
    Constant(ConstantPricing),
    Online(OnlinePricing),
}

impl Pricing {
    pub fn policy(&self) -> PricingPolicy {
        match self {
            Pricing::Quadratic(_) => PricingPolicy::Quadratic,
            Pricing::Constant(_) => PricingPolicy::Constant,
            Pricing::Online(_) => PricingPolicy::Online,
        }
    }

    /// Builds the strategy named by `config.pricing.policy`.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnsupportedPolicy`] for an unknown policy name.
    pub fn from_config(config: &ScenarioConfig) -> Result<Self> {
        let policy = config.pricing.policy.parse::<PricingPolicy>()?;
        Ok(create_pricing_strategy(policy, config))
    }
}

impl PricingStrategy for Pricing {
    fn create_action_space(&self) -> ActionSpace {
        match self {
            Pricing::Quadratic(s) => s.create_action_space(),
            Pricing::Constant(s) => s.create_action_space(),
            Pricing::Online(s) => s.create_action_space(),
        }
    }

    fn process_action(
        &mut self,
        action: &[f64],
        step_count: usize,
        predicted_demand: f64,
    ) -> Result<PriceQuote> {
        match self {
            Pricing::Quadratic(s) => s.process_action(action, step_count, predicted_demand),
            Pricing::Constant(s) => s.process_action(action, step_count, predicted_demand),
            Pricing::Online(s) => s.process_action(action, step_count, predicted_demand),
        }
    }

    fn reset(&mut self) {
        match self {
            Pricing::Quadratic(s) => s.reset(),
            Pricing::Constant(s) => s.reset(),
            Pricing::Online(s) => s.reset(),
        }
    }
}

/// Creates the pricing strategy for `policy` using the scenario's bounds
/// and episode horizon.
pub fn create_pricing_strategy(policy: PricingPolicy, config: &ScenarioConfig) -> Pricing {
    let pricing = &config.pricing;
    let horizon = config.time.max_steps_per_episode;
    match policy {
        PricingPolicy::Quadratic => Pricing::Quadratic(QuadraticPricing::new(pricing, horizon)),
        PricingPolicy::Constant => Pricing::Constant(ConstantPricing::new(pricing, horizon)),
        PricingPolicy::Online => Pricing::Online(OnlinePricing::new(pricing)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(horizon: usize) -> ScenarioConfig {
        let mut cfg = ScenarioConfig::baseline();
        cfg.time.max_steps_per_episode = horizon;
        cfg
    }

    fn quadratic_action(buy: [f64; 3], sell: [f64; 3], profile: &[f64]) -> Vec<f64> {
        let mut action = Vec::new();
        action.extend_from_slice(&buy);
        action.extend_from_slice(&sell);
        action.extend_from_slice(profile);
        action
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!("Quadratic".parse::<PricingPolicy>().unwrap(), PricingPolicy::Quadratic);
        assert_eq!("ONLINE".parse::<PricingPolicy>().unwrap(), PricingPolicy::Online);
        assert!(matches!(
            "auction".parse::<PricingPolicy>(),
            Err(SimError::UnsupportedPolicy(_))
        ));
    }

    #[test]
    fn from_config_rejects_unknown_policy() {
        let mut cfg = config(3);
        cfg.pricing.policy = "lmp".to_string();
        assert!(matches!(
            Pricing::from_config(&cfg),
            Err(SimError::UnsupportedPolicy(_))
        ));
    }

    #[test]
    fn quadratic_commitment_is_frozen() {
        let mut s = QuadraticPricing::new(&config(3).pricing, 3);
        let first = quadratic_action([5.0, 0.0, 0.0], [3.0, 0.0, 0.0], &[10.0, 20.0, 30.0]);
        let q1 = s.process_action(&first, 1, 0.0).unwrap();
        assert_eq!(q1.dispatch, 10.0);

        let wild = quadratic_action([-50.0, 9.0, 9.0], [80.0, 1.0, 1.0], &[300.0, 0.0, 0.0]);
        let q2 = s.process_action(&wild, 2, 0.0).unwrap();
        assert_eq!(q2.dispatch, 20.0);
        assert_eq!(q2.buy_price, 5.0);
        assert_eq!(q2.sell_price, 3.0);
        assert!(q2.first_action_taken);

        // later actions of any length are ignored
        let q3 = s.process_action(&[1.0], 3, 0.0).unwrap();
        assert_eq!(q3.dispatch, 30.0);
    }

    #[test]
    fn quadratic_shape_mismatch_stores_nothing() {
        let mut s = QuadraticPricing::new(&config(48).pricing, 48);
        let result = s.process_action(&vec![1.0; 40], 1, 0.0);
        match result {
            Err(SimError::ShapeMismatch { expected, actual }) => {
                assert_eq!(expected, 54);
                assert_eq!(actual, 40);
            }
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
        assert_eq!(s.commitment(), &Commitment::Uncommitted);
    }

    #[test]
    fn quadratic_prices_floored_at_zero() {
        let mut s = QuadraticPricing::new(&config(2).pricing, 2);
        let action = quadratic_action([-5.0, 1.0, 0.0], [2.0, 1.0, 1.0], &[1.0, 1.0]);
        let q = s.process_action(&action, 1, 0.0).unwrap();
        assert_eq!(q.buy_price, 0.0);
        assert_eq!(q.sell_price, 4.0);
    }

    #[test]
    fn quadratic_coefficients_outside_action_box_are_kept() {
        let cfg = config(1);
        assert_eq!(cfg.pricing.quadratic.coefficient_max, 100.0);
        let mut s = QuadraticPricing::new(&cfg.pricing, 1);
        let action = quadratic_action([250.0, 0.0, 0.0], [-300.0, 0.0, 500.0], &[10.0]);
        let q = s.process_action(&action, 1, 0.0).unwrap();
        assert_eq!(q.buy_price, 250.0);
        assert_eq!(q.sell_price, 200.0);
        let bid = s.commitment().bid().unwrap();
        assert_eq!(bid.buy, QuadraticPrice::new(250.0, 0.0, 0.0));
        assert_eq!(bid.sell, QuadraticPrice::new(-300.0, 0.0, 500.0));
    }

    #[test]
    fn dispatch_profile_is_clipped() {
        let cfg = config(2);
        let mut s = QuadraticPricing::new(&cfg.pricing, 2);
        let action = quadratic_action([1.0, 0.0, 0.0], [1.0, 0.0, 0.0], &[-10.0, 1e6]);
        s.process_action(&action, 1, 0.0).unwrap();
        let bid = s.commitment().bid().unwrap();
        assert_eq!(
            bid.dispatch_profile,
            vec![cfg.pricing.quadratic.dispatch_min, cfg.pricing.quadratic.dispatch_max]
        );
    }

    #[test]
    fn uncommitted_later_step_quotes_zero() {
        let mut s = QuadraticPricing::new(&config(3).pricing, 3);
        let q = s.process_action(&[1.0, 2.0], 2, 50.0).unwrap();
        assert_eq!((q.buy_price, q.sell_price, q.dispatch), (0.0, 0.0, 0.0));
        assert!(!q.first_action_taken);
    }

    #[test]
    fn dispatch_past_profile_is_zero() {
        let mut s = ConstantPricing::new(&config(2).pricing, 2);
        s.process_action(&[5.0, 3.0, 10.0, 20.0], 1, 0.0).unwrap();
        let q = s.process_action(&[], 3, 0.0).unwrap();
        assert_eq!(q.dispatch, 0.0);
    }

    #[test]
    fn constant_keeps_raw_prices_and_clips_dispatch() {
        let cfg = config(2);
        assert!(cfg.pricing.max_price < 50.0);
        let mut s = ConstantPricing::new(&cfg.pricing, 2);
        let q = s.process_action(&[50.0, -1.0, 10.0, 1e6], 1, 0.0).unwrap();
        assert_eq!(q.buy_price, 50.0);
        assert_eq!(q.sell_price, -1.0);
        assert_eq!(q.dispatch, 10.0);
        let q2 = s.process_action(&[], 2, 0.0).unwrap();
        assert_eq!(q2.dispatch, cfg.pricing.constant.dispatch_max);
    }

    #[test]
    fn constant_shape_mismatch() {
        let mut s = ConstantPricing::new(&config(4).pricing, 4);
        assert!(matches!(
            s.process_action(&[1.0, 2.0, 3.0], 1, 0.0),
            Err(SimError::ShapeMismatch { expected: 6, actual: 3 })
        ));
    }

    #[test]
    fn reset_allows_new_commitment() {
        let mut s = ConstantPricing::new(&config(1).pricing, 1);
        s.process_action(&[5.0, 3.0, 10.0], 1, 0.0).unwrap();
        s.reset();
        let q = s.process_action(&[6.0, 2.0, 40.0], 1, 0.0).unwrap();
        assert_eq!(q.dispatch, 40.0);
        assert_eq!(q.buy_price, 6.0);
    }

    #[test]
    fn online_clips_each_side() {
        let mut cfg = config(1);
        cfg.pricing.min_price = 1.0;
        cfg.pricing.max_price = 10.0;
        let mut s = OnlinePricing::new(&cfg.pricing);
        let q = s.process_action(&[15.0, -2.0], 7, 123.0).unwrap();
        assert_eq!(q.buy_price, 10.0);
        assert_eq!(q.sell_price, 1.0);
        assert_eq!(q.dispatch, 123.0);
    }

    #[test]
    fn online_scalar_sets_both_sides() {
        let mut s = OnlinePricing::new(&config(1).pricing);
        let q = s.process_action(&[4.0], 1, 0.0).unwrap();
        assert_eq!((q.buy_price, q.sell_price), (4.0, 4.0));
        assert!(s.process_action(&[1.0, 2.0, 3.0], 2, 0.0).is_err());
    }

    #[test]
    fn action_space_lengths() {
        let cfg = config(48);
        let quadratic = create_pricing_strategy(PricingPolicy::Quadratic, &cfg);
        let constant = create_pricing_strategy(PricingPolicy::Constant, &cfg);
        let online = create_pricing_strategy(PricingPolicy::Online, &cfg);
        assert_eq!(quadratic.create_action_space().len(), 54);
        assert_eq!(constant.create_action_space().len(), 50);
        assert_eq!(online.create_action_space().len(), 2);
        assert_eq!(online.policy(), PricingPolicy::Online);
    }
}

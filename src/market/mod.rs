//! Market side: ISO pricing, demand and grid costs.

/// Dispatch, reserve and PCS exchange costs.
pub mod cost;
/// Predicted demand patterns and realized-demand noise.
pub mod demand;
pub mod pricing;
pub mod quadratic;

pub use cost::{CostModel, CostType, GridStepRecord};
pub use demand::{DemandNoise, DemandPattern, DemandProfile, PatternDemand};
pub use pricing::{
    ActionSpace, Commitment, PriceQuote, Pricing, PricingPolicy, PricingStrategy,
    create_pricing_strategy,
};
pub use quadratic::QuadraticPrice;

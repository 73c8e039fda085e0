//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::market::cost::CostType;
use crate::market::demand::DemandPattern;
use crate::market::pricing::PricingPolicy;
use crate::reward::RewardKind;
use crate::sim::policy::PcsPolicyKind;

/// Top-level scenario configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`ScenarioConfig::from_toml_file`] or use
/// [`ScenarioConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Seed, agent count and reward selection.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Episode horizon and step duration.
    #[serde(default)]
    pub time: TimeConfig,
    /// Pricing policy and price/dispatch bounds.
    #[serde(default)]
    pub pricing: PricingConfig,
    /// Predicted demand pattern and realized-demand noise.
    #[serde(default)]
    pub demand: DemandConfig,
    /// Dispatch and reserve prices.
    #[serde(default)]
    pub costs: CostsConfig,
    /// Battery storage parameters (shared by every PCS agent).
    #[serde(default)]
    pub battery: BatteryConfig,
    /// PCS on-site production.
    #[serde(default)]
    pub production: ProductionConfig,
    /// PCS local consumption.
    #[serde(default)]
    pub consumption: ConsumptionConfig,
    /// PCS action layout.
    #[serde(default)]
    pub action: ActionConfig,
    /// Fixed response policy installed on every PCS agent.
    #[serde(default)]
    pub pcs_policy: PcsPolicyConfig,
}

/// Seed, agent count and reward selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Master random seed.
    pub seed: u64,
    /// Number of PCS agents simulated on the ISO side.
    pub num_pcs_agents: usize,
    /// Reward used by the ISO-primary controller: `"iso"` or `"cost"`.
    pub iso_reward: String,
    /// Reward used by the PCS-primary controller: `"iso"` or `"cost"`.
    pub pcs_reward: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            num_pcs_agents: 1,
            iso_reward: "iso".to_string(),
            pcs_reward: "cost".to_string(),
        }
    }
}

/// Episode horizon and step duration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeConfig {
    /// Duration of one step in minutes.
    pub step_duration_minutes: f64,
    /// Minutes in one simulated day.
    pub minutes_per_day: f64,
    /// Number of steps before an episode terminates.
    pub max_steps_per_episode: usize,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            step_duration_minutes: 30.0,
            minutes_per_day: 1440.0,
            max_steps_per_episode: 48,
        }
    }
}

/// Pricing policy and price/dispatch bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PricingConfig {
    /// `"quadratic"`, `"constant"` or `"online"`.
    pub policy: String,
    /// Global lower price bound.
    pub min_price: f64,
    /// Global upper price bound.
    pub max_price: f64,
    /// Buy price used by the PCS-primary controller without an ISO policy.
    pub default_buy_price: f64,
    /// Sell price used by the PCS-primary controller without an ISO policy.
    pub default_sell_price: f64,
    pub quadratic: QuadraticConfig,
    pub constant: ConstantConfig,
    pub online: OnlineConfig,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            policy: "quadratic".to_string(),
            min_price: 1.0,
            max_price: 10.0,
            default_buy_price: 5.0,
            default_sell_price: 3.0,
            quadratic: QuadraticConfig::default(),
            constant: ConstantConfig::default(),
            online: OnlineConfig::default(),
        }
    }
}

/// Bounds for the quadratic day-ahead action.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuadraticConfig {
    pub dispatch_min: f64,
    pub dispatch_max: f64,
    pub coefficient_min: f64,
    pub coefficient_max: f64,
}

impl Default for QuadraticConfig {
    fn default() -> Self {
        Self {
            dispatch_min: 0.0,
            dispatch_max: 300.0,
            coefficient_min: -100.0,
            coefficient_max: 100.0,
        }
    }
}

/// Bounds for the constant day-ahead action.
///
/// Price bounds fall back to the global `min_price`/`max_price`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConstantConfig {
    pub dispatch_min: f64,
    pub dispatch_max: f64,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
}

impl Default for ConstantConfig {
    fn default() -> Self {
        Self {
            dispatch_min: 0.0,
            dispatch_max: 300.0,
            price_min: None,
            price_max: None,
        }
    }
}

/// Per-side price bounds for online pricing.
///
/// Unset bounds fall back to the global `min_price`/`max_price`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OnlineConfig {
    pub buy_price_min: Option<f64>,
    pub buy_price_max: Option<f64>,
    pub sell_price_min: Option<f64>,
    pub sell_price_max: Option<f64>,
}

/// Predicted demand pattern and realized-demand noise.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DemandConfig {
    /// `"sinusoidal"`, `"constant"` or `"double_peak"`.
    pub pattern: String,
    /// Baseline demand per step (MWh).
    pub base_load: f64,
    /// Peak deviation from the baseline (MWh).
    pub amplitude: f64,
    /// Hour of the (evening) demand peak.
    pub peak_hour: f64,
    /// Hour of the morning peak for `double_peak`.
    pub morning_peak_hour: f64,
    /// Width (standard deviation, hours) of each `double_peak` bump.
    pub peak_width_hours: f64,
    /// Period of the `sinusoidal` pattern in hours.
    pub period_hours: f64,
    /// Standard deviation of realized-demand noise (MWh).
    pub sigma: f64,
}

impl Default for DemandConfig {
    fn default() -> Self {
        Self {
            pattern: "sinusoidal".to_string(),
            base_load: 150.0,
            amplitude: 50.0,
            peak_hour: 18.0,
            morning_peak_hour: 8.0,
            peak_width_hours: 2.0,
            period_hours: 24.0,
            sigma: 5.0,
        }
    }
}

/// Dispatch and reserve prices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostsConfig {
    /// Cost model name; only `"constant"` is supported.
    pub cost_type: String,
    /// Price per MWh of dispatched energy.
    pub dispatch_price: f64,
    /// Price per MWh of shortfall; derived from the multiplier when unset.
    pub reserve_price: Option<f64>,
    /// `reserve_price = dispatch_price * reserve_multiplier` when unset.
    pub reserve_multiplier: f64,
}

impl Default for CostsConfig {
    fn default() -> Self {
        Self {
            cost_type: "constant".to_string(),
            dispatch_price: 5.0,
            reserve_price: None,
            reserve_multiplier: 3.0,
        }
    }
}

/// Battery storage parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    /// Minimum stored energy (MWh).
    pub min: f64,
    /// Maximum stored energy (MWh).
    pub max: f64,
    /// Initial stored energy (MWh).
    pub init: f64,
    /// Maximum charge per step (MWh).
    pub charge_rate_max: f64,
    /// Maximum discharge per step (MWh).
    pub discharge_rate_max: f64,
    /// Charge efficiency (0.0–1.0].
    pub charge_efficiency: f64,
    /// Discharge efficiency (0.0–1.0].
    pub discharge_efficiency: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 100.0,
            init: 50.0,
            charge_rate_max: 10.0,
            discharge_rate_max: 10.0,
            charge_efficiency: 0.95,
            discharge_efficiency: 0.95,
        }
    }
}

/// PCS on-site production.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProductionConfig {
    /// Peak production per step (MWh).
    pub peak: f64,
    /// Hour when production starts (inclusive).
    pub sunrise_hour: f64,
    /// Hour when production stops (exclusive).
    pub sunset_hour: f64,
    /// Multiplicative noise standard deviation.
    pub noise_std: f64,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            peak: 4.0,
            sunrise_hour: 6.0,
            sunset_hour: 18.0,
            noise_std: 0.0,
        }
    }
}

/// PCS local consumption.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConsumptionConfig {
    /// Baseline consumption per step (MWh).
    pub base: f64,
    /// Sinusoidal amplitude (MWh).
    pub amplitude: f64,
    /// Phase offset (radians).
    pub phase_rad: f64,
    /// Additive noise standard deviation (MWh).
    pub noise_std: f64,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            base: 3.0,
            amplitude: 1.0,
            // peak near 19:12
            phase_rad: -3.45,
            noise_std: 0.0,
        }
    }
}

/// PCS action layout.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActionConfig {
    /// When true the PCS action is `[battery, consumption, production]`.
    pub multi_action: bool,
}

/// Fixed response policy installed on every PCS agent.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PcsPolicyConfig {
    /// `"idle"` or `"threshold"`.
    pub kind: String,
    /// Charge when the buy price is at or below this value.
    pub charge_below: f64,
    /// Discharge when the sell price is at or above this value.
    pub discharge_above: f64,
    /// Battery action magnitude used by the threshold policy.
    pub rate: f64,
}

impl Default for PcsPolicyConfig {
    fn default() -> Self {
        Self {
            kind: "idle".to_string(),
            charge_below: 3.0,
            discharge_above: 6.0,
            rate: 5.0,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"time.max_steps_per_episode"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ScenarioConfig {
    /// Returns the baseline scenario: quadratic day-ahead pricing.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the online preset: per-step pricing, noisier demand, two agents.
    pub fn online() -> Self {
        Self {
            simulation: SimulationConfig {
                num_pcs_agents: 2,
                ..SimulationConfig::default()
            },
            pricing: PricingConfig {
                policy: "online".to_string(),
                ..PricingConfig::default()
            },
            demand: DemandConfig {
                pattern: "double_peak".to_string(),
                sigma: 10.0,
                ..DemandConfig::default()
            },
            pcs_policy: PcsPolicyConfig {
                kind: "threshold".to_string(),
                ..PcsPolicyConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the constant preset: flat day-ahead prices, expensive reserve.
    pub fn constant() -> Self {
        Self {
            pricing: PricingConfig {
                policy: "constant".to_string(),
                ..PricingConfig::default()
            },
            costs: CostsConfig {
                reserve_multiplier: 5.0,
                ..CostsConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "online", "constant"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "online" => Ok(Self::online()),
            "constant" => Ok(Self::constant()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.num_pcs_agents == 0 {
            errors.push(ConfigError::new("simulation.num_pcs_agents", "must be > 0"));
        }
        if s.iso_reward.parse::<RewardKind>().is_err() {
            errors.push(ConfigError::new(
                "simulation.iso_reward",
                format!("must be \"iso\" or \"cost\", got \"{}\"", s.iso_reward),
            ));
        }
        if s.pcs_reward.parse::<RewardKind>().is_err() {
            errors.push(ConfigError::new(
                "simulation.pcs_reward",
                format!("must be \"iso\" or \"cost\", got \"{}\"", s.pcs_reward),
            ));
        }

        let t = &self.time;
        if t.max_steps_per_episode == 0 {
            errors.push(ConfigError::new("time.max_steps_per_episode", "must be > 0"));
        }
        if t.step_duration_minutes <= 0.0 {
            errors.push(ConfigError::new("time.step_duration_minutes", "must be > 0"));
        }
        if t.minutes_per_day <= 0.0 {
            errors.push(ConfigError::new("time.minutes_per_day", "must be > 0"));
        }

        let p = &self.pricing;
        if p.policy.parse::<PricingPolicy>().is_err() {
            errors.push(ConfigError::new(
                "pricing.policy",
                format!(
                    "must be \"quadratic\", \"constant\" or \"online\", got \"{}\"",
                    p.policy
                ),
            ));
        }
        if p.min_price > p.max_price {
            errors.push(ConfigError::new("pricing.min_price", "must be <= pricing.max_price"));
        }
        if p.quadratic.dispatch_min > p.quadratic.dispatch_max {
            errors.push(ConfigError::new(
                "pricing.quadratic.dispatch_min",
                "must be <= pricing.quadratic.dispatch_max",
            ));
        }
        if p.quadratic.coefficient_min > p.quadratic.coefficient_max {
            errors.push(ConfigError::new(
                "pricing.quadratic.coefficient_min",
                "must be <= pricing.quadratic.coefficient_max",
            ));
        }
        if p.constant.dispatch_min > p.constant.dispatch_max {
            errors.push(ConfigError::new(
                "pricing.constant.dispatch_min",
                "must be <= pricing.constant.dispatch_max",
            ));
        }
        if p.constant.price_min.unwrap_or(p.min_price)
            > p.constant.price_max.unwrap_or(p.max_price)
        {
            errors.push(ConfigError::new(
                "pricing.constant.price_min",
                "must be <= pricing.constant.price_max",
            ));
        }
        let online = &p.online;
        if online.buy_price_min.unwrap_or(p.min_price) > online.buy_price_max.unwrap_or(p.max_price)
        {
            errors.push(ConfigError::new(
                "pricing.online.buy_price_min",
                "must be <= pricing.online.buy_price_max",
            ));
        }
        if online.sell_price_min.unwrap_or(p.min_price)
            > online.sell_price_max.unwrap_or(p.max_price)
        {
            errors.push(ConfigError::new(
                "pricing.online.sell_price_min",
                "must be <= pricing.online.sell_price_max",
            ));
        }

        let d = &self.demand;
        if d.pattern.parse::<DemandPattern>().is_err() {
            errors.push(ConfigError::new(
                "demand.pattern",
                format!(
                    "must be \"sinusoidal\", \"constant\" or \"double_peak\", got \"{}\"",
                    d.pattern
                ),
            ));
        }
        if d.sigma < 0.0 {
            errors.push(ConfigError::new("demand.sigma", "must be >= 0"));
        }
        if d.period_hours <= 0.0 {
            errors.push(ConfigError::new("demand.period_hours", "must be > 0"));
        }
        if d.peak_width_hours <= 0.0 {
            errors.push(ConfigError::new("demand.peak_width_hours", "must be > 0"));
        }

        let c = &self.costs;
        if c.cost_type.parse::<CostType>().is_err() {
            errors.push(ConfigError::new(
                "costs.cost_type",
                format!("must be \"constant\", got \"{}\"", c.cost_type),
            ));
        }

        let b = &self.battery;
        if b.max < b.min {
            errors.push(ConfigError::new("battery.max", "must be >= battery.min"));
        }
        if b.init < b.min || b.init > b.max {
            errors.push(ConfigError::new("battery.init", "must be in [battery.min, battery.max]"));
        }
        if b.charge_rate_max < 0.0 {
            errors.push(ConfigError::new("battery.charge_rate_max", "must be >= 0"));
        }
        if b.discharge_rate_max < 0.0 {
            errors.push(ConfigError::new("battery.discharge_rate_max", "must be >= 0"));
        }
        if !(b.charge_efficiency > 0.0 && b.charge_efficiency <= 1.0) {
            errors.push(ConfigError::new("battery.charge_efficiency", "must be in (0.0, 1.0]"));
        }
        if !(b.discharge_efficiency > 0.0 && b.discharge_efficiency <= 1.0) {
            errors.push(ConfigError::new(
                "battery.discharge_efficiency",
                "must be in (0.0, 1.0]",
            ));
        }

        let prod = &self.production;
        if prod.sunrise_hour >= prod.sunset_hour {
            errors.push(ConfigError::new(
                "production.sunrise_hour",
                "must be < production.sunset_hour",
            ));
        }

        if self.pcs_policy.kind.parse::<PcsPolicyKind>().is_err() {
            errors.push(ConfigError::new(
                "pcs_policy.kind",
                format!(
                    "must be \"idle\" or \"threshold\", got \"{}\"",
                    self.pcs_policy.kind
                ),
            ));
        }

        errors
    }

    /// Validates and returns the first error, if any.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`ScenarioConfig::validate`].
    pub fn ensure_valid(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let e = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name).expect("preset should load");
            let errors = cfg.validate();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
seed = 7
num_pcs_agents = 3
iso_reward = "cost"

[time]
step_duration_minutes = 60.0
max_steps_per_episode = 24

[pricing]
policy = "online"
min_price = 2.0
max_price = 20.0

[pricing.online]
sell_price_max = 15.0

[demand]
pattern = "double_peak"
sigma = 0.0

[costs]
dispatch_price = 4.0
reserve_price = 12.0

[battery]
max = 50.0
init = 10.0

[action]
multi_action = true
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).expect("valid TOML should parse");
        assert_eq!(cfg.simulation.num_pcs_agents, 3);
        assert_eq!(cfg.time.max_steps_per_episode, 24);
        assert_eq!(cfg.pricing.policy, "online");
        assert_eq!(cfg.pricing.online.sell_price_max, Some(15.0));
        assert_eq!(cfg.costs.reserve_price, Some(12.0));
        assert!(cfg.action.multi_action);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[time]
max_steps_per_episode = 24
bogus_field = true
"#;
        let result = ScenarioConfig::from_toml_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[simulation]
seed = 99
"#;
        let cfg = ScenarioConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.simulation.seed, 99);
        assert_eq!(cfg.time.max_steps_per_episode, 48);
        assert_eq!(cfg.battery.max, 100.0);
    }

    #[test]
    fn validation_catches_bad_policy() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.pricing.policy = "auction".to_string();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "pricing.policy"));
    }

    #[test]
    fn validation_catches_zero_horizon() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.time.max_steps_per_episode = 0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "time.max_steps_per_episode"));
    }

    #[test]
    fn validation_catches_battery_init_out_of_range() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.battery.init = 150.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "battery.init"));
    }

    #[test]
    fn validation_catches_bad_reward() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.iso_reward = "profit".to_string();
        assert!(cfg.ensure_valid().is_err());
    }

    #[test]
    fn validation_catches_inverted_online_bounds() {
        let mut cfg = ScenarioConfig::online();
        cfg.pricing.online.buy_price_min = Some(12.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "pricing.online.buy_price_min"));
    }

    #[test]
    fn validation_catches_inverted_constant_price_bounds() {
        let mut cfg = ScenarioConfig::constant();
        cfg.pricing.constant.price_min = Some(10.0);
        cfg.pricing.constant.price_max = Some(1.0);
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "pricing.constant.price_min"));
        assert!(cfg.ensure_valid().is_err());
    }
}

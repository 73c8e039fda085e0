//! Post-hoc KPI computation from episode records.

use std::fmt;

use super::types::StepInfo;

/// Aggregate key performance indicators for one episode.
///
/// Computed post-hoc from the step records so the report always agrees
/// with the per-step data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KpiReport {
    /// Number of steps in the episode.
    pub steps: usize,
    /// Sum of step rewards.
    pub total_reward: f64,
    /// Mean step reward.
    pub mean_reward: f64,
    pub total_dispatch_cost: f64,
    pub total_reserve_cost: f64,
    /// Sum of PCS exchange costs (negative when the PCS side earned).
    pub total_pcs_costs: f64,
    /// Total unmet net demand (MWh).
    pub total_shortfall: f64,
    /// Steps with a positive shortfall.
    pub shortfall_steps: usize,
    /// Largest net demand seen (MWh).
    pub peak_net_demand: f64,
    /// Root-mean-square of `dispatch - net_demand` (MWh).
    pub rmse_dispatch: f64,
    /// Total battery energy moved across all agents (MWh).
    pub battery_throughput: f64,
    /// Throughput over `2 * capacity * agents`.
    pub battery_equivalent_full_cycles: f64,
}

impl KpiReport {
    /// Computes all KPIs from the episode's step records.
    ///
    /// # Arguments
    ///
    /// * `records` - Step records in order
    /// * `battery_capacity` - Capacity of one battery, for cycle counting
    pub fn from_records(records: &[StepInfo], battery_capacity: f64) -> Self {
        if records.is_empty() {
            return Self::default();
        }

        let n = records.len() as f64;
        let mut report = Self {
            steps: records.len(),
            peak_net_demand: f64::NEG_INFINITY,
            ..Self::default()
        };
        let mut sq_sum = 0.0;
        let mut agents = 0;

        for r in records {
            let g = &r.grid;
            report.total_reward += r.reward;
            report.total_dispatch_cost += g.dispatch_cost;
            report.total_reserve_cost += g.reserve_cost;
            report.total_pcs_costs += g.pcs_costs;
            report.total_shortfall += g.shortfall;
            if g.shortfall > 0.0 {
                report.shortfall_steps += 1;
            }
            report.peak_net_demand = report.peak_net_demand.max(g.net_demand);

            let err = g.dispatch - g.net_demand;
            sq_sum += err * err;

            report.battery_throughput += r.energy_changes.iter().map(|e| e.abs()).sum::<f64>();
            agents = agents.max(r.energy_changes.len());
        }

        report.mean_reward = report.total_reward / n;
        report.rmse_dispatch = (sq_sum / n).sqrt();
        let denom = 2.0 * battery_capacity * agents as f64;
        if denom > 0.0 {
            report.battery_equivalent_full_cycles = report.battery_throughput / denom;
        }
        report
    }
}

impl fmt::Display for KpiReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- KPI Report ---")?;
        writeln!(f, "Steps:                 {}", self.steps)?;
        writeln!(
            f,
            "Reward:                {:.2} total ({:.3} mean)",
            self.total_reward, self.mean_reward
        )?;
        writeln!(f, "Dispatch cost:         {:.2}", self.total_dispatch_cost)?;
        writeln!(f, "Reserve cost:          {:.2}", self.total_reserve_cost)?;
        writeln!(f, "PCS exchange cost:     {:.2}", self.total_pcs_costs)?;
        writeln!(
            f,
            "Shortfall:             {:.2} MWh over {} steps",
            self.total_shortfall, self.shortfall_steps
        )?;
        writeln!(f, "Peak net demand:       {:.2} MWh", self.peak_net_demand)?;
        writeln!(f, "RMSE dispatch error:   {:.3} MWh", self.rmse_dispatch)?;
        write!(
            f,
            "Battery throughput:    {:.2} MWh ({:.2} equiv. cycles)",
            self.battery_throughput, self.battery_equivalent_full_cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::cost::GridStepRecord;

    fn record(net_demand: f64, dispatch: f64, energy_change: f64, reward: f64) -> StepInfo {
        StepInfo {
            grid: GridStepRecord {
                net_demand,
                dispatch,
                shortfall: (net_demand - dispatch).max(0.0),
                ..GridStepRecord::default()
            },
            energy_changes: vec![energy_change],
            reward,
            ..StepInfo::default()
        }
    }

    #[test]
    fn empty_records() {
        let kpi = KpiReport::from_records(&[], 100.0);
        assert_eq!(kpi, KpiReport::default());
    }

    #[test]
    fn perfect_dispatch_zero_rmse() {
        let records = vec![record(10.0, 10.0, 0.0, -1.0), record(20.0, 20.0, 0.0, -3.0)];
        let kpi = KpiReport::from_records(&records, 100.0);
        assert_eq!(kpi.rmse_dispatch, 0.0);
        assert_eq!(kpi.total_reward, -4.0);
        assert_eq!(kpi.mean_reward, -2.0);
        assert_eq!(kpi.shortfall_steps, 0);
        assert_eq!(kpi.peak_net_demand, 20.0);
    }

    #[test]
    fn shortfall_counted() {
        let records = vec![record(15.0, 10.0, 0.0, 0.0), record(5.0, 10.0, 0.0, 0.0)];
        let kpi = KpiReport::from_records(&records, 100.0);
        assert_eq!(kpi.total_shortfall, 5.0);
        assert_eq!(kpi.shortfall_steps, 1);
        assert_eq!(kpi.rmse_dispatch, 5.0);
    }

    #[test]
    fn battery_cycles() {
        // 50 in + 50 out on a 50 MWh battery = 1 cycle
        let records = vec![record(0.0, 0.0, 50.0, 0.0), record(0.0, 0.0, -50.0, 0.0)];
        let kpi = KpiReport::from_records(&records, 50.0);
        assert_eq!(kpi.battery_throughput, 100.0);
        assert!((kpi.battery_equivalent_full_cycles - 1.0).abs() < 1e-12);
    }

    #[test]
    fn display_does_not_panic() {
        let kpi = KpiReport::from_records(&[record(1.0, 1.0, 1.0, 1.0)], 10.0);
        let s = format!("{kpi}");
        assert!(s.contains("KPI Report"));
    }
}

//! Episode history tracking.

use tracing::info;

use super::kpi::KpiReport;
use super::types::StepInfo;

/// Accumulates per-step records into episode-level history.
///
/// Created once per controller. Per-episode history is cleared by
/// [`EpisodeMetrics::start_episode`]; the episode counter keeps counting
/// across episodes.
#[derive(Debug, Clone, Default)]
pub struct EpisodeMetrics {
    records: Vec<StepInfo>,
    rewards: Vec<f64>,
    total_reward: f64,
    episode_count: usize,
}

impl EpisodeMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the per-episode history and bumps the episode counter.
    pub fn start_episode(&mut self) {
        self.records.clear();
        self.rewards.clear();
        self.total_reward = 0.0;
        self.episode_count += 1;
    }

    /// Appends one step and returns the running reward total.
    pub fn record(&mut self, info: &StepInfo) -> f64 {
        self.total_reward += info.reward;
        self.rewards.push(info.reward);
        self.records.push(info.clone());
        self.total_reward
    }

    /// Logs the episode summary. Use [`EpisodeMetrics::summary`] for the report.
    pub fn end_episode(&self, battery_capacity: f64) {
        let report = self.summary(battery_capacity);
        info!(
            episode = self.episode_count,
            steps = report.steps,
            total_reward = report.total_reward,
            total_shortfall = report.total_shortfall,
            "episode finished"
        );
    }

    pub fn summary(&self, battery_capacity: f64) -> KpiReport {
        KpiReport::from_records(&self.records, battery_capacity)
    }

    pub fn records(&self) -> &[StepInfo] {
        &self.records
    }

    pub fn rewards(&self) -> &[f64] {
        &self.rewards
    }

    /// One numeric field of every record, in step order.
    pub fn series(&self, field: impl Fn(&StepInfo) -> f64) -> Vec<f64> {
        self.records.iter().map(field).collect()
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    pub fn step_count(&self) -> usize {
        self.records.len()
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }
}

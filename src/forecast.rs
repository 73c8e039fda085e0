//! Demand forecasting utilities.

/// Naive "tomorrow is today" forecaster.
///
/// This forecast simply copies the provided baseline (e.g. the realized
/// demand of the previous episode) and repeats/truncates it to match the
/// requested horizon.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaiveForecast;

impl NaiveForecast {
    /// Produce a naive forecast for the given horizon.
    ///
    /// # Arguments
    ///
    /// * `baseline` - Historical or baseline values used as the forecast template
    /// * `horizon` - Number of steps to forecast
    ///
    /// # Returns
    ///
    /// A vector of forecast values with length equal to `horizon`.
    pub fn forecast(&self, baseline: &[f64], horizon: usize) -> Vec<f64> {
        if horizon == 0 {
            return Vec::new();
        }

        if baseline.is_empty() {
            return vec![0.0; horizon];
        }

        baseline.iter().copied().cycle().take(horizon).collect()
    }
}

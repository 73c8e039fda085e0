use crate::market::pricing::PricingPolicy;

/// Day-ahead bid construction from a demand forecast.
#[derive(Debug, Default, Clone, Copy)]
pub struct DayAheadSchedule;

impl DayAheadSchedule {
    /// Generate a flat dispatch profile equal to the average of the forecast.
    pub fn flat_target(forecast: &[f64]) -> Vec<f64> {
        if forecast.is_empty() {
            return Vec::new();
        }

        let sum: f64 = forecast.iter().sum();
        let avg = sum / forecast.len() as f64;
        vec![avg; forecast.len()]
    }

    /// Build a raw pricing action for `policy` that bids flat prices and
    /// dispatches `profile`.
    ///
    /// Quadratic bids use constant coefficient triples; online bids ignore
    /// the profile.
    pub fn bid_action(
        policy: PricingPolicy,
        profile: &[f64],
        buy_price: f64,
        sell_price: f64,
    ) -> Vec<f64> {
        let mut action = match policy {
            PricingPolicy::Quadratic => vec![buy_price, 0.0, 0.0, sell_price, 0.0, 0.0],
            PricingPolicy::Constant | PricingPolicy::Online => vec![buy_price, sell_price],
        };
        if policy != PricingPolicy::Online {
            action.extend_from_slice(profile);
        }
        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_target_matches_length() {
        let forecast = vec![1.0, 2.0, 3.0, 4.0];
        let schedule = DayAheadSchedule::flat_target(&forecast);
        assert_eq!(schedule.len(), forecast.len());
    }

    #[test]
    fn flat_target_is_average() {
        let forecast = vec![1.0, 2.0, 3.0];
        let schedule = DayAheadSchedule::flat_target(&forecast);
        assert_eq!(schedule, vec![2.0, 2.0, 2.0]);
    }

    #[test]
    fn quadratic_bid_layout() {
        let action =
            DayAheadSchedule::bid_action(PricingPolicy::Quadratic, &[10.0, 20.0], 5.0, 3.0);
        assert_eq!(action, vec![5.0, 0.0, 0.0, 3.0, 0.0, 0.0, 10.0, 20.0]);
    }

    #[test]
    fn constant_and_online_bid_layout() {
        let profile = [7.0, 8.0, 9.0];
        assert_eq!(
            DayAheadSchedule::bid_action(PricingPolicy::Constant, &profile, 5.0, 3.0).len(),
            5
        );
        assert_eq!(
            DayAheadSchedule::bid_action(PricingPolicy::Online, &profile, 5.0, 3.0),
            vec![5.0, 3.0]
        );
    }
}

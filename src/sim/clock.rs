/// Episode step counter with time-of-day tracking.
///
/// The counter starts at 0 after `reset`; each `tick` advances it and
/// returns the new 1-based step. Once the horizon is reached the clock
/// stops ticking until reset.
///
/// # Examples
///
/// ```
/// use iso_pcs_sim::sim::clock::EpisodeClock;
///
/// let mut clock = EpisodeClock::new(3, 60.0, 1440.0);
/// let mut steps = Vec::new();
///
/// clock.run(|step| steps.push(step));
/// assert_eq!(steps, vec![1, 2, 3]);
/// assert!(clock.is_finished());
/// ```
#[derive(Debug, Clone)]
pub struct EpisodeClock {
    /// Steps taken in the current episode
    count: usize,
    /// Steps per episode
    horizon: usize,
    step_duration_minutes: f64,
    minutes_per_day: f64,
}

impl EpisodeClock {
    /// Creates a clock for episodes of `horizon` steps.
    ///
    /// # Arguments
    ///
    /// * `horizon` - Steps before the episode terminates
    /// * `step_duration_minutes` - Simulated minutes per step
    /// * `minutes_per_day` - Minutes in one simulated day
    pub fn new(horizon: usize, step_duration_minutes: f64, minutes_per_day: f64) -> Self {
        Self {
            count: 0,
            horizon,
            step_duration_minutes,
            minutes_per_day,
        }
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(step)` - The new 1-based step count
    /// * `None` - If the horizon has already been reached
    pub fn tick(&mut self) -> Option<usize> {
        if self.count < self.horizon {
            self.count += 1;
            Some(self.count)
        } else {
            None
        }
    }

    /// Runs a function for each remaining step.
    pub fn run(&mut self, mut f: impl FnMut(usize)) {
        while let Some(step) = self.tick() {
            f(step);
        }
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn is_finished(&self) -> bool {
        self.count >= self.horizon
    }

    /// Elapsed fraction of a day after `count` steps.
    pub fn time_fraction_at(&self, count: usize) -> f64 {
        count as f64 * self.step_duration_minutes / self.minutes_per_day
    }

    /// Elapsed fraction of a day at the current count.
    pub fn time_fraction(&self) -> f64 {
        self.time_fraction_at(self.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_clock() {
        let clock = EpisodeClock::new(5, 30.0, 1440.0);
        assert_eq!(clock.count(), 0);
        assert_eq!(clock.horizon(), 5);
        assert_eq!(clock.time_fraction(), 0.0);
    }

    #[test]
    fn test_tick() {
        let mut clock = EpisodeClock::new(2, 30.0, 1440.0);
        assert_eq!(clock.tick(), Some(1));
        assert_eq!(clock.tick(), Some(2));
        assert_eq!(clock.tick(), None);
        assert_eq!(clock.count(), 2);
    }

    #[test]
    fn test_time_fraction() {
        let mut clock = EpisodeClock::new(48, 30.0, 1440.0);
        for _ in 0..24 {
            clock.tick();
        }
        assert!((clock.time_fraction() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_reset() {
        let mut clock = EpisodeClock::new(1, 60.0, 1440.0);
        clock.tick();
        assert!(clock.is_finished());
        clock.reset();
        assert!(!clock.is_finished());
        assert_eq!(clock.tick(), Some(1));
    }

    #[test]
    fn test_empty_clock() {
        let mut clock = EpisodeClock::new(0, 30.0, 1440.0);
        assert_eq!(clock.tick(), None);

        let mut was_called = false;
        clock.run(|_| was_called = true);
        assert!(!was_called);
    }
}

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::domain::config::SimulationSettings;

/// Source of every random quantity in a port: sailing delays, cargo weights
/// and the crane count.
pub trait SystemSimulator: std::fmt::Debug + Send + Sync {
    fn sleep_time_ms(&self) -> u64;
    fn cargo_weight(&self) -> u32;
    /// Picks a divisor of `dividend`, a proper one whenever `dividend` has any.
    fn pick_divisor(&self, dividend: usize) -> usize;

    /// Sleeps for a random sailing delay.
    fn pause(&self) {
        let millis = self.sleep_time_ms();
        if millis > 0 {
            thread::sleep(Duration::from_millis(millis));
        }
    }
}

pub fn divisors_of(dividend: usize) -> Vec<usize> {
    (1..=dividend).filter(|candidate| dividend % candidate == 0).collect()
}

/// Divisors in `[2, dividend - 1]`; only a prime (or 1) falls back to `{1, dividend}`.
pub fn candidate_divisors(dividend: usize) -> Vec<usize> {
    let divisors = divisors_of(dividend);
    let proper: Vec<usize> = divisors.iter().copied().filter(|d| *d != 1 && *d != dividend).collect();
    if proper.is_empty() { divisors } else { proper }
}

#[derive(Debug)]
struct SimulatorState {
    rng: StdRng,
    min_sleep_ms: u64,
    max_sleep_ms: u64,
    min_cargo_weight: u32,
    max_cargo_weight: u32,
}

/// One seeded generator per process, shared by every worker.
#[derive(Debug, Clone)]
pub struct Simulator {
    state: Arc<Mutex<SimulatorState>>,
}

impl Simulator {
    pub fn new(settings: &SimulationSettings) -> Simulator {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let state = SimulatorState {
            rng,
            min_sleep_ms: settings.min_sleep_ms,
            max_sleep_ms: settings.max_sleep_ms,
            min_cargo_weight: settings.min_cargo_weight,
            max_cargo_weight: settings.max_cargo_weight,
        };

        Simulator { state: Arc::new(Mutex::new(state)) }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SimulatorState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

impl SystemSimulator for Simulator {
    fn sleep_time_ms(&self) -> u64 {
        self.with_state(|state| {
            let (min, max) = (state.min_sleep_ms, state.max_sleep_ms);
            state.rng.random_range(min..=max)
        })
    }

    fn cargo_weight(&self) -> u32 {
        self.with_state(|state| {
            let (min, max) = (state.min_cargo_weight, state.max_cargo_weight);
            state.rng.random_range(min..=max)
        })
    }

    fn pick_divisor(&self, dividend: usize) -> usize {
        let divisors = candidate_divisors(dividend);
        if divisors.is_empty() {
            return 1;
        }
        self.with_state(|state| divisors[state.rng.random_range(0..divisors.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(seed: u64) -> SimulationSettings {
        SimulationSettings { seed: Some(seed), min_sleep_ms: 5, max_sleep_ms: 10, ..SimulationSettings::default() }
    }

    #[test]
    fn test_values_stay_in_configured_ranges() {
        let simulator = Simulator::new(&settings(7));
        for _ in 0..200 {
            let sleep = simulator.sleep_time_ms();
            assert!((5..=10).contains(&sleep));
            let weight = simulator.cargo_weight();
            assert!((5..=50).contains(&weight));
        }
    }

    #[test]
    fn test_same_seed_gives_same_stream() {
        let first = Simulator::new(&settings(42));
        let second = Simulator::new(&settings(42));
        let a: Vec<u32> = (0..10).map(|_| first.cargo_weight()).collect();
        let b: Vec<u32> = (0..10).map(|_| second.cargo_weight()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_pick_divisor_prefers_proper_divisors() {
        assert_eq!(divisors_of(12), vec![1, 2, 3, 4, 6, 12]);
        assert_eq!(candidate_divisors(12), vec![2, 3, 4, 6]);
        assert_eq!(candidate_divisors(7), vec![1, 7]);
        assert_eq!(candidate_divisors(4), vec![2]);

        for seed in 0..20 {
            let simulator = Simulator::new(&settings(seed));
            for _ in 0..20 {
                assert!([2, 3, 4, 6].contains(&simulator.pick_divisor(12)));
                assert!([1, 7].contains(&simulator.pick_divisor(7)));
            }
        }
    }
}

use crate::domain::simulator::simulator::SystemSimulator;

/// Deterministic simulator: no delays, constant cargo, fixed crane count.
#[derive(Debug, Clone)]
pub struct MockSimulator {
    pub cargo_weight: u32,
    pub divisor: Option<usize>,
}

impl MockSimulator {
    pub fn new(cargo_weight: u32) -> MockSimulator {
        MockSimulator { cargo_weight, divisor: None }
    }

    pub fn with_divisor(mut self, divisor: usize) -> MockSimulator {
        self.divisor = Some(divisor);
        self
    }
}

impl SystemSimulator for MockSimulator {
    fn sleep_time_ms(&self) -> u64 {
        0
    }

    fn cargo_weight(&self) -> u32 {
        self.cargo_weight
    }

    fn pick_divisor(&self, dividend: usize) -> usize {
        self.divisor.unwrap_or(dividend)
    }
}

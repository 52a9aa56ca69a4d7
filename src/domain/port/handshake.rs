use crate::domain::config::{PassageRule, SimulationSettings};
use crate::domain::simulator::simulator::SystemSimulator;
use crate::error::{Error, Result};

pub fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    (2..).take_while(|d| d * d <= n).all(|d| n % d != 0)
}

/// Decision of the Destination Port on a passage request for `vessel_count` vessels.
pub fn passage_denied(vessel_count: usize, rule: PassageRule) -> bool {
    match rule {
        PassageRule::Prime => !is_prime(vessel_count),
        PassageRule::Unrestricted => false,
    }
}

/// Crane count of the run: the configured one, or a random divisor of the vessel count.
pub fn choose_crane_count(vessel_count: usize, settings: &SimulationSettings, simulator: &dyn SystemSimulator) -> Result<usize> {
    match settings.crane_count {
        Some(cranes) if cranes == 0 || vessel_count % cranes != 0 => Err(Error::InvalidConfiguration(format!(
            "configured crane count {} does not divide vessel count {}",
            cranes, vessel_count
        ))),
        Some(cranes) => Ok(cranes),
        None => Ok(simulator.pick_divisor(vessel_count)),
    }
}

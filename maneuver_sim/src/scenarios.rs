//! Deterministic host scenarios for the maneuver queue.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// MQ-001: The three-vessel reference fleet
    Baseline,

    /// MQ-002: High warp into a cluster of nodes
    NodeRush,

    /// MQ-003: Launches, losses and renames during warp
    FleetChurn,

    /// MQ-004: Save reload moves the clock backwards
    TimeSlip,

    /// MQ-005: Host list, display and settings go dark
    Blackout,

    /// MQ-006: Rapid mode switching with filter restore
    ModeFlip,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::Baseline,
            ScenarioId::NodeRush,
            ScenarioId::FleetChurn,
            ScenarioId::TimeSlip,
            ScenarioId::Blackout,
            ScenarioId::ModeFlip,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "baseline",
            ScenarioId::NodeRush => "node_rush",
            ScenarioId::FleetChurn => "fleet_churn",
            ScenarioId::TimeSlip => "time_slip",
            ScenarioId::Blackout => "blackout",
            ScenarioId::ModeFlip => "mode_flip",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::Baseline => "Bravo/Alpha/Charlie: orderings, clustered warnings, two clamps",
            ScenarioId::NodeRush => "1000x warp into four nodes 10 s apart, every guarded node clamped before it passes",
            ScenarioId::FleetChurn => "Random launches, losses, renames and hides under warp; display always matches the fleet",
            ScenarioId::TimeSlip => "Clock jumps back 4700 s; no re-arm until the reload notification",
            ScenarioId::Blackout => "Tracking list, settings and display offline; last snapshot kept, full recovery",
            ScenarioId::ModeFlip => "40 mode switches over a sled store; idempotent publishes, filter restored",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "baseline" | "mq-001" => Ok(ScenarioId::Baseline),
            "node_rush" | "noderush" | "mq-002" => Ok(ScenarioId::NodeRush),
            "fleet_churn" | "fleetchurn" | "mq-003" => Ok(ScenarioId::FleetChurn),
            "time_slip" | "timeslip" | "mq-004" => Ok(ScenarioId::TimeSlip),
            "blackout" | "mq-005" => Ok(ScenarioId::Blackout),
            "mode_flip" | "modeflip" | "mq-006" => Ok(ScenarioId::ModeFlip),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_codes_parse() {
        for (i, scenario) in ScenarioId::all().into_iter().enumerate() {
            assert_eq!(scenario.name().parse::<ScenarioId>().unwrap(), scenario);
            let code = format!("MQ-{:03}", i + 1);
            assert_eq!(code.parse::<ScenarioId>().unwrap(), scenario);
        }
    }

    #[test]
    fn test_unknown_scenario() {
        assert!("split_brain".parse::<ScenarioId>().is_err());
    }
}

//! Canned traffic patterns expressed as multiples of the target block size.

use {
    crate::{error::SimError, randomizer::Randomizer},
    serde::{Deserialize, Serialize},
    std::{fmt, str::FromStr},
};

const FULL: &[f64] = &[
    1.8, 1.9, 2.0, 1.95, 2.0, 1.85, 1.9, 2.0, 1.9, 1.8, //
    2.0, 1.95, 1.85, 1.9, 2.0, 1.95, 1.9, 1.85, 2.0, 1.9, //
    1.8, 1.95, 2.0, 1.9, 1.85, 1.95, 2.0, 1.9, 1.8, 1.95, //
    2.0, 1.9, 1.85, 1.95, 2.0,
];

const EMPTY: &[f64] = &[
    0.05, 0.03, 0.08, 0.12, 0.06, 0.09, 0.11, 0.07, 0.10, 0.08, //
    0.02, 0.13, 0.06, 0.09, 0.07, 0.04, 0.11, 0.08, 0.05, 0.12, //
    0.09, 0.06, 0.04, 0.10, 0.07, 0.08, 0.05, 0.11, 0.09, 0.03, //
    0.12, 0.07, 0.06, 0.08, 0.04,
];

const STABLE: &[f64] = &[
    0.9, 1.1, 1.05, 0.95, 1.0, 1.15, 0.85, 1.08, 0.98, 1.03, //
    0.97, 1.12, 0.92, 1.06, 0.99, 1.01, 0.96, 1.14, 0.88, 1.09, //
    1.04, 0.93, 1.07, 0.98, 1.02, 0.95, 1.13, 0.87, 1.05, 1.01, //
    0.94, 1.08, 0.96, 1.04, 0.98, 1.02, 0.97, 1.06, 0.99, 1.03,
];

const MIXED: &[f64] = &[
    // stable
    1.0, 0.95, 1.05, 0.98, 1.02, 0.97, 1.04, 0.99, 1.01, 0.96, //
    0.97, 1.03, 0.98, 1.02, 0.99, 1.01, 0.96, 1.04, 0.97, 1.03, //
    0.98, 1.02, 0.99, 1.01, 0.97, 1.03, 0.98, 1.02, 0.99, 1.01, //
    // ramp into congestion
    1.1, 1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.85, 1.9, //
    1.95, 2.0, 1.95, 1.9, 1.85, 1.8, 1.85, 1.9, 1.95, 2.0, //
    1.95, 1.9, 1.85, 1.8, 1.85, 1.9, 1.95, 2.0, 1.95, 1.9, //
    // sustained congestion
    1.9, 2.0, 1.95, 1.85, 1.9, 2.0, 1.95, 1.8, 1.9, 2.0, //
    1.95, 1.85, 1.9, 2.0, 1.95, 1.8, 1.9, 2.0, 1.95, 1.85, //
    1.9, 2.0, 1.95, 1.8, 1.9, 2.0, 1.95, 1.85, 1.9, 2.0, //
    // back towards normal
    1.7, 1.6, 1.5, 1.4, 1.3, 1.2, 1.1, 1.0, 0.9, 0.8, //
    0.85, 1.15, 0.9, 1.1, 0.95, 1.05, 0.8, 1.2, 0.75, 1.25, //
    0.7, 1.3, 0.85, 1.15, 0.9, 1.1, 0.95, 1.05, 0.8, 1.2, //
    // low demand
    0.2, 0.1, 0.15, 0.25, 0.18, 0.12, 0.08, 0.22, 0.16, 0.14, //
    0.19, 0.11, 0.17, 0.23, 0.15, 0.13, 0.21, 0.09, 0.20, 0.12, //
    0.18, 0.14, 0.16, 0.22, 0.10, 0.19, 0.13, 0.17, 0.21, 0.15, //
    // recovery
    0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 1.0, 1.1, 1.2, //
    1.1, 1.0, 0.95, 1.05, 0.98, 1.02, 0.97, 1.03, 0.99, 1.01, //
    0.98, 1.02, 0.97, 1.03, 0.99, 1.01, 0.98, 1.02, 0.97, 1.03, //
    // second spike
    1.2, 1.3, 1.4, 1.5, 1.6, 1.7, 1.8, 1.9, 2.0, 1.95, //
    1.9, 1.85, 1.8, 1.85, 1.9, 1.95, 2.0, 1.95, 1.9, 1.85, //
    1.8, 1.85, 1.9, 1.95, 2.0, 1.95, 1.9, 1.85, 1.8, 1.85, //
    // settle
    1.6, 1.5, 1.4, 1.3, 1.2, 1.1, 1.0, 0.95, 1.05, 0.98, //
    1.02, 0.97, 1.03, 0.99, 1.01, 0.98, 1.02, 0.97, 1.03, 0.99, //
    1.01, 0.98, 1.02, 0.97, 1.03, 0.99, 1.01, 0.98, 1.02, 0.97,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioKind {
    Full,
    Empty,
    Stable,
    Mixed,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Full,
        ScenarioKind::Empty,
        ScenarioKind::Stable,
        ScenarioKind::Mixed,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Empty => "empty",
            Self::Stable => "stable",
            Self::Mixed => "mixed",
        }
    }

    /// Demand as multiples of the target block size.
    pub const fn multipliers(&self) -> &'static [f64] {
        match self {
            Self::Full => FULL,
            Self::Empty => EMPTY,
            Self::Stable => STABLE,
            Self::Mixed => MIXED,
        }
    }

    const fn title(&self) -> &'static str {
        match self {
            Self::Full => "Full Blocks",
            Self::Empty => "Empty Blocks",
            Self::Stable => "Stable Half Full",
            Self::Mixed => "Mixed Traffic Patterns",
        }
    }

    const fn description(&self) -> &'static str {
        match self {
            Self::Full => "Sustained full or nearly-full blocks",
            Self::Empty => "Sustained empty or nearly-empty blocks",
            Self::Stable => "Variable fullness averaging around the target",
            Self::Mixed => {
                "Stable, congested and low-demand periods with gradual transitions between them"
            }
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "empty" => Ok(Self::Empty),
            "stable" => Ok(Self::Stable),
            "mixed" => Ok(Self::Mixed),
            _ => Err(SimError::UnknownScenario(s.to_string())),
        }
    }
}

/// Parse a scenario selector; `"all"` expands to every kind.
pub fn select(name: &str) -> Result<Vec<ScenarioKind>, SimError> {
    if name.trim().eq_ignore_ascii_case("all") {
        return Ok(ScenarioKind::ALL.to_vec());
    }
    Ok(vec![name.parse()?])
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub kind: ScenarioKind,
    pub name: String,
    pub description: String,
    /// Gas used per block.
    pub blocks: Vec<u64>,
}

impl Scenario {
    pub fn generate(kind: ScenarioKind, target_block_size: u64) -> Self {
        Self {
            kind,
            name: kind.title().to_string(),
            description: kind.description().to_string(),
            blocks: kind
                .multipliers()
                .iter()
                .map(|multiplier| (target_block_size as f64 * multiplier) as u64)
                .collect(),
        }
    }

    /// Pass every block through `randomizer`.
    pub fn with_randomness(self, randomizer: &mut dyn Randomizer, max_block_size: u64) -> Self {
        Self {
            name: format!("{} (with randomness)", self.name),
            description: format!("{} with randomized gas usage", self.description),
            blocks: self
                .blocks
                .iter()
                .map(|&gas| randomizer.add_randomness(gas, max_block_size))
                .collect(),
            kind: self.kind,
        }
    }
}

/// Every scenario scaled to `target_block_size`.
pub fn all(target_block_size: u64) -> Vec<Scenario> {
    ScenarioKind::ALL
        .iter()
        .map(|&kind| Scenario::generate(kind, target_block_size))
        .collect()
}

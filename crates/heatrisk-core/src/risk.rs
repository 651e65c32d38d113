use std::fmt;

use serde::{Deserialize, Serialize};

/// Heat index (°C) at which Caution begins.
pub const CAUTION_HI_C: f64 = 27.0;
/// Heat index (°C) at which Danger begins.
pub const DANGER_HI_C: f64 = 32.0;
/// Heat index (°C) at which Extreme begins.
pub const EXTREME_HI_C: f64 = 41.0;

/// Four-level heat-stress classification. Serialised as its class index 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RiskClass {
    Safe = 0,
    Caution = 1,
    Danger = 2,
    Extreme = 3,
}

impl RiskClass {
    pub const COUNT: usize = 4;
    pub const ALL: [RiskClass; Self::COUNT] =
        [RiskClass::Safe, RiskClass::Caution, RiskClass::Danger, RiskClass::Extreme];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Bucket a heat index (°C): `< 27` Safe, `27–32` Caution, `32–41` Danger,
    /// `≥ 41` Extreme. NaN falls through to Safe.
    pub fn from_heat_index(hi_c: f64) -> Self {
        if hi_c >= EXTREME_HI_C {
            RiskClass::Extreme
        } else if hi_c >= DANGER_HI_C {
            RiskClass::Danger
        } else if hi_c >= CAUTION_HI_C {
            RiskClass::Caution
        } else {
            RiskClass::Safe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskClass::Safe    => "Safe",
            RiskClass::Caution => "Caution",
            RiskClass::Danger  => "Danger",
            RiskClass::Extreme => "Extreme",
        }
    }

    /// Map fill colour (RGBA) used when annotating district boundaries.
    pub fn fill_color(self) -> [u8; 4] {
        match self {
            RiskClass::Safe    => [0, 204, 150, 255],
            RiskClass::Caution => [255, 193, 7, 255],
            RiskClass::Danger  => [255, 87, 34, 255],
            RiskClass::Extreme => [183, 28, 28, 255],
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<RiskClass> for u8 {
    fn from(c: RiskClass) -> u8 {
        c as u8
    }
}

impl TryFrom<u8> for RiskClass {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        RiskClass::from_index(v as usize).ok_or_else(|| format!("risk class out of range: {v}"))
    }
}

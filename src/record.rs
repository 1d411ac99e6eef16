//! The policy row model shared by every analysis in the crate.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One policy row, as a tabular loader hands it over.
///
/// `vehicle_intro_date` stays raw here; [`crate::intro_date::normalize`]
/// turns it into a typed date when a portfolio is loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub province: String,
    pub gender: Gender,
    pub vehicle_type: String,
    pub total_premium: f64,
    pub total_claims: f64,
    #[serde(default)]
    pub vehicle_intro_date: Option<String>,
}

impl PolicyRecord {
    /// Claims paid per unit of premium written. `None` when the premium is
    /// not positive, which would make the ratio meaningless.
    pub fn loss_ratio(&self) -> Option<f64> {
        (self.total_premium > 0.0).then(|| self.total_claims / self.total_premium)
    }
}

/// Policyholder gender as recorded in the dataset (`M` / `F`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "M"),
            Gender::Female => write!(f, "F"),
        }
    }
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "m" | "male" => Ok(Gender::Male),
            "f" | "female" => Ok(Gender::Female),
            other => Err(anyhow::anyhow!("Unknown gender value: {other}")),
        }
    }
}

//! Units of measure for ingredient quantities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A volume unit. Every quantity in a recipe or a stock lot carries one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    Liter,
    Deciliter,
    Centiliter,
    Milliliter,
}

/// Returned when a unit name is not one of the recognized volume units.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown unit of measure: {0:?}")]
pub struct UnknownUnit(pub String);

impl UnitOfMeasure {
    /// All recognized units, largest first.
    pub const ALL: [UnitOfMeasure; 4] = [
        UnitOfMeasure::Liter,
        UnitOfMeasure::Deciliter,
        UnitOfMeasure::Centiliter,
        UnitOfMeasure::Milliliter,
    ];

    /// Returns the unit name as stored and exchanged on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOfMeasure::Liter => "liter",
            UnitOfMeasure::Deciliter => "deciliter",
            UnitOfMeasure::Centiliter => "centiliter",
            UnitOfMeasure::Milliliter => "milliliter",
        }
    }
}

impl std::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UnitOfMeasure {
    type Err = UnknownUnit;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitOfMeasure::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| UnknownUnit(s.to_string()))
    }
}

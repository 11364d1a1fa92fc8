//! ABO/Rh blood types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// ABO group of a blood type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AboGroup {
    A,
    B,
    Ab,
    O,
}

impl AboGroup {
    /// Whether red cells of this group carry the A antigen.
    pub const fn has_a_antigen(self) -> bool {
        matches!(self, Self::A | Self::Ab)
    }

    /// Whether red cells of this group carry the B antigen.
    pub const fn has_b_antigen(self) -> bool {
        matches!(self, Self::B | Self::Ab)
    }
}

/// One of the eight ABO/Rh blood types.
///
/// Rendered canonically (`AB+`) and parsed case-insensitively after
/// trimming.
///
/// # Examples
/// ```
/// use bloodlink::domain::BloodType;
///
/// let parsed: BloodType = " ab+ ".parse().expect("known type");
/// assert_eq!(parsed, BloodType::AbPositive);
/// assert_eq!(parsed.to_string(), "AB+");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodType {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

/// Error returned when text does not name a blood type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blood type: {input}")]
pub struct ParseBloodTypeError {
    input: String,
}

impl ParseBloodTypeError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        self.input.as_str()
    }
}

impl BloodType {
    /// Every blood type, in canonical order.
    pub const ALL: [Self; 8] = [
        Self::APositive,
        Self::ANegative,
        Self::BPositive,
        Self::BNegative,
        Self::AbPositive,
        Self::AbNegative,
        Self::OPositive,
        Self::ONegative,
    ];

    /// Canonical textual form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }

    pub const fn abo(self) -> AboGroup {
        match self {
            Self::APositive | Self::ANegative => AboGroup::A,
            Self::BPositive | Self::BNegative => AboGroup::B,
            Self::AbPositive | Self::AbNegative => AboGroup::Ab,
            Self::OPositive | Self::ONegative => AboGroup::O,
        }
    }

    pub const fn is_rh_positive(self) -> bool {
        matches!(
            self,
            Self::APositive | Self::BPositive | Self::AbPositive | Self::OPositive
        )
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BloodType {
    type Err = ParseBloodTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == normalized)
            .ok_or_else(|| ParseBloodTypeError {
                input: s.to_owned(),
            })
    }
}

impl TryFrom<String> for BloodType {
    type Error = ParseBloodTypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(value: BloodType) -> Self {
        value.as_str().to_owned()
    }
}

//! Free-text place names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A place name as entered by a donor, hospital, or requester.
///
/// Stored verbatim. Two locations denote the same place when they are equal
/// after trimming and ASCII case folding.
///
/// # Examples
/// ```
/// use bloodlink::domain::Location;
///
/// assert!(Location::new("Springfield ").is_same_place(&Location::new("springfield")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Whether the trimmed text is empty.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Matching key used for locality comparisons.
    pub fn normalized(&self) -> String {
        self.0.trim().to_ascii_lowercase()
    }

    pub fn is_same_place(&self, other: &Self) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Location {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Springfield", "springfield", true)]
    #[case("  Shelbyville", "SHELBYVILLE ", true)]
    #[case("Springfield", "Shelbyville", false)]
    #[case("North Haverbrook", "NorthHaverbrook", false)]
    fn compares_trimmed_and_case_folded(
        #[case] left: &str,
        #[case] right: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(
            Location::new(left).is_same_place(&Location::new(right)),
            expected
        );
    }

    #[rstest]
    fn whitespace_only_is_blank() {
        assert!(Location::new("   ").is_blank());
        assert!(!Location::new(" x ").is_blank());
    }
}

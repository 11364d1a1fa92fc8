//! Red-cell compatibility between blood types.
//!
//! A donor's ABO antigens must be a subset of the recipient's, and an
//! Rh-positive donor may only give to an Rh-positive recipient. Both lookup
//! directions derive from [`is_compatible`], so they are always consistent.

use std::collections::BTreeSet;

use super::BloodType;

/// Whether red cells from `donor` may be transfused into `recipient`.
///
/// # Examples
/// ```
/// use bloodlink::domain::{BloodType, compatibility::is_compatible};
///
/// assert!(is_compatible(BloodType::ONegative, BloodType::AbPositive));
/// assert!(!is_compatible(BloodType::APositive, BloodType::ANegative));
/// ```
pub fn is_compatible(donor: BloodType, recipient: BloodType) -> bool {
    let donor_abo = donor.abo();
    let recipient_abo = recipient.abo();
    let abo_ok = (!donor_abo.has_a_antigen() || recipient_abo.has_a_antigen())
        && (!donor_abo.has_b_antigen() || recipient_abo.has_b_antigen());
    let rh_ok = !donor.is_rh_positive() || recipient.is_rh_positive();
    abo_ok && rh_ok
}

/// Static compatibility lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityMatrix;

impl CompatibilityMatrix {
    /// Recipient types that may receive from `donor`.
    pub fn can_donate_to(donor: BloodType) -> BTreeSet<BloodType> {
        BloodType::ALL
            .into_iter()
            .filter(|recipient| is_compatible(donor, *recipient))
            .collect()
    }

    /// Donor types `recipient` may receive from.
    pub fn can_receive_from(recipient: BloodType) -> BTreeSet<BloodType> {
        BloodType::ALL
            .into_iter()
            .filter(|donor| is_compatible(*donor, recipient))
            .collect()
    }
}

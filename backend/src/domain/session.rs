//! Caller context supplied by the Auth collaborator.
//!
//! Every mutating operation takes an explicit [`Session`]; there is no
//! ambient "current user".

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{Error, UserId};

/// Role assigned to a user by the Auth collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Registered donor; reads matches and availability.
    Donor,
    /// Submits and tracks blood requests.
    Recipient,
    /// Operates one hospital's inventory and reviews requests.
    Hospital,
    /// Operates every hospital.
    Admin,
}

impl Role {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Recipient => "recipient",
            Self::Hospital => "hospital",
            Self::Admin => "admin",
        }
    }

    /// Hospitals and admins run the ledger and the request lifecycle.
    pub const fn is_operator(self) -> bool {
        matches!(self, Self::Hospital | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(String);

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donor" => Ok(Self::Donor),
            "recipient" => Ok(Self::Recipient),
            "hospital" => Ok(Self::Hospital),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError(s.to_owned())),
        }
    }
}

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: UserId,
    role: Role,
}

impl Session {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Reject callers that may not run `action`.
    ///
    /// # Examples
    /// ```
    /// use bloodlink::domain::{ErrorCode, Role, Session, UserId};
    ///
    /// let donor = Session::new(UserId::random(), Role::Donor);
    /// let err = donor.require_operator("approve requests").unwrap_err();
    /// assert_eq!(err.code(), ErrorCode::Forbidden);
    /// ```
    pub fn require_operator(&self, action: &str) -> Result<(), Error> {
        if self.role.is_operator() {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "role {} may not {action}",
                self.role
            )))
        }
    }
}

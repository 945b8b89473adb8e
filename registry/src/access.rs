//! # Access Control
//!
//! Three privileged identities run the registry:
//!
//! - **Owner** — supreme authority. Reassigns the other roles, advances
//!   the lifecycle phase, and holds the destroy switch.
//! - **Operator** — day-to-day authority: minting, feature toggles, the
//!   voting-contract registration.
//! - **Treasurer** — the only identity allowed to sweep unencumbered
//!   funds out of the registry.
//!
//! Each role is exactly one address at a time. The owner is fixed at
//! construction; both other roles start as the owner until reassigned.
//! Every state-changing entry point in the rest of the crate opens with
//! one of the `require_*` predicates below.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::error::{RegistryError, Result};

/// The three privileged roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    Owner,
    Operator,
    Treasurer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => write!(f, "owner"),
            Role::Operator => write!(f, "operator"),
            Role::Treasurer => write!(f, "treasurer"),
        }
    }
}

/// Holds the current role assignments and answers authorization queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessControl {
    owner: Address,
    operator: Address,
    treasurer: Address,
}

impl AccessControl {
    /// Creates the role set with `owner` holding all three roles.
    ///
    /// Matches deployment reality: the deploying identity runs everything
    /// until it delegates operator and treasurer duties.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            operator: owner,
            treasurer: owner,
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn operator(&self) -> Address {
        self.operator
    }

    pub fn treasurer(&self) -> Address {
        self.treasurer
    }

    /// Fails with [`RegistryError::Unauthorized`] unless `caller` is the owner.
    pub fn require_owner(&self, caller: Address) -> Result<()> {
        if caller == self.owner {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                role: Role::Owner,
                caller,
            })
        }
    }

    /// Fails with [`RegistryError::Unauthorized`] unless `caller` is the operator.
    pub fn require_operator(&self, caller: Address) -> Result<()> {
        if caller == self.operator {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                role: Role::Operator,
                caller,
            })
        }
    }

    /// Fails with [`RegistryError::Unauthorized`] unless `caller` is the treasurer.
    pub fn require_treasurer(&self, caller: Address) -> Result<()> {
        if caller == self.treasurer {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                role: Role::Treasurer,
                caller,
            })
        }
    }

    /// Authorizes the operator or one specifically delegated address.
    /// Used by the election-outcome entry point, where the registered
    /// voting contract may call in alongside the operator.
    pub fn require_operator_or(&self, caller: Address, delegate: Option<Address>) -> Result<()> {
        if caller == self.operator || delegate == Some(caller) {
            Ok(())
        } else {
            Err(RegistryError::Unauthorized {
                role: Role::Operator,
                caller,
            })
        }
    }

    /// Reassigns the operator. Owner only. Returns the previous holder.
    pub fn set_operator(&mut self, caller: Address, operator: Address) -> Result<Address> {
        self.require_owner(caller)?;
        Ok(std::mem::replace(&mut self.operator, operator))
    }

    /// Reassigns the treasurer. Owner only. Returns the previous holder.
    pub fn set_treasurer(&mut self, caller: Address, treasurer: Address) -> Result<Address> {
        self.require_owner(caller)?;
        Ok(std::mem::replace(&mut self.treasurer, treasurer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AccessControl, Address, Address) {
        let owner = Address::random();
        let other = Address::random();
        (AccessControl::new(owner), owner, other)
    }

    #[test]
    fn owner_holds_all_roles_at_creation() {
        let (ac, owner, _) = setup();
        assert_eq!(ac.owner(), owner);
        assert_eq!(ac.operator(), owner);
        assert_eq!(ac.treasurer(), owner);
    }

    #[test]
    fn only_owner_reassigns_roles() {
        let (mut ac, owner, other) = setup();
        let operator = Address::random();

        let err = ac.set_operator(other, operator).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { role: Role::Owner, .. }));

        let previous = ac.set_operator(owner, operator).unwrap();
        assert_eq!(previous, owner);
        assert_eq!(ac.operator(), operator);
    }

    #[test]
    fn predicates_reject_everyone_else() {
        let (mut ac, owner, other) = setup();
        let operator = Address::random();
        let treasurer = Address::random();
        ac.set_operator(owner, operator).unwrap();
        ac.set_treasurer(owner, treasurer).unwrap();

        assert!(ac.require_owner(owner).is_ok());
        assert!(ac.require_operator(operator).is_ok());
        assert!(ac.require_treasurer(treasurer).is_ok());

        for caller in [other, operator, treasurer] {
            assert!(ac.require_owner(caller).is_err());
        }
        for caller in [other, owner, treasurer] {
            assert!(ac.require_operator(caller).is_err());
        }
        for caller in [other, owner, operator] {
            assert!(ac.require_treasurer(caller).is_err());
        }
    }

    #[test]
    fn operator_or_delegate() {
        let (mut ac, owner, other) = setup();
        let operator = Address::random();
        let voting = Address::random();
        ac.set_operator(owner, operator).unwrap();

        assert!(ac.require_operator_or(operator, Some(voting)).is_ok());
        assert!(ac.require_operator_or(voting, Some(voting)).is_ok());
        assert!(ac.require_operator_or(other, Some(voting)).is_err());
        assert!(ac.require_operator_or(voting, None).is_err());
    }
}

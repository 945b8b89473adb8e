//! # Lifecycle Phase State Machine
//!
//! The registry moves through four phases, strictly forward, one step at
//! a time, on owner command:
//!
//! ```text
//! Created ──▶ Deployed ──▶ Beta ──▶ OfficialRelease
//! ```
//!
//! Every other component declares at most one phase requirement, checked
//! through the guards here. Minting closes after Beta; direct tier sales
//! open at Deployed; the marketplace opens at Beta; `finish_minting`
//! only exists at OfficialRelease. The phase never regresses.
//!
//! Destruction is not a phase — it is an orthogonal terminal flag on the
//! registry, reachable from any phase by the owner.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RegistryError, Result};

/// The lifecycle stage of the registry. Ordering is meaningful:
/// `Phase::Deployed < Phase::Beta`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Phase {
    /// Constructed, pre-launch. Minting and administration only.
    Created = 0,
    /// Live on the network; direct tier purchases are open (the presale).
    Deployed = 1,
    /// Release candidate: the marketplace opens, pre-release toggles work.
    Beta = 2,
    /// Final. Minting can be finished; no further phase exists.
    OfficialRelease = 3,
}

impl Phase {
    /// The phase after this one, or `None` at the terminal phase.
    pub fn next(self) -> Option<Phase> {
        match self {
            Phase::Created => Some(Phase::Deployed),
            Phase::Deployed => Some(Phase::Beta),
            Phase::Beta => Some(Phase::OfficialRelease),
            Phase::OfficialRelease => None,
        }
    }

    /// Advances exactly one step. Fails with
    /// [`RegistryError::InvalidPhaseTransition`] at `OfficialRelease`.
    pub fn advance(&mut self) -> Result<Phase> {
        match self.next() {
            Some(next) => {
                *self = next;
                Ok(next)
            }
            None => Err(RegistryError::InvalidPhaseTransition { current: *self }),
        }
    }

    /// Guard: the current phase must be `minimum` or later.
    pub fn require_at_least(self, minimum: Phase, requirement: &'static str) -> Result<()> {
        if self >= minimum {
            Ok(())
        } else {
            Err(RegistryError::PhaseNotAllowed {
                current: self,
                requirement,
            })
        }
    }

    /// Guard: the current phase must be `maximum` or earlier.
    pub fn require_at_most(self, maximum: Phase, requirement: &'static str) -> Result<()> {
        if self <= maximum {
            Ok(())
        } else {
            Err(RegistryError::PhaseNotAllowed {
                current: self,
                requirement,
            })
        }
    }

    /// Guard: the current phase must be exactly `expected`.
    pub fn require_exactly(self, expected: Phase, requirement: &'static str) -> Result<()> {
        if self == expected {
            Ok(())
        } else {
            Err(RegistryError::PhaseNotAllowed {
                current: self,
                requirement,
            })
        }
    }

    /// Guard: the current phase must be strictly before `bound`.
    pub fn require_before(self, bound: Phase, requirement: &'static str) -> Result<()> {
        if self < bound {
            Ok(())
        } else {
            Err(RegistryError::PhaseNotAllowed {
                current: self,
                requirement,
            })
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Created => write!(f, "Created"),
            Phase::Deployed => write!(f, "Deployed"),
            Phase::Beta => write!(f, "Beta"),
            Phase::OfficialRelease => write!(f, "OfficialRelease"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advances_one_step_at_a_time() {
        let mut phase = Phase::Created;
        assert_eq!(phase.advance().unwrap(), Phase::Deployed);
        assert_eq!(phase.advance().unwrap(), Phase::Beta);
        assert_eq!(phase.advance().unwrap(), Phase::OfficialRelease);
    }

    #[test]
    fn terminal_phase_cannot_advance() {
        let mut phase = Phase::OfficialRelease;
        let err = phase.advance().unwrap_err();
        assert_eq!(
            err,
            RegistryError::InvalidPhaseTransition {
                current: Phase::OfficialRelease
            }
        );
        assert_eq!(phase, Phase::OfficialRelease);
    }

    #[test]
    fn ordering_matches_lifecycle() {
        assert!(Phase::Created < Phase::Deployed);
        assert!(Phase::Deployed < Phase::Beta);
        assert!(Phase::Beta < Phase::OfficialRelease);
    }

    #[test]
    fn guards() {
        assert!(Phase::Beta.require_at_least(Phase::Deployed, "x").is_ok());
        assert!(Phase::Created.require_at_least(Phase::Deployed, "x").is_err());
        assert!(Phase::Beta.require_at_most(Phase::Beta, "x").is_ok());
        assert!(Phase::OfficialRelease.require_at_most(Phase::Beta, "x").is_err());
        assert!(Phase::Beta.require_exactly(Phase::Beta, "x").is_ok());
        assert!(Phase::Beta.require_exactly(Phase::OfficialRelease, "x").is_err());
        assert!(Phase::Beta.require_before(Phase::OfficialRelease, "x").is_ok());
        assert!(Phase::OfficialRelease
            .require_before(Phase::OfficialRelease, "x")
            .is_err());
    }
}

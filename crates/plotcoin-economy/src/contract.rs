//! Energy-export contracts between two claims.
//!
//! The owner (exporter) fixes the terms when the contract is created. A
//! counterparty (importer) can be attached once. Cancelling needs both
//! sides: the contract turns inactive exactly when both cancellation flags
//! are set, and never turns active again.

use plotcoin_types::{AgentId, ClaimId, ContractId};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EconomyError;

/// Shortest contract, in block periods.
pub const MIN_CONTRACT_DURATION: u32 = 1;

/// Longest contract, in block periods.
pub const MAX_CONTRACT_DURATION: u32 = 5;

/// Draw a contract duration uniformly from
/// `MIN_CONTRACT_DURATION..=MAX_CONTRACT_DURATION`.
pub fn random_duration<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(MIN_CONTRACT_DURATION..=MAX_CONTRACT_DURATION)
}

/// Fixed terms of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractTerms {
    /// Energy delivered each period, in Wh.
    pub watts_per_period: u64,
    /// USD per Wh.
    pub price_per_watt: Decimal,
    /// Number of block periods.
    pub duration: u32,
}

impl ContractTerms {
    /// Total price of all energy over the contract:
    /// `watts_per_period * duration * price_per_watt`.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn energy_cost(&self) -> Result<Decimal, EconomyError> {
        Decimal::from(self.watts_per_period)
            .checked_mul(Decimal::from(self.duration))
            .and_then(|watts| watts.checked_mul(self.price_per_watt))
            .ok_or(EconomyError::ArithmeticOverflow)
    }

    /// Price of one period's delivery.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn payment_per_period(&self) -> Result<Decimal, EconomyError> {
        Decimal::from(self.watts_per_period)
            .checked_mul(self.price_per_watt)
            .ok_or(EconomyError::ArithmeticOverflow)
    }
}

/// The importing side of a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    /// The importing agent.
    pub agent: AgentId,
    /// The claim receiving the energy.
    pub claim: ClaimId,
}

/// A bilateral energy-export agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    id: ContractId,
    owner: AgentId,
    owner_claim: ClaimId,
    terms: ContractTerms,
    counterparty: Option<Counterparty>,
    owner_cancelled: bool,
    counterparty_cancelled: bool,
    periods_elapsed: u32,
}

impl Contract {
    /// Create an active contract with no counterparty yet.
    pub fn new(owner: AgentId, owner_claim: ClaimId, terms: ContractTerms) -> Self {
        Self {
            id: ContractId::new(),
            owner,
            owner_claim,
            terms,
            counterparty: None,
            owner_cancelled: false,
            counterparty_cancelled: false,
            periods_elapsed: 0,
        }
    }

    /// The contract's identifier.
    pub const fn id(&self) -> ContractId {
        self.id
    }

    /// The exporting agent.
    pub const fn owner(&self) -> AgentId {
        self.owner
    }

    /// The exporting claim.
    pub const fn owner_claim(&self) -> ClaimId {
        self.owner_claim
    }

    /// The fixed terms.
    pub const fn terms(&self) -> &ContractTerms {
        &self.terms
    }

    /// The importing side, once attached.
    pub const fn counterparty(&self) -> Option<Counterparty> {
        self.counterparty
    }

    /// Block periods settled or skipped so far.
    pub const fn periods_elapsed(&self) -> u32 {
        self.periods_elapsed
    }

    /// Attach the importing side.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::CounterpartyAlreadyAttached`] on a second
    /// call.
    pub fn attach_counterparty(&mut self, counterparty: Counterparty) -> Result<(), EconomyError> {
        if self.counterparty.is_some() {
            return Err(EconomyError::CounterpartyAlreadyAttached(self.id));
        }
        self.counterparty = Some(counterparty);
        Ok(())
    }

    /// The claim `agent` takes part with, if `agent` is a party.
    pub fn claim_for_agent(&self, agent: AgentId) -> Option<ClaimId> {
        if agent == self.owner {
            return Some(self.owner_claim);
        }
        self.counterparty
            .filter(|party| party.agent == agent)
            .map(|party| party.claim)
    }

    /// Record that `agent` wants out. Returns whether the contract is still
    /// active afterwards. Agents who are not a party change nothing.
    pub fn cancel(&mut self, agent: AgentId) -> bool {
        if agent == self.owner {
            self.owner_cancelled = true;
        }
        if self.counterparty.is_some_and(|party| party.agent == agent) {
            self.counterparty_cancelled = true;
        }
        self.is_active()
    }

    /// Active until both sides have cancelled.
    pub const fn is_active(&self) -> bool {
        !(self.owner_cancelled && self.counterparty_cancelled)
    }

    /// Count one block period. Once `duration` periods have passed both
    /// sides cancel. Returns whether the contract is still active.
    pub fn record_period(&mut self) -> bool {
        self.periods_elapsed = self.periods_elapsed.saturating_add(1);
        if self.periods_elapsed >= self.terms.duration {
            self.cancel(self.owner);
            if let Some(party) = self.counterparty {
                self.cancel(party.agent);
            }
        }
        self.is_active()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::cast_possible_truncation
)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    use super::*;

    fn terms(duration: u32) -> ContractTerms {
        ContractTerms {
            watts_per_period: 100,
            price_per_watt: dec!(0.25),
            duration,
        }
    }

    fn attached(duration: u32) -> (Contract, AgentId) {
        let mut contract = Contract::new(AgentId::new(), ClaimId::new(), terms(duration));
        let agent = AgentId::new();
        contract
            .attach_counterparty(Counterparty {
                agent,
                claim: ClaimId::new(),
            })
            .unwrap();
        (contract, agent)
    }

    #[test]
    fn costs_follow_terms() {
        let t = terms(3);
        assert_eq!(t.energy_cost().unwrap(), dec!(75));
        assert_eq!(t.payment_per_period().unwrap(), dec!(25));
    }

    #[test]
    fn one_sided_cancel_keeps_contract_active() {
        let (mut contract, other) = attached(3);
        assert!(contract.cancel(contract.owner()));
        assert!(contract.is_active());
        assert!(!contract.cancel(other));
        assert!(!contract.is_active());
    }

    #[test]
    fn counterparty_first_then_owner() {
        let (mut contract, other) = attached(3);
        assert!(contract.cancel(other));
        assert!(contract.cancel(other));
        assert!(!contract.cancel(contract.owner()));
    }

    #[test]
    fn strangers_cannot_cancel() {
        let (mut contract, _) = attached(3);
        assert!(contract.cancel(AgentId::new()));
        assert!(contract.cancel(contract.owner()));
        assert!(contract.is_active());
    }

    #[test]
    fn inactive_is_permanent() {
        let (mut contract, other) = attached(3);
        contract.cancel(contract.owner());
        contract.cancel(other);
        assert!(!contract.record_period());
        assert!(!contract.is_active());
    }

    #[test]
    fn counterparty_attaches_once() {
        let (mut contract, _) = attached(3);
        let again = contract.attach_counterparty(Counterparty {
            agent: AgentId::new(),
            claim: ClaimId::new(),
        });
        assert!(matches!(again, Err(EconomyError::CounterpartyAlreadyAttached(_))));
    }

    #[test]
    fn claim_lookup_by_party() {
        let owner_claim = ClaimId::new();
        let owner = AgentId::new();
        let mut contract = Contract::new(owner, owner_claim, terms(1));
        let other = AgentId::new();
        let other_claim = ClaimId::new();
        assert_eq!(contract.claim_for_agent(other), None);
        contract
            .attach_counterparty(Counterparty {
                agent: other,
                claim: other_claim,
            })
            .unwrap();
        assert_eq!(contract.claim_for_agent(owner), Some(owner_claim));
        assert_eq!(contract.claim_for_agent(other), Some(other_claim));
    }

    #[test]
    fn expires_after_duration() {
        let (mut contract, _) = attached(2);
        assert!(contract.record_period());
        assert!(!contract.record_period());
        assert_eq!(contract.periods_elapsed(), 2);
    }

    #[test]
    fn durations_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = [false; 6];
        for _ in 0..200 {
            let d = random_duration(&mut rng);
            assert!((MIN_CONTRACT_DURATION..=MAX_CONTRACT_DURATION).contains(&d));
            if let Some(slot) = seen.get_mut(d as usize) {
                *slot = true;
            }
        }
        assert!(seen[1..=5].iter().all(|s| *s));
    }
}

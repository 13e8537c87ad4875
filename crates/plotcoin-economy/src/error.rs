//! Error types for the `plotcoin-economy` crate.
//!
//! Every variant here signals a bookkeeping bug in the caller, not an
//! expected runtime condition. Operations check before they mutate, so a
//! returned error leaves the claim untouched.

use plotcoin_types::{ClaimId, ContractId, EquipmentId, EquipmentKind};
use rust_decimal::Decimal;

/// Errors that can occur during economic operations.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// A cash change would drive the balance below zero.
    #[error("cash change of {delta} would make balance {balance} negative")]
    NegativeCash {
        /// Balance before the change.
        balance: Decimal,
        /// The rejected change.
        delta: Decimal,
    },

    /// A bitcoin credit was negative, or the produced counter went down.
    #[error("bitcoin produced moved backwards by {delta}")]
    NegativeBitcoinDelta {
        /// The offending change.
        delta: Decimal,
    },

    /// A cumulative energy counter is lower than in the previous report.
    #[error("{counter} regressed from {previous} to {current}")]
    CounterRegressed {
        /// Which counter regressed.
        counter: &'static str,
        /// Value in the previous report.
        previous: u64,
        /// Value now.
        current: u64,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in economic calculation")]
    ArithmeticOverflow,

    /// A catalog lookup missed.
    #[error("unknown equipment: {0}")]
    UnknownEquipment(String),

    /// A catalog default points at an item of the wrong kind.
    #[error("catalog item {id} is a {found}, expected a {expected}")]
    CatalogKindMismatch {
        /// The catalog item.
        id: String,
        /// The kind the caller needed.
        expected: EquipmentKind,
        /// The kind the item actually is.
        found: EquipmentKind,
    },

    /// The claim holds no equipment with this id.
    #[error("equipment {equipment} not found on claim {claim}")]
    EquipmentNotFound {
        /// The claim searched.
        claim: ClaimId,
        /// The missing equipment.
        equipment: EquipmentId,
    },

    /// A contract's counterparty can be attached only once.
    #[error("contract {0} already has a counterparty")]
    CounterpartyAlreadyAttached(ContractId),
}

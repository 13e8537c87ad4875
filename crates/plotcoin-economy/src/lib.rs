//! Claims, equipment, and money for the Plotcoin simulation.
//!
//! Everything here is plain bookkeeping: no timers, no randomness except
//! where a caller passes an RNG in. Mutations check their preconditions
//! before they touch state, so an error leaves the books as they were.
//!
//! # Modules
//!
//! - [`equipment`] -- [`Equipment`], a miner or panel with shared fields.
//! - [`catalog`] -- [`EquipmentCatalog`], purchasable models and defaults.
//! - [`claim`] -- [`Claim`] counters and the creation-ordered
//!   [`ClaimRegistry`].
//! - [`report`] -- [`PlotReport`], delta-based production snapshots.
//! - [`lottery`] -- [`RewardLottery`], the hashing-power weighted block draw.
//! - [`contract`] -- [`Contract`], energy exports with two-sided cancel.
//! - [`error`] -- Error types for economic operations.

pub mod catalog;
pub mod claim;
pub mod contract;
pub mod equipment;
pub mod error;
pub mod lottery;
pub mod report;

// Re-export primary types at crate root.
pub use catalog::{CatalogItem, EquipmentCatalog};
pub use claim::{Claim, ClaimRegistry};
pub use contract::{Contract, ContractTerms, Counterparty};
pub use equipment::{Equipment, EquipmentState, MinerState, PanelState};
pub use error::EconomyError;
pub use lottery::{LotteryWin, RegisteredMiner, RewardLottery};
pub use report::{PlotReport, ReportParams};

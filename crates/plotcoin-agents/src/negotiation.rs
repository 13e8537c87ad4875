//! Drafting and judging energy-export contracts.
//!
//! The exporter sizes a contract to its surplus: a random duration, the
//! surplus split evenly across it, priced at the report's average watt
//! cost. The importer (when it is a bot) accepts only if it is short of
//! energy and the lottery value of the miners the energy could power beats
//! the total price.

use plotcoin_economy::contract::random_duration;
use plotcoin_economy::report::miner_capacity;
use plotcoin_economy::{Claim, ContractTerms, PlotReport, RewardLottery};
use rand::Rng;
use rust_decimal::Decimal;
use tracing::debug;

use crate::error::AgentError;

/// Terms for exporting this period's surplus.
///
/// Returns `None` when the surplus is too small to deliver at least one
/// watt-hour per period.
pub fn draft_terms<R: Rng + ?Sized>(report: &PlotReport, rng: &mut R) -> Option<ContractTerms> {
    let duration = random_duration(rng);
    let watts_per_period = report
        .surplus_energy
        .checked_div(u64::from(duration))
        .unwrap_or(0);
    if watts_per_period == 0 {
        return None;
    }
    Some(ContractTerms {
        watts_per_period,
        price_per_watt: report.avg_watt_cost,
        duration,
    })
}

/// A bot's verdict on an offer to import energy into `claim`.
///
/// Rejects when the claim has no miners, or when it already produces at
/// least its miners' capacity over `window_mins`. Otherwise estimates how
/// many of its miners the imported energy could run (never more than it
/// owns), and accepts iff their expected lottery earnings over the contract
/// exceed its total price.
///
/// # Errors
///
/// Returns [`AgentError::Economy`] on arithmetic overflow.
pub fn evaluate_offer(
    claim: &Claim,
    window_mins: u32,
    terms: &ContractTerms,
    lottery: &RewardLottery,
) -> Result<bool, AgentError> {
    let Some(representative) = claim.miners().find_map(|e| e.as_miner()) else {
        debug!(claim = %claim.id(), "offer rejected: no miners");
        return Ok(false);
    };

    let capacity = miner_capacity(claim.miner_energy_usage(), window_mins)?;
    if claim.total_energy_produced() >= capacity {
        debug!(claim = %claim.id(), capacity, "offer rejected: energy already sufficient");
        return Ok(false);
    }

    let owned = Decimal::from(claim.miner_count());
    let powerable = if representative.energy_usage == 0 {
        owned
    } else {
        Decimal::from(terms.watts_per_period)
            .checked_div(Decimal::from(representative.energy_usage))
            .unwrap_or(Decimal::ZERO)
    };
    let miner_count = owned.min(powerable);
    let hash_power = Decimal::from(representative.rated_hash_power)
        .checked_mul(miner_count)
        .unwrap_or(Decimal::ZERO);

    let expected = lottery.expected_profit(hash_power, terms.duration)?;
    let cost = terms.energy_cost()?;
    let accept = expected > cost;
    debug!(
        claim = %claim.id(),
        %miner_count,
        %expected,
        %cost,
        accept,
        "offer evaluated"
    );
    Ok(accept)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use plotcoin_economy::{EquipmentCatalog, RegisteredMiner};
    use plotcoin_types::{AgentId, ClaimId, EquipmentId, EquipmentKind, GridCoord};
    use plotcoin_world::ClaimFootprint;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    use super::*;

    fn claim_with_miners(count: usize) -> Claim {
        let catalog = EquipmentCatalog::default();
        let footprint = ClaimFootprint::new(ClaimId::new(), AgentId::new(), GridCoord::ORIGIN, None, 1);
        let mut claim = Claim::new(footprint, dec!(100000));
        for x in 0..count {
            let coord = GridCoord::new(i32::try_from(x).unwrap(), 0);
            claim
                .install(catalog.default_for(EquipmentKind::Miner).build(claim.id(), coord))
                .unwrap();
        }
        claim
    }

    fn lottery_with_total(total: u64) -> RewardLottery {
        let mut lottery = RewardLottery::new(dec!(6.5), dec!(23000));
        lottery
            .register(RegisteredMiner {
                claim: ClaimId::new(),
                miner: EquipmentId::new(),
                rated_hash_power: total,
            })
            .unwrap();
        lottery
    }

    fn report_with_surplus(surplus: u64, avg_watt_cost: Decimal) -> PlotReport {
        PlotReport {
            cash: dec!(0),
            cumulative_self_produced: 0,
            cumulative_total_energy: 0,
            cumulative_bitcoin: Decimal::ZERO,
            self_generated: 0,
            total_energy: 0,
            bitcoin_mined: Decimal::ZERO,
            miner_capacity: 0,
            target_self_generated: 0,
            self_sustainable: surplus > 0,
            surplus_energy: surplus,
            avg_watt_cost,
            equipment_value: Decimal::ZERO,
        }
    }

    #[test]
    fn draft_splits_surplus_over_duration() {
        let mut rng = StdRng::seed_from_u64(8);
        let terms = draft_terms(&report_with_surplus(1000, dec!(0.2)), &mut rng).unwrap();
        assert!((1..=5).contains(&terms.duration));
        assert_eq!(terms.watts_per_period, 1000 / u64::from(terms.duration));
        assert_eq!(terms.price_per_watt, dec!(0.2));
    }

    #[test]
    fn tiny_surplus_drafts_nothing() {
        let mut rng = StdRng::seed_from_u64(8);
        assert!(draft_terms(&report_with_surplus(0, dec!(1)), &mut rng).is_none());
    }

    #[test]
    fn no_miners_rejects() {
        let claim = claim_with_miners(0);
        let terms = ContractTerms {
            watts_per_period: 1372,
            price_per_watt: dec!(0),
            duration: 1,
        };
        assert!(!evaluate_offer(&claim, 5, &terms, &lottery_with_total(14)).unwrap());
    }

    #[test]
    fn energy_rich_claim_rejects() {
        let mut claim = claim_with_miners(1);
        claim.record_self_produced(1372).unwrap();
        let terms = ContractTerms {
            watts_per_period: 1372,
            price_per_watt: dec!(0),
            duration: 1,
        };
        assert!(!evaluate_offer(&claim, 5, &terms, &lottery_with_total(14)).unwrap());
    }

    #[test]
    fn cheap_energy_is_accepted() {
        // One miner's worth of energy; its expected share is 14/28 of
        // 6.5 BTC at 23000 USD over 2 blocks = 149500 USD.
        let claim = claim_with_miners(2);
        let terms = ContractTerms {
            watts_per_period: 1372,
            price_per_watt: dec!(1),
            duration: 2,
        };
        assert!(evaluate_offer(&claim, 5, &terms, &lottery_with_total(28)).unwrap());
    }

    #[test]
    fn expensive_energy_is_rejected() {
        let claim = claim_with_miners(2);
        let terms = ContractTerms {
            watts_per_period: 1372,
            price_per_watt: dec!(100),
            duration: 2,
        };
        assert!(!evaluate_offer(&claim, 5, &terms, &lottery_with_total(28)).unwrap());
    }

    #[test]
    fn powerable_miners_capped_by_owned() {
        // Energy for ten miners, but only one is owned: 14/14 share over
        // one block = 149500 USD, just above a price of 149499.
        let claim = claim_with_miners(1);
        let terms = ContractTerms {
            watts_per_period: 13_720,
            price_per_watt: dec!(149499) / dec!(13720),
            duration: 1,
        };
        assert!(evaluate_offer(&claim, 5, &terms, &lottery_with_total(14)).unwrap());
        let pricier = ContractTerms {
            price_per_watt: dec!(149501) / dec!(13720),
            ..terms
        };
        assert!(!evaluate_offer(&claim, 5, &pricier, &lottery_with_total(14)).unwrap());
    }
}

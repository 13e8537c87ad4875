//! The block-reward lottery.
//!
//! Every block period one number is drawn from `[0, DRAW_RANGE)`. Each
//! registered miner gets `floor(active / min_rated)` guesses, where
//! `min_rated` is the smallest rated hashing power ever registered. The
//! single guess closest to the drawn number wins the whole block reward.
//! Ties go to whichever guess was seen first: earlier-registered miners
//! first, then lower guess index.
//!
//! A powered-down miner (active hashing power 0) gets no guesses and cannot
//! win.

use plotcoin_types::{ClaimId, EquipmentId};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EconomyError;

/// Exclusive upper bound of drawn numbers and guesses.
pub const DRAW_RANGE: u64 = 100_000_000;

/// A miner known to the lottery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredMiner {
    /// The claim that owns the miner.
    pub claim: ClaimId,
    /// The miner itself.
    pub miner: EquipmentId,
    /// Hashing power at registration.
    pub rated_hash_power: u64,
}

/// The outcome of one draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LotteryWin {
    /// The winning miner's claim.
    pub claim: ClaimId,
    /// The winning miner.
    pub miner: EquipmentId,
    /// Distance between the winning guess and the drawn number.
    pub distance: u64,
}

/// System-wide miner registry and reward parameters.
#[derive(Debug, Clone)]
pub struct RewardLottery {
    /// Registered miners in registration order.
    miners: Vec<RegisteredMiner>,
    /// Sum of rated hashing power. Only grows.
    total_hash_power: u64,
    /// Smallest non-zero rated hashing power registered.
    min_hash_power: Option<u64>,
    /// Bitcoin paid per block.
    reward_btc: Decimal,
    /// USD per BTC.
    exchange_rate: Decimal,
}

impl RewardLottery {
    /// Create a lottery with no miners.
    pub const fn new(reward_btc: Decimal, exchange_rate: Decimal) -> Self {
        Self {
            miners: Vec::new(),
            total_hash_power: 0,
            min_hash_power: None,
            reward_btc,
            exchange_rate,
        }
    }

    /// Bitcoin paid per block.
    pub const fn reward_btc(&self) -> Decimal {
        self.reward_btc
    }

    /// USD value of one block reward.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn reward_usd(&self) -> Result<Decimal, EconomyError> {
        self.reward_btc
            .checked_mul(self.exchange_rate)
            .ok_or(EconomyError::ArithmeticOverflow)
    }

    /// USD per BTC.
    pub const fn exchange_rate(&self) -> Decimal {
        self.exchange_rate
    }

    /// Sum of every registered miner's rated hashing power.
    pub const fn total_hash_power(&self) -> u64 {
        self.total_hash_power
    }

    /// Smallest rated hashing power registered, used as the guess divisor.
    pub const fn min_hash_power(&self) -> Option<u64> {
        self.min_hash_power
    }

    /// Registered miners in registration order.
    pub fn miners(&self) -> &[RegisteredMiner] {
        &self.miners
    }

    /// Add a miner. There is no way to remove one.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] if the total overflows.
    pub fn register(&mut self, entry: RegisteredMiner) -> Result<(), EconomyError> {
        let total = self
            .total_hash_power
            .checked_add(entry.rated_hash_power)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        self.total_hash_power = total;
        if entry.rated_hash_power > 0 {
            self.min_hash_power = Some(
                self.min_hash_power
                    .map_or(entry.rated_hash_power, |min| min.min(entry.rated_hash_power)),
            );
        }
        debug!(
            claim = %entry.claim,
            miner = %entry.miner,
            rated = entry.rated_hash_power,
            total,
            "miner registered with lottery"
        );
        self.miners.push(entry);
        Ok(())
    }

    /// Run one draw.
    ///
    /// `active_hash_power` reports each miner's current hashing power.
    /// Returns `None` when no miner had a guess.
    pub fn draw<R, F>(&self, mut active_hash_power: F, rng: &mut R) -> Option<LotteryWin>
    where
        R: Rng + ?Sized,
        F: FnMut(&RegisteredMiner) -> u64,
    {
        let divisor = self.min_hash_power?;
        let lucky = rng.random_range(0..DRAW_RANGE);

        let mut best: Option<LotteryWin> = None;
        for entry in &self.miners {
            let guesses = active_hash_power(entry).checked_div(divisor).unwrap_or(0);
            for _ in 0..guesses {
                let guess = rng.random_range(0..DRAW_RANGE);
                let distance = guess.abs_diff(lucky);
                if best.is_none_or(|win| distance < win.distance) {
                    best = Some(LotteryWin {
                        claim: entry.claim,
                        miner: entry.miner,
                        distance,
                    });
                }
            }
        }
        best
    }

    /// Expected USD earned by `hash_power` over `blocks` block periods:
    /// `hash_power / total * reward * blocks * exchange_rate`.
    ///
    /// Zero when no hashing power is registered.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
    pub fn expected_profit(&self, hash_power: Decimal, blocks: u32) -> Result<Decimal, EconomyError> {
        if self.total_hash_power == 0 {
            return Ok(Decimal::ZERO);
        }
        hash_power
            .checked_div(Decimal::from(self.total_hash_power))
            .and_then(|share| share.checked_mul(self.reward_btc))
            .and_then(|btc| btc.checked_mul(Decimal::from(blocks)))
            .and_then(|btc| btc.checked_mul(self.exchange_rate))
            .ok_or(EconomyError::ArithmeticOverflow)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::collections::BTreeMap;

    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use rust_decimal_macros::dec;

    use super::*;

    fn lottery() -> RewardLottery {
        RewardLottery::new(dec!(6.5), dec!(23000))
    }

    fn entry(rated: u64) -> RegisteredMiner {
        RegisteredMiner {
            claim: ClaimId::new(),
            miner: EquipmentId::new(),
            rated_hash_power: rated,
        }
    }

    #[test]
    fn registration_tracks_total_and_min() {
        let mut lottery = lottery();
        assert_eq!(lottery.min_hash_power(), None);
        lottery.register(entry(14)).unwrap();
        lottery.register(entry(7)).unwrap();
        lottery.register(entry(28)).unwrap();
        assert_eq!(lottery.total_hash_power(), 49);
        assert_eq!(lottery.min_hash_power(), Some(7));
        assert_eq!(lottery.miners().len(), 3);
    }

    #[test]
    fn empty_lottery_has_no_winner() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(lottery().draw(|_| 14, &mut rng).is_none());
    }

    #[test]
    fn sole_miner_always_wins() {
        let mut lottery = lottery();
        let only = entry(14);
        lottery.register(only).unwrap();
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..50 {
            let win = lottery.draw(|e| e.rated_hash_power, &mut rng).unwrap();
            assert_eq!(win.miner, only.miner);
            assert_eq!(win.claim, only.claim);
        }
    }

    #[test]
    fn unpowered_miner_never_wins() {
        let mut lottery = lottery();
        let dark = entry(14);
        let lit = entry(14);
        lottery.register(dark).unwrap();
        lottery.register(lit).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let win = lottery
                .draw(|e| if e.miner == dark.miner { 0 } else { e.rated_hash_power }, &mut rng)
                .unwrap();
            assert_eq!(win.miner, lit.miner);
        }
    }

    #[test]
    fn all_unpowered_means_no_winner() {
        let mut lottery = lottery();
        lottery.register(entry(14)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        assert!(lottery.draw(|_| 0, &mut rng).is_none());
    }

    #[test]
    fn more_power_wins_more_often() {
        let mut lottery = lottery();
        let small = entry(14);
        let big = entry(56);
        lottery.register(small).unwrap();
        lottery.register(big).unwrap();
        let mut rng = StdRng::seed_from_u64(2024);
        let mut wins: BTreeMap<EquipmentId, u32> = BTreeMap::new();
        for _ in 0..500 {
            let win = lottery.draw(|e| e.rated_hash_power, &mut rng).unwrap();
            *wins.entry(win.miner).or_default() += 1;
        }
        let small_wins = wins.get(&small.miner).copied().unwrap_or(0);
        let big_wins = wins.get(&big.miner).copied().unwrap_or(0);
        assert!(big_wins > small_wins * 2, "big {big_wins} small {small_wins}");
    }

    #[test]
    fn draws_are_reproducible_under_a_seed() {
        let mut lottery = lottery();
        for _ in 0..5 {
            lottery.register(entry(14)).unwrap();
        }
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .filter_map(|_| lottery.draw(|e| e.rated_hash_power, &mut rng))
                .map(|w| w.miner)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(11), run(11));
    }

    /// Every word is zero, so the drawn number and every guess are 0 and
    /// all guesses sit at the same distance.
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    #[test]
    fn ties_go_to_the_earlier_registered_miner() {
        let first = entry(14);
        let second = entry(14);

        let mut lottery = lottery();
        lottery.register(first).unwrap();
        lottery.register(second).unwrap();
        // `second` gets three guesses to `first`'s one; all are ties.
        let power = |e: &RegisteredMiner| {
            if e.miner == second.miner { 42 } else { 14 }
        };
        let win = lottery.draw(power, &mut ZeroRng).unwrap();
        assert_eq!(win.miner, first.miner);
        assert_eq!(win.distance, 0);

        // Registration order, not the id, decides.
        let mut reversed = RewardLottery::new(dec!(6.5), dec!(23000));
        reversed.register(second).unwrap();
        reversed.register(first).unwrap();
        let win = reversed.draw(power, &mut ZeroRng).unwrap();
        assert_eq!(win.miner, second.miner);
    }

    #[test]
    fn expected_profit_is_proportional() {
        let mut lottery = lottery();
        assert_eq!(lottery.expected_profit(dec!(14), 3).unwrap(), Decimal::ZERO);
        lottery.register(entry(14)).unwrap();
        lottery.register(entry(14)).unwrap();
        // Half the power, 2 blocks: 0.5 * 6.5 * 2 * 23000
        assert_eq!(lottery.expected_profit(dec!(14), 2).unwrap(), dec!(149500));
        assert_eq!(lottery.reward_usd().unwrap(), dec!(149500));
    }
}

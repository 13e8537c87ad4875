//! Bot personalities.
//!
//! A [`BotProfile`] fixes how often a bot analyses its claim, how much cash
//! it wants to keep relative to its equipment, and what share of its miners'
//! energy it wants to generate itself. Profiles are drawn at spawn from
//! [`ProfileBounds`].

use plotcoin_economy::ReportParams;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Granularity of randomly drawn ratios.
const RATIO_STEPS: u32 = 10_000;

/// Seconds per minute.
const SECONDS_PER_MINUTE: u64 = 60;

/// Which equipment an investing bot buys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentPolicy {
    /// Self-sustainable claims add miners; deficient claims add panels.
    #[default]
    MinersWhenSelfSustaining,
    /// Self-sustainable claims add panels; deficient claims add miners.
    PanelsWhenSelfSustaining,
}

/// Ranges that bot profiles are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileBounds {
    /// Shortest analysis window in minutes.
    pub min_window_mins: u32,
    /// Longest analysis window in minutes.
    pub max_window_mins: u32,
    /// Lowest cash ratio.
    pub min_cash_ratio: Decimal,
    /// Highest cash ratio.
    pub max_cash_ratio: Decimal,
    /// Lowest self-sustain ratio.
    pub min_self_sustain_ratio: Decimal,
    /// Highest self-sustain ratio.
    pub max_self_sustain_ratio: Decimal,
}

impl Default for ProfileBounds {
    fn default() -> Self {
        Self {
            min_window_mins: 5,
            max_window_mins: 10,
            min_cash_ratio: Decimal::ZERO,
            max_cash_ratio: Decimal::ONE,
            min_self_sustain_ratio: Decimal::ZERO,
            max_self_sustain_ratio: Decimal::ONE,
        }
    }
}

/// One bot's fixed decision parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    /// Minutes between analyses; also the window reports are computed over.
    pub window_mins: u32,
    /// The bot invests when `cash / equipment_value` exceeds this.
    pub cash_ratio: Decimal,
    /// Share of miner capacity the bot wants to self-generate.
    pub self_sustain_ratio: Decimal,
    /// Which equipment to buy when investing.
    pub policy: InvestmentPolicy,
}

impl BotProfile {
    /// Draw a profile uniformly from `bounds`.
    pub fn random<R: Rng + ?Sized>(bounds: &ProfileBounds, policy: InvestmentPolicy, rng: &mut R) -> Self {
        let window_mins = if bounds.max_window_mins > bounds.min_window_mins {
            rng.random_range(bounds.min_window_mins..=bounds.max_window_mins)
        } else {
            bounds.min_window_mins
        };
        Self {
            window_mins,
            cash_ratio: sample_ratio(bounds.min_cash_ratio, bounds.max_cash_ratio, rng),
            self_sustain_ratio: sample_ratio(
                bounds.min_self_sustain_ratio,
                bounds.max_self_sustain_ratio,
                rng,
            ),
            policy,
        }
    }

    /// Seconds between analyses.
    pub fn analysis_period_secs(&self) -> u64 {
        u64::from(self.window_mins.max(1)).saturating_mul(SECONDS_PER_MINUTE)
    }

    /// Inputs for this bot's plot reports.
    pub const fn report_params(&self, exchange_rate: Decimal) -> ReportParams {
        ReportParams {
            self_sustain_ratio: self.self_sustain_ratio,
            window_mins: self.window_mins,
            exchange_rate,
        }
    }
}

/// A value in `[low, high]` on a grid of `RATIO_STEPS` steps.
fn sample_ratio<R: Rng + ?Sized>(low: Decimal, high: Decimal, rng: &mut R) -> Decimal {
    if high <= low {
        return low;
    }
    let step = Decimal::from(rng.random_range(0..=RATIO_STEPS));
    high.checked_sub(low)
        .and_then(|span| span.checked_mul(step))
        .and_then(|scaled| scaled.checked_div(Decimal::from(RATIO_STEPS)))
        .and_then(|offset| low.checked_add(offset))
        .unwrap_or(low)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn random_profiles_respect_bounds() {
        let bounds = ProfileBounds::default();
        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..100 {
            let profile = BotProfile::random(&bounds, InvestmentPolicy::default(), &mut rng);
            assert!((5..=10).contains(&profile.window_mins));
            assert!(profile.cash_ratio >= Decimal::ZERO && profile.cash_ratio <= Decimal::ONE);
            assert!(profile.self_sustain_ratio >= Decimal::ZERO && profile.self_sustain_ratio <= Decimal::ONE);
        }
    }

    #[test]
    fn degenerate_bounds_collapse_to_low_end() {
        let bounds = ProfileBounds {
            min_window_mins: 7,
            max_window_mins: 7,
            min_cash_ratio: dec!(0.3),
            max_cash_ratio: dec!(0.3),
            min_self_sustain_ratio: dec!(0.8),
            max_self_sustain_ratio: dec!(0.2),
        };
        let mut rng = StdRng::seed_from_u64(0);
        let profile = BotProfile::random(&bounds, InvestmentPolicy::PanelsWhenSelfSustaining, &mut rng);
        assert_eq!(profile.window_mins, 7);
        assert_eq!(profile.cash_ratio, dec!(0.3));
        assert_eq!(profile.self_sustain_ratio, dec!(0.8));
        assert_eq!(profile.policy, InvestmentPolicy::PanelsWhenSelfSustaining);
    }

    #[test]
    fn analysis_period_is_window_in_seconds() {
        let profile = BotProfile {
            window_mins: 6,
            cash_ratio: dec!(0.5),
            self_sustain_ratio: dec!(0.5),
            policy: InvestmentPolicy::default(),
        };
        assert_eq!(profile.analysis_period_secs(), 360);
        assert_eq!(profile.report_params(dec!(23000)).window_mins, 6);
    }

    #[test]
    fn policy_serializes_snake_case() {
        let json = serde_json::to_string(&InvestmentPolicy::PanelsWhenSelfSustaining).ok();
        assert_eq!(json.as_deref(), Some("\"panels_when_self_sustaining\""));
    }
}

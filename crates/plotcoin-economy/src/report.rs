//! Per-period snapshots of a claim's production.
//!
//! A [`PlotReport`] freezes a claim's cumulative counters at one instant and
//! derives the deltas since the previous report. Bots read nothing else when
//! they decide what to do next.
//!
//! Key quantities:
//!
//! - **miner capacity**: what the claim's miners would draw over the
//!   analysis window, counted in whole hours (at least one).
//! - **target**: `floor(capacity * self_sustain_ratio)` watt-hours that must
//!   come from the claim's own panels.
//! - **surplus**: self-generated energy beyond the target; zero whenever the
//!   claim is not self-sustainable.
//! - **average watt cost**: USD value of the bitcoin mined this period per
//!   watt-hour consumed.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::error::EconomyError;

/// Minutes per hour.
const MINUTES_PER_HOUR: u32 = 60;

/// Bot-specific inputs to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportParams {
    /// Share of miner capacity that must be self-generated, in `[0, 1]`.
    pub self_sustain_ratio: Decimal,
    /// Length of the analysis window in minutes.
    pub window_mins: u32,
    /// USD per BTC.
    pub exchange_rate: Decimal,
}

/// The raw counters a report is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportInputs {
    /// Cash balance in USD.
    pub cash: Decimal,
    /// Cumulative energy produced by the claim's own panels, in Wh.
    pub self_produced_energy: u64,
    /// Cumulative energy received through contracts, in Wh.
    pub imported_energy: u64,
    /// Cumulative bitcoin mined.
    pub bitcoin_produced: Decimal,
    /// Sum of every installed item's price.
    pub equipment_value: Decimal,
    /// Sum of every miner's hourly energy usage, in Wh.
    pub miner_energy_usage: u64,
}

/// An immutable production snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotReport {
    /// Cash balance at snapshot time.
    pub cash: Decimal,
    /// Cumulative self-produced energy at snapshot time.
    pub cumulative_self_produced: u64,
    /// Cumulative self-produced plus imported energy at snapshot time.
    pub cumulative_total_energy: u64,
    /// Cumulative bitcoin at snapshot time.
    pub cumulative_bitcoin: Decimal,
    /// Self-produced energy since the previous report.
    pub self_generated: u64,
    /// Total energy (own plus imported) since the previous report.
    pub total_energy: u64,
    /// Bitcoin mined since the previous report.
    pub bitcoin_mined: Decimal,
    /// Miner draw over the analysis window.
    pub miner_capacity: u64,
    /// Self-generated energy required to count as self-sustainable.
    pub target_self_generated: u64,
    /// Whether `self_generated >= target_self_generated`.
    pub self_sustainable: bool,
    /// Self-generated energy beyond the target.
    pub surplus_energy: u64,
    /// USD earned per watt-hour this period.
    pub avg_watt_cost: Decimal,
    /// Sum of installed equipment prices.
    pub equipment_value: Decimal,
}

impl PlotReport {
    /// Compute a report from current counters and the previous report.
    ///
    /// The first report (no `previous`) treats the cumulative counters as
    /// this period's deltas.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::CounterRegressed`] or
    /// [`EconomyError::NegativeBitcoinDelta`] if a cumulative counter is
    /// below its previous value, and [`EconomyError::ArithmeticOverflow`] on
    /// overflow.
    pub fn compute(
        inputs: &ReportInputs,
        previous: Option<&Self>,
        params: &ReportParams,
    ) -> Result<Self, EconomyError> {
        let cumulative_total_energy = inputs
            .self_produced_energy
            .checked_add(inputs.imported_energy)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        let (prev_self, prev_total, prev_btc) = previous.map_or((0, 0, Decimal::ZERO), |p| {
            (
                p.cumulative_self_produced,
                p.cumulative_total_energy,
                p.cumulative_bitcoin,
            )
        });

        let self_generated = delta("self-produced energy", prev_self, inputs.self_produced_energy)?;
        let total_energy = delta("total energy", prev_total, cumulative_total_energy)?;
        let bitcoin_mined = inputs
            .bitcoin_produced
            .checked_sub(prev_btc)
            .ok_or(EconomyError::ArithmeticOverflow)?;
        if bitcoin_mined < Decimal::ZERO {
            return Err(EconomyError::NegativeBitcoinDelta {
                delta: bitcoin_mined,
            });
        }

        let miner_capacity = miner_capacity(inputs.miner_energy_usage, params.window_mins)?;
        let target_self_generated = Decimal::from(miner_capacity)
            .checked_mul(params.self_sustain_ratio)
            .and_then(|target| target.floor().to_u64())
            .ok_or(EconomyError::ArithmeticOverflow)?;

        let self_sustainable = self_generated >= target_self_generated;
        let surplus_energy = if self_sustainable {
            self_generated.saturating_sub(target_self_generated)
        } else {
            0
        };

        let avg_watt_cost = if total_energy == 0 {
            Decimal::ZERO
        } else {
            bitcoin_mined
                .checked_div(Decimal::from(total_energy))
                .and_then(|per_watt| per_watt.checked_mul(params.exchange_rate))
                .ok_or(EconomyError::ArithmeticOverflow)?
        };

        Ok(Self {
            cash: inputs.cash,
            cumulative_self_produced: inputs.self_produced_energy,
            cumulative_total_energy,
            cumulative_bitcoin: inputs.bitcoin_produced,
            self_generated,
            total_energy,
            bitcoin_mined,
            miner_capacity,
            target_self_generated,
            self_sustainable,
            surplus_energy,
            avg_watt_cost,
            equipment_value: inputs.equipment_value,
        })
    }
}

/// Energy the miners draw over a window of `window_mins`, counted in whole
/// hours with a minimum of one hour.
///
/// # Errors
///
/// Returns [`EconomyError::ArithmeticOverflow`] on overflow.
pub fn miner_capacity(hourly_usage: u64, window_mins: u32) -> Result<u64, EconomyError> {
    let hours = window_mins.checked_div(MINUTES_PER_HOUR).unwrap_or(0).max(1);
    hourly_usage
        .checked_mul(u64::from(hours))
        .ok_or(EconomyError::ArithmeticOverflow)
}

fn delta(counter: &'static str, previous: u64, current: u64) -> Result<u64, EconomyError> {
    current
        .checked_sub(previous)
        .ok_or(EconomyError::CounterRegressed {
            counter,
            previous,
            current,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn params(ratio: Decimal) -> ReportParams {
        ReportParams {
            self_sustain_ratio: ratio,
            window_mins: 5,
            exchange_rate: dec!(23000),
        }
    }

    fn inputs(self_produced: u64, imported: u64, btc: Decimal) -> ReportInputs {
        ReportInputs {
            cash: dec!(1000),
            self_produced_energy: self_produced,
            imported_energy: imported,
            bitcoin_produced: btc,
            equipment_value: dec!(2250),
            miner_energy_usage: 1372,
        }
    }

    #[test]
    fn capacity_counts_at_least_one_hour() {
        assert_eq!(miner_capacity(1372, 5).unwrap(), 1372);
        assert_eq!(miner_capacity(1372, 59).unwrap(), 1372);
        assert_eq!(miner_capacity(1372, 150).unwrap(), 2744);
        assert_eq!(miner_capacity(0, 600).unwrap(), 0);
    }

    #[test]
    fn first_report_uses_raw_counters() {
        let report = PlotReport::compute(&inputs(800, 200, dec!(6.5)), None, &params(dec!(0.5))).unwrap();
        assert_eq!(report.self_generated, 800);
        assert_eq!(report.total_energy, 1000);
        assert_eq!(report.bitcoin_mined, dec!(6.5));
        assert_eq!(report.target_self_generated, 686);
        assert!(report.self_sustainable);
        assert_eq!(report.surplus_energy, 114);
        assert_eq!(report.equipment_value, dec!(2250));
    }

    #[test]
    fn later_reports_use_deltas() {
        let p = params(dec!(0.5));
        let first = PlotReport::compute(&inputs(800, 0, dec!(0)), None, &p).unwrap();
        let second = PlotReport::compute(&inputs(1000, 100, dec!(1)), Some(&first), &p).unwrap();
        assert_eq!(second.self_generated, 200);
        assert_eq!(second.total_energy, 300);
        assert_eq!(second.bitcoin_mined, dec!(1));
        assert!(!second.self_sustainable);
        assert_eq!(second.surplus_energy, 0);
        // 1 BTC / 300 Wh * 23000 USD/BTC
        assert_eq!(second.avg_watt_cost, dec!(1) / dec!(300) * dec!(23000));
    }

    #[test]
    fn meeting_the_target_exactly_is_sustainable() {
        let report = PlotReport::compute(&inputs(686, 0, dec!(0)), None, &params(dec!(0.5))).unwrap();
        assert!(report.self_sustainable);
        assert_eq!(report.surplus_energy, 0);
    }

    #[test]
    fn no_energy_means_zero_watt_cost() {
        let report = PlotReport::compute(&inputs(0, 0, dec!(6.5)), None, &params(dec!(0))).unwrap();
        assert_eq!(report.avg_watt_cost, Decimal::ZERO);
    }

    #[test]
    fn surplus_is_zero_when_not_sustainable() {
        for self_produced in [0_u64, 100, 500, 685] {
            for ratio in [dec!(0.5), dec!(0.9), dec!(1)] {
                let report = PlotReport::compute(&inputs(self_produced, 0, dec!(0)), None, &params(ratio)).unwrap();
                if !report.self_sustainable {
                    assert_eq!(report.surplus_energy, 0);
                }
            }
        }
    }

    #[test]
    fn regressed_counters_are_rejected() {
        let p = params(dec!(0.5));
        let first = PlotReport::compute(&inputs(800, 0, dec!(2)), None, &p).unwrap();
        let energy = PlotReport::compute(&inputs(700, 0, dec!(2)), Some(&first), &p);
        assert!(matches!(energy, Err(EconomyError::CounterRegressed { .. })));
        let bitcoin = PlotReport::compute(&inputs(800, 0, dec!(1)), Some(&first), &p);
        assert!(matches!(bitcoin, Err(EconomyError::NegativeBitcoinDelta { .. })));
    }
}

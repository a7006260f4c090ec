//! Numeric derivations from raw node status.

use std::fmt;

use crate::config::MetricLayout;

/// Drops per XRP.
pub const DROPS_PER_XRP: f64 = 1e6;
/// Decimal places kept for progress expressed as a fraction.
pub const FRACTION_DECIMALS: i32 = 5;
/// Decimal places kept for progress expressed as a percentage.
pub const PERCENT_DECIMALS: i32 = 6;

/// Unit of the published sync progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressScale {
    /// `0.0..=1.0`, rounded to [`FRACTION_DECIMALS`].
    Fraction,
    /// `0.0..=100.0`, rounded to [`PERCENT_DECIMALS`].
    Percent,
}

impl ProgressScale {
    pub fn for_layout(layout: MetricLayout) -> Self {
        match layout {
            MetricLayout::Single => ProgressScale::Fraction,
            MetricLayout::Multi => ProgressScale::Percent,
        }
    }
}

/// Contiguous span of ledgers a node holds, from `complete_ledgers`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LedgerRange {
    pub from: u64,
    pub to: u64,
}

impl LedgerRange {
    /// Parses `"<from>-<to>"`. Anything that does not split into exactly
    /// two unsigned integers (`"empty"`, `"1-5,7-9"`, ...) yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split('-');
        let from = parts.next()?.parse().ok()?;
        let to = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self { from, to })
    }

    /// `to - from`; negative if the node reports an inverted range.
    pub fn total(&self) -> f64 {
        self.to as f64 - self.from as f64
    }

    /// `(to - from) / to` in the requested unit, or `None` when the result
    /// is not a finite number (e.g. `to == 0`).
    pub fn progress(&self, scale: ProgressScale) -> Option<f64> {
        let fraction = self.total() / self.to as f64;
        let value = match scale {
            ProgressScale::Fraction => round_to(fraction, FRACTION_DECIMALS),
            ProgressScale::Percent => round_to(fraction * 100.0, PERCENT_DECIMALS),
        };
        value.is_finite().then_some(value)
    }
}

impl fmt::Display for LedgerRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

/// Converts a base fee in XRP to whole drops, rounding up.
///
/// The product is first snapped to a micro-drop grid so binary noise such
/// as `12.000000000000002` does not round up to an extra drop. Fractions
/// below 5e-7 of a drop are therefore truncated rather than rounded up.
pub fn fee_drops(base_fee_xrp: f64) -> Option<u64> {
    if !base_fee_xrp.is_finite() || base_fee_xrp < 0.0 {
        return None;
    }
    let drops = round_to(base_fee_xrp * DROPS_PER_XRP, 6);
    Some(drops.ceil() as u64)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

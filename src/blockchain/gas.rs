//! Gas over-provisioning policy.
//!
//! The aggregator's gas limit and gas price are both scaled by one factor
//! before signing. The factor is held in basis points so the scaling is exact
//! integer math, rounded down.

use serde::Serialize;

const BPS_DENOMINATOR: u64 = 10_000;

/// Multiplier applied to suggested gas limit and gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GasMultiplier {
    bps: u64,
}

impl GasMultiplier {
    /// 1.5x, the default over-provisioning.
    pub const DEFAULT: GasMultiplier = GasMultiplier { bps: 15_000 };

    /// Build from a factor such as `1.5`, rounded to the nearest basis point.
    /// Factors below 1.0 (or not finite) are rejected.
    pub fn from_factor(factor: f64) -> Option<Self> {
        if !factor.is_finite() || factor < 1.0 {
            return None;
        }
        let bps = (factor * BPS_DENOMINATOR as f64).round();
        if bps > u64::MAX as f64 {
            return None;
        }
        Some(Self { bps: bps as u64 })
    }

    /// floor(gas_limit × factor), saturating at `u64::MAX`.
    pub fn apply_gas_limit(&self, gas_limit: u64) -> u64 {
        let scaled = gas_limit as u128 * self.bps as u128 / BPS_DENOMINATOR as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// floor(gas_price × factor), saturating at `u128::MAX`.
    pub fn apply_gas_price(&self, gas_price: u128) -> u128 {
        let denom = BPS_DENOMINATOR as u128;
        let bps = self.bps as u128;
        // x = q·d + r  ⇒  floor(x·b/d) = q·b + floor(r·b/d)
        let q = gas_price / denom;
        let r = gas_price % denom;
        q.saturating_mul(bps).saturating_add(r * bps / denom)
    }
}

impl Default for GasMultiplier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for GasMultiplier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x", self.bps as f64 / BPS_DENOMINATOR as f64)
    }
}

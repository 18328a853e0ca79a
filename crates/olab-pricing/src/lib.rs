//! Price calculator for lens orders.
//!
//! # Design invariant
//!
//! Every amount on this surface is an `i64` in integer minor currency units;
//! no `f64` appears anywhere in pricing. Rounding is half-up at the minor
//! unit, in integer arithmetic, applied uniformly to the discount and the
//! urgency surcharge.
//!
//! The computation order is fixed and observable in the persisted
//! [`PriceBreakdown`]:
//!
//! 1. `base = Σ unit_price(characteristic) × quantity` over OD and OS.
//! 2. `discount = round(base × discount_pct / 100)`, subtracted from base.
//! 3. Urgent only: `surcharge = round(after_discount × 25 / 100)` — computed
//!    against the **discounted** amount, never the pre-discount base.
//! 4. `total = after_discount + surcharge`.

use std::collections::BTreeMap;

use olab_schemas::{LensConfig, PriceBreakdown};
use serde::{Deserialize, Serialize};

/// Urgency surcharge percent applied after the discount.
pub const URGENT_SURCHARGE_PCT: u32 = 25;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Lens characteristic → unit price in minor currency units.
///
/// Read-only input to the calculator; sampled at order creation or in-window
/// edit time and never consulted again for an already-priced order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    prices: BTreeMap<String, i64>,
}

impl Catalog {
    pub fn new(prices: BTreeMap<String, i64>) -> Self {
        Self { prices }
    }

    pub fn unit_price(&self, characteristic: &str) -> Option<i64> {
        self.prices.get(characteristic).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }
}

impl FromIterator<(String, i64)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self {
            prices: iter.into_iter().collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// PricingError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// The catalog has no entry for this characteristic.
    #[error("unknown lens characteristic: {0}")]
    UnknownCharacteristic(String),

    /// Combined OD+OS quantity is zero.
    #[error("order must contain at least one lens")]
    EmptyOrder,

    /// Discount percent outside 0–100.
    #[error("discount percent out of range: {0}")]
    DiscountOutOfRange(u32),

    /// Quantity × unit price overflowed the i64 amount range.
    #[error("price amount out of range")]
    AmountOutOfRange,
}

// ---------------------------------------------------------------------------
// Rounding
// ---------------------------------------------------------------------------

/// `value × pct / 100`, rounded half-up at the minor unit.
///
/// `value` must be non-negative; all order amounts are.
pub fn pct_half_up(value: i64, pct: u32) -> Result<i64, PricingError> {
    debug_assert!(value >= 0, "amounts are non-negative");
    let scaled = value
        .checked_mul(i64::from(pct))
        .ok_or(PricingError::AmountOutOfRange)?;
    Ok((scaled + 50) / 100)
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// Compute the full price breakdown for one lens configuration.
///
/// `discount_pct` is the owning party's percent (callers substitute the
/// default when no party is resolved). The returned breakdown is what gets
/// persisted on the order.
pub fn quote(
    catalog: &Catalog,
    lens: &LensConfig,
    discount_pct: u32,
    urgent: bool,
) -> Result<PriceBreakdown, PricingError> {
    if lens.total_quantity() == 0 {
        return Err(PricingError::EmptyOrder);
    }
    if discount_pct > 100 {
        return Err(PricingError::DiscountOutOfRange(discount_pct));
    }

    let mut base: i64 = 0;
    for eye in [&lens.od, &lens.os] {
        if eye.quantity == 0 {
            continue;
        }
        let unit = catalog
            .unit_price(&eye.characteristic)
            .ok_or_else(|| PricingError::UnknownCharacteristic(eye.characteristic.clone()))?;
        let line = unit
            .checked_mul(i64::from(eye.quantity))
            .ok_or(PricingError::AmountOutOfRange)?;
        base = base.checked_add(line).ok_or(PricingError::AmountOutOfRange)?;
    }

    let discount_amount = pct_half_up(base, discount_pct)?;
    let after_discount = base - discount_amount;

    let surcharge_amount = if urgent {
        pct_half_up(after_discount, URGENT_SURCHARGE_PCT)?
    } else {
        0
    };

    Ok(PriceBreakdown {
        base,
        discount_pct,
        discount_amount,
        surcharge_amount,
        total: after_discount + surcharge_amount,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default discount percent applied when a party carries no explicit one.
pub const DEFAULT_DISCOUNT_PCT: u32 = 5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyKind {
    Clinic,
    IndependentDoctor,
}

/// A counterparty that owns orders and carries a discount percent.
///
/// Read-only to the pricing engine: the discount is sampled at order
/// creation (and in-window edit) time and snapshotted onto the order.
/// Mutating it is a separately guarded operation restricted to the top lab
/// role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub party_id: Uuid,
    pub name: String,
    pub kind: PartyKind,
    /// Whole percent, 0–100.
    pub discount_pct: u32,
    pub created_at: DateTime<Utc>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// All lifecycle states a manufacturing order can occupy.
///
/// `New` is initial; `Delivered` and `Cancelled` are terminal. The legal
/// transitions between these states are enforced by `olab-engine`, not here.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Created; still inside (or awaiting expiry of) the clinic edit window.
    New,
    /// On the lab floor.
    InProduction,
    /// Production complete; awaiting QC outcome or shipment.
    Ready,
    /// QC rejected the batch; returns to production.
    Rework,
    /// Handed to the carrier.
    Shipped,
    /// Carrier is delivering to the clinic.
    OutForDelivery,
    /// Receipt confirmed by the owning clinic. **Terminal.**
    Delivered,
    /// Abandoned before completion. **Terminal.**
    Cancelled,
}

impl OrderStatus {
    /// Returns `true` if no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Returns `true` in the states where defects may be recorded.
    pub fn accepts_defects(&self) -> bool {
        matches!(self, Self::InProduction | Self::Ready | Self::Rework)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProduction => "in_production",
            Self::Ready => "ready",
            Self::Rework => "rework",
            Self::Shipped => "shipped",
            Self::OutForDelivery => "out_for_delivery",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PaymentStatus
// ---------------------------------------------------------------------------

/// Payment axis. Fully independent of [`OrderStatus`]: transitions are free
/// in both directions and a delivered order may still be unpaid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Partial => "partial",
            Self::Paid => "paid",
        }
    }
}

// ---------------------------------------------------------------------------
// Lens configuration
// ---------------------------------------------------------------------------

/// One eye's lens requirements.
///
/// `characteristic` is the catalog key (material/geometry class) used for
/// pricing. The optical parameters are carried verbatim for the lab and are
/// never interpreted by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EyeSpec {
    pub characteristic: String,
    /// Number of lenses for this eye. May be zero for single-eye orders;
    /// the engine requires the combined OD+OS quantity to be ≥ 1.
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sphere: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cylinder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pupillary_distance: Option<String>,
}

/// Both eyes of one order: OD (right) and OS (left).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensConfig {
    pub od: EyeSpec,
    pub os: EyeSpec,
}

impl LensConfig {
    /// Combined lens count across both eyes.
    pub fn total_quantity(&self) -> u32 {
        self.od.quantity + self.os.quantity
    }
}

// ---------------------------------------------------------------------------
// Patient / delivery snapshots
// ---------------------------------------------------------------------------

/// Patient details captured on the order at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Pickup,
    Courier,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryInfo {
    pub method: DeliveryMethod,
    /// Required for courier delivery; validated by the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// ---------------------------------------------------------------------------
// PriceBreakdown
// ---------------------------------------------------------------------------

/// Point-in-time pricing snapshot, persisted on the order at creation (and
/// refreshed by an in-window config edit). All amounts are integer minor
/// currency units. Later catalog or discount changes never touch it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Σ unit_price × quantity over both eyes.
    pub base: i64,
    /// Discount percent applied (whole percent).
    pub discount_pct: u32,
    /// Half-up rounded discount amount subtracted from `base`.
    pub discount_amount: i64,
    /// Half-up rounded urgency surcharge on the discounted amount; zero for
    /// normal orders.
    pub surcharge_amount: i64,
    pub total: i64,
}

// ---------------------------------------------------------------------------
// DefectRecord
// ---------------------------------------------------------------------------

/// One appended defect entry. Immutable after creation except for the
/// `archived` acknowledgment flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefectRecord {
    pub defect_id: Uuid,
    /// Number of faulty units; always ≥ 1.
    pub quantity: u32,
    pub note: String,
    pub created_at: DateTime<Utc>,
    pub archived: bool,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// The order aggregate root.
///
/// Constructed and mutated only through `olab-engine`; the store treats it
/// as an opaque versioned value. `version` starts at 1 and is bumped by the
/// store on every successful mutation (optimistic concurrency token).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    /// Human-readable unique number, e.g. `LAB-20260805-0001`.
    pub order_number: String,
    pub status: OrderStatus,
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// Fixed at creation; never recomputed.
    pub edit_deadline: DateTime<Utc>,
    pub patient: PatientInfo,
    /// Owning clinic. `None` for independent practitioners.
    pub owner_org: Option<Uuid>,
    pub created_by: Uuid,
    pub lens: LensConfig,
    pub price: PriceBreakdown,
    pub payment: PaymentStatus,
    pub delivery: DeliveryInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Correlation id supplied by the external ordering system, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Origin tag, e.g. "bridge" for externally ingested orders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub production_done_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub defects: Vec<DefectRecord>,
    pub version: u64,
}

impl Order {
    /// Total defective units across non-archived ledger entries.
    pub fn open_defect_units(&self) -> u32 {
        self.defects
            .iter()
            .filter(|d| !d.archived)
            .map(|d| d.quantity)
            .sum()
    }
}

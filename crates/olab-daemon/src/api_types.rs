//! Request and response types for all olab-daemon HTTP endpoints.
//!
//! DTOs only — no business logic. The one projection rule lives in
//! [`OrderView::project`]: pricing fields are omitted entirely (not nulled)
//! for viewer roles without price visibility.

use chrono::{DateTime, Utc};
use olab_engine::{edit_window, OrderEdit};
use olab_schemas::{
    DefectRecord, DeliveryInfo, LensConfig, Order, OrderStatus, PatientInfo, PartyKind,
    PaymentStatus, PriceBreakdown, SubRole,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// OrderView
// ---------------------------------------------------------------------------

/// Order projection served to authenticated actors.
#[derive(Debug, Clone, Serialize)]
pub struct OrderView {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: OrderStatus,
    pub urgent: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub edit_deadline: DateTime<Utc>,
    /// Countdown for presentation layers; zero once the window has closed.
    pub edit_seconds_remaining: i64,
    pub patient: PatientInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<Uuid>,
    pub created_by: Uuid,
    pub lens: LensConfig,
    /// Omitted for roles without price visibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<PriceBreakdown>,
    pub payment: PaymentStatus,
    pub delivery: DeliveryInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub production_done_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipped_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    pub defects: Vec<DefectRecord>,
    pub version: u64,
}

impl OrderView {
    pub fn project(order: &Order, viewer: SubRole, now: DateTime<Utc>) -> Self {
        let price = olab_access::can_view_prices(viewer).then_some(order.price);
        Self {
            order_id: order.order_id,
            order_number: order.order_number.clone(),
            status: order.status,
            urgent: order.urgent,
            created_at: order.created_at,
            modified_at: order.modified_at,
            edit_deadline: order.edit_deadline,
            edit_seconds_remaining: edit_window::remaining(order.edit_deadline, now)
                .num_seconds(),
            patient: order.patient.clone(),
            owner_org: order.owner_org,
            created_by: order.created_by,
            lens: order.lens.clone(),
            price,
            payment: order.payment,
            delivery: order.delivery.clone(),
            notes: order.notes.clone(),
            external_id: order.external_id.clone(),
            source: order.source.clone(),
            tracking_number: order.tracking_number.clone(),
            production_started_at: order.production_started_at,
            production_done_at: order.production_done_at,
            shipped_at: order.shipped_at,
            delivered_at: order.delivered_at,
            defects: order.defects.clone(),
            version: order.version,
        }
    }
}

// ---------------------------------------------------------------------------
// Mutation requests
// ---------------------------------------------------------------------------

/// PATCH /v1/orders/{id} — partial edit plus an optional concurrency token.
#[derive(Debug, Clone, Deserialize)]
pub struct EditOrderRequest {
    #[serde(default)]
    pub expected_version: Option<u64>,
    #[serde(flatten)]
    pub edit: OrderEdit,
}

/// PATCH /v1/orders/{id}/status
#[derive(Debug, Clone, Deserialize)]
pub struct StatusRequest {
    pub to: OrderStatus,
    #[serde(default)]
    pub expected_version: Option<u64>,
}

/// PATCH /v1/orders/{id}/payment
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRequest {
    pub payment: PaymentStatus,
}

/// POST /v1/orders/{id}/defects
#[derive(Debug, Clone, Deserialize)]
pub struct AddDefectRequest {
    pub quantity: u32,
    #[serde(default)]
    pub note: String,
}

/// PATCH /v1/orders/{id}/defects/{defect_id}
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveDefectRequest {
    pub archived: bool,
}

// ---------------------------------------------------------------------------
// Party management
// ---------------------------------------------------------------------------

/// POST /v1/parties
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterPartyRequest {
    pub name: String,
    pub kind: PartyKind,
    #[serde(default)]
    pub discount_pct: Option<u32>,
    /// Fixes the party id; used to register independent practitioners under
    /// their actor id. A random id is assigned when absent.
    #[serde(default)]
    pub party_id: Option<Uuid>,
}

/// PATCH /v1/parties/{id}/discount
#[derive(Debug, Clone, Deserialize)]
pub struct DiscountRequest {
    pub discount_pct: u32,
}

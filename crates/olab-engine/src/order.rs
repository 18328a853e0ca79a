//! Order creation, in-window edits and payment updates.

use chrono::{DateTime, Utc};
use olab_access::Capabilities;
use olab_pricing::Catalog;
use olab_schemas::{
    Actor, DeliveryInfo, DeliveryMethod, LensConfig, Order, OrderStatus, PatientInfo,
    PaymentStatus,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{edit_window, transition::actor_owns_order, EngineError};

// ---------------------------------------------------------------------------
// CreateOrder
// ---------------------------------------------------------------------------

/// Everything a caller supplies to create an order. The engine adds identity,
/// pricing, the edit deadline and lifecycle bookkeeping.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateOrder {
    pub patient: PatientInfo,
    pub lens: LensConfig,
    #[serde(default)]
    pub urgent: bool,
    pub delivery: DeliveryInfo,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
}

fn validate_patient(patient: &PatientInfo) -> Result<(), EngineError> {
    if patient.name.trim().is_empty() {
        return Err(EngineError::validation("patient name is required"));
    }
    Ok(())
}

fn validate_delivery(delivery: &DeliveryInfo) -> Result<(), EngineError> {
    if delivery.method == DeliveryMethod::Courier
        && delivery.address.as_deref().map_or(true, |a| a.trim().is_empty())
    {
        return Err(EngineError::validation(
            "courier delivery requires an address",
        ));
    }
    Ok(())
}

/// Create a new order in the `new` state.
///
/// Requires `can_create_orders`. `created_by` is the creating principal —
/// a clinic actor, or the bridge's system principal for ingested orders.
/// The price breakdown is computed here, once, from the supplied catalog and
/// the owning party's discount percent, and persisted on the order; so is
/// the edit deadline. Both are snapshots — later catalog or discount changes
/// do not touch this order.
#[allow(clippy::too_many_arguments)]
pub fn create_order(
    req: CreateOrder,
    created_by: Uuid,
    caps: &Capabilities,
    owner_org: Option<Uuid>,
    discount_pct: u32,
    catalog: &Catalog,
    order_number: String,
    now: DateTime<Utc>,
) -> Result<Order, EngineError> {
    if !caps.can_create_orders {
        return Err(EngineError::Forbidden {
            capability: "can_create_orders",
        });
    }
    validate_patient(&req.patient)?;
    validate_delivery(&req.delivery)?;

    let price = olab_pricing::quote(catalog, &req.lens, discount_pct, req.urgent)?;

    Ok(Order {
        order_id: Uuid::new_v4(),
        order_number,
        status: OrderStatus::New,
        urgent: req.urgent,
        created_at: now,
        modified_at: now,
        edit_deadline: edit_window::edit_deadline(now, req.urgent),
        patient: req.patient,
        owner_org,
        created_by,
        lens: req.lens,
        price,
        payment: PaymentStatus::Unpaid,
        delivery: req.delivery,
        notes: req.notes,
        external_id: req.external_id,
        source: req.source,
        tracking_number: None,
        production_started_at: None,
        production_done_at: None,
        shipped_at: None,
        delivered_at: None,
        defects: Vec::new(),
        version: 1,
    })
}

// ---------------------------------------------------------------------------
// OrderEdit
// ---------------------------------------------------------------------------

/// Partial update of the clinic-editable fields. Absent fields are left
/// untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderEdit {
    #[serde(default)]
    pub patient: Option<PatientInfo>,
    #[serde(default)]
    pub lens: Option<LensConfig>,
    #[serde(default)]
    pub delivery: Option<DeliveryInfo>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl OrderEdit {
    pub fn is_empty(&self) -> bool {
        self.patient.is_none()
            && self.lens.is_none()
            && self.delivery.is_none()
            && self.notes.is_none()
    }
}

/// Apply an in-window edit on behalf of the owning clinic.
///
/// Requires `can_create_orders` plus ownership of the order. Editing the
/// lens configuration re-quotes the price from the current catalog and the
/// owning party's current discount percent — the only path that ever
/// recomputes a persisted price.
pub fn apply_edit(
    order: &mut Order,
    edit: OrderEdit,
    actor: &Actor,
    caps: &Capabilities,
    discount_pct: u32,
    catalog: &Catalog,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    if !caps.can_create_orders || !actor_owns_order(actor, order) {
        return Err(EngineError::Forbidden {
            capability: "can_create_orders",
        });
    }
    if !edit_window::is_editable(order.status, order.edit_deadline, now) {
        return Err(EngineError::EditWindowClosed {
            deadline: order.edit_deadline,
        });
    }
    if edit.is_empty() {
        return Err(EngineError::validation("edit contains no fields"));
    }

    if let Some(patient) = edit.patient {
        validate_patient(&patient)?;
        order.patient = patient;
    }
    if let Some(delivery) = edit.delivery {
        validate_delivery(&delivery)?;
        order.delivery = delivery;
    }
    if let Some(notes) = edit.notes {
        order.notes = Some(notes);
    }
    if let Some(lens) = edit.lens {
        // Re-quote before committing the new configuration.
        order.price = olab_pricing::quote(catalog, &lens, discount_pct, order.urgent)?;
        order.lens = lens;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Payment
// ---------------------------------------------------------------------------

/// Set the payment status. Transitions are free among the three values and
/// independent of the order's lifecycle status.
pub fn set_payment(
    order: &mut Order,
    to: PaymentStatus,
    caps: &Capabilities,
) -> Result<(), EngineError> {
    if !caps.can_change_payments {
        return Err(EngineError::Forbidden {
            capability: "can_change_payments",
        });
    }
    order.payment = to;
    Ok(())
}

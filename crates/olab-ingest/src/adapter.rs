use chrono::{DateTime, Utc};
use olab_pricing::Catalog;
use olab_schemas::{DeliveryInfo, DeliveryMethod, Order, PatientInfo};
use olab_store::{MemoryStore, PartyDirectory};
use tracing::info;
use uuid::Uuid;

use crate::{payload::{ExternalOrderRequest, ExternalOrderView}, status::to_external};
use olab_engine::EngineError;

/// Source tag stamped on every ingested order.
pub const SOURCE_BRIDGE: &str = "bridge";

/// Fixed principal recorded as the creator of ingested orders.
pub const BRIDGE_PRINCIPAL: Uuid = Uuid::nil();

/// External → internal projection of one order.
pub fn external_view(order: &Order) -> ExternalOrderView {
    ExternalOrderView {
        order_number: order.order_number.clone(),
        external_id: order.external_id.clone().unwrap_or_default(),
        status: to_external(order.status),
        total: order.price.total,
        edit_deadline: order.edit_deadline,
        created_at: order.created_at,
    }
}

/// Ingest one external order.
///
/// Owner resolution is a case-insensitive substring match on the supplied
/// clinic name; with no match the order is created without an owning
/// organization and the clinic name survives only as free text in the notes.
/// Creation runs through `olab_engine::create_order` exactly like a
/// first-party order.
pub fn ingest(
    req: ExternalOrderRequest,
    store: &MemoryStore,
    parties: &PartyDirectory,
    catalog: &Catalog,
    default_discount_pct: u32,
    now: DateTime<Utc>,
) -> Result<ExternalOrderView, EngineError> {
    if req.external_id.trim().is_empty() {
        return Err(EngineError::validation("external_id is required"));
    }

    let owner = req
        .clinic_name
        .as_deref()
        .and_then(|name| parties.find_fuzzy(name));
    let discount_pct = owner
        .as_ref()
        .map(|p| p.discount_pct)
        .unwrap_or(default_discount_pct);

    let notes = assemble_notes(&req, owner.is_none());

    let order = olab_engine::create_order(
        olab_engine::CreateOrder {
            patient: PatientInfo {
                name: req.patient.name,
                phone: req.patient.phone.unwrap_or_default(),
                email: req.patient.email,
                notes: req.patient.notes,
            },
            lens: req.lens,
            urgent: req.urgent,
            delivery: req.delivery.unwrap_or(DeliveryInfo {
                method: DeliveryMethod::Pickup,
                address: None,
            }),
            notes,
            external_id: Some(req.external_id),
            source: Some(SOURCE_BRIDGE.to_string()),
        },
        BRIDGE_PRINCIPAL,
        &olab_access::bridge_capabilities(),
        owner.as_ref().map(|p| p.party_id),
        discount_pct,
        catalog,
        store.next_order_number(now),
        now,
    )?;

    let view = external_view(&order);
    info!(
        order_number = %order.order_number,
        external_id = %view.external_id,
        owner_resolved = owner.is_some(),
        "ingested external order"
    );
    store.insert(order)?;
    Ok(view)
}

/// Every ingested order, newest first, in the external vocabulary.
pub fn list_external(store: &MemoryStore) -> Vec<ExternalOrderView> {
    store
        .list(&olab_store::OrderFilter {
            source: Some(SOURCE_BRIDGE.to_string()),
            ..olab_store::OrderFilter::default()
        })
        .iter()
        .map(external_view)
        .collect()
}

/// Fold the free-text extras (unresolved clinic name, creator, company,
/// tax id) into the order notes so nothing from the payload is dropped.
fn assemble_notes(req: &ExternalOrderRequest, clinic_unresolved: bool) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(notes) = &req.notes {
        if !notes.trim().is_empty() {
            parts.push(notes.trim().to_string());
        }
    }
    if clinic_unresolved {
        if let Some(clinic) = &req.clinic_name {
            if !clinic.trim().is_empty() {
                parts.push(format!("clinic: {}", clinic.trim()));
            }
        }
    }
    if let Some(creator) = &req.creator_name {
        if !creator.trim().is_empty() {
            match req.creator_email.as_deref().map(str::trim) {
                Some(email) if !email.is_empty() => {
                    parts.push(format!("ordered by: {} <{}>", creator.trim(), email));
                }
                _ => parts.push(format!("ordered by: {}", creator.trim())),
            }
        }
    }
    if let Some(company) = &req.company {
        if !company.trim().is_empty() {
            parts.push(format!("company: {}", company.trim()));
        }
    }
    if let Some(tax_id) = &req.tax_id {
        if !tax_id.trim().is_empty() {
            parts.push(format!("tax id: {}", tax_id.trim()));
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

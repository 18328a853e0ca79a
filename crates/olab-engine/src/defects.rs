//! Append-only defect ledger, owned by the order aggregate.
//!
//! A defect record never changes after creation except for its `archived`
//! acknowledgment flag, and never exists outside its order.

use chrono::{DateTime, Utc};
use olab_access::Capabilities;
use olab_schemas::{DefectRecord, Order};
use uuid::Uuid;

use crate::EngineError;

/// Append a defect to the order's ledger.
///
/// Requires `can_add_defects` and an order status that accepts defects
/// (`in_production`, `ready`, `rework`); quantity must be ≥ 1. Returns the
/// created record.
pub fn add_defect(
    order: &mut Order,
    quantity: u32,
    note: String,
    caps: &Capabilities,
    now: DateTime<Utc>,
) -> Result<DefectRecord, EngineError> {
    if !caps.can_add_defects {
        return Err(EngineError::Forbidden {
            capability: "can_add_defects",
        });
    }
    if !order.status.accepts_defects() {
        return Err(EngineError::validation(format!(
            "defects cannot be recorded while the order is {}",
            order.status
        )));
    }
    if quantity == 0 {
        return Err(EngineError::validation("defect quantity must be at least 1"));
    }

    let record = DefectRecord {
        defect_id: Uuid::new_v4(),
        quantity,
        note,
        created_at: now,
        archived: false,
    };
    order.defects.push(record.clone());
    Ok(record)
}

/// Set a defect's archived flag.
///
/// Requires `can_add_defects` only — no status constraint. Setting the flag
/// to its current value is a successful no-op returning the unchanged
/// record.
pub fn set_defect_archived(
    order: &mut Order,
    defect_id: Uuid,
    archived: bool,
    caps: &Capabilities,
) -> Result<DefectRecord, EngineError> {
    if !caps.can_add_defects {
        return Err(EngineError::Forbidden {
            capability: "can_add_defects",
        });
    }
    let record = order
        .defects
        .iter_mut()
        .find(|d| d.defect_id == defect_id)
        .ok_or(EngineError::NotFound { what: "defect" })?;
    record.archived = archived;
    Ok(record.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use olab_schemas::{OrderStatus, SubRole};

    fn t0() -> DateTime<Utc> {
        "2026-03-02T09:00:00Z".parse().unwrap()
    }

    fn order_in(status: OrderStatus) -> Order {
        let actor = olab_schemas::Actor::new(Uuid::new_v4(), SubRole::OpticManager, None);
        let caps = olab_access::resolve(SubRole::OpticManager);
        let catalog: olab_pricing::Catalog =
            [("std-1.5".to_string(), 40_000_i64)].into_iter().collect();
        let mut o = crate::create_order(
            crate::CreateOrder {
                patient: olab_schemas::PatientInfo {
                    name: "A. Tester".to_string(),
                    phone: "+100000001".to_string(),
                    email: None,
                    notes: None,
                },
                lens: olab_schemas::LensConfig {
                    od: olab_schemas::EyeSpec {
                        characteristic: "std-1.5".to_string(),
                        quantity: 1,
                        sphere: None,
                        cylinder: None,
                        axis: None,
                        addition: None,
                        pupillary_distance: None,
                    },
                    os: olab_schemas::EyeSpec {
                        characteristic: "std-1.5".to_string(),
                        quantity: 1,
                        sphere: None,
                        cylinder: None,
                        axis: None,
                        addition: None,
                        pupillary_distance: None,
                    },
                },
                urgent: false,
                delivery: olab_schemas::DeliveryInfo {
                    method: olab_schemas::DeliveryMethod::Pickup,
                    address: None,
                },
                notes: None,
                external_id: None,
                source: None,
            },
            actor.actor_id,
            &caps,
            None,
            5,
            &catalog,
            "LAB-20260302-0001".to_string(),
            t0(),
        )
        .unwrap();
        o.status = status;
        o
    }

    fn quality() -> Capabilities {
        olab_access::resolve(SubRole::LabQuality)
    }

    #[test]
    fn append_in_production() {
        let mut o = order_in(OrderStatus::InProduction);
        let d = add_defect(&mut o, 2, "edge chip".to_string(), &quality(), t0()).unwrap();
        assert_eq!(d.quantity, 2);
        assert!(!d.archived);
        assert_eq!(o.defects.len(), 1);
        assert_eq!(o.open_defect_units(), 2);
    }

    #[test]
    fn append_rejected_in_new() {
        let mut o = order_in(OrderStatus::New);
        let err = add_defect(&mut o, 1, "early".to_string(), &quality(), t0()).unwrap_err();
        assert_eq!(err.code(), "validation_failed");
        assert!(o.defects.is_empty());
    }

    #[test]
    fn append_rejected_after_shipping() {
        let mut o = order_in(OrderStatus::Shipped);
        assert!(add_defect(&mut o, 1, "late".to_string(), &quality(), t0()).is_err());
    }

    #[test]
    fn zero_quantity_rejected() {
        let mut o = order_in(OrderStatus::Ready);
        let err = add_defect(&mut o, 0, "none".to_string(), &quality(), t0()).unwrap_err();
        assert_eq!(err.code(), "validation_failed");
    }

    #[test]
    fn append_requires_capability() {
        let mut o = order_in(OrderStatus::InProduction);
        let engineer = olab_access::resolve(SubRole::LabEngineer);
        let err = add_defect(&mut o, 1, "nope".to_string(), &engineer, t0()).unwrap_err();
        assert_eq!(err.code(), "forbidden");
    }

    #[test]
    fn archive_toggle_is_idempotent() {
        let mut o = order_in(OrderStatus::Ready);
        let d = add_defect(&mut o, 3, "scratch".to_string(), &quality(), t0()).unwrap();

        let archived = set_defect_archived(&mut o, d.defect_id, true, &quality()).unwrap();
        assert!(archived.archived);

        // Same value again: still succeeds, record unchanged.
        let again = set_defect_archived(&mut o, d.defect_id, true, &quality()).unwrap();
        assert_eq!(again, archived);

        // Archived defects drop out of the open-unit count.
        assert_eq!(o.open_defect_units(), 0);
    }

    #[test]
    fn archive_needs_no_particular_status() {
        let mut o = order_in(OrderStatus::Ready);
        let d = add_defect(&mut o, 1, "haze".to_string(), &quality(), t0()).unwrap();
        o.status = OrderStatus::Delivered;
        assert!(set_defect_archived(&mut o, d.defect_id, true, &quality()).is_ok());
    }

    #[test]
    fn archive_unknown_defect_not_found() {
        let mut o = order_in(OrderStatus::Ready);
        let err = set_defect_archived(&mut o, Uuid::new_v4(), true, &quality()).unwrap_err();
        assert_eq!(err.code(), "not_found");
    }
}

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    RwLock,
};

use chrono::{DateTime, Utc};
use olab_engine::EngineError;
use olab_schemas::{DefectRecord, Order, OrderStatus, PaymentStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// OrderFilter
// ---------------------------------------------------------------------------

/// Optional listing filters. Absent fields match everything.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OrderFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
    #[serde(default)]
    pub org: Option<Uuid>,
    #[serde(default)]
    pub created_by: Option<Uuid>,
    #[serde(default)]
    pub source: Option<String>,
}

impl OrderFilter {
    fn matches(&self, order: &Order) -> bool {
        if let Some(status) = self.status {
            if order.status != status {
                return false;
            }
        }
        if let Some(org) = self.org {
            if order.owner_org != Some(org) {
                return false;
            }
        }
        if let Some(created_by) = self.created_by {
            if order.created_by != created_by {
                return false;
            }
        }
        if let Some(source) = &self.source {
            if order.source.as_deref() != Some(source.as_str()) {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Read projections
// ---------------------------------------------------------------------------

/// One row of the cross-order defect feed.
#[derive(Clone, Debug, Serialize)]
pub struct DefectFeedEntry {
    pub order_id: Uuid,
    pub order_number: String,
    pub defect: DefectRecord,
}

/// Flat payment row served to roles without kanban access.
#[derive(Clone, Debug, Serialize)]
pub struct PaymentRow {
    pub order_id: Uuid,
    pub order_number: String,
    pub patient_name: String,
    pub total: i64,
    pub payment: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Derived per-counterparty rollup. Organization-owned orders aggregate by
/// organization; organization-less orders aggregate by their creator.
#[derive(Clone, Debug, Serialize)]
pub struct CounterpartyAggregate {
    pub counterparty_id: Uuid,
    pub organization: bool,
    pub order_count: u64,
    /// Σ order totals, minor units.
    pub revenue: i64,
    /// Σ totals of orders not fully paid.
    pub unpaid_total: i64,
    pub last_order_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Owned, lock-guarded order arena with per-order version tokens.
#[derive(Debug, Default)]
pub struct MemoryStore {
    orders: RwLock<HashMap<Uuid, Order>>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next human-readable order number: date prefix plus a per-process
    /// monotonic sequence, e.g. `LAB-20260302-0001`.
    pub fn next_order_number(&self, now: DateTime<Utc>) -> String {
        let n = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        format!("LAB-{}-{:04}", now.format("%Y%m%d"), n)
    }

    /// Insert a freshly created order.
    pub fn insert(&self, order: Order) -> Result<(), EngineError> {
        let mut orders = self.write_locked();
        if orders.contains_key(&order.order_id) {
            return Err(EngineError::validation("order id already exists"));
        }
        orders.insert(order.order_id, order);
        Ok(())
    }

    pub fn get(&self, order_id: Uuid) -> Result<Order, EngineError> {
        self.read_locked()
            .get(&order_id)
            .cloned()
            .ok_or(EngineError::NotFound { what: "order" })
    }

    /// All matching orders, newest first.
    pub fn list(&self, filter: &OrderFilter) -> Vec<Order> {
        let mut out: Vec<Order> = self
            .read_locked()
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.order_number.cmp(&b.order_number)));
        out
    }

    /// Atomic read-modify-write against the order's current state.
    ///
    /// The closure runs under the write lock; on success the store bumps the
    /// order's `version` and `modified_at`. A failed closure leaves the
    /// stored order untouched. When `expected_version` is supplied and does
    /// not match the current version, the call fails with
    /// [`EngineError::Conflict`] before the closure runs.
    pub fn mutate<T>(
        &self,
        order_id: Uuid,
        expected_version: Option<u64>,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut Order) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut orders = self.write_locked();
        let current = orders
            .get(&order_id)
            .ok_or(EngineError::NotFound { what: "order" })?;

        if let Some(expected) = expected_version {
            if expected != current.version {
                return Err(EngineError::Conflict {
                    expected,
                    current: current.version,
                });
            }
        }

        let mut scratch = current.clone();
        let out = f(&mut scratch)?;
        scratch.version += 1;
        scratch.modified_at = now;
        orders.insert(order_id, scratch);
        Ok(out)
    }

    // -- projections --------------------------------------------------------

    /// Every defect across every order, newest first.
    pub fn defect_feed(&self) -> Vec<DefectFeedEntry> {
        let mut feed: Vec<DefectFeedEntry> = self
            .read_locked()
            .values()
            .flat_map(|o| {
                o.defects.iter().map(|d| DefectFeedEntry {
                    order_id: o.order_id,
                    order_number: o.order_number.clone(),
                    defect: d.clone(),
                })
            })
            .collect();
        feed.sort_by(|a, b| b.defect.created_at.cmp(&a.defect.created_at));
        feed
    }

    /// Flat payment projection, newest order first.
    pub fn payment_rows(&self) -> Vec<PaymentRow> {
        let mut rows: Vec<PaymentRow> = self
            .read_locked()
            .values()
            .map(|o| PaymentRow {
                order_id: o.order_id,
                order_number: o.order_number.clone(),
                patient_name: o.patient.name.clone(),
                total: o.price.total,
                payment: o.payment,
                created_at: o.created_at,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }

    /// Per-counterparty rollup over the whole order collection.
    pub fn counterparty_aggregates(&self) -> Vec<CounterpartyAggregate> {
        let mut by_key: HashMap<(Uuid, bool), CounterpartyAggregate> = HashMap::new();
        for order in self.read_locked().values() {
            let (id, organization) = match order.owner_org {
                Some(org) => (org, true),
                None => (order.created_by, false),
            };
            let entry = by_key
                .entry((id, organization))
                .or_insert_with(|| CounterpartyAggregate {
                    counterparty_id: id,
                    organization,
                    order_count: 0,
                    revenue: 0,
                    unpaid_total: 0,
                    last_order_at: order.created_at,
                });
            entry.order_count += 1;
            entry.revenue += order.price.total;
            if order.payment != PaymentStatus::Paid {
                entry.unpaid_total += order.price.total;
            }
            entry.last_order_at = entry.last_order_at.max(order.created_at);
        }
        let mut out: Vec<CounterpartyAggregate> = by_key.into_values().collect();
        out.sort_by(|a, b| b.last_order_at.cmp(&a.last_order_at));
        out
    }

    // -- lock helpers -------------------------------------------------------

    fn read_locked(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Order>> {
        match self.orders.read() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_locked(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Order>> {
        match self.orders.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use olab_schemas::{
        Actor, DeliveryInfo, DeliveryMethod, EyeSpec, LensConfig, PatientInfo, SubRole,
    };

    fn t0() -> DateTime<Utc> {
        "2026-03-02T09:00:00Z".parse().unwrap()
    }

    fn make_order(store: &MemoryStore, urgent: bool) -> Order {
        let actor = Actor::new(Uuid::new_v4(), SubRole::OpticManager, Some(Uuid::new_v4()));
        let caps = olab_access::resolve(SubRole::OpticManager);
        let catalog: olab_pricing::Catalog =
            [("std-1.5".to_string(), 40_000_i64)].into_iter().collect();
        let order = olab_engine::create_order(
            olab_engine::CreateOrder {
                patient: PatientInfo {
                    name: "P. Example".to_string(),
                    phone: "+100000005".to_string(),
                    email: None,
                    notes: None,
                },
                lens: LensConfig {
                    od: EyeSpec {
                        characteristic: "std-1.5".to_string(),
                        quantity: 1,
                        sphere: None,
                        cylinder: None,
                        axis: None,
                        addition: None,
                        pupillary_distance: None,
                    },
                    os: EyeSpec {
                        characteristic: "std-1.5".to_string(),
                        quantity: 1,
                        sphere: None,
                        cylinder: None,
                        axis: None,
                        addition: None,
                        pupillary_distance: None,
                    },
                },
                urgent,
                delivery: DeliveryInfo {
                    method: DeliveryMethod::Pickup,
                    address: None,
                },
                notes: None,
                external_id: None,
                source: None,
            },
            actor.actor_id,
            &caps,
            actor.org,
            5,
            &catalog,
            store.next_order_number(t0()),
            t0(),
        )
        .unwrap();
        store.insert(order.clone()).unwrap();
        order
    }

    #[test]
    fn order_numbers_are_unique_and_date_prefixed() {
        let store = MemoryStore::new();
        let a = store.next_order_number(t0());
        let b = store.next_order_number(t0());
        assert_eq!(a, "LAB-20260302-0001");
        assert_eq!(b, "LAB-20260302-0002");
        assert_ne!(a, b);
    }

    #[test]
    fn mutate_bumps_version_and_modified_at() {
        let store = MemoryStore::new();
        let order = make_order(&store, false);
        assert_eq!(order.version, 1);

        let later = t0() + chrono::Duration::minutes(5);
        store
            .mutate(order.order_id, None, later, |o| {
                o.notes = Some("updated".to_string());
                Ok(())
            })
            .unwrap();

        let stored = store.get(order.order_id).unwrap();
        assert_eq!(stored.version, 2);
        assert_eq!(stored.modified_at, later);
        assert_eq!(stored.notes.as_deref(), Some("updated"));
    }

    #[test]
    fn stale_version_conflicts_before_the_closure_runs() {
        let store = MemoryStore::new();
        let order = make_order(&store, false);

        store
            .mutate(order.order_id, Some(1), t0(), |_| Ok(()))
            .unwrap();

        let err = store
            .mutate(order.order_id, Some(1), t0(), |_| -> Result<(), _> {
                panic!("closure must not run on version mismatch")
            })
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::Conflict {
                expected: 1,
                current: 2
            }
        );
    }

    #[test]
    fn failed_closure_leaves_order_untouched() {
        let store = MemoryStore::new();
        let order = make_order(&store, false);

        let err = store
            .mutate(order.order_id, None, t0(), |o| {
                o.notes = Some("must not persist".to_string());
                Err::<(), _>(EngineError::validation("boom"))
            })
            .unwrap_err();
        assert_eq!(err.code(), "validation_failed");

        let stored = store.get(order.order_id).unwrap();
        assert_eq!(stored.version, 1);
        assert!(stored.notes.is_none());
    }

    #[test]
    fn unknown_order_is_not_found() {
        let store = MemoryStore::new();
        assert_eq!(
            store.get(Uuid::new_v4()).unwrap_err().code(),
            "not_found"
        );
        assert_eq!(
            store
                .mutate(Uuid::new_v4(), None, t0(), |_| Ok(()))
                .unwrap_err()
                .code(),
            "not_found"
        );
    }

    #[test]
    fn list_filters_by_status_and_org() {
        let store = MemoryStore::new();
        let a = make_order(&store, false);
        let _b = make_order(&store, false);

        let all = store.list(&OrderFilter::default());
        assert_eq!(all.len(), 2);

        let by_org = store.list(&OrderFilter {
            org: a.owner_org,
            ..OrderFilter::default()
        });
        assert_eq!(by_org.len(), 1);
        assert_eq!(by_org[0].order_id, a.order_id);

        let shipped = store.list(&OrderFilter {
            status: Some(OrderStatus::Shipped),
            ..OrderFilter::default()
        });
        assert!(shipped.is_empty());
    }

    #[test]
    fn defect_feed_is_newest_first_across_orders() {
        let store = MemoryStore::new();
        let a = make_order(&store, false);
        let b = make_order(&store, false);
        let quality = olab_access::resolve(SubRole::LabQuality);

        for (order, minutes, note) in [(&a, 10, "first"), (&b, 30, "second"), (&a, 20, "third")] {
            let at = t0() + chrono::Duration::minutes(minutes);
            store
                .mutate(order.order_id, None, at, |o| {
                    o.status = OrderStatus::InProduction;
                    olab_engine::defects::add_defect(o, 1, note.to_string(), &quality, at)
                })
                .unwrap();
        }

        let feed = store.defect_feed();
        let notes: Vec<&str> = feed.iter().map(|e| e.defect.note.as_str()).collect();
        assert_eq!(notes, ["second", "third", "first"]);
    }

    #[test]
    fn aggregates_roll_up_revenue_and_unpaid() {
        let store = MemoryStore::new();
        let a = make_order(&store, false);
        let b = make_order(&store, false);

        // Pay order b in full.
        let accountant = olab_access::resolve(SubRole::LabAccountant);
        store
            .mutate(b.order_id, None, t0(), |o| {
                olab_engine::order::set_payment(o, PaymentStatus::Paid, &accountant)
            })
            .unwrap();

        let aggs = store.counterparty_aggregates();
        assert_eq!(aggs.len(), 2);

        let for_a = aggs
            .iter()
            .find(|x| Some(x.counterparty_id) == a.owner_org)
            .unwrap();
        assert_eq!(for_a.order_count, 1);
        assert_eq!(for_a.revenue, 76_000);
        assert_eq!(for_a.unpaid_total, 76_000);

        let for_b = aggs
            .iter()
            .find(|x| Some(x.counterparty_id) == b.owner_org)
            .unwrap();
        assert_eq!(for_b.unpaid_total, 0);
    }
}

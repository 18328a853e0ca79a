//! Permission resolver: sub-role → capability vector.
//!
//! One table-driven mapping consumed identically by every entry point. The
//! resolver is total over [`SubRole`] (exhaustive match, checked at compile
//! time) and fails closed at the wire boundary: an unrecognized role tag
//! resolves to the all-false vector, never to a permissive default.
//!
//! Two checks intentionally live outside the capability record:
//! [`can_edit_discounts`] (party discount mutation, top lab role only) and
//! [`can_view_prices`] (a data-exposure boundary — projections must omit
//! pricing fields entirely for roles where this is false).

use olab_schemas::SubRole;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// The fixed capability vector gating every mutating action.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_create_orders: bool,
    pub can_change_status: bool,
    pub can_mark_ready: bool,
    pub can_mark_rework: bool,
    pub can_ship: bool,
    pub can_deliver: bool,
    pub can_add_defects: bool,
    pub can_view_payments: bool,
    pub can_change_payments: bool,
    pub can_print: bool,
    pub can_view_kanban: bool,
    pub can_view_stats: bool,
}

impl Capabilities {
    /// The all-false vector. Unknown roles resolve to this.
    pub const fn none() -> Self {
        Self {
            can_create_orders: false,
            can_change_status: false,
            can_mark_ready: false,
            can_mark_rework: false,
            can_ship: false,
            can_deliver: false,
            can_add_defects: false,
            can_view_payments: false,
            can_change_payments: false,
            can_print: false,
            can_view_kanban: false,
            can_view_stats: false,
        }
    }

    /// Every capability set. lab_head and lab_admin map to this.
    pub const fn all() -> Self {
        Self {
            can_create_orders: true,
            can_change_status: true,
            can_mark_ready: true,
            can_mark_rework: true,
            can_ship: true,
            can_deliver: true,
            can_add_defects: true,
            can_view_payments: true,
            can_change_payments: true,
            can_print: true,
            can_view_kanban: true,
            can_view_stats: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolve a sub-role to its capability vector.
pub fn resolve(role: SubRole) -> Capabilities {
    match role {
        SubRole::LabHead | SubRole::LabAdmin => Capabilities::all(),

        SubRole::LabEngineer => Capabilities {
            can_change_status: true,
            can_mark_ready: true,
            can_print: true,
            can_view_kanban: true,
            ..Capabilities::none()
        },

        SubRole::LabQuality => Capabilities {
            can_add_defects: true,
            can_mark_rework: true,
            can_view_kanban: true,
            can_print: true,
            ..Capabilities::none()
        },

        SubRole::LabLogistics => Capabilities {
            can_deliver: true,
            can_view_kanban: true,
            ..Capabilities::none()
        },

        // Payment list only — no kanban; the daemon serves this role a flat
        // payment projection instead of the status board.
        SubRole::LabAccountant => Capabilities {
            can_view_payments: true,
            can_change_payments: true,
            ..Capabilities::none()
        },

        // Payments are lab-controlled downstream: the manager sees them but
        // cannot change them.
        SubRole::OpticManager => Capabilities {
            can_create_orders: true,
            can_view_payments: true,
            can_view_stats: true,
            ..Capabilities::none()
        },

        SubRole::OpticDoctor => Capabilities {
            can_create_orders: true,
            ..Capabilities::none()
        },

        SubRole::IndependentDoctor => Capabilities {
            can_create_orders: true,
            can_view_payments: true,
            ..Capabilities::none()
        },
    }
}

/// Resolve a raw wire tag. Unknown tags fail closed to [`Capabilities::none`].
pub fn resolve_tag(tag: &str) -> Capabilities {
    match SubRole::parse_tag(tag) {
        Some(role) => resolve(role),
        None => Capabilities::none(),
    }
}

/// Whether this role may register parties and mutate per-party discount
/// percents. Owned by the pricing context, not the order; restricted to the
/// top lab role.
pub fn can_edit_discounts(role: SubRole) -> bool {
    matches!(role, SubRole::LabHead)
}

/// Whether pricing fields may appear in projections served to this role.
///
/// False only for clinic doctors. Enforced by omitting the fields from the
/// serialized projection, not by hiding them in a UI.
pub fn can_view_prices(role: SubRole) -> bool {
    !matches!(role, SubRole::OpticDoctor)
}

/// Capability vector for the external ingestion bridge. The bridge is a
/// system principal that may only create orders.
pub fn bridge_capabilities() -> Capabilities {
    Capabilities {
        can_create_orders: true,
        ..Capabilities::none()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

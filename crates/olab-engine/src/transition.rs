//! Order status state machine.
//!
//! ```text
//!   new → in_production → ready → shipped → out_for_delivery → delivered
//!                           │  ▲
//!                           ▼  │
//!                          rework
//!   any non-terminal ──────────────────────────────────────→ cancelled
//! ```
//!
//! [`transition`] enforces, in this order:
//!
//! 1. **Permission.** The gate depends only on the destination, so an actor
//!    without the required capability receives [`EngineError::Forbidden`]
//!    regardless of the order's current state (no state probing).
//! 2. **Structure.** Any `(from, to)` pair outside the table fails
//!    [`EngineError::InvalidTransition`].
//! 3. **Timing.** `new → in_production` additionally requires the clinic
//!    edit window to be closed (or the order to be urgent).
//!
//! Side effects (lifecycle timestamps, tracking-number generation) are
//! applied only after all three checks pass.

use chrono::{DateTime, Utc};
use olab_access::Capabilities;
use olab_schemas::{Actor, Order, OrderStatus};
use uuid::Uuid;

use crate::{edit_window, EngineError};

// ---------------------------------------------------------------------------
// Destination gates
// ---------------------------------------------------------------------------

/// What authorizes a transition into a given destination state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Gate {
    /// A named capability bit from the resolver.
    Capability(&'static str),
    /// Self-service confirmation by the owning clinic actor.
    OwnerConfirmation,
}

/// The gate guarding each destination. Total over [`OrderStatus`]; `new` has
/// no inbound transition, so its gate only determines which error a caller
/// sees (`Forbidden` without `can_change_status`, `InvalidTransition` with).
fn destination_gate(to: OrderStatus) -> Gate {
    match to {
        OrderStatus::New => Gate::Capability("can_change_status"),
        OrderStatus::InProduction => Gate::Capability("can_change_status"),
        OrderStatus::Ready => Gate::Capability("can_mark_ready"),
        OrderStatus::Rework => Gate::Capability("can_mark_rework"),
        OrderStatus::Shipped => Gate::Capability("can_ship"),
        OrderStatus::OutForDelivery => Gate::Capability("can_deliver"),
        OrderStatus::Delivered => Gate::OwnerConfirmation,
        OrderStatus::Cancelled => Gate::Capability("can_change_status"),
    }
}

fn capability_bit(caps: &Capabilities, name: &'static str) -> bool {
    match name {
        "can_change_status" => caps.can_change_status,
        "can_mark_ready" => caps.can_mark_ready,
        "can_mark_rework" => caps.can_mark_rework,
        "can_ship" => caps.can_ship,
        "can_deliver" => caps.can_deliver,
        _ => false,
    }
}

/// Does this actor own the order (for self-service delivery confirmation)?
///
/// Organization-owned orders match on the actor's org; organization-less
/// orders (independent practitioners) match on the creator.
pub fn actor_owns_order(actor: &Actor, order: &Order) -> bool {
    match order.owner_org {
        Some(org) => actor.org == Some(org),
        None => actor.actor_id == order.created_by,
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Pure structural check against the transition table.
pub fn is_legal(from: OrderStatus, to: OrderStatus) -> bool {
    use OrderStatus::*;
    match (from, to) {
        (New, InProduction)
        | (InProduction, Ready)
        | (Ready, Rework)
        | (Rework, InProduction)
        | (Ready, Shipped)
        | (Shipped, OutForDelivery)
        | (OutForDelivery, Delivered) => true,
        (from, Cancelled) => !from.is_terminal(),
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// transition
// ---------------------------------------------------------------------------

/// Apply one status transition to the order.
///
/// # Errors
/// [`EngineError::Forbidden`] before any structural evaluation when the
/// actor lacks the destination's gate; [`EngineError::InvalidTransition`]
/// for pairs outside the table; [`EngineError::EditWindowClosed`] for an
/// early production start on a normal order.
pub fn transition(
    order: &mut Order,
    to: OrderStatus,
    actor: &Actor,
    caps: &Capabilities,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    // 1) Permission, keyed on destination only.
    match destination_gate(to) {
        Gate::Capability(name) => {
            if !capability_bit(caps, name) {
                return Err(EngineError::Forbidden { capability: name });
            }
        }
        Gate::OwnerConfirmation => {
            if !actor_owns_order(actor, order) {
                return Err(EngineError::Forbidden {
                    capability: "owner_confirmation",
                });
            }
        }
    }

    // 2) Structure.
    let from = order.status;
    if !is_legal(from, to) {
        return Err(EngineError::InvalidTransition { from, to });
    }

    // 3) Production may not start until the clinic's edit window has closed.
    if from == OrderStatus::New
        && to == OrderStatus::InProduction
        && !edit_window::production_eligible(order.urgent, order.edit_deadline, now)
    {
        return Err(EngineError::EditWindowClosed {
            deadline: order.edit_deadline,
        });
    }

    // 4) Side effects.
    match to {
        OrderStatus::InProduction if from == OrderStatus::New => {
            order.production_started_at = Some(now);
        }
        OrderStatus::Ready => {
            order.production_done_at = Some(now);
        }
        OrderStatus::Shipped => {
            if order.tracking_number.is_none() {
                order.tracking_number = Some(generate_tracking_number());
            }
            order.shipped_at = Some(now);
        }
        OrderStatus::Delivered => {
            order.delivered_at = Some(now);
        }
        _ => {}
    }
    order.status = to;

    Ok(())
}

/// Carrier-style tracking number, generated at ship time when the order does
/// not already carry one.
fn generate_tracking_number() -> String {
    let raw = Uuid::new_v4().simple().to_string();
    format!("TRK-{}", raw[..12].to_ascii_uppercase())
}

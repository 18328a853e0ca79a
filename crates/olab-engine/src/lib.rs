//! Order aggregate and lifecycle engine.
//!
//! Composes the three pure policies — capability resolution (`olab-access`),
//! the edit-window policy ([`edit_window`]) and the price calculator
//! (`olab-pricing`) — into the operations that create and mutate an order:
//! status transitions, in-window edits, payment updates and the append-only
//! defect ledger.
//!
//! Every function takes wall-clock time as an explicit `now` parameter; the
//! engine never reads the clock itself. Callers (the store's mutate closure)
//! are responsible for executing these operations atomically against the
//! order's current state.

pub mod defects;
pub mod edit_window;
mod error;
pub mod order;
pub mod transition;

pub use error::EngineError;
pub use order::{create_order, CreateOrder, OrderEdit};
pub use transition::{actor_owns_order, transition};

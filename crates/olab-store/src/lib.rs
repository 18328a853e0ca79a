//! In-memory order arena and party directory.
//!
//! The store owns every order behind one lock and exposes a single
//! read-modify-write entry point, [`MemoryStore::mutate`]: the closure runs
//! against the order's true current state under the write lock, so
//! transitions can never be applied to a stale read. Each order carries a
//! `version` token; a caller-supplied expected version that no longer
//! matches fails with a retryable `Conflict` before the closure runs.
//!
//! Operations on distinct orders are independent; no cross-order ordering is
//! guaranteed or needed.

mod orders;
mod parties;

pub use orders::{
    CounterpartyAggregate, DefectFeedEntry, MemoryStore, OrderFilter, PaymentRow,
};
pub use parties::PartyDirectory;

//! OptiLab HTTP daemon library.
//!
//! `main.rs` stays thin; everything testable lives here. Scenario tests in
//! `tests/` compose [`routes::build_router`] directly and drive it in-process
//! with `tower::ServiceExt::oneshot`.

pub mod api_types;
pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

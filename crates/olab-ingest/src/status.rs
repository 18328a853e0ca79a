use olab_schemas::OrderStatus;
use serde::{Deserialize, Serialize};

/// Status vocabulary spoken to the external ordering system.
///
/// Deliberately a separate enum even though the mapping is currently the
/// identity: internal states may grow without moving this boundary, and the
/// two exhaustive mapping functions below are the only place the coupling
/// lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalStatus {
    New,
    InProduction,
    Ready,
    Rework,
    Shipped,
    OutForDelivery,
    Delivered,
    Cancelled,
}

/// Internal → external. Total over [`OrderStatus`].
pub fn to_external(status: OrderStatus) -> ExternalStatus {
    match status {
        OrderStatus::New => ExternalStatus::New,
        OrderStatus::InProduction => ExternalStatus::InProduction,
        OrderStatus::Ready => ExternalStatus::Ready,
        OrderStatus::Rework => ExternalStatus::Rework,
        OrderStatus::Shipped => ExternalStatus::Shipped,
        OrderStatus::OutForDelivery => ExternalStatus::OutForDelivery,
        OrderStatus::Delivered => ExternalStatus::Delivered,
        OrderStatus::Cancelled => ExternalStatus::Cancelled,
    }
}

/// External → internal. Total over [`ExternalStatus`].
pub fn to_internal(status: ExternalStatus) -> OrderStatus {
    match status {
        ExternalStatus::New => OrderStatus::New,
        ExternalStatus::InProduction => OrderStatus::InProduction,
        ExternalStatus::Ready => OrderStatus::Ready,
        ExternalStatus::Rework => OrderStatus::Rework,
        ExternalStatus::Shipped => OrderStatus::Shipped,
        ExternalStatus::OutForDelivery => OrderStatus::OutForDelivery,
        ExternalStatus::Delivered => OrderStatus::Delivered,
        ExternalStatus::Cancelled => OrderStatus::Cancelled,
    }
}

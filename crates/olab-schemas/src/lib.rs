//! Shared domain types for the OptiLab order engine.
//!
//! Plain data only: every type here is `Serialize + Deserialize` and carries
//! no behaviour beyond small predicate helpers. Business rules live in
//! `olab-engine`; capability resolution lives in `olab-access`.

mod actor;
mod order;
mod party;

pub use actor::{Actor, SubRole};
pub use order::{
    DefectRecord, DeliveryInfo, DeliveryMethod, EyeSpec, LensConfig, Order, OrderStatus,
    PatientInfo, PaymentStatus, PriceBreakdown,
};
pub use party::{Party, PartyKind, DEFAULT_DISCOUNT_PCT};

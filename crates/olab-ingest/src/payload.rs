use chrono::{DateTime, Utc};
use olab_schemas::{DeliveryInfo, LensConfig};
use serde::{Deserialize, Serialize};

use crate::ExternalStatus;

/// Patient block as the external system sends it. Only the name is
/// mandatory; the rest is carried through when present.
#[derive(Clone, Debug, Deserialize)]
pub struct ExternalPatient {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Inbound bridge payload. Required: `external_id`, `patient.name` and the
/// lens configuration for both eyes; everything else is optional.
#[derive(Clone, Debug, Deserialize)]
pub struct ExternalOrderRequest {
    /// Order id in the external system, echoed back on every response.
    pub external_id: String,
    #[serde(default)]
    pub creator_name: Option<String>,
    #[serde(default)]
    pub creator_email: Option<String>,
    /// Clinic display name, used for fuzzy owner resolution.
    #[serde(default)]
    pub clinic_name: Option<String>,
    pub patient: ExternalPatient,
    pub lens: LensConfig,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub delivery: Option<DeliveryInfo>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

/// What the external system sees for one order — its own id, the external
/// status vocabulary and the priced total.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExternalOrderView {
    pub order_number: String,
    pub external_id: String,
    pub status: ExternalStatus,
    pub total: i64,
    pub edit_deadline: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

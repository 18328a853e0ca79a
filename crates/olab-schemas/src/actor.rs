use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// SubRole
// ---------------------------------------------------------------------------

/// The fixed, closed set of actor sub-roles.
///
/// This enum is the only input to the permission resolver in `olab-access`.
/// Parsing from a wire tag is fallible; callers that receive an unknown tag
/// must fall through to the all-false capability vector, never to a
/// permissive default.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubRole {
    LabHead,
    LabAdmin,
    LabEngineer,
    LabQuality,
    LabLogistics,
    LabAccountant,
    OpticManager,
    OpticDoctor,
    IndependentDoctor,
}

impl SubRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LabHead => "lab_head",
            Self::LabAdmin => "lab_admin",
            Self::LabEngineer => "lab_engineer",
            Self::LabQuality => "lab_quality",
            Self::LabLogistics => "lab_logistics",
            Self::LabAccountant => "lab_accountant",
            Self::OpticManager => "optic_manager",
            Self::OpticDoctor => "optic_doctor",
            Self::IndependentDoctor => "independent_doctor",
        }
    }

    /// Parse a wire tag. Returns `None` for anything outside the closed set.
    pub fn parse_tag(tag: &str) -> Option<Self> {
        match tag {
            "lab_head" => Some(Self::LabHead),
            "lab_admin" => Some(Self::LabAdmin),
            "lab_engineer" => Some(Self::LabEngineer),
            "lab_quality" => Some(Self::LabQuality),
            "lab_logistics" => Some(Self::LabLogistics),
            "lab_accountant" => Some(Self::LabAccountant),
            "optic_manager" => Some(Self::OpticManager),
            "optic_doctor" => Some(Self::OpticDoctor),
            "independent_doctor" => Some(Self::IndependentDoctor),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Authenticated caller context, supplied by the transport layer.
///
/// Authentication itself is external to this system; the daemon trusts the
/// forwarded identity headers and builds one of these per request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: Uuid,
    pub role: SubRole,
    /// Owning organization for clinic actors; `None` for lab staff and
    /// independent practitioners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org: Option<Uuid>,
}

impl Actor {
    pub fn new(actor_id: Uuid, role: SubRole, org: Option<Uuid>) -> Self {
        Self {
            actor_id,
            role,
            org,
        }
    }

    /// True if this actor belongs to the clinic side (creates orders) rather
    /// than the lab side (produces them).
    pub fn is_clinic_side(&self) -> bool {
        matches!(
            self.role,
            SubRole::OpticManager | SubRole::OpticDoctor | SubRole::IndependentDoctor
        )
    }
}

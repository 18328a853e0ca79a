//! Caller identity extraction.
//!
//! Authentication and session issuance live outside this system; upstream
//! forwards the verified identity in three headers. Missing or malformed
//! identity is 401; a role tag outside the closed set resolves to the
//! all-false capability vector and therefore 403 on anything gated.

use axum::http::HeaderMap;
use olab_access::Capabilities;
use olab_schemas::{Actor, SubRole};
use uuid::Uuid;

use crate::error::ApiError;

pub const HDR_ACTOR_ID: &str = "x-actor-id";
pub const HDR_ACTOR_ROLE: &str = "x-actor-role";
pub const HDR_ACTOR_ORG: &str = "x-actor-org";

/// Shared-secret header for bridge routes.
pub const HDR_BRIDGE_SECRET: &str = "x-bridge-secret";

/// Build the caller's [`Actor`] and capability vector from the forwarded
/// identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Result<(Actor, Capabilities), ApiError> {
    let actor_id = header_str(headers, HDR_ACTOR_ID)
        .ok_or_else(|| ApiError::unauthorized("missing x-actor-id header"))?;
    let actor_id: Uuid = actor_id
        .parse()
        .map_err(|_| ApiError::unauthorized("x-actor-id is not a valid id"))?;

    let role_tag = header_str(headers, HDR_ACTOR_ROLE)
        .ok_or_else(|| ApiError::unauthorized("missing x-actor-role header"))?;

    let org = match header_str(headers, HDR_ACTOR_ORG) {
        Some(raw) => Some(
            raw.parse::<Uuid>()
                .map_err(|_| ApiError::unauthorized("x-actor-org is not a valid id"))?,
        ),
        None => None,
    };

    // Unknown role tags fail closed: no capability vector, no ownership
    // standing, so every gated operation is refused.
    let Some(role) = SubRole::parse_tag(role_tag) else {
        return Err(ApiError::forbidden(format!(
            "unrecognized role '{role_tag}'"
        )));
    };

    Ok((Actor::new(actor_id, role, org), olab_access::resolve(role)))
}

/// Check the bridge shared secret.
pub fn require_bridge_secret(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    match header_str(headers, HDR_BRIDGE_SECRET) {
        Some(got) if got == expected => Ok(()),
        Some(_) => Err(ApiError::unauthorized("bridge secret mismatch")),
        None => Err(ApiError::unauthorized("missing x-bridge-secret header")),
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim).filter(|s| !s.is_empty())
}

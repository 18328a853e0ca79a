//! Axum router and all HTTP handlers for olab-daemon.
//!
//! `build_router` is the single entry point; `main.rs` calls it and attaches
//! middleware layers. Handlers are `pub(crate)`-free on purpose: the
//! scenario tests in `tests/` compose the router directly.
//!
//! Every handler follows the same shape: extract the caller, capture one
//! `now`, run the engine operation through the store's atomic mutate, then
//! re-read and project the result for the caller's role.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::Utc;
use olab_schemas::{Actor, DefectRecord, Party, SubRole};
use olab_store::{CounterpartyAggregate, DefectFeedEntry, OrderFilter, PaymentRow};
use tracing::info;
use uuid::Uuid;

use crate::{
    api_types::{
        AddDefectRequest, ArchiveDefectRequest, DiscountRequest, EditOrderRequest,
        HealthResponse, OrderView, PaymentRequest, RegisterPartyRequest, StatusRequest,
    },
    auth::{actor_from_headers, require_bridge_secret},
    error::ApiError,
    state::AppState,
};

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the complete application router wired to the given shared state.
///
/// Middleware layers (CORS, tracing) are **not** applied here; `main.rs`
/// attaches them after this call so tests can use the bare router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/orders", post(create_order).get(list_orders))
        .route("/v1/orders/:id", get(get_order).patch(edit_order))
        .route("/v1/orders/:id/status", patch(change_status))
        .route("/v1/orders/:id/payment", patch(change_payment))
        .route("/v1/orders/:id/defects", post(add_defect))
        .route("/v1/orders/:id/defects/:defect_id", patch(archive_defect))
        .route("/v1/defects", get(defect_feed))
        .route("/v1/payments", get(payment_list))
        .route("/v1/parties", get(list_parties).post(register_party))
        .route("/v1/parties/aggregates", get(party_aggregates))
        .route("/v1/parties/:id/discount", patch(set_discount))
        .route("/v1/bridge/orders", post(bridge_create).get(bridge_list))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Discount percent for the party this actor orders on behalf of:
/// organization for clinic staff, own registration for independents,
/// configured default when neither is known.
fn resolve_discount(state: &AppState, actor: &Actor) -> u32 {
    let party_id = actor.org.unwrap_or(actor.actor_id);
    state
        .parties
        .get(party_id)
        .map(|p| p.discount_pct)
        .unwrap_or(state.default_discount_pct)
}

/// Clinic-side actors only ever see orders they own; lab roles see all.
fn scope_filter(mut filter: OrderFilter, actor: &Actor) -> OrderFilter {
    if actor.is_clinic_side() {
        match actor.org {
            Some(org) => filter.org = Some(org),
            None => filter.created_by = Some(actor.actor_id),
        }
    }
    filter
}

// ---------------------------------------------------------------------------
// GET /v1/health
// ---------------------------------------------------------------------------

async fn health(State(st): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        service: st.build.service,
        version: st.build.version,
    })
}

// ---------------------------------------------------------------------------
// POST /v1/orders
// ---------------------------------------------------------------------------

async fn create_order(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<olab_engine::CreateOrder>,
) -> Result<Json<OrderView>, ApiError> {
    let (actor, caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    let discount_pct = resolve_discount(&st, &actor);
    let order = olab_engine::create_order(
        req,
        actor.actor_id,
        &caps,
        actor.org,
        discount_pct,
        &st.catalog,
        st.store.next_order_number(now),
        now,
    )?;
    st.store.insert(order.clone())?;

    info!(
        order_number = %order.order_number,
        urgent = order.urgent,
        total = order.price.total,
        "order created"
    );
    Ok(Json(OrderView::project(&order, actor.role, now)))
}

// ---------------------------------------------------------------------------
// GET /v1/orders
// ---------------------------------------------------------------------------

async fn list_orders(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let (actor, _caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    let orders = st.store.list(&scope_filter(filter, &actor));
    Ok(Json(
        orders
            .iter()
            .map(|o| OrderView::project(o, actor.role, now))
            .collect(),
    ))
}

// ---------------------------------------------------------------------------
// GET /v1/orders/{id}
// ---------------------------------------------------------------------------

async fn get_order(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderView>, ApiError> {
    let (actor, _caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    let order = st.store.get(id)?;
    // Cross-tenant fetches read as absent, not as forbidden.
    if actor.is_clinic_side() && !olab_engine::actor_owns_order(&actor, &order) {
        return Err(ApiError::not_found("order"));
    }
    Ok(Json(OrderView::project(&order, actor.role, now)))
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/{id}
// ---------------------------------------------------------------------------

async fn edit_order(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<EditOrderRequest>,
) -> Result<Json<OrderView>, ApiError> {
    let (actor, caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    let discount_pct = resolve_discount(&st, &actor);
    st.store.mutate(id, req.expected_version, now, |o| {
        olab_engine::order::apply_edit(o, req.edit, &actor, &caps, discount_pct, &st.catalog, now)
    })?;

    let order = st.store.get(id)?;
    info!(order_number = %order.order_number, "order edited");
    Ok(Json(OrderView::project(&order, actor.role, now)))
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/{id}/status
// ---------------------------------------------------------------------------

async fn change_status(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<OrderView>, ApiError> {
    let (actor, caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    st.store.mutate(id, req.expected_version, now, |o| {
        olab_engine::transition(o, req.to, &actor, &caps, now)
    })?;

    let order = st.store.get(id)?;
    info!(
        order_number = %order.order_number,
        status = %order.status,
        "status changed"
    );
    Ok(Json(OrderView::project(&order, actor.role, now)))
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/{id}/payment
// ---------------------------------------------------------------------------

async fn change_payment(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<PaymentRequest>,
) -> Result<Json<OrderView>, ApiError> {
    let (actor, caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    st.store.mutate(id, None, now, |o| {
        olab_engine::order::set_payment(o, req.payment, &caps)
    })?;

    let order = st.store.get(id)?;
    Ok(Json(OrderView::project(&order, actor.role, now)))
}

// ---------------------------------------------------------------------------
// POST /v1/orders/{id}/defects
// ---------------------------------------------------------------------------

async fn add_defect(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<AddDefectRequest>,
) -> Result<Json<DefectRecord>, ApiError> {
    let (_actor, caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    let record = st.store.mutate(id, None, now, |o| {
        olab_engine::defects::add_defect(o, req.quantity, req.note, &caps, now)
    })?;
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// PATCH /v1/orders/{id}/defects/{defect_id}
// ---------------------------------------------------------------------------

async fn archive_defect(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path((id, defect_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ArchiveDefectRequest>,
) -> Result<Json<DefectRecord>, ApiError> {
    let (_actor, caps) = actor_from_headers(&headers)?;
    let now = Utc::now();

    let record = st.store.mutate(id, None, now, |o| {
        olab_engine::defects::set_defect_archived(o, defect_id, req.archived, &caps)
    })?;
    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// GET /v1/defects
// ---------------------------------------------------------------------------

async fn defect_feed(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<DefectFeedEntry>>, ApiError> {
    let (_actor, caps) = actor_from_headers(&headers)?;
    if !caps.can_view_kanban {
        return Err(ApiError::forbidden("missing capability: can_view_kanban"));
    }
    Ok(Json(st.store.defect_feed()))
}

// ---------------------------------------------------------------------------
// GET /v1/payments
// ---------------------------------------------------------------------------

async fn payment_list(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<PaymentRow>>, ApiError> {
    let (_actor, caps) = actor_from_headers(&headers)?;
    if !caps.can_view_payments {
        return Err(ApiError::forbidden("missing capability: can_view_payments"));
    }
    Ok(Json(st.store.payment_rows()))
}

// ---------------------------------------------------------------------------
// GET /v1/parties
// ---------------------------------------------------------------------------

async fn list_parties(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<Party>>, ApiError> {
    let (_actor, caps) = actor_from_headers(&headers)?;
    if !caps.can_view_stats {
        return Err(ApiError::forbidden("missing capability: can_view_stats"));
    }
    Ok(Json(st.parties.list()))
}

// ---------------------------------------------------------------------------
// POST /v1/parties
// ---------------------------------------------------------------------------

async fn register_party(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<RegisterPartyRequest>,
) -> Result<Json<Party>, ApiError> {
    let (actor, _caps) = actor_from_headers(&headers)?;
    require_discount_authority(actor.role)?;
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("party name is required"));
    }
    let discount_pct = req.discount_pct.unwrap_or(olab_schemas::DEFAULT_DISCOUNT_PCT);
    if discount_pct > 100 {
        return Err(ApiError::bad_request(format!(
            "discount percent out of range: {discount_pct}"
        )));
    }

    let party = Party {
        party_id: req.party_id.unwrap_or_else(Uuid::new_v4),
        name: req.name.trim().to_string(),
        kind: req.kind,
        discount_pct,
        created_at: Utc::now(),
    };
    st.parties.insert(party.clone());
    info!(party = %party.name, discount_pct, "party registered");
    Ok(Json(party))
}

// ---------------------------------------------------------------------------
// PATCH /v1/parties/{id}/discount
// ---------------------------------------------------------------------------

async fn set_discount(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(req): Json<DiscountRequest>,
) -> Result<Json<Party>, ApiError> {
    let (actor, _caps) = actor_from_headers(&headers)?;
    require_discount_authority(actor.role)?;

    let party = st.parties.set_discount(id, req.discount_pct)?;
    info!(party = %party.name, discount_pct = req.discount_pct, "discount updated");
    Ok(Json(party))
}

fn require_discount_authority(role: SubRole) -> Result<(), ApiError> {
    if !olab_access::can_edit_discounts(role) {
        return Err(ApiError::forbidden("discount editing is restricted to lab_head"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// GET /v1/parties/aggregates
// ---------------------------------------------------------------------------

async fn party_aggregates(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<CounterpartyAggregate>>, ApiError> {
    let (_actor, caps) = actor_from_headers(&headers)?;
    if !caps.can_view_stats {
        return Err(ApiError::forbidden("missing capability: can_view_stats"));
    }
    Ok(Json(st.store.counterparty_aggregates()))
}

// ---------------------------------------------------------------------------
// POST /v1/bridge/orders
// ---------------------------------------------------------------------------

async fn bridge_create(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<olab_ingest::ExternalOrderRequest>,
) -> Result<Json<olab_ingest::ExternalOrderView>, ApiError> {
    require_bridge_secret(&headers, &st.bridge_secret)?;
    let now = Utc::now();

    let view = olab_ingest::ingest(
        req,
        &st.store,
        &st.parties,
        &st.catalog,
        st.default_discount_pct,
        now,
    )?;

    // Best-effort outbound mirror; never affects the response.
    if let Some(mirror) = &st.mirror {
        olab_ingest::spawn_mirror(mirror.client.clone(), mirror.url.clone(), view.clone());
    }

    Ok(Json(view))
}

// ---------------------------------------------------------------------------
// GET /v1/bridge/orders
// ---------------------------------------------------------------------------

async fn bridge_list(
    State(st): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<olab_ingest::ExternalOrderView>>, ApiError> {
    require_bridge_secret(&headers, &st.bridge_secret)?;
    Ok(Json(olab_ingest::list_external(&st.store)))
}

//! Data-exposure boundaries: price omission for clinic doctors, clinic
//! scoping of listings, the accountant's flat payment view, and the
//! lab_head-only party/discount surface.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use olab_daemon::{routes, state::AppState};
use serde_json::{json, Value};
use tower::ServiceExt; // oneshot
use uuid::Uuid;

fn test_state() -> Arc<AppState> {
    let config = olab_config::ServiceConfig {
        bind_addr: None,
        bridge_secret: "test-secret".to_string(),
        default_discount_pct: 5,
        catalog: BTreeMap::from([("std-1.5".to_string(), 40_000_i64)]),
        mirror_url: None,
    };
    Arc::new(AppState::new(config))
}

fn request(
    method: &str,
    uri: &str,
    headers: &[(&str, String)],
    body: Option<Value>,
) -> Request<Body> {
    let mut b = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
        b = b.header(*k, v.as_str());
    }
    match body {
        Some(json) => b
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => b.body(Body::empty()).unwrap(),
    }
}

async fn call(state: &Arc<AppState>, req: Request<Body>) -> (StatusCode, Value) {
    let resp = routes::build_router(Arc::clone(state))
        .oneshot(req)
        .await
        .expect("oneshot failed");
    let status = resp.status();
    let bytes = resp
        .into_body()
        .collect()
        .await
        .expect("body collect failed")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

fn identity_for(actor_id: Uuid, role: &str, org: Option<Uuid>) -> Vec<(&'static str, String)> {
    let mut h = vec![
        ("x-actor-id", actor_id.to_string()),
        ("x-actor-role", role.to_string()),
    ];
    if let Some(org) = org {
        h.push(("x-actor-org", org.to_string()));
    }
    h
}

fn identity(role: &str, org: Option<Uuid>) -> Vec<(&'static str, String)> {
    identity_for(Uuid::new_v4(), role, org)
}

fn order_body() -> Value {
    json!({
        "patient": { "name": "P. Example", "phone": "+100000008" },
        "lens": {
            "od": { "characteristic": "std-1.5", "quantity": 1 },
            "os": { "characteristic": "std-1.5", "quantity": 1 }
        },
        "urgent": false,
        "delivery": { "method": "pickup" }
    })
}

// ---------------------------------------------------------------------------
// Price visibility
// ---------------------------------------------------------------------------

#[tokio::test]
async fn optic_doctor_never_sees_pricing_fields() {
    let st = test_state();
    let org = Uuid::new_v4();

    // The doctor creates the order but the response must omit the price
    // block entirely.
    let (status, created) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity("optic_doctor", Some(org)),
            Some(order_body()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{created}");
    assert!(created.get("price").is_none(), "{created}");

    // Fetching it back as the doctor: still no price.
    let order_id = created["order_id"].as_str().unwrap();
    let (_, fetched) = call(
        &st,
        request(
            "GET",
            &format!("/v1/orders/{order_id}"),
            &identity("optic_doctor", Some(org)),
            None,
        ),
    )
    .await;
    assert!(fetched.get("price").is_none());

    // The clinic manager of the same org does see it.
    let (_, fetched) = call(
        &st,
        request(
            "GET",
            &format!("/v1/orders/{order_id}"),
            &identity("optic_manager", Some(org)),
            None,
        ),
    )
    .await;
    assert_eq!(fetched["price"]["total"], 76_000);
    assert_eq!(fetched["price"]["discount_pct"], 5);
}

// ---------------------------------------------------------------------------
// Clinic scoping
// ---------------------------------------------------------------------------

#[tokio::test]
async fn clinics_only_see_their_own_orders() {
    let st = test_state();
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    let (status, created) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity("optic_manager", Some(org_a)),
            Some(order_body()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let order_id = created["order_id"].as_str().unwrap();

    // Clinic B's listing is empty even without filters.
    let (_, listing) = call(
        &st,
        request(
            "GET",
            "/v1/orders",
            &identity("optic_manager", Some(org_b)),
            None,
        ),
    )
    .await;
    assert_eq!(listing.as_array().unwrap().len(), 0);

    // Clinic B's direct fetch reads as absent.
    let (status, _) = call(
        &st,
        request(
            "GET",
            &format!("/v1/orders/{order_id}"),
            &identity("optic_manager", Some(org_b)),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Lab staff see everything.
    let (_, listing) = call(
        &st,
        request("GET", "/v1/orders", &identity("lab_engineer", None), None),
    )
    .await;
    assert_eq!(listing.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn independent_doctor_sees_own_orders_only() {
    let st = test_state();
    let doctor_id = Uuid::new_v4();

    let (status, _) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity_for(doctor_id, "independent_doctor", None),
            Some(order_body()),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, own) = call(
        &st,
        request(
            "GET",
            "/v1/orders",
            &identity_for(doctor_id, "independent_doctor", None),
            None,
        ),
    )
    .await;
    assert_eq!(own.as_array().unwrap().len(), 1);

    let (_, other) = call(
        &st,
        request(
            "GET",
            "/v1/orders",
            &identity("independent_doctor", None),
            None,
        ),
    )
    .await;
    assert_eq!(other.as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Edit window over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn normal_order_editable_and_requoted_inside_window() {
    let st = test_state();
    let org = Uuid::new_v4();
    let manager_id = Uuid::new_v4();

    let (_, created) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity_for(manager_id, "optic_manager", Some(org)),
            Some(order_body()),
        ),
    )
    .await;
    let order_id = created["order_id"].as_str().unwrap();
    assert!(created["edit_seconds_remaining"].as_i64().unwrap() > 0);

    // Double the quantities; the stored price follows.
    let (status, edited) = call(
        &st,
        request(
            "PATCH",
            &format!("/v1/orders/{order_id}"),
            &identity_for(manager_id, "optic_manager", Some(org)),
            Some(json!({
                "lens": {
                    "od": { "characteristic": "std-1.5", "quantity": 2 },
                    "os": { "characteristic": "std-1.5", "quantity": 2 }
                }
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{edited}");
    assert_eq!(edited["price"]["base"], 160_000);
    assert_eq!(edited["price"]["total"], 152_000);
    assert_eq!(edited["version"], 2);
}

#[tokio::test]
async fn urgent_order_edit_is_refused_with_window_code() {
    let st = test_state();
    let org = Uuid::new_v4();
    let manager_id = Uuid::new_v4();

    let mut body = order_body();
    body["urgent"] = json!(true);
    let (_, created) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity_for(manager_id, "optic_manager", Some(org)),
            Some(body),
        ),
    )
    .await;
    let order_id = created["order_id"].as_str().unwrap();
    assert_eq!(created["edit_seconds_remaining"], 0);

    let (status, resp) = call(
        &st,
        request(
            "PATCH",
            &format!("/v1/orders/{order_id}"),
            &identity_for(manager_id, "optic_manager", Some(org)),
            Some(json!({ "notes": "too late" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(resp["code"], "edit_window_closed");
}

// ---------------------------------------------------------------------------
// Accountant projections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn accountant_gets_payments_but_not_kanban_feed() {
    let st = test_state();
    let org = Uuid::new_v4();
    let (_, _) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity("optic_manager", Some(org)),
            Some(order_body()),
        ),
    )
    .await;

    let (status, rows) = call(
        &st,
        request("GET", "/v1/payments", &identity("lab_accountant", None), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 1);
    assert_eq!(rows[0]["payment"], "unpaid");
    assert_eq!(rows[0]["total"], 76_000);

    // The defect feed is the kanban-side view; the accountant has no access.
    let (status, body) = call(
        &st,
        request("GET", "/v1/defects", &identity("lab_accountant", None), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
}

// ---------------------------------------------------------------------------
// Parties, discounts, aggregates
// ---------------------------------------------------------------------------

#[tokio::test]
async fn discount_surface_is_lab_head_only() {
    let st = test_state();

    // lab_admin has every order capability but not discount authority.
    let (status, body) = call(
        &st,
        request(
            "POST",
            "/v1/parties",
            &identity("lab_admin", None),
            Some(json!({ "name": "Vision Center", "kind": "clinic" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");

    let (status, party) = call(
        &st,
        request(
            "POST",
            "/v1/parties",
            &identity("lab_head", None),
            Some(json!({ "name": "Vision Center", "kind": "clinic" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{party}");
    assert_eq!(party["discount_pct"], 5);
    let party_id = party["party_id"].as_str().unwrap().to_string();

    let (status, updated) = call(
        &st,
        request(
            "PATCH",
            &format!("/v1/parties/{party_id}/discount"),
            &identity("lab_head", None),
            Some(json!({ "discount_pct": 12 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["discount_pct"], 12);
}

#[tokio::test]
async fn discount_change_affects_only_later_orders() {
    let st = test_state();

    let (_, party) = call(
        &st,
        request(
            "POST",
            "/v1/parties",
            &identity("lab_head", None),
            Some(json!({ "name": "Vision Center", "kind": "clinic" })),
        ),
    )
    .await;
    let org: Uuid = party["party_id"].as_str().unwrap().parse().unwrap();

    let (_, before) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity("optic_manager", Some(org)),
            Some(order_body()),
        ),
    )
    .await;
    assert_eq!(before["price"]["total"], 76_000);

    let (_, _) = call(
        &st,
        request(
            "PATCH",
            &format!("/v1/parties/{org}/discount"),
            &identity("lab_head", None),
            Some(json!({ "discount_pct": 10 })),
        ),
    )
    .await;

    // The earlier order's snapshot is frozen.
    let before_id = before["order_id"].as_str().unwrap();
    let (_, frozen) = call(
        &st,
        request(
            "GET",
            &format!("/v1/orders/{before_id}"),
            &identity("lab_head", None),
            None,
        ),
    )
    .await;
    assert_eq!(frozen["price"]["total"], 76_000);
    assert_eq!(frozen["price"]["discount_pct"], 5);

    // New orders pick up the new percent.
    let (_, after) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity("optic_manager", Some(org)),
            Some(order_body()),
        ),
    )
    .await;
    assert_eq!(after["price"]["discount_pct"], 10);
    assert_eq!(after["price"]["total"], 72_000);
}

#[tokio::test]
async fn aggregates_gated_by_stats_capability() {
    let st = test_state();
    let org = Uuid::new_v4();
    let (_, _) = call(
        &st,
        request(
            "POST",
            "/v1/orders",
            &identity("optic_manager", Some(org)),
            Some(order_body()),
        ),
    )
    .await;

    let (status, _) = call(
        &st,
        request(
            "GET",
            "/v1/parties/aggregates",
            &identity("lab_engineer", None),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, aggs) = call(
        &st,
        request(
            "GET",
            "/v1/parties/aggregates",
            &identity("lab_head", None),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(aggs.as_array().unwrap().len(), 1);
    assert_eq!(aggs[0]["counterparty_id"], org.to_string());
    assert_eq!(aggs[0]["order_count"], 1);
    assert_eq!(aggs[0]["revenue"], 76_000);
    assert_eq!(aggs[0]["unpaid_total"], 76_000);
}

//! Router-level tests against an in-memory `SqliteStore`.

use std::sync::Arc;

use axum::{
  body::Body,
  http::{Request, StatusCode, header},
};
use hireloop_core::{
  id::{CategoryId, SubCategoryId},
  store::TaxonomyStore,
};
use hireloop_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiState, DEFAULT_IDENTITY_HEADER, api_router};

// ─── Fixtures ────────────────────────────────────────────────────────────────

struct Fixture {
  state:       ApiState<SqliteStore>,
  electrician: CategoryId,
  wiring:      SubCategoryId,
}

async fn fixture() -> Fixture {
  let store = SqliteStore::open_in_memory().await.unwrap();
  store.seed_categories().await.unwrap();
  let electrician = store
    .list_categories()
    .await
    .unwrap()
    .into_iter()
    .find(|c| c.category_name == "Electrician")
    .unwrap()
    .category_id;
  let wiring = store
    .add_sub_category(electrician, "Wiring".into(), vec![])
    .await
    .unwrap()
    .sub_category_id;
  Fixture {
    state: ApiState::new(Arc::new(store)),
    electrician,
    wiring,
  }
}

async fn call(
  state: &ApiState<SqliteStore>,
  method: &str,
  uri: &str,
  email: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(email) = email {
    builder = builder.header(DEFAULT_IDENTITY_HEADER, email);
  }
  let body = match body {
    Some(v) => {
      builder = builder.header(header::CONTENT_TYPE, "application/json");
      Body::from(v.to_string())
    }
    None => Body::empty(),
  };
  let resp = api_router(state.clone())
    .oneshot(builder.body(body).unwrap())
    .await
    .unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
    .await
    .unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn signup(state: &ApiState<SqliteStore>, email: &str, profile: Value) -> Value {
  let (status, account) = call(state, "POST", "/me/profiles", Some(email), Some(profile)).await;
  assert_eq!(status, StatusCode::CREATED, "{account}");
  account
}

fn profile_id(account: &Value) -> i64 {
  account["profile"]["profile_id"].as_i64().unwrap()
}

/// A verified provider offering `Wiring`, plus the verifier who accepted it.
async fn verified_provider(f: &Fixture) -> i64 {
  let account = signup(
    &f.state,
    "ravi@example.com",
    json!({
      "profile_type": "service_provider",
      "category_id":  f.electrician,
      "name":         "Ravi Electricals",
      "offerings":    [{ "sub_category_id": f.wiring, "min_cost": "500" }],
    }),
  )
  .await;
  let spsid = profile_id(&account);

  signup(
    &f.state,
    "asha@example.com",
    json!({ "profile_type": "verifier", "name": "Asha" }),
  )
  .await;
  let (status, outcome) = call(
    &f.state,
    "POST",
    "/verifications",
    Some("asha@example.com"),
    Some(json!({ "spsid": spsid, "sub_category_id": f.wiring, "decision": "accepted" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{outcome}");
  assert_eq!(outcome["status"], "verified");
  spsid
}

fn slot(start: &str, end: &str) -> Value {
  json!({ "date": "2024-06-01", "start_time": start, "end_time": end })
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_identity_header_is_unauthorized() {
  let f = fixture().await;
  let (status, _) = call(&f.state, "GET", "/me", None, None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);

  let (status, _) = call(&f.state, "GET", "/me", Some("not-an-email"), None).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_before_signup_is_refused() {
  let f = fixture().await;
  let (status, body) = call(
    &f.state,
    "POST",
    "/session",
    Some("kiran@example.com"),
    Some(json!({ "authType": "login" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].as_str().unwrap().contains("sign up"));
}

#[tokio::test]
async fn signup_creates_a_customer_once() {
  let f = fixture().await;
  let (status, body) = call(
    &f.state,
    "POST",
    "/session",
    Some("Kiran@Example.com"),
    Some(json!({ "authType": "signup" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{body}");
  assert_eq!(body["email"], "kiran@example.com");
  assert_eq!(body["profiles"][0]["profile_type"], "customer");
  assert_eq!(body["profiles"][0]["display_name"], "kiran");

  let (status, body) = call(
    &f.state,
    "POST",
    "/session",
    Some("kiran@example.com"),
    Some(json!({ "authType": "signup" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["message"], "Account already exists");
  assert_eq!(body["profiles"].as_array().unwrap().len(), 1);

  let (status, body) = call(
    &f.state,
    "POST",
    "/session",
    Some("kiran@example.com"),
    Some(json!({ "authType": "login" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.get("message").is_none());
}

#[tokio::test]
async fn second_profile_of_same_type_conflicts() {
  let f = fixture().await;
  let verifier = json!({ "profile_type": "verifier", "name": "Asha" });
  signup(&f.state, "asha@example.com", verifier.clone()).await;
  let (status, body) = call(
    &f.state,
    "POST",
    "/me/profiles",
    Some("asha@example.com"),
    Some(verifier),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert_eq!(body["kind"], "conflict");
}

#[tokio::test]
async fn only_own_accounts_can_be_disabled() {
  let f = fixture().await;
  let account = signup(
    &f.state,
    "asha@example.com",
    json!({ "profile_type": "verifier", "name": "Asha" }),
  )
  .await;
  let id = account["account_id"].as_i64().unwrap();
  let uri = format!("/accounts/{id}/disable");

  let (status, _) = call(&f.state, "POST", &uri, Some("mallory@example.com"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, body) = call(&f.state, "POST", &uri, Some("asha@example.com"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["disabled"], true);

  let (_, me) = call(&f.state, "GET", "/me", Some("asha@example.com"), None).await;
  assert!(me["profiles"].as_array().unwrap().is_empty());
}

// ─── Taxonomy ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn categories_are_seeded() {
  let f = fixture().await;
  let (status, body) = call(&f.state, "GET", "/categories", Some("a@example.com"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 7);

  let (status, body) = call(
    &f.state,
    "GET",
    "/sub-categories?category_name=Electrician",
    Some("a@example.com"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body[0]["sub_category_name"], "Wiring");
}

#[tokio::test]
async fn taxonomy_writes_need_support_staff() {
  let f = fixture().await;
  let (status, _) = call(
    &f.state,
    "POST",
    "/tags",
    Some("kiran@example.com"),
    Some(json!({ "tag_name": "copper" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  signup(
    &f.state,
    "meera@example.com",
    json!({ "profile_type": "support_staff", "name": "Meera" }),
  )
  .await;
  let (status, tag) = call(
    &f.state,
    "POST",
    "/tags",
    Some("meera@example.com"),
    Some(json!({ "tag_name": "copper" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(tag["tag_name"], "copper");

  let (status, _) = call(
    &f.state,
    "POST",
    "/tags",
    Some("meera@example.com"),
    Some(json!({ "tag_name": "copper" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);

  let (_, found) = call(&f.state, "GET", "/tags?prefix=COP", Some("meera@example.com"), None).await;
  assert_eq!(found.as_array().unwrap().len(), 1);
}

// ─── Verification ────────────────────────────────────────────────────────────

#[tokio::test]
async fn pending_queue_is_for_verifiers_only() {
  let f = fixture().await;
  signup(
    &f.state,
    "ravi@example.com",
    json!({
      "profile_type": "service_provider",
      "category_id":  f.electrician,
      "name":         "Ravi Electricals",
      "offerings":    [{ "sub_category_id": f.wiring, "min_cost": "500" }],
    }),
  )
  .await;

  let (status, _) = call(
    &f.state,
    "GET",
    "/verifications/pending",
    Some("ravi@example.com"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  signup(
    &f.state,
    "asha@example.com",
    json!({ "profile_type": "verifier", "name": "Asha" }),
  )
  .await;
  let (status, queue) = call(
    &f.state,
    "GET",
    "/verifications/pending",
    Some("asha@example.com"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(queue.as_array().unwrap().len(), 1);
  assert_eq!(queue[0]["category_name"], "Electrician");
}

#[tokio::test]
async fn verified_profile_is_locked_for_edits() {
  let f = fixture().await;
  let spsid = verified_provider(&f).await;
  let (status, body) = call(
    &f.state,
    "PATCH",
    &format!("/service-providers/{spsid}"),
    Some("ravi@example.com"),
    Some(json!({ "name": "Ravi & Sons" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT, "{body}");

  let (status, _) = call(
    &f.state,
    "PATCH",
    &format!("/service-providers/{spsid}"),
    Some("asha@example.com"),
    Some(json!({ "name": "Hijacked" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
}

// ─── Booking ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_flow_and_overlap() {
  let f = fixture().await;
  let spsid = verified_provider(&f).await;
  let (status, _) = call(
    &f.state,
    "POST",
    "/session",
    Some("kiran@example.com"),
    Some(json!({ "authType": "signup" })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let request = |start: &str, end: &str| {
    json!({ "spsid": spsid, "slot": slot(start, end), "service_type": "in_house" })
  };

  let (status, appt) = call(
    &f.state,
    "POST",
    "/appointments",
    Some("kiran@example.com"),
    Some(request("10:00:00", "11:00:00")),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED, "{appt}");
  assert_eq!(appt["state"], "requested");
  let id = appt["appt_id"].as_i64().unwrap();

  // The customer cannot accept their own request.
  let (status, _) = call(
    &f.state,
    "POST",
    &format!("/appointments/{id}/accept"),
    Some("kiran@example.com"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  let (status, appt) = call(
    &f.state,
    "POST",
    &format!("/appointments/{id}/accept"),
    Some("ravi@example.com"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(appt["state"], "scheduled");

  let (status, body) = call(
    &f.state,
    "POST",
    "/appointments",
    Some("kiran@example.com"),
    Some(request("10:30:00", "11:30:00")),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT, "{body}");

  let (status, _) = call(
    &f.state,
    "POST",
    "/appointments",
    Some("kiran@example.com"),
    Some(request("11:00:00", "12:00:00")),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);

  let (status, appt) = call(
    &f.state,
    "POST",
    &format!("/appointments/{id}/cancel"),
    Some("kiran@example.com"),
    None,
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(appt["state"], "cancelled");
  assert_eq!(appt["cancelled_by"], "customer");

  let (status, _) = call(
    &f.state,
    "POST",
    &format!("/appointments/{id}/complete"),
    Some("ravi@example.com"),
    Some(json!({ "rating": 5 })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unverified_provider_cannot_be_booked() {
  let f = fixture().await;
  let account = signup(
    &f.state,
    "ravi@example.com",
    json!({
      "profile_type": "service_provider",
      "category_id":  f.electrician,
      "name":         "Ravi Electricals",
      "offerings":    [{ "sub_category_id": f.wiring, "min_cost": "500" }],
    }),
  )
  .await;
  let spsid = profile_id(&account);
  signup(
    &f.state,
    "kiran@example.com",
    json!({ "profile_type": "customer", "display_name": "Kiran" }),
  )
  .await;

  let (status, body) = call(
    &f.state,
    "POST",
    "/appointments",
    Some("kiran@example.com"),
    Some(json!({
      "spsid": spsid,
      "slot": slot("10:00:00", "11:00:00"),
      "service_type": "walk_in",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT, "{body}");
  assert_eq!(body["kind"], "invalid_state");
}

#[tokio::test]
async fn support_staff_assign_themselves() {
  let f = fixture().await;
  let spsid = verified_provider(&f).await;
  signup(
    &f.state,
    "kiran@example.com",
    json!({ "profile_type": "customer", "display_name": "Kiran" }),
  )
  .await;
  let (_, appt) = call(
    &f.state,
    "POST",
    "/appointments",
    Some("kiran@example.com"),
    Some(json!({
      "spsid": spsid,
      "slot": slot("09:00:00", "10:00:00"),
      "service_type": "in_house",
    })),
  )
  .await;
  let id = appt["appt_id"].as_i64().unwrap();
  let uri = format!("/appointments/{id}/handlers");

  let (status, _) = call(&f.state, "POST", &uri, Some("kiran@example.com"), None).await;
  assert_eq!(status, StatusCode::FORBIDDEN);

  signup(
    &f.state,
    "meera@example.com",
    json!({ "profile_type": "support_staff", "name": "Meera" }),
  )
  .await;
  let (status, handled) = call(&f.state, "POST", &uri, Some("meera@example.com"), None).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(handled["appt_id"], id);

  let (status, history) = call(&f.state, "GET", &uri, Some("kiran@example.com"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(history.as_array().unwrap().len(), 1);
}

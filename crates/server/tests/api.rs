use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use base64::Engine as _;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use migration::MigratorTrait;
use sea_orm::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use engine::Engine;
use server::{ServerState, router};

const ADMIN_PASSWORD: &str = "admin-secret";

async fn app() -> Router {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db).build().await.unwrap();
    engine
        .create_admin("root", "root@example.com", ADMIN_PASSWORD, Utc::now())
        .await
        .unwrap();
    router(ServerState {
        engine: Arc::new(engine),
    })
}

fn basic(username: &str, password: &str) -> String {
    let token = base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {token}")
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some((username, password)) = auth {
        builder = builder.header(header::AUTHORIZATION, basic(username, password));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, value)
}

async fn register(app: &Router, username: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/users/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

async fn add_panda(app: &Router) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/admin/cars",
        Some(("root", ADMIN_PASSWORD)),
        Some(json!({
            "make": "Fiat",
            "model": "Panda",
            "year": 2022,
            "category": "economy",
            "seats": 5,
            "transmission": "manual",
            "fuel": "petrol",
            "daily_rate_minor": 10_000,
            "location": "Milano",
            "plate_number": "AA000AA",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["id"].as_str().unwrap().to_string()
}

fn days_from_today(days: i64) -> String {
    (Utc::now().date_naive() + Duration::days(days)).to_string()
}

#[tokio::test]
async fn authentication_is_required() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, _) = send(&app, "GET", "/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, "GET", "/users/me", Some(("alice", "wrong")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(&app, "GET", "/users/me", Some(("alice", "hunter22")), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["role"], "customer");
}

#[tokio::test]
async fn admin_routes_reject_customers() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, _) = send(&app, "GET", "/admin/users", Some(("alice", "hunter22")), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/admin/users", Some(("root", ADMIN_PASSWORD)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({
            "username": "Alice",
            "email": "other@example.com",
            "password": "hunter22",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn search_requires_both_dates() {
    let app = app().await;
    add_panda(&app).await;

    let uri = format!("/cars?start={}", days_from_today(5));
    let (status, _) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/cars?location=milano&start={}&end={}",
        days_from_today(5),
        days_from_today(8)
    );
    let (status, body) = send(&app, "GET", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn inactive_cars_are_hidden_from_the_public() {
    let app = app().await;
    let car_id = add_panda(&app).await;

    let (status, _) = send(
        &app,
        "POST",
        &format!("/admin/cars/{car_id}/active"),
        Some(("root", ADMIN_PASSWORD)),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "GET", &format!("/cars/{car_id}"), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&app, "GET", "/admin/cars", Some(("root", ADMIN_PASSWORD)), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["active"], false);
}

#[tokio::test]
async fn booking_flow_over_http() {
    let app = app().await;
    let car_id = add_panda(&app).await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = Some(("alice", "hunter22"));

    let request = json!({
        "car_id": car_id,
        "start": days_from_today(10),
        "end": days_from_today(13),
    });

    let (status, quote) = send(&app, "POST", "/bookings/quote", alice, Some(request.clone())).await;
    assert_eq!(status, StatusCode::OK, "{quote}");
    assert_eq!(quote["days"], 3);
    assert_eq!(quote["total_minor"], 35_400);

    let (status, booking) = send(&app, "POST", "/bookings", alice, Some(request.clone())).await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["status"], "pending");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", "/bookings", Some(("bob", "hunter22")), Some(request)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/bookings/{booking_id}"),
        Some(("bob", "hunter22")),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, paid) = send(
        &app,
        "POST",
        &format!("/bookings/{booking_id}/pay"),
        alice,
        Some(json!({ "payment_reference": "pay_123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["status"], "confirmed");

    let (status, quote) = send(
        &app,
        "GET",
        &format!("/bookings/{booking_id}/cancellation"),
        alice,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["fee_minor"], 0);
    assert_eq!(quote["refund_minor"], 35_400);

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("/bookings/{booking_id}/cancel"),
        alice,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/bookings/{booking_id}/cancel"),
        alice,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app, "GET", "/notifications/unread", alice, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], 4);
}

#[tokio::test]
async fn invalid_dates_are_unprocessable() {
    let app = app().await;
    let car_id = add_panda(&app).await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/bookings/quote",
        Some(("alice", "hunter22")),
        Some(json!({
            "car_id": car_id,
            "start": days_from_today(5),
            "end": days_from_today(5),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("drop-off"));
}

#[tokio::test]
async fn report_csv_is_served_as_text() {
    let app = app().await;
    let today = Utc::now().date_naive();
    let uri = format!("/admin/reports/bookings.csv?from={today}&to={today}");

    let request = Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, basic("root", ADMIN_PASSWORD))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(String::from_utf8_lossy(&bytes).starts_with("id,user,car,"));
}

#[tokio::test]
async fn offers_are_published_and_validated() {
    let app = app().await;
    let car_id = add_panda(&app).await;
    register(&app, "alice").await;
    let root = Some(("root", ADMIN_PASSWORD));
    let alice = Some(("alice", "hunter22"));

    let (status, offer) = send(
        &app,
        "POST",
        "/admin/offers",
        root,
        Some(json!({
            "code": "spring10",
            "title": "Spring sale",
            "discount": { "kind": "percentage", "bps": 1000 },
            "valid_from": days_from_today(0),
            "valid_until": days_from_today(30),
            "notify_users": true,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{offer}");
    assert_eq!(offer["code"], "SPRING10");
    assert_eq!(offer["discount"]["kind"], "percentage");
    assert_eq!(offer["discount"]["bps"], 1000);
    let offer_id = offer["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", "/admin/offers", alice, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, active) = send(&app, "GET", "/offers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active.as_array().unwrap().len(), 1);

    let (status, body) = send(&app, "GET", "/notifications?unread_only=true", alice, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["kind"], "offer");

    let (status, price) = send(
        &app,
        "POST",
        "/offers/validate",
        alice,
        Some(json!({
            "code": "spring10",
            "car_id": car_id,
            "start": days_from_today(10),
            "end": days_from_today(13),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{price}");
    assert_eq!(price["offer_discount_minor"], 3_000);
    assert_eq!(price["total_minor"], 31_860);

    let (status, updated) = send(
        &app,
        "PATCH",
        &format!("/admin/offers/{offer_id}"),
        root,
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);

    let (status, active) = send(&app, "GET", "/offers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(active.as_array().unwrap().is_empty());

    let (status, all) = send(&app, "GET", "/admin/offers", root, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admins_run_the_rental_lifecycle() {
    let app = app().await;
    let car_id = add_panda(&app).await;
    let alice = register(&app, "alice").await;
    let root = Some(("root", ADMIN_PASSWORD));

    let (status, bob) = send(
        &app,
        "POST",
        "/users/register",
        None,
        Some(json!({
            "username": "bob",
            "email": "bob@example.com",
            "password": "hunter22",
            "referral_code": alice["referral_code"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{bob}");
    let bob_auth = Some(("bob", "hunter22"));

    let (status, booking) = send(
        &app,
        "POST",
        "/bookings",
        bob_auth,
        Some(json!({
            "car_id": car_id,
            "start": days_from_today(0),
            "end": days_from_today(2),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        &format!("/bookings/{booking_id}/pay"),
        bob_auth,
        Some(json!({ "payment_reference": "pay_456" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let start = format!("/admin/bookings/{booking_id}/start");
    let (status, _) = send(&app, "POST", &start, bob_auth, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, started) = send(&app, "POST", &start, root, None).await;
    assert_eq!(status, StatusCode::OK, "{started}");
    assert_eq!(started["status"], "active");

    let (status, listed) = send(&app, "GET", "/admin/bookings?status=active", root, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, completed) = send(
        &app,
        "POST",
        &format!("/admin/bookings/{booking_id}/complete"),
        root,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{completed}");
    assert_eq!(completed["status"], "completed");

    let (status, _) = send(
        &app,
        "POST",
        &format!("/admin/bookings/{booking_id}/cancel"),
        root,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let alice_auth = Some(("alice", "hunter22"));
    let (status, referrals) = send(&app, "GET", "/users/me/referrals", alice_auth, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(referrals["rewarded"], 1);
    assert_eq!(referrals["pending"], 0);
    assert_eq!(referrals["total_earned_minor"], 50_000);

    let (_, me) = send(&app, "GET", "/users/me", alice_auth, None).await;
    assert_eq!(me["credit_minor"], 50_000);
}

#[tokio::test]
async fn admin_cancel_waives_the_fee() {
    let app = app().await;
    let car_id = add_panda(&app).await;
    register(&app, "alice").await;
    let alice = Some(("alice", "hunter22"));

    let (_, booking) = send(
        &app,
        "POST",
        "/bookings",
        alice,
        Some(json!({
            "car_id": car_id,
            "start": days_from_today(0),
            "end": days_from_today(3),
        })),
    )
    .await;
    let booking_id = booking["id"].as_str().unwrap().to_string();
    send(
        &app,
        "POST",
        &format!("/bookings/{booking_id}/pay"),
        alice,
        Some(json!({ "payment_reference": "pay_789" })),
    )
    .await;

    let (status, cancelled) = send(
        &app,
        "POST",
        &format!("/admin/bookings/{booking_id}/cancel"),
        Some(("root", ADMIN_PASSWORD)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{cancelled}");
    assert_eq!(cancelled["status"], "cancelled");
    assert_eq!(cancelled["cancellation_fee_minor"], 0);
    assert_eq!(cancelled["refund_minor"], 35_400);
}

#[tokio::test]
async fn notifications_can_be_read_and_removed() {
    let app = app().await;
    register(&app, "alice").await;
    let alice = Some(("alice", "hunter22"));

    let (status, sent) = send(
        &app,
        "POST",
        "/admin/notifications/broadcast",
        Some(("root", ADMIN_PASSWORD)),
        Some(json!({ "title": "Maintenance", "message": "Back at noon." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["sent"], 2);

    let (status, list) = send(&app, "GET", "/notifications", alice, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["kind"], "system");
    let newest = list[0]["id"].as_str().unwrap().to_string();
    let welcome = list[1]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "POST", &format!("/notifications/{newest}/read"), alice, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = send(&app, "GET", "/notifications/unread", alice, None).await;
    assert_eq!(body["unread"], 1);

    let (status, _) = send(
        &app,
        "POST",
        &format!("/notifications/{newest}/read"),
        Some(("root", ADMIN_PASSWORD)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, marked) = send(&app, "POST", "/notifications/read-all", alice, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 1);

    let (status, _) = send(&app, "DELETE", &format!("/notifications/{welcome}"), alice, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = send(&app, "GET", "/notifications", alice, None).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn admin_user_updates_over_http() {
    let app = app().await;
    let alice = register(&app, "alice").await;
    let alice_id = alice["id"].as_str().unwrap().to_string();
    let uri = format!("/admin/users/{alice_id}");
    let root = Some(("root", ADMIN_PASSWORD));

    let (status, _) = send(
        &app,
        "PATCH",
        &uri,
        Some(("alice", "hunter22")),
        Some(json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "PATCH", &uri, root, Some(json!({}))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, updated) = send(&app, "PATCH", &uri, root, Some(json!({ "active": false }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["active"], false);
    assert_eq!(updated["role"], "customer");

    let (status, _) = send(&app, "GET", "/users/me", Some(("alice", "hunter22")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn password_change_replaces_the_credentials() {
    let app = app().await;
    register(&app, "alice").await;

    let (status, _) = send(
        &app,
        "POST",
        "/users/me/password",
        Some(("alice", "hunter22")),
        Some(json!({ "old_password": "wrong-one", "new_password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "POST",
        "/users/me/password",
        Some(("alice", "hunter22")),
        Some(json!({ "old_password": "hunter22", "new_password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/users/me", Some(("alice", "hunter22")), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, "GET", "/users/me", Some(("alice", "correct horse")), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn report_summary_counts_the_fleet() {
    let app = app().await;
    add_panda(&app).await;
    register(&app, "alice").await;
    let today = Utc::now().date_naive();

    let (status, summary) = send(
        &app,
        "GET",
        &format!("/admin/reports/summary?from={today}&to={today}"),
        Some(("root", ADMIN_PASSWORD)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{summary}");
    assert_eq!(summary["total_users"], 2);
    assert_eq!(summary["total_cars"], 1);
    assert_eq!(summary["gross_revenue_minor"], 0);

    let (status, _) = send(
        &app,
        "GET",
        &format!("/admin/reports/summary?from={}&to={today}", days_from_today(1)),
        Some(("root", ADMIN_PASSWORD)),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

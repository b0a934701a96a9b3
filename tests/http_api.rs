//! HTTP integration tests: boot the real router on an ephemeral port over
//! the in-memory store and drive it with `reqwest`.

#![allow(clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use serde_json::{Value, json};

use hostel_bookings::api;
use hostel_bookings::app_state::AppState;
use hostel_bookings::domain::{
    Hostel, HostelId, ListingRequest, ListingRequestId, ListingRequestStatus, User, UserId,
};
use hostel_bookings::persistence::memory::MemoryStore;

struct TestServer {
    base: String,
    client: reqwest::Client,
    hostel: HostelId,
    user: UserId,
    other: UserId,
    admin: UserId,
}

impl TestServer {
    async fn start() -> Self {
        let store = Arc::new(MemoryStore::new());
        let hostel = HostelId::new();
        store
            .insert_hostel(Hostel {
                id: hostel,
                name: "Harbour House".to_string(),
                available: true,
                created_at: Utc::now(),
            })
            .await;
        let (user, other, admin) = (UserId::new(), UserId::new(), UserId::new());
        for id in [user, other, admin] {
            store
                .insert_user(User {
                    id,
                    created_at: Utc::now(),
                })
                .await;
        }
        for status in [ListingRequestStatus::Pending, ListingRequestStatus::Rejected] {
            store
                .insert_listing_request(ListingRequest {
                    id: ListingRequestId::new(),
                    status,
                    created_at: Utc::now(),
                })
                .await;
        }

        let app = api::build_app(AppState::new(store, false), Duration::from_secs(5));
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind ephemeral port");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("local addr");
        };
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                panic!("server error: {e}");
            }
        });

        Self {
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
            hostel,
            user,
            other,
            admin,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn as_user(&self, builder: reqwest::RequestBuilder, id: UserId) -> reqwest::RequestBuilder {
        builder.header("x-user-id", id.to_string())
    }

    fn as_admin(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("x-user-id", self.admin.to_string())
            .header("x-user-role", "admin")
    }

    fn booking_body(&self) -> Value {
        json!({
            "hostel_id": self.hostel,
            "name": "Ana Silva",
            "terms": true,
            "phone": "+919876543210",
            "gender": "female",
            "address": "12 Harbour Road",
        })
    }
}

async fn send(builder: reqwest::RequestBuilder) -> (StatusCode, Value) {
    let Ok(response) = builder.send().await else {
        panic!("request failed");
    };
    let status = response.status();
    let body = response.json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

async fn create(server: &TestServer, user: UserId) -> (StatusCode, Value) {
    send(
        server
            .as_user(server.client.post(server.url("/api/v1/bookings")), user)
            .json(&server.booking_body()),
    )
    .await
}

async fn set_status(builder: reqwest::RequestBuilder, status: &str) -> (StatusCode, Value) {
    send(builder.json(&json!({ "status": status }))).await
}

fn booking_id(body: &Value) -> String {
    let Some(id) = body["id"].as_str() else {
        panic!("response has no id: {body}");
    };
    id.to_string()
}

#[tokio::test]
async fn health_is_public() {
    let server = TestServer::start().await;
    let (status, body) = send(server.client.get(server.url("/health"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let server = TestServer::start().await;
    let (status, body) = send(server.client.get(server.url("/api-docs/openapi.json"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/v1/bookings"].is_object());
}

#[tokio::test]
async fn missing_identity_is_unauthorized() {
    let server = TestServer::start().await;
    let (status, body) = send(
        server
            .client
            .post(server.url("/api/v1/bookings"))
            .json(&server.booking_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], 2001);
}

#[tokio::test]
async fn validation_failure_lists_fields() {
    let server = TestServer::start().await;
    let mut body = server.booking_body();
    body["terms"] = json!(false);
    body["phone"] = json!("98765abc10");

    let (status, response) = send(
        server
            .as_user(server.client.post(server.url("/api/v1/bookings")), server.user)
            .json(&body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["code"], 1001);
    let Some(fields) = response["error"]["fields"].as_array() else {
        panic!("fields missing: {response}");
    };
    let names: Vec<&str> = fields.iter().filter_map(|f| f["field"].as_str()).collect();
    assert_eq!(names, vec!["terms", "phone"]);
}

fn rejected_fields(response: &Value) -> Vec<String> {
    let Some(fields) = response["error"]["fields"].as_array() else {
        panic!("fields missing: {response}");
    };
    fields
        .iter()
        .filter_map(|f| f["field"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn missing_hostel_id_is_a_field_error() {
    let server = TestServer::start().await;
    let mut body = server.booking_body();
    if let Some(object) = body.as_object_mut() {
        object.remove("hostel_id");
    }

    let (status, response) = send(
        server
            .as_user(server.client.post(server.url("/api/v1/bookings")), server.user)
            .json(&body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["code"], 1001);
    assert_eq!(rejected_fields(&response), vec!["hostel_id"]);
}

#[tokio::test]
async fn mistyped_terms_is_a_field_error() {
    let server = TestServer::start().await;
    let mut body = server.booking_body();
    body["terms"] = json!("yes");

    let (status, response) = send(
        server
            .as_user(server.client.post(server.url("/api/v1/bookings")), server.user)
            .json(&body),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"]["code"], 1001);
    assert_eq!(rejected_fields(&response), vec!["terms"]);
}

#[tokio::test]
async fn malformed_status_body_is_a_body_error() {
    let server = TestServer::start().await;
    let (_, created) = create(&server, server.user).await;
    let id = booking_id(&created);

    let (status, response) = send(
        server
            .as_admin(
                server
                    .client
                    .patch(server.url(&format!("/api/v1/bookings/{id}/status"))),
            )
            .header("content-type", "application/json")
            .body("{\"status\": "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected_fields(&response), vec!["body"]);
}

#[tokio::test]
async fn insights_require_admin() {
    let server = TestServer::start().await;
    let (status, body) = send(
        server.as_user(server.client.get(server.url("/api/v1/admin/insights")), server.user),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], 2002);
}

#[tokio::test]
async fn booking_lifecycle_end_to_end() {
    let server = TestServer::start().await;

    let (status, created) = create(&server, server.user).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["gender"], "FEMALE");
    let id = booking_id(&created);
    let status_url = server.url(&format!("/api/v1/bookings/{id}/status"));

    let (status, duplicate) = create(&server, server.user).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate["error"]["code"], 1201);

    let (status, confirmed) = set_status(
        server.as_admin(server.client.patch(&status_url)),
        "CONFIRMED",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed["status"], "CONFIRMED");

    let (status, refused) = set_status(
        server.as_user(server.client.patch(&status_url), server.user),
        "CANCELLED",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(refused["error"]["code"], 1101);

    let (status, cancelled) = set_status(
        server.as_admin(server.client.patch(&status_url)),
        "CANCELLED",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (status, _) = create(&server, server.user).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, list) = send(
        server.as_user(server.client.get(server.url("/api/v1/bookings")), server.user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["pagination"]["total"], 2);
}

#[tokio::test]
async fn owners_see_only_their_bookings() {
    let server = TestServer::start().await;
    let (_, created) = create(&server, server.user).await;
    let id = booking_id(&created);
    let booking_url = server.url(&format!("/api/v1/bookings/{id}"));

    let (status, _) = send(server.as_user(server.client.get(&booking_url), server.other)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = set_status(
        server.as_user(
            server.client.patch(format!("{booking_url}/status")),
            server.other,
        ),
        "CANCELLED",
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(server.as_user(server.client.get(&booking_url), server.user)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn owner_deletes_only_after_cancelling() {
    let server = TestServer::start().await;
    let (_, created) = create(&server, server.user).await;
    let id = booking_id(&created);
    let booking_url = server.url(&format!("/api/v1/bookings/{id}"));

    let (status, body) =
        send(server.as_user(server.client.delete(&booking_url), server.user)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], 1102);

    let (status, _) = set_status(
        server.as_user(
            server.client.patch(format!("{booking_url}/status")),
            server.user,
        ),
        "CANCELLED",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(server.as_user(server.client.delete(&booking_url), server.user)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn admin_update_and_insights() {
    let server = TestServer::start().await;
    let (_, created) = create(&server, server.user).await;
    let id = booking_id(&created);

    let (status, updated) = send(
        server
            .as_admin(
                server
                    .client
                    .put(server.url(&format!("/api/v1/admin/bookings/{id}"))),
            )
            .json(&json!({ "address": "7 Quay Street", "status": "confirmed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["address"], "7 Quay Street");
    assert_eq!(updated["status"], "CONFIRMED");
    assert_eq!(updated["reference"], created["reference"]);

    let (status, insights) = send(
        server.as_admin(
            server
                .client
                .get(server.url("/api/v1/admin/insights?months=3")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(insights["snapshot"]["total_bookings"], 1);
    assert_eq!(insights["snapshot"]["confirmed_bookings"], 1);
    assert_eq!(insights["snapshot"]["total_users"], 3);
    assert_eq!(insights["snapshot"]["listing_requests_total"], 2);
    assert_eq!(insights["snapshot"]["listing_requests_pending"], 1);
    assert_eq!(insights["snapshot"]["listing_requests_rejected"], 1);
    let Some(history) = insights["history"].as_array() else {
        panic!("history missing: {insights}");
    };
    assert_eq!(history.len(), 3);
}

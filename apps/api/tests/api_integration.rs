//! End-to-end API integration tests
//!
//! These tests drive the complete HTTP router over in-memory stores and the
//! mock payment processor:
//! - Registration, login and session lifecycle
//! - Role and plan gates on provider routes
//! - Plan payment, webhook activation and cancellation
//! - Onboarding progress and chat polling

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use marketplace_api::api::build_router;
use marketplace_api::config::AppConfig;
use marketplace_api::infrastructure::payments::MockPaymentProcessor;
use marketplace_api::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt; // for oneshot

struct TestApp {
    router: Router,
    payments: Arc<MockPaymentProcessor>,
}

impl TestApp {
    fn new() -> Self {
        let payments = Arc::new(MockPaymentProcessor::new());
        let state = AppState::in_memory(AppConfig::test(), payments.clone());
        Self {
            router: build_router(state),
            payments,
        }
    }

    async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(serde_json::to_string(&body).unwrap())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn register_viewer(&self, email: &str) -> (String, Value) {
        let (status, json) = self
            .request(
                "POST",
                "/auth/register",
                None,
                Some(json!({
                    "name": "Maria Silva",
                    "email": email,
                    "password": "senha-forte-1"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        (json["sessionToken"].as_str().unwrap().to_string(), json["user"].clone())
    }

    async fn register_provider(&self, email: &str, plan: &str, categories: Value) -> String {
        let (status, json) = self
            .request(
                "POST",
                "/auth/register-provider",
                None,
                Some(json!({
                    "name": "Imobiliária Boa Viagem",
                    "email": email,
                    "password": "senha-forte-1",
                    "documentType": "CNPJ",
                    "documentNumber": "12.345.678/0001-95",
                    "speciality": "Vendas e aluguel",
                    "address": "Av. Boa Viagem, 100",
                    "city": "Recife",
                    "state": "PE",
                    "zipCode": "51020-000",
                    "categories": categories,
                    "planType": plan
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", json);
        assert_eq!(json["user"]["provider"]["planStatus"], "pending");
        json["sessionToken"].as_str().unwrap().to_string()
    }

    /// Pays for `plan` through the mock processor and delivers the webhook
    async fn activate_plan(&self, token: &str, plan: &str) -> Value {
        let (status, started) = self
            .request(
                "POST",
                "/create-subscription",
                Some(token),
                Some(json!({ "planType": plan })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", started);
        let intent_id = started["paymentIntentId"].as_str().unwrap().to_string();

        self.payments.mark_succeeded(&intent_id).unwrap();

        let (status, json) = self
            .request(
                "POST",
                "/webhooks/payment",
                None,
                Some(json!({ "paymentIntentId": intent_id })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", json);
        json["subscription"].clone()
    }
}

fn property_payload() -> Value {
    json!({
        "title": "Apartamento na Boa Viagem",
        "description": "Três quartos, vista para o mar e varanda gourmet.",
        "price": "850000.00",
        "priceType": "sale",
        "propertyType": "apartment",
        "location": "Recife, PE",
        "bedrooms": 3,
        "bathrooms": 2,
        "area": 120,
        "imageUrl": "https://cdn.example.com/apto.jpg",
        "images": ["https://cdn.example.com/apto-2.jpg"]
    })
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_register_login_and_logout_flow() {
    let app = TestApp::new();
    let (_, user) = app.register_viewer("maria@example.com").await;
    assert_eq!(user["userType"], "viewer");
    assert!(user.get("passwordHash").is_none());

    // Login is case-insensitive on the email
    let (status, json) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "MARIA@example.com", "password": "senha-forte-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    let token = json["sessionToken"].as_str().unwrap().to_string();

    let (status, json) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["email"], "maria@example.com");

    let (status, json) = app.request("POST", "/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);

    let (status, json) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new();
    app.register_viewer("maria@example.com").await;

    let (status, json) = app
        .request(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "maria@example.com", "password": "errada-123" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["success"], false);
    assert!(json["message"].is_string());
}

#[tokio::test]
async fn test_register_reports_all_invalid_fields() {
    let app = TestApp::new();

    let (status, json) = app
        .request(
            "POST",
            "/auth/register",
            None,
            Some(json!({ "name": "", "email": "not-an-email", "password": "123" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
    assert_eq!(json["fields"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_and_unknown_tokens_are_unauthorized() {
    let app = TestApp::new();

    let (status, _) = app.request("GET", "/profile", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, json) = app.request("GET", "/profile", Some("nope"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");
}

#[tokio::test]
async fn test_viewer_is_forbidden_on_provider_routes() {
    let app = TestApp::new();
    let (token, _) = app.register_viewer("viewer@example.com").await;

    let (status, json) = app
        .request("POST", "/properties", Some(&token), Some(property_payload()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "forbidden");

    let (status, _) = app
        .request("GET", "/provider/onboarding", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_realtor_lists_property_after_payment() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "B", json!(["imobiliaria"]))
        .await;

    // Plan still pending
    let (status, json) = app
        .request("POST", "/properties", Some(&token), Some(property_payload()))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["message"].as_str().unwrap().contains("plan"));

    let subscription = app.activate_plan(&token, "B").await;
    assert_eq!(subscription["status"], "active");
    assert_eq!(subscription["planType"], "B");

    let (status, json) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["provider"]["planStatus"], "active");

    let (status, json) = app
        .request("POST", "/properties", Some(&token), Some(property_payload()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", json);
    assert_eq!(json["property"]["views"], 0);
    assert_eq!(json["property"]["status"], "available");
    assert_eq!(json["property"]["agencyName"], "Imobiliária Boa Viagem");
    let property_id = json["property"]["id"].as_str().unwrap().to_string();

    // Public reads
    let (status, json) = app
        .request("POST", &format!("/properties/{}/view", property_id), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["views"], 1);

    let (status, json) = app
        .request("GET", "/properties?city=recife&priceType=sale", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["properties"].as_array().unwrap().len(), 1);

    let (status, json) = app
        .request("GET", "/provider/properties", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["properties"][0]["id"], property_id.as_str());
}

#[tokio::test]
async fn test_property_validation_lists_every_field() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "B", json!(["imobiliaria"]))
        .await;
    app.activate_plan(&token, "B").await;

    let (status, json) = app
        .request(
            "POST",
            "/properties",
            Some(&token),
            Some(json!({
                "title": "Apt",
                "description": "curta",
                "priceType": "sale",
                "propertyType": "apartment",
                "location": "Recife",
                "bathrooms": 0,
                "area": 0,
                "imageUrl": "not a url"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    for expected in ["title", "description", "price", "bathrooms", "area", "imageUrl"] {
        assert!(fields.contains(&expected), "missing {} in {:?}", expected, fields);
    }
}

#[tokio::test]
async fn test_wrongly_typed_property_fields_are_listed() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "B", json!(["imobiliaria"]))
        .await;
    app.activate_plan(&token, "B").await;

    let mut payload = property_payload();
    payload["title"] = json!("Apt");
    payload["priceType"] = json!("lease");
    payload["price"] = json!("caro");
    payload["bedrooms"] = json!("três");

    let (status, json) = app
        .request("POST", "/properties", Some(&token), Some(payload))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST, "{}", json);
    assert_eq!(json["error"], "validation_error");
    let fields: Vec<&str> = json["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    for expected in ["title", "priceType", "price", "bedrooms"] {
        assert!(fields.contains(&expected), "missing {} in {:?}", expected, fields);
    }
}

#[tokio::test]
async fn test_malformed_ids_in_paths_are_json_errors() {
    let app = TestApp::new();
    let (token, _) = app.register_viewer("alice@example.com").await;

    let cases = [
        ("GET", "/properties/not-a-uuid"),
        ("POST", "/properties/not-a-uuid/view"),
        ("POST", "/subscriptions/not-a-uuid/cancel"),
        ("GET", "/chat/conversations/not-a-uuid/messages"),
    ];
    for (method, uri) in cases {
        let (status, json) = app.request(method, uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", method, uri);
        assert_eq!(json["success"], false, "{} {}", method, uri);
        assert_eq!(json["error"], "validation_error", "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_non_realtor_gets_category_error_first() {
    let app = TestApp::new();
    let token = app
        .register_provider("pintor@example.com", "B", json!(["pintor"]))
        .await;

    let (status, json) = app
        .request("POST", "/properties", Some(&token), Some(property_payload()))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(json["message"].as_str().unwrap().contains("category"));
}

#[tokio::test]
async fn test_webhook_is_idempotent() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "A", json!(["imobiliaria"]))
        .await;
    let first = app.activate_plan(&token, "A").await;

    let (status, again) = app
        .request(
            "POST",
            "/webhooks/payment",
            None,
            Some(json!({ "paymentIntentId": first["paymentIntentId"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["subscription"]["id"], first["id"]);

    let (_, list) = app.request("GET", "/subscriptions", Some(&token), None).await;
    assert_eq!(list["subscriptions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unpaid_webhook_is_rejected() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "A", json!(["imobiliaria"]))
        .await;
    let (_, started) = app
        .request(
            "POST",
            "/create-subscription",
            Some(&token),
            Some(json!({ "planType": "A" })),
        )
        .await;

    let (status, json) = app
        .request(
            "POST",
            "/webhooks/payment",
            None,
            Some(json!({ "paymentIntentId": started["paymentIntentId"] })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "policy_violation");
}

#[tokio::test]
async fn test_payment_failure_leaves_account_untouched() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "A", json!(["imobiliaria"]))
        .await;
    app.activate_plan(&token, "A").await;
    app.payments.set_unavailable(true);

    let (status, json) = app
        .request(
            "POST",
            "/create-subscription",
            Some(&token),
            Some(json!({ "planType": "B" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "external_service_error");

    let (_, json) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(json["user"]["provider"]["planType"], "A");
    assert_eq!(json["user"]["provider"]["planStatus"], "active");
}

#[tokio::test]
async fn test_cancel_twice_returns_same_state() {
    let app = TestApp::new();
    let token = app
        .register_provider("imob@example.com", "B", json!(["imobiliaria"]))
        .await;
    let subscription = app.activate_plan(&token, "B").await;
    let uri = format!("/subscriptions/{}/cancel", subscription["id"].as_str().unwrap());

    let (status, first) = app.request("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["subscription"]["status"], "cancellation_pending");
    assert_eq!(first["subscription"]["autoRenew"], false);

    let (status, second) = app.request("POST", &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        second["subscription"]["cancelledAt"],
        first["subscription"]["cancelledAt"]
    );

    // Access continues until the period ends
    let (status, _) = app
        .request("POST", "/properties", Some(&token), Some(property_payload()))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    // Someone else's subscription does not exist for the caller
    let (other, _) = app.register_viewer("other@example.com").await;
    let (status, _) = app.request("POST", &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_onboarding_reaches_threshold() {
    let app = TestApp::new();
    let token = app
        .register_provider("eletricista@example.com", "A", json!(["eletricista"]))
        .await;

    let (status, json) = app
        .request("GET", "/provider/onboarding", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["onboardingComplete"], false);
    assert_eq!(json["nextStep"], "basic-info");

    let (status, json) = app
        .request(
            "PUT",
            "/profile",
            Some(&token),
            Some(json!({
                "profileImageUrl": "https://cdn.example.com/me.jpg",
                "description": "Instalações elétricas residenciais",
                "portfolioImages": ["https://cdn.example.com/obra.jpg"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    // Recomputed on the same response
    assert_eq!(json["onboarding"]["completionPercentage"], 80);

    let (_, json) = app
        .request("GET", "/provider/onboarding", Some(&token), None)
        .await;
    assert_eq!(json["completionPercentage"], 80);
    assert_eq!(json["onboardingComplete"], true);
    assert_eq!(json["nextStep"], "documents");
}

#[tokio::test]
async fn test_viewer_cannot_edit_provider_fields() {
    let app = TestApp::new();
    let (token, _) = app.register_viewer("viewer@example.com").await;

    let (status, _) = app
        .request(
            "PUT",
            "/profile",
            Some(&token),
            Some(json!({ "speciality": "Pintura" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, json) = app
        .request("PUT", "/profile", Some(&token), Some(json!({ "name": "Maria S." })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["name"], "Maria S.");
    assert!(json.get("onboarding").is_none());
}

#[tokio::test]
async fn test_plan_b_category_limit() {
    let app = TestApp::new();
    let token = app
        .register_provider("multi@example.com", "B", json!(["pintor"]))
        .await;

    let (status, json) = app
        .request(
            "PUT",
            "/user/categories",
            Some(&token),
            Some(json!({
                "categoryIds": ["pintor", "pedreiro", "eletricista", "encanador", "diarista", "jardineiro"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"], "policy_violation");

    let (status, json) = app
        .request(
            "PUT",
            "/user/categories",
            Some(&token),
            Some(json!({ "categoryIds": ["pintor", "imobiliaria"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["provider"]["categories"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_upgrade_to_provider() {
    let app = TestApp::new();
    let (token, _) = app.register_viewer("viewer@example.com").await;
    let provider = json!({
        "documentType": "CPF",
        "documentNumber": "123.456.789-09",
        "categories": ["diarista"],
        "planType": "A"
    });

    let (status, json) = app
        .request("POST", "/auth/upgrade-to-provider", Some(&token), Some(provider.clone()))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["user"]["userType"], "provider");
    assert_eq!(json["user"]["provider"]["planStatus"], "pending");

    // Same token now resolves to the provider
    let (_, me) = app.request("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(me["user"]["userType"], "provider");

    let (status, json) = app
        .request("POST", "/auth/upgrade-to-provider", Some(&token), Some(provider))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "invalid_state");
}

#[tokio::test]
async fn test_upgrade_with_prior_payment_is_active() {
    let app = TestApp::new();
    let (token, _) = app.register_viewer("viewer@example.com").await;
    let subscription = app.activate_plan(&token, "B").await;

    let (status, json) = app
        .request(
            "POST",
            "/auth/upgrade-to-provider",
            Some(&token),
            Some(json!({
                "documentType": "CNPJ",
                "documentNumber": "12345678000195",
                "categories": ["imobiliaria"],
                "planType": "A",
                "paymentIntentId": subscription["paymentIntentId"]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", json);
    assert_eq!(json["user"]["provider"]["planStatus"], "active");
    assert_eq!(json["user"]["provider"]["planType"], "B");
}

#[tokio::test]
async fn test_chat_flow() {
    let app = TestApp::new();
    let (alice, alice_user) = app.register_viewer("alice@example.com").await;
    let (bob, bob_user) = app.register_viewer("bob@example.com").await;
    let (mallory, _) = app.register_viewer("mallory@example.com").await;

    let (status, json) = app
        .request(
            "POST",
            "/chat/conversations",
            Some(&alice),
            Some(json!({ "participantId": bob_user["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = json["conversation"]["id"].as_str().unwrap().to_string();
    let messages_uri = format!("/chat/conversations/{}/messages", conversation_id);

    // Opening again from the other side finds the same conversation
    let (_, json) = app
        .request(
            "POST",
            "/chat/conversations",
            Some(&bob),
            Some(json!({ "participantId": alice_user["id"] })),
        )
        .await;
    assert_eq!(json["conversation"]["id"], conversation_id.as_str());

    let (status, json) = app
        .request(
            "POST",
            &messages_uri,
            Some(&alice),
            Some(json!({ "content": "O imóvel ainda está disponível?" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["message"]["senderId"], alice_user["id"]);

    let (status, json) = app.request("GET", &messages_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["messages"].as_array().unwrap().len(), 1);
    let first_id = json["messages"][0]["id"].as_str().unwrap().to_string();

    let (status, json) = app
        .request(
            "POST",
            &messages_uri,
            Some(&bob),
            Some(json!({ "content": "Sim, quer visitar?" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let reply_id = json["message"]["id"].as_str().unwrap().to_string();

    let (status, json) = app
        .request(
            "GET",
            &format!("{}?afterId={}", messages_uri, first_id),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let polled = json["messages"].as_array().unwrap();
    assert_eq!(polled.len(), 1);
    assert_eq!(polled[0]["id"], reply_id.as_str());

    let (status, json) = app
        .request(
            "GET",
            &format!("{}?afterId={}", messages_uri, uuid::Uuid::new_v4()),
            Some(&alice),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");

    let (status, _) = app
        .request("POST", &messages_uri, Some(&alice), Some(json!({ "content": "   " })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.request("GET", &messages_uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, json) = app
        .request("GET", "/chat/conversations", Some(&bob), None)
        .await;
    assert_eq!(json["conversations"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .request(
            "POST",
            "/chat/conversations",
            Some(&alice),
            Some(json!({ "participantId": alice_user["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

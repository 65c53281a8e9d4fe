//! Route-level tests: requests go through the full router and its layers.

#![cfg(all(feature = "http-server", feature = "local-repo"))]

mod support;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use brokerdesk::auth::LocalAuthProvider;
use brokerdesk::db::repository::{FullRepository, LedgerRepository};
use brokerdesk::db::LocalRepository;
use brokerdesk::http::{create_router, AppState};

fn app() -> (Router, Arc<LocalRepository>) {
    let repo = Arc::new(LocalRepository::new());
    let state = AppState::new(
        repo.clone() as Arc<dyn FullRepository>,
        Arc::new(LocalAuthProvider::new()),
    );
    (create_router(state), repo)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_client(app: &Router, name: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/v1/clients",
        Some(json!({"name": name, "phone": "11987654321"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body
}

#[tokio::test]
async fn test_health() {
    let (app, repo) = app();
    let (status, body) = send(&app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "connected");

    repo.set_healthy(false);
    let (_, body) = send(&app, Method::GET, "/health", None).await;
    assert_ne!(body["database"], "connected");
}

#[tokio::test]
async fn test_client_validation_returns_field_errors() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::POST, "/v1/clients", Some(json!({"name": "X1"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
}

#[tokio::test]
async fn test_client_crud_and_search() {
    let (app, _) = app();
    let ana = create_client(&app, "Ana Lima").await;
    create_client(&app, "Bruno Dias").await;

    let (status, body) = send(&app, Method::GET, "/v1/clients?search=lima", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["clients"][0]["name"], "Ana Lima");

    let uri = format!("/v1/clients/{}", ana["id"].as_str().unwrap());
    let (status, _) = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_policy_list_filters_sorts_and_activates() {
    let (app, _) = app();
    let client = create_client(&app, "Carla Reis").await;
    for (number, premium, status) in [
        ("AP-1", 900.0, "Ativa"),
        ("AP-2", 1500.0, "Ativa"),
        ("AP-3", 300.0, "Orçamento"),
    ] {
        let (code, _) = send(
            &app,
            Method::POST,
            "/v1/policies",
            Some(json!({
                "client_id": client["id"],
                "policy_number": number,
                "insured_asset": "Apartamento",
                "premium_value": premium,
                "commission_rate": 10.0,
                "status": status,
                "expiration_date": "2099-01-01"
            })),
        )
        .await;
        assert_eq!(code, StatusCode::CREATED);
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/policies?status=Ativa&sortKey=premiumValue&sortDirection=desc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["policies"][0]["policy_number"], "AP-2");
    assert_eq!(body["kpis"]["total_premium"], 2400.0);

    let quote = send(&app, Method::GET, "/v1/policies?status=Or%C3%A7amento", None).await.1;
    let id = quote["policies"][0]["id"].as_str().unwrap().to_string();
    let uri = format!("/v1/policies/{}/activate", id);
    let (status, first) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["already_generated"], false);
    assert_eq!(first["commission"]["amount"], 30.0);

    let (_, second) = send(&app, Method::POST, &uri, None).await;
    assert_eq!(second["already_generated"], true);
}

#[tokio::test]
async fn test_policy_for_unknown_client_is_404() {
    let (app, _) = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/policies",
        Some(json!({
            "client_id": uuid::Uuid::new_v4(),
            "insured_asset": "Casa",
            "premium_value": 100.0,
            "commission_rate": 10.0,
            "status": "Ativa",
            "expiration_date": "2099-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_policy_validation_returns_field_errors() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/policies",
        Some(json!({
            "client_id": uuid::Uuid::new_v4(),
            "insured_asset": "Casa",
            "premium_value": -5.0,
            "commission_rate": 140.0,
            "status": "Orçamento",
            "expiration_date": "2099-01-01"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["message"], "Prêmio deve ser um valor positivo");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, ["premium_value", "commission_rate"]);
}

#[tokio::test]
async fn test_ledger_summary_checks_period() {
    let (app, _) = app();
    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/ledger/summary?start=2025-03-31&end=2025-03-01",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        Method::GET,
        "/v1/ledger/summary?start=2025-03-01&end=2025-03-31",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, balances) = send(&app, Method::GET, "/v1/ledger/balances", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(balances.is_array());
}

#[tokio::test]
async fn test_revenue_movement_round_trip() {
    let (app, repo) = app();
    let accounts = repo.ensure_default_accounts().await.unwrap();
    let id_of = |name: &str| accounts.iter().find(|a| a.name == name).unwrap().id;

    let (status, created) = send(
        &app,
        Method::POST,
        "/v1/ledger/movements",
        Some(json!({
            "kind": "revenue",
            "description": "Consultoria",
            "amount": 420.0,
            "transaction_date": "2025-03-10",
            "category_account_id": id_of("Outras Receitas"),
            "asset_account_id": id_of("Caixa"),
            "is_confirmed": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (_, recent) = send(&app, Method::GET, "/v1/ledger/movements?kind=revenue", None).await;
    assert_eq!(recent.as_array().unwrap().len(), 1);

    let uri = format!("/v1/ledger/movements/{}/void", id);
    let (status, body) = send(&app, Method::POST, &uri, Some(json!({"reason": " "}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("motivo"));

    let (status, body) = send(&app, Method::POST, &uri, Some(json!({"reason": "Erro"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_claims_status_flow() {
    let (app, _) = app();
    let (status, claim) = send(
        &app,
        Method::POST,
        "/v1/claims",
        Some(json!({
            "occurrence_date": "2025-01-05",
            "claim_type": "Colisão",
            "description": "Batida no estacionamento"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(claim["status"], "Aberto");
    let id = claim["id"].as_str().unwrap().to_string();

    let uri = format!("/v1/claims/{}/status", id);
    let (status, body) = send(&app, Method::POST, &uri, Some(json!({"status": "Finalizado"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Transição"));

    let (status, body) = send(&app, Method::POST, &uri, Some(json!({"status": "Em Análise"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Em Análise");

    let (_, list) = send(&app, Method::GET, "/v1/claims?status=Aberto", None).await;
    assert_eq!(list["total"], 0);
    assert_eq!(list["stats"]["total"], 1);

    let (_, activities) = send(&app, Method::GET, &format!("/v1/claims/{}/activities", id), None).await;
    assert!(!activities.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reconciliation_rejects_empty_statement() {
    let (app, _) = app();
    let (status, _) = send(
        &app,
        Method::POST,
        "/v1/reconciliation/import",
        Some(json!({
            "bank_account_id": uuid::Uuid::new_v4(),
            "file_name": "vazio.csv",
            "entries": []
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, "/v1/reconciliation/suggestions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
}

#[tokio::test]
async fn test_dashboard_and_focus() {
    let (app, _) = app();
    let (status, body) = send(&app, Method::GET, "/v1/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["client_count"], 0);

    let (status, body) = send(&app, Method::GET, "/v1/appointments/focus?limit=3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["focus"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_auth_routes() {
    let (app, _) = app();
    let credentials = json!({"email": "ana@example.com", "password": "segredo1", "full_name": "Ana"});
    let (status, body) = send(&app, Method::POST, "/v1/auth/sign-up", Some(credentials.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["email"], "ana@example.com");

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/auth/sign-in",
        Some(json!({"email": "ana@example.com", "password": "errada"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Email ou senha incorretos");

    let (status, session) = send(&app, Method::POST, "/v1/auth/sign-in", Some(credentials)).await;
    assert_eq!(status, StatusCode::OK);
    let token = session["access_token"].as_str().unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/auth/sign-out")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let (status, _) = send(&app, Method::POST, "/v1/auth/sign-out", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

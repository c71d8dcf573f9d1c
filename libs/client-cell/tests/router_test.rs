use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use client_cell::client_routes;
use shared_utils::test_utils::{access_token, send_json, TestConfig, TestUser};
use shared_utils::AppState;

fn app(state: &AppState) -> axum::Router {
    axum::Router::new().nest("/clients", client_routes(state.clone()))
}

fn client_body(cpf: &str) -> Value {
    json!({
        "name": "Maria Souza",
        "cpf": cpf,
        "phone": "(11) 98765-4321",
        "cep": "01310-100"
    })
}

#[tokio::test]
async fn test_client_lifecycle_and_gates() {
    let state = TestConfig::default().to_state();
    let owner = TestUser::cliente("dono@test.com").persist(&state.db, "Senha123").await;
    let stranger = TestUser::cliente("outro@test.com").persist(&state.db, "Senha123").await;
    let admin = TestUser::admin("admin@test.com");
    let mecanico = TestUser::mecanico("mec@test.com");

    let owner_token = access_token(&state, &owner);
    let stranger_token = access_token(&state, &stranger);
    let admin_token = access_token(&state, &admin);
    let mecanico_token = access_token(&state, &mecanico);

    let (status, body) = send_json(
        app(&state),
        Method::POST,
        "/clients",
        Some(&owner_token),
        Some(client_body("529.982.247-25")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], owner.id);
    let uri = format!("/clients/{}", body["id"]);

    let (status, body) = send_json(app(&state), Method::GET, "/clients/me", Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cpf"], "52998224725");

    // Owner-or-Admin on a single record.
    let (status, _) = send_json(app(&state), Method::GET, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send_json(app(&state), Method::GET, &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    let (status, _) = send_json(app(&state), Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    // Listing is staff only.
    let (status, _) = send_json(app(&state), Method::GET, "/clients", Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send_json(app(&state), Method::GET, "/clients?search=maria", Some(&mecanico_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);

    // Mechanics cannot create clients.
    let (status, _) = send_json(
        app(&state),
        Method::POST,
        "/clients",
        Some(&mecanico_token),
        Some(client_body("111.444.777-35")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send_json(
        app(&state),
        Method::PUT,
        &uri,
        Some(&owner_token),
        Some(json!({ "address": "Rua Augusta, 500" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["address"], "Rua Augusta, 500");

    let (status, _) = send_json(app(&state), Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send_json(app(&state), Method::DELETE, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send_json(app(&state), Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_documents_are_unprocessable() {
    let state = TestConfig::default().to_state();
    let admin_token = access_token(&state, &TestUser::admin("admin@test.com"));

    let (status, body) = send_json(
        app(&state),
        Method::POST,
        "/clients",
        Some(&admin_token),
        Some(client_body("111.111.111-11")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_me_without_record_is_not_found() {
    let state = TestConfig::default().to_state();
    let token = access_token(&state, &TestUser::cliente("novo@test.com"));

    let (status, _) = send_json(app(&state), Method::GET, "/clients/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send_json(app(&state), Method::GET, "/clients/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let state = TestConfig::default().to_state();
    let token = access_token(&state, &TestUser::admin("admin@test.com"));

    let (status, body) = send_json(app(&state), Method::GET, "/clients/abc", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

use axum::http::{Method, StatusCode};
use chrono::Utc;
use serde_json::json;

use shared_models::workshop::Client;
use shared_utils::test_utils::{access_token, send_json, TestConfig, TestUser};
use shared_utils::AppState;
use vehicle_cell::vehicle_routes;

fn app(state: &AppState) -> axum::Router {
    axum::Router::new().nest("/vehicles", vehicle_routes(state.clone()))
}

async fn seed_client(state: &AppState, owner: i64) -> Client {
    let now = Utc::now();
    state
        .db
        .clients
        .insert(|id| Client {
            id,
            user_id: Some(owner),
            name: "Maria Souza".to_string(),
            cpf: "52998224725".to_string(),
            email: None,
            phone: "11987654321".to_string(),
            cep: None,
            address: None,
            created_at: now,
            updated_at: now,
        })
        .await
}

#[tokio::test]
async fn test_vehicle_routes() {
    let state = TestConfig::default().to_state();
    let owner = TestUser::cliente("dono@test.com");
    let stranger = TestUser::cliente("outro@test.com");
    let client = seed_client(&state, owner.id).await;

    let owner_token = access_token(&state, &owner);
    let stranger_token = access_token(&state, &stranger);
    let mecanico_token = access_token(&state, &TestUser::mecanico("mec@test.com"));
    let admin_token = access_token(&state, &TestUser::admin("admin@test.com"));

    let (status, body) = send_json(
        app(&state),
        Method::POST,
        "/vehicles",
        Some(&owner_token),
        Some(json!({
            "client_id": client.id,
            "plate": "bra-2e19",
            "brand": "Chevrolet",
            "model": "Onix",
            "year": 2021,
            "mileage": 30000
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["plate"], "BRA2E19");
    let uri = format!("/vehicles/{}", body["id"]);

    let (status, _) = send_json(app(&state), Method::GET, &uri, Some(&mecanico_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send_json(app(&state), Method::GET, &uri, Some(&stranger_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send_json(app(&state), Method::GET, "/vehicles", Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send_json(
        app(&state),
        Method::GET,
        &format!("/vehicles?client_id={}&plate=bra", client.id),
        Some(&mecanico_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["model"], "Onix");

    let (status, body) = send_json(
        app(&state),
        Method::PUT,
        &uri,
        Some(&owner_token),
        Some(json!({ "mileage": 1000 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send_json(
        app(&state),
        Method::GET,
        &format!("{}/history", uri),
        Some(&owner_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["vehicle"]["plate"], "BRA2E19");
    assert!(body["inspections"].as_array().unwrap().is_empty());

    let (status, _) = send_json(app(&state), Method::DELETE, &uri, Some(&owner_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send_json(app(&state), Method::DELETE, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_mecanico_cannot_register_vehicles() {
    let state = TestConfig::default().to_state();
    let owner = TestUser::cliente("dono@test.com");
    let client = seed_client(&state, owner.id).await;
    let mecanico_token = access_token(&state, &TestUser::mecanico("mec@test.com"));

    let (status, _) = send_json(
        app(&state),
        Method::POST,
        "/vehicles",
        Some(&mecanico_token),
        Some(json!({
            "client_id": client.id,
            "plate": "ABC1234",
            "brand": "Fiat",
            "model": "Uno",
            "year": 2010
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

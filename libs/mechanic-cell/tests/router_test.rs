use axum::http::{Method, StatusCode};
use serde_json::json;

use mechanic_cell::mechanic_routes;
use shared_utils::test_utils::{access_token, send_json, TestConfig, TestUser};
use shared_utils::AppState;

fn app(state: &AppState) -> axum::Router {
    axum::Router::new().nest("/mechanics", mechanic_routes(state.clone()))
}

#[tokio::test]
async fn test_anonymous_listing_hides_contacts() {
    let state = TestConfig::default().to_state();
    let admin_token = access_token(&state, &TestUser::admin("admin@test.com"));

    let (status, body) = send_json(
        app(&state),
        Method::POST,
        "/mechanics",
        Some(&admin_token),
        Some(json!({
            "name": "Carlos Pereira",
            "specialty": "Motor",
            "phone": "(11) 91234-5678",
            "email": "carlos@oficina.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/mechanics/{}", body["id"]);

    // No Authorization header at all.
    let (status, body) = send_json(app(&state), Method::GET, "/mechanics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["name"], "Carlos Pereira");
    assert!(body["data"][0].get("phone").is_none());
    assert!(body["data"][0].get("email").is_none());

    // A broken token degrades to the anonymous view instead of failing.
    let (status, body) = send_json(app(&state), Method::GET, &uri, Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("phone").is_none());

    let (status, body) = send_json(app(&state), Method::GET, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["phone"], "11912345678");
}

#[tokio::test]
async fn test_deactivation_and_include_inactive() {
    let state = TestConfig::default().to_state();
    let admin_token = access_token(&state, &TestUser::admin("admin@test.com"));
    let cliente_token = access_token(&state, &TestUser::cliente("cliente@test.com"));

    let (_, body) = send_json(
        app(&state),
        Method::POST,
        "/mechanics",
        Some(&admin_token),
        Some(json!({ "name": "Pedro" })),
    )
    .await;
    let uri = format!("/mechanics/{}", body["id"]);

    let (status, _) = send_json(app(&state), Method::DELETE, &uri, Some(&cliente_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send_json(app(&state), Method::DELETE, &uri, Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mechanic"]["active"], false);

    let (status, _) = send_json(app(&state), Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send_json(
        app(&state),
        Method::GET,
        "/mechanics?include_inactive=true",
        Some(&cliente_token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 0);

    let (_, body) = send_json(
        app(&state),
        Method::GET,
        "/mechanics?include_inactive=true",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_writes_require_authentication() {
    let state = TestConfig::default().to_state();

    let (status, body) = send_json(
        app(&state),
        Method::POST,
        "/mechanics",
        None,
        Some(json!({ "name": "Pedro" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_TOKEN");

    let (status, _) = send_json(
        app(&state),
        Method::PUT,
        "/mechanics/1",
        None,
        Some(json!({ "name": "Pedro" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// System endpoint tests: health, OpenAPI

use super::*;

#[tokio::test]
async fn test_health_check_returns_status_ok_and_version() {
    let app = create_router(
        Arc::new(StubIngester::default()),
        Arc::new(Config::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert_eq!(json["status"], "ok", "health endpoint should report status=ok");
    assert_eq!(
        json["version"],
        env!("CARGO_PKG_VERSION"),
        "health endpoint should return the crate version"
    );
}

#[tokio::test]
async fn test_openapi_endpoint_serves_spec() {
    let app = create_router(
        Arc::new(StubIngester::default()),
        Arc::new(Config::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/openapi.json")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = json_body(response).await;
    assert!(json["openapi"].as_str().unwrap().starts_with("3."));
    assert!(json["paths"]["/documents/batch"]["post"].is_object());
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let app = create_router(
        Arc::new(StubIngester::default()),
        Arc::new(Config::default()),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/no-such-route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

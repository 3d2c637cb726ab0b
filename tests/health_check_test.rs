mod common;

use common::TestApp;

#[tokio::test]
async fn health_check_reports_service_and_database() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "resource-hub");
    assert_eq!(body["database"], "up");

    app.cleanup().await;
}

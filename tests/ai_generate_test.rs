mod common;

use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn generate_without_credential_uses_local_fallback() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/ai/generate", app.address))
        .json(&json!({
            "title": "Introdução à Programação Funcional",
            "resource_type": "video"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    // The fallback template embeds the title verbatim.
    let description = body["description"].as_str().unwrap();
    assert!(description.contains("Introdução à Programação Funcional"));

    let tags = body["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(
        tags,
        &vec![json!("introdução"), json!("programação"), json!("funcional")]
    );

    app.cleanup().await;
}

#[tokio::test]
async fn generate_pads_tags_for_short_titles() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/ai/generate", app.address))
        .json(&json!({
            "title": "Cálculo I",
            "resource_type": "pdf"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    let tags = body["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 3);
    assert_eq!(tags[0], "cálculo");

    app.cleanup().await;
}

#[tokio::test]
async fn generate_description_varies_by_resource_type() {
    let app = TestApp::spawn().await;

    let mut descriptions = Vec::new();
    for resource_type in ["video", "pdf", "link"] {
        let response = app
            .client
            .post(format!("{}/ai/generate", app.address))
            .json(&json!({
                "title": "Estruturas de Dados Avançadas",
                "resource_type": resource_type
            }))
            .send()
            .await
            .expect("Failed to execute request");

        assert_eq!(response.status().as_u16(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        descriptions.push(body["description"].as_str().unwrap().to_string());
    }

    assert_ne!(descriptions[0], descriptions[1]);
    assert_ne!(descriptions[1], descriptions[2]);

    app.cleanup().await;
}

#[tokio::test]
async fn generate_rejects_short_title() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/ai/generate", app.address))
        .json(&json!({
            "title": "ab",
            "resource_type": "video"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn generate_rejects_unknown_resource_type() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(format!("{}/ai/generate", app.address))
        .json(&json!({
            "title": "Título Perfeitamente Válido",
            "resource_type": "podcast"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    // Serde rejects the unknown enum variant during deserialization.
    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

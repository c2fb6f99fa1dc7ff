mod common;

use anyhow::Result;
use cape_hq::config::AppConfig;
use cape_hq::testing::TestApp;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};

fn image_form(field: &str, bytes: Vec<u8>, filename: &str, mime: &str) -> Result<Form> {
    let part = Part::bytes(bytes).file_name(filename.to_string()).mime_str(mime)?;
    Ok(Form::new().part(field.to_string(), part))
}

#[tokio::test]
async fn own_profile_is_readable_and_restricted() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let res = server.get("/api/profile", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["codename"], "Raven");

    let res = server.get("/api/profile", "nobody").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server
        .patch("/api/profile", "u1")
        .json(&json!({"theme": "DARK", "accessibility_settings": {"reduced_motion": true}}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["theme"], "dark");
    assert_eq!(body["accessibility_settings"]["reduced_motion"], true);

    // no self-promotion
    let res = server
        .patch("/api/profile", "u1")
        .json(&json!({"clearance_level": 10}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.patch("/api/profile", "u1").json(&json!({"theme": "neon"})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.get("/api/profile", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["clearance_level"], 3);
    Ok(())
}

#[tokio::test]
async fn admin_variant_reads_and_edits_other_profiles() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("admin", "Oracle", 9).await;
    server.app.seed_profile("u1", "Raven", 3).await;

    let res = server.get("/api/profile/u1", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get("/api/profile/u1", "admin").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .patch("/api/profile/u1", "admin")
        .json(&json!({"codename": "Rachel Roth", "clearance_level": 5}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["codename"], "Rachel Roth");

    let logs = server.app.store.audit_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "profile_update");
    assert_eq!(logs[0].changes, json!({"codename": "Rachel Roth", "clearance_level": 5}));
    Ok(())
}

#[tokio::test]
async fn non_image_avatar_is_rejected_without_storing() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let form = image_form("avatar", b"#!/bin/sh\necho hi\n".to_vec(), "evil.sh", "text/x-shellscript")?;
    let res = server.post("/api/profile/avatar", "u1").multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(server.app.avatars.keys().await.is_empty());
    assert!(server.app.store.audit_logs().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn oversized_avatar_is_rejected() -> Result<()> {
    let mut config = AppConfig::development();
    config.storage.max_avatar_bytes = 1024;
    let server = common::TestServer::spawn_app(TestApp::with_config(config)).await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let form = image_form("avatar", vec![0u8; 4096], "big.png", "image/png")?;
    let res = server.post("/api/profile/avatar", "u1").multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(server.app.avatars.keys().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn avatar_upload_replace_and_delete() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let form = image_form("avatar", vec![0x89, b'P', b'N', b'G'], "me.png", "image/png")?;
    let res = server.post("/api/profile/avatar", "u1").multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let first_url = body["avatar_url"].as_str().unwrap_or_default().to_string();
    assert!(first_url.starts_with("http://localhost:3000/avatars/u1/"));
    assert!(first_url.ends_with(".png"));

    let keys = server.app.avatars.keys().await;
    assert_eq!(keys.len(), 1);
    assert_eq!(server.app.avatars.content_type(&keys[0]).await.as_deref(), Some("image/png"));

    // the `file` field name is accepted too, and the old object goes away
    let form = image_form("file", vec![0xFF, 0xD8, 0xFF], "new.jpg", "image/jpeg")?;
    let res = server.post("/api/profile/avatar", "u1").multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let keys = server.app.avatars.keys().await;
    assert_eq!(keys.len(), 1);
    assert!(keys[0].ends_with(".jpg"));

    let res = server.delete("/api/profile/avatar", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert!(body["avatar_url"].is_null());
    assert!(server.app.avatars.keys().await.is_empty());

    let res = server.delete("/api/profile/avatar", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let actions: Vec<String> = server.app.store.audit_logs().await.into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["avatar_upload", "avatar_upload", "avatar_delete"]);
    Ok(())
}

#[tokio::test]
async fn failed_avatar_audit_leaves_no_orphan() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;
    server.app.store.fail_audit_writes(true);

    let form = image_form("avatar", vec![1, 2, 3], "me.png", "image/png")?;
    let res = server.post("/api/profile/avatar", "u1").multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(server.app.avatars.keys().await.is_empty());

    let res = server.get("/api/profile", "u1").send().await?;
    let body: Value = res.json().await?;
    assert!(body["avatar_url"].is_null());
    Ok(())
}

#[tokio::test]
async fn failed_avatar_delete_keeps_object_and_url() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let form = image_form("avatar", vec![0x89, b'P', b'N', b'G'], "me.png", "image/png")?;
    let res = server.post("/api/profile/avatar", "u1").multipart(form).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let url = body["avatar_url"].as_str().unwrap_or_default().to_string();
    let keys = server.app.avatars.keys().await;
    assert_eq!(keys.len(), 1);

    server.app.store.fail_audit_writes(true);
    let res = server.delete("/api/profile/avatar", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(server.app.avatars.keys().await, keys);
    let res = server.get("/api/profile", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["avatar_url"], url.as_str());
    Ok(())
}

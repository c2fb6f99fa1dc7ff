mod common;

use anyhow::Result;
use cape_hq::types::Priority;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn mention_creates_one_notification_per_existing_user() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    server.app.seed_profile("u2", "Starfire", 3).await;
    let ticket = server.app.seed_ticket("u1", "Reactor leak", Priority::Omega).await;

    let res = server
        .post(&format!("/api/tickets/{}/comments", ticket.id), "u1")
        .json(&json!({
            "content": "Need backup @[Starfire](u2), @[Ghost](ghost) and again @[Starfire](u2)"
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let comment: Value = res.json().await?;
    assert_eq!(comment["author_id"], "u1");
    assert_eq!(comment["mentioned_heroes"], json!(["u2", "ghost"]));

    let notifications = server.app.store.notifications().await;
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].recipient_id, "u2");
    assert_eq!(notifications[0].sender_id, "u1");
    assert_eq!(notifications[0].ticket_id, Some(ticket.id));
    assert!(!notifications[0].read);
    Ok(())
}

#[tokio::test]
async fn explicit_mentions_override_content() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    server.app.seed_profile("u2", "Starfire", 3).await;
    server.app.seed_profile("u3", "Raven", 3).await;
    let ticket = server.app.seed_ticket("u1", "Reactor leak", Priority::Omega).await;

    let res = server
        .post(&format!("/api/tickets/{}/comments", ticket.id), "u1")
        .json(&json!({"content": "cc @[Starfire](u2)", "mentioned_heroes": ["u3"]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let recipients: Vec<String> = server
        .app
        .store
        .notifications()
        .await
        .into_iter()
        .map(|n| n.recipient_id)
        .collect();
    assert_eq!(recipients, vec!["u3".to_string()]);
    Ok(())
}

#[tokio::test]
async fn replies_nest_one_level_only() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    let ticket = server.app.seed_ticket("u1", "Reactor leak", Priority::Omega).await;
    let other = server.app.seed_ticket("u1", "Paperwork", Priority::Gamma).await;
    let path = format!("/api/tickets/{}/comments", ticket.id);

    let res = server.post(&path, "u1").json(&json!({"content": "On my way"})).send().await?;
    let top: Value = res.json().await?;
    let top_id = top["id"].as_str().unwrap_or_default().to_string();

    let res = server
        .post(&path, "u1")
        .json(&json!({"content": "ETA 5 minutes", "parent_id": top_id}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let reply: Value = res.json().await?;

    let res = server
        .post(&path, "u1")
        .json(&json!({"content": "too deep", "parent_id": reply["id"]}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .post(&format!("/api/tickets/{}/comments", other.id), "u1")
        .json(&json!({"content": "wrong thread", "parent_id": top_id}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get(&path, "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["limit"], 25);
    assert_eq!(body["comments"][0]["content"], "On my way");

    let res = server.get(&format!("{}?parent_id={}", path, top_id), "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["comments"][0]["content"], "ETA 5 minutes");
    Ok(())
}

#[tokio::test]
async fn comments_on_missing_ticket_are_404() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;

    let res = server
        .post("/api/tickets/00000000-0000-0000-0000-000000000000/comments", "u1")
        .json(&json!({"content": "hello?"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(server.app.store.comments().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn recipients_read_their_own_notifications() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    server.app.seed_profile("u2", "Starfire", 3).await;
    let ticket = server.app.seed_ticket("u1", "Reactor leak", Priority::Omega).await;

    server
        .post(&format!("/api/tickets/{}/comments", ticket.id), "u1")
        .json(&json!({"content": "@[Starfire](u2) status?"}))
        .send()
        .await?;

    let res = server.get("/api/notifications?unread_only=true", "u2").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 1);
    let id = body["notifications"][0]["id"].as_str().unwrap_or_default().to_string();
    assert_eq!(body["notifications"][0]["type"], "MENTION");

    // not the recipient
    let res = server.patch(&format!("/api/notifications/{}/read", id), "u1").send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.patch(&format!("/api/notifications/{}/read", id), "u2").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["read"], true);

    let res = server.get("/api/notifications?unread_only=true", "u2").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 0);

    let res = server.get("/api/notifications", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 0);
    Ok(())
}

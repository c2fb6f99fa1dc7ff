mod common;

use anyhow::Result;
use cape_hq::types::Priority;
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_ticket_defaults_status_and_priority() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;

    let res = server
        .post("/api/tickets", "u1")
        .json(&json!({
            "title": "Reactor leak in sector 7",
            "description": "Coolant pressure dropping fast",
            "type": "equipment",
            "location": {"latitude": 40.71, "longitude": -74.0}
        }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let ticket: Value = res.json().await?;
    assert_eq!(ticket["status"], "NEW");
    assert_eq!(ticket["priority"], "BETA");
    assert_eq!(ticket["type"], "EQUIPMENT");
    assert_eq!(ticket["created_by"], "u1");
    assert!(ticket["assigned_to"].is_null());
    Ok(())
}

#[tokio::test]
async fn create_ticket_reports_every_invalid_field() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;

    let res = server
        .post("/api/tickets", "u1")
        .json(&json!({"description": "no title", "priority": "URGENT", "type": "PARTY"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body: Value = res.json().await?;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .map(|errors| errors.iter().filter_map(|e| e["field"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(fields, vec!["priority", "title", "type"]);
    Ok(())
}

#[tokio::test]
async fn priority_sort_follows_severity() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    server.app.seed_ticket("u1", "Paperwork", Priority::Gamma).await;
    server.app.seed_ticket("u1", "Alien invasion", Priority::Omega).await;
    server.app.seed_ticket("u1", "Bank robbery", Priority::Alpha).await;

    let res = server.get("/api/tickets?sort=priority&order=desc", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    let priorities: Vec<&str> = body["tickets"]
        .as_array()
        .map(|t| t.iter().filter_map(|t| t["priority"].as_str()).collect())
        .unwrap_or_default();
    assert_eq!(priorities, vec!["OMEGA", "ALPHA", "GAMMA"]);

    let res = server.get("/api/tickets?sort=priority&order=asc", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["tickets"][0]["priority"], "GAMMA");
    Ok(())
}

#[tokio::test]
async fn list_filters_search_and_paginates() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    for i in 0..11 {
        server.app.seed_ticket("u1", &format!("Patrol report {}", i), Priority::Beta).await;
    }
    server.app.seed_ticket("u1", "REACTOR meltdown", Priority::Omega).await;

    let res = server.get("/api/tickets", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["tickets"].as_array().map(|t| t.len()), Some(10));
    assert_eq!(body["pagination"]["total"], 12);
    assert_eq!(body["pagination"]["total_pages"], 2);

    let res = server.get("/api/tickets?search=reactor", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["tickets"][0]["title"], "REACTOR meltdown");

    let res = server.get("/api/tickets?priority=beta&page=2", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["tickets"].as_array().map(|t| t.len()), Some(1));

    let res = server.get("/api/tickets?limit=101", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn get_ticket_handles_missing_and_malformed_ids() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    let ticket = server.app.seed_ticket("u1", "Lost batarang", Priority::Gamma).await;

    let res = server.get(&format!("/api/tickets/{}", ticket.id), "u1").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .get("/api/tickets/00000000-0000-0000-0000-000000000000", "u1")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.get("/api/tickets/not-a-uuid", "u1").send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn status_changes_follow_the_transition_table() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    let ticket = server.app.seed_ticket("u1", "Broken jetpack", Priority::Alpha).await;
    let path = format!("/api/tickets/{}", ticket.id);

    let res = server.patch(&path, "u1").json(&json!({"status": "RESOLVED"})).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "RESOLVED");

    let res = server.patch(&path, "u1").json(&json!({"status": "NEW"})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["errors"][0]["field"], "status");

    let logs = server.app.store.audit_logs().await;
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action, "ticket_update");
    assert_eq!(logs[0].target_id, ticket.id.to_string());
    assert_eq!(logs[0].changes, json!({"status": "RESOLVED"}));
    Ok(())
}

#[tokio::test]
async fn only_involved_users_or_staff_may_update() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    server.app.seed_profile("u2", "Raven", 3).await;
    server.app.seed_profile("boss", "Oracle", 9).await;
    let ticket = server.app.seed_ticket("u1", "Broken jetpack", Priority::Alpha).await;
    let path = format!("/api/tickets/{}", ticket.id);

    let res = server.patch(&path, "u2").json(&json!({"priority": "OMEGA"})).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.patch(&path, "boss").json(&json!({"assigned_to": "u2"})).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    // now the assignee
    let res = server.patch(&path, "u2").json(&json!({"status": "IN_PROGRESS"})).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server.patch(&path, "boss").json(&json!({"assigned_to": "nobody"})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server.patch(&path, "u1").json(&json!({})).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn failed_audit_write_rolls_back_the_update() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;
    let ticket = server.app.seed_ticket("u1", "Broken jetpack", Priority::Alpha).await;
    let path = format!("/api/tickets/{}", ticket.id);

    server.app.store.fail_audit_writes(true);
    let res = server.patch(&path, "u1").json(&json!({"status": "PENDING"})).send().await?;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    server.app.store.fail_audit_writes(false);
    let res = server.get(&path, "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "NEW");
    assert!(server.app.store.audit_logs().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn blank_title_is_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Cyborg", 3).await;

    let res = server
        .post("/api/tickets", "u1")
        .json(&json!({"title": "    ", "description": "Something is wrong", "type": "MISSION"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["errors"][0]["field"], "title");

    let res = server.get("/api/tickets", "u1").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["pagination"]["total"], 0);
    Ok(())
}

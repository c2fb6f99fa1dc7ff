mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server.anonymous().get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn profile_requires_a_session() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server.anonymous().get(server.url("/api/profile")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = res.json().await?;
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "UNAUTHORIZED");
    Ok(())
}

#[tokio::test]
async fn forged_token_is_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("u1", "Raven", 3).await;

    let res = server
        .anonymous()
        .get(server.url("/api/tickets"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn admin_routes_need_clearance() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("hero", "Beast Boy", 3).await;
    server.app.seed_profile("boss", "Oracle", 9).await;

    let res = server.get("/api/admin/users", "hero").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // a session without any profile is not an admin either
    let res = server.get("/api/admin/users", "ghost").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get("/api/admin/users", "boss").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["total"], 2);
    Ok(())
}

#[tokio::test]
async fn forbidden_bulk_update_changes_nothing() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("hero", "Beast Boy", 3).await;
    server.app.seed_profile("u2", "Starfire", 4).await;

    let res = server
        .patch("/api/admin/users/bulk", "hero")
        .json(&serde_json::json!({"user_ids": ["u2"], "status": "INACTIVE", "reason": "nope"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(server.app.store.audit_logs().await.is_empty());

    let res = server.get("/api/profile", "u2").send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["status"], "ACTIVE");
    Ok(())
}

#[tokio::test]
async fn admin_clearance_boundary_is_inclusive() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server.app.seed_profile("almost", "Robin", 7).await;
    server.app.seed_profile("exact", "Batgirl", 8).await;

    let res = server.get("/api/admin/users", "almost").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get("/api/admin/audit-logs", "almost").send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.get("/api/admin/users", "exact").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

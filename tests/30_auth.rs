mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

fn person_row(password: &str, role: &str) -> Value {
    json!({
        "Person_ID": 12,
        "Login_Name": "bob",
        "Password": bcrypt::hash(password, 4).expect("hash"),
        "Role_Description": role
    })
}

#[tokio::test]
async fn login_with_wrong_password_is_401() -> Result<()> {
    let server = common::spawn_server().await?;
    server.store.push_rows(vec![person_row("correct-horse", "User")]);

    let res = reqwest::Client::new()
        .post(server.url("/login"))
        .json(&json!({"username": "bob", "password": "wrong"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.json::<Value>().await?.get("error").is_some());
    Ok(())
}

#[tokio::test]
async fn login_with_unknown_user_is_401() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/login"))
        .json(&json!({"username": "ghost", "password": "x"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn login_without_credentials_is_400() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/login"))
        .json(&json!({"username": "bob"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(server.store.statements().is_empty());
    Ok(())
}

#[tokio::test]
async fn login_then_admin_as_manager() -> Result<()> {
    let server = common::spawn_server().await?;
    server.store.push_rows(vec![person_row("correct-horse", "Manager Role")]);
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/login"))
        .json(&json!({"username": "bob", "password": "correct-horse"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["data"]["role"], "Manager Role");
    let token = body["data"]["token"].as_str().expect("token").to_string();

    let res = client.get(server.url("/admin")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["user"], "bob");
    Ok(())
}

#[tokio::test]
async fn admin_with_user_role_is_403() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/admin"))
        .bearer_auth(server.token_for("amy", "User"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert!(res.json::<Value>().await?.get("error").is_some());
    Ok(())
}

#[tokio::test]
async fn admin_with_manager_role_is_200() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = reqwest::Client::new()
        .get(server.url("/admin"))
        .bearer_auth(server.token_for("meg", "Manager Role"))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn admin_without_valid_credential_is_401() -> Result<()> {
    let server = common::spawn_server().await?;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/admin")).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client.get(server.url("/admin")).bearer_auth("not.a.token").send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.json::<Value>().await?.get("error").is_some());
    Ok(())
}

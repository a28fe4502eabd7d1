mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn admin_creates_users() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;

    let res = app
        .post(
            "/users",
            Some(&token),
            json!({ "email": "New@Example.com", "password": "s3cret" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let id = res.body["id"].as_i64().unwrap();
    assert_eq!(
        res.body,
        json!({
            "url": format!("http://localhost:8080/users/{}", id),
            "id": id,
            "email": "new@example.com",
            "is_active": true,
            "is_admin": false
        })
    );

    // The new account can log in straight away
    let res = app
        .post(
            "/user/tokens",
            None,
            json!({ "email": "new@example.com", "password": "s3cret" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    app.create_user("taken@example.com").await;

    let res = app
        .post(
            "/users",
            Some(&token),
            json!({ "email": "TAKEN@example.com", "password": "x" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_global_admins_create_users() {
    let app = TestApp::new();
    let org = app.organization("Acme").await;
    let (_, token) = app.member_with(&org, "owner@example.com", "org:admin").await;

    let body = json!({ "email": "new@example.com", "password": "x" });
    let res = app.post("/users", Some(&token), body.clone()).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = app.post("/users", None, body).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_validates_fields() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;

    let res = app
        .post(
            "/users",
            Some(&token),
            json!({ "email": "not-an-email", "password": "" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        res.body,
        json!({
            "email": ["Enter a valid email address."],
            "password": ["This field may not be blank."]
        })
    );
}

#[tokio::test]
async fn listing_shows_active_users_only() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    app.create_user("active@example.com").await;
    let gone = app.create_user("gone@example.com").await;
    app.deactivate(&gone).await;

    let res = app.get("/users", Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    let mut emails: Vec<_> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["email"].as_str().unwrap().to_string())
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["active@example.com", "root@example.com"]);

    let res = app.get("/users", None).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn fetch_single_user() {
    let app = TestApp::new();
    let user = app.create_user("alice@example.com").await;
    let token = app.login(&user.email).await;

    let res = app.get(&format!("/users/{}", user.id), Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["email"], "alice@example.com");

    let res = app.get("/users/9999", Some(&token)).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deactivating_a_user_revokes_their_token() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let admin_token = app.login(&admin.email).await;
    let user = app.create_user("alice@example.com").await;
    let user_token = app.login(&user.email).await;

    let res = app
        .patch(
            &format!("/users/{}", user.id),
            Some(&admin_token),
            json!({ "is_active": false }),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["is_active"], false);

    let res = app.get("/user", Some(&user_token)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .post(
            "/user/tokens",
            None,
            json!({ "email": "alice@example.com", "password": common::PASSWORD }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn non_admin_cannot_update_users() {
    let app = TestApp::new();
    let user = app.create_user("alice@example.com").await;
    let token = app.login(&user.email).await;

    let res = app
        .patch(
            &format!("/users/{}", user.id),
            Some(&token),
            json!({ "is_admin": true }),
        )
        .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

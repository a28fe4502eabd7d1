//! Shared setup for router-level tests: in-memory store, real router,
//! requests driven through `oneshot`.

#![allow(dead_code)]

use authapi_service::{
    build_router,
    config::ApiConfig,
    models::{NewPermission, Organization, Permission, Team, User, UserChanges},
    services::{MemoryStore, Store},
    utils::Password,
    AppState,
};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub state: AppState,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ApiConfig::development())
    }

    pub fn with_config(config: ApiConfig) -> Self {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(config, store, None);
        let router = build_router(state.clone()).expect("Failed to build router");
        Self { state, router }
    }

    pub fn store(&self) -> &dyn Store {
        self.state.store.as_ref()
    }

    pub async fn create_user(&self, email: &str) -> User {
        self.state
            .auth
            .create_user(email, &Password::new(PASSWORD.to_string()), false)
            .await
            .expect("Failed to create user")
    }

    pub async fn create_admin(&self, email: &str) -> User {
        self.state
            .auth
            .create_user(email, &Password::new(PASSWORD.to_string()), true)
            .await
            .expect("Failed to create admin")
    }

    pub async fn deactivate(&self, user: &User) {
        self.store()
            .update_user(
                user.id,
                UserChanges {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .expect("Failed to deactivate user");
    }

    /// Logs in through the HTTP endpoint and returns the raw key.
    pub async fn login(&self, email: &str) -> String {
        let res = self
            .request(
                Method::POST,
                "/user/tokens",
                None,
                Some(serde_json::json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(res.status, StatusCode::CREATED, "login failed: {}", res.body);
        res.body["token"]
            .as_str()
            .expect("token missing from response")
            .to_string()
    }

    pub async fn organization(&self, title: &str) -> Organization {
        self.store()
            .insert_organization(title)
            .await
            .expect("Failed to create organization")
    }

    pub async fn team(&self, org: &Organization, title: &str) -> Team {
        self.store()
            .insert_team(org.id, title)
            .await
            .expect("Failed to create team")
    }

    pub async fn join_team(&self, team: &Team, user: &User) {
        self.store()
            .add_team_user(team.id, user.id)
            .await
            .expect("Failed to add team member");
    }

    pub async fn grant(
        &self,
        team: &Team,
        permission_type: &str,
        namespace: &str,
        object_id: &str,
    ) -> Permission {
        self.store()
            .insert_permission(
                team.id,
                NewPermission::new(permission_type, namespace, object_id),
            )
            .await
            .expect("Failed to create permission")
    }

    /// A fresh user holding `permission_type` on `org` through a new team.
    pub async fn member_with(
        &self,
        org: &Organization,
        email: &str,
        permission_type: &str,
    ) -> (User, String) {
        let user = self.create_user(email).await;
        let team = self.team(org, permission_type).await;
        self.join_team(&team, &user).await;
        self.grant(&team, permission_type, &org.namespace(), "").await;
        let token = self.login(email).await;
        (user, token)
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::DELETE, uri, token, None).await
    }
}

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn create_and_fetch_team_under_organization() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let org = app.organization("Acme").await;

    let res = app
        .post(
            &format!("/organizations/{}/teams", org.id),
            Some(&token),
            json!({ "title": "Editors" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let team_id = res.body["id"].as_i64().unwrap();
    assert_eq!(
        res.body,
        json!({
            "url": format!("http://localhost:8080/organizations/{}/teams/{}", org.id, team_id),
            "id": team_id,
            "title": "Editors",
            "archived": false,
            "organization": {
                "url": format!("http://localhost:8080/organizations/{}", org.id),
                "id": org.id
            },
            "users": [],
            "permissions": []
        })
    );

    let res = app
        .get(
            &format!("/organizations/{}/teams/{}", org.id, team_id),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "Editors");
}

#[tokio::test]
async fn team_routes_require_authentication() {
    let app = TestApp::new();
    let org = app.organization("Acme").await;
    let team = app.team(&org, "Editors").await;

    let res = app
        .get(&format!("/organizations/{}/teams", org.id), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = app
        .get(&format!("/organizations/{}/teams/{}", org.id, team.id), None)
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn team_of_another_organization_is_not_found() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let acme = app.organization("Acme").await;
    let globex = app.organization("Globex").await;
    let team = app.team(&globex, "Ops").await;

    let res = app
        .get(
            &format!("/organizations/{}/teams/{}", acme.id, team.id),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .get(
            &format!("/organizations/{}/teams/{}/permissions", acme.id, team.id),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn listing_skips_archived_teams() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let org = app.organization("Acme").await;
    let live = app.team(&org, "Live").await;
    let stale = app.team(&org, "Stale").await;

    let res = app
        .delete(
            &format!("/organizations/{}/teams/{}", org.id, stale.id),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app
        .get(&format!("/organizations/{}/teams", org.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let ids: Vec<_> = res
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![live.id]);

    // Archived teams stay addressable directly
    let res = app
        .get(
            &format!("/organizations/{}/teams/{}", org.id, stale.id),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["archived"], true);
}

#[tokio::test]
async fn team_membership_add_list_remove() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let member = app.create_user("member@example.com").await;
    let org = app.organization("Acme").await;
    let team = app.team(&org, "Editors").await;
    let users_uri = format!("/organizations/{}/teams/{}/users", org.id, team.id);

    let res = app
        .post(&users_uri, Some(&token), json!({ "user_id": member.id }))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get(&users_uri, Some(&token)).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
    assert_eq!(res.body[0]["id"], member.id);

    let res = app
        .delete(&format!("{}/{}", users_uri, member.id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get(&users_uri, Some(&token)).await;
    assert_eq!(res.body, json!([]));
}

#[tokio::test]
async fn permissions_create_list_delete() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let org = app.organization("Acme").await;
    let team = app.team(&org, "Editors").await;
    let perms_uri = format!("/organizations/{}/teams/{}/permissions", org.id, team.id);

    let res = app
        .post(
            &perms_uri,
            Some(&token),
            json!({ "type": "doc:read", "namespace": "docs", "object_id": "7" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::CREATED);
    let perm_id = res.body["id"].as_i64().unwrap();
    assert_eq!(
        res.body,
        json!({ "id": perm_id, "type": "doc:read", "namespace": "docs", "object_id": "7" })
    );

    let res = app.get(&perms_uri, Some(&token)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let res = app
        .get(
            &format!("/organizations/{}/teams/{}", org.id, team.id),
            Some(&token),
        )
        .await;
    assert_eq!(res.body["permissions"][0]["id"], perm_id);

    let res = app
        .delete(&format!("{}/{}", perms_uri, perm_id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get(&perms_uri, Some(&token)).await;
    assert_eq!(res.body, json!([]));

    let res = app
        .delete(&format!("{}/{}", perms_uri, perm_id), Some(&token))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn permission_create_reports_missing_fields() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let org = app.organization("Acme").await;
    let team = app.team(&org, "Editors").await;

    let res = app
        .post(
            &format!("/organizations/{}/teams/{}/permissions", org.id, team.id),
            Some(&token),
            json!({}),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    let fields = res.body.as_object().unwrap();
    assert_eq!(fields.len(), 3);
    assert_eq!(res.body["namespace"], json!(["This field is required."]));
    assert_eq!(res.body["object_id"], json!(["This field is required."]));
}

#[tokio::test]
async fn permission_of_another_team_is_not_found() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let org = app.organization("Acme").await;
    let editors = app.team(&org, "Editors").await;
    let ops = app.team(&org, "Ops").await;
    let perm = app.grant(&ops, "doc:read", "docs", "1").await;

    let res = app
        .delete(
            &format!(
                "/organizations/{}/teams/{}/permissions/{}",
                org.id, editors.id, perm.id
            ),
            Some(&token),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .get(
            &format!("/organizations/{}/teams/{}/permissions", org.id, ops.id),
            Some(&token),
        )
        .await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn permission_delete_checks_caller_before_lookup() {
    let app = TestApp::new();
    let org = app.organization("Acme").await;
    let team = app.team(&org, "Editors").await;
    let perm = app.grant(&team, "doc:read", "docs", "1").await;
    app.create_user("stranger@example.com").await;
    let stranger = app.login("stranger@example.com").await;
    let perms_uri = format!("/organizations/{}/teams/{}/permissions", org.id, team.id);

    for id in [perm.id, 9999] {
        let uri = format!("{}/{}", perms_uri, id);

        let res = app.delete(&uri, None).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);

        let res = app.delete(&uri, Some(&stranger)).await;
        assert_eq!(res.status, StatusCode::FORBIDDEN, "{}", uri);
    }

    let res = app.get(&perms_uri, Some(&stranger)).await;
    assert_eq!(res.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn whitespace_only_fields_are_blank() {
    let app = TestApp::new();
    let admin = app.create_admin("root@example.com").await;
    let token = app.login(&admin.email).await;
    let org = app.organization("Acme").await;
    let team = app.team(&org, "Editors").await;

    let res = app
        .post(
            &format!("/organizations/{}/teams", org.id),
            Some(&token),
            json!({ "title": "  " }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "title": ["This field may not be blank."] }));

    let res = app
        .patch(
            &format!("/organizations/{}/teams/{}", org.id, team.id),
            Some(&token),
            json!({ "title": "\t" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            &format!("/organizations/{}/teams/{}/permissions", org.id, team.id),
            Some(&token),
            json!({ "type": "doc:read", "namespace": "   ", "object_id": "" }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, json!({ "namespace": ["This field may not be blank."] }));
}

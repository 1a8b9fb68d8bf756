// SPDX-FileCopyrightText: 2026 Todosync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Both adapters built through `connect`, against one mock project.

use todosync_config::load_and_validate_str;
use todosync_core::{
    AuthAdapter, Credentials, NewTodo, SortOrder, TodoMatch, TodoPatch, TodoQuery, TodoStore,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer, session_path: &std::path::Path) -> todosync_config::TodosyncConfig {
    let toml = format!(
        r#"
[remote]
url = "{}"
anon_key = "anon"
table = "tasks"

[session]
path = "{}"
"#,
        server.uri(),
        session_path.display()
    );
    load_and_validate_str(&toml).unwrap()
}

async fn mount_sign_in(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "alice-token",
            "refresh_token": "alice-refresh",
            "expires_in": 3600,
            "user": {"id": "alice", "email": "alice@example.com"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn signed_in_session_scopes_every_table_request() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("user_id", "eq.alice"))
        .and(header("authorization", "Bearer alice-token"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-range", "0-0/1")
                .set_body_json(serde_json::json!([{
                    "id": 1, "text": "walk dog", "completed": false, "user_id": "alice",
                    "created_at": "2026-01-01T00:00:00Z"
                }])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/tasks"))
        .and(query_param("id", "eq.1"))
        .and(query_param("user_id", "eq.alice"))
        .and(header("authorization", "Bearer alice-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
            "id": 1, "text": "walk dog", "completed": true, "user_id": "alice"
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let conn = todosync_supabase::connect(&config_for(&server, &dir.path().join("s.json"))).unwrap();
    let session = conn
        .auth
        .sign_in(&Credentials::new("alice@example.com", "pw123456"))
        .await
        .unwrap();

    let page = conn
        .store
        .scoped_query(
            &session,
            &TodoQuery {
                owner: session.user_id.clone(),
                search: None,
                completed: None,
                order: SortOrder::CreatedAtDesc,
                offset: 0,
                limit: 10,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total_count, 1);

    let matching = TodoMatch {
        id: page.items[0].id,
        owner: session.user_id.clone(),
    };
    let changed = conn
        .store
        .update(&session, &TodoPatch::completed(true), &matching)
        .await
        .unwrap();
    assert_eq!(changed, 1);
}

#[tokio::test]
async fn session_survives_a_restart() {
    let server = MockServer::start().await;
    mount_sign_in(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let config = config_for(&server, &dir.path().join("s.json"));

    let first = todosync_supabase::connect(&config).unwrap();
    first
        .auth
        .sign_in(&Credentials::new("alice@example.com", "pw123456"))
        .await
        .unwrap();

    let second = todosync_supabase::connect(&config).unwrap();
    let restored = second.auth.restore_session().await.unwrap().unwrap();
    assert_eq!(restored.user_id.0, "alice");
    assert_eq!(restored.email.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn rejected_insert_is_a_remote_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/tasks"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "42501",
            "message": "new row violates row-level security policy"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let conn = todosync_supabase::connect(&config_for(&server, &dir.path().join("s.json"))).unwrap();
    let session = todosync_core::Session {
        user_id: "alice".into(),
        email: None,
        access_token: "alice-token".to_string().into(),
        refresh_token: None,
        expires_at: None,
    };
    let err = conn
        .store
        .insert(
            &session,
            &NewTodo {
                text: "x".into(),
                completed: false,
                user_id: "mallory".into(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("row-level security"));
}

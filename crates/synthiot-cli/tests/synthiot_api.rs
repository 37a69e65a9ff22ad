/*
 * Copyright 2026 sukawasatoru
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use synthiot_cli::data::repository::{CsvStorage, CsvStorageImpl, SynthiotApi, SynthiotApiImpl};
use synthiot_cli::model::{GenerationRequest, MessageRole, RowCount};
use tempfile::tempdir;
use url::Url;

async fn spawn_backend(router: Router) -> SynthiotApiImpl {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    SynthiotApiImpl::new(Url::parse(&format!("http://{}", addr)).unwrap()).unwrap()
}

fn generation_request(rows: u64) -> GenerationRequest {
    GenerationRequest {
        project_id: "p1".into(),
        chat_id: "c1".into(),
        user_id: "u1".into(),
        rows: RowCount::new(rows).unwrap(),
        batch_size: Default::default(),
    }
}

#[tokio::test]
async fn chat_list_wrapped_with_integer_ids() {
    let router = Router::new().route(
        "/chat/get-chat-list/{project_id}/{user_id}",
        get(|Path((project_id, user_id)): Path<(String, String)>| async move {
            assert_eq!("p1", project_id);
            assert_eq!("u1", user_id);
            Json(json!({
                "data": [
                    {"chat_id": 12, "preview": "generate 100 rows"},
                    {"chat_id": "c2"},
                ]
            }))
        }),
    );
    let api = spawn_backend(router).await;

    let chats = api
        .get_chat_list(&"p1".into(), &"u1".into())
        .await
        .unwrap();
    assert_eq!(2, chats.len());
    assert_eq!("12", chats[0].chat_id.0);
    assert_eq!("generate 100 rows", chats[0].title());
    assert_eq!("c2", chats[1].chat_id.0);
    assert_eq!("New chat", chats[1].title());
}

#[tokio::test]
async fn send_then_read_history() {
    let sent = Arc::new(Mutex::new(Vec::<String>::new()));

    let router = Router::new()
        .route(
            "/chat/send-message/{project_id}/{chat_id}/{user_id}",
            post(
                |State(sent): State<Arc<Mutex<Vec<String>>>>,
                 Path(path): Path<(String, String, String)>,
                 Json(body): Json<Value>| async move {
                    let (project_id, chat_id, user_id) = path;
                    assert_eq!("p1", project_id);
                    assert_eq!("c1", chat_id);
                    assert_eq!("u1", user_id);
                    let message = body["message"].as_str().unwrap().to_owned();
                    sent.lock().unwrap().push(message);
                    Json(json!({"status": "ok"}))
                },
            ),
        )
        .route(
            "/chat/get-chat-history/{project_id}/{chat_id}/{user_id}",
            get(|State(sent): State<Arc<Mutex<Vec<String>>>>| async move {
                let mut messages = vec![];
                for message in sent.lock().unwrap().iter() {
                    messages.push(json!({"role": "user", "content": message}));
                    messages.push(json!({"role": "assistant", "content": "Ready to download."}));
                }
                Json(json!({"data": {"messages": messages}}))
            }),
        )
        .with_state(sent.clone());
    let api = spawn_backend(router).await;

    api.send_message(&"p1".into(), &"c1".into(), &"u1".into(), "generate 5 rows")
        .await
        .unwrap();
    let history = api
        .get_chat_history(&"p1".into(), &"c1".into(), &"u1".into())
        .await
        .unwrap();

    assert_eq!(vec!["generate 5 rows".to_owned()], *sent.lock().unwrap());
    assert_eq!(2, history.len());
    assert_eq!(MessageRole::User, history[0].role);
    assert_eq!("generate 5 rows", history[0].content);
    assert_eq!(MessageRole::Assistant, history[1].role);
}

#[tokio::test]
async fn history_bare_payload() {
    let router = Router::new().route(
        "/chat/get-chat-history/{project_id}/{chat_id}/{user_id}",
        get(|| async {
            Json(json!({
                "messages": [
                    {"role": "system", "content": "You generate sensor data."},
                    {"role": "tool"},
                    {"role": "assistant", "content": null},
                ]
            }))
        }),
    );
    let api = spawn_backend(router).await;

    let history = api
        .get_chat_history(&"p1".into(), &"c1".into(), &"u1".into())
        .await
        .unwrap();
    assert_eq!(MessageRole::System, history[0].role);
    assert_eq!(MessageRole::Other, history[1].role);
    assert_eq!("", history[1].content);
    assert_eq!(MessageRole::Assistant, history[2].role);
    assert_eq!("", history[2].content);
}

#[tokio::test]
async fn download_and_store() {
    let router = Router::new().route(
        "/synth/generate",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            assert_eq!("p1", params["project_id"]);
            assert_eq!("c1", params["chat_id"]);
            assert_eq!("u1", params["user_id"]);
            assert_eq!("250", params["rows"]);
            assert_eq!("2000", params["batch_size"]);
            (
                [(
                    header::CONTENT_DISPOSITION,
                    "attachment; filename*=UTF-8''sensor%20data.csv",
                )],
                "timestamp,temperature,humidity\n",
            )
        }),
    );
    let api = spawn_backend(router).await;

    let csv = api
        .download_synthetic_csv(&generation_request(250))
        .await
        .unwrap();
    assert_eq!("sensor data.csv", csv.file_name);

    let temp_dir = tempdir().unwrap();
    let storage = CsvStorageImpl::create_with_path(temp_dir.path().join("downloads"));
    let path = storage.save_csv(&csv).unwrap();
    assert_eq!(temp_dir.path().join("downloads/sensor data.csv"), path);
    assert_eq!(
        "timestamp,temperature,humidity\n",
        std::fs::read_to_string(path).unwrap()
    );
}

#[tokio::test]
async fn download_without_content_disposition() {
    let router = Router::new().route("/synth/generate", get(|| async { "a,b\n" }));
    let api = spawn_backend(router).await;

    let csv = api
        .download_synthetic_csv(&generation_request(10))
        .await
        .unwrap();
    assert_eq!("synthetic_c1.csv", csv.file_name);
    assert_eq!(&b"a,b\n"[..], &csv.body[..]);
}

#[tokio::test]
async fn download_failure() {
    let router = Router::new().route(
        "/synth/generate",
        get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response() }),
    );
    let api = spawn_backend(router).await;

    let e = api
        .download_synthetic_csv(&generation_request(10))
        .await
        .unwrap_err();
    assert_eq!("Generate failed: 500 boom", e.to_string());
}

#[tokio::test]
async fn login() {
    let router = Router::new().route(
        "/users/get-users",
        post(|Json(body): Json<Value>| async move {
            if body["email"] == "a@example.com" && body["password"] == "password" {
                Json(json!({"uid": 7})).into_response()
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({"detail": "nope"}))).into_response()
            }
        }),
    );
    let api = spawn_backend(router).await;

    let user_id = api.login_user("a@example.com", "password").await.unwrap();
    assert_eq!("7", user_id.0);

    let e = api.login_user("a@example.com", "wrong").await.unwrap_err();
    assert_eq!("Invalid email or password", e.to_string());
}

#[tokio::test]
async fn register_error_detail() {
    let router = Router::new().route(
        "/users/create-users",
        post(|Json(body): Json<Value>| async move {
            match body["email"].as_str() {
                Some("taken@example.com") => (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"detail": "Email already registered"})),
                )
                    .into_response(),
                Some("broken@example.com") => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "oops").into_response()
                }
                _ => Json(json!({"uid": 8})).into_response(),
            }
        }),
    );
    let api = spawn_backend(router).await;

    api.register_user("alice", "alice@example.com", "password")
        .await
        .unwrap();

    let e = api
        .register_user("bob", "taken@example.com", "password")
        .await
        .unwrap_err();
    assert_eq!("Email already registered", e.to_string());

    let e = api
        .register_user("carol", "broken@example.com", "password")
        .await
        .unwrap_err();
    assert_eq!("Email already exists", e.to_string());
}

#[tokio::test]
async fn projects_payloads() {
    let router = Router::new()
        .route(
            "/project/get-project/{user_id}",
            get(|Path(user_id): Path<String>| async move {
                match user_id.as_str() {
                    "u1" => Json(json!([
                        {"project_id": 3, "name": "greenhouse", "sensor_type": "DHT22"},
                    ])),
                    _ => Json(json!({"data": null})),
                }
            }),
        )
        .route(
            "/project/delete-project/{project_id}/{user_id}",
            axum::routing::delete(|| async { StatusCode::NO_CONTENT }),
        );
    let api = spawn_backend(router).await;

    let projects = api.get_projects(&"u1".into()).await.unwrap();
    assert_eq!(1, projects.len());
    assert_eq!("3", projects[0].id.0);
    assert_eq!("greenhouse", projects[0].display_name());

    assert!(api.get_projects(&"u2".into()).await.unwrap().is_empty());

    api.delete_project(&"3".into(), &"u1".into()).await.unwrap();
}

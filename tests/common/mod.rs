//! In-process stand-in for the KerbalStuff API.
//!
//! Runs an axum server on a random port in a background thread with its own
//! tokio runtime, so the blocking client under test can call it from the
//! test thread. Upload endpoints decode the multipart body with axum's
//! `Multipart` extractor and echo what they received.

#![allow(dead_code)]

use axum::{
    extract::{Multipart, Path, Query},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;

pub const SESSION: &str = "abc123";

/// Start the mock server and return its root URI.
pub fn start() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app()).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

/// A root URI where nothing is listening.
pub fn dead_root() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

fn app() -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/mod/create", post(create))
        .route("/api/mod/{id}", get(mod_info))
        .route("/api/mod/{id}/latest", get(mod_latest))
        .route("/api/mod/{id}/update", post(update))
        .route("/api/search/mod", get(mod_search))
        .route("/api/user/{username}", get(user_info))
        .route("/api/search/user", get(user_search))
        .route("/whoami", get(whoami))
        .route("/plain-cookie", get(plain_cookie))
        .route("/broken", get(broken))
        .route("/broken-login", post(broken_login))
        .route("/charset", get(charset))
}

pub fn version_json(id: i64) -> Value {
    json!({
        "id": id,
        "friendly_version": format!("1.{id}"),
        "ksp_version": "0.25",
        "download_path": format!("/mod/1/Test/download/1.{id}"),
        "changelog": null
    })
}

pub fn mod_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "author": "jeb",
        "short_description": "Does things",
        "license": "MIT",
        "downloads": 1234,
        "followers": 56,
        "default_version_id": 2,
        "versions": [version_json(2), "not a version", version_json(1)]
    })
}

fn user_json(username: &str, mods: Vec<Value>) -> Value {
    json!({
        "username": username,
        "twitterUsername": "",
        "redditUsername": "",
        "ircNick": "",
        "forumUsername": "",
        "description": "",
        "mods": mods
    })
}

/// Text fields, file fields and field order of a multipart body.
async fn read_form(mut multipart: Multipart) -> Value {
    let mut order = Vec::new();
    let mut fields = Map::new();
    let mut files = Map::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap();
        order.push(Value::String(name.clone()));
        match file_name {
            Some(file_name) => {
                files.insert(
                    name,
                    json!({ "filename": file_name, "content_type": content_type, "data": data.to_vec() }),
                );
            }
            None => {
                fields.insert(name, Value::String(String::from_utf8_lossy(&data).into_owned()));
            }
        }
    }
    json!({ "order": order, "fields": fields, "files": files })
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split("; ").any(|c| c == format!("session={SESSION}")))
}

async fn login(multipart: Multipart) -> Response {
    let form = read_form(multipart).await;
    let fields = &form["fields"];
    if fields["username"] == "jeb" && fields["password"] == "hunter2" {
        (
            [(header::SET_COOKIE, format!("session={SESSION}; Path=/"))],
            Json(json!({ "error": false })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": true, "reason": "Username or password is incorrect" })),
        )
            .into_response()
    }
}

async fn create(headers: HeaderMap, multipart: Multipart) -> Json<Value> {
    if !has_session(&headers) {
        return Json(json!({ "error": true, "message": "You must be logged in" }));
    }
    let form = read_form(multipart).await;
    let name = form["fields"]["name"].as_str().unwrap_or_default().to_string();
    Json(json!({ "id": 12, "name": name, "url": format!("/mod/12/{name}"), "received": form }))
}

async fn update(Path(id): Path<i64>, headers: HeaderMap, multipart: Multipart) -> Json<Value> {
    if !has_session(&headers) {
        return Json(json!({ "error": true, "message": "You must be logged in" }));
    }
    let form = read_form(multipart).await;
    Json(json!({ "id": id, "url": format!("/mod/{id}/Test"), "received": form }))
}

async fn mod_info(Path(id): Path<i64>) -> Response {
    match id {
        // Valid JSON text, but not declared as JSON.
        2 => ([(header::CONTENT_TYPE, "text/html")], mod_json(2, "Html").to_string()).into_response(),
        404 => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": true, "reason": "Mod not found." })),
        )
            .into_response(),
        _ => Json(mod_json(id, "Test")).into_response(),
    }
}

async fn mod_latest(Path(_id): Path<i64>) -> Json<Value> {
    Json(version_json(3))
}

async fn mod_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!([mod_json(1, &query), 5, "junk", mod_json(2, "Other")]))
}

async fn user_info(Path(username): Path<String>) -> Json<Value> {
    let mods = if username == "bob" { vec![] } else { vec![mod_json(1, "Test")] };
    Json(user_json(&username, mods))
}

async fn user_search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("query").cloned().unwrap_or_default();
    Json(json!([user_json(&query, vec![]), user_json("bob", vec![])]))
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    Json(json!({ "cookie": cookie }))
}

async fn plain_cookie() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::SET_COOKIE, "trace=xyz; Path=/")],
        "oops",
    )
        .into_response()
}

async fn broken() -> Response {
    ([(header::CONTENT_TYPE, "application/json")], r#"{"id": "#).into_response()
}

async fn broken_login() -> Response {
    (
        [
            (header::SET_COOKIE, format!("session={SESSION}; Path=/")),
            (header::CONTENT_TYPE, "application/json".to_string()),
        ],
        "<html>oops</html>",
    )
        .into_response()
}

async fn charset() -> Response {
    ([(header::CONTENT_TYPE, "application/json; charset=utf-8")], r#"{"id": 1}"#).into_response()
}

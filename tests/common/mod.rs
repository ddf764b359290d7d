#![allow(dead_code)]

use actix_web::body::BoxBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App, Error, HttpServer};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use todomvc_backend_rs::db;
use todomvc_backend_rs::response::json_error_handler;
use todomvc_backend_rs::routes::{tag, todo};

/// Fresh in-memory database per test. The pool is capped at one connection
/// so every statement sees the same database.
pub async fn test_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let conn = Database::connect(options).await.expect("connect sqlite");
    db::init_schema(&conn).await.expect("init schema");
    conn
}

pub fn app(
    db: DatabaseConnection,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<BoxBody>,
        Error = Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(db))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .configure(todo::config)
        .configure(tag::config)
}

/// Starts a real server on an ephemeral port and returns its base URL.
pub async fn spawn_server() -> String {
    let db = test_db().await;
    let server = HttpServer::new(move || app(db.clone()))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind test server");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

pub async fn create_tag(http: &reqwest::Client, base: &str, name: &str) -> i64 {
    let resp = http
        .post(format!("{}/tags/", base))
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await
        .expect("post tag");
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.expect("tag body");
    body["id"].as_i64().expect("tag id")
}

pub async fn create_todo(http: &reqwest::Client, base: &str, body: serde_json::Value) -> i64 {
    let resp = http
        .post(format!("{}/todos/", base))
        .json(&body)
        .send()
        .await
        .expect("post todo");
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.expect("todo body");
    body["id"].as_i64().expect("todo id")
}

/// Todos as returned by the collection endpoint, ordered by `order` ASC.
pub async fn list_todos(http: &reqwest::Client, base: &str) -> Vec<serde_json::Value> {
    let resp = http
        .get(format!("{}/todos/", base))
        .send()
        .await
        .expect("get todos");
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.expect("todos body")
}

pub async fn list_tags(http: &reqwest::Client, base: &str) -> Vec<String> {
    let resp = http
        .get(format!("{}/tags/", base))
        .send()
        .await
        .expect("get tags");
    assert_eq!(resp.status().as_u16(), 200);
    resp.json().await.expect("tags body")
}

pub fn order_set(todos: &[serde_json::Value]) -> Vec<i64> {
    let mut orders: Vec<i64> = todos
        .iter()
        .map(|t| t["order"].as_i64().expect("order"))
        .collect();
    orders.sort_unstable();
    orders
}

pub fn titles_in_order(todos: &[serde_json::Value]) -> Vec<String> {
    todos
        .iter()
        .map(|t| t["title"].as_str().expect("title").to_string())
        .collect()
}

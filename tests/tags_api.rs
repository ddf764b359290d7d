mod common;

use serde_json::json;

#[actix_web::test]
async fn tags_are_listed_sorted_by_name() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;
    common::create_tag(&http, &base, "Homework").await;

    assert_eq!(
        common::list_tags(&http, &base).await,
        vec!["Homework", "Work"]
    );
}

#[actix_web::test]
async fn create_tag_returns_id_and_name() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("{}/tags/", base))
        .json(&json!({"name": "Work"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["id"].as_i64().is_some());
    assert_eq!(body["name"], "Work");
}

#[actix_web::test]
async fn duplicate_tag_is_rejected_and_table_unchanged() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;

    let resp = http
        .post(format!("{}/tags/", base))
        .json(&json!({"name": "Work"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    // a semantic 400, not a field-validation failure
    assert!(body.get("validation").is_none());

    assert_eq!(common::list_tags(&http, &base).await, vec!["Work"]);
}

#[actix_web::test]
async fn tag_name_is_validated() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    for payload in [json!({}), json!({"name": ""}), json!({"name": "x".repeat(81)})] {
        let resp = http
            .post(format!("{}/tags/", base))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(body["validation"]["keys"], json!(["name"]));
    }
}

#[actix_web::test]
async fn renaming_a_tag_follows_its_todos() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;
    common::create_todo(&http, &base, json!({"title": "a", "tags": ["Work"]})).await;

    let resp = http
        .patch(format!("{}/tags/Work", base))
        .json(&json!({"name": "Important"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    assert_eq!(common::list_tags(&http, &base).await, vec!["Important"]);
    let todos = common::list_todos(&http, &base).await;
    assert_eq!(todos[0]["tags"], json!(["Important"]));
}

#[actix_web::test]
async fn renaming_to_an_existing_name_is_rejected() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;
    common::create_tag(&http, &base, "Home").await;

    let resp = http
        .patch(format!("{}/tags/Work", base))
        .json(&json!({"name": "Home"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
}

#[actix_web::test]
async fn renaming_an_unknown_tag_is_not_found() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    let resp = http
        .patch(format!("{}/tags/Missing", base))
        .json(&json!({"name": "Other"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn deleting_a_tag_detaches_it_without_deleting_todos() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;
    common::create_tag(&http, &base, "Home").await;
    common::create_todo(&http, &base, json!({"title": "a", "tags": ["Work", "Home"]})).await;
    common::create_todo(&http, &base, json!({"title": "b", "tags": ["Work"]})).await;

    let resp = http
        .delete(format!("{}/tags/Work", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    assert_eq!(common::list_tags(&http, &base).await, vec!["Home"]);
    let todos = common::list_todos(&http, &base).await;
    assert_eq!(todos.len(), 2);
    assert_eq!(todos[0]["tags"], json!(["Home"]));
    assert_eq!(todos[1]["tags"].as_array().unwrap().len(), 0);

    let resp = http
        .delete(format!("{}/tags/Work", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 404);
}

#[actix_web::test]
async fn deleting_all_tags_cascades_to_associations() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;
    common::create_tag(&http, &base, "Home").await;
    common::create_todo(&http, &base, json!({"title": "a", "tags": ["Work", "Home"]})).await;

    let resp = http.delete(format!("{}/tags/", base)).send().await.unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    assert_eq!(common::list_tags(&http, &base).await.len(), 0);
    let todos = common::list_todos(&http, &base).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["tags"].as_array().unwrap().len(), 0);
}

#[actix_web::test]
async fn stale_tag_name_fails_after_rename() {
    let base = common::spawn_server().await;
    let http = reqwest::Client::new();

    common::create_tag(&http, &base, "Work").await;
    common::create_todo(&http, &base, json!({"title": "A", "tags": ["Work"]})).await;

    let todos = common::list_todos(&http, &base).await;
    assert_eq!(todos.len(), 1);
    assert_eq!(todos[0]["tags"], json!(["Work"]));

    let resp = http
        .patch(format!("{}/tags/Work", base))
        .json(&json!({"name": "Important"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = http
        .post(format!("{}/todos/", base))
        .json(&json!({"title": "B", "tags": ["Work"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);

    let resp = http
        .post(format!("{}/todos/", base))
        .json(&json!({"title": "B", "tags": ["Important"]}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

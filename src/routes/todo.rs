use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use log::debug;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, QueryOrder, Set, Statement, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{tag, todo, todo_tag};
use crate::error::AppError;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/todos/")
            .route(web::get().to(list))
            .route(web::post().to(create))
            .route(web::delete().to(remove_all)),
    )
    .service(
        web::resource("/todos/{todo_id:\\d+}")
            .route(web::get().to(get))
            .route(web::patch().to(update))
            .route(web::delete().to(remove)),
    );
}

#[derive(Deserialize)]
struct CreateTodoRequest {
    title: Option<String>,
    completed: Option<bool>,
    order: Option<i32>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct UpdateTodoRequest {
    title: Option<String>,
    completed: Option<bool>,
    order: Option<i32>,
    tags: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ListTodosQuery {
    tag: Option<String>,
}

#[derive(Serialize)]
struct TodoDto {
    id: i32,
    title: String,
    completed: bool,
    order: i32,
    tags: Vec<String>,
    url: String,
}

#[derive(Serialize)]
struct CreatedDto {
    id: i32,
}

async fn list(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    query: web::Query<ListTodosQuery>,
) -> Result<HttpResponse, AppError> {
    let mut select = todo::Entity::find().order_by_asc(todo::Column::Order);

    if let Some(name) = query.tag.as_deref().filter(|v| !v.is_empty()) {
        let tag_item = find_tag_by_name(db.get_ref(), name)
            .await?
            .ok_or_else(|| AppError::bad_request(format!("unknown tag: {}", name)))?;
        let links = todo_tag::Entity::find()
            .filter(todo_tag::Column::TagId.eq(tag_item.id))
            .all(db.get_ref())
            .await
            .map_err(AppError::from_db)?;
        let ids = links.into_iter().map(|l| l.todo_id).collect::<Vec<_>>();
        select = select.filter(todo::Column::Id.is_in(ids));
    }

    let rows = select.all(db.get_ref()).await.map_err(AppError::from_db)?;
    let base = base_url(&req);
    let mut todos = Vec::with_capacity(rows.len());
    for row in rows {
        todos.push(to_dto(db.get_ref(), &base, row).await?);
    }
    Ok(HttpResponse::Ok().json(todos))
}

async fn get(
    db: web::Data<DatabaseConnection>,
    req: HttpRequest,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let todo_item = todo::Entity::find_by_id(path.into_inner())
        .one(db.get_ref())
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| AppError::not_found("todo not found"))?;
    let dto = to_dto(db.get_ref(), &base_url(&req), todo_item).await?;
    Ok(HttpResponse::Ok().json(dto))
}

async fn create(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<CreateTodoRequest>,
) -> Result<HttpResponse, AppError> {
    let payload = payload.into_inner();
    let title = require_title(payload.title)?;
    if let Some(order) = payload.order {
        validate_order(order)?;
    }
    let completed = payload.completed.unwrap_or(false);
    let requested_order = payload.order;
    let tags = payload.tags.unwrap_or_default();

    let id = db
        .transaction::<_, i32, AppError>(|txn| {
            Box::pin(async move {
                let count = todo_count(txn).await?;
                let position = match requested_order {
                    Some(slot) if i64::from(slot) > count => {
                        return Err(AppError::validation(
                            vec!["order".to_string()],
                            "order exceeds the number of todos",
                        ));
                    }
                    Some(slot) => {
                        open_slot(txn, slot).await?;
                        slot
                    }
                    None => count as i32,
                };

                let inserted = todo::ActiveModel {
                    title: Set(title),
                    completed: Set(completed),
                    order: Set(position),
                    created: Set(Some(Utc::now())),
                    updated: Set(Some(Utc::now())),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(AppError::from_db)?;
                debug!("todo saved id={} order={}", inserted.id, position);

                attach_tags(txn, inserted.id, &tags).await?;
                Ok(inserted.id)
            })
        })
        .await
        .map_err(map_tx_error)?;

    Ok(HttpResponse::Created().json(CreatedDto { id }))
}

async fn update(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    payload: web::Json<UpdateTodoRequest>,
) -> Result<HttpResponse, AppError> {
    let todo_id = path.into_inner();
    let payload = payload.into_inner();

    if payload.title.is_none()
        && payload.completed.is_none()
        && payload.order.is_none()
        && payload.tags.is_none()
    {
        return Err(AppError::bad_request("nothing to update"));
    }
    if let Some(title) = &payload.title {
        validate_title(title)?;
    }
    if let Some(order) = payload.order {
        validate_order(order)?;
    }

    db.transaction::<_, (), AppError>(|txn| {
        let title = payload.title.clone();
        let completed = payload.completed;
        let target_order = payload.order;
        let tags = payload.tags.clone();
        Box::pin(async move {
            let existing = todo::Entity::find_by_id(todo_id)
                .one(txn)
                .await
                .map_err(AppError::from_db)?
                .ok_or_else(|| AppError::not_found("todo not found"))?;

            let mut active = todo::ActiveModel {
                id: Set(todo_id),
                updated: Set(Some(Utc::now())),
                ..Default::default()
            };
            if let Some(title) = title {
                active.title = Set(title);
            }
            if let Some(completed) = completed {
                active.completed = Set(completed);
            }
            if let Some(target) = target_order {
                if target != existing.order {
                    let count = todo_count(txn).await?;
                    if i64::from(target) >= count {
                        return Err(AppError::validation(
                            vec!["order".to_string()],
                            "order exceeds the number of todos",
                        ));
                    }
                    // the row holding the target slot takes this row's slot
                    exec_sql(
                        txn,
                        "UPDATE todo SET `order` = ? WHERE `order` = ?",
                        vec![existing.order.into(), target.into()],
                    )
                    .await?;
                    active.order = Set(target);
                }
            }
            todo::Entity::update(active)
                .exec(txn)
                .await
                .map_err(AppError::from_db)?;

            if let Some(names) = tags {
                todo_tag::Entity::delete_many()
                    .filter(todo_tag::Column::TodoId.eq(todo_id))
                    .exec(txn)
                    .await
                    .map_err(AppError::from_db)?;
                attach_tags(txn, todo_id, &names).await?;
            }
            Ok(())
        })
    })
    .await
    .map_err(map_tx_error)?;

    Ok(HttpResponse::Ok().finish())
}

async fn remove(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let todo_id = path.into_inner();

    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            let existing = todo::Entity::find_by_id(todo_id)
                .one(txn)
                .await
                .map_err(AppError::from_db)?
                .ok_or_else(|| AppError::not_found("todo not found"))?;

            close_slot(txn, existing.order).await?;
            todo_tag::Entity::delete_many()
                .filter(todo_tag::Column::TodoId.eq(todo_id))
                .exec(txn)
                .await
                .map_err(AppError::from_db)?;
            todo::Entity::delete_by_id(todo_id)
                .exec(txn)
                .await
                .map_err(AppError::from_db)?;
            Ok(())
        })
    })
    .await
    .map_err(map_tx_error)?;

    Ok(HttpResponse::Ok().finish())
}

async fn remove_all(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            todo_tag::Entity::delete_many()
                .exec(txn)
                .await
                .map_err(AppError::from_db)?;
            todo::Entity::delete_many()
                .exec(txn)
                .await
                .map_err(AppError::from_db)?;
            Ok(())
        })
    })
    .await
    .map_err(map_tx_error)?;

    Ok(HttpResponse::Ok().finish())
}

fn require_title(title: Option<String>) -> Result<String, AppError> {
    match title {
        Some(title) => {
            validate_title(&title)?;
            Ok(title)
        }
        None => Err(title_validation_error()),
    }
}

fn validate_title(title: &str) -> Result<(), AppError> {
    if title.is_empty() || title.chars().count() > 255 {
        return Err(title_validation_error());
    }
    Ok(())
}

fn title_validation_error() -> AppError {
    AppError::validation(
        vec!["title".to_string()],
        "title must be between 1 and 255 characters",
    )
}

fn validate_order(order: i32) -> Result<(), AppError> {
    if order < 0 {
        return Err(AppError::validation(
            vec!["order".to_string()],
            "order must not be negative",
        ));
    }
    Ok(())
}

fn base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}

async fn to_dto<C: ConnectionTrait>(
    db: &C,
    base_url: &str,
    item: todo::Model,
) -> Result<TodoDto, AppError> {
    let tags = item
        .find_related(tag::Entity)
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
        .map_err(AppError::from_db)?;
    Ok(TodoDto {
        id: item.id,
        url: format!("{}/todos/{}", base_url, item.id),
        title: item.title,
        completed: item.completed,
        order: item.order,
        tags: tags.into_iter().map(|t| t.name).collect(),
    })
}

async fn find_tag_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<tag::Model>, AppError> {
    tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(AppError::from_db)
}

async fn attach_tags<C: ConnectionTrait>(
    db: &C,
    todo_id: i32,
    names: &[String],
) -> Result<(), AppError> {
    let mut linked: Vec<&str> = Vec::new();
    for name in names {
        if linked.contains(&name.as_str()) {
            continue;
        }
        linked.push(name);
        let tag_item = find_tag_by_name(db, name)
            .await?
            .ok_or_else(|| AppError::bad_request(format!("unknown tag: {}", name)))?;
        exec_sql(
            db,
            "INSERT INTO todo_tags(todo_id, tag_id) VALUES(?, ?)",
            vec![todo_id.into(), tag_item.id.into()],
        )
        .await?;
    }
    Ok(())
}

async fn todo_count<C: ConnectionTrait>(db: &C) -> Result<i64, AppError> {
    query_count(db, "SELECT COUNT(1) AS cnt FROM todo", Vec::new()).await
}

// Slot arithmetic keeping `order` a dense 0-based ranking.

async fn open_slot<C: ConnectionTrait>(db: &C, slot: i32) -> Result<(), AppError> {
    exec_sql(
        db,
        "UPDATE todo SET `order` = `order` + 1 WHERE `order` >= ?",
        vec![slot.into()],
    )
    .await
}

async fn close_slot<C: ConnectionTrait>(db: &C, slot: i32) -> Result<(), AppError> {
    exec_sql(
        db,
        "UPDATE todo SET `order` = `order` - 1 WHERE `order` > ?",
        vec![slot.into()],
    )
    .await
}

async fn exec_sql<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    values: Vec<sea_orm::Value>,
) -> Result<(), AppError> {
    let backend = db.get_database_backend();
    let stmt = Statement::from_sql_and_values(backend, sql, values);
    db.execute(stmt).await.map_err(AppError::from_db)?;
    Ok(())
}

async fn query_count<C: ConnectionTrait>(
    db: &C,
    sql: &str,
    values: Vec<sea_orm::Value>,
) -> Result<i64, AppError> {
    let backend = db.get_database_backend();
    let stmt = Statement::from_sql_and_values(backend, sql, values);
    let row = db.query_one(stmt).await.map_err(AppError::from_db)?;
    Ok(row.and_then(|r| r.try_get("", "cnt").ok()).unwrap_or(0))
}

fn map_tx_error(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(e) => AppError::from_db(e),
        TransactionError::Transaction(app) => app,
    }
}

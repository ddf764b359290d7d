use actix_web::{web, HttpResponse};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entity::{tag, todo_tag};
use crate::error::AppError;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/tags/")
            .route(web::get().to(list))
            .route(web::post().to(create))
            .route(web::delete().to(remove_all)),
    )
    .service(
        web::resource("/tags/{name}")
            .route(web::patch().to(rename))
            .route(web::delete().to(remove)),
    );
}

#[derive(Deserialize)]
struct SaveTagRequest {
    name: Option<String>,
}

#[derive(Serialize)]
struct TagDto {
    id: i32,
    name: String,
}

async fn list(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let rows = tag::Entity::find()
        .order_by_asc(tag::Column::Name)
        .all(db.get_ref())
        .await
        .map_err(AppError::from_db)?;
    let names = rows.into_iter().map(|t| t.name).collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(names))
}

async fn create(
    db: web::Data<DatabaseConnection>,
    payload: web::Json<SaveTagRequest>,
) -> Result<HttpResponse, AppError> {
    let name = require_name(payload.into_inner().name)?;
    let inserted = tag::ActiveModel {
        name: Set(name),
        created: Set(Some(Utc::now())),
        updated: Set(Some(Utc::now())),
        ..Default::default()
    }
    .insert(db.get_ref())
    .await
    .map_err(map_duplicate_name)?;
    Ok(HttpResponse::Created().json(TagDto {
        id: inserted.id,
        name: inserted.name,
    }))
}

async fn rename(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
    payload: web::Json<SaveTagRequest>,
) -> Result<HttpResponse, AppError> {
    let old_name = path.into_inner();
    let new_name = require_name(payload.into_inner().name)?;

    let existing = tag::Entity::find()
        .filter(tag::Column::Name.eq(old_name.as_str()))
        .one(db.get_ref())
        .await
        .map_err(AppError::from_db)?
        .ok_or_else(|| AppError::not_found("tag not found"))?;

    // association rows are keyed by id, so every todo follows the rename
    let active = tag::ActiveModel {
        id: Set(existing.id),
        name: Set(new_name),
        updated: Set(Some(Utc::now())),
        ..Default::default()
    };
    tag::Entity::update(active)
        .exec(db.get_ref())
        .await
        .map_err(map_duplicate_name)?;

    Ok(HttpResponse::Ok().finish())
}

async fn remove(
    db: web::Data<DatabaseConnection>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let name = path.into_inner();

    db.transaction::<_, (), AppError>(|txn| {
        Box::pin(async move {
            let existing = tag::Entity::find()
                .filter(tag::Column::Name.eq(name.as_str()))
                .one(txn)
                .await
                .map_err(AppError::from_db)?
                .ok_or_else(|| AppError::not_found("tag not found"))?;

            todo_tag::Entity::delete_many()
                .filter(todo_tag::Column::TagId.eq(existing.id))
                .exec(txn)
                .await
                .map_err(AppError::from_db)?;
            tag::Entity::delete_by_id(existing.id)
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
            tag::Entity::delete_many()
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

fn require_name(name: Option<String>) -> Result<String, AppError> {
    match name {
        Some(name) if !name.is_empty() && name.chars().count() <= 80 => Ok(name),
        _ => Err(AppError::validation(
            vec!["name".to_string()],
            "name must be between 1 and 80 characters",
        )),
    }
}

fn map_duplicate_name(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::bad_request("tag name already in use"),
        _ => AppError::from_db(err),
    }
}

fn map_tx_error(err: TransactionError<AppError>) -> AppError {
    match err {
        TransactionError::Connection(e) => AppError::from_db(e),
        TransactionError::Transaction(app) => app,
    }
}

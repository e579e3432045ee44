use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use blog_server_service::repository::TagFilter;
use entity::tag;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{ApiError, AppState, page};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<u64>,
    #[serde(rename = "page-size")]
    page_size: Option<u64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    name: String,
}

#[derive(Debug, Serialize)]
pub struct TagList {
    tags: Vec<tag::Model>,
    count: u64,
}

pub async fn list(
    state: State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<TagList>, ApiError> {
    let Query(params) = params?;
    let filter = TagFilter { name: params.name };

    let (tags, count) = state
        .tags
        .get_tags(page(params.page, params.page_size)?, &filter)
        .await?;
    Ok(Json(TagList { tags, count }))
}

pub async fn create(
    state: State<AppState>,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(CreateRequest { name }) = body?;
    if name.trim().is_empty() {
        return Err(ApiError::BadRequest("tag name must not be empty".to_owned()));
    }

    let tag = state.tags.store_tag(&name).await?;
    Ok((StatusCode::CREATED, Json(json!({ "tag": tag }))))
}

pub async fn get(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let tag = state.tags.get_tag(&id).await?;
    Ok(Json(json!({ "tag": tag })))
}

pub async fn delete(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.tags.delete_tag(&id).await?;
    Ok(Json(json!({ "message": "successfully deleted" })))
}

pub async fn delete_posts_tags(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.posts_tags.delete_posts_tags(&id).await?;
    Ok(Json(json!({ "message": "successfully deleted" })))
}

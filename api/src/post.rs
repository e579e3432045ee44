use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use blog_server_service::repository::{PostFilter, PostSort};
use blog_server_service::usecase::PostForm;
use entity::{post, tag};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{ApiError, AppState, page};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    page: Option<u64>,
    #[serde(rename = "page-size")]
    page_size: Option<u64>,
    #[serde(rename = "is-draft")]
    is_draft: Option<bool>,
    tag: Option<String>,
    sort: Option<String>,
}

/// Post fields accepted on update; read-only fields such as `id` or
/// `createdAt` may be sent back and are ignored. `isDraft` is required; an
/// omitted `thumbnailUrl` keeps the current thumbnail.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostBody {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    permalink: Option<String>,
    is_draft: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    post: PostBody,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct PostWithTags {
    post: post::Model,
    tags: Vec<tag::Model>,
}

#[derive(Debug, Serialize)]
pub struct PostList {
    posts: Vec<post::Model>,
    count: u64,
}

pub async fn list(
    state: State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PostList>, ApiError> {
    let Query(params) = params?;
    let sort = match params.sort.as_deref() {
        Some(sort) => sort
            .parse::<PostSort>()
            .map_err(|err| ApiError::BadRequest(err.to_string()))?,
        None => PostSort::default(),
    };
    let filter = PostFilter {
        is_draft: params.is_draft,
        tag: params.tag,
    };

    let (posts, count) = state
        .posts
        .get_posts(page(params.page, params.page_size)?, &filter, sort)
        .await?;
    Ok(Json(PostList { posts, count }))
}

pub async fn create(state: State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let post = state.posts.create_post().await?;
    Ok((StatusCode::CREATED, Json(json!({ "post": post }))))
}

/// `GET /posts/{permalink}`: the path segment is matched against permalinks.
pub async fn get(
    state: State<AppState>,
    Path(permalink): Path<String>,
) -> Result<Json<PostWithTags>, ApiError> {
    let (post, tags) = state.posts.get_post(&permalink).await?;
    Ok(Json(PostWithTags { post, tags }))
}

pub async fn update(
    state: State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateRequest>, JsonRejection>,
) -> Result<Json<PostWithTags>, ApiError> {
    let Json(UpdateRequest { post, tags }) = body?;
    let form = PostForm {
        title: post.title,
        thumbnail_url: post.thumbnail_url,
        content: post.content,
        permalink: post.permalink,
        is_draft: post.is_draft,
    };

    let (post, tags) = state.posts.update_post(&id, form, &tags).await?;
    Ok(Json(PostWithTags { post, tags }))
}

pub async fn delete(
    state: State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.posts.delete_post(&id).await?;
    Ok(Json(json!({ "message": "successfully deleted" })))
}

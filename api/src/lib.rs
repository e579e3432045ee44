//! HTTP surface of the blog server: configuration, logging set-up, routing
//! and the mapping of service errors onto status codes.

mod config;
mod error;
mod post;
mod tag;

use axum::routing::{delete, get};
use axum::{Json, Router};
use blog_server_service::repository::Page;
use blog_server_service::sea_orm::{ConnectOptions, Database, DatabaseConnection};
use blog_server_service::usecase::{PostUseCase, PostsTagsUseCase, TagUseCase};
use migration::{Migrator, MigratorTrait};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

pub use config::{Config, ConfigError};
pub use error::ApiError;

#[derive(Debug, Clone)]
pub struct AppState {
    posts: PostUseCase,
    tags: TagUseCase,
    posts_tags: PostsTagsUseCase,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            posts: PostUseCase::new(db.clone(), config.default_thumbnail_url.clone()),
            tags: TagUseCase::new(db.clone()),
            posts_tags: PostsTagsUseCase::new(db),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/posts", get(post::list).post(post::create))
        .route(
            "/posts/{id}",
            get(post::get).put(post::update).delete(post::delete),
        )
        .route("/tags", get(tag::list).post(tag::create))
        .route("/tags/{id}", get(tag::get).delete(tag::delete))
        .route("/posts-tags/{id}", delete(tag::delete_posts_tags));

    Router::new()
        .route("/", get(hello))
        .nest("/api/v1", v1)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn hello() -> Json<Value> {
    Json(json!({ "message": "hello world" }))
}

/// Listing window from the `page` and `page-size` query parameters; both
/// must be present for the listing to be paginated.
fn page(page: Option<u64>, page_size: Option<u64>) -> Result<Page, ApiError> {
    match (page, page_size) {
        (Some(page), Some(page_size)) => Page::checked(page, page_size).ok_or_else(|| {
            ApiError::BadRequest(format!("page {page} of size {page_size} is out of range"))
        }),
        _ => Ok(Page::all()),
    }
}

pub async fn connect(config: &Config) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.database_url.clone());
    options.max_connections(config.max_connections);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn start() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.log_filter))
        .init();

    let db = connect(&config).await?;
    let app = app(AppState::new(db, &config));

    let server_url = config.server_url();
    let listener = tokio::net::TcpListener::bind(&server_url).await?;
    tracing::info!(%server_url, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn main() {
    let result = start();

    if let Some(err) = result.err() {
        println!("Error: {err}");
    }
}

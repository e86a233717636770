//! HTTP surface: the routes the dashboard front-end consumes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::draft::{DraftGenerator, DraftResult, DynGenerationApi};
use crate::error::ApiError;
use crate::publish::TistoryPublisher;
use crate::search::{CanonicalArticle, ProviderConfig, SearchClient, SearchParams};
use crate::store::{CollectionStore, ConfigStore, ExclusionStore};
use crate::trend::{MultiTrendRequest, ShoppingTrendRequest, TrendClient, TrendRequest};

#[derive(Clone)]
pub struct AppState {
    pub configs: ConfigStore,
    pub exclusions: ExclusionStore,
    pub collection: CollectionStore,
    pub search: SearchClient,
    pub drafts: DraftGenerator,
    pub publisher: TistoryPublisher,
    pub trends: TrendClient,
}

impl AppState {
    /// `generation` is injected so tests can script the model API.
    pub fn new(settings: &Settings, generation: DynGenerationApi) -> Self {
        Self {
            configs: ConfigStore::new(&settings.data_dir),
            exclusions: ExclusionStore::new(&settings.data_dir),
            collection: CollectionStore::new(&settings.data_dir),
            search: SearchClient::new(settings),
            drafts: DraftGenerator::new(generation),
            publisher: TistoryPublisher::new(settings),
            trends: TrendClient::new(settings),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/search", get(search))
        .route("/api/configs", get(list_configs).post(upsert_config))
        .route("/api/configs/{id}", axum::routing::delete(delete_config))
        .route("/api/exclude", post(exclude))
        .route(
            "/api/collect",
            get(list_collection).post(collect).delete(uncollect),
        )
        .route(
            "/api/generate-draft",
            get(generate_draft_hint).post(generate_draft),
        )
        .route("/api/tistory-post", post(tistory_post))
        .route("/api/trend", post(trend))
        .route("/api/trend/multi", post(trend_multi))
        .route("/api/trend/shopping", post(trend_shopping))
        .fallback_service(ServeDir::new("public"))
        .layer(CorsLayer::very_permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, ApiError> {
    let configs = state.configs.all();
    let excluded = state.exclusions.all();
    let items = state.search.search(&configs, &excluded, &params).await?;
    Ok(Json(json!({ "items": items })))
}

async fn list_configs(State(state): State<AppState>) -> Json<Vec<ProviderConfig>> {
    Json(state.configs.all())
}

async fn upsert_config(
    State(state): State<AppState>,
    Json(config): Json<ProviderConfig>,
) -> Json<Value> {
    let configs = state.configs.upsert(config);
    Json(json!({ "success": true, "configs": configs }))
}

async fn delete_config(State(state): State<AppState>, Path(id): Path<String>) -> Json<Value> {
    state.configs.remove(&id);
    Json(json!({ "success": true }))
}

#[derive(Deserialize)]
struct LinkBody {
    link: String,
}

async fn exclude(State(state): State<AppState>, Json(body): Json<LinkBody>) -> Json<Value> {
    state.exclusions.add(&body.link);
    Json(json!({ "success": true }))
}

async fn list_collection(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::to_value(state.collection.all()).unwrap_or_else(|_| json!([])))
}

async fn collect(
    State(state): State<AppState>,
    Json(article): Json<CanonicalArticle>,
) -> Json<Value> {
    state.collection.add(article);
    Json(json!({ "success": true }))
}

async fn uncollect(State(state): State<AppState>, Json(body): Json<LinkBody>) -> Json<Value> {
    let count = state.collection.remove(&body.link);
    Json(json!({ "success": true, "count": count }))
}

#[derive(Deserialize)]
struct DraftRequest {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}

/// Browsers occasionally hit this with GET while debugging; answer with a
/// hint instead of serving the static fallback.
async fn generate_draft_hint() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({ "error": "This endpoint only supports POST requests." })),
    )
}

async fn generate_draft(
    State(state): State<AppState>,
    Json(body): Json<DraftRequest>,
) -> Result<Json<DraftResult>, ApiError> {
    let draft = state.drafts.generate(&body.title, &body.description).await?;
    Ok(Json(draft))
}

async fn tistory_post(
    State(state): State<AppState>,
    Json(draft): Json<DraftResult>,
) -> Result<Json<Value>, ApiError> {
    let url = state.publisher.publish(&draft).await?;
    Ok(Json(json!({ "success": true, "url": url })))
}

async fn trend(
    State(state): State<AppState>,
    Json(body): Json<TrendRequest>,
) -> Result<Json<Value>, ApiError> {
    let request = MultiTrendRequest {
        keywords: vec![body.keyword],
        filters: body.filters,
    };
    let payload = state.trends.search_trend(&request).await?;
    Ok(Json(payload))
}

async fn trend_multi(
    State(state): State<AppState>,
    Json(body): Json<MultiTrendRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = state.trends.search_trend(&body).await?;
    Ok(Json(payload))
}

async fn trend_shopping(
    State(state): State<AppState>,
    Json(body): Json<ShoppingTrendRequest>,
) -> Result<Json<Value>, ApiError> {
    let payload = state.trends.shopping_trend(&body).await?;
    Ok(Json(payload))
}

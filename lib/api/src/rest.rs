use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use reelsim_core::{
    resolve_category, CandidateFilter, CategoryFilter, CategoryOracle, Error, QueryEngine,
    Recommendations,
};
use reelsim_oracle::{poster_url, tmdb::DEFAULT_IMAGE_URL};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_COUNT: usize = 5;
const DEFAULT_ITEMS_LIMIT: usize = 20;

/// Shared handler state; cheap to clone
#[derive(Clone)]
pub struct AppState {
    engine: Arc<QueryEngine>,
    oracle: Option<Arc<dyn CategoryOracle>>,
    image_url: String,
}

impl AppState {
    pub fn new(engine: Arc<QueryEngine>) -> Self {
        Self {
            engine,
            oracle: None,
            image_url: DEFAULT_IMAGE_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_oracle(mut self, oracle: Arc<dyn CategoryOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = image_url.into();
        self
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }
}

#[derive(Deserialize)]
struct ItemsQuery {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct ItemInfo {
    index: usize,
    id: String,
    title: String,
}

#[derive(Deserialize)]
struct RecommendRequest {
    index: Option<usize>,
    /// Catalog id
    id: Option<String>,
    title: Option<String>,
    #[serde(default = "default_count")]
    n: usize,
    /// Category id or name
    category: Option<String>,
    #[serde(default)]
    with_artwork: bool,
}

fn default_count() -> usize {
    DEFAULT_COUNT
}

#[derive(Serialize)]
struct RecommendedItem {
    index: usize,
    id: String,
    title: String,
    score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    poster_url: Option<String>,
}

#[derive(Serialize)]
struct RecommendResponse {
    items: Vec<RecommendedItem>,
    requested: usize,
    partial: bool,
    examined: usize,
    rejected: usize,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: AppState, port: u16) -> std::io::Result<()> {
        let data = web::Data::new(state);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new().wrap(cors).app_data(data.clone()).configure(routes)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }
}

/// Register every endpoint; expects `web::Data<AppState>` in app data
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/items", web::get().to(list_items))
        .route("/categories", web::get().to(list_categories))
        .route("/recommend", web::post().to(recommend));
}

async fn health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "items": state.engine.store().len(),
    })))
}

async fn list_items(
    state: web::Data<AppState>,
    query: web::Query<ItemsQuery>,
) -> ActixResult<HttpResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_ITEMS_LIMIT);
    let items: Vec<ItemInfo> = state
        .engine
        .store()
        .catalog()
        .search(&query.q, limit)
        .into_iter()
        .map(|item| ItemInfo {
            index: item.index,
            id: item.id.clone(),
            title: item.title.clone(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(serde_json::json!({ "items": items })))
}

async fn list_categories(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    let oracle = match &state.oracle {
        Some(oracle) => oracle.clone(),
        None => {
            return Ok(error_body(
                StatusCode::SERVICE_UNAVAILABLE,
                "No category oracle configured",
                Some(request_id),
            ));
        }
    };

    match web::block(move || oracle.categories()).await {
        Ok(Ok(categories)) => Ok(HttpResponse::Ok()
            .insert_header(("x-request-id", request_id.to_string()))
            .json(serde_json::json!({ "categories": categories }))),
        Ok(Err(e)) => {
            tracing::warn!(%request_id, error = %e, "Category listing failed");
            Ok(error_response(&e, Some(request_id)))
        }
        Err(e) => Ok(internal_error(&e, request_id)),
    }
}

async fn recommend(
    state: web::Data<AppState>,
    req: web::Json<RecommendRequest>,
) -> ActixResult<HttpResponse> {
    let request_id = Uuid::new_v4();
    let state = state.into_inner();
    let req = req.into_inner();

    match web::block(move || run_recommend(&state, req)).await {
        Ok(Ok(response)) => {
            tracing::info!(
                %request_id,
                returned = response.items.len(),
                requested = response.requested,
                partial = response.partial,
                "Served recommendations"
            );
            Ok(HttpResponse::Ok()
                .insert_header(("x-request-id", request_id.to_string()))
                .json(response))
        }
        Ok(Err(e)) => {
            tracing::warn!(%request_id, error = %e, "Recommendation request failed");
            Ok(error_response(&e, Some(request_id)))
        }
        Err(e) => Ok(internal_error(&e, request_id)),
    }
}

fn run_recommend(state: &AppState, req: RecommendRequest) -> reelsim_core::Result<RecommendResponse> {
    let store = state.engine.store();
    let selected = match (req.index, req.id.as_deref(), req.title.as_deref()) {
        (Some(index), _, _) => store.item(index)?.index,
        (None, Some(id), _) => store.resolve_id(id)?,
        (None, None, Some(title)) => store.resolve_title(title)?,
        (None, None, None) => {
            return Err(Error::InvalidRequest(
                "one of 'index', 'id' or 'title' must be provided".to_string(),
            ));
        }
    };

    let filter = match req.category.as_deref() {
        None => None,
        Some(category) => {
            let oracle = state.oracle.clone().ok_or_else(|| {
                Error::InvalidRequest("category filtering requires a category oracle".to_string())
            })?;
            let id = resolve_category(&oracle, category)?;
            Some(CategoryFilter::new(oracle, id))
        }
    };

    let recs = state.engine.recommend(
        selected,
        req.n,
        filter.as_ref().map(|f| f as &dyn CandidateFilter),
    )?;
    Ok(to_response(state, recs, req.with_artwork))
}

fn to_response(state: &AppState, recs: Recommendations, with_artwork: bool) -> RecommendResponse {
    let partial = recs.is_partial();
    let oracle = state.oracle.as_ref().filter(|_| with_artwork);
    let items = recs
        .items
        .into_iter()
        .map(|rec| {
            // artwork is best effort; lookup failures leave it empty
            let poster = oracle.and_then(|o| match o.resolve(&rec.title) {
                Ok(Some(record)) => poster_url(&state.image_url, &record),
                _ => None,
            });
            RecommendedItem {
                index: rec.index,
                id: rec.id,
                title: rec.title,
                score: rec.score,
                poster_url: poster,
            }
        })
        .collect();

    RecommendResponse {
        items,
        requested: recs.requested,
        partial,
        examined: recs.examined,
        rejected: recs.rejected,
    }
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::UnknownItem(_) => StatusCode::NOT_FOUND,
        Error::InvalidRequest(_) | Error::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        Error::Oracle(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &Error, request_id: Option<Uuid>) -> HttpResponse {
    error_body(status_for(e), &e.to_string(), request_id)
}

/// The blocking pool could not run the task
fn internal_error(e: &dyn std::fmt::Display, request_id: Uuid) -> HttpResponse {
    tracing::error!(%request_id, error = %e, "Blocking task failed");
    error_body(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string(), Some(request_id))
}

fn error_body(status: StatusCode, message: &str, request_id: Option<Uuid>) -> HttpResponse {
    let mut response = HttpResponse::build(status);
    if let Some(id) = request_id {
        response.insert_header(("x-request-id", id.to_string()));
    }
    response.json(serde_json::json!({ "error": message }))
}

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use newsdex_core::summary::{summarize_document, DEFAULT_TOP_N};
use newsdex_core::{Bm25Params, DocStore, Error, SearchIndex};
use serde::{Deserialize, Serialize};
use std::path::Path as FsPath;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { 10 }

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub rank: usize,
    pub docno: String,
    pub score: f64,
    pub headline: String,
    pub date: String,
    pub summary: String,
}

#[derive(Serialize)]
pub struct DocResponse {
    pub docno: String,
    pub internal_id: u32,
    pub date: String,
    pub headline: String,
    pub text: String,
}

/// Shared, read-only snapshot. Requests never mutate it.
#[derive(Clone)]
pub struct AppState {
    pub index: Arc<SearchIndex>,
    pub store: DocStore,
    pub params: Bm25Params,
}

fn cors_layer() -> CorsLayer {
    // CORS_ALLOW_ORIGIN is a comma-separated list; unset or unparsable means Any
    let origins: Vec<_> = std::env::var("CORS_ALLOW_ORIGIN")
        .map(|val| val.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        base.allow_origin(Any)
    } else {
        base.allow_origin(AllowOrigin::list(origins))
    }
}

pub fn build_app<P: AsRef<FsPath>>(index_dir: P, params: Bm25Params) -> Result<Router> {
    let index_dir = index_dir.as_ref();
    let index = SearchIndex::load(index_dir).with_context(|| format!("loading index {}", index_dir.display()))?;
    let state = AppState { store: index.store(), index: Arc::new(index), params };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/doc/:docno", get(doc_handler))
        .with_state(state)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn search_handler(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let ranked = state.index.rank(&params.q, state.params);
    let total_hits = ranked.len();
    let k = params.k.clamp(1, MAX_K);

    let mut results = Vec::with_capacity(k.min(total_hits));
    for (i, scored) in ranked.into_iter().take(k).enumerate() {
        let (headline, date, summary) = match state.store.get(&scored.docno) {
            Ok((raw, meta)) => (meta.headline, meta.date, summarize_document(&params.q, &raw, DEFAULT_TOP_N)),
            Err(e) => {
                tracing::warn!(docno = %scored.docno, error = %e, "stored document unavailable");
                Default::default()
            }
        };
        results.push(SearchHit { rank: i + 1, docno: scored.docno, score: scored.score, headline, date, summary });
    }

    let took_s = start.elapsed().as_secs_f64();
    tracing::debug!(query = %params.q, total_hits, took_s, "search");
    Json(SearchResponse { query: params.q, took_s, total_hits, results })
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(docno): Path<String>,
) -> Result<Json<DocResponse>, (StatusCode, Json<serde_json::Value>)> {
    match state.store.get(&docno) {
        Ok((text, meta)) => Ok(Json(DocResponse {
            docno: meta.docno,
            internal_id: meta.internal_id,
            date: meta.date,
            headline: meta.headline,
            text,
        })),
        Err(Error::UnknownDocument(_)) => Err((StatusCode::NOT_FOUND, Json(serde_json::json!({ "error": "not found" })))),
        Err(e) => {
            tracing::error!(%docno, error = %e, "document fetch failed");
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": e.to_string() }))))
        }
    }
}

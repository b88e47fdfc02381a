use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mushaf_lib::{
    surahs, AppState, LoaderStats, ReaderConfig, SurahDataset, WordAnalysisEntry, WordRecord,
    DEFAULT_BATCH_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

const DEFAULT_ADDR: &str = "127.0.0.1:3000";

type ApiError = (StatusCode, Json<ErrorResponse>);

// === Request/Response types ===

#[derive(Deserialize)]
struct SurahQuery {
    surah: u32,
}

#[derive(Deserialize)]
struct VerseQuery {
    surah: u32,
    verse: u32,
}

#[derive(Deserialize)]
struct SurahVersesQuery {
    surah: u32,
    verses_count: Option<u32>,
    batch_size: Option<usize>,
}

#[derive(Deserialize)]
struct PageQuery {
    surah: u32,
    page: u32,
    per_page: Option<u32>,
    total_verses: Option<u32>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    loader: LoaderStats,
    cached_verses: usize,
}

#[derive(Serialize)]
struct SurahResponse {
    surah: u32,
    word_count: usize,
    words: SurahDataset,
}

#[derive(Serialize)]
struct VerseTextResponse {
    key: String,
    text: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(message: String) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message }))
}

fn require_surah(surah: u32) -> Result<u32, ApiError> {
    if surahs::is_valid_surah(surah) {
        Ok(surah)
    } else {
        Err(bad_request(format!("Surah must be between 1 and {}, got {}", surahs::SURAH_COUNT, surah)))
    }
}

fn require_verse(surah: u32, verse: u32) -> Result<(u32, u32), ApiError> {
    let surah = require_surah(surah)?;
    match surahs::verse_count(surah) {
        Some(count) if (1..=count).contains(&verse) => Ok((surah, verse)),
        _ => Err(bad_request(format!("Verse {} does not exist in surah {}", verse, surah))),
    }
}

/// Verse count to assemble: defaults to the surah's canonical count and may
/// not exceed it.
fn require_verses_count(surah: u32, requested: Option<u32>) -> Result<u32, ApiError> {
    let available = surahs::verse_count(surah).unwrap_or(0);
    match requested {
        None => Ok(available),
        Some(count) if count <= available => Ok(count),
        Some(count) => Err(bad_request(format!(
            "Surah {} has {} verses, got verses_count={}",
            surah, available, count
        ))),
    }
}

// === Handlers ===

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        loader: state.loader().stats(),
        cached_verses: state.assembler.verse_cache_len(),
    })
}

async fn get_surah(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SurahQuery>,
) -> Result<Json<SurahResponse>, ApiError> {
    let surah = require_surah(params.surah)?;
    let words = state.loader().load_surah_data(surah).await;
    Ok(Json(SurahResponse { surah, word_count: words.len(), words: (*words).clone() }))
}

async fn get_verse_text(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerseQuery>,
) -> Result<Json<VerseTextResponse>, ApiError> {
    let (surah, verse) = require_verse(params.surah, params.verse)?;
    let text = state.assembler.get_verse_text(surah, verse).await;
    Ok(Json(VerseTextResponse { key: format!("{}:{}", surah, verse), text }))
}

async fn get_verse_words(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerseQuery>,
) -> Result<Json<Vec<WordRecord>>, ApiError> {
    let (surah, verse) = require_verse(params.surah, params.verse)?;
    Ok(Json(state.assembler.get_verse_words(surah, verse).await))
}

async fn get_word_analysis(
    State(state): State<Arc<AppState>>,
    Query(params): Query<VerseQuery>,
) -> Result<Json<Vec<WordAnalysisEntry>>, ApiError> {
    let (surah, verse) = require_verse(params.surah, params.verse)?;
    Ok(Json(state.assembler.get_word_analysis_for_verse(surah, verse).await))
}

async fn get_surah_verses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SurahVersesQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let surah = require_surah(params.surah)?;
    let verses_count = require_verses_count(surah, params.verses_count)?;
    let batch_size = params.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);

    let verses = state.assembler.get_surah_verses(surah, verses_count, batch_size).await;
    state.loader().preload_adjacent_surahs(surah);
    Ok(Json(verses))
}

async fn get_visible_verses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let surah = require_surah(params.surah)?;
    let per_page = params.per_page.unwrap_or(10).min(100);
    let total_verses = params
        .total_verses
        .or_else(|| surahs::verse_count(surah))
        .unwrap_or(0);

    Ok(Json(
        state
            .assembler
            .get_visible_verses(surah, params.page, per_page, total_verses)
            .await,
    ))
}

async fn preload(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SurahQuery>,
) -> Result<StatusCode, ApiError> {
    let surah = require_surah(params.surah)?;
    state.loader().preload_surah_data(surah);
    state.loader().preload_adjacent_surahs(surah);
    Ok(StatusCode::ACCEPTED)
}

async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.loader().clear_memory();
    state.assembler.clear_verse_cache();
    tracing::info!("Cleared in-memory caches");
    StatusCode::NO_CONTENT
}

fn load_config() -> anyhow::Result<ReaderConfig> {
    match std::env::var_os("MUSHAF_CONFIG") {
        Some(path) => ReaderConfig::load(&PathBuf::from(path)),
        None => Ok(ReaderConfig::default()),
    }
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/surah", get(get_surah))
        .route("/surah/verses", get(get_surah_verses))
        .route("/surah/page", get(get_visible_verses))
        .route("/verse/text", get(get_verse_text))
        .route("/verse/words", get(get_verse_words))
        .route("/verse/analysis", get(get_word_analysis))
        .route("/preload", post(preload))
        .route("/cache/clear", post(clear_cache))
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let state = Arc::new(AppState::new(config)?);

    let addr = std::env::var("MUSHAF_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

//! HTTP preview API
//!
//! Endpoints:
//! - GET  /health   - Health check
//! - POST /analyze  - Content analysis of an utterance
//! - POST /timeline - Phoneme timeline of an utterance
//! - POST /plan     - Speak an utterance, returns the filtered plan
//! - POST /tick     - Advance the preview engine one frame
//! - GET  /settings - Current motion settings
//! - PUT  /settings - Replace motion settings
//! - GET  /audit    - Accessibility audit of settings + last plan

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

use crate::config::BehaviorConfig;
use crate::core::engine::BehaviorEngine;
use crate::core::phoneme_timeline::PhonemeTimelineGenerator;
use crate::core::content_analyzer::estimate_duration_ms;
use crate::core::rig::FrameBuffer;
use crate::types::{
    AccessibilityAudit, AlternativeCommunication, ContentAnalysis, FrameReport, MotionSettings, MovementContext,
    MovementPlan, MovementState, PhonemeTimeline,
};

/// App state
pub struct AppState {
    pub engine: Mutex<BehaviorEngine>,
    pub rig: Mutex<FrameBuffer>,
    pub config: BehaviorConfig,
}

/// Utterance request (analyze / plan)
#[derive(Debug, Deserialize)]
pub struct UtteranceRequest {
    pub text: String,
    #[serde(default)]
    pub context: MovementContext,
}

/// Timeline request
#[derive(Debug, Deserialize)]
pub struct TimelineRequest {
    pub text: String,
    pub duration_ms: Option<f64>,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// Plan response
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: MovementPlan,
    pub alternatives: Vec<AlternativeCommunication>,
    pub state: MovementState,
    pub submitted: bool,
}

/// Tick request
#[derive(Debug, Deserialize)]
pub struct TickRequest {
    pub delta_ms: f64,
}

/// Settings update response
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub applied: bool,
    pub settings: MotionSettings,
    pub pending: Option<MotionSettings>,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub state: MovementState,
    pub clock_ms: f64,
}

/// Create the API router
pub fn create_router(config: BehaviorConfig) -> Router {
    let state = Arc::new(AppState {
        engine: Mutex::new(BehaviorEngine::new(config.clone())),
        rig: Mutex::new(FrameBuffer::new()),
        config,
    });

    Router::new()
        .route("/health", get(health))
        .route("/analyze", post(analyze))
        .route("/timeline", post(timeline))
        .route("/plan", post(plan))
        .route("/tick", post(tick))
        .route("/settings", get(get_settings).put(put_settings))
        .route("/audit", get(audit))
        .with_state(state)
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let engine = state.engine.lock().await;
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
        state: engine.state(),
        clock_ms: engine.clock_ms(),
    })
}

/// Analyze without touching the preview engine
async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UtteranceRequest>,
) -> Result<Json<ContentAnalysis>, StatusCode> {
    req.context.validate().map_err(|_| StatusCode::BAD_REQUEST)?;
    let engine = state.engine.lock().await;
    Ok(Json(engine.analyzer().analyze(&req.text, &req.context)))
}

/// Timeline from a fresh generator so repeated requests match
async fn timeline(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TimelineRequest>,
) -> Result<Json<PhonemeTimeline>, StatusCode> {
    let duration_ms = req.duration_ms.unwrap_or_else(|| estimate_duration_ms(&req.text));
    if !duration_ms.is_finite() || duration_ms < 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let engine = state.engine.lock().await;
    let accent = engine.pipeline().modulator().accent_for(&req.language).clone();
    drop(engine);

    let mut generator = PhonemeTimelineGenerator::new(state.config.seed).with_anticipation(state.config.anticipation_ms);
    Ok(Json(generator.generate(&req.text, duration_ms, &accent)))
}

/// Speak on the preview engine
async fn plan(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UtteranceRequest>,
) -> Result<Json<PlanResponse>, StatusCode> {
    req.context.validate().map_err(|_| StatusCode::BAD_REQUEST)?;
    let mut engine = state.engine.lock().await;
    let utterance = engine.speak(&req.text, req.context);
    Ok(Json(PlanResponse {
        plan: utterance.plan,
        alternatives: utterance.alternatives,
        state: engine.state(),
        submitted: utterance.submitted,
    }))
}

/// Advance one frame
async fn tick(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TickRequest>,
) -> Result<Json<FrameReport>, StatusCode> {
    if !req.delta_ms.is_finite() || req.delta_ms < 0.0 {
        return Err(StatusCode::BAD_REQUEST);
    }
    let mut engine = state.engine.lock().await;
    let mut rig = state.rig.lock().await;
    Ok(Json(engine.update(req.delta_ms, &mut *rig)))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<MotionSettings> {
    let engine = state.engine.lock().await;
    Json(engine.settings().current().clone())
}

async fn put_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<MotionSettings>,
) -> Json<SettingsResponse> {
    let mut engine = state.engine.lock().await;
    let applied = engine.update_settings(settings);
    Json(SettingsResponse {
        applied,
        settings: engine.settings().current().clone(),
        pending: engine.settings().pending().cloned(),
    })
}

async fn audit(State(state): State<Arc<AppState>>) -> Json<AccessibilityAudit> {
    let engine = state.engine.lock().await;
    Json(engine.audit())
}

/// Run the API server
pub async fn run_server(addr: &str, config: BehaviorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let router = create_router(config);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr, "preview API listening");
    println!("avatar-behavior preview API running on {}", addr);
    println!("  GET  /health    - Health check");
    println!("  POST /analyze   - Content analysis");
    println!("  POST /timeline  - Phoneme timeline");
    println!("  POST /plan      - Speak, returns filtered plan");
    println!("  POST /tick      - Advance one frame");
    println!("  GET  /settings  - Motion settings");
    println!("  PUT  /settings  - Replace motion settings");
    println!("  GET  /audit     - Accessibility audit");
    axum::serve(listener, router).await?;
    Ok(())
}

use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Form, Json, Router,
};
use pulse_core::{UserView, Verifier};
use pulse_storage::UserStore;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use crate::bot::{self, BotClient};
use crate::error::AppError;
use crate::sync;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub store: Arc<Mutex<UserStore>>,
    pub bot: Arc<BotClient>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/init_telegram", post(init_telegram_handler))
        .route("/update_user_prefs", post(update_prefs_handler))
        .route("/whook", post(webhook_handler))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct InitForm {
    #[serde(default, rename = "initData")]
    init_data: String,
}

async fn init_telegram_handler(
    State(state): State<AppState>,
    Form(form): Form<InitForm>,
) -> Result<Json<UserView>, AppError> {
    if form.init_data.is_empty() {
        warn!(event = "missing_init_data");
        return Err(AppError::MissingData);
    }

    let fields = state.verifier.verify(&form.init_data).map_err(|err| {
        warn!(event = "verify_rejected", error = %err);
        AppError::from(err)
    })?;

    let store = state.store.lock().map_err(|_| {
        error!(event = "store_lock_poisoned");
        AppError::Internal
    })?;
    let view = sync::sync_user(&fields, &store)?;

    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct PrefsForm {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    bpm: String,
}

async fn update_prefs_handler(
    State(state): State<AppState>,
    Form(form): Form<PrefsForm>,
) -> Result<Json<serde_json::Value>, AppError> {
    if form.user_id.is_empty() || form.bpm.is_empty() {
        warn!(event = "missing_prefs_fields");
        return Err(AppError::MissingPrefs);
    }
    let user_id: i64 = form.user_id.parse().map_err(|_| AppError::InvalidPrefs)?;
    let bpm: i64 = form.bpm.parse().map_err(|_| AppError::InvalidPrefs)?;

    let updated = {
        let store = state.store.lock().map_err(|_| {
            error!(event = "store_lock_poisoned");
            AppError::Internal
        })?;
        store.set_bpm(user_id, bpm).map_err(|err| {
            error!(event = "set_bpm_failed", user_id, error = %err);
            AppError::Internal
        })?
    };

    if !updated {
        warn!(event = "unknown_user", user_id);
        return Err(AppError::UnknownUser);
    }

    Ok(Json(json!({ "success": true })))
}

async fn webhook_handler(
    State(state): State<AppState>,
    Json(update): Json<bot::Update>,
) -> StatusCode {
    bot::handle_update(update, &state.store, &state.bot).await;
    StatusCode::OK
}

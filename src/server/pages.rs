// HTML pages and the JSON endpoints used by the editor.

use std::collections::HashMap;

use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use minijinja::context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::state::SharedState;
use crate::api::models::{Accessory, ExerciseGroup};
use crate::api::LoginOutcome;
use crate::config::Region;
use crate::credentials::{Credentials, UnitSystem};
use crate::error::AppError;
use crate::workout::decode::decode_template;
use crate::workout::WorkoutDraft;

const DEFAULT_EQUIPMENT: &str = "Standard";

fn to_settings() -> Response {
    Redirect::to("/settings").into_response()
}

fn to_index() -> Response {
    Redirect::to("/").into_response()
}

fn parse_unit(raw: Option<&str>) -> Option<UnitSystem> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or(Some(0), |s| s.parse().ok())
}

pub async fn index(State(state): State<SharedState>) -> Result<Response, AppError> {
    if !state.client.is_logged_in() {
        return Ok(to_settings());
    }

    let workouts = match state.client.user_workouts().await {
        Ok(workouts) => workouts,
        Err(e) => {
            warn!("workout list failed: {}", e);
            state.flashes.error("Error loading workouts. Invalid token?");
            Vec::new()
        }
    };

    let page = state.page(
        "index.html",
        context! { workouts, unit => state.client.unit() },
    )?;
    Ok(page.into_response())
}

pub async fn settings_page(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let creds = state.client.credentials();
    state.page(
        "settings.html",
        context! {
            user_id => creds.user_id,
            token => creds.token,
            region => creds.region.to_string(),
            unit => creds.unit,
        },
    )
}

#[derive(Debug, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    region: String,
    unit: Option<String>,
}

pub async fn save_settings(
    State(state): State<SharedState>,
    Form(form): Form<SettingsForm>,
) -> Result<Response, AppError> {
    let Some(unit) = parse_unit(form.unit.as_deref()) else {
        state.flashes.error("Invalid unit value");
        return Ok(to_settings());
    };

    let credentials = Credentials {
        user_id: form.user_id.trim().to_string(),
        token: form.token.trim().to_string(),
        region: Region::from_form(&form.region),
        unit,
    };
    state.client.save_manual_credentials(credentials)?;
    state.flashes.success("Settings saved!");
    Ok(to_index())
}

#[derive(Debug, Deserialize)]
pub struct UnitForm {
    unit: Option<String>,
}

pub async fn update_unit(
    State(state): State<SharedState>,
    Form(form): Form<UnitForm>,
) -> Response {
    if !state.client.is_logged_in() {
        return to_settings();
    }

    match parse_unit(form.unit.as_deref()) {
        Some(unit) => match state.client.update_unit(unit).await {
            Ok(()) => state.flashes.success("Unit preference updated!"),
            Err(e) => {
                warn!("unit update failed: {}", e);
                state.flashes.error(format!("Error updating unit: {e}"));
            }
        },
        None => state.flashes.error("Invalid unit value"),
    }
    to_settings()
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    region: String,
}

pub async fn login(State(state): State<SharedState>, Form(form): Form<LoginForm>) -> Response {
    let email = form.email.trim();
    if email.is_empty() || form.password.is_empty() {
        state.flashes.error("Email and password required");
        return to_settings();
    }

    let region = Region::from_form(&form.region);
    match state.client.login(email, &form.password, region).await {
        Ok(LoginOutcome::LoggedIn { user_id }) => {
            info!("logged in user_id={} region={}", user_id, region);
            state.flashes.success("Login successful!");
            to_index()
        }
        Ok(LoginOutcome::Refused { reason, detail }) => {
            warn!("login refused reason={} detail={:?}", reason, detail);
            state.flashes.error(format!("Login failed: {reason}"));
            to_settings()
        }
        Err(e) => {
            warn!("login error: {}", e);
            state.flashes.error("Login failed: Connection Error");
            to_settings()
        }
    }
}

pub async fn logout(State(state): State<SharedState>) -> Response {
    match state.client.logout().await {
        Ok(()) => state.flashes.success("Logged out successfully"),
        Err(e) => {
            warn!("logout failed: {}", e);
            state.flashes.error(format!("Logout failed: {e}"));
        }
    }
    to_settings()
}

#[derive(Serialize)]
struct LibraryEntry<'a> {
    #[serde(flatten)]
    group: &'a ExerciseGroup,
    equipment_name: String,
}

/// Accessory names for a group, `Standard` for unknown ids or none at all.
fn equipment_name(group: &ExerciseGroup, names: &HashMap<&str, &str>) -> String {
    let ids = group.accessory_ids();
    if ids.is_empty() {
        return DEFAULT_EQUIPMENT.to_string();
    }
    ids.iter()
        .map(|id| names.get(id).copied().unwrap_or(DEFAULT_EQUIPMENT))
        .collect::<Vec<_>>()
        .join(", ")
}

fn accessory_names(accessories: &[Accessory]) -> HashMap<&str, &str> {
    accessories
        .iter()
        .map(|a| (a.id.as_str(), a.name.as_str()))
        .collect()
}

pub async fn library(State(state): State<SharedState>) -> Result<Response, AppError> {
    if !state.client.is_logged_in() {
        return Ok(to_settings());
    }

    let groups = match state.client.library().await {
        Ok(groups) => groups,
        Err(e) => {
            warn!("library load failed: {}", e);
            state.flashes.error("Error loading exercise library.");
            Default::default()
        }
    };
    let accessories = state.client.accessories().await.unwrap_or_else(|e| {
        warn!("accessory load failed: {}", e);
        Vec::new()
    });

    let names = accessory_names(&accessories);
    let exercises: Vec<LibraryEntry<'_>> = groups
        .iter()
        .map(|group| LibraryEntry {
            group,
            equipment_name: equipment_name(group, &names),
        })
        .collect();

    let page = state.page("library.html", context! { exercises })?;
    Ok(page.into_response())
}

pub async fn exercise_page(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    if !state.client.is_logged_in() {
        return Ok(to_settings());
    }

    let detail = match state.client.exercise_detail(id).await {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            state.flashes.error("Could not load exercise details.");
            return Ok(Redirect::to("/library").into_response());
        }
        Err(e) => {
            warn!("exercise detail failed id={}: {}", id, e);
            state.flashes.error("Could not load exercise details.");
            return Ok(Redirect::to("/library").into_response());
        }
    };

    let required = detail.accessory_ids();
    let accessories: Vec<Accessory> = match state.client.accessories().await {
        Ok(all) => all
            .into_iter()
            .filter(|a| required.contains(&a.id.as_str()))
            .collect(),
        Err(e) => {
            warn!("accessory load failed: {}", e);
            Vec::new()
        }
    };
    let steps = detail.steps();

    let page = state.page(
        "exercise_detail.html",
        context! { ex => detail, steps, accessories },
    )?;
    Ok(page.into_response())
}

pub async fn exercise_json(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    if !state.client.is_logged_in() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
    }

    match state.client.exercise_detail(id).await {
        Ok(detail) => Json(detail.map_or_else(|| json!({}), |d| json!(d))).into_response(),
        Err(e) => {
            warn!("exercise json failed id={}: {}", id, e);
            (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

async fn editor(
    state: &SharedState,
    existing: Option<WorkoutDraft>,
    code: Option<String>,
) -> Result<Response, AppError> {
    let library = match state.client.library().await {
        Ok(groups) => groups,
        Err(e) => {
            warn!("library load failed: {}", e);
            state.flashes.error("Error loading exercise library.");
            Default::default()
        }
    };

    let page = state.page(
        "create.html",
        context! {
            library => library.as_slice(),
            existing_workout => existing,
            code,
            unit => state.client.unit(),
        },
    )?;
    Ok(page.into_response())
}

pub async fn create_page(State(state): State<SharedState>) -> Result<Response, AppError> {
    if !state.client.is_logged_in() {
        return Ok(to_settings());
    }
    editor(&state, None, None).await
}

pub async fn edit_page(
    State(state): State<SharedState>,
    Path(code): Path<String>,
) -> Result<Response, AppError> {
    if !state.client.is_logged_in() {
        return Ok(to_settings());
    }

    let template = match state.client.workout_detail(&code).await {
        Ok(Some(template)) => template,
        Ok(None) => {
            state.flashes.error("Could not load workout details.");
            return Ok(to_index());
        }
        Err(e) => {
            warn!("workout detail failed code={}: {}", code, e);
            state.flashes.error("Could not load workout details.");
            return Ok(to_index());
        }
    };

    let draft = decode_template(&template);
    editor(&state, Some(draft), Some(code)).await
}

pub async fn save_workout(
    State(state): State<SharedState>,
    Json(draft): Json<WorkoutDraft>,
) -> Response {
    if !state.client.is_logged_in() {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "status": "error", "message": "Not logged in" })),
        )
            .into_response();
    }

    let result: Value = match state.client.save_workout(&draft).await {
        Ok(envelope) if envelope.is_success() => {
            info!("workout saved name={:?} id={:?}", draft.name, draft.id);
            json!({ "status": "success" })
        }
        Ok(envelope) => {
            let message = envelope
                .message
                .unwrap_or_else(|| format!("Vendor returned code {}", envelope.code));
            warn!("workout save rejected: {}", message);
            json!({ "status": "error", "message": message })
        }
        Err(e) => {
            warn!("workout save failed: {}", e);
            json!({ "status": "error", "message": e.to_string() })
        }
    };
    Json(result).into_response()
}

pub async fn delete_workout(State(state): State<SharedState>, Path(id): Path<i64>) -> Response {
    if !state.client.is_logged_in() {
        return to_settings();
    }

    match state.client.delete_workout(id).await {
        Ok(()) => state.flashes.info("Workout deleted."),
        Err(e) => {
            warn!("delete failed id={}: {}", id, e);
            state.flashes.error(format!("Error deleting workout: {e}"));
        }
    }
    to_index()
}

pub async fn api_docs(State(state): State<SharedState>) -> Result<Html<String>, AppError> {
    let creds = state.client.credentials();
    state.page(
        "api_docs.html",
        context! { base_url => state.client.config().base_url(creds.region) },
    )
}

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{LoginRequest, MessageResponse, RegisterRequest, UpdateUserRequest},
    services,
};
use crate::{
    affinity::{self, AffinityRecord},
    error::ApiError,
    graph::UserNode,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/registro", post(register))
        .route("/users/login", post(login))
        .route("/users", get(list_users))
        .route("/users/:id/afinidad", get(get_affinity))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<UserNode>), ApiError> {
    let Json(payload) = payload?;
    let user = services::register(state.graph.as_ref(), payload)
        .await
        .map_err(|e| {
            warn!(error = %e, "registration rejected");
            e
        })?;
    info!(user_id = %user.id, "user registered");
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<UserNode>, ApiError> {
    let Json(payload) = payload?;
    match services::login(state.graph.as_ref(), payload).await {
        Ok(user) => {
            info!(user_id = %user.id, "user logged in");
            Ok(Json(user))
        }
        Err(e) => {
            warn!(error = %e, "login rejected");
            Err(e)
        }
    }
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserNode>>, ApiError> {
    Ok(Json(state.graph.list_users().await?))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserNode>, ApiError> {
    Ok(Json(services::get(state.graph.as_ref(), &id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<UserNode>, ApiError> {
    let Json(payload) = payload?;
    let user = services::update(state.graph.as_ref(), &id, payload).await?;
    info!(user_id = %user.id, "user updated");
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::delete(state.graph.as_ref(), &id).await?;
    info!(user_id = %id, "user deleted with posts");
    Ok(Json(MessageResponse {
        mensaje: "Usuario eliminado correctamente",
    }))
}

#[instrument(skip(state))]
pub async fn get_affinity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<AffinityRecord>>, ApiError> {
    let user_id = services::parse_id(&id).ok_or(ApiError::UserNotFound)?;
    let ranking = affinity::rank_affinity(state.graph.as_ref(), user_id).await?;
    info!(%user_id, results = ranking.len(), "affinity ranking computed");
    Ok(Json(ranking))
}

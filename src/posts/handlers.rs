use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{dto::CreatePostRequest, services};
use crate::{
    affinity::{self, SimilarityRecord},
    error::ApiError,
    graph::{AuthoredPost, PostNode},
    state::AppState,
    users::{dto::MessageResponse, services::parse_id},
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/usuario/:user_id", get(list_user_posts))
        .route("/posts/similares/:user_id", get(get_similar_users))
        .route("/posts/:id", delete(delete_post))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PostNode>), ApiError> {
    let Json(payload) = payload?;
    let post = services::publish(state.graph.as_ref(), payload)
        .await
        .map_err(|e| {
            warn!(error = %e, "post rejected");
            e
        })?;
    info!(post_id = %post.id, hashtags = post.hashtags.len(), "post published");
    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<Vec<AuthoredPost>>, ApiError> {
    Ok(Json(services::list_all(state.graph.as_ref()).await?))
}

#[instrument(skip(state))]
pub async fn list_user_posts(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostNode>>, ApiError> {
    Ok(Json(
        services::list_by_user(state.graph.as_ref(), &user_id).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    services::delete(state.graph.as_ref(), &id).await?;
    info!(post_id = %id, "post deleted");
    Ok(Json(MessageResponse {
        mensaje: "Post eliminado correctamente",
    }))
}

#[instrument(skip(state))]
pub async fn get_similar_users(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<SimilarityRecord>>, ApiError> {
    let user_id = parse_id(&user_id).ok_or(ApiError::UserNotFound)?;
    let ranking = affinity::rank_by_hashtags(state.graph.as_ref(), user_id).await?;
    info!(%user_id, results = ranking.len(), "hashtag similarity computed");
    Ok(Json(ranking))
}

//! HTTP-facing errors. Every variant renders as `{"error": "<message>"}`.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::users::dto::{Sex, BIOGRAFIAS_DISPONIBLES};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Cuerpo de la peticion no valido")]
    Json(#[from] JsonRejection),

    #[error("Sexo no valido")]
    InvalidSex,

    #[error("Biografia no valida")]
    InvalidBiography,

    #[error("Email o contraseña incorrectos")]
    InvalidCredentials,

    #[error("Usuario no encontrado")]
    UserNotFound,

    #[error("Post no encontrado")]
    PostNotFound,

    #[error("No se pudo crear el post. Verifica que el userId sea correcto.")]
    AuthorNotFound,

    #[error("Ya existe un usuario con ese email")]
    EmailTaken,

    #[error("Error interno del servidor")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Json(_) | Self::InvalidSex | Self::InvalidBiography => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::UserNotFound | Self::PostNotFound | Self::AuthorNotFound => {
                StatusCode::NOT_FOUND
            }
            Self::EmailTaken => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Internal(err) => {
                tracing::error!(error = ?err, "request failed with a store error");
                json!({ "error": self.to_string() })
            }
            Self::Json(rejection) => {
                tracing::warn!(error = %rejection, "rejected request body");
                json!({ "error": self.to_string(), "detalle": rejection.body_text() })
            }
            Self::InvalidSex => json!({
                "error": self.to_string(),
                "sexosValidos": Sex::ALL.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            }),
            Self::InvalidBiography => json!({
                "error": self.to_string(),
                "biografiasDisponibles": BIOGRAFIAS_DISPONIBLES,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_hide_details() {
        let (status, body) = body_json(ApiError::from(anyhow::anyhow!("pool timed out"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Error interno del servidor");
        assert!(!body.to_string().contains("pool timed out"));
    }

    #[tokio::test]
    async fn invalid_sex_lists_accepted_values() {
        let (status, body) = body_json(ApiError::InvalidSex).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["sexosValidos"].as_array().unwrap().len(), 4);
        assert_eq!(body["sexosValidos"][3], "prefiero_no_decir");
    }

    #[tokio::test]
    async fn invalid_biography_lists_accepted_values() {
        let (_, body) = body_json(ApiError::InvalidBiography).await;
        assert_eq!(body["error"], "Biografia no valida");
        assert_eq!(body["biografiasDisponibles"][0], "Casual, me gustan los ponis");
    }

    #[test]
    fn statuses() {
        assert_eq!(ApiError::UserNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::AuthorNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::EmailTaken.status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
    }
}

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{posts, users};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(api_index))
        .nest(
            "/api",
            Router::new()
                .merge(users::router())
                .merge(posts::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        if status.is_server_error() {
                            tracing::error!(%status, ?latency, "response");
                        } else {
                            tracing::info!(%status, ?latency, "response");
                        }
                    },
                ),
        )
}

async fn api_index() -> Json<Value> {
    Json(json!({
        "nombre": "DataSocial API",
        "version": env!("CARGO_PKG_VERSION"),
        "descripcion": "API de red social sobre un grafo de usuarios, posts y hashtags",
        "endpoints": {
            "usuarios": {
                "registro": "POST /api/users/registro",
                "login": "POST /api/users/login",
                "listar": "GET /api/users",
                "obtener": "GET /api/users/:id",
                "afinidad": "GET /api/users/:id/afinidad",
                "actualizar": "PUT /api/users/:id",
                "eliminar": "DELETE /api/users/:id",
            },
            "posts": {
                "crear": "POST /api/posts",
                "listar": "GET /api/posts",
                "porUsuario": "GET /api/posts/usuario/:userId",
                "similares": "GET /api/posts/similares/:userId",
                "eliminar": "DELETE /api/posts/:id",
            },
        },
    }))
}

pub async fn serve(app: Router, state: &AppState) -> anyhow::Result<()> {
    let addr = state.config.listen_addr()?;

    tracing::info!(environment = %state.config.environment, "listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}

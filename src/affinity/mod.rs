//! Affinity and similarity ranking between users.
//!
//! Both rankings are computed on demand from one bulk load of every user's
//! signals (taste tags plus hashtags reachable through their posts). Nothing is
//! cached between calls.

pub mod dto;
pub mod engine;

use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, graph::Graph};

pub use dto::{AffinityRecord, SimilarityRecord};

/// Loads the signal set and splits out the reference user.
async fn load(
    graph: &dyn Graph,
    user_id: Uuid,
) -> Result<(crate::graph::UserSignals, Vec<crate::graph::UserSignals>), ApiError> {
    let universe = graph.user_signals().await?;
    let reference = universe
        .iter()
        .find(|u| u.id == user_id)
        .cloned()
        .ok_or(ApiError::UserNotFound)?;
    debug!(%user_id, candidates = universe.len().saturating_sub(1), "affinity signals loaded");
    Ok((reference, universe))
}

/// Combined ranking: shared taste tags plus shared hashtags.
pub async fn rank_affinity(
    graph: &dyn Graph,
    user_id: Uuid,
) -> Result<Vec<AffinityRecord>, ApiError> {
    let (reference, universe) = load(graph, user_id).await?;
    Ok(engine::rank_affinity(&reference, &universe))
}

/// Hashtag-only ranking.
pub async fn rank_by_hashtags(
    graph: &dyn Graph,
    user_id: Uuid,
) -> Result<Vec<SimilarityRecord>, ApiError> {
    let (reference, universe) = load(graph, user_id).await?;
    Ok(engine::rank_by_hashtags(&reference, &universe))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{MemoryGraph, NewUser};

    async fn add_user(graph: &MemoryGraph, email: &str, gustos: [&str; 3]) -> Uuid {
        graph
            .create_user(NewUser {
                nombre: email.split('@').next().unwrap_or_default().into(),
                apellidos: "Test".into(),
                sexo: "otro".into(),
                biografia: "Casual, me gustan los ponis".into(),
                gustos: gustos.map(String::from),
                email: email.into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn post(graph: &MemoryGraph, author: Uuid, tags: &[&str]) -> Uuid {
        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        graph
            .create_post(author, "post", &tags)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn unknown_reference_user_is_not_found() {
        let graph = MemoryGraph::new();
        let err = rank_affinity(&graph, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::UserNotFound));
        let err = rank_by_hashtags(&graph, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::UserNotFound));
    }

    #[tokio::test]
    async fn hashtags_are_reached_through_posts() {
        let graph = MemoryGraph::new();
        let a = add_user(&graph, "a@example.com", ["futbol", "viajes", "musica"]).await;
        let b = add_user(&graph, "b@example.com", ["futbol", "cine", "arte"]).await;
        add_user(&graph, "c@example.com", ["cocina", "lectura", "teatro"]).await;
        post(&graph, a, &["deporte"]).await;
        post(&graph, a, &["verano"]).await;
        post(&graph, b, &["deporte", "tecnologia"]).await;

        let ranking = rank_affinity(&graph, a).await.unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking[0].id, b);
        assert_eq!(ranking[0].puntuacion_afinidad, 2);

        let similar = rank_by_hashtags(&graph, a).await.unwrap();
        assert_eq!(similar.len(), 1);
        assert_eq!(similar[0].hashtags_comunes, vec!["deporte".to_string()]);
    }

    #[tokio::test]
    async fn deleting_the_shared_post_drops_the_hashtag_signal() {
        let graph = MemoryGraph::new();
        let a = add_user(&graph, "a@example.com", ["x", "y", "z"]).await;
        let b = add_user(&graph, "b@example.com", ["p", "q", "r"]).await;
        post(&graph, a, &["deporte"]).await;
        let shared = post(&graph, b, &["deporte"]).await;

        assert_eq!(rank_by_hashtags(&graph, a).await.unwrap().len(), 1);
        assert!(graph.delete_post(shared).await.unwrap());
        assert!(rank_by_hashtags(&graph, a).await.unwrap().is_empty());
        assert!(rank_affinity(&graph, a).await.unwrap().is_empty());
        assert!(graph
            .list_hashtags()
            .await
            .unwrap()
            .contains(&"deporte".to_string()));
    }
}

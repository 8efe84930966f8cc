use crate::{
    error::ApiError,
    graph::{normalize_hashtags, AuthoredPost, Graph, PostNode},
    users::services::parse_id,
};

use super::dto::CreatePostRequest;

/// Publishes a post and links it to its hashtags, creating the ones not seen before.
pub async fn publish(graph: &dyn Graph, req: CreatePostRequest) -> Result<PostNode, ApiError> {
    let raw_tags = req
        .hashtag_names()
        .ok_or_else(|| ApiError::bad_request("hashtags debe ser un array de strings"))?;

    let (Some(contenido), Some(user_id)) = (
        req.contenido.filter(|c| !c.trim().is_empty()),
        req.user_id.filter(|u| !u.trim().is_empty()),
    ) else {
        return Err(ApiError::bad_request("Contenido y userId son obligatorios"));
    };

    let author = parse_id(&user_id).ok_or(ApiError::AuthorNotFound)?;
    let hashtags = normalize_hashtags(&raw_tags);

    graph
        .create_post(author, &contenido, &hashtags)
        .await?
        .ok_or(ApiError::AuthorNotFound)
}

pub async fn list_all(graph: &dyn Graph) -> Result<Vec<AuthoredPost>, ApiError> {
    Ok(graph.list_posts().await?)
}

/// Posts of one user; an unknown or malformed id simply has no posts.
pub async fn list_by_user(graph: &dyn Graph, raw_id: &str) -> Result<Vec<PostNode>, ApiError> {
    match parse_id(raw_id) {
        Some(id) => Ok(graph.list_posts_by_user(id).await?),
        None => Ok(Vec::new()),
    }
}

pub async fn delete(graph: &dyn Graph, raw_id: &str) -> Result<(), ApiError> {
    let id = parse_id(raw_id).ok_or(ApiError::PostNotFound)?;
    if graph.delete_post(id).await? {
        Ok(())
    } else {
        Err(ApiError::PostNotFound)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use uuid::Uuid;

    use super::*;
    use crate::graph::{MemoryGraph, NewUser};

    async fn author(graph: &MemoryGraph) -> Uuid {
        graph
            .create_user(NewUser {
                nombre: "Ana".into(),
                apellidos: "Lopez".into(),
                sexo: "femenino".into(),
                biografia: "Casual, me gustan los ponis".into(),
                gustos: ["a", "b", "c"].map(String::from),
                email: "ana@example.com".into(),
                password_hash: "hash".into(),
            })
            .await
            .unwrap()
            .unwrap()
            .id
    }

    fn request(body: serde_json::Value) -> CreatePostRequest {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn publish_normalizes_hashtags() {
        let graph = MemoryGraph::new();
        let id = author(&graph).await;
        let post = publish(
            &graph,
            request(json!({
                "contenido": "Partido hoy",
                "hashtags": ["#Deporte", "deporte", "Verano"],
                "userId": id.to_string(),
            })),
        )
        .await
        .unwrap();
        assert_eq!(post.hashtags, vec!["deporte".to_string(), "verano".to_string()]);
        assert_eq!(
            graph.list_hashtags().await.unwrap(),
            vec!["deporte".to_string(), "verano".to_string()]
        );
    }

    #[tokio::test]
    async fn publish_without_hashtags_is_allowed() {
        let graph = MemoryGraph::new();
        let id = author(&graph).await;
        let post = publish(
            &graph,
            request(json!({ "contenido": "Hola", "userId": id.to_string() })),
        )
        .await
        .unwrap();
        assert!(post.hashtags.is_empty());
    }

    #[tokio::test]
    async fn publish_rejects_missing_fields_and_unknown_author() {
        let graph = MemoryGraph::new();
        let err = publish(&graph, request(json!({ "contenido": "Hola" })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Contenido y userId son obligatorios");

        let err = publish(
            &graph,
            request(json!({ "contenido": "Hola", "userId": Uuid::new_v4().to_string() })),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::AuthorNotFound));

        let err = publish(
            &graph,
            request(json!({ "contenido": "Hola", "userId": "x", "hashtags": "deporte" })),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "hashtags debe ser un array de strings");
    }

    #[tokio::test]
    async fn listing_by_malformed_id_is_empty() {
        let graph = MemoryGraph::new();
        assert!(list_by_user(&graph, "nope").await.unwrap().is_empty());
        assert!(matches!(delete(&graph, "nope").await, Err(ApiError::PostNotFound)));
    }
}

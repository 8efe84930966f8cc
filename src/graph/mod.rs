//! Graph-shaped storage: `User`, `Post` and `Hashtag` nodes joined by
//! `PUBLISHES` (user to post) and `HAS_TAG` (post to hashtag) edges.

use std::collections::BTreeSet;

use async_trait::async_trait;
use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod pg;

pub use memory::MemoryGraph;
pub use pg::PgGraph;

/// User node as stored.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserNode {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub sexo: String,
    pub biografia: String,
    pub gusto_principal1: String,
    pub gusto_principal2: String,
    pub gusto_principal3: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2, never exposed
    #[serde(with = "time::serde::rfc3339")]
    pub fecha_creacion: OffsetDateTime,
}

/// Already validated and normalized registration data.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub nombre: String,
    pub apellidos: String,
    pub sexo: String,
    pub biografia: String,
    pub gustos: [String; 3],
    pub email: String,
    pub password_hash: String,
}

/// Profile fields that may change after registration. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub nombre: Option<String>,
    pub apellidos: Option<String>,
    pub sexo: Option<String>,
    pub biografia: Option<String>,
    pub gusto_principal1: Option<String>,
    pub gusto_principal2: Option<String>,
    pub gusto_principal3: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.nombre.is_none()
            && self.apellidos.is_none()
            && self.sexo.is_none()
            && self.biografia.is_none()
            && self.gusto_principal1.is_none()
            && self.gusto_principal2.is_none()
            && self.gusto_principal3.is_none()
    }

    pub(crate) fn apply(self, user: &mut UserNode) {
        let UserChanges {
            nombre,
            apellidos,
            sexo,
            biografia,
            gusto_principal1,
            gusto_principal2,
            gusto_principal3,
        } = self;
        if let Some(v) = nombre {
            user.nombre = v;
        }
        if let Some(v) = apellidos {
            user.apellidos = v;
        }
        if let Some(v) = sexo {
            user.sexo = v;
        }
        if let Some(v) = biografia {
            user.biografia = v;
        }
        if let Some(v) = gusto_principal1 {
            user.gusto_principal1 = v;
        }
        if let Some(v) = gusto_principal2 {
            user.gusto_principal2 = v;
        }
        if let Some(v) = gusto_principal3 {
            user.gusto_principal3 = v;
        }
    }
}

/// Post node together with the names of the hashtags it is tagged with.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PostNode {
    pub id: Uuid,
    pub contenido: String,
    #[serde(with = "time::serde::rfc3339")]
    pub fecha_creacion: OffsetDateTime,
    pub hashtags: Vec<String>,
}

/// Post listed together with the display name of its author.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthoredPost {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub post: PostNode,
    pub autor: String,
}

/// Everything the affinity engine needs to know about one user:
/// the explicit taste tags and every hashtag reachable through their posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSignals {
    pub id: Uuid,
    pub nombre: String,
    pub apellidos: String,
    pub gustos: [String; 3],
    pub hashtags: BTreeSet<String>,
}

/// Data access used by the HTTP handlers and the affinity engine.
///
/// Implementations own their connection handling; callers get a handle
/// through [`crate::state::AppState`] and never hold a connection across calls.
#[async_trait]
pub trait Graph: Send + Sync {
    /// Creates a user node. Returns `None` when the email is already registered.
    async fn create_user(&self, user: NewUser) -> anyhow::Result<Option<UserNode>>;
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<UserNode>>;
    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<UserNode>>;
    async fn list_users(&self) -> anyhow::Result<Vec<UserNode>>;
    async fn update_user(&self, id: Uuid, changes: UserChanges)
        -> anyhow::Result<Option<UserNode>>;
    /// Removes the user, their posts and the posts' `HAS_TAG` edges.
    /// Hashtag nodes are kept.
    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Creates a post published by `author` and tags it, merging each hashtag
    /// by name. Returns `None` when the author does not exist.
    async fn create_post(
        &self,
        author: Uuid,
        contenido: &str,
        hashtags: &[String],
    ) -> anyhow::Result<Option<PostNode>>;
    /// Every post, newest first.
    async fn list_posts(&self) -> anyhow::Result<Vec<AuthoredPost>>;
    /// Posts published by `author`, newest first.
    async fn list_posts_by_user(&self, author: Uuid) -> anyhow::Result<Vec<PostNode>>;
    /// Removes the post and its `HAS_TAG` edges. Hashtag nodes are kept.
    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool>;

    /// Every known hashtag name, ascending.
    async fn list_hashtags(&self) -> anyhow::Result<Vec<String>>;

    /// Taste tags and reachable hashtags of every user, loaded in one pass.
    async fn user_signals(&self) -> anyhow::Result<Vec<UserSignals>>;
}

/// Lower-cases and trims a taste tag or hashtag name.
pub fn normalize_tag(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalizes hashtag names for a new post: strips a leading `#`, drops blanks
/// and keeps the first occurrence of each name.
pub fn normalize_hashtags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    raw.into_iter()
        .map(|h| normalize_tag(h.as_ref().trim().trim_start_matches('#')))
        .filter(|h| !h.is_empty())
        .filter(|h| seen.insert(h.clone()))
        .collect()
}

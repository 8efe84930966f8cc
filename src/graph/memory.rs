use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    AuthoredPost, Graph, NewUser, PostNode, UserChanges, UserNode, UserSignals,
};

struct StoredPost {
    id: Uuid,
    author: Uuid,
    contenido: String,
    fecha_creacion: OffsetDateTime,
}

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserNode>,
    // insertion order doubles as a tie-break for equal timestamps
    posts: Vec<StoredPost>,
    hashtags: BTreeSet<String>,
    has_tag: HashMap<Uuid, Vec<String>>,
}

impl Inner {
    fn tags_of(&self, post: Uuid) -> Vec<String> {
        let mut tags = self.has_tag.get(&post).cloned().unwrap_or_default();
        tags.sort();
        tags
    }

    fn to_node(&self, p: &StoredPost) -> PostNode {
        PostNode {
            id: p.id,
            contenido: p.contenido.clone(),
            fecha_creacion: p.fecha_creacion,
            hashtags: self.tags_of(p.id),
        }
    }

    fn newest_first(&self, author: Option<Uuid>) -> Vec<&StoredPost> {
        let mut posts: Vec<&StoredPost> = self
            .posts
            .iter()
            .rev()
            .filter(|p| author.map_or(true, |a| p.author == a))
            .collect();
        posts.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));
        posts
    }
}

/// Adjacency-list graph kept in process memory.
#[derive(Default)]
pub struct MemoryGraph {
    inner: RwLock<Inner>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Graph for MemoryGraph {
    async fn create_user(&self, user: NewUser) -> anyhow::Result<Option<UserNode>> {
        let mut inner = self.inner.write().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Ok(None);
        }
        let [g1, g2, g3] = user.gustos;
        let node = UserNode {
            id: Uuid::new_v4(),
            nombre: user.nombre,
            apellidos: user.apellidos,
            sexo: user.sexo,
            biografia: user.biografia,
            gusto_principal1: g1,
            gusto_principal2: g2,
            gusto_principal3: g3,
            email: user.email,
            password_hash: user.password_hash,
            fecha_creacion: OffsetDateTime::now_utc(),
        };
        inner.users.insert(node.id, node.clone());
        Ok(Some(node))
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<UserNode>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<UserNode>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> anyhow::Result<Vec<UserNode>> {
        let inner = self.inner.read().await;
        let mut users: Vec<UserNode> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| {
            a.fecha_creacion
                .cmp(&b.fecha_creacion)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(users)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> anyhow::Result<Option<UserNode>> {
        let mut inner = self.inner.write().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        changes.apply(user);
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<Uuid> = inner
            .posts
            .iter()
            .filter(|p| p.author == id)
            .map(|p| p.id)
            .collect();
        inner.posts.retain(|p| p.author != id);
        for post in &owned {
            inner.has_tag.remove(post);
        }
        debug!(user_id = %id, posts = owned.len(), "user detached and deleted");
        Ok(true)
    }

    async fn create_post(
        &self,
        author: Uuid,
        contenido: &str,
        hashtags: &[String],
    ) -> anyhow::Result<Option<PostNode>> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&author) {
            return Ok(None);
        }
        let post = StoredPost {
            id: Uuid::new_v4(),
            author,
            contenido: contenido.to_string(),
            fecha_creacion: OffsetDateTime::now_utc(),
        };
        for tag in hashtags {
            // merge: reuse the node when the name is already known
            inner.hashtags.insert(tag.clone());
        }
        inner.has_tag.insert(post.id, hashtags.to_vec());
        let node = PostNode {
            id: post.id,
            contenido: post.contenido.clone(),
            fecha_creacion: post.fecha_creacion,
            hashtags: hashtags.to_vec(),
        };
        inner.posts.push(post);
        Ok(Some(node))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<AuthoredPost>> {
        let inner = self.inner.read().await;
        let posts = inner
            .newest_first(None)
            .into_iter()
            .map(|p| {
                let autor = inner
                    .users
                    .get(&p.author)
                    .map(|u| format!("{} {}", u.nombre, u.apellidos))
                    .unwrap_or_default();
                AuthoredPost {
                    post: inner.to_node(p),
                    autor,
                }
            })
            .collect();
        Ok(posts)
    }

    async fn list_posts_by_user(&self, author: Uuid) -> anyhow::Result<Vec<PostNode>> {
        let inner = self.inner.read().await;
        Ok(inner
            .newest_first(Some(author))
            .into_iter()
            .map(|p| inner.to_node(p))
            .collect())
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut inner = self.inner.write().await;
        let before = inner.posts.len();
        inner.posts.retain(|p| p.id != id);
        if inner.posts.len() == before {
            return Ok(false);
        }
        inner.has_tag.remove(&id);
        Ok(true)
    }

    async fn list_hashtags(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.inner.read().await.hashtags.iter().cloned().collect())
    }

    async fn user_signals(&self) -> anyhow::Result<Vec<UserSignals>> {
        let inner = self.inner.read().await;

        let mut reachable: BTreeMap<Uuid, BTreeSet<String>> = BTreeMap::new();
        for post in &inner.posts {
            if let Some(tags) = inner.has_tag.get(&post.id) {
                reachable
                    .entry(post.author)
                    .or_default()
                    .extend(tags.iter().cloned());
            }
        }

        Ok(inner
            .users
            .values()
            .map(|u| UserSignals {
                id: u.id,
                nombre: u.nombre.clone(),
                apellidos: u.apellidos.clone(),
                gustos: [
                    u.gusto_principal1.clone(),
                    u.gusto_principal2.clone(),
                    u.gusto_principal3.clone(),
                ],
                hashtags: reachable.remove(&u.id).unwrap_or_default(),
            })
            .collect())
    }
}

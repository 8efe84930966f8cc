use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

use super::{AuthoredPost, Graph, NewUser, PostNode, UserChanges, UserNode, UserSignals};

const USER_COLUMNS: &str = "id, nombre, apellidos, sexo, biografia, \
    gusto_principal1, gusto_principal2, gusto_principal3, \
    email, password_hash, fecha_creacion";

/// Graph stored in PostgreSQL: nodes are rows, `PUBLISHES` is `posts.user_id`
/// and `HAS_TAG` is the `post_hashtags` join table.
#[derive(Clone)]
pub struct PgGraph {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct SignalsRow {
    id: Uuid,
    nombre: String,
    apellidos: String,
    gusto_principal1: String,
    gusto_principal2: String,
    gusto_principal3: String,
    hashtags: Vec<String>,
}

impl From<SignalsRow> for UserSignals {
    fn from(r: SignalsRow) -> Self {
        Self {
            id: r.id,
            nombre: r.nombre,
            apellidos: r.apellidos,
            gustos: [r.gusto_principal1, r.gusto_principal2, r.gusto_principal3],
            hashtags: r.hashtags.into_iter().collect(),
        }
    }
}

impl PgGraph {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self::from_pool(db))
    }

    pub fn from_pool(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Graph for PgGraph {
    async fn create_user(&self, user: NewUser) -> anyhow::Result<Option<UserNode>> {
        let [g1, g2, g3] = user.gustos;
        let created = sqlx::query_as::<_, UserNode>(&format!(
            r#"
            INSERT INTO users (id, nombre, apellidos, sexo, biografia,
                               gusto_principal1, gusto_principal2, gusto_principal3,
                               email, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (email) DO NOTHING
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(user.nombre)
        .bind(user.apellidos)
        .bind(user.sexo)
        .bind(user.biografia)
        .bind(g1)
        .bind(g2)
        .bind(g3)
        .bind(user.email)
        .bind(user.password_hash)
        .fetch_optional(&self.db)
        .await
        .context("insert user")?;
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<UserNode>> {
        let user = sqlx::query_as::<_, UserNode>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<UserNode>> {
        let user = sqlx::query_as::<_, UserNode>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn list_users(&self) -> anyhow::Result<Vec<UserNode>> {
        let users = sqlx::query_as::<_, UserNode>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY fecha_creacion ASC, id ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list users")?;
        Ok(users)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: UserChanges,
    ) -> anyhow::Result<Option<UserNode>> {
        let user = sqlx::query_as::<_, UserNode>(&format!(
            r#"
            UPDATE users SET
                nombre           = COALESCE($2, nombre),
                apellidos        = COALESCE($3, apellidos),
                sexo             = COALESCE($4, sexo),
                biografia        = COALESCE($5, biografia),
                gusto_principal1 = COALESCE($6, gusto_principal1),
                gusto_principal2 = COALESCE($7, gusto_principal2),
                gusto_principal3 = COALESCE($8, gusto_principal3)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.nombre)
        .bind(changes.apellidos)
        .bind(changes.sexo)
        .bind(changes.biografia)
        .bind(changes.gusto_principal1)
        .bind(changes.gusto_principal2)
        .bind(changes.gusto_principal3)
        .fetch_optional(&self.db)
        .await
        .context("update user")?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> anyhow::Result<bool> {
        // posts and post_hashtags go with ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete user")?;
        Ok(res.rows_affected() > 0)
    }

    async fn create_post(
        &self,
        author: Uuid,
        contenido: &str,
        hashtags: &[String],
    ) -> anyhow::Result<Option<PostNode>> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let created: Option<(Uuid, time::OffsetDateTime)> = sqlx::query_as(
            r#"
            INSERT INTO posts (id, user_id, contenido)
            SELECT $1, $2, $3
            WHERE EXISTS (SELECT 1 FROM users WHERE id = $2)
            RETURNING id, fecha_creacion
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author)
        .bind(contenido)
        .fetch_optional(&mut *tx)
        .await
        .context("insert post")?;

        let Some((id, fecha_creacion)) = created else {
            tx.rollback().await.context("rollback tx")?;
            return Ok(None);
        };

        if !hashtags.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO hashtags (nombre)
                SELECT UNNEST($1::text[])
                ON CONFLICT (nombre) DO NOTHING
                "#,
            )
            .bind(hashtags)
            .execute(&mut *tx)
            .await
            .context("merge hashtags")?;

            sqlx::query(
                r#"
                INSERT INTO post_hashtags (post_id, hashtag)
                SELECT $1, UNNEST($2::text[])
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(hashtags)
            .execute(&mut *tx)
            .await
            .context("tag post")?;
        }

        tx.commit().await.context("commit tx")?;

        Ok(Some(PostNode {
            id,
            contenido: contenido.to_string(),
            fecha_creacion,
            hashtags: hashtags.to_vec(),
        }))
    }

    async fn list_posts(&self) -> anyhow::Result<Vec<AuthoredPost>> {
        let rows = sqlx::query_as::<_, AuthoredPost>(
            r#"
            SELECT p.id, p.contenido, p.fecha_creacion,
                   COALESCE(
                       array_agg(ph.hashtag ORDER BY ph.hashtag)
                           FILTER (WHERE ph.hashtag IS NOT NULL),
                       '{}'::text[]
                   ) AS hashtags,
                   u.nombre || ' ' || u.apellidos AS autor
              FROM posts p
              JOIN users u ON u.id = p.user_id
         LEFT JOIN post_hashtags ph ON ph.post_id = p.id
          GROUP BY p.id, u.id
          ORDER BY p.fecha_creacion DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("list posts")?;
        Ok(rows)
    }

    async fn list_posts_by_user(&self, author: Uuid) -> anyhow::Result<Vec<PostNode>> {
        let rows = sqlx::query_as::<_, PostNode>(
            r#"
            SELECT p.id, p.contenido, p.fecha_creacion,
                   COALESCE(
                       array_agg(ph.hashtag ORDER BY ph.hashtag)
                           FILTER (WHERE ph.hashtag IS NOT NULL),
                       '{}'::text[]
                   ) AS hashtags
              FROM posts p
         LEFT JOIN post_hashtags ph ON ph.post_id = p.id
             WHERE p.user_id = $1
          GROUP BY p.id
          ORDER BY p.fecha_creacion DESC
            "#,
        )
        .bind(author)
        .fetch_all(&self.db)
        .await
        .context("list posts by user")?;
        Ok(rows)
    }

    async fn delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_hashtags(&self) -> anyhow::Result<Vec<String>> {
        let names: Vec<(String,)> = sqlx::query_as("SELECT nombre FROM hashtags ORDER BY nombre")
            .fetch_all(&self.db)
            .await
            .context("list hashtags")?;
        Ok(names.into_iter().map(|(n,)| n).collect())
    }

    async fn user_signals(&self) -> anyhow::Result<Vec<UserSignals>> {
        // User -[PUBLISHES]-> Post -[HAS_TAG]-> Hashtag, folded per user
        let rows = sqlx::query_as::<_, SignalsRow>(
            r#"
            SELECT u.id, u.nombre, u.apellidos,
                   u.gusto_principal1, u.gusto_principal2, u.gusto_principal3,
                   COALESCE(
                       array_agg(DISTINCT ph.hashtag)
                           FILTER (WHERE ph.hashtag IS NOT NULL),
                       '{}'::text[]
                   ) AS hashtags
              FROM users u
         LEFT JOIN posts p ON p.user_id = u.id
         LEFT JOIN post_hashtags ph ON ph.post_id = p.id
          GROUP BY u.id
            "#,
        )
        .fetch_all(&self.db)
        .await
        .context("load user signals")?;
        Ok(rows.into_iter().map(UserSignals::from).collect())
    }
}

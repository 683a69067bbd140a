use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::post::Post;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(
        &self,
        author_id: i64,
        body: String,
        group_id: Option<i64>,
        image_key: Option<String>,
    ) -> Result<Post> {
        let row = sqlx::query(
            "WITH inserted_post AS ( \
                INSERT INTO posts (author_id, body, group_id, image_key) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, author_id, body, group_id, image_key, created_at \
             ) \
             SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                    p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
             FROM inserted_post p \
             JOIN users u ON p.author_id = u.id \
             LEFT JOIN groups g ON p.group_id = g.id",
        )
        .bind(author_id)
        .bind(body)
        .bind(group_id)
        .bind(image_key)
        .fetch_one(self.db.pool())
        .await?;

        Ok(post_from_row(&row))
    }

    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                    p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
             FROM posts p \
             JOIN users u ON p.author_id = u.id \
             LEFT JOIN groups g ON p.group_id = g.id \
             WHERE p.id = $1",
        )
        .bind(post_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| post_from_row(&row)))
    }

    /// Update a post's content. The author filter makes this a no-op for
    /// anyone else; created_at is never touched.
    pub async fn update_post(
        &self,
        post_id: i64,
        author_id: i64,
        body: String,
        group_id: Option<i64>,
        image_key: Option<String>,
    ) -> Result<Option<Post>> {
        let row = sqlx::query(
            "WITH updated_post AS ( \
                UPDATE posts \
                SET body = $3, group_id = $4, image_key = COALESCE($5, image_key) \
                WHERE id = $1 AND author_id = $2 \
                RETURNING id, author_id, body, group_id, image_key, created_at \
             ) \
             SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                    p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
             FROM updated_post p \
             JOIN users u ON p.author_id = u.id \
             LEFT JOIN groups g ON p.group_id = g.id",
        )
        .bind(post_id)
        .bind(author_id)
        .bind(body)
        .bind(group_id)
        .bind(image_key)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| post_from_row(&row)))
    }

    pub async fn count_by_author(&self, author_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(count)
    }
}

fn post_from_row(row: &PgRow) -> Post {
    Post {
        id: row.get("id"),
        author_id: row.get("author_id"),
        author_username: row.get("author_username"),
        body: row.get("body"),
        group_id: row.get("group_id"),
        group_slug: row.get("group_slug"),
        image_key: row.get("image_key"),
        image_url: None,
        created_at: row.get("created_at"),
    }
}

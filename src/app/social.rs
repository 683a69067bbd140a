use anyhow::Result;
use sqlx::Row;

use crate::domain::social_graph::Follow;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct SocialService {
    db: Db,
}

impl SocialService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a follower edge. Idempotent: an existing edge and a
    /// self-follow both insert nothing and return None.
    pub async fn follow(&self, follower_id: i64, followee_id: i64) -> Result<Option<Follow>> {
        let row = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id) \
             SELECT $1, $2 \
             WHERE $1 <> $2 \
             ON CONFLICT DO NOTHING \
             RETURNING follower_id, followee_id, created_at",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(self.db.pool())
        .await?;

        let follow = row.map(|row| Follow {
            follower_id: row.get("follower_id"),
            followee_id: row.get("followee_id"),
            created_at: row.get("created_at"),
        });

        Ok(follow)
    }

    /// Remove a follower edge. Idempotent: removing an absent edge is a
    /// no-op. Returns whether an edge was removed.
    pub async fn unfollow(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM follows WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(follower_id)
        .bind(followee_id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_following(&self, follower_id: i64, followee_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS ( \
                SELECT 1 FROM follows WHERE follower_id = $1 AND followee_id = $2 \
             )",
        )
        .bind(follower_id)
        .bind(followee_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(exists)
    }
}

use anyhow::Result;
use sqlx::Row;

use crate::app::pagination::{PageBounds, Paginated, PAGE_SIZE};
use crate::domain::post::Post;
use crate::infra::db::Db;

/// Which slice of the post store a feed request names.
#[derive(Debug, Clone, Copy)]
pub enum FeedScope {
    All,
    Group(i64),
    Author(i64),
    SubscriptionsOf(i64),
}

#[derive(Clone)]
pub struct FeedService {
    db: Db,
}

impl FeedService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Count, clamp the requested page, then fetch that page. Every scope
    /// orders by (created_at DESC, id DESC).
    pub async fn select_page(
        &self,
        scope: FeedScope,
        requested_page: Option<&str>,
    ) -> Result<Paginated<Post>> {
        let total = self.count(scope).await?;
        let bounds = PageBounds::resolve(requested_page, total, PAGE_SIZE);
        let posts = self.list(scope, PAGE_SIZE, bounds.offset).await?;
        Ok(Paginated::new(posts, bounds))
    }

    pub async fn count(&self, scope: FeedScope) -> Result<i64> {
        let count: i64 = match scope {
            FeedScope::All => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts")
                    .fetch_one(self.db.pool())
                    .await?
            }
            FeedScope::Group(group_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE group_id = $1")
                    .bind(group_id)
                    .fetch_one(self.db.pool())
                    .await?
            }
            FeedScope::Author(author_id) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE author_id = $1")
                    .bind(author_id)
                    .fetch_one(self.db.pool())
                    .await?
            }
            FeedScope::SubscriptionsOf(user_id) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM posts \
                     WHERE author_id IN ( \
                         SELECT followee_id FROM follows WHERE follower_id = $1 \
                     )",
                )
                .bind(user_id)
                .fetch_one(self.db.pool())
                .await?
            }
        };

        Ok(count)
    }

    pub async fn list(&self, scope: FeedScope, limit: i64, offset: i64) -> Result<Vec<Post>> {
        let rows = match scope {
            FeedScope::All => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                            p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
                     FROM posts p \
                     JOIN users u ON p.author_id = u.id \
                     LEFT JOIN groups g ON p.group_id = g.id \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $1 OFFSET $2",
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            FeedScope::Group(group_id) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                            p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
                     FROM posts p \
                     JOIN users u ON p.author_id = u.id \
                     LEFT JOIN groups g ON p.group_id = g.id \
                     WHERE p.group_id = $1 \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $2 OFFSET $3",
                )
                .bind(group_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            FeedScope::Author(author_id) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                            p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
                     FROM posts p \
                     JOIN users u ON p.author_id = u.id \
                     LEFT JOIN groups g ON p.group_id = g.id \
                     WHERE p.author_id = $1 \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $2 OFFSET $3",
                )
                .bind(author_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
            FeedScope::SubscriptionsOf(user_id) => {
                sqlx::query(
                    "SELECT p.id, p.author_id, u.username AS author_username, p.body, \
                            p.group_id, g.slug AS group_slug, p.image_key, p.created_at \
                     FROM posts p \
                     JOIN users u ON p.author_id = u.id \
                     LEFT JOIN groups g ON p.group_id = g.id \
                     WHERE p.author_id IN ( \
                         SELECT followee_id FROM follows WHERE follower_id = $1 \
                     ) \
                     ORDER BY p.created_at DESC, p.id DESC \
                     LIMIT $2 OFFSET $3",
                )
                .bind(user_id)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await?
            }
        };

        let mut posts = Vec::with_capacity(rows.len());
        for row in rows {
            posts.push(Post {
                id: row.get("id"),
                author_id: row.get("author_id"),
                author_username: row.get("author_username"),
                body: row.get("body"),
                group_id: row.get("group_id"),
                group_slug: row.get("group_slug"),
                image_key: row.get("image_key"),
                image_url: None,
                created_at: row.get("created_at"),
            });
        }

        Ok(posts)
    }
}

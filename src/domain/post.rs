use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub body: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    #[serde(skip_serializing)]
    pub image_key: Option<String>,
    /// Public URL for the attached image (populated at response time).
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

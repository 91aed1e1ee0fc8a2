use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use super::category::Category;

#[derive(
    Queryable, Selectable, Identifiable, Debug, Serialize, Deserialize, Clone, PartialEq,
)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: String,
    pub image_url: Option<String>,
    pub upvotes: i32,
    pub downvotes: i32,
    pub comment_count: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::posts)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub image_url: Option<String>,
}

// `image_url: Some(None)` clears the column, `None` leaves it untouched
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::posts)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<Option<String>>,
    pub updated_at: NaiveDateTime,
}

/// Lightweight post listing used when a category is fetched with its posts.
#[derive(Queryable, Selectable, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub created_at: NaiveDateTime,
}

#[derive(Queryable, Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct VoteCounts {
    pub id: i32,
    pub upvotes: i32,
    pub downvotes: i32,
}

#[derive(Identifiable, Selectable, Queryable, Associations, Insertable, Debug, Clone)]
#[diesel(belongs_to(Post))]
#[diesel(belongs_to(Category))]
#[diesel(table_name = crate::schema::post_categories)]
#[diesel(primary_key(post_id, category_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PostCategory {
    pub post_id: i32,
    pub category_id: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PostWithCategories {
    #[serde(flatten)]
    pub post: Post,
    pub categories: Vec<Category>,
}

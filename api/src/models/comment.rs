use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Queryable, Selectable, Debug, Serialize, Deserialize, Clone, PartialEq)]
#[diesel(table_name = crate::schema::comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i32,
    #[serde(rename = "blogId")]
    pub post_id: i32,
    pub author: String,
    pub content: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::comments)]
pub struct NewComment {
    pub post_id: i32,
    pub author: String,
    pub content: String,
}

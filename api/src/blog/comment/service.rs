use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::{
    error::ServiceError,
    models::comment::{Comment, NewComment},
    schema::{comments, posts},
};

macro_rules! increment_comment_count {
    ($post_id:expr) => {
        diesel::update(posts::table.find($post_id))
            .set(posts::comment_count.eq(posts::comment_count + 1))
    };
}

// never below zero
macro_rules! decrement_comment_count {
    ($post_id:expr) => {
        diesel::update(
            posts::table
                .find($post_id)
                .filter(posts::comment_count.gt(0)),
        )
        .set(posts::comment_count.eq(posts::comment_count - 1))
    };
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    new_comment: NewComment,
) -> Result<Comment, ServiceError> {
    let comment = conn
        .transaction(|conn| Box::pin(insert_comment(conn, new_comment)))
        .await?;

    tracing::info!(
        comment_id = comment.id,
        post_id = comment.post_id,
        "Created comment"
    );

    Ok(comment)
}

// The comment row and the post's counter are written in one transaction
async fn insert_comment(
    conn: &mut AsyncPgConnection,
    new_comment: NewComment,
) -> Result<Comment, ServiceError> {
    let post_exists: bool =
        diesel::select(diesel::dsl::exists(posts::table.find(new_comment.post_id)))
            .get_result(conn)
            .await?;

    if !post_exists {
        return Err(ServiceError::NotFound("Blog"));
    }

    // the post can still vanish between the check and the insert
    let comment = diesel::insert_into(comments::table)
        .values(&new_comment)
        .returning(Comment::as_returning())
        .get_result(conn)
        .await
        .map_err(|e| match e {
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                ServiceError::NotFound("Blog")
            }
            e => e.into(),
        })?;

    increment_comment_count!(comment.post_id)
        .execute(conn)
        .await?;

    Ok(comment)
}

pub async fn list_by_post(
    conn: &mut AsyncPgConnection,
    post_id: i32,
) -> Result<Vec<Comment>, ServiceError> {
    Ok(comments::table
        .filter(comments::post_id.eq(post_id))
        .select(Comment::as_select())
        .order((comments::created_at.desc(), comments::id.desc()))
        .load(conn)
        .await?)
}

/// Returns `false` when there is no such comment.
pub async fn delete(conn: &mut AsyncPgConnection, id: i32) -> Result<bool, ServiceError> {
    let post_id = conn
        .transaction(|conn| Box::pin(remove_comment(conn, id)))
        .await?;

    match post_id {
        Some(post_id) => {
            tracing::info!(comment_id = id, post_id, "Deleted comment");
            Ok(true)
        }
        None => Ok(false),
    }
}

async fn remove_comment(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<Option<i32>, ServiceError> {
    let post_id: Option<i32> = diesel::delete(comments::table.find(id))
        .returning(comments::post_id)
        .get_result(conn)
        .await
        .optional()?;

    let Some(post_id) = post_id else {
        return Ok(None);
    };

    decrement_comment_count!(post_id).execute(conn).await?;

    Ok(Some(post_id))
}

#[cfg(test)]
mod test {
    use diesel::pg::Pg;

    use super::*;

    #[test]
    fn test_new_comment_bumps_count_by_one() {
        let query = diesel::debug_query::<Pg, _>(&increment_comment_count!(3)).to_string();

        assert!(
            query.starts_with(r#"UPDATE "posts" SET "comment_count" = "#),
            "{query}"
        );
        assert!(query.contains(r#""posts"."comment_count" + $1"#), "{query}");
        assert!(query.ends_with("binds: [1, 3]"), "{query}");
    }

    #[test]
    fn test_decrement_is_guarded_at_zero() {
        let query = diesel::debug_query::<Pg, _>(&decrement_comment_count!(3)).to_string();

        assert!(query.contains(r#""posts"."comment_count" - $1"#), "{query}");
        assert!(query.contains(r#""posts"."id" = $2"#), "{query}");
        assert!(query.contains(r#""posts"."comment_count" > $3"#), "{query}");
        assert!(query.ends_with("binds: [1, 3, 0]"), "{query}");
    }
}

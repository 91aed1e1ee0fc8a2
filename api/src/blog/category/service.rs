use std::collections::HashMap;

use diesel::{
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    error::ServiceError,
    models::{
        category::{Category, CategoryChanges, CategoryWithCount, CategoryWithPosts, NewCategory},
        post::{PostCategory, PostSummary},
    },
    schema::{categories, post_categories, posts},
};

pub const DUPLICATE_NAME: &str = "Category with this name already exists";

// both `name` and `slug` are unique, either one means a duplicate name
fn unique_conflict(e: DieselError) -> ServiceError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            ServiceError::Conflict(DUPLICATE_NAME)
        }
        e => e.into(),
    }
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    new_category: NewCategory,
) -> Result<Category, ServiceError> {
    let category = diesel::insert_into(categories::table)
        .values(&new_category)
        .returning(Category::as_returning())
        .get_result(conn)
        .await
        .map_err(unique_conflict)?;

    tracing::info!(category_id = category.id, slug = %category.slug, "Created category");

    Ok(category)
}

pub async fn list(conn: &mut AsyncPgConnection) -> Result<Vec<CategoryWithCount>, ServiceError> {
    let categories = categories::table
        .select(Category::as_select())
        .order(categories::name.asc())
        .load(conn)
        .await?;

    let counts: HashMap<i32, i64> = post_categories::table
        .group_by(post_categories::category_id)
        .select((post_categories::category_id, diesel::dsl::count_star()))
        .load::<(i32, i64)>(conn)
        .await?
        .into_iter()
        .collect();

    Ok(categories
        .into_iter()
        .map(|category| CategoryWithCount {
            post_count: counts.get(&category.id).copied().unwrap_or(0),
            category,
        })
        .collect())
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<Option<CategoryWithPosts>, ServiceError> {
    let category = categories::table
        .find(id)
        .select(Category::as_select())
        .first(conn)
        .await
        .optional()?;

    let Some(category) = category else {
        return Ok(None);
    };

    let posts = PostCategory::belonging_to(&category)
        .inner_join(posts::table)
        .select(PostSummary::as_select())
        .order((posts::created_at.desc(), posts::id.desc()))
        .load(conn)
        .await?;

    Ok(Some(CategoryWithPosts { category, posts }))
}

pub async fn update(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: CategoryChanges,
) -> Result<Option<Category>, ServiceError> {
    diesel::update(categories::table.find(id))
        .set(&changes)
        .returning(Category::as_returning())
        .get_result(conn)
        .await
        .optional()
        .map_err(unique_conflict)
}

pub async fn delete(conn: &mut AsyncPgConnection, id: i32) -> Result<bool, ServiceError> {
    let deleted = diesel::delete(categories::table.find(id))
        .execute(conn)
        .await?;

    if deleted > 0 {
        tracing::info!(category_id = id, "Deleted category");
    }

    Ok(deleted > 0)
}

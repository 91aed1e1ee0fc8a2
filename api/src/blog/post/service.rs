use diesel::{
    pg::Pg,
    prelude::*,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::{
    error::ServiceError,
    models::{
        category::Category,
        post::{NewPost, Post, PostCategory, PostChanges, PostWithCategories, VoteCounts},
    },
    schema::{categories, post_categories, posts},
    utils::escape_like,
};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListParams {
    pub limit: i64,
    pub offset: i64,
    pub search: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(Debug)]
pub struct PostPage {
    pub posts: Vec<PostWithCategories>,
    /// Number of distinct posts matching the filters, ignoring limit and offset.
    pub total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

fn filtered_posts(params: &ListParams) -> posts::BoxedQuery<'static, Pg> {
    let mut query = posts::table.into_boxed();

    if let Some(search) = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        let pattern = format!("%{}%", escape_like(search));
        query = query.filter(
            posts::title
                .ilike(pattern.clone())
                .or(posts::content.ilike(pattern)),
        );
    }

    // a subselect instead of a join keeps each post at most once
    if let Some(category_id) = params.category_id {
        query = query.filter(
            posts::id.eq_any(
                post_categories::table
                    .filter(post_categories::category_id.eq(category_id))
                    .select(post_categories::post_id),
            ),
        );
    }

    query
}

async fn with_categories(
    conn: &mut AsyncPgConnection,
    post: Post,
) -> Result<PostWithCategories, DieselError> {
    let categories = PostCategory::belonging_to(&post)
        .inner_join(categories::table)
        .select(Category::as_select())
        .order(categories::name.asc())
        .load(conn)
        .await?;

    Ok(PostWithCategories { post, categories })
}

// Loads the categories of a whole page in one query
async fn attach_categories(
    conn: &mut AsyncPgConnection,
    posts: Vec<Post>,
) -> Result<Vec<PostWithCategories>, DieselError> {
    if posts.is_empty() {
        return Ok(vec![]);
    }

    let links = PostCategory::belonging_to(&posts)
        .inner_join(categories::table)
        .select((PostCategory::as_select(), Category::as_select()))
        .order(categories::name.asc())
        .load::<(PostCategory, Category)>(conn)
        .await?;

    Ok(links
        .grouped_by(&posts)
        .into_iter()
        .zip(posts)
        .map(|(links, post)| PostWithCategories {
            post,
            categories: links.into_iter().map(|(_, category)| category).collect(),
        })
        .collect())
}

// Single UPDATE so concurrent votes don't overwrite each other
macro_rules! increment_vote {
    ($id:expr, $column:expr) => {
        diesel::update(posts::table.find($id))
            .set($column.eq($column + 1))
            .returning((posts::id, posts::upvotes, posts::downvotes))
    };
}

macro_rules! unlink_all_categories {
    ($post_id:expr) => {
        diesel::delete(post_categories::table.filter(post_categories::post_id.eq($post_id)))
    };
}

macro_rules! link_rows {
    ($rows:expr) => {
        diesel::insert_into(post_categories::table)
            .values($rows)
            .on_conflict_do_nothing()
    };
}

fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

async fn post_exists(conn: &mut AsyncPgConnection, id: i32) -> Result<bool, DieselError> {
    diesel::select(diesel::dsl::exists(posts::table.find(id)))
        .get_result(conn)
        .await
}

async fn ensure_categories_exist(
    conn: &mut AsyncPgConnection,
    ids: &[i32],
) -> Result<(), ServiceError> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: i64 = categories::table
        .filter(categories::id.eq_any(ids.to_vec()))
        .count()
        .get_result(conn)
        .await?;

    if found != ids.len() as i64 {
        return Err(ServiceError::NotFound("Category"));
    }

    Ok(())
}

fn link_error(e: DieselError) -> ServiceError {
    match e {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            ServiceError::NotFound("Category")
        }
        e => e.into(),
    }
}

fn junction_rows(post_id: i32, category_ids: &[i32]) -> Vec<PostCategory> {
    dedup_ids(category_ids)
        .into_iter()
        .map(|category_id| PostCategory {
            post_id,
            category_id,
        })
        .collect()
}

async fn link_categories(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    category_ids: &[i32],
) -> Result<(), ServiceError> {
    if category_ids.is_empty() {
        return Ok(());
    }

    link_rows!(&junction_rows(post_id, category_ids))
        .execute(conn)
        .await
        .map_err(link_error)?;

    Ok(())
}

async fn insert_post(
    conn: &mut AsyncPgConnection,
    new_post: NewPost,
    category_ids: &[i32],
) -> Result<Post, ServiceError> {
    let post: Post = diesel::insert_into(posts::table)
        .values(&new_post)
        .returning(Post::as_returning())
        .get_result(conn)
        .await?;

    link_categories(conn, post.id, category_ids).await?;

    Ok(post)
}

pub async fn create(
    conn: &mut AsyncPgConnection,
    new_post: NewPost,
    category_ids: &[i32],
) -> Result<PostWithCategories, ServiceError> {
    let category_ids = dedup_ids(category_ids);
    ensure_categories_exist(conn, &category_ids).await?;

    let ids = &category_ids;
    let post = conn
        .transaction(|conn| Box::pin(insert_post(conn, new_post, ids)))
        .await?;

    tracing::info!(
        post_id = post.id,
        categories = category_ids.len(),
        "Created blog post"
    );

    Ok(with_categories(conn, post).await?)
}

pub async fn list(
    conn: &mut AsyncPgConnection,
    params: &ListParams,
) -> Result<PostPage, ServiceError> {
    let total = filtered_posts(params)
        .count()
        .get_result::<i64>(conn)
        .await?;

    let page = filtered_posts(params)
        .select(Post::as_select())
        .order((posts::created_at.desc(), posts::id.desc()))
        .limit(params.limit)
        .offset(params.offset)
        .load(conn)
        .await?;

    Ok(PostPage {
        posts: attach_categories(conn, page).await?,
        total,
    })
}

pub async fn get_by_id(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<Option<PostWithCategories>, ServiceError> {
    let post = posts::table
        .find(id)
        .select(Post::as_select())
        .first(conn)
        .await
        .optional()?;

    match post {
        Some(post) => Ok(Some(with_categories(conn, post).await?)),
        None => Ok(None),
    }
}

/// Updates the given fields. When `category_ids` is present the post ends up
/// associated with exactly those categories.
pub async fn update(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: PostChanges,
    category_ids: Option<Vec<i32>>,
) -> Result<Option<PostWithCategories>, ServiceError> {
    if !post_exists(conn, id).await? {
        return Ok(None);
    }

    let category_ids = category_ids.map(|ids| dedup_ids(&ids));
    if let Some(ids) = &category_ids {
        ensure_categories_exist(conn, ids).await?;
    }

    let post = conn
        .transaction(|conn| Box::pin(apply_changes(conn, id, changes, category_ids)))
        .await?;

    match post {
        Some(post) => Ok(Some(with_categories(conn, post).await?)),
        None => Ok(None),
    }
}

// The junction rows are replaced together with the post row or not at all
async fn apply_changes(
    conn: &mut AsyncPgConnection,
    id: i32,
    changes: PostChanges,
    category_ids: Option<Vec<i32>>,
) -> Result<Option<Post>, ServiceError> {
    let post = diesel::update(posts::table.find(id))
        .set(&changes)
        .returning(Post::as_returning())
        .get_result(conn)
        .await
        .optional()?;

    let Some(post) = post else {
        return Ok(None);
    };

    if let Some(ids) = category_ids {
        unlink_all_categories!(id).execute(conn).await?;
        link_categories(conn, id, &ids).await?;
    }

    Ok(Some(post))
}

pub async fn delete(conn: &mut AsyncPgConnection, id: i32) -> Result<bool, ServiceError> {
    let deleted = diesel::delete(posts::table.find(id))
        .execute(conn)
        .await?;

    if deleted > 0 {
        tracing::info!(post_id = id, "Deleted blog post");
    }

    Ok(deleted > 0)
}

pub async fn vote(
    conn: &mut AsyncPgConnection,
    id: i32,
    vote: Vote,
) -> Result<Option<VoteCounts>, ServiceError> {
    let result = match vote {
        Vote::Up => {
            increment_vote!(id, posts::upvotes)
                .get_result::<VoteCounts>(conn)
                .await
        }
        Vote::Down => {
            increment_vote!(id, posts::downvotes)
                .get_result::<VoteCounts>(conn)
                .await
        }
    };

    Ok(result.optional()?)
}

pub async fn upvote(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<Option<VoteCounts>, ServiceError> {
    vote(conn, id, Vote::Up).await
}

pub async fn downvote(
    conn: &mut AsyncPgConnection,
    id: i32,
) -> Result<Option<VoteCounts>, ServiceError> {
    vote(conn, id, Vote::Down).await
}

pub async fn recent(
    conn: &mut AsyncPgConnection,
    limit: i64,
) -> Result<Vec<PostWithCategories>, ServiceError> {
    let page = posts::table
        .select(Post::as_select())
        .order((posts::created_at.desc(), posts::id.desc()))
        .limit(limit)
        .load(conn)
        .await?;

    Ok(attach_categories(conn, page).await?)
}

/// Posts associated with a category, each carrying all of its categories.
pub async fn by_category(
    conn: &mut AsyncPgConnection,
    category_id: i32,
    limit: i64,
    offset: i64,
) -> Result<Vec<PostWithCategories>, ServiceError> {
    let params = ListParams {
        limit,
        offset,
        search: None,
        category_id: Some(category_id),
    };

    let page = filtered_posts(&params)
        .select(Post::as_select())
        .order((posts::created_at.desc(), posts::id.desc()))
        .limit(limit)
        .offset(offset)
        .load(conn)
        .await?;

    Ok(attach_categories(conn, page).await?)
}

pub async fn add_category(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    category_id: i32,
) -> Result<PostWithCategories, ServiceError> {
    if !post_exists(conn, post_id).await? {
        return Err(ServiceError::NotFound("Blog"));
    }

    ensure_categories_exist(conn, &[category_id]).await?;
    link_categories(conn, post_id, &[category_id]).await?;

    get_by_id(conn, post_id)
        .await?
        .ok_or(ServiceError::NotFound("Blog"))
}

pub async fn remove_category(
    conn: &mut AsyncPgConnection,
    post_id: i32,
    category_id: i32,
) -> Result<PostWithCategories, ServiceError> {
    if !post_exists(conn, post_id).await? {
        return Err(ServiceError::NotFound("Blog"));
    }

    diesel::delete(
        post_categories::table
            .filter(post_categories::post_id.eq(post_id))
            .filter(post_categories::category_id.eq(category_id)),
    )
    .execute(conn)
    .await?;

    get_by_id(conn, post_id)
        .await?
        .ok_or(ServiceError::NotFound("Blog"))
}

use axum::{debug_handler, extract::State, http::StatusCode};

use crate::{
    App,
    envelope::{Envelope, Pagination},
    error::AppError,
    extract::{Json, Path, Query},
    models::post::{PostWithCategories, VoteCounts},
};

use super::{
    CategoryAssignment, ListQuery, PageQuery, PostPatch, PostSubmission, RecentQuery,
    service::{self, Vote},
};

#[debug_handler]
pub async fn create_post(
    State(ctx): State<App>,
    Json(submission): Json<PostSubmission>,
) -> Result<(StatusCode, Envelope<PostWithCategories>), AppError> {
    let (new_post, category_ids) = submission
        .validate()
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;
    let post = service::create(&mut conn, new_post, &category_ids).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::ok("Blog created successfully", post),
    ))
}

pub async fn list_posts(
    State(ctx): State<App>,
    Query(query): Query<ListQuery>,
) -> Result<Envelope<Vec<PostWithCategories>>, AppError> {
    let (params, page) = query.into_params();

    let mut conn = ctx.diesel.get().await?;
    let result = service::list(&mut conn, &params).await?;

    Ok(Envelope::ok("Blogs retrieved successfully", result.posts)
        .with_pagination(Pagination::new(page, params.limit, result.total)))
}

pub async fn recent_posts(
    State(ctx): State<App>,
    Query(query): Query<RecentQuery>,
) -> Result<Envelope<Vec<PostWithCategories>>, AppError> {
    let mut conn = ctx.diesel.get().await?;
    let posts = service::recent(&mut conn, query.limit()).await?;

    Ok(Envelope::ok("Recent blogs retrieved successfully", posts))
}

pub async fn get_post(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<PostWithCategories>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    match service::get_by_id(&mut conn, id).await? {
        Some(post) => Ok(Envelope::ok("Blog retrieved successfully", post)),
        None => Err(("Blog not found", StatusCode::NOT_FOUND))?,
    }
}

pub async fn update_post(
    State(ctx): State<App>,
    Path(id): Path<i32>,
    Json(patch): Json<PostPatch>,
) -> Result<Envelope<PostWithCategories>, AppError> {
    let (changes, category_ids) = patch
        .validate()
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;

    match service::update(&mut conn, id, changes, category_ids).await? {
        Some(post) => Ok(Envelope::ok("Blog updated successfully", post)),
        None => Err(("Blog not found", StatusCode::NOT_FOUND))?,
    }
}

pub async fn delete_post(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<()>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    if !service::delete(&mut conn, id).await? {
        return Err(("Blog not found", StatusCode::NOT_FOUND))?;
    }

    Ok(Envelope::message("Blog deleted successfully"))
}

async fn vote(ctx: App, id: i32, vote: Vote) -> Result<Envelope<VoteCounts>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    let counts = match vote {
        Vote::Up => service::upvote(&mut conn, id).await?,
        Vote::Down => service::downvote(&mut conn, id).await?,
    };

    let message = match vote {
        Vote::Up => "Blog upvoted successfully",
        Vote::Down => "Blog downvoted successfully",
    };

    match counts {
        Some(counts) => Ok(Envelope::ok(message, counts)),
        None => Err(("Blog not found", StatusCode::NOT_FOUND))?,
    }
}

pub async fn upvote_post(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<VoteCounts>, AppError> {
    vote(ctx, id, Vote::Up).await
}

pub async fn downvote_post(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<VoteCounts>, AppError> {
    vote(ctx, id, Vote::Down).await
}

pub async fn add_category(
    State(ctx): State<App>,
    Path(id): Path<i32>,
    Json(assignment): Json<CategoryAssignment>,
) -> Result<Envelope<PostWithCategories>, AppError> {
    let Some(category_id) = assignment.category_id else {
        return Err(("Valid category ID is required", StatusCode::BAD_REQUEST))?;
    };

    let mut conn = ctx.diesel.get().await?;
    let post = service::add_category(&mut conn, id, category_id).await?;

    Ok(Envelope::ok("Category added to blog successfully", post))
}

pub async fn remove_category(
    State(ctx): State<App>,
    Path((id, category_id)): Path<(i32, i32)>,
) -> Result<Envelope<PostWithCategories>, AppError> {
    let mut conn = ctx.diesel.get().await?;
    let post = service::remove_category(&mut conn, id, category_id).await?;

    Ok(Envelope::ok("Category removed from blog successfully", post))
}

pub async fn posts_by_category(
    State(ctx): State<App>,
    Path(category_id): Path<i32>,
    Query(query): Query<PageQuery>,
) -> Result<Envelope<Vec<PostWithCategories>>, AppError> {
    let (limit, offset) = query.limit_offset();

    let mut conn = ctx.diesel.get().await?;
    let posts = service::by_category(&mut conn, category_id, limit, offset).await?;

    Ok(Envelope::ok("Blogs retrieved successfully", posts))
}

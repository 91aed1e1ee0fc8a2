use axum::{extract::State, http::StatusCode};

use crate::{
    App,
    envelope::Envelope,
    error::AppError,
    extract::{Json, Path},
    models::category::{Category, CategoryWithCount, CategoryWithPosts},
};

use super::{CategoryPatch, CategorySubmission, service};

pub async fn create_category(
    State(ctx): State<App>,
    Json(submission): Json<CategorySubmission>,
) -> Result<(StatusCode, Envelope<Category>), AppError> {
    let new_category = submission
        .validate()
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;
    let category = service::create(&mut conn, new_category).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::ok("Category created successfully", category),
    ))
}

pub async fn list_categories(
    State(ctx): State<App>,
) -> Result<Envelope<Vec<CategoryWithCount>>, AppError> {
    let mut conn = ctx.diesel.get().await?;
    let categories = service::list(&mut conn).await?;

    Ok(Envelope::ok("Categories retrieved successfully", categories))
}

pub async fn get_category(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<CategoryWithPosts>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    match service::get_by_id(&mut conn, id).await? {
        Some(category) => Ok(Envelope::ok("Category retrieved successfully", category)),
        None => Err(("Category not found", StatusCode::NOT_FOUND))?,
    }
}

pub async fn update_category(
    State(ctx): State<App>,
    Path(id): Path<i32>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Envelope<Category>, AppError> {
    let changes = patch.validate().map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;

    match service::update(&mut conn, id, changes).await? {
        Some(category) => Ok(Envelope::ok("Category updated successfully", category)),
        None => Err(("Category not found", StatusCode::NOT_FOUND))?,
    }
}

pub async fn delete_category(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<()>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    if !service::delete(&mut conn, id).await? {
        return Err(("Category not found", StatusCode::NOT_FOUND))?;
    }

    Ok(Envelope::message("Category deleted successfully"))
}

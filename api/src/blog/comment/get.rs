use axum::extract::State;

use crate::{App, envelope::Envelope, error::AppError, extract::Path, models::comment::Comment};

use super::service;

pub async fn get_comments(
    State(ctx): State<App>,
    Path(blog_id): Path<i32>,
) -> Result<Envelope<Vec<Comment>>, AppError> {
    let mut conn = ctx.diesel.get().await?;
    let comments = service::list_by_post(&mut conn, blog_id).await?;

    Ok(Envelope::ok("Comments retrieved successfully", comments))
}

use axum::{debug_handler, extract::State, http::StatusCode};

use crate::{App, envelope::Envelope, error::AppError, extract::Json, models::comment::Comment};

use super::{CommentSubmission, service};

#[debug_handler]
pub async fn create_comment(
    State(ctx): State<App>,
    Json(comment): Json<CommentSubmission>,
) -> Result<(StatusCode, Envelope<Comment>), AppError> {
    let new_comment = comment
        .validate()
        .map_err(|e| (e, StatusCode::BAD_REQUEST))?;

    let mut conn = ctx.diesel.get().await?;
    let comment = service::create(&mut conn, new_comment).await?;

    Ok((
        StatusCode::CREATED,
        Envelope::ok("Comment created successfully", comment),
    ))
}

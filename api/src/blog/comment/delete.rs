use axum::{debug_handler, extract::State, http::StatusCode};

use crate::{App, envelope::Envelope, error::AppError, extract::Path};

use super::service;

#[debug_handler]
pub async fn delete_comment(
    State(ctx): State<App>,
    Path(id): Path<i32>,
) -> Result<Envelope<()>, AppError> {
    let mut conn = ctx.diesel.get().await?;

    if !service::delete(&mut conn, id).await? {
        return Err(("Comment not found", StatusCode::NOT_FOUND))?;
    }

    Ok(Envelope::message("Comment deleted successfully"))
}

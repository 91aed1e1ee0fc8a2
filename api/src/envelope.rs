use axum::{
    Json,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Uniform wrapper around every JSON response of the API.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Envelope {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
            error: None,
        }
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl Envelope<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Envelope {
            success: true,
            message: message.into(),
            data: None,
            pagination: None,
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total_blogs: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(current_page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };

        Pagination {
            current_page,
            total_pages,
            total_blogs: total,
            limit,
        }
    }

    /// Whether another page can be requested after this one.
    pub fn has_more(&self) -> bool {
        self.current_page < self.total_pages
    }

    /// Offset of the page after this one, for infinite scrolling.
    pub fn next_offset(&self) -> Option<i64> {
        self.has_more()
            .then(|| self.current_page.saturating_mul(self.limit))
    }
}

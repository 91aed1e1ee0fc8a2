//! Typed HTTP client for the blog API, with a short-lived cache for the
//! reads that pages hit the most.

pub mod cache;

use futures_util::future::join_all;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use url::Url;

use crate::{
    blog::post::MAX_TITLE_LEN,
    envelope::Envelope,
    models::{
        category::{Category, CategoryWithCount, CategoryWithPosts},
        comment::Comment,
        post::{PostWithCategories, VoteCounts},
    },
};

use self::cache::ResponseCache;

const DEFAULT_API_BASE: &str = "http://localhost:3000";

#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    #[error("{}", .0.join(", "))]
    Invalid(Vec<&'static str>),

    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Serialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub author: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Vec<i32>>,
}

/// Partial update. A `Some(None)` field is sent as `null` and clears it.
#[derive(Serialize, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_ids: Option<Option<Vec<i32>>>,
}

#[derive(Serialize, Debug, Default, Clone)]
pub struct CategoryDraft {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Serialize, Debug, Default, Clone)]
pub struct CategoryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Option<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Option<String>>,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentBody<'a> {
    blog_id: i32,
    author: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CategoryAssignmentBody {
    category_id: i32,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BulkDeleteReport {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<(i32, String)>,
}

/// Checks a post before it is sent. Returns every problem found.
pub fn validate_post(title: &str, content: &str) -> Result<(), Vec<&'static str>> {
    let mut errors = Vec::new();

    if title.trim().is_empty() {
        errors.push("Title is required");
    } else if title.trim().chars().count() > MAX_TITLE_LEN {
        errors.push("Title must be less than 200 characters");
    }

    if content.trim().is_empty() {
        errors.push("Content is required");
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[derive(Clone)]
pub struct BlogClient {
    http: reqwest::Client,
    base: Url,
    recent_cache: ResponseCache<Envelope<Vec<PostWithCategories>>>,
    post_cache: ResponseCache<Envelope<PostWithCategories>>,
}

impl BlogClient {
    pub fn new(base: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base)?;
        // `Url::join` replaces the last segment unless the path ends with a slash
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(BlogClient {
            http: reqwest::Client::new(),
            base,
            recent_cache: ResponseCache::default(),
            post_cache: ResponseCache::default(),
        })
    }

    /// Reads the base URL from `API_BASE`, defaulting to the local server.
    pub fn from_env() -> Result<Self, ClientError> {
        let base = std::env::var("API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(&base)
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base.join(path)?)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
                .map(|envelope| envelope.message)
                .unwrap_or_else(|_| format!("HTTP error! status: {}", status.as_u16()));
            tracing::debug!(%status, %message, "API request failed");
            return Err(ClientError::Api { status, message });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            return Err(ClientError::Api {
                status,
                message: envelope.message,
            });
        }

        Ok(envelope)
    }

    pub async fn health(&self) -> Result<Envelope<serde_json::Value>, ClientError> {
        self.send(self.http.get(self.url("health")?)).await
    }

    pub async fn create_post(
        &self,
        draft: &PostDraft,
    ) -> Result<Envelope<PostWithCategories>, ClientError> {
        validate_post(&draft.title, &draft.content).map_err(ClientError::Invalid)?;
        self.send(self.http.post(self.url("api/blogs")?).json(draft))
            .await
    }

    pub async fn list_posts(
        &self,
        query: &PostQuery,
    ) -> Result<Envelope<Vec<PostWithCategories>>, ClientError> {
        self.send(self.http.get(self.url("api/blogs")?).query(query))
            .await
    }

    pub async fn search_posts(
        &self,
        term: &str,
        page: i64,
        limit: i64,
    ) -> Result<Envelope<Vec<PostWithCategories>>, ClientError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(ClientError::Invalid(vec!["Search term is required"]));
        }

        self.list_posts(&PostQuery {
            search: Some(term.to_string()),
            page: Some(page),
            limit: Some(limit),
            ..Default::default()
        })
        .await
    }

    pub async fn recent_posts(
        &self,
        limit: i64,
    ) -> Result<Envelope<Vec<PostWithCategories>>, ClientError> {
        self.send(
            self.http
                .get(self.url("api/blogs/recent")?)
                .query(&[("limit", limit)]),
        )
        .await
    }

    pub async fn get_post(&self, id: i32) -> Result<Envelope<PostWithCategories>, ClientError> {
        self.send(self.http.get(self.url(&format!("api/blogs/{id}"))?))
            .await
    }

    pub async fn update_post(
        &self,
        id: i32,
        update: &PostUpdate,
    ) -> Result<Envelope<PostWithCategories>, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("api/blogs/{id}"))?)
                .json(update),
        )
        .await
    }

    pub async fn delete_post(&self, id: i32) -> Result<Envelope<()>, ClientError> {
        self.send(self.http.delete(self.url(&format!("api/blogs/{id}"))?))
            .await
    }

    /// Deletes every post concurrently. Individual failures are reported,
    /// not returned as an error.
    pub async fn bulk_delete_posts(&self, ids: &[i32]) -> Result<BulkDeleteReport, ClientError> {
        if ids.is_empty() {
            return Err(ClientError::Invalid(vec!["Blog IDs are required"]));
        }

        let results = join_all(ids.iter().map(|&id| async move {
            (id, self.delete_post(id).await)
        }))
        .await;

        let mut report = BulkDeleteReport::default();
        for (id, result) in results {
            match result {
                Ok(_) => report.successful += 1,
                Err(e) => {
                    report.failed += 1;
                    report.errors.push((id, e.to_string()));
                }
            }
        }

        Ok(report)
    }

    pub async fn upvote_post(&self, id: i32) -> Result<Envelope<VoteCounts>, ClientError> {
        self.send(self.http.post(self.url(&format!("api/blogs/{id}/upvote"))?))
            .await
    }

    pub async fn downvote_post(&self, id: i32) -> Result<Envelope<VoteCounts>, ClientError> {
        self.send(
            self.http
                .post(self.url(&format!("api/blogs/{id}/downvote"))?),
        )
        .await
    }

    pub async fn add_category_to_post(
        &self,
        id: i32,
        category_id: i32,
    ) -> Result<Envelope<PostWithCategories>, ClientError> {
        self.send(
            self.http
                .post(self.url(&format!("api/blogs/{id}/categories"))?)
                .json(&CategoryAssignmentBody { category_id }),
        )
        .await
    }

    pub async fn remove_category_from_post(
        &self,
        id: i32,
        category_id: i32,
    ) -> Result<Envelope<PostWithCategories>, ClientError> {
        self.send(
            self.http
                .delete(self.url(&format!("api/blogs/{id}/categories/{category_id}"))?),
        )
        .await
    }

    pub async fn posts_by_category(
        &self,
        category_id: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Envelope<Vec<PostWithCategories>>, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("api/blogs/category/{category_id}"))?)
                .query(&[("limit", limit), ("offset", offset)]),
        )
        .await
    }

    pub async fn create_category(
        &self,
        draft: &CategoryDraft,
    ) -> Result<Envelope<Category>, ClientError> {
        if draft.name.trim().is_empty() {
            return Err(ClientError::Invalid(vec!["Category name is required"]));
        }

        self.send(self.http.post(self.url("api/categories")?).json(draft))
            .await
    }

    pub async fn list_categories(&self) -> Result<Envelope<Vec<CategoryWithCount>>, ClientError> {
        self.send(self.http.get(self.url("api/categories")?)).await
    }

    pub async fn get_category(&self, id: i32) -> Result<Envelope<CategoryWithPosts>, ClientError> {
        self.send(self.http.get(self.url(&format!("api/categories/{id}"))?))
            .await
    }

    pub async fn update_category(
        &self,
        id: i32,
        update: &CategoryUpdate,
    ) -> Result<Envelope<Category>, ClientError> {
        self.send(
            self.http
                .put(self.url(&format!("api/categories/{id}"))?)
                .json(update),
        )
        .await
    }

    pub async fn delete_category(&self, id: i32) -> Result<Envelope<()>, ClientError> {
        self.send(
            self.http
                .delete(self.url(&format!("api/categories/{id}"))?),
        )
        .await
    }

    pub async fn add_comment(
        &self,
        blog_id: i32,
        author: &str,
        content: &str,
    ) -> Result<Envelope<Comment>, ClientError> {
        if content.trim().is_empty() {
            return Err(ClientError::Invalid(vec!["Comment content is required"]));
        }

        self.send(
            self.http
                .post(self.url("api/comments")?)
                .json(&CommentBody {
                    blog_id,
                    author,
                    content,
                }),
        )
        .await
    }

    pub async fn get_comments(&self, blog_id: i32) -> Result<Envelope<Vec<Comment>>, ClientError> {
        self.send(
            self.http
                .get(self.url(&format!("api/comments/{blog_id}"))?),
        )
        .await
    }

    pub async fn delete_comment(&self, id: i32) -> Result<Envelope<()>, ClientError> {
        self.send(
            self.http
                .delete(self.url(&format!("api/comments/{id}"))?),
        )
        .await
    }

    pub async fn cached_recent_posts(
        &self,
        limit: i64,
    ) -> Result<Envelope<Vec<PostWithCategories>>, ClientError> {
        self.recent_cache
            .get_or_fetch(format!("recent-blogs-{limit}"), || self.recent_posts(limit))
            .await
    }

    pub async fn cached_post(&self, id: i32) -> Result<Envelope<PostWithCategories>, ClientError> {
        self.post_cache
            .get_or_fetch(format!("blog-{id}"), || self.get_post(id))
            .await
    }

    pub async fn clear_cache(&self) {
        self.recent_cache.clear().await;
        self.post_cache.clear().await;
    }
}

pub mod handlers;
pub mod service;

use chrono::Utc;
use serde::Deserialize;

use crate::{
    models::post::{NewPost, PostChanges},
    utils::{deserialize_some, non_blank},
};

use self::service::ListParams;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_AUTHOR_LEN: usize = 100;
pub const MAX_IMAGE_URL_LEN: usize = 500;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;
const DEFAULT_RECENT_LIMIT: i64 = 5;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostSubmission {
    title: Option<String>,
    content: Option<String>,
    author: Option<String>,
    image_url: Option<String>,
    category_ids: Option<Vec<i32>>,
}

impl PostSubmission {
    pub fn validate(self) -> Result<(NewPost, Vec<i32>), &'static str> {
        let (Some(title), Some(content), Some(author)) = (
            non_blank(self.title),
            non_blank(self.content),
            non_blank(self.author),
        ) else {
            return Err("Title, content, and author are required.");
        };

        if title.chars().count() > MAX_TITLE_LEN {
            return Err("Title must be 200 characters or less");
        }

        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err("Author name too long (max 100 characters)");
        }

        let image_url = match non_blank(self.image_url) {
            Some(url) => Some(validate_image_url(url)?),
            None => None,
        };

        Ok((
            NewPost {
                title,
                content,
                author,
                image_url,
            },
            self.category_ids.unwrap_or_default(),
        ))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    title: Option<String>,
    content: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    image_url: Option<Option<String>>,

    // `null` clears every category, absent leaves them untouched
    #[serde(default, deserialize_with = "deserialize_some")]
    category_ids: Option<Option<Vec<i32>>>,
}

impl PostPatch {
    pub fn validate(self) -> Result<(PostChanges, Option<Vec<i32>>), &'static str> {
        let title = non_blank(self.title);
        if title
            .as_ref()
            .is_some_and(|t| t.chars().count() > MAX_TITLE_LEN)
        {
            return Err("Title must be 200 characters or less");
        }

        let image_url = match self.image_url {
            Some(url) => match non_blank(url) {
                Some(url) => Some(Some(validate_image_url(url)?)),
                None => Some(None),
            },
            None => None,
        };

        Ok((
            PostChanges {
                title,
                content: non_blank(self.content),
                image_url,
                updated_at: Utc::now().naive_utc(),
            },
            self.category_ids.map(Option::unwrap_or_default),
        ))
    }
}

fn validate_image_url(url: String) -> Result<String, &'static str> {
    if url.len() > MAX_IMAGE_URL_LEN {
        return Err("imageUrl must be 500 characters or less");
    }

    match url::Url::parse(&url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(url),
        _ => Err("imageUrl must be a valid URL string"),
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAssignment {
    pub category_id: Option<i32>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    limit: Option<i64>,
    offset: Option<i64>,
    page: Option<i64>,
    search: Option<String>,
    category_id: Option<i32>,
}

impl ListQuery {
    /// Resolves defaults. The offset is derived from `page` unless given.
    pub fn into_params(self) -> (ListParams, i64) {
        let limit = page_size(self.limit, DEFAULT_PAGE_SIZE);
        let page = self.page.unwrap_or(1).max(1);
        let offset = self
            .offset
            .unwrap_or_else(|| page.saturating_sub(1).saturating_mul(limit))
            .max(0);

        (
            ListParams {
                limit,
                offset,
                search: non_blank(self.search),
                category_id: self.category_id,
            },
            page,
        )
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct RecentQuery {
    limit: Option<i64>,
}

impl RecentQuery {
    pub fn limit(&self) -> i64 {
        page_size(self.limit, DEFAULT_RECENT_LIMIT)
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    limit: Option<i64>,
    offset: Option<i64>,
}

impl PageQuery {
    pub fn limit_offset(&self) -> (i64, i64) {
        (
            page_size(self.limit, DEFAULT_PAGE_SIZE),
            self.offset.unwrap_or(0).max(0),
        )
    }
}

fn page_size(limit: Option<i64>, default: i64) -> i64 {
    limit.unwrap_or(default).clamp(1, MAX_PAGE_SIZE)
}

#[cfg(test)]
mod test {
    use super::*;

    fn submission(json: serde_json::Value) -> PostSubmission {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_submission_requires_title_content_and_author() {
        let result = submission(serde_json::json!({ "title": "Hello", "content": "<p>hi</p>" }))
            .validate();
        assert_eq!(result.err(), Some("Title, content, and author are required."));

        let result = submission(serde_json::json!({
            "title": "  ", "content": "x", "author": "me"
        }))
        .validate();
        assert!(result.is_err());
    }

    #[test]
    fn test_submission_without_category_ids_has_none() {
        let (post, category_ids) = submission(serde_json::json!({
            "title": " Hello ", "content": "<p>hi</p>", "author": "Ann"
        }))
        .validate()
        .unwrap();

        assert_eq!(post.title, "Hello");
        assert_eq!(post.author, "Ann");
        assert_eq!(post.image_url, None);
        assert!(category_ids.is_empty());
    }

    #[test]
    fn test_submission_keeps_category_ids() {
        let (_, category_ids) = submission(serde_json::json!({
            "title": "t", "content": "c", "author": "a", "categoryIds": [2, 5]
        }))
        .validate()
        .unwrap();

        assert_eq!(category_ids, vec![2, 5]);
    }

    #[test]
    fn test_submission_rejects_long_title() {
        let result = submission(serde_json::json!({
            "title": "x".repeat(201), "content": "c", "author": "a"
        }))
        .validate();
        assert_eq!(result.err(), Some("Title must be 200 characters or less"));
    }

    #[test]
    fn test_submission_validates_image_url() {
        let result = submission(serde_json::json!({
            "title": "t", "content": "c", "author": "a", "imageUrl": "not a url"
        }))
        .validate();
        assert_eq!(result.err(), Some("imageUrl must be a valid URL string"));

        let (post, _) = submission(serde_json::json!({
            "title": "t", "content": "c", "author": "a",
            "imageUrl": "https://example.com/cover.png"
        }))
        .validate()
        .unwrap();
        assert_eq!(post.image_url.as_deref(), Some("https://example.com/cover.png"));
    }

    #[test]
    fn test_category_ids_must_be_an_array() {
        let result = serde_json::from_value::<PostSubmission>(serde_json::json!({
            "title": "t", "content": "c", "author": "a", "categoryIds": 3
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_and_missing() {
        let patch: PostPatch = serde_json::from_value(serde_json::json!({
            "title": "New", "imageUrl": null, "categoryIds": null
        }))
        .unwrap();
        let (changes, category_ids) = patch.validate().unwrap();

        assert_eq!(changes.title.as_deref(), Some("New"));
        assert_eq!(changes.content, None);
        assert_eq!(changes.image_url, Some(None));
        assert_eq!(category_ids, Some(vec![]));

        let patch: PostPatch = serde_json::from_value(serde_json::json!({})).unwrap();
        let (changes, category_ids) = patch.validate().unwrap();
        assert_eq!(changes.image_url, None);
        assert_eq!(category_ids, None);
    }

    #[test]
    fn test_list_query_defaults() {
        let (params, page) = ListQuery::default().into_params();
        assert_eq!(page, 1);
        assert_eq!(params.limit, 20);
        assert_eq!(params.offset, 0);
        assert_eq!(params.search, None);
    }

    #[test]
    fn test_list_query_derives_offset_from_page() {
        let query = ListQuery {
            limit: Some(10),
            page: Some(3),
            ..Default::default()
        };
        let (params, page) = query.into_params();
        assert_eq!(page, 3);
        assert_eq!(params.offset, 20);
    }

    #[test]
    fn test_list_query_prefers_explicit_offset_and_clamps_limit() {
        let query = ListQuery {
            limit: Some(1000),
            offset: Some(7),
            page: Some(4),
            search: Some("  rust ".into()),
            category_id: Some(2),
        };
        let (params, _) = query.into_params();
        assert_eq!(params.limit, 100);
        assert_eq!(params.offset, 7);
        assert_eq!(params.search.as_deref(), Some("rust"));
        assert_eq!(params.category_id, Some(2));
    }

    #[test]
    fn test_list_query_huge_page_saturates() {
        let query = ListQuery {
            page: Some(i64::MAX),
            ..Default::default()
        };
        let (params, page) = query.into_params();
        assert_eq!(page, i64::MAX);
        assert_eq!(params.offset, i64::MAX);
    }

    #[test]
    fn test_recent_query_default_limit() {
        assert_eq!(RecentQuery::default().limit(), 5);
        assert_eq!(RecentQuery { limit: Some(0) }.limit(), 1);
    }
}

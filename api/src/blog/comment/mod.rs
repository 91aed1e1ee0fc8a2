pub mod create;
pub mod delete;
pub mod get;
pub mod service;

use serde::{Deserialize, Serialize};

use crate::models::comment::NewComment;

const MAX_AUTHOR_LEN: usize = 100;
const MAX_CONTENT_LEN: usize = 5000;

#[derive(Deserialize, Serialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommentSubmission {
    pub blog_id: Option<i32>,
    pub author: Option<String>,
    pub content: Option<String>,
}

impl CommentSubmission {
    pub fn validate(self) -> Result<NewComment, &'static str> {
        let Some(post_id) = self.blog_id else {
            return Err("Blog ID is required");
        };

        let author = self.author.unwrap_or_default().trim().to_string();
        if author.is_empty() {
            return Err("No author name provided");
        }

        if author.chars().count() > MAX_AUTHOR_LEN {
            return Err("Author name too long");
        }

        let content = self.content.unwrap_or_default().trim().to_string();
        if content.is_empty() {
            return Err("No content provided");
        }

        if content.chars().count() > MAX_CONTENT_LEN {
            return Err("Content too long (max 5000 characters)");
        }

        Ok(NewComment {
            post_id,
            author,
            content,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn submission(blog_id: Option<i32>, author: &str, content: &str) -> CommentSubmission {
        CommentSubmission {
            blog_id,
            author: Some(author.into()),
            content: Some(content.into()),
        }
    }

    #[test]
    fn test_valid_submission_is_trimmed() {
        let comment = submission(Some(4), "  Ann ", " Nice post!  ")
            .validate()
            .unwrap();

        assert_eq!(comment.post_id, 4);
        assert_eq!(comment.author, "Ann");
        assert_eq!(comment.content, "Nice post!");
    }

    #[test]
    fn test_submission_requires_blog_id() {
        assert_eq!(
            submission(None, "Ann", "hi").validate().err(),
            Some("Blog ID is required")
        );
    }

    #[test]
    fn test_submission_requires_author_and_content() {
        assert_eq!(
            submission(Some(1), "   ", "hi").validate().err(),
            Some("No author name provided")
        );
        assert_eq!(
            submission(Some(1), "Ann", "  ").validate().err(),
            Some("No content provided")
        );
    }

    #[test]
    fn test_submission_rejects_long_content() {
        let content = "a".repeat(5001);
        assert_eq!(
            submission(Some(1), "Ann", &content).validate().err(),
            Some("Content too long (max 5000 characters)")
        );
    }

    #[test]
    fn test_submission_reads_blog_id_in_camel_case() {
        let submission: CommentSubmission = serde_json::from_value(serde_json::json!({
            "blogId": 9, "author": "Ann", "content": "hi"
        }))
        .unwrap();
        assert_eq!(submission.blog_id, Some(9));
    }
}

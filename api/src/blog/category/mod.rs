pub mod handlers;
pub mod service;

use chrono::Utc;
use serde::Deserialize;

use crate::{
    models::category::{CategoryChanges, DEFAULT_COLOR, NewCategory},
    utils::{deserialize_some, non_blank, slugify},
};

const MAX_NAME_LEN: usize = 100;
const MAX_COLOR_LEN: usize = 7;
const MAX_ICON_LEN: usize = 50;

#[derive(Deserialize, Debug, Default)]
pub struct CategorySubmission {
    name: Option<String>,
    description: Option<String>,
    color: Option<String>,
    icon: Option<String>,
}

impl CategorySubmission {
    pub fn validate(self) -> Result<NewCategory, &'static str> {
        let Some(name) = non_blank(self.name) else {
            return Err("Category name is required");
        };
        let slug = validate_name(&name)?;

        let color = non_blank(self.color).unwrap_or_else(|| DEFAULT_COLOR.to_string());
        validate_color(&color)?;

        let icon = non_blank(self.icon);
        if let Some(icon) = &icon {
            validate_icon(icon)?;
        }

        Ok(NewCategory {
            name,
            slug,
            description: non_blank(self.description),
            color: Some(color),
            icon,
        })
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct CategoryPatch {
    name: Option<String>,

    #[serde(default, deserialize_with = "deserialize_some")]
    description: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    color: Option<Option<String>>,

    #[serde(default, deserialize_with = "deserialize_some")]
    icon: Option<Option<String>>,
}

impl CategoryPatch {
    pub fn validate(self) -> Result<CategoryChanges, &'static str> {
        let name = non_blank(self.name);
        let slug = match &name {
            Some(name) => Some(validate_name(name)?),
            None => None,
        };

        let color = self.color.map(non_blank);
        if let Some(Some(color)) = &color {
            validate_color(color)?;
        }

        let icon = self.icon.map(non_blank);
        if let Some(Some(icon)) = &icon {
            validate_icon(icon)?;
        }

        Ok(CategoryChanges {
            name,
            slug,
            description: self.description.map(non_blank),
            color,
            icon,
            updated_at: Utc::now().naive_utc(),
        })
    }
}

// returns the slug derived from the name
fn validate_name(name: &str) -> Result<String, &'static str> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err("Category name must be 100 characters or less");
    }

    let slug = slugify(name);
    if slug.is_empty() {
        return Err("Category name must contain at least one letter or digit");
    }

    Ok(slug)
}

fn validate_color(color: &str) -> Result<(), &'static str> {
    if color.chars().count() > MAX_COLOR_LEN {
        return Err("Color must be a hex code like #3B82F6");
    }
    Ok(())
}

fn validate_icon(icon: &str) -> Result<(), &'static str> {
    if icon.chars().count() > MAX_ICON_LEN {
        return Err("Icon must be 50 characters or less");
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_submission_derives_slug_and_default_color() {
        let submission: CategorySubmission =
            serde_json::from_value(serde_json::json!({ "name": "Tech & Tips" })).unwrap();
        let category = submission.validate().unwrap();

        assert_eq!(category.name, "Tech & Tips");
        assert_eq!(category.slug, "tech-tips");
        assert_eq!(category.color.as_deref(), Some(DEFAULT_COLOR));
        assert_eq!(category.description, None);
    }

    #[test]
    fn test_submission_requires_name() {
        assert_eq!(
            CategorySubmission::default().validate().err(),
            Some("Category name is required")
        );
    }

    #[test]
    fn test_submission_rejects_name_without_slug() {
        let submission: CategorySubmission =
            serde_json::from_value(serde_json::json!({ "name": "!!!" })).unwrap();
        assert!(submission.validate().is_err());
    }

    #[test]
    fn test_submission_rejects_long_color() {
        let submission: CategorySubmission =
            serde_json::from_value(serde_json::json!({ "name": "Rust", "color": "#12345678" }))
                .unwrap();
        assert!(submission.validate().is_err());
    }

    #[test]
    fn test_patch_regenerates_slug_when_name_changes() {
        let patch: CategoryPatch =
            serde_json::from_value(serde_json::json!({ "name": "Web Dev" })).unwrap();
        let changes = patch.validate().unwrap();

        assert_eq!(changes.name.as_deref(), Some("Web Dev"));
        assert_eq!(changes.slug.as_deref(), Some("web-dev"));
        assert_eq!(changes.color, None);
    }

    #[test]
    fn test_patch_without_name_keeps_slug() {
        let patch: CategoryPatch =
            serde_json::from_value(serde_json::json!({ "description": null, "icon": "book" }))
                .unwrap();
        let changes = patch.validate().unwrap();

        assert_eq!(changes.slug, None);
        assert_eq!(changes.description, Some(None));
        assert_eq!(changes.icon, Some(Some("book".into())));
    }
}

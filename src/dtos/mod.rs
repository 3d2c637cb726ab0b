//! Request/response DTOs with validation and sanitization rules.

use crate::models::{NewResource, ResourcePatch, ResourceType};
use serde::Deserialize;
use std::collections::HashSet;
use validator::{Validate, ValidationError};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateResourceRequest {
    #[validate(length(min = 3, max = 255, message = "title must be 3-255 characters"))]
    pub title: String,

    #[validate(length(min = 10, max = 5000, message = "description must be 10-5000 characters"))]
    pub description: String,

    pub resource_type: ResourceType,

    #[validate(
        length(min = 5, max = 2048, message = "url must be 5-2048 characters"),
        custom(function = validate_url_scheme)
    )]
    pub url: String,

    #[serde(default)]
    #[validate(length(max = 10, message = "at most 10 tags allowed"))]
    pub tags: Vec<String>,
}

impl CreateResourceRequest {
    /// Trim text fields and normalize tags. Runs before validation so the
    /// length constraints apply to the cleaned values.
    pub fn sanitized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.url = self.url.trim().to_string();
        self.tags = sanitize_tags(&self.tags);
        self
    }

    pub fn into_input(self) -> NewResource {
        NewResource {
            title: self.title,
            description: self.description,
            resource_type: self.resource_type,
            url: self.url,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateResourceRequest {
    #[validate(length(min = 3, max = 255, message = "title must be 3-255 characters"))]
    pub title: Option<String>,

    #[validate(length(min = 10, max = 5000, message = "description must be 10-5000 characters"))]
    pub description: Option<String>,

    pub resource_type: Option<ResourceType>,

    #[validate(
        length(min = 5, max = 2048, message = "url must be 5-2048 characters"),
        custom(function = validate_url_scheme)
    )]
    pub url: Option<String>,

    #[validate(length(max = 10, message = "at most 10 tags allowed"))]
    pub tags: Option<Vec<String>>,
}

impl UpdateResourceRequest {
    pub fn sanitized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.description = self.description.map(|d| d.trim().to_string());
        self.url = self.url.map(|u| u.trim().to_string());
        self.tags = self.tags.map(|t| sanitize_tags(&t));
        self
    }

    pub fn into_patch(self) -> ResourcePatch {
        ResourcePatch {
            title: self.title,
            description: self.description,
            resource_type: self.resource_type,
            url: self.url,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListResourcesParams {
    #[validate(range(min = 1, message = "page must be >= 1"))]
    pub page: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "page_size must be 1-100"))]
    pub page_size: Option<i64>,

    #[validate(length(max = 255, message = "search term too long"))]
    pub search: Option<String>,

    pub resource_type: Option<ResourceType>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AiGenerateRequest {
    #[validate(length(min = 3, max = 255, message = "title must be 3-255 characters"))]
    pub title: String,

    pub resource_type: ResourceType,
}

impl AiGenerateRequest {
    pub fn sanitized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self
    }
}

/// Lowercase, trim, drop empties and case-insensitive duplicates.
/// First occurrence wins, order preserved.
pub fn sanitize_tags(tags: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut sanitized = Vec::new();
    for tag in tags {
        let normalized = tag.trim().to_lowercase();
        if !normalized.is_empty() && seen.insert(normalized.clone()) {
            sanitized.push(normalized);
        }
    }
    sanitized
}

fn validate_url_scheme(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        let mut err = ValidationError::new("url_scheme");
        err.message = Some("url must start with http:// or https://".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_tags_lowercases_trims_and_dedups() {
        let tags = vec![
            "  Python ".to_string(),
            "python".to_string(),
            "PYTHON".to_string(),
            "Web".to_string(),
        ];
        assert_eq!(sanitize_tags(&tags), vec!["python", "web"]);
    }

    #[test]
    fn sanitize_tags_drops_empty_and_whitespace_only() {
        let tags = vec!["".to_string(), "   ".to_string(), "rust".to_string()];
        assert_eq!(sanitize_tags(&tags), vec!["rust"]);
    }

    #[test]
    fn sanitize_tags_preserves_first_occurrence_order() {
        let tags = vec![
            "beta".to_string(),
            "Alpha".to_string(),
            "BETA".to_string(),
        ];
        assert_eq!(sanitize_tags(&tags), vec!["beta", "alpha"]);
    }

    #[test]
    fn create_request_rejects_bad_url_scheme() {
        let req = CreateResourceRequest {
            title: "Intro to Rust".to_string(),
            description: "A thorough introduction to the Rust language.".to_string(),
            resource_type: ResourceType::Video,
            url: "ftp://example.com/video".to_string(),
            tags: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_request_accepts_http_and_https() {
        for url in ["http://example.com", "https://example.com"] {
            let req = CreateResourceRequest {
                title: "Intro to Rust".to_string(),
                description: "A thorough introduction to the Rust language.".to_string(),
                resource_type: ResourceType::Link,
                url: url.to_string(),
                tags: vec![],
            };
            assert!(req.validate().is_ok(), "{} should be accepted", url);
        }
    }

    #[test]
    fn sanitize_trims_before_validation() {
        let req = CreateResourceRequest {
            title: "  Intro to Rust  ".to_string(),
            description: "  A thorough introduction to the Rust language.  ".to_string(),
            resource_type: ResourceType::Pdf,
            url: " https://example.com/doc.pdf ".to_string(),
            tags: vec![],
        }
        .sanitized();

        assert_eq!(req.title, "Intro to Rust");
        assert_eq!(req.url, "https://example.com/doc.pdf");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn update_request_validates_only_supplied_fields() {
        let req = UpdateResourceRequest {
            title: Some("New title".to_string()),
            description: None,
            resource_type: None,
            url: None,
            tags: None,
        };
        assert!(req.validate().is_ok());

        let bad = UpdateResourceRequest {
            title: None,
            description: None,
            resource_type: None,
            url: Some("not-a-url".to_string()),
            tags: None,
        };
        assert!(bad.validate().is_err());
    }
}

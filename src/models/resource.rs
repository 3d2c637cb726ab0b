//! Resource model for the educational resource catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of resource kinds accepted by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Video,
    Pdf,
    Link,
}

impl ResourceType {
    /// Canonical string form, as stored in the `resource_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "video",
            ResourceType::Pdf => "pdf",
            ResourceType::Link => "link",
        }
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "video" => Ok(ResourceType::Video),
            "pdf" => Ok(ResourceType::Pdf),
            "link" => Ok(ResourceType::Link),
            _ => Err(format!("Invalid resource type: {}", s)),
        }
    }
}

/// A catalogued educational resource.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub resource_type: String,
    pub url: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sanitized input for creating a resource.
#[derive(Debug, Clone)]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub url: String,
    pub tags: Vec<String>,
}

/// Sanitized partial update; `None` means "leave the column untouched".
#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub url: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// Listing parameters after defaults have been applied.
#[derive(Debug, Clone)]
pub struct ListResourcesFilter {
    pub page: i64,
    pub page_size: i64,
    pub search: Option<String>,
    pub resource_type: Option<ResourceType>,
}

/// One page of listing results with pagination metadata.
#[derive(Debug, Clone, Serialize)]
pub struct ResourcePage {
    pub items: Vec<Resource>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

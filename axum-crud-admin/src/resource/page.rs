use super::{Field, Resource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A public content page addressed by its slug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: i64,
    pub slug: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Resource for Page {
    const TABLE: &'static str = "page";
    const NAME: &'static str = "Page";
    const PLURAL: &'static str = "Pages";
    const COLLECTION: &'static str = "pages";
    const FIELDS: &'static [Field] = &[
        Field::text("slug", "Slug"),
        Field::textarea("content", "Content"),
    ];

    fn id(&self) -> i64 {
        self.id
    }

    fn label(&self) -> &str {
        &self.slug
    }
}

impl Page {
    /// Public URL of the page
    pub fn public_path(&self) -> String {
        format!("/pages/{}", self.slug)
    }
}

use serde::{Deserialize, Serialize};

/// A stored bookmark
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: u64,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Stored upload name, served under `/uploads/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot_path: Option<String>,
}

/// Bookmark fields before an id is assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category_id: Option<u64>,
    pub favorite: bool,
    pub is_active: bool,
    pub screenshot_path: Option<String>,
}

impl Default for BookmarkDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            url: String::new(),
            description: String::new(),
            tags: Vec::new(),
            category_id: None,
            favorite: false,
            is_active: true,
            screenshot_path: None,
        }
    }
}

impl BookmarkDraft {
    pub fn with_id(self, id: u64) -> Bookmark {
        Bookmark {
            id,
            title: self.title,
            url: self.url,
            description: self.description,
            tags: self.tags,
            category_id: self.category_id,
            favorite: self.favorite,
            is_active: self.is_active,
            screenshot_path: self.screenshot_path,
        }
    }
}

#[allow(clippy::missing_const_for_fn)]
fn default_active() -> bool {
    true
}

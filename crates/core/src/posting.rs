//! Blog-style posts and their image assets.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Categories offered before any custom one is added.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Berita", "Pengumuman", "Acara", "Informasi"];

/// Default page size for `GET /api/postings`.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// A post as returned by the backend. Fields this client does not model are
/// kept in `extra` so a read-modify-write does not drop them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub id: DbId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Body for `POST /api/postings` and `PUT /api/postings/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostingDraft {
    pub title: String,
    pub category: String,
    /// Markdown body.
    pub excerpt: String,
    pub date: NaiveDate,
}

impl PostingDraft {
    /// Empty draft dated today (UTC).
    pub fn new() -> Self {
        Self {
            title: String::new(),
            category: String::new(),
            excerpt: String::new(),
            date: chrono::Utc::now().date_naive(),
        }
    }

    /// Draft pre-filled from an existing post.
    pub fn from_posting(posting: &Posting) -> Self {
        Self {
            title: posting.title.clone(),
            category: posting.category.clone(),
            excerpt: posting.excerpt.clone(),
            date: posting.date.unwrap_or_else(|| chrono::Utc::now().date_naive()),
        }
    }

    pub fn check(&self) -> Result<(), CoreError> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Title is required".into()));
        }
        if self.category.trim().is_empty() {
            return Err(CoreError::Validation("Category is required".into()));
        }
        Ok(())
    }
}

impl Default for PostingDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /api/postings` answers either with a bare array or a page envelope.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PostingList {
    Page {
        data: Vec<Posting>,
        #[serde(default)]
        total: Option<u64>,
        #[serde(default)]
        page: Option<u32>,
        #[serde(default)]
        limit: Option<u32>,
    },
    Plain(Vec<Posting>),
}

impl PostingList {
    pub fn items(&self) -> &[Posting] {
        match self {
            PostingList::Page { data, .. } => data,
            PostingList::Plain(items) => items,
        }
    }

    /// Total count when the backend reports one, else the page length.
    pub fn total(&self) -> u64 {
        match self {
            PostingList::Page {
                total: Some(total), ..
            } => *total,
            other => other.items().len() as u64,
        }
    }
}

/// An uploaded image attached to a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: DbId,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub post_id: Option<DbId>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Category list for the post form: the defaults plus any custom additions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    categories: Vec<String>,
}

impl Default for CategorySet {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }
}

impl CategorySet {
    pub fn as_slice(&self) -> &[String] {
        &self.categories
    }

    /// Add a custom category. Blank names and exact duplicates are refused.
    pub fn add(&mut self, name: &str) -> Result<&str, CoreError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CoreError::Validation("Category name is required".into()));
        }
        if self.categories.iter().any(|c| c == name) {
            return Err(CoreError::Conflict(format!("Category {name} already exists")));
        }
        self.categories.push(name.to_string());
        Ok(self.categories.last().map(String::as_str).unwrap_or_default())
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.categories.iter().any(|c| c == name)
    }

    /// The stored spelling of `name`, which must already be in the set.
    pub fn select(&self, name: &str) -> Result<&str, CoreError> {
        let name = name.trim();
        self.categories
            .iter()
            .find(|c| c.as_str() == name)
            .map(String::as_str)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown category {name} (expected one of: {})",
                    self.categories.join(", ")
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn posting_list_accepts_both_shapes() {
        let plain: PostingList = serde_json::from_str(r#"[{"id":1,"title":"a"}]"#).unwrap();
        assert_eq!(plain.items().len(), 1);
        assert_eq!(plain.total(), 1);

        let page: PostingList =
            serde_json::from_str(r#"{"data":[{"id":1},{"id":2}],"total":42}"#).unwrap();
        assert_eq!(page.items().len(), 2);
        assert_eq!(page.total(), 42);
    }

    #[test]
    fn unknown_posting_fields_survive_in_extra() {
        let post: Posting =
            serde_json::from_str(r#"{"id":3,"title":"t","date":"2024-05-01","images":["a.jpg"]}"#)
                .unwrap();
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert!(post.extra.contains_key("images"));
    }

    #[test]
    fn draft_requires_title_and_category() {
        let mut draft = PostingDraft::new();
        assert_matches!(draft.check(), Err(CoreError::Validation(_)));
        draft.title = "Kerja bakti".into();
        assert_matches!(draft.check(), Err(CoreError::Validation(_)));
        draft.category = "Acara".into();
        assert!(draft.check().is_ok());
    }

    #[test]
    fn categories_reject_duplicates() {
        let mut set = CategorySet::default();
        assert_eq!(set.as_slice().len(), 4);
        assert_eq!(set.add(" Lowongan ").unwrap(), "Lowongan");
        assert_matches!(set.add("Berita"), Err(CoreError::Conflict(_)));
        assert_matches!(set.add("  "), Err(CoreError::Validation(_)));
        assert_eq!(set.as_slice().len(), 5);
    }

    #[test]
    fn select_only_known_categories() {
        let mut set = CategorySet::default();
        assert_eq!(set.select(" Acara ").unwrap(), "Acara");
        assert_matches!(set.select("Lowongan"), Err(CoreError::Validation(msg)) if msg.contains("Berita"));
        set.add("Lowongan").unwrap();
        assert!(set.contains("Lowongan"));
        assert_eq!(set.select("Lowongan").unwrap(), "Lowongan");
    }
}

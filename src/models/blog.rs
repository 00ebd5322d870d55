use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostState {
    #[default]
    Draft,
    Published,
    Archived,
}

impl FromStr for PostState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(Self::Draft),
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PostState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Published => write!(f, "published"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    /// Path relative to the resource root.
    pub feature_image: String,
    pub state: PostState,
    pub tags: Vec<String>,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub published_at: Option<String>,
}

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Form input for the create-or-update endpoint. Every field is optional at
/// this level; the create branch enforces its own required set.
#[derive(Debug, Clone, Default)]
pub struct UpsertPost {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub state: Option<String>,
    pub tags: Option<Vec<String>>,
    pub user_id: Option<i64>,
    pub feature_image: Option<ImageUpload>,
}

impl UpsertPost {
    /// Trims text fields and drops the ones left empty, so that "supplied"
    /// always means "non-empty after trimming".
    pub fn normalized(mut self) -> Self {
        self.title = non_empty(self.title);
        self.content = non_empty(self.content);
        self.state = non_empty(self.state);
        self.tags = self.tags.and_then(|tags| {
            let tags: Vec<String> = tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect();
            if tags.is_empty() {
                None
            } else {
                Some(tags)
            }
        });
        self.feature_image = self.feature_image.filter(|img| !img.data.is_empty());
        self
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-joined tag list as sent by the dashboard form.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug)]
pub enum UpsertOutcome {
    Created(BlogPost),
    Updated(BlogPost),
}

impl UpsertOutcome {
    pub fn into_post(self) -> BlogPost {
        match self {
            Self::Created(post) | Self::Updated(post) => post,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: usize,
    pub total_pages: usize,
    pub total_count: i64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total_count: i64) -> Self {
        let total = total_count.max(0) as usize;
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            current_page: page,
            total_pages,
            total_count,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPage {
    pub data: Vec<BlogPost>,
    pub pagination: Pagination,
}

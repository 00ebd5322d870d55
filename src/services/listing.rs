use crate::models::{Pagination, PostState, PostPage};
use crate::services::blog::{row_to_post, POST_COLUMNS};
use crate::services::{ServiceError, ServiceResult};
use crate::Database;
use serde::{Deserialize, Deserializer};

/// Raw query parameters of the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub search_text: Option<String>,
    pub tags: Option<String>,
    pub state: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    pub limit: Option<i64>,
}

/// Reads an integer query value without rejecting the request: out-of-range
/// numbers saturate, anything non-numeric counts as absent.
fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_int_saturating))
}

fn parse_int_saturating(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<i64>() {
        return Some(n);
    }

    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(if negative { i64::MIN } else { i64::MAX })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()) {
            Some(s) if s == "asc" => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Maps a client sort key onto a column. Only these columns may appear in
/// ORDER BY; anything else falls back to creation time.
fn sort_column(raw: Option<&str>) -> &'static str {
    match raw.map(str::trim) {
        Some("id") => "id",
        Some("title") => "title",
        Some("slug") => "slug",
        Some("state") => "state",
        Some("updatedAt") | Some("updated_at") => "updated_at",
        Some("publishedAt") | Some("published_at") => "published_at",
        _ => "created_at",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Floors page and limit at 1 and caps limit at `max_size`.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_size: usize, max_size: usize) -> Self {
        let page = usize::try_from(page.unwrap_or(1).max(1)).unwrap_or(usize::MAX);
        let limit = match limit {
            Some(l) => usize::try_from(l.max(1)).unwrap_or(usize::MAX),
            None => default_size,
        };
        Self {
            page,
            limit: limit.min(max_size).max(1),
        }
    }

    /// Row offset for SQLite, saturated so it never exceeds `i64::MAX`.
    pub fn offset(&self) -> i64 {
        (self.page as u64 - 1)
            .saturating_mul(self.limit as u64)
            .min(i64::MAX as u64) as i64
    }
}

/// A WHERE clause with its positional parameters, ready to be shared by the
/// row query and the count query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub clause: String,
    pub params: Vec<String>,
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Builds the conjunctive filter: title substring, one EXISTS per tag token
/// (every token must match some tag), and exact state.
pub fn build_filter(query: &ListQuery) -> ServiceResult<Filter> {
    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<String> = Vec::new();

    if let Some(text) = query.search_text.as_deref().map(str::trim) {
        if !text.is_empty() {
            conditions.push("unicode_lower(title) LIKE ? ESCAPE '\\'");
            params.push(escape_like(&text.to_lowercase()));
        }
    }

    if let Some(tags) = query.tags.as_deref() {
        for tag in tags.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            conditions.push(
                "EXISTS (SELECT 1 FROM json_each(blog_posts.tags) WHERE unicode_lower(json_each.value) LIKE ? ESCAPE '\\')",
            );
            params.push(escape_like(&tag.to_lowercase()));
        }
    }

    let state = match query.state.as_deref().map(str::trim) {
        None | Some("") => PostState::Published,
        Some(raw) => raw
            .parse::<PostState>()
            .map_err(|_| ServiceError::BadRequest(format!("Invalid state: {}", raw)))?,
    };
    conditions.push("state = ?");
    params.push(state.to_string());

    Ok(Filter {
        clause: conditions.join(" AND "),
        params,
    })
}

pub fn list_posts(
    db: &Database,
    query: &ListQuery,
    default_size: usize,
    max_size: usize,
) -> ServiceResult<PostPage> {
    let filter = build_filter(query)?;
    let page = PageRequest::new(query.page, query.limit, default_size, max_size);
    let column = sort_column(query.sort.as_deref());
    let order = SortOrder::parse(query.order.as_deref());

    let conn = db.get()?;

    let sql = format!(
        "SELECT {} FROM blog_posts WHERE {} ORDER BY {} {}, id {} LIMIT ? OFFSET ?",
        POST_COLUMNS,
        filter.clause,
        column,
        order.as_sql(),
        order.as_sql(),
    );

    let limit = page.limit as i64;
    let offset = page.offset();
    let param_refs: Vec<&dyn rusqlite::ToSql> = filter
        .params
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .chain(std::iter::once(&limit as &dyn rusqlite::ToSql))
        .chain(std::iter::once(&offset as &dyn rusqlite::ToSql))
        .collect();

    let mut stmt = conn.prepare(&sql)?;
    let data = stmt
        .query_map(param_refs.as_slice(), row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;

    let count_sql = format!("SELECT COUNT(*) FROM blog_posts WHERE {}", filter.clause);
    let count_refs: Vec<&dyn rusqlite::ToSql> = filter
        .params
        .iter()
        .map(|s| s as &dyn rusqlite::ToSql)
        .collect();
    let total_count: i64 = conn.query_row(&count_sql, count_refs.as_slice(), |row| row.get(0))?;

    Ok(PostPage {
        data,
        pagination: Pagination::new(page.page, page.limit, total_count),
    })
}

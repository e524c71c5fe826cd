//! Translation of raw list parameters into a typed query, and of that query
//! into SQL.
//!
//! Parsing never fails: unknown or malformed values fall back to the
//! documented defaults so a list request always produces a result.

use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};

use crate::models::{PageMeta, TodoPriority, TodoStatus};

pub const DEFAULT_PER_PAGE: u32 = 15;
pub const MAX_PER_PAGE: u32 = 100;
pub const DEFAULT_SORT_COLUMN: &str = "created_at";

/// Wire field names that differ from their column.
const SORT_ALIASES: &[(&str, &str)] = &[
    ("createdAt", "created_at"),
    ("updatedAt", "updated_at"),
    ("dueDate", "dueDate"),
];

/// Columns that may appear in `ORDER BY`.
const SORTABLE_COLUMNS: &[&str] = &[
    "id",
    "title",
    "description",
    "status",
    "priority",
    "dueDate",
    "created_at",
    "updated_at",
];

/// Query string of `GET /todos`, kept as raw strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            column: DEFAULT_SORT_COLUMN,
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Parses `field[:direction]`. The field goes through the alias table and
    /// must name a sortable column; the direction defaults to `desc`.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::default();
        };
        let (field, direction) = match raw.split_once(':') {
            Some((field, direction)) => (field.trim(), SortDirection::parse(direction)),
            None => (raw, None),
        };

        let mapped = SORT_ALIASES
            .iter()
            .find(|(alias, _)| *alias == field)
            .map_or(field, |(_, column)| *column);

        Self {
            column: resolve_column(mapped),
            direction: direction.unwrap_or(SortDirection::Desc),
        }
    }

    /// Nulls go last in both directions; `id` breaks ties.
    pub fn push_order_by(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        let dir = self.direction.as_sql();
        qb.push(format!(
            " ORDER BY {col} IS NULL, {col} {dir}",
            col = self.column,
            dir = dir
        ));
        if self.column != "id" {
            qb.push(format!(", id {}", dir));
        }
    }
}

fn resolve_column(name: &str) -> &'static str {
    SORTABLE_COLUMNS
        .iter()
        .copied()
        .find(|column| *column == name)
        .unwrap_or(DEFAULT_SORT_COLUMN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn parse(page: Option<&str>, per_page: Option<&str>) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let per_page = parse_positive(per_page)
            .map(|n| n.min(MAX_PER_PAGE))
            .unwrap_or(DEFAULT_PER_PAGE);
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }

    pub fn meta(&self, total: u64) -> PageMeta {
        let pages = total.div_ceil(u64::from(self.per_page)).max(1);
        PageMeta {
            total,
            per_page: self.per_page,
            current_page: self.page,
            last_page: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }

    pub fn push_limit(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" LIMIT ")
            .push_bind(i64::from(self.per_page))
            .push(" OFFSET ")
            .push_bind(self.offset());
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok()).filter(|n| *n > 0)
}

/// Row restrictions. `None` means "no restriction"; `Some(vec![])` is an
/// active filter that matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoFilter {
    pub statuses: Option<Vec<TodoStatus>>,
    pub priorities: Option<Vec<TodoPriority>>,
    pub search: Option<String>,
}

impl TodoFilter {
    pub fn parse(params: &ListParams) -> Self {
        Self {
            statuses: parse_set(params.status.as_deref(), TodoStatus::parse),
            priorities: parse_set(params.priority.as_deref(), TodoPriority::parse),
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");

        if let Some(statuses) = &self.statuses {
            push_in(qb, "status", statuses);
        }
        if let Some(priorities) = &self.priorities {
            push_in(qb, "priority", priorities);
        }
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR description LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }
    }
}

fn parse_set<T, F>(raw: Option<&str>, parse: F) -> Option<Vec<T>>
where
    T: PartialEq,
    F: Fn(&str) -> Option<T>,
{
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let mut values = Vec::new();
    for value in raw.split(',').filter_map(|item| parse(item.trim())) {
        if !values.contains(&value) {
            values.push(value);
        }
    }
    Some(values)
}

fn push_in<'args, T>(qb: &mut QueryBuilder<'args, Sqlite>, column: &str, values: &[T])
where
    T: Copy + 'args + sqlx::Encode<'args, Sqlite> + sqlx::Type<Sqlite>,
{
    if values.is_empty() {
        qb.push(" AND 1 = 0");
        return;
    }
    qb.push(format!(" AND {} IN (", column));
    let mut separated = qb.separated(", ");
    for value in values {
        separated.push_bind(*value);
    }
    separated.push_unseparated(")");
}

/// Escapes `LIKE` metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Everything a list request asks for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub filter: TodoFilter,
    pub sort: SortSpec,
    pub page: PageRequest,
}

impl TodoQuery {
    pub fn from_params(params: &ListParams) -> Self {
        Self {
            filter: TodoFilter::parse(params),
            sort: SortSpec::parse(params.sort.as_deref()),
            page: PageRequest::parse(params.page.as_deref(), params.per_page.as_deref()),
        }
    }
}

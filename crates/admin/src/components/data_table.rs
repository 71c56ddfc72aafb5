//! Data table component types.
//!
//! List pages share one query shape (`q`, filter, `sort`, `dir`, `page`),
//! are filtered and sorted in memory, and show [`PAGE_SIZE`] rows per page.

use std::cmp::Ordering;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use tmc_core::{Order, Person, domain_of};

/// Rows per page on every list.
pub const PAGE_SIZE: usize = 5;

/// Domains always offered in the email domain filter.
pub const DEFAULT_DOMAINS: [&str; 4] = ["gmail.com", "yahoo.com", "outlook.com", "hotmail.com"];

/// Column definition for a data table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableColumn {
    /// Unique key for the column, used as the `sort` value.
    pub key: String,
    /// Display label for the column header.
    pub label: String,
    /// Whether the column is sortable.
    pub sortable: bool,
}

impl TableColumn {
    /// Create a new sortable column.
    #[must_use]
    pub fn sortable(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: true,
        }
    }

    /// Create a new non-sortable column.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            sortable: false,
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    #[must_use]
    pub const fn toggle(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl FromStr for SortDir {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(()),
        }
    }
}

/// Parse a query value, treating empty or malformed input as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// Query parameters accepted by every list page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    /// Free-text search.
    pub q: Option<String>,
    /// Email domain filter (people).
    pub domain: Option<String>,
    /// Order id substring filter (orders).
    pub id: Option<String>,
    /// Column key to sort by.
    pub sort: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub dir: Option<SortDir>,
    /// 1-based page number.
    #[serde(default, deserialize_with = "lenient")]
    pub page: Option<usize>,
}

impl ListQuery {
    /// Trimmed, lowercased search text, if any.
    #[must_use]
    pub fn search(&self) -> Option<String> {
        non_empty(self.q.as_deref()).map(str::to_lowercase)
    }

    #[must_use]
    pub fn domain_filter(&self) -> Option<String> {
        non_empty(self.domain.as_deref()).map(str::to_lowercase)
    }

    #[must_use]
    pub fn id_filter(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }

    #[must_use]
    pub fn direction(&self) -> SortDir {
        self.dir.unwrap_or_default()
    }

    /// Whether the list is currently sorted by `key`.
    #[must_use]
    pub fn is_sorted_by(&self, key: &str) -> bool {
        self.sort.as_deref() == Some(key)
    }

    /// Query string that sorts by `key`, flipping the direction when the
    /// list is already sorted by it. Keeps search and filters; resets the page.
    #[must_use]
    pub fn sort_href(&self, key: &str) -> String {
        let dir = if self.is_sorted_by(key) {
            self.direction().toggle()
        } else {
            SortDir::Asc
        };
        self.href(Some((key, dir)), None)
    }

    /// Query string for `page`, keeping everything else.
    #[must_use]
    pub fn page_href(&self, page: usize) -> String {
        let sort = self
            .sort
            .as_deref()
            .map(|key| (key, self.direction()));
        self.href(sort, Some(page))
    }

    fn href(&self, sort: Option<(&str, SortDir)>, page: Option<usize>) -> String {
        let mut params: Vec<String> = Vec::new();
        for (name, value) in [
            ("q", self.q.as_deref()),
            ("domain", self.domain.as_deref()),
            ("id", self.id.as_deref()),
        ] {
            if let Some(value) = non_empty(value) {
                params.push(format!("{name}={}", urlencoding::encode(value)));
            }
        }
        if let Some((key, dir)) = sort {
            params.push(format!("sort={}", urlencoding::encode(key)));
            params.push(format!("dir={}", dir.as_str()));
        }
        if let Some(page) = page {
            params.push(format!("page={page}"));
        }
        format!("?{}", params.join("&"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A sortable cell value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortValue {
    Number(Decimal),
    Text(String),
}

impl SortValue {
    fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// A row a list page can search, filter and sort.
pub trait TableRow {
    /// Whether the row contains the lowercased search text.
    fn matches_search(&self, needle: &str) -> bool;

    /// Whether the row passes the page's filter.
    fn matches_filter(&self, query: &ListQuery) -> bool;

    /// Value of the column `key`, or `None` if the column is unknown.
    fn sort_value(&self, key: &str) -> Option<SortValue>;
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

impl TableRow for Person {
    fn matches_search(&self, needle: &str) -> bool {
        contains(&self.name, needle) || contains(&self.email, needle) || self.phone.contains(needle)
    }

    fn matches_filter(&self, query: &ListQuery) -> bool {
        query
            .domain_filter()
            .is_none_or(|domain| domain_of(&self.email).as_deref() == Some(domain.as_str()))
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "id" => Some(SortValue::Number(Decimal::from(self.id.as_i64()))),
            "name" => Some(SortValue::text(&self.name)),
            "email" => Some(SortValue::text(&self.email)),
            "phone" => Some(SortValue::text(&self.phone)),
            _ => None,
        }
    }
}

impl TableRow for Order {
    fn matches_search(&self, needle: &str) -> bool {
        contains(&self.customer.name, needle)
            || contains(&self.customer.email, needle)
            || contains(&self.consultant_name, needle)
            || self
                .services
                .iter()
                .any(|line| contains(&line.service_label, needle))
    }

    fn matches_filter(&self, query: &ListQuery) -> bool {
        query
            .id_filter()
            .is_none_or(|id| self.id.to_string().contains(id))
    }

    fn sort_value(&self, key: &str) -> Option<SortValue> {
        match key {
            "id" => Some(SortValue::Number(Decimal::from(self.id.as_i64()))),
            "customer" => Some(SortValue::text(&self.customer.name)),
            "date" => Some(SortValue::text(self.order_date.as_deref().unwrap_or_default())),
            "total" => Some(SortValue::Number(self.total_price.amount())),
            "status" => Some(SortValue::text(self.order_status.as_str())),
            "payment" => Some(SortValue::text(self.payment_status.as_str())),
            _ => None,
        }
    }
}

/// One page of a filtered, sorted list.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// 1-based, clamped to `1..=total_pages`.
    pub page: usize,
    /// At least 1, even for an empty list.
    pub total_pages: usize,
    /// Rows after filtering, before paging.
    pub total_rows: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub fn label(&self) -> String {
        format!("Page {} of {}", self.page, self.total_pages)
    }
}

/// Search, filter, sort and page `items` according to `query`.
#[must_use]
pub fn paginate<T: TableRow + Clone>(items: &[T], query: &ListQuery) -> Page<T> {
    let needle = query.search();
    let mut rows: Vec<T> = items
        .iter()
        .filter(|row| needle.as_deref().is_none_or(|n| row.matches_search(n)))
        .filter(|row| row.matches_filter(query))
        .cloned()
        .collect();

    if let Some(key) = query.sort.as_deref() {
        let dir = query.direction();
        rows.sort_by(|a, b| {
            let ordering = match (a.sort_value(key), b.sort_value(key)) {
                (Some(a), Some(b)) => a.compare(&b),
                _ => Ordering::Equal,
            };
            match dir {
                SortDir::Asc => ordering,
                SortDir::Desc => ordering.reverse(),
            }
        });
    }

    let total_rows = rows.len();
    let total_pages = total_rows.div_ceil(PAGE_SIZE).max(1);
    let page = query.page.unwrap_or(1).clamp(1, total_pages);
    let rows = rows
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    Page {
        rows,
        page,
        total_pages,
        total_rows,
    }
}

/// Options for the email domain filter: the defaults, then any other domain
/// present in `people`, sorted.
#[must_use]
pub fn domain_options(people: &[Person]) -> Vec<String> {
    let mut extra: Vec<String> = people
        .iter()
        .filter_map(|p| domain_of(&p.email))
        .filter(|d| !DEFAULT_DOMAINS.contains(&d.as_str()))
        .collect();
    extra.sort();
    extra.dedup();

    DEFAULT_DOMAINS
        .iter()
        .map(ToString::to_string)
        .chain(extra)
        .collect()
}

/// Column headers for people lists.
#[must_use]
pub fn people_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::sortable("id", "ID"),
        TableColumn::sortable("name", "Name"),
        TableColumn::sortable("email", "Email"),
        TableColumn::sortable("phone", "Phone"),
        TableColumn::new("actions", "Actions"),
    ]
}

/// Column headers for the order list.
#[must_use]
pub fn order_columns() -> Vec<TableColumn> {
    vec![
        TableColumn::sortable("id", "Order"),
        TableColumn::sortable("customer", "Customer"),
        TableColumn::sortable("date", "Date"),
        TableColumn::sortable("total", "Total"),
        TableColumn::sortable("status", "Status"),
        TableColumn::sortable("payment", "Payment"),
        TableColumn::new("actions", "Actions"),
    ]
}

//! Pagination and sorting for user listings.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use innkeep_core::{DomainError, DomainResult};

pub const MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserSortField {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl UserSortField {
    /// `ORDER BY` expression over the `users` table.
    ///
    /// Text keys compare lowercased under the byte-order `"C"` collation so
    /// every store backend returns the same page contents.
    pub fn order_expr(&self) -> &'static str {
        match self {
            UserSortField::Name => r#"lower(name) COLLATE "C""#,
            UserSortField::Email => r#"email COLLATE "C""#,
            UserSortField::CreatedAt => "created_at",
        }
    }
}

impl FromStr for UserSortField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "name" => Ok(UserSortField::Name),
            "email" => Ok(UserSortField::Email),
            "createdAt" | "created_at" => Ok(UserSortField::CreatedAt),
            other => Err(DomainError::validation(format!(
                "sortBy must be one of: name, email, createdAt (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(DomainError::validation(format!(
                "sortOrder must be asc or desc (got '{other}')"
            ))),
        }
    }
}

/// Page request for listing users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size, 1..=100.
    pub limit: u32,
    pub sort_by: UserSortField,
    pub sort_order: SortOrder,
}

impl Default for UserQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: UserSortField::default(),
            sort_order: SortOrder::default(),
        }
    }
}

impl UserQuery {
    pub fn validate(&self) -> DomainResult<()> {
        if self.page < 1 {
            return Err(DomainError::validation("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            return Err(DomainError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, query: &UserQuery) -> Self {
        let limit = u64::from(query.limit.max(1));
        let total_pages = total.div_ceil(limit);
        Self {
            items,
            total,
            page: query.page,
            limit: query.limit,
            total_pages,
            has_next_page: u64::from(query.page) < total_pages,
            has_previous_page: query.page > 1,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_previous_page: self.has_previous_page,
        }
    }
}

use std::num::IntErrorKind;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::input::parse_timestamp;
use crate::validate::QueryError;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;

/// Raw `GET /api/hives` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHivesParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl ListHivesParams {
    pub fn parse(&self) -> Result<(HiveFilter, Pagination), QueryError> {
        let filter = HiveFilter {
            start_date: parse_bound(self.start_date.as_deref(), "startDate")?,
            end_date: parse_bound(self.end_date.as_deref(), "endDate")?,
        };
        let pagination = Pagination {
            page: parse_positive(self.page.as_deref(), DEFAULT_PAGE)?,
            limit: parse_positive(self.limit.as_deref(), DEFAULT_LIMIT)?,
        };
        Ok((filter, pagination))
    }
}

fn parse_bound(raw: Option<&str>, field: &'static str) -> Result<Option<DateTime<Utc>>, QueryError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => parse_timestamp(s).map(Some).ok_or(QueryError::Date(field)),
    }
}

fn parse_positive(raw: Option<&str>, default: u32) -> Result<u32, QueryError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(s) => match s.parse::<u32>() {
            Ok(n) if n >= 1 => Ok(n),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => {
                Err(QueryError::PaginationTooLarge)
            }
            _ => Err(QueryError::Pagination),
        },
    }
}

/// Inclusive bounds on `datePlaced`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HiveFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl HiveFilter {
    pub fn matches(&self, date_placed: DateTime<Utc>) -> bool {
        self.start_date.map_or(true, |start| date_placed >= start)
            && self.end_date.map_or(true, |end| date_placed <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Pagination {
    /// Number of records to skip: `(page - 1) * limit`.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.limit)
    }
}

//! Listing API request DTOs
//!
//! Table UIs are loose about types: flags arrive as `true` or `"true"`,
//! numbers as `3` or `"3"`. Everything is accepted here and normalized
//! into a `QuerySpec`.

use serde::Deserialize;

use crate::config::ListingConfig;
use crate::data::{ColumnRequest, Direction, OrderRule, QuerySpec};

/// Integer sent as a number or numeric string
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LenientInt {
    Number(i64),
    Text(String),
}

impl LenientInt {
    pub fn value(&self) -> Option<i64> {
        match self {
            LenientInt::Number(n) => Some(*n),
            LenientInt::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Flag sent as a boolean or `"true"`/`"false"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LenientBool {
    Bool(bool),
    Text(String),
}

impl LenientBool {
    pub fn value(&self) -> bool {
        match self {
            LenientBool::Bool(b) => *b,
            LenientBool::Text(s) => s.trim().eq_ignore_ascii_case("true"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ColumnRequestDto {
    pub name: String,
    pub searchable: Option<LenientBool>,
    pub orderable: Option<LenientBool>,
    pub search: Option<SearchRequest>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderRequest {
    /// Column index; anything that is not a non-negative integer is skipped
    pub column: serde_json::Value,
    pub dir: Option<String>,
}

/// Listing request body
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpecRequest {
    pub draw: Option<LenientInt>,
    pub page: Option<LenientInt>,
    pub per_page: Option<LenientInt>,
    pub columns: Vec<ColumnRequestDto>,
    pub search: Option<SearchRequest>,
    pub order: Vec<OrderRequest>,
}

fn column_index(value: &serde_json::Value) -> Option<usize> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn non_blank(value: Option<&SearchRequest>) -> Option<String> {
    value
        .and_then(|search| search.value.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl QuerySpecRequest {
    /// Normalize into a `QuerySpec`
    ///
    /// `page` is clamped to at least 1. `perPage` of 0 (or missing) uses the
    /// configured default; larger values are capped at the configured max.
    pub fn into_spec(self, limits: &ListingConfig) -> QuerySpec {
        let draw = self.draw.as_ref().and_then(LenientInt::value).unwrap_or(0);
        let page = self
            .page
            .as_ref()
            .and_then(LenientInt::value)
            .unwrap_or(1)
            .clamp(1, i64::from(u32::MAX)) as u32;
        let per_page = match self.per_page.as_ref().and_then(LenientInt::value) {
            Some(n) if n > 0 => n.min(i64::from(limits.max_per_page)) as u32,
            _ => limits.default_per_page.clamp(1, limits.max_per_page.max(1)),
        };

        let mut spec = QuerySpec::new(draw, page, per_page);
        spec.search = non_blank(self.search.as_ref());
        spec.columns = self
            .columns
            .into_iter()
            .map(|column| ColumnRequest {
                searchable: column.searchable.as_ref().is_some_and(LenientBool::value),
                orderable: column.orderable.as_ref().is_some_and(LenientBool::value),
                search: non_blank(column.search.as_ref()),
                name: column.name,
            })
            .collect();
        spec.order = self
            .order
            .iter()
            .filter_map(|rule| {
                Some(OrderRule {
                    column: column_index(&rule.column)?,
                    direction: Direction::parse(rule.dir.as_deref().unwrap_or_default()),
                })
            })
            .collect();
        spec
    }
}

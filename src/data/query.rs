//! SELECT construction over backend tables
//!
//! A `SelectQuery` is a small description of one listing query that can be
//! rendered twice: once windowed for the page, once as `COUNT(*)` for the
//! totals. Table, column and join text is `&'static str` and comes only
//! from driver definitions; client input reaches the database as bound
//! parameters.

use sqlx::{Any, QueryBuilder};

use super::models::Direction;

/// Escape character used in every LIKE pattern
const LIKE_ESCAPE: char = '!';

/// A bound parameter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bind {
    Text(String),
    Int(i64),
}

impl Bind {
    fn push_to(&self, builder: &mut QueryBuilder<'static, Any>) {
        match self {
            Bind::Text(value) => builder.push_bind(value.clone()),
            Bind::Int(value) => builder.push_bind(*value),
        };
    }
}

impl From<&str> for Bind {
    fn from(value: &str) -> Self {
        Bind::Text(value.to_string())
    }
}

impl From<String> for Bind {
    fn from(value: String) -> Self {
        Bind::Text(value)
    }
}

impl From<i64> for Bind {
    fn from(value: i64) -> Self {
        Bind::Int(value)
    }
}

/// A WHERE-clause condition
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `expr = ?`
    Eq(&'static str, Bind),
    /// `expr IN (?, ...)`; an empty list matches nothing
    In(&'static str, Vec<Bind>),
    /// `expr IS NULL`
    IsNull(&'static str),
    /// Case-insensitive substring match
    Contains(&'static str, String),
    /// Case-sensitive suffix match
    EndsWith(&'static str, String),
    /// Disjunction; an empty group matches nothing
    Any(Vec<Predicate>),
    /// Conjunction; an empty group matches everything
    All(Vec<Predicate>),
}

/// Escape LIKE metacharacters so user input matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if ch == LIKE_ESCAPE || ch == '%' || ch == '_' {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

fn push_predicate(builder: &mut QueryBuilder<'static, Any>, predicate: &Predicate) {
    match predicate {
        Predicate::Eq(expr, value) => {
            builder.push(*expr).push(" = ");
            value.push_to(builder);
        }
        Predicate::In(expr, values) => {
            if values.is_empty() {
                builder.push("1 = 0");
                return;
            }
            builder.push(*expr).push(" IN (");
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(", ");
                }
                value.push_to(builder);
            }
            builder.push(")");
        }
        Predicate::IsNull(expr) => {
            builder.push(*expr).push(" IS NULL");
        }
        Predicate::Contains(expr, term) => {
            builder.push("LOWER(").push(*expr).push(") LIKE ");
            builder.push_bind(format!("%{}%", escape_like(&term.to_lowercase())));
            builder.push(format!(" ESCAPE '{LIKE_ESCAPE}'"));
        }
        Predicate::EndsWith(expr, suffix) => {
            builder.push(*expr).push(" LIKE ");
            builder.push_bind(format!("%{}", escape_like(suffix)));
            builder.push(format!(" ESCAPE '{LIKE_ESCAPE}'"));
        }
        Predicate::Any(group) => push_group(builder, group, " OR ", "1 = 0"),
        Predicate::All(group) => push_group(builder, group, " AND ", "1 = 1"),
    }
}

fn push_group(
    builder: &mut QueryBuilder<'static, Any>,
    group: &[Predicate],
    separator: &str,
    when_empty: &str,
) {
    if group.is_empty() {
        builder.push(when_empty);
        return;
    }
    builder.push("(");
    for (index, predicate) in group.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_predicate(builder, predicate);
    }
    builder.push(")");
}

/// Description of one SELECT over a backend's tables
#[derive(Debug, Clone, Default)]
pub struct SelectQuery {
    columns: Vec<&'static str>,
    from: &'static str,
    joins: Vec<&'static str>,
    filters: Vec<Predicate>,
    order: Vec<(&'static str, Direction)>,
    distinct: bool,
}

impl SelectQuery {
    pub fn from(table: &'static str) -> Self {
        Self {
            from: table,
            ..Self::default()
        }
    }

    pub fn columns(mut self, columns: &[&'static str]) -> Self {
        self.columns.extend_from_slice(columns);
        self
    }

    pub fn join(mut self, clause: &'static str) -> Self {
        self.joins.push(clause);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn add_filter(&mut self, predicate: Predicate) {
        self.filters.push(predicate);
    }

    pub fn order_by(&mut self, expr: &'static str, direction: Direction) {
        self.order.push((expr, direction));
    }

    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    /// Full SELECT with ordering, no window
    pub fn build(&self) -> QueryBuilder<'static, Any> {
        let mut builder = QueryBuilder::new(if self.distinct {
            "SELECT DISTINCT "
        } else {
            "SELECT "
        });
        if self.columns.is_empty() {
            builder.push("*");
        } else {
            builder.push(self.columns.join(", "));
        }
        self.push_body(&mut builder);
        self.push_order(&mut builder);
        builder
    }

    /// SELECT windowed to one page
    pub fn build_page(&self, limit: u32, offset: u64) -> QueryBuilder<'static, Any> {
        let mut builder = self.build();
        builder.push(" LIMIT ");
        builder.push_bind(i64::from(limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
        builder
    }

    /// `COUNT(*)` over the same FROM/JOIN/WHERE
    pub fn build_count(&self) -> QueryBuilder<'static, Any> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) AS total");
        self.push_body(&mut builder);
        builder
    }

    fn push_body(&self, builder: &mut QueryBuilder<'static, Any>) {
        builder.push(" FROM ").push(self.from);
        for join in &self.joins {
            builder.push(" ").push(*join);
        }
        if self.filters.is_empty() {
            return;
        }
        builder.push(" WHERE ");
        for (index, predicate) in self.filters.iter().enumerate() {
            if index > 0 {
                builder.push(" AND ");
            }
            push_predicate(builder, predicate);
        }
    }

    fn push_order(&self, builder: &mut QueryBuilder<'static, Any>) {
        if self.order.is_empty() {
            return;
        }
        builder.push(" ORDER BY ");
        for (index, (expr, direction)) in self.order.iter().enumerate() {
            if index > 0 {
                builder.push(", ");
            }
            builder.push(*expr).push(" ").push(direction.as_sql());
        }
    }
}

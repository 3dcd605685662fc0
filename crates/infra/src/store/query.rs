//! Filters, ordering and pagination over JSON-projected rows.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// Default page size.
pub const PER_PAGE: usize = 20;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
}

impl core::str::FromStr for FilterOp {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(FilterOp::Eq),
            "!=" | "<>" => Ok(FilterOp::Ne),
            ">" => Ok(FilterOp::Gt),
            ">=" => Ok(FilterOp::Gte),
            "<" => Ok(FilterOp::Lt),
            "<=" => Ok(FilterOp::Lte),
            "like" => Ok(FilterOp::Like),
            other => Err(StoreError::InvalidQuery(format!("unsupported operator '{other}'"))),
        }
    }
}

/// `column <op> value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, FilterOp::Eq, value)
    }

    pub fn like(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(column, FilterOp::Like, Value::String(pattern.into()))
    }

    /// Evaluate against one row. Referencing a column the row does not have is
    /// a query error.
    pub(crate) fn matches(&self, row: &Map<String, Value>, table: &str) -> Result<bool, StoreError> {
        let actual = row.get(&self.column).ok_or_else(|| {
            StoreError::InvalidQuery(format!("unknown column '{}' on {table}", self.column))
        })?;

        let matched = match self.op {
            FilterOp::Eq => compare(actual, &self.value) == Ordering::Equal,
            FilterOp::Ne => compare(actual, &self.value) != Ordering::Equal,
            FilterOp::Like => match (actual, &self.value) {
                (Value::String(text), Value::String(pattern)) => like(text, pattern),
                _ => false,
            },
            // NULL never satisfies an ordering comparison.
            _ if actual.is_null() || self.value.is_null() => false,
            FilterOp::Gt => compare(actual, &self.value) == Ordering::Greater,
            FilterOp::Gte => compare(actual, &self.value) != Ordering::Less,
            FilterOp::Lt => compare(actual, &self.value) == Ordering::Less,
            FilterOp::Lte => compare(actual, &self.value) != Ordering::Greater,
        };
        Ok(matched)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            direction: SortDirection::Desc,
        }
    }
}

impl Default for OrderBy {
    /// Newest first.
    fn default() -> Self {
        Self::desc("id")
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub per_page: usize,
    pub current_page: usize,
    pub last_page: usize,
}

impl<T> Page<T> {
    /// Slice page `page` (1-based; 0 is treated as 1) out of `rows`. Pages
    /// past the end are empty.
    pub fn from_rows(rows: Vec<T>, per_page: usize, page: usize) -> Self {
        let per_page = per_page.max(1);
        let current_page = page.max(1);
        let total = rows.len();
        let last_page = total.div_ceil(per_page).max(1);
        let skip = (current_page - 1).checked_mul(per_page).unwrap_or(usize::MAX);
        let items = rows.into_iter().skip(skip).take(per_page).collect();
        Self {
            items,
            total,
            per_page,
            current_page,
            last_page,
        }
    }
}

/// Total order over JSON scalars: null < bool < number < string < others.
pub(crate) fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)).then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

fn rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Case-insensitive SQL `LIKE` (`%` any run, `_` any single char).
pub(crate) fn like(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.to_lowercase().chars().collect();
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();

    // Iterative wildcard match with single backtrack point.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn operators_parse_from_sql_spelling() {
        assert_eq!("<>".parse::<FilterOp>().unwrap(), FilterOp::Ne);
        assert_eq!("LIKE".parse::<FilterOp>().unwrap(), FilterOp::Like);
        assert!("~".parse::<FilterOp>().is_err());
    }

    #[test]
    fn like_patterns() {
        assert!(like("admin@example.com", "%@example.com"));
        assert!(like("Admin", "ad%"));
        assert!(like("cat", "c_t"));
        assert!(like("abc", "%"));
        assert!(!like("abc", "a_"));
        assert!(!like("grahok", "%admin%"));
    }

    #[test]
    fn comparisons_over_row_values() {
        let r = row(json!({"name": "Cashier", "deleted": 1, "phone": null}));
        assert!(Filter::eq("name", "Cashier").matches(&r, "roles").unwrap());
        assert!(Filter::new("deleted", FilterOp::Gte, 1).matches(&r, "roles").unwrap());
        assert!(!Filter::new("deleted", FilterOp::Lt, 1).matches(&r, "roles").unwrap());
        assert!(!Filter::new("phone", FilterOp::Gt, 0).matches(&r, "roles").unwrap());
        assert!(Filter::eq("phone", Value::Null).matches(&r, "roles").unwrap());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let r = row(json!({"name": "Cashier"}));
        let err = Filter::eq("deleted", 0).matches(&r, "roles").unwrap_err();
        assert_eq!(err, StoreError::InvalidQuery("unknown column 'deleted' on roles".into()));
    }

    #[test]
    fn pages_slice_rows() {
        let page = Page::from_rows((1..=45).collect::<Vec<_>>(), 20, 3);
        assert_eq!(page.items, vec![41, 42, 43, 44, 45]);
        assert_eq!(page.last_page, 3);
        assert_eq!(page.total, 45);

        let empty: Page<u8> = Page::from_rows(vec![], 20, 0);
        assert_eq!(empty.current_page, 1);
        assert_eq!(empty.last_page, 1);
        assert!(empty.items.is_empty());
    }

    #[test]
    fn pages_past_the_end_are_empty() {
        let page = Page::from_rows((1..=5).collect::<Vec<_>>(), 20, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.last_page, 1);

        let page = Page::from_rows((1..=5).collect::<Vec<_>>(), 20, usize::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.current_page, usize::MAX);
        assert_eq!(page.total, 5);

        let page = Page::from_rows((1..=5).collect::<Vec<_>>(), usize::MAX, usize::MAX);
        assert!(page.items.is_empty());
    }
}

//! Parser for the small SQL dialect the services speak.
//!
//! Only the shapes below are understood; anything else is rejected instead
//! of being silently ignored.
//!
//! ```text
//! SELECT 1
//! SELECT * FROM <table> [WHERE <cond>] [ORDER BY <col> [ASC|DESC]] [LIMIT <n>]
//! INSERT INTO <table>
//! UPDATE <table> SET ? WHERE <cond>
//! DELETE FROM <table> WHERE <cond>
//!
//! <cond> := <col> = ? | <col> = '<text>' | <col> = <number>
//!         | <col> IS NULL | <col> IS NOT NULL
//! ```

use std::{cmp::Ordering, sync::LazyLock};

use regex::Regex;
use serde_json::Value;

use super::{QueryError, Row, Table};

static FROM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bFROM\s+(\w+)").expect("valid regex"));
static INSERT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^INSERT\s+INTO\s+(\w+)").expect("valid regex"));
static UPDATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^UPDATE\s+(\w+)").expect("valid regex"));
static WHERE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bWHERE\s+(.+?)(?:\s+ORDER\s+BY\b|\s+LIMIT\b|$)").expect("valid regex")
});
static ORDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bORDER\s+BY\s+(\w+)(?:\s+(ASC|DESC))?").expect("valid regex")
});
static LIMIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)").expect("valid regex"));
static EQ_PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*\?$").expect("valid regex"));
static EQ_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*'([^']*)'$").expect("valid regex"));
static EQ_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*=\s*(-?\d+(?:\.\d+)?)$").expect("valid regex"));
static NULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\w+)\s+IS\s+(NOT\s+)?NULL$").expect("valid regex"));

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Index into the statement parameters.
    Param(usize),
    Literal(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq { column: String, operand: Operand },
    IsNull(String),
    IsNotNull(String),
}

impl Filter {
    /// Binds the filter against parameters, yielding a row predicate.
    pub fn bind(&self, params: &[Value]) -> Result<BoundFilter, QueryError> {
        Ok(match self {
            Filter::Eq { column, operand } => {
                let value = match operand {
                    Operand::Param(index) => params
                        .get(*index)
                        .cloned()
                        .ok_or(QueryError::MissingParameter(*index))?,
                    Operand::Literal(value) => value.clone(),
                };
                BoundFilter::Eq(column.clone(), value)
            }
            Filter::IsNull(column) => BoundFilter::IsNull(column.clone()),
            Filter::IsNotNull(column) => BoundFilter::IsNotNull(column.clone()),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BoundFilter {
    Eq(String, Value),
    IsNull(String),
    IsNotNull(String),
}

impl BoundFilter {
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            BoundFilter::Eq(column, expected) => {
                row.get(column).is_some_and(|actual| values_equal(actual, expected))
            }
            BoundFilter::IsNull(column) => row.get(column).is_none_or(Value::is_null),
            BoundFilter::IsNotNull(column) => row.get(column).is_some_and(|v| !v.is_null()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub descending: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Ping,
    Select {
        table: Table,
        filter: Option<Filter>,
        order: Option<OrderBy>,
        limit: Option<usize>,
    },
    Insert {
        table: Table,
    },
    Update {
        table: Table,
        filter: Option<Filter>,
    },
    Delete {
        table: Table,
        filter: Option<Filter>,
    },
}

impl Statement {
    pub fn parse(sql: &str) -> Result<Self, QueryError> {
        let sql = sql.trim();
        let operation = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        match operation.as_str() {
            "SELECT" => {
                if !FROM_RE.is_match(sql) && sql[6..].trim() == "1" {
                    return Ok(Statement::Ping);
                }
                Ok(Statement::Select {
                    table: capture_table(&FROM_RE, sql)?,
                    filter: parse_where(sql)?,
                    order: ORDER_RE.captures(sql).map(|caps| OrderBy {
                        column: caps[1].to_string(),
                        descending: caps
                            .get(2)
                            .is_some_and(|dir| dir.as_str().eq_ignore_ascii_case("DESC")),
                    }),
                    limit: LIMIT_RE
                        .captures(sql)
                        .and_then(|caps| caps[1].parse().ok()),
                })
            }
            "INSERT" => Ok(Statement::Insert {
                table: capture_table(&INSERT_RE, sql)?,
            }),
            "UPDATE" => Ok(Statement::Update {
                table: capture_table(&UPDATE_RE, sql)?,
                filter: parse_where(sql)?,
            }),
            "DELETE" => Ok(Statement::Delete {
                table: capture_table(&FROM_RE, sql)?,
                filter: parse_where(sql)?,
            }),
            other => Err(QueryError::UnsupportedOperation(other.to_string())),
        }
    }

    pub fn table(&self) -> Option<Table> {
        match self {
            Statement::Ping => None,
            Statement::Select { table, .. }
            | Statement::Insert { table }
            | Statement::Update { table, .. }
            | Statement::Delete { table, .. } => Some(*table),
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, Statement::Ping | Statement::Select { .. })
    }
}

fn capture_table(re: &Regex, sql: &str) -> Result<Table, QueryError> {
    let caps = re
        .captures(sql)
        .ok_or_else(|| QueryError::MissingTable(sql.to_string()))?;
    caps[1].parse()
}

fn parse_where(sql: &str) -> Result<Option<Filter>, QueryError> {
    let Some(caps) = WHERE_RE.captures(sql) else {
        return Ok(None);
    };
    let clause = caps[1].trim();
    let clause_start = caps.get(1).map(|m| m.start()).unwrap_or_default();
    // Placeholders before the WHERE clause (e.g. `SET ?`) come first.
    let param_offset = sql[..clause_start].matches('?').count();

    if let Some(caps) = EQ_PARAM_RE.captures(clause) {
        return Ok(Some(Filter::Eq {
            column: caps[1].to_string(),
            operand: Operand::Param(param_offset),
        }));
    }
    if let Some(caps) = EQ_TEXT_RE.captures(clause) {
        return Ok(Some(Filter::Eq {
            column: caps[1].to_string(),
            operand: Operand::Literal(Value::String(caps[2].to_string())),
        }));
    }
    if let Some(caps) = EQ_NUMBER_RE.captures(clause) {
        let number: Value = serde_json::from_str(&caps[2])
            .map_err(|_| QueryError::UnsupportedClause(clause.to_string()))?;
        return Ok(Some(Filter::Eq {
            column: caps[1].to_string(),
            operand: Operand::Literal(number),
        }));
    }
    if let Some(caps) = NULL_RE.captures(clause) {
        let column = caps[1].to_string();
        return Ok(Some(if caps.get(2).is_some() {
            Filter::IsNotNull(column)
        } else {
            Filter::IsNull(column)
        }));
    }
    Err(QueryError::UnsupportedClause(clause.to_string()))
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => a.as_f64() == b.as_f64(),
        _ => actual == expected,
    }
}

/// Total order used by `ORDER BY`: nulls first, then booleans, numbers,
/// timestamps/strings. RFC 3339 strings compare chronologically.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (
                chrono::DateTime::parse_from_rfc3339(x),
                chrono::DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_select_with_all_clauses() {
        let stmt =
            Statement::parse("SELECT * FROM orders WHERE status = ? ORDER BY created_at DESC LIMIT 5")
                .unwrap();
        assert_eq!(
            stmt,
            Statement::Select {
                table: Table::Orders,
                filter: Some(Filter::Eq {
                    column: "status".into(),
                    operand: Operand::Param(0),
                }),
                order: Some(OrderBy {
                    column: "created_at".into(),
                    descending: true,
                }),
                limit: Some(5),
            }
        );
    }

    #[test]
    fn update_filter_skips_the_set_placeholder() {
        let stmt = Statement::parse("UPDATE products SET ? WHERE id = ?").unwrap();
        assert_eq!(
            stmt,
            Statement::Update {
                table: Table::Products,
                filter: Some(Filter::Eq {
                    column: "id".into(),
                    operand: Operand::Param(1),
                }),
            }
        );
    }

    #[test]
    fn literal_and_null_conditions() {
        match Statement::parse("SELECT * FROM categories WHERE status = 'active' ORDER BY name ASC")
            .unwrap()
        {
            Statement::Select { filter, order, .. } => {
                assert_eq!(
                    filter,
                    Some(Filter::Eq {
                        column: "status".into(),
                        operand: Operand::Literal(json!("active")),
                    })
                );
                assert_eq!(order.map(|o| o.descending), Some(false));
            }
            other => panic!("unexpected {other:?}"),
        }

        match Statement::parse("SELECT * FROM categories WHERE parent_id IS NULL").unwrap() {
            Statement::Select { filter, .. } => {
                assert_eq!(filter, Some(Filter::IsNull("parent_id".into())))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_shapes() {
        assert!(matches!(
            Statement::parse("SELECT * FROM ghosts"),
            Err(QueryError::UnknownTable(_))
        ));
        assert!(matches!(
            Statement::parse("DROP TABLE products"),
            Err(QueryError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            Statement::parse("SELECT * FROM products WHERE price > 10"),
            Err(QueryError::UnsupportedClause(_))
        ));
        assert_eq!(Statement::parse("select 1").unwrap(), Statement::Ping);
    }

    #[test]
    fn timestamps_order_chronologically() {
        let earlier = json!("2024-01-01T00:00:00.5Z");
        let later = json!("2024-01-01T00:00:01Z");
        assert_eq!(compare_values(Some(&earlier), Some(&later)), Ordering::Less);
        assert_eq!(compare_values(None, Some(&later)), Ordering::Less);
    }

    #[test]
    fn bound_filter_treats_missing_as_null() {
        let row: Row = serde_json::from_value(json!({ "id": "1", "parent_id": null })).unwrap();
        assert!(BoundFilter::IsNull("parent_id".into()).matches(&row));
        assert!(BoundFilter::IsNull("absent".into()).matches(&row));
        assert!(BoundFilter::Eq("id".into(), json!("1")).matches(&row));
    }
}

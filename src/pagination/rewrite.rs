//! Dialect-specific window rewrites of a data query.

use std::borrow::Cow;

use crate::dialect::Dialect;
use crate::sql_text::{ends_in_line_comment, leading_select_end, strip_terminator};

/// Rewrite `sql` so the server returns at most the rows of the window
/// `(start, start + count]`, or a superset the cursor then seeks through.
#[must_use]
pub fn window_sql(dialect: Dialect, sql: &str, start: usize, count: usize) -> String {
    match dialect {
        Dialect::SqlServer => top_n(sql, start.saturating_add(count)),
        Dialect::Oracle => rownum_window(sql, start, start.saturating_add(count)),
        Dialect::MySql | Dialect::Sqlite => limit_clause(sql, start, count),
    }
}

/// The query without its terminator, moved onto a fresh line if it ends in a `--` comment.
fn appendable(sql: &str) -> Cow<'_, str> {
    let base = strip_terminator(sql);
    if ends_in_line_comment(base) {
        Cow::Owned(format!("{base}\n"))
    } else {
        Cow::Borrowed(base)
    }
}

/// `sql limit start, count`, or `sql limit count` when the window begins at the first row.
#[must_use]
pub fn limit_clause(sql: &str, start: usize, count: usize) -> String {
    let base = appendable(sql);
    if start > 0 {
        format!("{base} limit {start}, {count}")
    } else {
        format!("{base} limit {count}")
    }
}

/// Wrap `sql` in the two-level `rownum` filter.
#[must_use]
pub fn rownum_window(sql: &str, start: usize, end: usize) -> String {
    let base = appendable(sql);
    format!(
        "select * from (select row_.*, rownum rownum_ from ({base}) row_ where rownum <= {end}) where rownum_ > {start}"
    )
}

/// Insert `top n` right after the leading `select`. Text without one is returned as is.
#[must_use]
pub fn top_n(sql: &str, n: usize) -> String {
    match leading_select_end(sql) {
        Some(end) => format!("{} top {n}{}", &sql[..end], &sql[end..]),
        None => {
            tracing::debug!(sql, "no leading select; top clause not applied");
            sql.to_string()
        }
    }
}

//! Lexical helpers over SQL text.
//!
//! A small state machine skips quoted strings, bracketed identifiers, and comments so
//! that placeholders and keywords are only recognised in live SQL. It does not parse.

mod parsers;
mod scanner;

use scanner::{State, step};

/// Visit every byte offset that lies in live SQL (outside literals and comments).
fn for_each_live_byte(sql: &str, mut visit: impl FnMut(usize) -> bool) {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;
    while idx < bytes.len() {
        let before = state;
        let skip = step(&mut state, bytes, idx);
        if before == State::Normal && state == State::Normal && !visit(idx) {
            return;
        }
        idx += 1 + skip;
    }
}

/// Number of `?` positional placeholders in live SQL.
#[must_use]
pub fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut count = 0;
    for_each_live_byte(sql, |idx| {
        if bytes[idx] == b'?' {
            count += 1;
        }
        true
    });
    count
}

#[must_use]
pub fn has_placeholders(sql: &str) -> bool {
    count_placeholders(sql) > 0
}

/// Byte offset just past the first live `SELECT` keyword, matched case-insensitively.
#[must_use]
pub fn leading_select_end(sql: &str) -> Option<usize> {
    const KEYWORD: &[u8] = b"select";
    let bytes = sql.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut found = None;
    for_each_live_byte(sql, |idx| {
        let end = idx + KEYWORD.len();
        if end <= bytes.len()
            && bytes[idx..end].eq_ignore_ascii_case(KEYWORD)
            && (idx == 0 || !is_word(bytes[idx - 1]))
            && bytes.get(end).is_none_or(|&b| !is_word(b))
        {
            found = Some(end);
            return false;
        }
        true
    });
    found
}

/// Whether the text ends inside a `--` comment, so anything appended on the same line is lost.
#[must_use]
pub fn ends_in_line_comment(sql: &str) -> bool {
    let bytes = sql.as_bytes();
    let mut state = State::Normal;
    let mut idx = 0;
    while idx < bytes.len() {
        idx += 1 + step(&mut state, bytes, idx);
    }
    state == State::LineComment
}

/// Drop trailing whitespace and statement terminators so clauses can be appended.
#[must_use]
pub fn strip_terminator(sql: &str) -> &str {
    sql.trim_end_matches(|c: char| c.is_whitespace() || c == ';')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_live_placeholders_only() {
        assert_eq!(count_placeholders("select * from t where a = ? and b = ?"), 2);
        assert_eq!(count_placeholders("select '?' from t -- ?\nwhere a = ?"), 1);
        assert_eq!(count_placeholders("select \"?\" /* ? /* ? */ ? */ from t"), 0);
        assert_eq!(count_placeholders("select [what?] from t where x = 'it''s ?'"), 0);
        assert!(!has_placeholders("SELECT COUNT(*) FROM t"));
    }

    #[test]
    fn finds_select_keyword_outside_comments() {
        let sql = "/* select */ SELECT id FROM t";
        let end = leading_select_end(sql).unwrap();
        assert_eq!(&sql[..end], "/* select */ SELECT");
        assert_eq!(leading_select_end("-- x\nselect 1"), Some(11));
        assert_eq!(leading_select_end("selection from t"), None);
        assert_eq!(leading_select_end("update t set a = 'select'"), None);
    }

    #[test]
    fn strips_terminators() {
        assert_eq!(strip_terminator("select 1 ;\n "), "select 1");
        assert_eq!(strip_terminator("select 1"), "select 1");
    }

    #[test]
    fn detects_trailing_line_comment() {
        assert!(ends_in_line_comment("select 1 -- newest first"));
        assert!(!ends_in_line_comment("select 1 -- note\nfrom t"));
        assert!(!ends_in_line_comment("select '--' from t"));
        assert!(!ends_in_line_comment("select 1 /* -- */"));
    }
}

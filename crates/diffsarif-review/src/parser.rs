//! Decoding of free-text model replies into [`IssueRecord`]s.
//!
//! The reply is expected to follow [`crate::prompt::ISSUE_FORMAT`], but the
//! model is free to deviate. Every fragment is classified on its own: a
//! fragment that does not match is dropped and the rest are kept. Nothing in
//! this module returns an error.

use std::fmt;
use std::sync::LazyLock;

use diffsarif_core::IssueRecord;
use regex::Regex;

/// Literal token that starts every finding.
const ISSUE_TOKEN: &str = "Issue";

/// Separator between a finding's location header and its comment.
const COMMENT_DELIMITER: &str = ":::";

static LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Line\s*([^,)]*)").expect("valid line regex"));

static COLUMN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Column\s*([^,)]*)").expect("valid column regex"));

/// Classification of one `Issue` fragment of a model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// The fragment decoded into a finding.
    Matched(IssueRecord),
    /// The fragment was malformed and is dropped.
    Skipped(SkipReason),
}

/// Why a fragment was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No `:::` between header and comment.
    MissingDelimiter,
    /// The header has no `Line` token.
    MissingLine,
    /// The header has no `Column` token.
    MissingColumn,
    /// The `Line` value is not a non-negative integer.
    InvalidLine(String),
    /// The `Column` value is not a non-negative integer.
    InvalidColumn(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingDelimiter => write!(f, "missing '{COMMENT_DELIMITER}' delimiter"),
            SkipReason::MissingLine => write!(f, "missing Line"),
            SkipReason::MissingColumn => write!(f, "missing Column"),
            SkipReason::InvalidLine(token) => write!(f, "invalid Line value {token:?}"),
            SkipReason::InvalidColumn(token) => write!(f, "invalid Column value {token:?}"),
        }
    }
}

/// Parse a model reply for `filename` into findings, dropping malformed
/// fragments.
///
/// Records keep the order in which they appear in the reply. The `Issue N`
/// index is treated as a label and ignored.
///
/// # Examples
///
/// ```
/// use diffsarif_review::parser::parse_response;
///
/// let records = parse_response("main.c", "Issue 1 (Line 5, Column 2)::: missing semicolon");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].line, 5);
/// assert_eq!(records[0].column, 2);
/// assert_eq!(records[0].message, "missing semicolon");
///
/// assert!(parse_response("main.c", "No issues found.").is_empty());
/// ```
pub fn parse_response(filename: &str, raw: &str) -> Vec<IssueRecord> {
    parse_fragments(filename, raw)
        .into_iter()
        .filter_map(|fragment| match fragment {
            Fragment::Matched(record) => Some(record),
            Fragment::Skipped(reason) => {
                tracing::debug!(file = filename, %reason, "dropping malformed response fragment");
                None
            }
        })
        .collect()
}

/// Split a model reply on the `Issue` token and classify every fragment.
///
/// Text before the first `Issue` is preamble and yields no fragment.
///
/// # Examples
///
/// ```
/// use diffsarif_review::parser::{parse_fragments, Fragment, SkipReason};
///
/// let fragments = parse_fragments(
///     "a.py",
///     "Issue 1 (Line X, Column 2)::: bad\nIssue 2 (Line 3, Column 4)::: good",
/// );
/// assert_eq!(fragments.len(), 2);
/// assert_eq!(fragments[0], Fragment::Skipped(SkipReason::InvalidLine("X".into())));
/// assert!(matches!(fragments[1], Fragment::Matched(_)));
/// ```
pub fn parse_fragments(filename: &str, raw: &str) -> Vec<Fragment> {
    raw.split(ISSUE_TOKEN)
        .skip(1)
        .map(|fragment| classify_fragment(filename, fragment))
        .collect()
}

/// Classify a single fragment (the text following one `Issue` token).
pub fn classify_fragment(filename: &str, fragment: &str) -> Fragment {
    let mut parts = fragment.splitn(2, COMMENT_DELIMITER);
    let header = parts.next().unwrap_or_default();
    let Some(comment) = parts.next() else {
        return Fragment::Skipped(SkipReason::MissingDelimiter);
    };

    let line = match header_number(&LINE_RE, header) {
        HeaderNumber::Found(n) => n,
        HeaderNumber::Missing => return Fragment::Skipped(SkipReason::MissingLine),
        HeaderNumber::Invalid(token) => return Fragment::Skipped(SkipReason::InvalidLine(token)),
    };
    let column = match header_number(&COLUMN_RE, header) {
        HeaderNumber::Found(n) => n,
        HeaderNumber::Missing => return Fragment::Skipped(SkipReason::MissingColumn),
        HeaderNumber::Invalid(token) => {
            return Fragment::Skipped(SkipReason::InvalidColumn(token))
        }
    };

    Fragment::Matched(IssueRecord {
        message: comment.trim().to_string(),
        file: filename.to_string(),
        line,
        column,
    })
}

enum HeaderNumber {
    Found(u32),
    Missing,
    Invalid(String),
}

/// Read the integer following a header keyword, up to the next comma or
/// closing parenthesis.
fn header_number(re: &Regex, header: &str) -> HeaderNumber {
    let Some(caps) = re.captures(header) else {
        return HeaderNumber::Missing;
    };
    let token = caps.get(1).map_or("", |m| m.as_str()).trim();
    match token.parse::<u32>() {
        Ok(n) => HeaderNumber::Found(n),
        Err(_) => HeaderNumber::Invalid(token.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_issue() {
        let records = parse_response("a.js", "Issue 1 (Line 5, Column 2)::: missing semicolon");
        assert_eq!(
            records,
            vec![IssueRecord {
                message: "missing semicolon".into(),
                file: "a.js".into(),
                line: 5,
                column: 2,
            }]
        );
    }

    #[test]
    fn text_without_issue_token_yields_nothing() {
        assert!(parse_response("a.js", "").is_empty());
        assert!(parse_response("a.js", "No issues found.").is_empty());
        assert!(parse_response("a.js", "Line 3, Column 4::: looks odd").is_empty());
    }

    #[test]
    fn non_numeric_line_is_dropped() {
        let records = parse_response("a.py", "Issue 1 (Line X, Column 2)::: bad");
        assert!(records.is_empty());
    }

    #[test]
    fn non_numeric_column_is_dropped() {
        let fragments = parse_fragments("a.py", "Issue 1 (Line 4, Column two)::: bad");
        assert_eq!(
            fragments,
            vec![Fragment::Skipped(SkipReason::InvalidColumn("two".into()))]
        );
    }

    #[test]
    fn negative_numbers_are_dropped() {
        let fragments = parse_fragments("a.py", "Issue 1 (Line -3, Column 2)::: bad");
        assert_eq!(
            fragments,
            vec![Fragment::Skipped(SkipReason::InvalidLine("-3".into()))]
        );
    }

    #[test]
    fn missing_delimiter_is_dropped() {
        let fragments = parse_fragments("a.py", "Issue 1 (Line 4, Column 2) no delimiter");
        assert_eq!(fragments, vec![Fragment::Skipped(SkipReason::MissingDelimiter)]);
    }

    #[test]
    fn missing_column_is_dropped() {
        let fragments = parse_fragments("a.py", "Issue 1 (Line 4)::: only a line");
        assert_eq!(fragments, vec![Fragment::Skipped(SkipReason::MissingColumn)]);
    }

    #[test]
    fn missing_line_is_dropped() {
        let fragments = parse_fragments("a.py", "Issue 1 (Column 4)::: only a column");
        assert_eq!(fragments, vec![Fragment::Skipped(SkipReason::MissingLine)]);
    }

    #[test]
    fn malformed_fragments_do_not_affect_neighbours() {
        let raw = "Here is my review:\n\
                   Issue 1 (Line 10, Column 4)::: unused variable `x`\n\
                   Issue 2 (Line ?, Column 1)::: unsure\n\
                   Issue 3 (Line 22, Column 8)::: possible None dereference\n";
        let records = parse_response("svc.py", raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 10);
        assert_eq!(records[0].message, "unused variable `x`");
        assert_eq!(records[1].line, 22);
        assert_eq!(records[1].column, 8);
        assert_eq!(records[1].message, "possible None dereference");
    }

    #[test]
    fn tolerates_whitespace_around_numbers() {
        let records = parse_response("a.go", "Issue 7 ( Line  12 , Column 3 ) :::  shadowed err ");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line, 12);
        assert_eq!(records[0].column, 3);
        assert_eq!(records[0].message, "shadowed err");
    }

    #[test]
    fn comment_keeps_further_delimiters() {
        let records = parse_response("a.rs", "Issue 1 (Line 1, Column 1)::: use `a::b` ::: not c");
        assert_eq!(records[0].message, "use `a::b` ::: not c");
    }

    #[test]
    fn empty_comment_is_allowed() {
        let records = parse_response("a.rs", "Issue 1 (Line 1, Column 1):::");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "");
    }

    #[test]
    fn issue_index_is_ignored() {
        let raw = "Issue 3 (Line 1, Column 1)::: first\n\
                   Issue 3 (Line 2, Column 1)::: second\n\
                   Issue 1 (Line 3, Column 1)::: third";
        let records = parse_response("a.rs", raw);
        let lines: Vec<u32> = records.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn records_carry_only_the_given_filename() {
        let raw = "Issue 1 (Line 1, Column 1)::: in other.py actually";
        let records = parse_response("mine.py", raw);
        assert_eq!(records[0].file, "mine.py");
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(
            SkipReason::InvalidLine("X".into()).to_string(),
            "invalid Line value \"X\""
        );
        assert_eq!(
            SkipReason::MissingDelimiter.to_string(),
            "missing ':::' delimiter"
        );
    }
}

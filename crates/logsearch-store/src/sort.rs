//! Sort stabilization.

use logsearch_schema::ACUTIME;
use regex::Regex;
use std::sync::OnceLock;

fn descending_time() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\btimecreated\s+desc\b").expect("invalid regex"))
}

/// Appends the `acutime` tie-breaker to a caller sort clause.
///
/// Events created within the same second would otherwise come back in an
/// arbitrary order. The tie-breaker follows the direction of a `timecreated`
/// sort when one is present.
///
/// # Example
///
/// ```rust
/// use logsearch_store::stabilize_sort;
///
/// assert_eq!(stabilize_sort(""), "acutime ASC");
/// assert_eq!(stabilize_sort("timecreated DESC"), "timecreated DESC, acutime DESC");
/// assert_eq!(stabilize_sort("userid ASC"), "userid ASC, acutime ASC");
/// ```
pub fn stabilize_sort(sort: &str) -> String {
    let sort = sort.trim();
    if sort.is_empty() {
        return format!("{} ASC", ACUTIME);
    }
    let direction = if descending_time().is_match(sort) {
        "DESC"
    } else {
        "ASC"
    };
    format!("{}, {} {}", sort, ACUTIME, direction)
}

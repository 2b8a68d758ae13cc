//! Output formatting utilities.

use logsearch_store::LogEvent;

/// Formats an event as a simple table row.
pub fn format_table_row(event: &LogEvent) -> String {
    format!(
        "{:<12} {:<8} {:<8} {:<8} {}",
        event.timecreated,
        event.userid,
        event.contextid,
        event.crud,
        truncate(&event.eventname, 60)
    )
}

/// Prints table header.
#[allow(clippy::print_literal)]
pub fn print_table_header() {
    println!(
        "{:<12} {:<8} {:<8} {:<8} {}",
        "TIMECREATED", "USERID", "CONTEXT", "CRUD", "EVENTNAME"
    );
    println!("{}", "-".repeat(100));
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_names_are_truncated() {
        assert_eq!(truncate("abcdef", 10), "abcdef");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }
}

//! # Editing Filter
//!
//! Keeps anything but ASCII digits out of the scan field at insertion time,
//! so the aggregation buffer only ever holds digits plus the scanner's
//! trailing terminator.

/// Control characters a scanner appends to mark the end of a scan.
pub const TERMINATORS: [char; 3] = ['\r', '\n', '\t'];

/// Verdict on a proposed insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Accept,
    Reject,
}

impl FilterDecision {
    #[inline]
    pub fn is_accept(self) -> bool {
        self == FilterDecision::Accept
    }
}

/// Decides whether a single proposed character may enter the field.
pub fn on_character_proposed(ch: char) -> FilterDecision {
    if ch.is_ascii_digit() {
        FilterDecision::Accept
    } else {
        FilterDecision::Reject
    }
}

/// Decides a multi-character insertion; one non-digit rejects all of it.
pub fn on_insertion_proposed(text: &str) -> FilterDecision {
    if text.chars().all(|ch| on_character_proposed(ch).is_accept()) {
        FilterDecision::Accept
    } else {
        FilterDecision::Reject
    }
}

/// Applies the editing filter to typed text one character at a time.
///
/// Rejected characters are dropped and the rest kept in order, as a field
/// that refuses each keystroke would end up. A trailing terminator run
/// survives so the scan still completes.
pub fn retain_accepted(text: &str) -> String {
    let body = strip_terminators(text);
    let tail = &text[body.len()..];

    let mut kept: String = body
        .chars()
        .filter(|&ch| on_character_proposed(ch).is_accept())
        .collect();
    kept.push_str(tail);
    kept
}

/// Returns true for CR, LF and TAB.
#[inline]
pub fn is_terminator(ch: char) -> bool {
    TERMINATORS.contains(&ch)
}

/// Returns true if `text` ends with a terminator.
pub fn ends_with_terminator(text: &str) -> bool {
    text.chars().next_back().is_some_and(is_terminator)
}

/// Strips trailing terminators.
pub fn strip_terminators(text: &str) -> &str {
    text.trim_end_matches(is_terminator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digits_only() {
        assert_eq!(on_character_proposed('7'), FilterDecision::Accept);
        assert_eq!(on_character_proposed('a'), FilterDecision::Reject);
        assert_eq!(on_character_proposed('\n'), FilterDecision::Reject);
        // Full-width digits are not ASCII.
        assert_eq!(on_character_proposed('７'), FilterDecision::Reject);
    }

    #[test]
    fn test_insertion() {
        assert!(on_insertion_proposed("4006381").is_accept());
        assert!(!on_insertion_proposed("40a6").is_accept());
    }

    #[test]
    fn test_terminators() {
        assert!(ends_with_terminator("123\n"));
        assert!(ends_with_terminator("123\r\n"));
        assert!(ends_with_terminator("\t"));
        assert!(!ends_with_terminator("123"));
        assert!(!ends_with_terminator(""));

        assert_eq!(strip_terminators("4006381333931\r\n"), "4006381333931");
        assert_eq!(strip_terminators("\r\n\t"), "");
        assert_eq!(strip_terminators("12\n34"), "12\n34");
    }

    #[test]
    fn test_retain_accepted() {
        assert_eq!(retain_accepted("400638133393x1"), "4006381333931");
        assert_eq!(retain_accepted("96 385-074\r\n"), "96385074\r\n");
        assert_eq!(retain_accepted("12\t34"), "1234");
        assert_eq!(retain_accepted("abc"), "");
        assert_eq!(retain_accepted("\n"), "\n");
    }
}

//! Placeholder scanning and directive cleanup

use lazy_static::lazy_static;
use regex::Regex;

/// Opening marker of a placeholder
pub const OPEN: &str = "%;";
/// Closing marker of a placeholder
pub const CLOSE: &str = ";%";

lazy_static! {
    // Inner text never contains `%` or `;`, so the innermost marker pair wins
    static ref PLACEHOLDER_PATTERN: Regex = Regex::new(r"%;[^%;]+;%").unwrap();
    static ref MARKUP_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
}

/// All placeholders in `text`, in order of appearance, duplicates included.
pub fn scan(text: &str) -> Vec<&str> {
    PLACEHOLDER_PATTERN
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// Directive text of a placeholder: markers and markup tags removed, trimmed.
pub fn directive(placeholder: &str) -> String {
    let inner = placeholder.replace(OPEN, "").replace(CLOSE, "");
    MARKUP_TAG.replace_all(&inner, "").trim().to_string()
}

/// Wrap a directive back into placeholder markers
pub fn wrap(directive: &str) -> String {
    format!("{}{}{}", OPEN, directive, CLOSE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_in_order_with_duplicates() {
        let text = "Hi %;name;%, your deal %;ym_code;% for %;name;%";
        assert_eq!(scan(text), vec!["%;name;%", "%;ym_code;%", "%;name;%"]);
    }

    #[test]
    fn test_scan_innermost_match() {
        assert_eq!(scan("%;a %;name;% b"), vec!["%;name;%"]);
        assert_eq!(scan("100% done; no placeholders"), Vec::<&str>::new());
    }

    #[test]
    fn test_scan_adjacent_placeholders() {
        assert_eq!(
            scan("%;ym_subject;%%;ym_owner;%"),
            vec!["%;ym_subject;%", "%;ym_owner;%"]
        );
    }

    #[test]
    fn test_directive_strips_tags_and_whitespace() {
        assert_eq!(
            directive("%; <span style=\"color:red\">owner.name</span> ;%"),
            "owner.name"
        );
        assert_eq!(directive("%;RECORD_URL|Open;%"), "RECORD_URL|Open");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("ym_subject"), "%;ym_subject;%");
    }
}

//! Escaped-quote cleanup for loaded template text

/// Replace HTML-escaped double quotes with a plain apostrophe.
pub fn normalize_quotes(text: &str) -> String {
    text.replace("&quot;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replaces_every_entity() {
        assert_eq!(
            normalize_quotes("say &quot;hi&quot; to %;name;%"),
            "say 'hi' to %;name;%"
        );
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(normalize_quotes("no quotes here"), "no quotes here");
    }
}

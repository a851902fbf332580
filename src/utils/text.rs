/// Collapses every whitespace run to a single space and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Non-blank lines, trimmed, in order.
pub fn non_blank_lines(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Bounded, single-line excerpt for log fields.
pub fn snippet(text: &str, max_chars: usize) -> String {
    let flat = normalize_whitespace(text);
    if flat.chars().count() > max_chars {
        flat.chars().take(max_chars).collect::<String>() + "..."
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_page_breaks_and_tabs() {
        assert_eq!(
            normalize_whitespace("  Chapter 1\n\n\tThe  cell\r\nis alive "),
            "Chapter 1 The cell is alive"
        );
    }

    #[test]
    fn non_blank_lines_drops_empty_and_trims() {
        assert_eq!(
            non_blank_lines("\n  Question: X \n\n A) y\n   \n"),
            vec!["Question: X", "A) y"]
        );
    }

    #[test]
    fn snippet_truncates_on_char_boundaries() {
        assert_eq!(snippet("héllo wörld", 5), "héllo...");
        assert_eq!(snippet("short", 10), "short");
    }
}

//! Release year extraction and title cleanup for MovieLens titles

/// First parenthesized run in `title`: for each `(` in order, the shortest
/// non-empty run of characters on the same line that is followed by `)`.
///
/// `"Toy Story (1995)"` yields `Some("1995")`.
pub fn extract_parenthesized(title: &str) -> Option<&str> {
    title.match_indices('(').find_map(|(open, _)| {
        let rest = &title[open + 1..];
        let mut chars = rest.char_indices();
        let (_, first) = chars.next()?;
        if first == '\n' {
            return None;
        }
        for (i, c) in chars {
            match c {
                ')' => return Some(&rest[..i]),
                '\n' => return None,
                _ => {}
            }
        }
        None
    })
}

/// Title with everything from the first `(` on removed, trailing whitespace trimmed.
pub fn strip_annotation(title: &str) -> &str {
    title
        .split_once('(')
        .map_or(title, |(head, _)| head)
        .trim_end()
}

/// Plausible release year: ASCII digits only and strictly after 1850.
pub fn plausible_year(raw: &str) -> Option<u32> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|year| *year > 1850)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_year() {
        assert_eq!(extract_parenthesized("Toy Story (1995)"), Some("1995"));
        assert_eq!(strip_annotation("Toy Story (1995)"), "Toy Story");
    }

    #[test]
    fn test_no_parentheses() {
        assert_eq!(extract_parenthesized("Untitled"), None);
        assert_eq!(strip_annotation("Untitled"), "Untitled");
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            extract_parenthesized("City of Lost Children, The (Cité des enfants perdus, La) (1995)"),
            Some("Cité des enfants perdus, La")
        );
        assert_eq!(
            strip_annotation("City of Lost Children, The (Cité des enfants perdus, La) (1995)"),
            "City of Lost Children, The"
        );
    }

    #[test]
    fn test_empty_parentheses_are_skipped() {
        // `()` has no content, so the run extends to the next `)`
        assert_eq!(extract_parenthesized("A () b)"), Some(") b"));
        assert_eq!(extract_parenthesized("A () (2001)"), Some(") (2001"));
        assert_eq!(extract_parenthesized("A ()"), None);
    }

    #[test]
    fn test_nested_open_paren() {
        assert_eq!(extract_parenthesized("A ((1999)"), Some("(1999"));
    }

    #[test]
    fn test_unclosed_and_multiline() {
        assert_eq!(extract_parenthesized("Broken (1995"), None);
        assert_eq!(extract_parenthesized("Two (lines\n) (2000)"), Some("2000"));
    }

    #[test]
    fn test_plausible_year_boundary() {
        assert_eq!(plausible_year("1850"), None);
        assert_eq!(plausible_year("1851"), Some(1851));
        assert_eq!(plausible_year("abc"), None);
        assert_eq!(plausible_year("19 95"), None);
        assert_eq!(plausible_year("-1999"), None);
        assert_eq!(plausible_year(""), None);
    }
}

//! Reflow and pagination: turn one page of extracted text into sheets of
//! wrapped lines.
//!
//! The whole stage is pure string arithmetic:
//!
//! ```text
//! raw text ──▶ source lines ──▶ wrapped lines ──▶ header + lines ──▶ chunks
//!              (split on \n)    (greedy, ≤ max_chars)                (≤ max_lines)
//! ```
//!
//! Blank source lines survive as empty lines, one for one. Words are never
//! split: a word longer than `max_chars` sits alone on its own line.
//! Lengths are counted in `char`s.

use crate::config::Budget;

/// Greedily wrap one source line at whitespace.
///
/// Runs of whitespace collapse to a single space and the ends are trimmed.
/// A whitespace-only line yields no output lines; callers that need
/// blank-line preservation use [`wrap_text`].
///
/// ```rust
/// use pdf_sideways::wrap_line;
/// assert_eq!(wrap_line("Foo  bar\tbaz", 8), vec!["Foo bar", "baz"]);
/// ```
pub fn wrap_line(line: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in line.split_whitespace() {
        let word_len = word.chars().count();
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap every source line of `text`, keeping blank lines in place.
///
/// `\n` and `\r\n` both end a source line; a trailing newline does not
/// produce an extra blank line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for raw in text.lines() {
        if raw.trim().is_empty() {
            lines.push(String::new());
        } else {
            lines.extend(wrap_line(raw, max_chars));
        }
    }
    lines
}

/// The three lines that open every source page: the header, a rule of
/// dashes as long as the header, and a blank line.
pub fn header_block(header: &str) -> [String; 3] {
    [
        header.to_string(),
        "-".repeat(header.chars().count()),
        String::new(),
    ]
}

/// Header block followed by the wrapped text.
pub fn reflow(text: &str, header: &str, max_chars: usize) -> Vec<String> {
    let mut lines: Vec<String> = header_block(header).into();
    lines.extend(wrap_text(text, max_chars));
    lines
}

/// Split wrapped lines into sheets of at most `max_lines` lines.
///
/// Produces `ceil(len / max_lines)` chunks; an empty input yields no
/// chunks. `max_lines` of zero is treated as one.
pub fn paginate(lines: Vec<String>, max_lines: usize) -> Vec<Vec<String>> {
    let max_lines = max_lines.max(1);
    let mut pages = Vec::with_capacity(lines.len().div_ceil(max_lines));
    let mut iter = lines.into_iter().peekable();
    while iter.peek().is_some() {
        pages.push(iter.by_ref().take(max_lines).collect());
    }
    pages
}

/// Reflow one page of text and cut it into sheets.
///
/// Always returns at least one sheet, because the header block is never
/// empty.
pub fn reflow_page(text: &str, header: &str, budget: Budget) -> Vec<Vec<String>> {
    paginate(reflow(text, header, budget.max_chars), budget.max_lines)
}

/// Header text for a 1-indexed source page.
pub fn page_header(title: &str, page_num: usize) -> String {
    format!("{title} (extracted text) — page {page_num}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(lines: &[String]) -> Vec<&str> {
        lines.iter().map(String::as_str).collect()
    }

    #[test]
    fn scenario_hello_world() {
        let lines = reflow("Hello world\n\nFoo bar baz", "H", 8);
        assert_eq!(
            strs(&lines),
            vec!["H", "-", "", "Hello", "world", "", "Foo bar", "baz"]
        );
    }

    #[test]
    fn scenario_empty_text_is_header_only() {
        let lines = reflow("", "H", 8);
        assert_eq!(strs(&lines), vec!["H", "-", ""]);

        let pages = reflow_page("", "H", Budget { max_chars: 8, max_lines: 43 });
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0], vec!["H", "-", ""]);
    }

    #[test]
    fn consecutive_blank_lines_are_kept() {
        let lines = wrap_text("a\n\n\n\nb\n   \n\t\nc", 10);
        assert_eq!(strs(&lines), vec!["a", "", "", "", "b", "", "", "c"]);
    }

    #[test]
    fn crlf_line_endings_split_lines() {
        let lines = wrap_text("one two\r\n\r\nthree\r\n", 20);
        assert_eq!(strs(&lines), vec!["one two", "", "three"]);
    }

    #[test]
    fn internal_whitespace_is_normalised() {
        assert_eq!(wrap_line("  a \t  b   c  ", 80), vec!["a b c"]);
    }

    #[test]
    fn exact_fit_stays_on_one_line() {
        // "abcd efg" is exactly 8 chars
        assert_eq!(wrap_line("abcd efg hi", 8), vec!["abcd efg", "hi"]);
    }

    #[test]
    fn long_word_passes_through_unbroken() {
        let lines = wrap_line("tiny supercalifragilistic end", 10);
        assert_eq!(lines, vec!["tiny", "supercalifragilistic", "end"]);
    }

    #[test]
    fn width_is_counted_in_chars_not_bytes() {
        // each word is 4 chars but 8 bytes
        let lines = wrap_line("ääää öööö üüüü", 9);
        assert_eq!(lines, vec!["ääää öööö", "üüüü"]);
    }

    #[test]
    fn wrapped_lines_respect_budget() {
        let text = "The quick brown fox jumps over the lazy dog and keeps running \
                    through the meadow until the sun sets behind distant hills "
            .repeat(5);
        for max in [8, 13, 20, 37] {
            for line in wrap_text(&text, max) {
                assert!(line.chars().count() <= max, "{line:?} exceeds {max}");
            }
        }
    }

    #[test]
    fn wrapping_never_loses_or_duplicates_words() {
        let text = "alpha  beta\n\ngamma delta epsilon zeta\n   eta theta iota kappa lambda mu";
        let wrapped = wrap_text(text, 11);
        let out: Vec<&str> = wrapped.iter().flat_map(|l| l.split_whitespace()).collect();
        let inp: Vec<&str> = text.split_whitespace().collect();
        assert_eq!(out, inp);
    }

    #[test]
    fn wrapping_is_greedy() {
        // greedy packs "aa bb" before breaking even though "aa" / "bb cc" is also valid
        assert_eq!(wrap_line("aa bb cc", 5), vec!["aa bb", "cc"]);
    }

    #[test]
    fn header_rule_matches_header_length() {
        let [header, rule, blank] = header_block("Notes — page 2");
        assert_eq!(header, "Notes — page 2");
        assert_eq!(rule.chars().count(), header.chars().count());
        assert!(rule.chars().all(|c| c == '-'));
        assert!(blank.is_empty());
    }

    #[test]
    fn paginate_exact_counts() {
        let lines: Vec<String> = (0..10).map(|i| i.to_string()).collect();

        let pages = paginate(lines.clone(), 4);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[2], vec!["8", "9"]);

        let pages = paginate(lines.clone(), 5);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].len(), 5);

        let flat: Vec<String> = paginate(lines.clone(), 3).into_iter().flatten().collect();
        assert_eq!(flat, lines);
    }

    #[test]
    fn paginate_empty_and_zero_capacity() {
        assert!(paginate(Vec::new(), 5).is_empty());
        let pages = paginate(vec!["a".into(), "b".into()], 0);
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn header_appears_only_on_first_sheet() {
        let text = (1..=20).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let pages = reflow_page(&text, "Doc — page 1", Budget { max_chars: 40, max_lines: 6 });

        assert_eq!(pages.len(), 4); // 3 header + 20 text = 23 lines → 6/6/6/5
        assert_eq!(pages[0][0], "Doc — page 1");
        for sheet in &pages[1..] {
            assert!(!sheet.iter().any(|l| l.starts_with("Doc")));
        }
        assert_eq!(pages[3].len(), 5);
    }

    #[test]
    fn page_header_format() {
        assert_eq!(
            page_header("Arithmetic Operators", 3),
            "Arithmetic Operators (extracted text) — page 3"
        );
    }
}

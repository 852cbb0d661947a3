//! Markdown to plain text normalization.
//!
//! A fixed pipeline of regex substitutions, applied in order:
//!
//! 1. fenced code blocks removed (fences included)
//! 2. inline code spans unwrapped
//! 3. links unwrapped to their display text
//! 4. images removed
//! 5. heading markers stripped
//! 6. bold/italic markers unwrapped
//! 7. horizontal rules removed
//! 8. whitespace runs collapsed, ends trimmed
//!
//! Fences go before inline code so fenced examples are dropped whole, and
//! links/images go before emphasis since URLs often contain `_`.
//!
//! The pipeline is re-run until the text stops changing, so nested markup
//! such as `***x***` or `[[a](b)](c)` strips fully and the function is
//! idempotent. Every stage only deletes characters or swaps a whitespace
//! character for a space, so this terminates.

use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```[\s\S]*?```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());
// No look-behind in `regex`: capture the preceding char so images are left
// for the next stage.
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|[^!])\[([^\]]+)\]\([^)]+\)").unwrap());
static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]+\)").unwrap());
static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^#+\s+").unwrap());
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_]{1,2}([^*_]+)[*_]{1,2}").unwrap());
// CRLF-aware line anchors, so `\r\n` files lose their rules too.
static HORIZONTAL_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mR)^[-*_]{3,}$").unwrap());
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Strip markdown syntax, returning single-spaced plain text.
///
/// ```rust
/// use readme_harness_core::markdown::strip_markdown;
///
/// let text = strip_markdown("# Title\n\nSee [docs](http://x) and `code`.");
/// assert_eq!(text, "Title See docs and code.");
/// ```
pub fn strip_markdown(text: &str) -> String {
    let mut current = strip_once(text);
    loop {
        let next = strip_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let text = CODE_BLOCK.replace_all(text, "");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "${1}${2}");
    let text = IMAGE.replace_all(&text, "");
    let text = HEADING.replace_all(&text, "");
    let text = EMPHASIS.replace_all(&text, "$1");
    let text = HORIZONTAL_RULE.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_headings_links_inline_code() {
        assert_eq!(
            strip_markdown("# Title\n\nSee [docs](http://x) and `code`."),
            "Title See docs and code."
        );
    }

    #[test]
    fn test_fenced_code_removed_entirely() {
        let md = "Intro\n\n```rust\nfn main() { `x` }\n```\n\nOutro";
        assert_eq!(strip_markdown(md), "Intro Outro");
    }

    #[test]
    fn test_images_removed_without_alt_text() {
        assert_eq!(
            strip_markdown("Logo: ![the logo](img/logo.png) done"),
            "Logo: done"
        );
        assert_eq!(strip_markdown("![badge](https://ci/badge.svg)"), "");
    }

    #[test]
    fn test_link_at_line_start_unwrapped() {
        assert_eq!(strip_markdown("[Home](https://x)\n[About](/about)"), "Home About");
    }

    #[test]
    fn test_link_target_underscores_do_not_leak() {
        assert_eq!(
            strip_markdown("see [the guide](https://x/my_long_path_name)"),
            "see the guide"
        );
    }

    #[test]
    fn test_emphasis_unwrapped() {
        assert_eq!(
            strip_markdown("This is **bold**, *italic* and __also__ _this_."),
            "This is bold, italic and also this."
        );
    }

    #[test]
    fn test_nested_emphasis_fully_stripped() {
        assert_eq!(strip_markdown("***loud***"), "loud");
    }

    #[test]
    fn test_horizontal_rules_removed() {
        assert_eq!(strip_markdown("above\n\n---\n\nbelow"), "above below");
        assert_eq!(strip_markdown("above\n\n***\n\nbelow"), "above below");
        assert_eq!(strip_markdown("above\n\n_____\n\nbelow"), "above below");
        assert_eq!(strip_markdown("above\r\n\r\n---\r\n\r\nbelow"), "above below");
        assert_eq!(strip_markdown("# Title\r\n***\r\ntext"), "Title text");
    }

    #[test]
    fn test_plain_text_untouched_except_whitespace() {
        assert_eq!(strip_markdown("  just\ttext \n here  "), "just text here");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(strip_markdown(""), "");
    }

    proptest! {
        #[test]
        fn prop_idempotent(s in "[ -~\\n\\t]{0,200}") {
            let once = strip_markdown(&s);
            prop_assert_eq!(strip_markdown(&once), once);
        }

        #[test]
        fn prop_idempotent_markdown_heavy(s in "[#*_`!\\[\\]()a-c \\n-]{0,120}") {
            let once = strip_markdown(&s);
            prop_assert_eq!(strip_markdown(&once), once);
        }

        #[test]
        fn prop_no_whitespace_runs(s in "[ -~\\n\\t]{0,200}") {
            let out = strip_markdown(&s);
            prop_assert!(!out.contains("  "));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}

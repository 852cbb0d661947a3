//! Detection of README files that merely point at another file.
//!
//! Repositories often commit `README.md` as a symlink; hosted source
//! viewers then serve the link target path as the file body. We treat a
//! body as a link when it looks like a bare relative file name rather than
//! prose.
//!
//! This is a heuristic. A one-word README such as `TODO.md` is taken for a
//! link, and a link whose target has an unlisted extension is served as
//! content.

use serde::Deserialize;

/// Bodies longer than this are never treated as links.
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// Extensions a link target must end with (compared case-insensitively).
pub const DEFAULT_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt", "adoc"];

/// Thresholds for [`SymlinkPolicy::is_symlink`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SymlinkPolicy {
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_max_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Default for SymlinkPolicy {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            extensions: default_extensions(),
        }
    }
}

impl SymlinkPolicy {
    /// Returns the link target if `content` is a symlink body.
    pub fn link_target<'a>(&self, content: &'a str) -> Option<&'a str> {
        let target = content.trim();

        if target.is_empty() || target.len() > self.max_length {
            return None;
        }
        // Single token: this also rules out multi-line bodies.
        if target.chars().any(char::is_whitespace) {
            return None;
        }
        if target.contains("://") {
            return None;
        }

        let (_, ext) = target.rsplit_once('.')?;
        self.extensions
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext))
            .then_some(target)
    }

    pub fn is_symlink(&self, content: &str) -> bool {
        self.link_target(content).is_some()
    }
}

/// [`SymlinkPolicy::is_symlink`] with the default thresholds.
pub fn is_symlink(content: &str) -> bool {
    SymlinkPolicy::default().is_symlink(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_file_names_are_links() {
        assert!(is_symlink("docs/README.md"));
        assert!(is_symlink("../README.md\n"));
        assert!(is_symlink("  other/README.rst  "));
        assert!(is_symlink("GUIDE.TXT"));
    }

    #[test]
    fn test_prose_is_not_a_link() {
        assert!(!is_symlink("# My Service\n\nDoes things."));
        assert!(!is_symlink("See docs/README.md"));
        assert!(!is_symlink("docs/README.md\nmore"));
        assert!(!is_symlink(""));
        assert!(!is_symlink("   \n"));
    }

    #[test]
    fn test_requires_known_extension() {
        assert!(!is_symlink("docs/README"));
        assert!(!is_symlink("src/main.rs"));
        assert!(!is_symlink("version-1.2"));
    }

    #[test]
    fn test_urls_are_not_links() {
        assert!(!is_symlink("https://example.com/README.md"));
    }

    #[test]
    fn test_length_threshold_is_pinned() {
        let at_limit = format!("{}.md", "a".repeat(DEFAULT_MAX_LENGTH - 3));
        assert_eq!(at_limit.len(), DEFAULT_MAX_LENGTH);
        assert!(is_symlink(&at_limit));

        let over = format!("{}.md", "a".repeat(DEFAULT_MAX_LENGTH - 2));
        assert!(!is_symlink(&over));
    }

    #[test]
    fn test_custom_policy() {
        let policy = SymlinkPolicy {
            max_length: 10,
            extensions: vec!["adoc".to_string()],
        };
        assert!(policy.is_symlink("x.adoc"));
        assert!(!policy.is_symlink("x.md"));
        assert!(!policy.is_symlink("longer-name.adoc"));
        assert_eq!(policy.link_target(" x.adoc\n"), Some("x.adoc"));
    }
}

//! Ordered list of README file names to probe.
//!
//! Order is priority: the resolver stops at the first name that exists.
//! A configured list replaces the built-in default wholesale.

use crate::models::CandidateFile;

/// Built-in probe order when nothing is configured.
const DEFAULT_FILE_NAMES: &[&str] = &[
    "README.md",
    "readme.md",
    "Readme.md",
    "README.markdown",
    "README",
    "readme",
    "README.rst",
    "readme.rst",
    "README.txt",
    "readme.txt",
];

/// Infer the content type served for a README file name.
///
/// Markdown extensions map to `text/markdown`, reStructuredText to
/// `text/x-rst`; everything else (including no extension) is `text/plain`.
pub fn content_type_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "md" | "markdown" | "mdown" | "mkd" => "text/markdown",
        "rst" => "text/x-rst",
        _ => "text/plain",
    }
}

pub fn default_candidates() -> Vec<CandidateFile> {
    DEFAULT_FILE_NAMES
        .iter()
        .map(|name| CandidateFile::new(*name, content_type_for(name)))
        .collect()
}

/// Build the candidate list from an optional configured file-name list.
///
/// A configured list is used verbatim, in order, even when empty.
pub fn build_candidates(file_names: Option<&[String]>) -> Vec<CandidateFile> {
    match file_names {
        Some(names) => names
            .iter()
            .map(|name| CandidateFile::new(name.clone(), content_type_for(name)))
            .collect(),
        None => default_candidates(),
    }
}

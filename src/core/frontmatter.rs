use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

lazy_static! {
    static ref FRONTMATTER_RE: Regex = Regex::new(r"(?s)^---\r?\n(.*?)\r?\n---").unwrap();
}

/// Metadata parsed from a note's YAML front matter.
///
/// Only the fields the indexer cares about; unknown keys are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Frontmatter {
    /// Parse the leading `---`-delimited block, if any.
    ///
    /// `Ok(None)` means the note has no front matter, which is fine.
    /// `Err` means a block is present but malformed; callers fall back to
    /// the filename stem as the title and count the error.
    pub fn parse(content: &str) -> Result<Option<Self>> {
        let caps = match FRONTMATTER_RE.captures(content) {
            Some(caps) => caps,
            None => return Ok(None),
        };
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        if raw.trim().is_empty() {
            return Ok(Some(Frontmatter::default()));
        }
        let fm: Frontmatter = serde_yaml::from_str(raw)
            .map_err(|e| anyhow!("malformed front matter: {}", e))?;
        Ok(Some(fm))
    }

    /// The note body with any front-matter block removed.
    pub fn strip(content: &str) -> &str {
        match FRONTMATTER_RE.find(content) {
            Some(m) => content[m.end()..].trim_start_matches(&['\r', '\n'][..]),
            None => content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_title_and_tags() {
        let content = "---\ntitle: My Note\ntags: [rust, search]\n---\n\nBody here.\n";
        let fm = Frontmatter::parse(content).unwrap().unwrap();
        assert_eq!(fm.title.as_deref(), Some("My Note"));
        assert_eq!(fm.tags, vec!["rust", "search"]);
    }

    #[test]
    fn test_parse_list_style_tags() {
        let content = "---\ntags:\n  - alpha\n  - beta\n---\nBody";
        let fm = Frontmatter::parse(content).unwrap().unwrap();
        assert!(fm.title.is_none());
        assert_eq!(fm.tags, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(Frontmatter::parse("# Just a heading\n").unwrap().is_none());
    }

    #[test]
    fn test_empty_block_is_default() {
        let fm = Frontmatter::parse("---\n\n---\nBody").unwrap().unwrap();
        assert!(fm.title.is_none());
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn test_malformed_frontmatter_is_error() {
        let content = "---\ntitle: [unclosed\n---\nBody";
        assert!(Frontmatter::parse(content).is_err());
    }

    #[test]
    fn test_strip_removes_block() {
        let content = "---\ntitle: T\n---\n# Heading\n";
        assert_eq!(Frontmatter::strip(content), "# Heading\n");
        assert_eq!(Frontmatter::strip("no block"), "no block");
    }
}
